use proptest::prelude::*;
use weather_director::effects::mixer::falloff_volume;

proptest! {
    #[test]
    fn falloff_never_increases_with_distance(
        near in 0.0f32..500.0,
        extra in 0.0f32..500.0,
        max in 1.0f32..400.0,
    ) {
        let far = near + extra;
        prop_assert!(falloff_volume(far, max) <= falloff_volume(near, max));
    }

    #[test]
    fn falloff_is_bounded_and_pinned_at_the_ends(distance in 0.0f32..1_000.0, max in 1.0f32..400.0) {
        let volume = falloff_volume(distance, max);
        prop_assert!((0.0..=1.0).contains(&volume));
        prop_assert_eq!(falloff_volume(0.0, max), 1.0);
        if distance >= max {
            prop_assert_eq!(volume, 0.0);
        }
    }
}
