use rand::{SeedableRng, rngs::StdRng};

use super::*;

#[test]
fn weighted_sampling_converges_to_weight_shares() {
    let weights = WeightTable::default();
    let mut rng = StdRng::seed_from_u64(11);
    let draws = 90_000;
    let mut counts = [0usize; 3];
    for _ in 0..draws {
        match weights.sample(&mut rng) {
            WeatherKind::Clear => counts[0] += 1,
            WeatherKind::Rain => counts[1] += 1,
            WeatherKind::Storm => counts[2] += 1,
        }
    }

    let share = |count: usize| count as f64 / f64::from(draws);
    assert!((share(counts[0]) - 5.0 / 9.0).abs() < 0.01);
    assert!((share(counts[1]) - 2.0 / 9.0).abs() < 0.01);
    assert!((share(counts[2]) - 2.0 / 9.0).abs() < 0.01);
}

#[test]
fn consecutive_choices_never_repeat() {
    let weights = WeightTable::default();
    let mut rng = StdRng::seed_from_u64(3);
    let mut current = None;
    for _ in 0..2_000 {
        let next = choose_next(current, &weights, &mut rng);
        assert_ne!(Some(next), current);
        current = Some(next);
    }
}

#[test]
fn leaving_clear_picks_rain_or_storm() {
    let weights = WeightTable::default();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..500 {
        let next = choose_next(Some(WeatherKind::Clear), &weights, &mut rng);
        assert!(matches!(next, WeatherKind::Rain | WeatherKind::Storm));
    }
}

#[test]
fn zero_weight_kind_is_never_drawn() {
    let weights = WeightTable::new(1.0, 0.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..5_000 {
        assert_ne!(weights.sample(&mut rng), WeatherKind::Rain);
    }
}

#[test]
fn two_kind_table_alternates() {
    let weights = WeightTable::new(0.0, 3.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(8);
    let mut current = Some(WeatherKind::Rain);
    for _ in 0..50 {
        let next = choose_next(current, &weights, &mut rng);
        let expected = if current == Some(WeatherKind::Rain) {
            WeatherKind::Storm
        } else {
            WeatherKind::Rain
        };
        assert_eq!(next, expected);
        current = Some(next);
    }
}

#[test]
fn rejects_tables_that_cannot_change_weather() {
    assert!(matches!(
        WeightTable::new(0.0, 0.0, 0.0),
        Err(ConfigError::TooFewWeatherKinds { positive: 0 })
    ));
    assert!(matches!(
        WeightTable::new(4.0, 0.0, 0.0),
        Err(ConfigError::TooFewWeatherKinds { positive: 1 })
    ));
    assert!(matches!(
        WeightTable::new(1.0, -2.0, 1.0),
        Err(ConfigError::InvalidWeight {
            kind: WeatherKind::Rain,
            ..
        })
    ));
    assert!(WeightTable::new(1.0, f64::NAN, 1.0).is_err());
}

#[test]
fn weight_table_deserializes_through_validation() {
    let table: WeightTable =
        serde_json::from_str(r#"{"clear": 1.0, "rain": 1.0, "storm": 0.5}"#).unwrap();
    assert_eq!(table.weight(WeatherKind::Storm), 0.5);

    let err = serde_json::from_str::<WeightTable>(r#"{"clear": 1.0, "rain": 0.0, "storm": 0.0}"#)
        .unwrap_err();
    assert!(err.to_string().contains("at least two"));
}

#[test]
fn rain_and_storm_both_rain() {
    assert!(!WeatherKind::Clear.is_raining());
    assert!(WeatherKind::Rain.is_raining());
    assert!(WeatherKind::Storm.is_raining());
    assert!(WeatherKind::Storm.is_thundering());
    assert!(!WeatherKind::Rain.is_thundering());
}
