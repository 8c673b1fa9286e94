use glam::{Quat, Vec3};
use rand::Rng;

use crate::{config::BoltConfig, domain::actor::Point3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoltSegment {
    pub start: Point3,
    pub end: Point3,
    /// Recursion depth that emitted this segment, starting at 1.
    pub depth: u32,
}

impl BoltSegment {
    #[must_use]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    #[must_use]
    pub fn midpoint(&self) -> Point3 {
        self.start.lerp(self.end, 0.5)
    }

    /// Rotation taking the segment's local +Y axis onto its direction.
    #[must_use]
    pub fn orientation(&self) -> Quat {
        let direction = (self.end - self.start).normalize_or_zero();
        if direction == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(Vec3::Y, direction)
        }
    }
}

/// Builds one bolt from `origin`, heading straight down.
pub fn generate_bolt<R: Rng + ?Sized>(
    origin: Point3,
    config: &BoltConfig,
    rng: &mut R,
) -> Vec<BoltSegment> {
    let mut segments = Vec::new();
    grow_branch(origin, Vec3::NEG_Y, 1, config, rng, &mut segments);
    segments
}

fn grow_branch<R: Rng + ?Sized>(
    position: Point3,
    direction: Vec3,
    depth: u32,
    config: &BoltConfig,
    rng: &mut R,
    segments: &mut Vec<BoltSegment>,
) {
    if depth > config.max_depth {
        return;
    }

    let direction = direction.try_normalize().unwrap_or(Vec3::NEG_Y);
    let end = position + direction * config.segment_length;
    segments.push(BoltSegment {
        start: position,
        end,
        depth,
    });

    if rng.random_bool(f64::from(config.continue_chance)) {
        let bent = deviate(direction, config.max_deviation_deg, rng);
        grow_branch(end, bent, depth + 1, config, rng, segments);
    }
    if rng.random_bool(f64::from(config.fork_chance)) {
        let fork = downward_hemisphere(rng);
        grow_branch(end, fork, depth + 1, config, rng, segments);
    }
}

/// Tilts `direction` by independent random angles about the X and Z axes.
fn deviate<R: Rng + ?Sized>(direction: Vec3, max_deg: f32, rng: &mut R) -> Vec3 {
    let max = max_deg.to_radians();
    if max <= 0.0 {
        return direction;
    }
    let pitch = rng.random_range(-max..=max);
    let roll = rng.random_range(-max..=max);
    Quat::from_rotation_x(pitch) * Quat::from_rotation_z(roll) * direction
}

fn downward_hemisphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let candidate = Vec3::new(
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=0.0),
        rng.random_range(-1.0..=1.0),
    );
    candidate.try_normalize().unwrap_or(Vec3::NEG_Y)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn first_segment_points_straight_down() {
        let mut rng = StdRng::seed_from_u64(1);
        let origin = Point3::new(3.0, 50.0, -2.0);
        let bolt = generate_bolt(origin, &BoltConfig::default(), &mut rng);

        let first = bolt[0];
        assert_eq!(first.start, origin);
        assert_eq!(first.depth, 1);
        assert!((first.end - Point3::new(3.0, 46.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn segments_have_fixed_length_and_bounded_depth() {
        let config = BoltConfig::default();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let bolt = generate_bolt(Point3::ZERO, &config, &mut rng);
            assert!(!bolt.is_empty());
            for segment in &bolt {
                assert!((1..=6).contains(&segment.depth));
                assert!((segment.length() - 4.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn every_segment_starts_where_a_shallower_one_ends() {
        let mut rng = StdRng::seed_from_u64(77);
        let bolt = generate_bolt(Point3::ZERO, &BoltConfig::default(), &mut rng);
        for segment in bolt.iter().filter(|s| s.depth > 1) {
            assert!(bolt.iter().any(|parent| {
                parent.depth + 1 == segment.depth && parent.end.distance(segment.start) < 1e-5
            }));
        }
    }

    #[test]
    fn no_branching_yields_single_segment() {
        let config = BoltConfig {
            continue_chance: 0.0,
            fork_chance: 0.0,
            ..BoltConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(generate_bolt(Point3::ZERO, &config, &mut rng).len(), 1);
    }

    #[test]
    fn certain_branching_fills_the_binary_tree() {
        let config = BoltConfig {
            continue_chance: 1.0,
            fork_chance: 1.0,
            ..BoltConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        // 2^6 - 1 nodes for depths 1..=6
        assert_eq!(generate_bolt(Point3::ZERO, &config, &mut rng).len(), 63);
    }

    #[test]
    fn trunk_deviation_stays_within_bound() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1_000 {
            let bent = deviate(Vec3::NEG_Y, 30.0, &mut rng);
            // two independent 30 degree tilts compose to at most ~42 degrees
            assert!(bent.angle_between(Vec3::NEG_Y) <= 43f32.to_radians());
            assert!((bent.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn forks_point_downward() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..1_000 {
            let fork = downward_hemisphere(&mut rng);
            assert!(fork.y <= 0.0);
            assert!((fork.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn orientation_maps_up_axis_onto_segment() {
        let segment = BoltSegment {
            start: Point3::ZERO,
            end: Point3::new(4.0, 0.0, 0.0),
            depth: 1,
        };
        let aligned = segment.orientation() * Vec3::Y;
        assert!((aligned - Vec3::X).length() < 1e-5);
        assert_eq!(segment.midpoint(), Point3::new(2.0, 0.0, 0.0));
    }
}
