use crate::domain::actor::Point3;

/// Linear distance falloff: full volume at the source, silent at `max_distance`.
#[must_use]
pub fn falloff_volume(distance: f32, max_distance: f32) -> f32 {
    if max_distance <= 0.0 || distance.is_nan() {
        return 0.0;
    }
    (1.0 - distance / max_distance).clamp(0.0, 1.0)
}

/// Distance from `anchor` to the closest listener, or infinity with no listeners.
#[must_use]
pub fn nearest_distance(anchor: Point3, listeners: &[Point3]) -> f32 {
    listeners
        .iter()
        .map(|listener| listener.distance(anchor))
        .fold(f32::INFINITY, f32::min)
}

#[must_use]
pub fn within_radius(anchor: Point3, listeners: &[Point3], radius: f32) -> bool {
    nearest_distance(anchor, listeners) <= radius
}

/// Accumulates per-strike mute requests for the shared rain loop within one tick.
///
/// The rain is muted when any strike in the tick asks for it, independent of
/// the order strikes are visited in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RainDucking {
    muted: bool,
}

impl RainDucking {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, mute: bool) {
        self.muted |= mute;
    }

    #[must_use]
    pub fn is_muted(self) -> bool {
        self.muted
    }

    #[must_use]
    pub fn volume(self, open_volume: f32) -> f32 {
        if self.muted { 0.0 } else { open_volume }
    }
}
