use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use rand::Rng;

use super::{
    ActorRoster, AudioFactory, BackdropSwapper, HostError, Material, PositionProvider,
    ScenePrimitives, SoundHandle, SoundTemplate, Transform, VisualHandle, VisualKind,
};
use crate::domain::{
    actor::{ActorId, Point3},
    weather::WeatherKind,
};

#[derive(Debug, Clone, PartialEq)]
pub struct VisualRecord {
    pub kind: VisualKind,
    pub transform: Transform,
    pub material: Material,
    pub emitting: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundRecord {
    pub template: SoundTemplate,
    pub position: Point3,
    pub max_distance: f32,
    pub playing: bool,
    pub looped: bool,
    pub volume: f32,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_handle: u64,
    actors: BTreeMap<ActorId, Option<Point3>>,
    visuals: HashMap<VisualHandle, VisualRecord>,
    sounds: HashMap<SoundHandle, SoundRecord>,
    backdrop: Option<WeatherKind>,
    missing_sounds: HashSet<SoundTemplate>,
    missing_backdrops: HashSet<WeatherKind>,
    visuals_created: usize,
    visuals_destroyed: usize,
    sounds_created: usize,
    sounds_destroyed: usize,
    stale_releases: usize,
}

impl MemoryState {
    fn issue(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// In-process host that keeps every primitive in memory.
///
/// Backs the headless binary and lets tests inspect exactly what the
/// simulation created and released. Releasing a handle twice is counted in
/// [`MemoryHost::stale_releases`] instead of failing.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<MemoryState>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn connect(&self, actor: ActorId, position: Option<Point3>) {
        self.state().actors.insert(actor, position);
    }

    pub fn disconnect(&self, actor: ActorId) -> bool {
        self.state().actors.remove(&actor).is_some()
    }

    pub fn set_position(&self, actor: ActorId, position: Option<Point3>) {
        if let Some(slot) = self.state().actors.get_mut(&actor) {
            *slot = position;
        }
    }

    pub fn mark_missing_sound(&self, template: SoundTemplate) {
        self.state().missing_sounds.insert(template);
    }

    pub fn mark_missing_backdrop(&self, weather: WeatherKind) {
        self.state().missing_backdrops.insert(weather);
    }

    /// Nudges every live actor by up to `step` units on the ground plane.
    pub fn wander<R: Rng + ?Sized>(&self, rng: &mut R, step: f32) {
        let mut state = self.state();
        for position in state.actors.values_mut().flatten() {
            position.x += rng.random_range(-step..=step);
            position.z += rng.random_range(-step..=step);
        }
    }

    #[must_use]
    pub fn backdrop(&self) -> Option<WeatherKind> {
        self.state().backdrop
    }

    #[must_use]
    pub fn live_visuals(&self, kind: VisualKind) -> usize {
        self.state()
            .visuals
            .values()
            .filter(|record| record.kind == kind)
            .count()
    }

    #[must_use]
    pub fn live_sounds(&self, template: SoundTemplate) -> usize {
        self.state()
            .sounds
            .values()
            .filter(|record| record.template == template)
            .count()
    }

    #[must_use]
    pub fn visual(&self, handle: VisualHandle) -> Option<VisualRecord> {
        self.state().visuals.get(&handle).cloned()
    }

    #[must_use]
    pub fn sound(&self, handle: SoundHandle) -> Option<SoundRecord> {
        self.state().sounds.get(&handle).cloned()
    }

    #[must_use]
    pub fn sounds_of(&self, template: SoundTemplate) -> Vec<SoundRecord> {
        self.state()
            .sounds
            .values()
            .filter(|record| record.template == template)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn visuals_created(&self) -> usize {
        self.state().visuals_created
    }

    #[must_use]
    pub fn visuals_destroyed(&self) -> usize {
        self.state().visuals_destroyed
    }

    #[must_use]
    pub fn sounds_created(&self) -> usize {
        self.state().sounds_created
    }

    #[must_use]
    pub fn sounds_destroyed(&self) -> usize {
        self.state().sounds_destroyed
    }

    #[must_use]
    pub fn stale_releases(&self) -> usize {
        self.state().stale_releases
    }
}

impl ActorRoster for MemoryHost {
    fn connected(&self) -> Vec<ActorId> {
        self.state().actors.keys().copied().collect()
    }
}

impl PositionProvider for MemoryHost {
    fn position(&self, actor: ActorId) -> Option<Point3> {
        self.state().actors.get(&actor).copied().flatten()
    }
}

impl ScenePrimitives for MemoryHost {
    fn create_visual(
        &self,
        kind: VisualKind,
        transform: Transform,
        material: Material,
    ) -> Result<VisualHandle, HostError> {
        let mut state = self.state();
        let handle = VisualHandle(state.issue());
        state.visuals.insert(
            handle,
            VisualRecord {
                kind,
                transform,
                material,
                emitting: false,
            },
        );
        state.visuals_created += 1;
        Ok(handle)
    }

    fn destroy_visual(&self, handle: VisualHandle) {
        let mut state = self.state();
        if state.visuals.remove(&handle).is_some() {
            state.visuals_destroyed += 1;
        } else {
            state.stale_releases += 1;
        }
    }

    fn set_transparency(&self, handle: VisualHandle, transparency: f32) {
        if let Some(record) = self.state().visuals.get_mut(&handle) {
            record.material.transparency = transparency;
        }
    }

    fn move_visual(&self, handle: VisualHandle, position: Point3) {
        if let Some(record) = self.state().visuals.get_mut(&handle) {
            record.transform.position = position;
        }
    }

    fn set_emitting(&self, handle: VisualHandle, emitting: bool) {
        if let Some(record) = self.state().visuals.get_mut(&handle) {
            record.emitting = emitting;
        }
    }
}

impl AudioFactory for MemoryHost {
    fn create_sound(
        &self,
        template: SoundTemplate,
        position: Point3,
        max_distance: f32,
    ) -> Result<SoundHandle, HostError> {
        let mut state = self.state();
        if state.missing_sounds.contains(&template) {
            return Err(HostError::MissingAsset(format!("{template:?}")));
        }
        let handle = SoundHandle(state.issue());
        state.sounds.insert(
            handle,
            SoundRecord {
                template,
                position,
                max_distance,
                playing: false,
                looped: false,
                volume: 1.0,
            },
        );
        state.sounds_created += 1;
        Ok(handle)
    }

    fn play(&self, handle: SoundHandle) {
        if let Some(record) = self.state().sounds.get_mut(&handle) {
            record.playing = true;
        }
    }

    fn stop(&self, handle: SoundHandle) {
        if let Some(record) = self.state().sounds.get_mut(&handle) {
            record.playing = false;
        }
    }

    fn destroy_sound(&self, handle: SoundHandle) {
        let mut state = self.state();
        if state.sounds.remove(&handle).is_some() {
            state.sounds_destroyed += 1;
        } else {
            state.stale_releases += 1;
        }
    }

    fn set_volume(&self, handle: SoundHandle, volume: f32) {
        if let Some(record) = self.state().sounds.get_mut(&handle) {
            record.volume = volume;
        }
    }

    fn set_looped(&self, handle: SoundHandle, looped: bool) {
        if let Some(record) = self.state().sounds.get_mut(&handle) {
            record.looped = looped;
        }
    }
}

impl BackdropSwapper for MemoryHost {
    fn set_backdrop(&self, weather: WeatherKind) -> Result<(), HostError> {
        let mut state = self.state();
        if state.missing_backdrops.contains(&weather) {
            return Err(HostError::MissingAsset(format!("{weather} sky")));
        }
        state.backdrop = Some(weather);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn roster_tracks_connects_and_positions() {
        let host = MemoryHost::new();
        host.connect(ActorId(1), Some(Point3::new(1.0, 0.0, 2.0)));
        host.connect(ActorId(2), None);

        assert_eq!(host.connected(), vec![ActorId(1), ActorId(2)]);
        assert_eq!(host.position(ActorId(2)), None);

        host.set_position(ActorId(2), Some(Point3::ZERO));
        assert_eq!(host.position(ActorId(2)), Some(Point3::ZERO));

        assert!(host.disconnect(ActorId(1)));
        assert!(!host.disconnect(ActorId(1)));
        assert_eq!(host.position(ActorId(1)), None);
    }

    #[test]
    fn double_release_is_counted_not_fatal() {
        let host = MemoryHost::new();
        let visual = host
            .create_visual(
                VisualKind::BoltSegment,
                Transform::at(Point3::ZERO),
                Material::bolt(0.25),
            )
            .unwrap();
        host.destroy_visual(visual);
        host.destroy_visual(visual);

        assert_eq!(host.visuals_destroyed(), 1);
        assert_eq!(host.stale_releases(), 1);
    }

    #[test]
    fn missing_templates_surface_as_missing_asset() {
        let host = MemoryHost::new();
        host.mark_missing_sound(SoundTemplate::RainLoop);
        host.mark_missing_backdrop(WeatherKind::Storm);

        assert!(matches!(
            host.create_sound(SoundTemplate::RainLoop, Point3::ZERO, 10.0),
            Err(HostError::MissingAsset(_))
        ));
        assert!(host.set_backdrop(WeatherKind::Storm).is_err());
        assert!(host.set_backdrop(WeatherKind::Rain).is_ok());
        assert_eq!(host.backdrop(), Some(WeatherKind::Rain));
    }

    #[test]
    fn wander_moves_only_live_actors_on_the_ground_plane() {
        let host = MemoryHost::new();
        host.connect(ActorId(1), Some(Point3::new(0.0, 5.0, 0.0)));
        host.connect(ActorId(2), None);
        let mut rng = StdRng::seed_from_u64(1);

        host.wander(&mut rng, 2.0);

        let moved = host.position(ActorId(1)).unwrap();
        assert_eq!(moved.y, 5.0);
        assert!(moved.x.abs() <= 2.0 && moved.z.abs() <= 2.0);
        assert_eq!(host.position(ActorId(2)), None);
    }
}
