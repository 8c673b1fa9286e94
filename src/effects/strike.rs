use glam::Vec3;
use rand::Rng;
use tokio::time::Instant;

use super::{
    bolt::{BoltSegment, generate_bolt},
    mixer::{falloff_volume, nearest_distance, within_radius},
};
use crate::{
    config::{BoltConfig, StrikeConfig},
    domain::actor::Point3,
    host::{
        AudioFactory, Material, ScenePrimitives, SoundHandle, SoundTemplate, Transform,
        VisualHandle, VisualKind, note_host_error,
    },
};

#[derive(Debug, Clone)]
pub struct Segment {
    pub geometry: BoltSegment,
    pub visual: Option<VisualHandle>,
    pub transparency: f32,
}

/// Outcome of one per-frame update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrikeTick {
    /// A listener is close enough that the rain loop should be silenced.
    pub mutes_rain: bool,
    /// The strike is gone and can be dropped from the schedule.
    pub expired: bool,
}

/// One bolt with its crack and rumble, alive for a fixed lifetime.
#[derive(Debug)]
pub struct LightningStrike {
    origin: Point3,
    segments: Vec<Segment>,
    crack: Option<SoundHandle>,
    rumble: Option<SoundHandle>,
    created_at: Instant,
    active: bool,
    config: StrikeConfig,
}

impl LightningStrike {
    pub fn spawn<H, R>(
        host: &H,
        origin: Point3,
        now: Instant,
        bolt: &BoltConfig,
        config: &StrikeConfig,
        rng: &mut R,
    ) -> Self
    where
        H: ScenePrimitives + AudioFactory + ?Sized,
        R: Rng + ?Sized,
    {
        let segments = generate_bolt(origin, bolt, rng)
            .into_iter()
            .map(|geometry| Segment {
                visual: place_segment(host, &geometry, bolt.segment_thickness, config),
                geometry,
                transparency: config.base_transparency,
            })
            .collect::<Vec<_>>();

        let crack = start_sound(
            host,
            SoundTemplate::ThunderCrack,
            origin,
            config.crack_falloff,
        );
        let rumble = start_sound(
            host,
            SoundTemplate::ThunderRumble,
            origin,
            config.rumble_falloff,
        );

        tracing::debug!(
            x = origin.x,
            y = origin.y,
            z = origin.z,
            segments = segments.len(),
            "lightning strike spawned"
        );

        Self {
            origin,
            segments,
            crack,
            rumble,
            created_at: now,
            active: true,
            config: *config,
        }
    }

    pub fn update<H>(&mut self, host: &H, now: Instant, listeners: &[Point3]) -> StrikeTick
    where
        H: ScenePrimitives + AudioFactory + ?Sized,
    {
        if !self.active {
            return StrikeTick {
                mutes_rain: false,
                expired: true,
            };
        }

        let elapsed = now.saturating_duration_since(self.created_at).as_secs_f32();
        let nearest = nearest_distance(self.origin, listeners);

        if let Some(crack) = self.crack {
            host.set_volume(crack, falloff_volume(nearest, self.config.crack_falloff));
        }
        if let Some(rumble) = self.rumble {
            host.set_volume(rumble, falloff_volume(nearest, self.config.rumble_falloff));
        }
        let mutes_rain = within_radius(self.origin, listeners, self.config.duck_radius);

        if elapsed > self.config.fade_start_secs() {
            let transparency = fade_transparency(elapsed, &self.config);
            for segment in &mut self.segments {
                segment.transparency = transparency;
                if let Some(visual) = segment.visual {
                    host.set_transparency(visual, transparency);
                }
            }
        }

        if elapsed > self.config.lifetime_secs {
            self.destroy(host);
            return StrikeTick {
                mutes_rain: false,
                expired: true,
            };
        }

        StrikeTick {
            mutes_rain,
            expired: false,
        }
    }

    /// Silences both sounds without releasing them.
    pub fn stop_sounds<H: AudioFactory + ?Sized>(&self, host: &H) {
        for sound in [self.crack, self.rumble].into_iter().flatten() {
            host.stop(sound);
        }
    }

    /// Releases every segment and sound. Returns `false` if already destroyed.
    pub fn destroy<H>(&mut self, host: &H) -> bool
    where
        H: ScenePrimitives + AudioFactory + ?Sized,
    {
        if !self.active {
            return false;
        }
        self.active = false;

        for segment in &mut self.segments {
            if let Some(visual) = segment.visual.take() {
                host.destroy_visual(visual);
            }
        }
        for sound in [self.crack.take(), self.rumble.take()].into_iter().flatten() {
            host.stop(sound);
            host.destroy_sound(sound);
        }
        tracing::trace!(segments = self.segments.len(), "lightning strike released");
        true
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn sounds(&self) -> [Option<SoundHandle>; 2] {
        [self.crack, self.rumble]
    }
}

/// Segment transparency for `elapsed` seconds into a strike's life.
#[must_use]
pub fn fade_transparency(elapsed: f32, config: &StrikeConfig) -> f32 {
    let progress = if config.fade_secs > 0.0 {
        ((elapsed - config.fade_start_secs()) / config.fade_secs).clamp(0.0, 1.0)
    } else if elapsed >= config.lifetime_secs {
        1.0
    } else {
        0.0
    };
    config.base_transparency + (1.0 - config.base_transparency) * progress
}

fn place_segment<H>(
    host: &H,
    geometry: &BoltSegment,
    thickness: f32,
    config: &StrikeConfig,
) -> Option<VisualHandle>
where
    H: ScenePrimitives + ?Sized,
{
    let transform = Transform {
        position: geometry.midpoint(),
        rotation: geometry.orientation(),
        size: Vec3::new(thickness, geometry.length(), thickness),
    };
    host.create_visual(
        VisualKind::BoltSegment,
        transform,
        Material::bolt(config.base_transparency),
    )
    .inspect_err(|err| note_host_error("bolt segment", err))
    .ok()
}

fn start_sound<H>(
    host: &H,
    template: SoundTemplate,
    position: Point3,
    max_distance: f32,
) -> Option<SoundHandle>
where
    H: AudioFactory + ?Sized,
{
    let sound = host
        .create_sound(template, position, max_distance)
        .inspect_err(|err| note_host_error("thunder sound", err))
        .ok()?;
    host.play(sound);
    Some(sound)
}
