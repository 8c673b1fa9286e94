use glam::Vec3;

use crate::{
    config::RainConfig,
    domain::actor::{ActorId, Point3},
    host::{
        HostError, Material, PositionProvider, ScenePrimitives, Transform, VisualHandle,
        VisualKind,
    },
};

/// Rain emitter hovering above one actor.
#[derive(Debug)]
pub struct RainEffect {
    actor: ActorId,
    visual: VisualHandle,
    position: Point3,
    emitting: bool,
    config: RainConfig,
}

impl RainEffect {
    /// Places the emitter and snaps it straight to its follow target.
    pub fn create<H>(host: &H, actor: ActorId, config: &RainConfig) -> Result<Self, HostError>
    where
        H: ScenePrimitives + PositionProvider + ?Sized,
    {
        let position = follow_target(host.position(actor), config);
        let visual =
            host.create_visual(VisualKind::RainEmitter, Transform::at(position), Material::rain())?;
        host.set_emitting(visual, true);
        Ok(Self {
            actor,
            visual,
            position,
            emitting: true,
            config: *config,
        })
    }

    /// Eases the emitter toward the actor, or parks it out of view while the
    /// actor has no body.
    pub fn update_position<H>(&mut self, host: &H)
    where
        H: ScenePrimitives + PositionProvider + ?Sized,
    {
        self.position = match host.position(self.actor) {
            Some(actor_position) => {
                let target = actor_position + Vec3::Y * self.config.height_offset;
                self.position.lerp(target, self.config.smoothing)
            }
            None => park_position(&self.config),
        };
        host.move_visual(self.visual, self.position);
    }

    /// First teardown stage: stop emitting so live particles can settle.
    ///
    /// Returns the visual to release once the grace period has passed.
    pub fn begin_teardown<H>(mut self, host: &H) -> VisualHandle
    where
        H: ScenePrimitives + ?Sized,
    {
        if self.emitting {
            host.set_emitting(self.visual, false);
            self.emitting = false;
        }
        self.visual
    }

    #[must_use]
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    #[must_use]
    pub fn position(&self) -> Point3 {
        self.position
    }

    #[must_use]
    pub fn visual(&self) -> VisualHandle {
        self.visual
    }

    #[must_use]
    pub fn is_emitting(&self) -> bool {
        self.emitting
    }
}

fn follow_target(actor_position: Option<Point3>, config: &RainConfig) -> Point3 {
    actor_position.map_or_else(
        || park_position(config),
        |position| position + Vec3::Y * config.height_offset,
    )
}

fn park_position(config: &RainConfig) -> Point3 {
    Vec3::Y * config.park_height
}
