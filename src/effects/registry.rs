use std::{collections::HashMap, time::Duration};

use tokio::time::Instant;

use super::{mixer::RainDucking, rain::RainEffect, strike::LightningStrike};
use crate::{
    config::RainConfig,
    domain::actor::{ActorId, Point3},
    host::{Host, SoundHandle, SoundTemplate, VisualHandle, note_host_error},
};

#[derive(Debug, Clone, Copy)]
struct RetiringVisual {
    visual: VisualHandle,
    release_at: Instant,
}

/// Live rain emitters keyed by actor, live strikes and the shared rain loop.
#[derive(Debug)]
pub struct EffectRegistry {
    rain: HashMap<ActorId, RainEffect>,
    retiring: Vec<RetiringVisual>,
    strikes: Vec<LightningStrike>,
    ambient: Option<SoundHandle>,
    ambient_volume: f32,
    config: RainConfig,
}

impl EffectRegistry {
    #[must_use]
    pub fn new(config: RainConfig) -> Self {
        Self {
            rain: HashMap::new(),
            retiring: Vec::new(),
            strikes: Vec::new(),
            ambient: None,
            ambient_volume: 0.0,
            config,
        }
    }

    /// Adds a rain emitter for `actor` unless one already exists.
    pub fn create_rain<H: Host + ?Sized>(&mut self, host: &H, actor: ActorId) -> bool {
        if self.rain.contains_key(&actor) {
            tracing::trace!(%actor, "rain already present");
            return false;
        }
        match RainEffect::create(host, actor, &self.config) {
            Ok(effect) => {
                tracing::debug!(%actor, "rain effect created");
                self.rain.insert(actor, effect);
                true
            }
            Err(err) => {
                note_host_error("rain emitter", &err);
                false
            }
        }
    }

    pub fn create_rain_for_all<H: Host + ?Sized>(&mut self, host: &H) -> usize {
        host.connected()
            .into_iter()
            .filter(|actor| self.create_rain(host, *actor))
            .count()
    }

    /// Stops the actor's emitter and schedules its release after the grace period.
    pub fn destroy_rain<H: Host + ?Sized>(&mut self, host: &H, actor: ActorId, now: Instant) -> bool {
        let Some(effect) = self.rain.remove(&actor) else {
            return false;
        };
        let visual = effect.begin_teardown(host);
        self.retiring.push(RetiringVisual {
            visual,
            release_at: now + self.grace(),
        });
        tracing::debug!(%actor, "rain effect retiring");
        true
    }

    pub fn clear_rain<H: Host + ?Sized>(&mut self, host: &H, now: Instant) -> usize {
        let actors = self.rain.keys().copied().collect::<Vec<_>>();
        actors
            .into_iter()
            .filter(|actor| self.destroy_rain(host, *actor, now))
            .count()
    }

    pub fn update_rain<H: Host + ?Sized>(&mut self, host: &H) {
        for effect in self.rain.values_mut() {
            effect.update_position(host);
        }
    }

    /// Releases retiring emitters whose grace period has elapsed.
    pub fn reap<H: Host + ?Sized>(&mut self, host: &H, now: Instant) -> usize {
        let before = self.retiring.len();
        self.retiring.retain(|retiring| {
            if retiring.release_at <= now {
                host.destroy_visual(retiring.visual);
                false
            } else {
                true
            }
        });
        before - self.retiring.len()
    }

    pub fn flush_retiring<H: Host + ?Sized>(&mut self, host: &H) {
        for retiring in self.retiring.drain(..) {
            host.destroy_visual(retiring.visual);
        }
    }

    /// Starts the looping rain ambience at full volume; no-op if already playing.
    pub fn start_ambient<H: Host + ?Sized>(&mut self, host: &H) {
        if self.ambient.is_some() {
            return;
        }
        match host.create_sound(SoundTemplate::RainLoop, Point3::ZERO, f32::INFINITY) {
            Ok(sound) => {
                host.set_looped(sound, true);
                host.set_volume(sound, self.config.ambient_volume);
                host.play(sound);
                self.ambient = Some(sound);
                self.ambient_volume = self.config.ambient_volume;
            }
            Err(err) => note_host_error("rain ambience", &err),
        }
    }

    pub fn stop_ambient<H: Host + ?Sized>(&mut self, host: &H) {
        if let Some(sound) = self.ambient.take() {
            host.stop(sound);
            host.destroy_sound(sound);
        }
        self.ambient_volume = 0.0;
    }

    /// Silences every effect sound without releasing anything.
    pub fn stop_effect_sounds<H: Host + ?Sized>(&self, host: &H) {
        for strike in &self.strikes {
            strike.stop_sounds(host);
        }
        if let Some(sound) = self.ambient {
            host.stop(sound);
        }
    }

    pub fn add_strike(&mut self, strike: LightningStrike) {
        self.strikes.push(strike);
    }

    pub fn clear_strikes<H: Host + ?Sized>(&mut self, host: &H) -> usize {
        let released = self
            .strikes
            .iter_mut()
            .filter_map(|strike| strike.destroy(host).then_some(()))
            .count();
        self.strikes.clear();
        released
    }

    /// Runs one frame of every strike and settles the rain ducking for the frame.
    ///
    /// Returns how many strikes expired this frame.
    pub fn tick_strikes<H: Host + ?Sized>(
        &mut self,
        host: &H,
        now: Instant,
        listeners: &[Point3],
    ) -> usize {
        let mut ducking = RainDucking::new();
        let mut expired = 0;
        self.strikes.retain_mut(|strike| {
            let tick = strike.update(host, now, listeners);
            ducking.request(tick.mutes_rain);
            if tick.expired {
                expired += 1;
            }
            !tick.expired
        });
        if expired > 0 {
            tracing::debug!(expired, remaining = self.strikes.len(), "strikes expired");
        }

        if let Some(sound) = self.ambient {
            let volume = ducking.volume(self.config.ambient_volume);
            if (volume - self.ambient_volume).abs() > f32::EPSILON {
                host.set_volume(sound, volume);
                self.ambient_volume = volume;
                tracing::trace!(
                    volume,
                    muted = ducking.is_muted(),
                    "rain ambience ducking changed"
                );
            }
        }
        expired
    }

    /// Releases everything immediately, including emitters still in their grace period.
    pub fn teardown_all<H: Host + ?Sized>(&mut self, host: &H, now: Instant) {
        self.stop_effect_sounds(host);
        self.clear_strikes(host);
        self.clear_rain(host, now);
        self.stop_ambient(host);
        self.flush_retiring(host);
    }

    fn grace(&self) -> Duration {
        Duration::try_from_secs_f32(self.config.teardown_grace_secs).unwrap_or_default()
    }

    #[must_use]
    pub fn has_rain(&self, actor: ActorId) -> bool {
        self.rain.contains_key(&actor)
    }

    #[must_use]
    pub fn rain(&self, actor: ActorId) -> Option<&RainEffect> {
        self.rain.get(&actor)
    }

    #[must_use]
    pub fn rain_count(&self) -> usize {
        self.rain.len()
    }

    #[must_use]
    pub fn retiring_count(&self) -> usize {
        self.retiring.len()
    }

    #[must_use]
    pub fn strikes(&self) -> &[LightningStrike] {
        &self.strikes
    }

    #[must_use]
    pub fn strike_count(&self) -> usize {
        self.strikes.len()
    }

    #[must_use]
    pub fn ambient(&self) -> Option<SoundHandle> {
        self.ambient
    }

    #[must_use]
    pub fn ambient_volume(&self) -> f32 {
        self.ambient_volume
    }
}
