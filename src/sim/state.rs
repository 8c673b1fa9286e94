use std::{collections::VecDeque, sync::Arc, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior, interval, interval_at, sleep_until},
};

use super::{
    events::SimEvent,
    thunder::{ThunderCycle, plan_round, strike_origin},
};
use crate::{
    config::{ConfigError, SimConfig},
    domain::{
        actor::ActorId,
        weather::{WeatherChanged, WeatherKind, choose_next},
    },
    effects::{registry::EffectRegistry, strike::LightningStrike},
    host::{Host, listener_positions, note_host_error},
};

const HISTORY_LEN: usize = 32;
const ONE_SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimSnapshot {
    pub weather: Option<WeatherKind>,
    pub rain_effects: usize,
    pub retiring_rain: usize,
    pub strikes: usize,
    pub thunder_running: bool,
    pub ambient_playing: bool,
    pub ambient_volume: f32,
}

/// Owns the current weather and every effect it spawned.
///
/// All mutation happens on the task driving [`Simulation::run`]; background
/// tasks only talk to it through [`SimEvent`]s.
pub struct Simulation<H: Host> {
    host: Arc<H>,
    config: SimConfig,
    current: Option<WeatherKind>,
    effects: EffectRegistry,
    thunder: ThunderCycle,
    tx: mpsc::Sender<SimEvent>,
    rng: StdRng,
    history: VecDeque<WeatherChanged>,
    running: bool,
}

impl<H: Host> Simulation<H> {
    pub fn new(
        host: Arc<H>,
        config: SimConfig,
        tx: mpsc::Sender<SimEvent>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Ok(Self {
            host,
            effects: EffectRegistry::new(config.rain),
            config,
            current: None,
            thunder: ThunderCycle::new(),
            tx,
            rng,
            history: VecDeque::with_capacity(HISTORY_LEN),
            running: true,
        })
    }

    pub fn choose_next(&mut self) -> WeatherKind {
        choose_next(self.current, &self.config.weights, &mut self.rng)
    }

    /// Tears down whatever the current weather spawned and stands up `target`.
    pub fn apply_weather(&mut self, target: WeatherKind) -> Option<WeatherChanged> {
        if self.current == Some(target) {
            return None;
        }
        let host = &*self.host;
        let now = Instant::now();

        if let Err(err) = host.set_backdrop(target) {
            note_host_error("backdrop", &err);
        }
        self.effects.stop_effect_sounds(host);
        self.thunder.cancel();
        let strikes = self.effects.clear_strikes(host);
        let rain = self.effects.clear_rain(host, now);
        self.effects.stop_ambient(host);
        tracing::debug!(strikes, rain, "previous weather torn down");

        match target {
            WeatherKind::Clear => {}
            WeatherKind::Rain => self.start_rain(),
            WeatherKind::Storm => {
                self.start_rain();
                let pacing_seed = self.rng.random();
                self.thunder
                    .start(&self.tx, self.config.thunder.interval_secs, pacing_seed);
            }
        }

        let change = WeatherChanged::new(self.current, target);
        self.current = Some(target);
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(change);
        tracing::info!(
            from = change.from.map_or("none", WeatherKind::label),
            to = %target,
            "weather changed"
        );
        Some(change)
    }

    fn start_rain(&mut self) {
        let host = &*self.host;
        let created = self.effects.create_rain_for_all(host);
        self.effects.start_ambient(host);
        tracing::debug!(created, "rain started");
    }

    pub fn handle_event(&mut self, event: SimEvent) {
        match event {
            SimEvent::ActorConnected(actor) => self.on_actor_connected(actor),
            SimEvent::ActorDisconnected(actor) => self.on_actor_disconnected(actor),
            SimEvent::ThunderRound { cycle } => {
                if self.thunder.accepts(cycle) {
                    self.run_thunder_round();
                } else {
                    tracing::trace!(cycle, "dropping round from a cancelled thunder cycle");
                }
            }
            SimEvent::Shutdown => self.running = false,
        }
    }

    pub fn on_actor_connected(&mut self, actor: ActorId) {
        if self.current.is_some_and(WeatherKind::is_raining) {
            self.effects.create_rain(&*self.host, actor);
        }
    }

    pub fn on_actor_disconnected(&mut self, actor: ActorId) {
        if !self
            .effects
            .destroy_rain(&*self.host, actor, Instant::now())
        {
            tracing::trace!(%actor, "disconnect without rain effect");
        }
    }

    /// Spawns one strike near each actor picked for this round.
    pub fn run_thunder_round(&mut self) -> usize {
        let host = &*self.host;
        let roster = host.connected();
        if roster.is_empty() {
            tracing::trace!("no actors connected, skipping thunder round");
            return 0;
        }

        let now = Instant::now();
        let mut spawned = 0;
        for actor in plan_round(&roster, &self.config.thunder, &mut self.rng) {
            let Some(anchor) = host.position(actor) else {
                continue;
            };
            let origin = strike_origin(anchor, &self.config.thunder, &mut self.rng);
            let strike = LightningStrike::spawn(
                host,
                origin,
                now,
                &self.config.bolt,
                &self.config.strike,
                &mut self.rng,
            );
            self.effects.add_strike(strike);
            spawned += 1;
        }
        tracing::debug!(spawned, connected = roster.len(), "thunder round");
        spawned
    }

    /// Per-frame work: strike lifecycles, rain ducking, staged rain release.
    pub fn tick_frame(&mut self, now: Instant) {
        let host = &*self.host;
        let listeners = listener_positions(host);
        self.effects.tick_strikes(host, now, &listeners);
        self.effects.reap(host, now);
    }

    /// Per-second work: rain followers.
    pub fn tick_second(&mut self, now: Instant) {
        let host = &*self.host;
        self.effects.update_rain(host);
        self.effects.reap(host, now);
    }

    pub fn roll_hold(&mut self) -> Duration {
        let range = self.config.hold_secs;
        Duration::from_secs(u64::from(self.rng.random_range(range.min..=range.max)))
    }

    /// Cycles weather until a [`SimEvent::Shutdown`] arrives, then tears everything down.
    pub async fn run(&mut self, events: &mut mpsc::Receiver<SimEvent>) {
        let frame_period = Duration::from_secs_f64(1.0 / f64::from(self.config.frame_hz));
        let mut frame = interval(frame_period);
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.running {
            let next = self.choose_next();
            self.apply_weather(next);
            let hold = self.roll_hold();
            let deadline = Instant::now() + hold;
            tracing::debug!(secs = hold.as_secs(), "holding weather");

            let mut second = interval_at(Instant::now() + ONE_SECOND, ONE_SECOND);
            second.set_missed_tick_behavior(MissedTickBehavior::Delay);
            while self.running {
                // Fixed polling order: a round landing on the hold deadline is
                // always dropped, never spawned, so seeded runs repeat.
                tokio::select! {
                    biased;
                    () = sleep_until(deadline) => break,
                    _ = second.tick() => self.tick_second(Instant::now()),
                    _ = frame.tick() => self.tick_frame(Instant::now()),
                    maybe_event = events.recv() => match maybe_event {
                        Some(event) => self.handle_event(event),
                        None => self.running = false,
                    },
                }
            }
        }

        self.shutdown();
    }

    /// Cancels thunder and releases every effect immediately.
    pub fn shutdown(&mut self) {
        self.running = false;
        self.thunder.cancel();
        self.effects.teardown_all(&*self.host, Instant::now());
        tracing::info!(transitions = self.history.len(), "simulation stopped");
    }

    #[must_use]
    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            weather: self.current,
            rain_effects: self.effects.rain_count(),
            retiring_rain: self.effects.retiring_count(),
            strikes: self.effects.strike_count(),
            thunder_running: self.thunder.is_running(),
            ambient_playing: self.effects.ambient().is_some(),
            ambient_volume: self.effects.ambient_volume(),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<WeatherKind> {
        self.current
    }

    #[must_use]
    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    #[must_use]
    pub fn thunder(&self) -> &ThunderCycle {
        &self.thunder
    }

    #[must_use]
    pub fn history(&self) -> &VecDeque<WeatherChanged> {
        &self.history
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

}
