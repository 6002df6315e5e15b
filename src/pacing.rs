use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::config::SimulationConfig;

/// Per-agent clock: the sleep between ticks and the two liveness bounds.
#[derive(Debug)]
pub struct Pacing {
    tick: Duration,
    stationary_timeout: Duration,
    lifetime: Option<Duration>,
    started: Instant,
    stationary_since: Option<Instant>,
}

impl Pacing {
    pub fn new(config: &SimulationConfig) -> Pacing {
        Pacing {
            tick: config.tick,
            stationary_timeout: config.stationary_timeout,
            lifetime: config.lifetime,
            started: Instant::now(),
            stationary_since: None,
        }
    }

    /// Sleeps after a tick without movement. Returns true once the agent has
    /// been stationary for the whole stationary timeout.
    pub async fn stay(&mut self) -> bool {
        let since = *self.stationary_since.get_or_insert_with(Instant::now);
        sleep(self.tick).await;
        since.elapsed() >= self.stationary_timeout
    }

    pub async fn moved(&mut self) {
        self.stationary_since = None;
        sleep(self.tick).await;
    }

    pub fn expired(&self) -> bool {
        self.lifetime
            .is_some_and(|lifetime| self.started.elapsed() >= lifetime)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
