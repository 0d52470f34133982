//! Courtesy pauses between requests

use crate::config::HarvestConfig;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Something that waits between network operations
#[allow(async_fn_in_trait)]
pub trait Pacer {
    async fn pause(&self);
}

/// Sleeps for a uniformly random duration within a range
#[derive(Debug, Clone)]
pub struct RandomPacer {
    min: Duration,
    max: Duration,
}

impl RandomPacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_config(config: &HarvestConfig) -> Self {
        let (min, max) = config.delay_range();
        Self::new(min, max)
    }

    /// Draw the next pause length
    pub fn next_delay(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

impl Pacer for RandomPacer {
    async fn pause(&self) {
        let delay = self.next_delay();
        debug!("Pausing for {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

/// Never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

impl Pacer for NoPause {
    async fn pause(&self) {}
}
