//! Thread-safe configuration caching with arc-swap for lock-free reads.

use crate::schema::Config;
use arc_swap::ArcSwap;
use bikeshare_common::{BusinessQuestion, TimeFrame};
use std::sync::Arc;

/// Thread-safe configuration cache using arc-swap for lock-free reads.
pub struct ConfigCache {
    config: ArcSwap<Config>,
}

impl ConfigCache {
    /// Creates a new configuration cache with the given initial configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Gets the current configuration.
    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// The current pair of dashboard controls.
    pub fn selection(&self) -> (BusinessQuestion, TimeFrame) {
        let config = self.config.load();
        (config.dashboard.question, config.dashboard.time_frame)
    }

    /// Updates the configuration atomically, returning the previous one.
    pub fn update(&self, config: Config) -> Arc<Config> {
        self.config.swap(Arc::new(config))
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
