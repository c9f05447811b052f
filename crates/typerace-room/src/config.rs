//! Registry timing configuration.

use std::time::Duration;

/// Timing knobs for the registry and its rooms.
///
/// The defaults are the production values; tests shrink them.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Delay between `start-race` and the transition to racing.
    ///
    /// Longer than the client's 3-second visual countdown so the race
    /// text is never revealed before the countdown has finished
    /// rendering on slow connections.
    pub countdown_delay: Duration,

    /// Rooms older than this are removed by the sweep regardless of
    /// state.
    pub room_max_age: Duration,

    /// How often the background sweep runs.
    pub sweep_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            countdown_delay: Duration::from_millis(3_500),
            room_max_age: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_config_default() {
        let config = RegistryConfig::default();
        assert_eq!(config.countdown_delay, Duration::from_millis(3_500));
        assert_eq!(config.room_max_age, Duration::from_secs(3_600));
        assert_eq!(config.sweep_interval, Duration::from_secs(600));
    }
}
