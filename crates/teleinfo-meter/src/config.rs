use std::time::Duration;

use teleinfo_frame::FrameConfig;

/// Default time between two publications.
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(10);

/// Controls meter session behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterConfig {
    /// Frame accumulation settings.
    pub frame: FrameConfig,
    /// Whether reading starts enabled. Default: true.
    pub start_enabled: bool,
    /// Interval used by [`Publisher::publish_due`](crate::Publisher::publish_due).
    pub publish_interval: Duration,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            start_enabled: true,
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
        }
    }
}
