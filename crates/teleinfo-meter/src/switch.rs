use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Start/stop toggle shared by the ingestion and publication sides.
///
/// While off, the meter ignores bytes and the publisher leaves dirty fields
/// in place.
#[derive(Debug, Clone)]
pub struct EnableSwitch {
    state: Arc<AtomicBool>,
}

impl EnableSwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            state: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.load(Ordering::SeqCst)
    }

    /// Set the state, returning the previous one.
    pub fn set(&self, enabled: bool) -> bool {
        let previous = self.state.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            tracing::info!(enabled, "teleinfo reading switched");
        }
        previous
    }
}

impl Default for EnableSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}
