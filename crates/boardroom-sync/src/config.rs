//! Sync configuration.

use std::time::Duration;

use tracing::warn;

/// Configuration for a [`ReconciliationController`](crate::ReconciliationController).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay between animation steps. `None` uses the game's own default
    /// ([`GameKind::step_delay`](boardroom_games::GameKind::step_delay)).
    pub step_delay: Option<Duration>,

    /// How long a transient notice (a server `error` event) stays visible.
    pub notice_ttl: Duration,

    /// Most snapshots held back behind an active animation. When full, the
    /// oldest buffered snapshot is dropped; the active job never is.
    pub max_buffered: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            step_delay: None,
            notice_ttl: Duration::from_secs(4),
            max_buffered: 64,
        }
    }
}

impl SyncConfig {
    /// Fix out-of-range values so the config is safe to use.
    ///
    /// Called automatically by the controller constructor.
    pub fn validated(mut self) -> Self {
        if self.max_buffered == 0 {
            warn!("max_buffered is 0, using 1");
            self.max_buffered = 1;
        }
        if self.notice_ttl.is_zero() {
            let fallback = Self::default().notice_ttl;
            warn!(fallback_ms = fallback.as_millis() as u64, "notice_ttl is 0, using default");
            self.notice_ttl = fallback;
        }
        self
    }
}
