//! Fixed-delay playback clock for Boardroom animations.
//!
//! A [`Cadence`] fires one step every `step_delay` while it is *armed* and
//! pends forever while it is idle or paused. The room runner arms it when
//! an animation job starts and disarms it when the job drains, so an idle
//! room has no timer at all.
//!
//! # Integration
//!
//! The cadence sits inside the room runner's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* user intent */ }
//!         frame = conn.recv() => { /* server event */ }
//!         step = cadence.wait_for_step() => {
//!             for _ in 0..step.steps_due {
//!                 effects.extend(controller.advance());
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! `wait_for_step` only mutates the cadence after its sleep completes, so
//! dropping the future when another branch wins loses nothing.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a step fires late (e.g. the page was backgrounded and
/// the timer was throttled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatePolicy {
    /// Fire a single step and resume the cadence from now. The animation
    /// slows down but never jumps.
    #[default]
    Skip,
    /// Report the missed steps in [`StepInfo::steps_due`] so the caller can
    /// advance several at once, capped at `max_catchup` extra steps.
    CatchUp {
        /// Hard cap on extra steps reported by a single late wake-up.
        max_catchup: u32,
    },
}

/// Configuration for a [`Cadence`].
#[derive(Debug, Clone)]
pub struct CadenceConfig {
    /// Delay between two consecutive steps.
    pub step_delay: Duration,
    /// Late-step handling.
    pub policy: LatePolicy,
    /// Collect per-step metrics.
    pub metrics_enabled: bool,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            step_delay: Self::DEFAULT_STEP_DELAY,
            policy: LatePolicy::default(),
            metrics_enabled: true,
        }
    }
}

impl CadenceConfig {
    /// Delay used when a game doesn't ask for its own.
    pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(300);
    /// Fastest supported cadence.
    pub const MIN_STEP_DELAY: Duration = Duration::from_millis(50);
    /// Slowest supported cadence.
    pub const MAX_STEP_DELAY: Duration = Duration::from_secs(2);

    /// Create a config for a specific step delay with default settings.
    pub fn with_delay(step_delay: Duration) -> Self {
        Self {
            step_delay,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`Cadence::new`]. `step_delay` is clamped
    /// to [`Self::MIN_STEP_DELAY`]..=[`Self::MAX_STEP_DELAY`].
    pub fn validated(mut self) -> Self {
        let clamped = self
            .step_delay
            .clamp(Self::MIN_STEP_DELAY, Self::MAX_STEP_DELAY);
        if clamped != self.step_delay {
            warn!(
                requested_ms = self.step_delay.as_millis() as u64,
                clamped_ms = clamped.as_millis() as u64,
                "step_delay out of range, clamping"
            );
            self.step_delay = clamped;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Step info (returned to caller each step)
// ---------------------------------------------------------------------------

/// Information about a fired step, returned by [`Cadence::wait_for_step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInfo {
    /// Steps fired since the cadence was last armed (starts at 1).
    pub step: u64,
    /// `true` if this step woke up more than 10% past its deadline.
    pub late: bool,
    /// How many animation steps the caller should advance now. Always 1
    /// under [`LatePolicy::Skip`].
    pub steps_due: u32,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics for a cadence.
#[derive(Debug, Clone, Default)]
pub struct CadenceMetrics {
    /// Total steps fired.
    pub total_steps: u64,
    /// Steps that woke up late.
    pub total_late: u64,
    /// Missed steps that were not reported back (dropped by the policy).
    pub total_dropped: u64,
    /// Worst lateness observed.
    pub max_lateness: Duration,
}

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

/// Fixed-delay step clock. One per room runner.
#[derive(Debug)]
pub struct Cadence {
    config: CadenceConfig,
    /// When the next step should fire. `None` while disarmed.
    next_step: Option<Instant>,
    steps_since_arm: u64,
    paused: bool,
    metrics: CadenceMetrics,
}

impl Cadence {
    /// Create a disarmed cadence from config.
    pub fn new(config: CadenceConfig) -> Self {
        let config = config.validated();
        debug!(
            step_ms = config.step_delay.as_millis() as u64,
            policy = ?config.policy,
            "cadence created"
        );
        Self {
            config,
            next_step: None,
            steps_since_arm: 0,
            paused: false,
            metrics: CadenceMetrics::default(),
        }
    }

    /// Create a cadence for a specific delay with default settings.
    pub fn with_delay(step_delay: Duration) -> Self {
        Self::new(CadenceConfig::with_delay(step_delay))
    }

    /// Start firing steps. The first step is due one `step_delay` from now.
    ///
    /// Arming an already-armed cadence keeps its current deadline, so the
    /// runner can call this after every event without stretching a step.
    pub fn arm(&mut self) {
        if self.next_step.is_none() {
            self.next_step = Some(Instant::now() + self.config.step_delay);
            self.steps_since_arm = 0;
            trace!("cadence armed");
        }
    }

    /// Stop firing steps. `wait_for_step` pends until [`arm`](Self::arm).
    pub fn disarm(&mut self) {
        if self.next_step.take().is_some() {
            trace!(steps = self.steps_since_arm, "cadence disarmed");
        }
    }

    /// Whether a step deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.next_step.is_some()
    }

    /// Change the delay. Takes effect from the next scheduled step.
    pub fn set_step_delay(&mut self, step_delay: Duration) {
        self.config = CadenceConfig {
            step_delay,
            ..self.config.clone()
        }
        .validated();
    }

    /// Wait until the next step is due.
    ///
    /// While disarmed or paused this future pends forever. It never
    /// resolves on its own, but `tokio::select!` keeps polling the other
    /// branches.
    pub async fn wait_for_step(&mut self) -> StepInfo {
        let deadline = match self.next_step {
            Some(next) if !self.paused => next,
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(deadline).await;

        let now = Instant::now();
        let delay = self.config.step_delay;
        let late_by = now.saturating_duration_since(deadline);
        let late = late_by > delay / 10;
        let missed = (late_by.as_nanos() / delay.as_nanos()) as u64;

        let steps_due = match self.config.policy {
            LatePolicy::Skip => {
                self.metrics.total_dropped += missed;
                1
            }
            LatePolicy::CatchUp { max_catchup } => {
                let extra = missed.min(max_catchup as u64);
                self.metrics.total_dropped += missed - extra;
                1 + extra as u32
            }
        };

        if late {
            self.metrics.total_late += 1;
            warn!(
                late_ms = late_by.as_secs_f64() * 1000.0,
                missed,
                steps_due,
                "animation step fired late"
            );
        }

        // Always schedule from now, not from the missed deadline.
        self.next_step = Some(now + delay);
        self.steps_since_arm += 1;
        self.metrics.total_steps += 1;
        if self.config.metrics_enabled && late_by > self.metrics.max_lateness {
            self.metrics.max_lateness = late_by;
        }

        trace!(step = self.steps_since_arm, late, "step fired");

        StepInfo {
            step: self.steps_since_arm,
            late,
            steps_due,
        }
    }

    /// Pause stepping. Safe to call multiple times.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(step = self.steps_since_arm, "cadence paused");
        }
    }

    /// Resume after a pause.
    ///
    /// An armed cadence restarts its deadline at `now + step_delay`, so
    /// time spent paused never turns into a burst of late steps.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if self.next_step.is_some() {
                self.next_step = Some(Instant::now() + self.config.step_delay);
            }
            debug!(step = self.steps_since_arm, "cadence resumed");
        }
    }

    /// Whether the cadence is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The configured step delay.
    pub fn step_delay(&self) -> Duration {
        self.config.step_delay
    }

    /// Current metrics.
    pub fn metrics(&self) -> &CadenceMetrics {
        &self.metrics
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::new(CadenceConfig::default())
    }
}
