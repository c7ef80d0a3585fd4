//! Step-by-step playback of one token move.
//!
//! At most one job is active per room. The scheduler is passive: the
//! runner's cadence calls [`AnimationScheduler::advance`] once per tick and
//! the scheduler reports what moved.

use std::collections::BTreeSet;
use std::fmt;

use boardroom_games::{Step, StepKind, SubjectId};
use tracing::{debug, warn};

/// Identifier of one animation job, unique per scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// One subject walking a path.
#[derive(Debug, Clone)]
pub struct AnimationJob<P> {
    pub id: JobId,
    pub subject: SubjectId,
    pub steps: Vec<Step<P>>,
    /// Steps already played.
    pub current: usize,
    /// Special step kinds whose cue already fired in this job.
    pub cues_fired: BTreeSet<StepKind>,
    /// Whether finishing this job owes the server a `completeTurn`.
    pub ack_owed: bool,
}

impl<P> AnimationJob<P> {
    pub fn is_done(&self) -> bool {
        self.current >= self.steps.len()
    }

    pub fn remaining(&self) -> usize {
        self.steps.len().saturating_sub(self.current)
    }
}

/// A job that just played its last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedJob {
    pub id: JobId,
    pub subject: SubjectId,
    pub ack_owed: bool,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome<P> {
    pub job: JobId,
    pub subject: SubjectId,
    pub position: P,
    pub kind: StepKind,
    /// Zero-based index of the step just played.
    pub index: usize,
    /// Set the first time a special step kind plays in this job.
    pub cue: Option<StepKind>,
    /// Set on the tick that plays the final step.
    pub completed: Option<CompletedJob>,
}

/// Holds the active animation job, if any.
#[derive(Debug)]
pub struct AnimationScheduler<P> {
    active: Option<AnimationJob<P>>,
    next_id: u64,
}

impl<P> Default for AnimationScheduler<P> {
    fn default() -> Self {
        Self {
            active: None,
            next_id: 1,
        }
    }
}

impl<P: Clone + fmt::Debug> AnimationScheduler<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a job. An empty path starts nothing and returns `None`.
    ///
    /// A job already running is abandoned first; callers normally
    /// supersede explicitly, so reaching this is logged.
    pub fn schedule(
        &mut self,
        subject: SubjectId,
        steps: Vec<Step<P>>,
        ack_owed: bool,
    ) -> Option<JobId> {
        if steps.is_empty() {
            return None;
        }
        if let Some(old) = self.active.take() {
            warn!(job = %old.id, subject = %old.subject, "scheduling over an active job, abandoning it");
        }

        let id = JobId(self.next_id);
        self.next_id += 1;
        debug!(job = %id, %subject, steps = steps.len(), ack_owed, "animation scheduled");
        self.active = Some(AnimationJob {
            id,
            subject,
            steps,
            current: 0,
            cues_fired: BTreeSet::new(),
            ack_owed,
        });
        Some(id)
    }

    /// Plays the next step of the active job. Returns `None` when idle.
    ///
    /// The job is retired on the same tick as its final step, so a
    /// completed job is never observed as active.
    pub fn advance(&mut self) -> Option<StepOutcome<P>> {
        let job = self.active.as_mut()?;
        let index = job.current;
        let step = job.steps.get(index)?.clone();
        job.current += 1;

        let cue = (step.kind.is_special() && job.cues_fired.insert(step.kind)).then_some(step.kind);
        let (id, subject) = (job.id, job.subject);

        let completed = if job.is_done() {
            let ack_owed = job.ack_owed;
            self.active = None;
            debug!(job = %id, %subject, "animation complete");
            Some(CompletedJob {
                id,
                subject,
                ack_owed,
            })
        } else {
            None
        };

        Some(StepOutcome {
            job: id,
            subject,
            position: step.position,
            kind: step.kind,
            index,
            cue,
            completed,
        })
    }

    /// Drops the active job without finishing it.
    pub fn abandon(&mut self) -> Option<AnimationJob<P>> {
        let job = self.active.take()?;
        debug!(job = %job.id, subject = %job.subject, played = job.current, "animation abandoned");
        Some(job)
    }

    pub fn active(&self) -> Option<&AnimationJob<P>> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
