use dashmap::DashMap;
use dreammap_core::{DreamError, Result};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const IDLE: u8 = 0;
const SUBMITTING: u8 = 1;
const COMPLETED: u8 = 2;
const FAILED: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Completed,
    Failed,
}

impl SubmissionState {
    fn from_u8(value: u8) -> Self {
        match value {
            IDLE => SubmissionState::Idle,
            SUBMITTING => SubmissionState::Submitting,
            COMPLETED => SubmissionState::Completed,
            FAILED => SubmissionState::Failed,
            _ => SubmissionState::Idle,
        }
    }
}

/// Per-session submission state.
///
/// `Idle | Completed | Failed -> Submitting` is a single atomic transition,
/// so two concurrent submits cannot both get through.
#[derive(Debug, Default)]
pub struct SubmissionGuard {
    state: AtomicU8,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmissionState {
        SubmissionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Enter `Submitting`, or fail with `SubmissionInProgress` if a
    /// submission is already running. The returned ticket must be finished;
    /// dropping it unfinished records a failure.
    pub fn begin(&self) -> Result<SubmissionTicket<'_>> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != SUBMITTING).then_some(SUBMITTING)
            })
            .map_err(|_| DreamError::SubmissionInProgress)?;

        Ok(SubmissionTicket {
            guard: self,
            finished: false,
        })
    }
}

pub struct SubmissionTicket<'a> {
    guard: &'a SubmissionGuard,
    finished: bool,
}

impl SubmissionTicket<'_> {
    pub fn complete(mut self) {
        self.finish(COMPLETED);
    }

    pub fn fail(mut self) {
        self.finish(FAILED);
    }

    fn finish(&mut self, state: u8) {
        self.guard.state.store(state, Ordering::Release);
        self.finished = true;
    }
}

impl Drop for SubmissionTicket<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.guard.state.store(FAILED, Ordering::Release);
        }
    }
}

/// Guards keyed by client session id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SubmissionGuard>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guard_for(&self, session_id: &str) -> Arc<SubmissionGuard> {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    pub fn state_of(&self, session_id: &str) -> SubmissionState {
        self.sessions
            .get(session_id)
            .map(|guard| guard.state())
            .unwrap_or(SubmissionState::Idle)
    }

    /// Drop a session's guard once nobody else holds it and it is not
    /// submitting. Returns whether the entry was evicted. Callers release
    /// their own `Arc` first; a later `guard_for` starts again from `Idle`.
    pub fn release(&self, session_id: &str) -> bool {
        self.sessions
            .remove_if(session_id, |_, guard| {
                Arc::strong_count(guard) == 1 && guard.state() != SubmissionState::Submitting
            })
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
