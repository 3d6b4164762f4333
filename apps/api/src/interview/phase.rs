//! Interview lifecycle phases.
//!
//!   create: Draft → Generating → Saved
//!   edit:   Saved → Generating → Saved
//!   remove: Saved → Deleted
//!
//! Records at rest are not tracked. `PhaseTable` holds the phase of every
//! interview with an operation in flight, so a second edit or a delete that
//! arrives while questions are regenerating is rejected instead of racing.
//! Dropping a `PhaseGuard` without settling it returns the record to the phase
//! it started from; that covers generation failures and cancelled requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewPhase {
    Draft,
    Generating,
    Saved,
    Deleted,
}

impl InterviewPhase {
    pub fn can_transition_to(self, next: InterviewPhase) -> bool {
        use InterviewPhase::*;
        matches!(
            (self, next),
            (Draft, Generating)
                | (Generating, Saved)
                | (Generating, Draft)
                | (Saved, Generating)
                | (Saved, Deleted)
        )
    }
}

#[derive(Debug, Default)]
pub struct PhaseTable {
    in_flight: Mutex<HashMap<Uuid, InterviewPhase>>,
}

impl PhaseTable {
    // the map is only touched in short non-panicking sections
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, InterviewPhase>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Phase of `id` if an operation on it is in flight.
    pub fn in_flight(&self, id: Uuid) -> Option<InterviewPhase> {
        self.lock().get(&id).copied()
    }

    /// Moves `id` from its current phase (`at_rest` when nothing is in flight)
    /// to `next`. Fails with `Conflict` if that transition is not allowed.
    pub fn enter(
        self: &Arc<Self>,
        id: Uuid,
        at_rest: InterviewPhase,
        next: InterviewPhase,
    ) -> Result<PhaseGuard, AppError> {
        let mut in_flight = self.lock();
        let current = in_flight.get(&id).copied().unwrap_or(at_rest);
        if !current.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Interview {id} is {current:?} and cannot move to {next:?}"
            )));
        }
        in_flight.insert(id, next);
        debug!("Interview {id}: {current:?} -> {next:?}");

        Ok(PhaseGuard {
            table: Arc::clone(self),
            id,
            at_rest,
            phase: next,
            settled: false,
        })
    }
}

/// Holds an interview in its in-flight phase until settled or dropped.
#[derive(Debug)]
pub struct PhaseGuard {
    table: Arc<PhaseTable>,
    id: Uuid,
    at_rest: InterviewPhase,
    phase: InterviewPhase,
    settled: bool,
}

impl PhaseGuard {
    /// Finishes the operation in phase `next` and stops tracking the record.
    /// Settling in the phase already held (a completed delete) is allowed.
    pub fn settle(mut self, next: InterviewPhase) -> Result<InterviewPhase, AppError> {
        if next != self.phase && !self.phase.can_transition_to(next) {
            // Drop returns the record to its resting phase
            return Err(AppError::Internal(anyhow::anyhow!(
                "Invalid interview transition {:?} -> {next:?} for {}",
                self.phase,
                self.id
            )));
        }
        self.table.lock().remove(&self.id);
        self.settled = true;
        if next != self.phase {
            debug!("Interview {}: {:?} -> {next:?}", self.id, self.phase);
        }
        Ok(next)
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.table.lock().remove(&self.id);
        debug!(
            "Interview {}: {:?} -> {:?} (operation abandoned)",
            self.id, self.phase, self.at_rest
        );
    }
}
