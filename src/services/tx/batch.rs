// SPDX-License-Identifier: MIT

use crate::services::store::events::{EventBus, StoreEvent};
use std::sync::Mutex;
use uuid::Uuid;

/// Per-step lifecycle. `Done` is the terminal state for steps that turned
/// out to be unnecessary (an allowance that was already sufficient) and is
/// reached directly from `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Waiting,
    Pending,
    Submitted,
    Confirmed,
    Rejected,
    Done,
}

impl TxStatus {
    fn rank(self) -> u8 {
        match self {
            TxStatus::Waiting => 0,
            TxStatus::Pending => 1,
            TxStatus::Submitted => 2,
            TxStatus::Confirmed | TxStatus::Rejected | TxStatus::Done => 3,
        }
    }
}

/// Announcement shape for a staged step, before anything has run.
#[derive(Debug, Clone)]
pub struct TxStepInfo {
    pub id: Uuid,
    pub description: String,
}

#[derive(Debug, Clone)]
struct TxStep {
    id: Uuid,
    description: String,
    status: TxStatus,
}

/// An ordered batch of transaction steps tied to one user operation.
/// Statuses only ever move forward; a stale update arriving after a step
/// reached a terminal state is dropped.
pub struct TxQueue {
    bus: EventBus,
    steps: Mutex<Vec<TxStep>>,
}

impl TxQueue {
    /// Stage a batch and announce it. Step ids are returned in the same
    /// order as `descriptions`.
    pub fn stage(bus: EventBus, title: &str, descriptions: &[&str]) -> (Self, Vec<Uuid>) {
        let steps: Vec<TxStep> = descriptions
            .iter()
            .map(|description| TxStep {
                id: Uuid::new_v4(),
                description: description.to_string(),
                status: TxStatus::Waiting,
            })
            .collect();
        let ids: Vec<Uuid> = steps.iter().map(|s| s.id).collect();

        bus.publish(StoreEvent::TxQueued {
            title: title.to_string(),
            steps: steps
                .iter()
                .map(|s| TxStepInfo {
                    id: s.id,
                    description: s.description.clone(),
                })
                .collect(),
        });

        (
            Self {
                bus,
                steps: Mutex::new(steps),
            },
            ids,
        )
    }

    fn advance(&self, id: Uuid, status: TxStatus, hash: Option<String>, detail: Option<String>) {
        let mut steps = self.steps.lock().unwrap_or_else(|e| e.into_inner());
        let Some(step) = steps.iter_mut().find(|s| s.id == id) else {
            tracing::warn!(target: "tx_queue", %id, "Status update for unknown step");
            return;
        };
        if status.rank() <= step.status.rank() {
            tracing::warn!(
                target: "tx_queue",
                %id,
                from = ?step.status,
                to = ?status,
                "Dropping backward status transition"
            );
            return;
        }
        step.status = status;
        drop(steps);

        self.bus.publish(StoreEvent::TxStatus {
            id,
            status,
            hash,
            detail,
        });
    }

    pub fn pending(&self, id: Uuid) {
        self.advance(id, TxStatus::Pending, None, None);
    }

    pub fn submitted(&self, id: Uuid, hash: &str) {
        self.advance(id, TxStatus::Submitted, Some(hash.to_string()), None);
    }

    pub fn confirmed(&self, id: Uuid, hash: &str) {
        self.advance(id, TxStatus::Confirmed, Some(hash.to_string()), None);
    }

    pub fn rejected(&self, id: Uuid, reason: &str) {
        self.advance(id, TxStatus::Rejected, None, Some(reason.to_string()));
    }

    /// Mark a step as not needed, with a short human-readable note.
    pub fn done(&self, id: Uuid, note: &str) {
        self.advance(id, TxStatus::Done, None, Some(note.to_string()));
    }

    pub fn status_of(&self, id: Uuid) -> Option<TxStatus> {
        self.steps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.status)
    }
}
