//! Status transitions.
//!
//! Every mutating command goes through one [`TransitionPolicy`] per entity
//! kind. Pick commands are always guarded; update commands follow the
//! project's configured [`GuardMode`].

use crate::document;
use crate::error::{DocketError, Result};
use crate::id::EntityId;
use crate::types::{EntityKind, Status};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardMode {
    /// Any status of the kind may be set.
    #[default]
    Permissive,
    /// Re-entering the current status and leaving a terminal status are
    /// rejected.
    Guarded,
}

/// Which command family is asking for the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Pick,
    Update,
}

#[derive(Debug, Clone, Copy)]
pub struct TransitionPolicy {
    kind: EntityKind,
    update_guard: GuardMode,
}

impl TransitionPolicy {
    pub fn new(kind: EntityKind, update_guard: GuardMode) -> Self {
        Self { kind, update_guard }
    }

    pub fn check(&self, id: EntityId, from: Status, to: Status, intent: Intent) -> Result<()> {
        let blocked = |reason: String| DocketError::TransitionBlocked {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            reason,
        };

        if !self.kind.accepts(to) {
            return Err(DocketError::InvalidStatus {
                kind: self.kind.as_str().to_string(),
                value: to.to_string(),
            });
        }

        match intent {
            Intent::Pick => {
                if from.is_in_progress() {
                    return Err(blocked("already in progress".to_string()));
                }
                if from.is_completed() {
                    return Err(blocked("already complete".to_string()));
                }
            }
            Intent::Update => {
                if self.update_guard == GuardMode::Guarded {
                    if from == to {
                        return Err(blocked(format!("already {from}")));
                    }
                    if from.is_terminal() {
                        return Err(blocked(format!("{from} is a terminal status")));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Rewrite the document's status block so exactly `to` is checked.
/// A document without a `## Status` section is rejected rather than guessed at.
pub fn apply(text: &str, id: EntityId, to: Status, path: &str) -> Result<String> {
    document::replace_status_block(text, id.kind, to).ok_or_else(|| {
        DocketError::MalformedDocument {
            path: path.to_string(),
            reason: "no '## Status' section".to_string(),
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
