//! Drag gesture state machine
//!
//! ```text
//! Idle ──begin──▶ Dragging ──drop──▶ Committing ──▶ Settled | RolledBack
//!   ▲               │                    │
//!   └────cancel─────┘◀──── no-op ────────┘
//! ```
//!
//! Only one gesture exists at a time. A drop may arrive without a prior
//! `begin` (a plain API call); it then starts directly in `Committing`.

use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::ItemKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging { kind: ItemKind, active_id: i64 },
    Committing { kind: ItemKind, active_id: i64 },
    Settled { kind: ItemKind, version: u64 },
    RolledBack { kind: ItemKind },
}

/// How a commit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitEnd {
    NoOp,
    Settled(u64),
    RolledBack,
}

#[derive(Debug, Default)]
pub struct GestureMachine {
    phase: DragPhase,
}

impl GestureMachine {
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            DragPhase::Dragging { .. } | DragPhase::Committing { .. }
        )
    }

    /// Pointer picked up a record. No persistence happens while dragging.
    pub fn begin(&mut self, kind: ItemKind, active_id: i64) -> Result<(), AppError> {
        if self.is_busy() {
            return Err(self.busy_error());
        }
        self.phase = DragPhase::Dragging { kind, active_id };
        Ok(())
    }

    /// Pointer released with no drop handled (escape key, drag aborted)
    pub fn cancel(&mut self) {
        if matches!(self.phase, DragPhase::Dragging { .. }) {
            self.phase = DragPhase::Idle;
        }
    }

    /// Drop received; enter `Committing`
    ///
    /// Accepted from any idle-like phase, or from `Dragging` of the same record.
    pub fn commit(&mut self, kind: ItemKind, active_id: i64) -> Result<(), AppError> {
        match self.phase {
            DragPhase::Committing { .. } => return Err(self.busy_error()),
            DragPhase::Dragging {
                kind: dragging_kind,
                active_id: dragging_id,
            } if dragging_kind != kind || dragging_id != active_id => {
                return Err(self.busy_error());
            }
            _ => {}
        }
        self.phase = DragPhase::Committing { kind, active_id };
        Ok(())
    }

    /// Leave `Committing`
    pub fn finish(&mut self, end: CommitEnd) {
        let DragPhase::Committing { kind, .. } = self.phase else {
            return;
        };
        self.phase = match end {
            CommitEnd::NoOp => DragPhase::Idle,
            CommitEnd::Settled(version) => DragPhase::Settled { kind, version },
            CommitEnd::RolledBack => DragPhase::RolledBack { kind },
        };
    }

    /// Commit abandoned before it could finish
    pub fn abort(&mut self) {
        if matches!(self.phase, DragPhase::Committing { .. }) {
            self.phase = DragPhase::Idle;
        }
    }

    fn busy_error(&self) -> AppError {
        AppError::with_message(
            ErrorCode::GestureInProgress,
            format!("Another drag gesture is in progress ({:?})", self.phase),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_gesture() {
        let mut machine = GestureMachine::default();
        assert_eq!(machine.phase(), DragPhase::Idle);

        machine.begin(ItemKind::Category, 1).unwrap();
        assert!(machine.is_busy());

        machine.commit(ItemKind::Category, 1).unwrap();
        machine.finish(CommitEnd::Settled(4));
        assert_eq!(
            machine.phase(),
            DragPhase::Settled { kind: ItemKind::Category, version: 4 }
        );
        assert!(!machine.is_busy());
    }

    #[test]
    fn test_only_one_gesture_at_a_time() {
        let mut machine = GestureMachine::default();
        machine.begin(ItemKind::Product, 1).unwrap();

        let err = machine.begin(ItemKind::Product, 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::GestureInProgress);
        assert!(machine.commit(ItemKind::Product, 2).is_err());
        assert!(machine.commit(ItemKind::Category, 1).is_err());

        machine.commit(ItemKind::Product, 1).unwrap();
        assert!(machine.commit(ItemKind::Product, 1).is_err());
    }

    #[test]
    fn test_drop_without_begin() {
        let mut machine = GestureMachine::default();
        machine.commit(ItemKind::Category, 3).unwrap();
        machine.finish(CommitEnd::RolledBack);
        assert_eq!(machine.phase(), DragPhase::RolledBack { kind: ItemKind::Category });

        // a settled or rolled back gesture does not block the next one
        machine.commit(ItemKind::Product, 3).unwrap();
        machine.finish(CommitEnd::NoOp);
        assert_eq!(machine.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_cancel_and_abort() {
        let mut machine = GestureMachine::default();
        machine.begin(ItemKind::Category, 1).unwrap();
        machine.cancel();
        assert_eq!(machine.phase(), DragPhase::Idle);

        machine.commit(ItemKind::Category, 1).unwrap();
        machine.cancel();
        assert!(matches!(machine.phase(), DragPhase::Committing { .. }));
        machine.abort();
        assert_eq!(machine.phase(), DragPhase::Idle);
    }
}
