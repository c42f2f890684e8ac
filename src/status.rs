use serde::{Deserialize, Serialize};

/// Lifecycle status shared by diet details and exercises. Both state machines
/// have the same shape: `Scheduled` is the initial state, `Complete` is
/// terminal, `Incomplete` is terminal for the sweeper but a manual success
/// action may still override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entry_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    Scheduled,
    Complete,
    Incomplete,
}

impl EntryStatus {
    /// User-initiated "mark success" action. An `Incomplete` entry is allowed
    /// to go to `Complete` (manual override); marking an already `Complete`
    /// entry is a no-op.
    pub fn mark_complete(self) -> EntryStatus {
        EntryStatus::Complete
    }

    /// Sweeper-initiated demotion. Only `Scheduled` entries are eligible;
    /// `Complete` and `Incomplete` are never touched by the sweep.
    pub fn demote_if_overdue(self) -> Option<EntryStatus> {
        match self {
            EntryStatus::Scheduled => Some(EntryStatus::Incomplete),
            EntryStatus::Complete | EntryStatus::Incomplete => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_completes_on_success() {
        assert_eq!(
            EntryStatus::Scheduled.mark_complete(),
            EntryStatus::Complete
        );
    }

    #[test]
    fn incomplete_can_be_manually_overridden() {
        assert_eq!(
            EntryStatus::Incomplete.mark_complete(),
            EntryStatus::Complete
        );
    }

    #[test]
    fn completing_twice_is_a_noop() {
        assert_eq!(EntryStatus::Complete.mark_complete(), EntryStatus::Complete);
    }

    #[test]
    fn sweeper_only_demotes_scheduled() {
        assert_eq!(
            EntryStatus::Scheduled.demote_if_overdue(),
            Some(EntryStatus::Incomplete)
        );
        assert_eq!(EntryStatus::Complete.demote_if_overdue(), None);
        assert_eq!(EntryStatus::Incomplete.demote_if_overdue(), None);
    }
}
