use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Tournament;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    #[default]
    Upcoming,
    Active,
    Finished,
}

impl TournamentStatus {
    pub fn label(self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "Upcoming",
            TournamentStatus::Active => "Active",
            TournamentStatus::Finished => "Finished",
        }
    }

    /// Statuses only move forward: upcoming -> active -> finished.
    pub fn can_transition_to(self, next: TournamentStatus) -> bool {
        next >= self
    }
}

/// Status a tournament should have at `now`.
///
/// The only automatic transition is upcoming -> active once the start time
/// has been reached. Finishing is an explicit admin action.
pub fn derive_status(
    status: TournamentStatus,
    start_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> TournamentStatus {
    if status == TournamentStatus::Upcoming && start_time <= now {
        TournamentStatus::Active
    } else {
        status
    }
}

/// Applies [`derive_status`] to every tournament and returns the promoted ids.
pub fn refresh_statuses(tournaments: &mut [Tournament], now: DateTime<Utc>) -> Vec<u64> {
    let mut promoted = Vec::new();
    for t in tournaments.iter_mut() {
        let next = derive_status(t.status, t.start_time, now);
        if next != t.status {
            t.status = next;
            promoted.push(t.id);
        }
    }
    promoted
}
