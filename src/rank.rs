use std::cmp::Reverse;

use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RankTier {
    Novice,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Legend,
}

// Highest threshold first.
const THRESHOLDS: [(u64, RankTier); 7] = [
    (10_000, RankTier::Legend),
    (5_000, RankTier::Master),
    (2_000, RankTier::Diamond),
    (1_000, RankTier::Platinum),
    (500, RankTier::Gold),
    (100, RankTier::Silver),
    (50, RankTier::Bronze),
];

impl RankTier {
    pub fn label(self) -> &'static str {
        match self {
            RankTier::Novice => "Novice",
            RankTier::Bronze => "Bronze",
            RankTier::Silver => "Silver",
            RankTier::Gold => "Gold",
            RankTier::Platinum => "Platinum",
            RankTier::Diamond => "Diamond",
            RankTier::Master => "Master",
            RankTier::Legend => "Legend",
        }
    }
}

pub fn rank_for_points(points: u64) -> RankTier {
    THRESHOLDS
        .iter()
        .find(|(min, _)| points >= *min)
        .map(|(_, tier)| *tier)
        .unwrap_or(RankTier::Novice)
}

/// Points still needed to reach the next tier; `None` at the top.
pub fn points_to_next(points: u64) -> Option<u64> {
    THRESHOLDS
        .iter()
        .rev()
        .find(|(min, _)| *min > points)
        .map(|(min, _)| min - points)
}

/// Leaderboard order: points descending, ties keep their incoming order.
pub fn sort_by_points(users: &mut [User]) {
    users.sort_by_key(|u| Reverse(u.stats.points));
}
