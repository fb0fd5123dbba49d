use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==================== USER PROFILE ====================

/// Durable player profile. The wire format is camelCase because the clients
/// are browser JS; every field carries a default so snapshots from older
/// client builds still parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub avatar_skin_id: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub auth_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    // Monotonic counters: merges only ever take the max
    pub best_time: u64,
    pub games_played: u64,
    pub total_time_survived: u64,
    pub total_accumulated_survival_time: u64,
    pub total_near_misses: u64,
    pub coins: u64,

    pub unlocked_skin_ids: BTreeSet<String>,
    pub unlocked_map_ids: BTreeSet<String>,

    // Assigned once on first sync, immutable thereafter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friend_code: Option<String>,
    pub friends: BTreeSet<String>,
    pub friend_requests: Vec<FriendRequest>,

    // Opaque replay blob, replaced only when best_time improves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_run_ghost: Option<serde_json::Value>,

    pub map_stats: BTreeMap<String, MapStats>,

    pub daily_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_daily_attempt_date: Option<String>,

    pub claimed_reward_dates: BTreeSet<String>,
    pub claimed_achievement_ids: BTreeSet<String>,
    pub completed_challenge_ids: BTreeSet<String>,
}

/// Per-map aggregate; every field is independently monotonic-max.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MapStats {
    pub best_time: u64,
    pub games_played: u64,
    pub total_time_survived: u64,
    pub near_misses: u64,
}

impl MapStats {
    pub fn merge_from(&mut self, other: &MapStats) {
        self.best_time = self.best_time.max(other.best_time);
        self.games_played = self.games_played.max(other.games_played);
        self.total_time_survived = self.total_time_survived.max(other.total_time_survived);
        self.near_misses = self.near_misses.max(other.near_misses);
    }
}

// ==================== SOCIAL ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// Stored inside the target user's profile only; removed on response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FriendRequest {
    pub id: String,
    pub from_user_id: String,
    pub from_user_name: String,
    pub from_user_skin: String,
    pub timestamp: i64,
    pub status: RequestStatus,
}

/// Lightweight friend view, read live from each friend's profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendView {
    pub id: String,
    pub display_name: String,
    pub avatar_skin_id: String,
    pub best_time: u64,
    pub friend_code: Option<String>,
}

// ==================== CHALLENGE ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Completed,
}

impl ChallengeStatus {
    /// Declined and completed challenges accept no further updates.
    pub fn is_terminal(self) -> bool {
        matches!(self, ChallengeStatus::Declined | ChallengeStatus::Completed)
    }
}

/// Pairwise asynchronous score duel. Both players run the same map + seed;
/// `winner_id` is stored verbatim when a client supplies it, never computed
/// server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Challenge {
    pub id: String,
    pub from_user_id: String,
    pub from_user_name: String,
    pub from_user_skin: String,
    pub to_user_id: String,
    pub to_user_name: String,
    pub map_id: String,
    pub seed: i64,
    pub status: ChallengeStatus,
    pub challenger_score: u64,
    pub target_score: Option<u64>,
    pub timestamp: i64,
    pub winner_id: Option<String>,
}

// ==================== LEADERBOARD ====================

/// One row of a scoped leaderboard. Ranks are 1-based and contiguous,
/// reassigned on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    pub score: u64,
    pub skin_id: String,
    pub user_id: String,
    pub date: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResult {
    pub rank: u32,
    pub score: u64,
}

// ==================== REWARD ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardStatus {
    Pending,
    Claimed,
}

/// Computed on demand from yesterday's daily-challenge leaderboard; never
/// stored as a standing object. Claiming materializes into the profile's
/// `claimed_reward_dates` and coin balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub date: String,
    pub rank: u32,
    pub coins: u64,
    pub map_name: String,
    pub status: RewardStatus,
}

// ==================== API ENVELOPE ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
