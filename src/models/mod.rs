pub mod user;

// Re-export commonly used types so other modules can use `crate::models::X`
pub use user::{
    ApiResponse,
    Challenge,
    ChallengeStatus,
    FriendRequest,
    FriendView,
    LeaderboardEntry,
    MapStats,
    RankResult,
    RequestStatus,
    Reward,
    RewardStatus,
    UserProfile,
};
