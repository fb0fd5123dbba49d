/// Application constants

// Leaderboard configuration
pub const LEADERBOARD_CAP: usize = 100;

// Daily challenge reward (coins per podium rank)
pub const REWARD_COINS_RANK_1: u64 = 1000;
pub const REWARD_COINS_RANK_2: u64 = 750;
pub const REWARD_COINS_RANK_3: u64 = 500;

// Map rotation for the daily challenge. The index for a given date is derived
// from a seeded hash of the date string, so server and clients agree without
// shared state. Order and contents must match the client build.
pub const DAILY_MAP_ROTATION: &[&str] = &["pond", "glacier", "river", "harbor", "blackice"];

// Friend codes are 6 uppercase hex chars (3 random bytes)
pub const FRIEND_CODE_BYTES: usize = 3;
