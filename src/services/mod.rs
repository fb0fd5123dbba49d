// All service modules
pub mod challenges;
pub mod leaderboard;
pub mod profile_merge;
pub mod rewards;
pub mod social;

// Re-export for convenience
pub use leaderboard::GameMode;

use chrono::{Duration, Utc};

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current UTC calendar day, the temporal window for daily scopes.
pub fn utc_today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

pub fn utc_yesterday() -> String {
    (Utc::now() - Duration::days(1))
        .format("%Y-%m-%d")
        .to_string()
}

/// Opaque record id, same minting idiom as friend codes but longer.
pub fn new_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_hex() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn utc_dates_are_iso_days() {
        let today = utc_today();
        assert_eq!(today.len(), 10);
        assert_eq!(&today[4..5], "-");
        assert!(utc_yesterday() < today);
    }
}
