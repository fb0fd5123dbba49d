//! Daily-challenge podium rewards, computed lazily and granted exactly once.

use crate::constants::{
    DAILY_MAP_ROTATION, REWARD_COINS_RANK_1, REWARD_COINS_RANK_2, REWARD_COINS_RANK_3,
};
use crate::error::{AppError, Result};
use crate::models::{LeaderboardEntry, Reward, RewardStatus, UserProfile};
use crate::store::{get_json, keys, put_json, KeyLocks, Storage};

use super::utc_yesterday;

/// FNV-1a over the date string, then one multiplicative scramble so adjacent
/// dates do not land on adjacent rotation slots. Every client and the server
/// derive the same map for a day without any shared state.
pub fn seeded_daily_map_index(date: &str, len: usize) -> usize {
    let mut h: u32 = 0x811c_9dc5;
    for b in date.bytes() {
        h ^= u32::from(b);
        h = h.wrapping_mul(0x0100_0193);
    }
    h = h.wrapping_mul(0x9e37_79b1);
    (h >> 8) as usize % len
}

pub fn daily_map_for(date: &str) -> &'static str {
    DAILY_MAP_ROTATION[seeded_daily_map_index(date, DAILY_MAP_ROTATION.len())]
}

pub fn coins_for_rank(rank: u32) -> Option<u64> {
    match rank {
        1 => Some(REWARD_COINS_RANK_1),
        2 => Some(REWARD_COINS_RANK_2),
        3 => Some(REWARD_COINS_RANK_3),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClaimOutcome {
    pub granted: bool,
    pub balance: u64,
}

/// A pending reward for yesterday's daily challenge, or None when the user
/// already claimed it, did not place, or placed below the podium.
pub async fn check_pending_reward(store: &dyn Storage, user_id: &str) -> Result<Option<Reward>> {
    let profile: UserProfile = get_json(store, &keys::user(user_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

    let yesterday = utc_yesterday();
    if profile.claimed_reward_dates.contains(&yesterday) {
        return Ok(None);
    }

    let list: Vec<LeaderboardEntry> = get_json(store, &keys::lb_daily_challenge(&yesterday))
        .await?
        .unwrap_or_default();
    let Some(entry) = list.iter().find(|e| e.user_id == user_id) else {
        return Ok(None);
    };
    let Some(coins) = coins_for_rank(entry.rank) else {
        return Ok(None);
    };

    Ok(Some(Reward {
        id: format!("{yesterday}:{user_id}"),
        date: yesterday.clone(),
        rank: entry.rank,
        coins,
        map_name: daily_map_for(&yesterday).to_string(),
        status: RewardStatus::Pending,
    }))
}

/// Grant a reward exactly once. `claimed_reward_dates` is the sole
/// idempotency guard; the profile is overwritten directly (no merge) because
/// this path is the field's only writer at claim time. A repeat claim is a
/// non-granting outcome with the unchanged balance.
pub async fn claim_reward(
    store: &dyn Storage,
    locks: &KeyLocks,
    user_id: &str,
    date: &str,
    coins: u64,
) -> Result<ClaimOutcome> {
    let key = keys::user(user_id);
    let lock = locks.lock(&key).await;
    let _guard = lock.lock().await;

    let mut profile: UserProfile = get_json(store, &key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

    if profile.claimed_reward_dates.contains(date) {
        return Ok(ClaimOutcome {
            granted: false,
            balance: profile.coins,
        });
    }

    profile.claimed_reward_dates.insert(date.to_string());
    profile.coins = profile.coins.saturating_add(coins);
    put_json(store, &key, &profile).await?;

    tracing::info!(user = %user_id, %date, coins, balance = profile.coins, "Daily reward claimed");
    Ok(ClaimOutcome {
        granted: true,
        balance: profile.coins,
    })
}
