//! Profile merge engine.
//!
//! Clients sync from multiple devices and after being offline, so an incoming
//! snapshot may be arbitrarily stale. The merge must be commutative and
//! idempotent for counters and sets (safe to apply out of order or twice)
//! while letting identity fields reflect the latest edit.

use crate::constants::FRIEND_CODE_BYTES;
use crate::error::Result;
use crate::models::UserProfile;
use crate::store::{get_json, keys, put_json, KeyLocks, Storage};

use super::{new_id, now_ms};

/// Reconcile an incoming snapshot against the stored profile.
///
/// With no existing profile the incoming one is adopted verbatim. Otherwise:
/// counters take the max, sets union, mapStats merge per-key per-field,
/// friend requests union by id (incoming wins), the ghost follows a strict
/// bestTime improvement, friendCode/createdAt are first-writer-wins, the
/// daily-attempt pair is date-priority, and identity fields are overwritten
/// by the client.
pub fn merge_profiles(
    existing: Option<&UserProfile>,
    incoming: UserProfile,
    now_ms: i64,
) -> UserProfile {
    let Some(existing) = existing else {
        let mut adopted = incoming;
        if adopted.created_at.is_none() {
            adopted.created_at = Some(now_ms);
        }
        adopted.updated_at = Some(now_ms);
        return adopted;
    };

    let mut merged = existing.clone();

    // Identity fields: the client is the source of truth for its latest edit
    merged.display_name = incoming.display_name;
    merged.avatar_skin_id = incoming.avatar_skin_id;
    merged.auth_provider = incoming.auth_provider;
    merged.email = incoming.email;

    // The ghost travels with the run that set best_time, so compare before
    // folding the counter
    if incoming.best_time > existing.best_time {
        merged.best_run_ghost = incoming.best_run_ghost;
    }

    // Monotonic counters
    merged.best_time = existing.best_time.max(incoming.best_time);
    merged.games_played = existing.games_played.max(incoming.games_played);
    merged.total_time_survived = existing
        .total_time_survived
        .max(incoming.total_time_survived);
    merged.total_accumulated_survival_time = existing
        .total_accumulated_survival_time
        .max(incoming.total_accumulated_survival_time);
    merged.total_near_misses = existing.total_near_misses.max(incoming.total_near_misses);
    merged.coins = existing.coins.max(incoming.coins);

    // Set unions
    merged.unlocked_skin_ids.extend(incoming.unlocked_skin_ids);
    merged.unlocked_map_ids.extend(incoming.unlocked_map_ids);
    merged.friends.extend(incoming.friends);
    merged
        .claimed_reward_dates
        .extend(incoming.claimed_reward_dates);
    merged
        .claimed_achievement_ids
        .extend(incoming.claimed_achievement_ids);
    merged
        .completed_challenge_ids
        .extend(incoming.completed_challenge_ids);

    // mapStats: union keys, per-field monotonic max
    for (map_id, stats) in incoming.map_stats {
        merged
            .map_stats
            .entry(map_id)
            .and_modify(|current| current.merge_from(&stats))
            .or_insert(stats);
    }

    // friendRequests: union by request id, incoming overwrites
    for request in incoming.friend_requests {
        if let Some(slot) = merged
            .friend_requests
            .iter_mut()
            .find(|r| r.id == request.id)
        {
            *slot = request;
        } else {
            merged.friend_requests.push(request);
        }
    }

    // First writer wins
    if merged.friend_code.is_none() {
        merged.friend_code = incoming.friend_code;
    }
    if merged.created_at.is_none() {
        merged.created_at = incoming.created_at;
    }

    // Daily attempts: the newer date wins outright; equal dates keep the max
    // count; a side without a date loses to one with a date
    match (
        existing.last_daily_attempt_date.as_deref(),
        incoming.last_daily_attempt_date.as_deref(),
    ) {
        (Some(a), Some(b)) if a == b => {
            merged.daily_attempts = existing.daily_attempts.max(incoming.daily_attempts);
        }
        (Some(a), Some(b)) => {
            // ISO day strings order lexicographically
            if b > a {
                merged.daily_attempts = incoming.daily_attempts;
                merged.last_daily_attempt_date = incoming.last_daily_attempt_date;
            }
        }
        (None, Some(_)) => {
            merged.daily_attempts = incoming.daily_attempts;
            merged.last_daily_attempt_date = incoming.last_daily_attempt_date;
        }
        (Some(_), None) => {}
        (None, None) => {
            merged.daily_attempts = existing.daily_attempts.max(incoming.daily_attempts);
        }
    }

    merged.updated_at = Some(now_ms);
    merged
}

pub fn new_friend_code() -> String {
    hex::encode(rand::random::<[u8; FRIEND_CODE_BYTES]>()).to_uppercase()
}

/// Merge-and-save entry point behind `POST /user/sync`. Holds the profile's
/// key lock across the whole load-merge-persist span, assigns a unique friend
/// code when the merged profile lacks one, and keeps the `fc:` index in step.
pub async fn sync_profile(
    store: &dyn Storage,
    locks: &KeyLocks,
    mut incoming: UserProfile,
) -> Result<UserProfile> {
    if incoming.id.is_empty() {
        // Anonymous first contact; the identity source normally supplies ids
        incoming.id = new_id();
    }

    let key = keys::user(&incoming.id);
    let lock = locks.lock(&key).await;
    let _guard = lock.lock().await;

    let existing: Option<UserProfile> = get_json(store, &key).await?;
    let first_sync = existing.is_none();
    let mut merged = merge_profiles(existing.as_ref(), incoming, now_ms());

    let code = match merged.friend_code.clone() {
        Some(code) => code,
        None => {
            let code = unused_friend_code(store).await?;
            merged.friend_code = Some(code.clone());
            code
        }
    };
    if get_json::<String>(store, &keys::friend_code(&code))
        .await?
        .is_none()
    {
        put_json(store, &keys::friend_code(&code), &merged.id).await?;
    }

    put_json(store, &key, &merged).await?;

    if first_sync {
        tracing::info!(user_id = %merged.id, "Created profile on first sync");
    }

    Ok(merged)
}

async fn unused_friend_code(store: &dyn Storage) -> Result<String> {
    loop {
        let code = new_friend_code();
        if get_json::<String>(store, &keys::friend_code(&code))
            .await?
            .is_none()
        {
            return Ok(code);
        }
    }
}
