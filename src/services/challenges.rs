//! Pairwise asynchronous score duels.
//!
//! Lifecycle: pending --accept--> accepted --score recorded--> completed,
//! or pending --decline--> declined (terminal). Updates on a terminal
//! challenge are rejected.

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Challenge, ChallengeStatus};
use crate::store::{get_json, keys, put_json, KeyLocks, Storage};

use super::{new_id, now_ms, social};

const UNKNOWN_PLAYER: &str = "Unknown player";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChallenge {
    pub from_user_id: String,
    pub to_user_id: String,
    pub map_id: String,
    pub seed: i64,
    pub challenger_score: u64,
}

/// Partial patch applied by the recipient (or the client acting for it).
/// `winner_id` is accepted verbatim; the server does not compute winners.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeUpdate {
    pub status: Option<ChallengeStatus>,
    pub target_score: Option<u64>,
    pub winner_id: Option<String>,
}

/// The challenger's profile supplies display fields and must exist; the
/// target may not have synced yet and falls back to a placeholder name.
pub async fn create_challenge(
    store: &dyn Storage,
    locks: &KeyLocks,
    req: NewChallenge,
) -> Result<Challenge> {
    let challenger = social::load_profile(store, &req.from_user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", req.from_user_id)))?;
    let target_name = social::load_profile(store, &req.to_user_id)
        .await?
        .map(|p| p.display_name)
        .unwrap_or_else(|| UNKNOWN_PLAYER.to_string());

    let challenge = Challenge {
        id: new_id(),
        from_user_id: req.from_user_id,
        from_user_name: challenger.display_name,
        from_user_skin: challenger.avatar_skin_id,
        to_user_id: req.to_user_id,
        to_user_name: target_name,
        map_id: req.map_id,
        seed: req.seed,
        status: ChallengeStatus::Pending,
        challenger_score: req.challenger_score,
        target_score: None,
        timestamp: now_ms(),
        winner_id: None,
    };

    put_json(store, &keys::challenge(&challenge.id), &challenge).await?;
    index_for_user(store, locks, &challenge.from_user_id, &challenge.id).await?;
    index_for_user(store, locks, &challenge.to_user_id, &challenge.id).await?;

    tracing::info!(
        id = %challenge.id,
        from = %challenge.from_user_id,
        to = %challenge.to_user_id,
        map = %challenge.map_id,
        "Challenge created"
    );
    Ok(challenge)
}

async fn index_for_user(
    store: &dyn Storage,
    locks: &KeyLocks,
    user_id: &str,
    challenge_id: &str,
) -> Result<()> {
    let key = keys::user_challenges(user_id);
    let lock = locks.lock(&key).await;
    let _guard = lock.lock().await;

    let mut ids: Vec<String> = get_json(store, &key).await?.unwrap_or_default();
    if !ids.iter().any(|id| id == challenge_id) {
        ids.push(challenge_id.to_string());
        put_json(store, &key, &ids).await?;
    }
    Ok(())
}

/// Everything referencing the user, most recent first. Dangling index
/// entries are skipped.
pub async fn get_challenges(store: &dyn Storage, user_id: &str) -> Result<Vec<Challenge>> {
    let ids: Vec<String> = get_json(store, &keys::user_challenges(user_id))
        .await?
        .unwrap_or_default();

    // The index is in creation order; walk it newest-first so the stable
    // sort keeps creation order as the tie-break for equal timestamps
    let mut challenges = Vec::with_capacity(ids.len());
    for id in ids.iter().rev() {
        if let Some(challenge) = get_json::<Challenge>(store, &keys::challenge(id)).await? {
            challenges.push(challenge);
        }
    }
    challenges.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(challenges)
}

/// Apply a partial patch with transition checks. Legal status moves:
/// pending -> accepted | declined | completed, accepted -> completed.
pub async fn update_challenge(
    store: &dyn Storage,
    locks: &KeyLocks,
    id: &str,
    patch: ChallengeUpdate,
) -> Result<Challenge> {
    let key = keys::challenge(id);
    let lock = locks.lock(&key).await;
    let _guard = lock.lock().await;

    let mut challenge: Challenge = get_json(store, &key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("challenge {id}")))?;

    if challenge.status.is_terminal() {
        return Err(AppError::IllegalTransition(format!(
            "challenge {id} is already {:?}",
            challenge.status
        )));
    }

    if let Some(next) = patch.status {
        let legal = matches!(
            (challenge.status, next),
            (ChallengeStatus::Pending, ChallengeStatus::Accepted)
                | (ChallengeStatus::Pending, ChallengeStatus::Declined)
                | (ChallengeStatus::Pending, ChallengeStatus::Completed)
                | (ChallengeStatus::Accepted, ChallengeStatus::Completed)
        );
        if !legal {
            return Err(AppError::IllegalTransition(format!(
                "{:?} -> {next:?}",
                challenge.status
            )));
        }
        challenge.status = next;
    }

    if let Some(score) = patch.target_score {
        challenge.target_score = Some(score);
    }
    if let Some(winner) = patch.winner_id {
        challenge.winner_id = Some(winner);
    }

    put_json(store, &key, &challenge).await?;
    Ok(challenge)
}
