//! Bounded, ranked score lists, one per (map, mode, day) scope.

use serde::{Deserialize, Serialize};

use crate::constants::LEADERBOARD_CAP;
use crate::error::Result;
use crate::models::{LeaderboardEntry, RankResult};
use crate::store::{get_json, keys, put_json, KeyLocks, Storage};

use super::utc_today;

/// Which scopes a submission fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Normal,
    Daily,
    Challenge,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub global: Option<RankResult>,
    pub daily: Option<RankResult>,
}

/// Upsert-by-user into one scoped list.
///
/// A score at or below the user's existing entry is a no-op that returns the
/// stored rank/score. Otherwise the old entry is replaced, the list is
/// stable-sorted descending (ties keep insertion order), truncated to the
/// cap, and ranks reassigned 1..=len. Returns `None` when the score fell off
/// the end of a full board.
pub fn apply_score(
    mut list: Vec<LeaderboardEntry>,
    entry: LeaderboardEntry,
) -> (Vec<LeaderboardEntry>, Option<RankResult>, bool) {
    if let Some(current) = list.iter().find(|e| e.user_id == entry.user_id) {
        if current.score >= entry.score {
            let ack = RankResult {
                rank: current.rank,
                score: current.score,
            };
            return (list, Some(ack), false);
        }
    }

    let user_id = entry.user_id.clone();
    list.retain(|e| e.user_id != user_id);
    list.push(entry);
    list.sort_by(|a, b| b.score.cmp(&a.score));
    list.truncate(LEADERBOARD_CAP);
    for (i, e) in list.iter_mut().enumerate() {
        e.rank = (i + 1) as u32;
    }

    let ack = list
        .iter()
        .find(|e| e.user_id == user_id)
        .map(|e| RankResult {
            rank: e.rank,
            score: e.score,
        });
    (list, ack, true)
}

/// Pure lookup into an already-ranked list; no recomputation.
pub fn get_user_rank(list: &[LeaderboardEntry], user_id: &str) -> Option<RankResult> {
    list.iter().find(|e| e.user_id == user_id).map(|e| RankResult {
        rank: e.rank,
        score: e.score,
    })
}

pub async fn load_scope(store: &dyn Storage, scope_key: &str) -> Result<Vec<LeaderboardEntry>> {
    Ok(get_json(store, scope_key).await?.unwrap_or_default())
}

async fn submit_to_scope(
    store: &dyn Storage,
    locks: &KeyLocks,
    scope_key: &str,
    entry: LeaderboardEntry,
) -> Result<Option<RankResult>> {
    let lock = locks.lock(scope_key).await;
    let _guard = lock.lock().await;

    let list = load_scope(store, scope_key).await?;
    let (list, ack, changed) = apply_score(list, entry);
    if changed {
        put_json(store, scope_key, &list).await?;
    }
    Ok(ack)
}

/// Fan a run's score out to the scopes its mode writes.
///
/// Normal runs rank on the map's global list and the current UTC day's list;
/// daily-challenge runs rank only on the shared per-day list (one map for
/// everyone); challenge runs rank on the map's challenge-global and
/// challenge-daily lists.
pub async fn submit_score(
    store: &dyn Storage,
    locks: &KeyLocks,
    mode: GameMode,
    map_id: &str,
    entry: LeaderboardEntry,
) -> Result<SubmitOutcome> {
    let today = utc_today();

    let outcome = match mode {
        GameMode::Normal => SubmitOutcome {
            global: submit_to_scope(store, locks, &keys::lb_global(map_id), entry.clone()).await?,
            daily: submit_to_scope(store, locks, &keys::lb_daily(&today, map_id), entry).await?,
        },
        GameMode::Daily => SubmitOutcome {
            global: None,
            daily: submit_to_scope(store, locks, &keys::lb_daily_challenge(&today), entry).await?,
        },
        GameMode::Challenge => SubmitOutcome {
            global: submit_to_scope(store, locks, &keys::lb_challenge_global(map_id), entry.clone())
                .await?,
            daily: submit_to_scope(store, locks, &keys::lb_challenge_daily(&today, map_id), entry)
                .await?,
        },
    };

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    fn entry(user_id: &str, score: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            rank: 0,
            name: format!("player-{user_id}"),
            score,
            skin_id: "default".to_string(),
            user_id: user_id.to_string(),
            date: 0,
        }
    }

    #[test]
    fn ranks_follow_descending_score() {
        // Memastikan urutan peringkat: B=1 (700), C=2 (600), A=3 (500)
        let (list, _, _) = apply_score(Vec::new(), entry("A", 500));
        let (list, _, _) = apply_score(list, entry("B", 700));
        let (list, _, _) = apply_score(list, entry("C", 600));

        let order: Vec<(&str, u32, u64)> = list
            .iter()
            .map(|e| (e.user_id.as_str(), e.rank, e.score))
            .collect();
        assert_eq!(order, vec![("B", 1, 700), ("C", 2, 600), ("A", 3, 500)]);
    }

    #[test]
    fn lower_score_never_regresses_existing_entry() {
        let (list, _, _) = apply_score(Vec::new(), entry("A", 900));
        let (list, ack, changed) = apply_score(list, entry("A", 800));

        assert!(!changed);
        assert_eq!(list.len(), 1);
        let ack = ack.unwrap();
        assert_eq!(ack.rank, 1);
        assert_eq!(ack.score, 900);
    }

    #[test]
    fn higher_score_replaces_users_entry() {
        let (list, _, _) = apply_score(Vec::new(), entry("A", 500));
        let (list, _, _) = apply_score(list, entry("B", 700));
        let (list, ack, changed) = apply_score(list, entry("A", 800));

        assert!(changed);
        assert_eq!(list.len(), 2);
        let ack = ack.unwrap();
        assert_eq!(ack.rank, 1);
        assert_eq!(ack.score, 800);
    }

    #[test]
    fn list_is_bounded_and_ranks_contiguous() {
        let mut list = Vec::new();
        for i in 0..120u64 {
            let (next, _, _) = apply_score(list, entry(&format!("u{i}"), 1000 + i));
            list = next;
        }

        assert_eq!(list.len(), LEADERBOARD_CAP);
        for (i, e) in list.iter().enumerate() {
            assert_eq!(e.rank, (i + 1) as u32);
            if i > 0 {
                assert!(list[i - 1].score >= e.score);
            }
        }
        // The 20 lowest submissions fell off the end
        assert_eq!(list.last().unwrap().score, 1020);
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let (list, _, _) = apply_score(Vec::new(), entry("first", 600));
        let (list, _, _) = apply_score(list, entry("second", 600));

        assert_eq!(list[0].user_id, "first");
        assert_eq!(list[0].rank, 1);
        assert_eq!(list[1].user_id, "second");
        assert_eq!(list[1].rank, 2);
    }

    #[test]
    fn score_below_a_full_board_is_dropped() {
        let mut list = Vec::new();
        for i in 0..LEADERBOARD_CAP as u64 {
            let (next, _, _) = apply_score(list, entry(&format!("u{i}"), 1000 + i));
            list = next;
        }

        let (list, ack, _) = apply_score(list, entry("latecomer", 1));
        assert!(ack.is_none());
        assert_eq!(list.len(), LEADERBOARD_CAP);
        assert!(!list.iter().any(|e| e.user_id == "latecomer"));
    }

    #[test]
    fn user_rank_is_a_pure_lookup() {
        let (list, _, _) = apply_score(Vec::new(), entry("A", 500));
        let (list, _, _) = apply_score(list, entry("B", 700));

        let rank = get_user_rank(&list, "A").unwrap();
        assert_eq!(rank.rank, 2);
        assert_eq!(rank.score, 500);
        assert!(get_user_rank(&list, "missing").is_none());
    }

    #[tokio::test]
    async fn normal_mode_writes_global_and_daily_scopes() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();

        let outcome = submit_score(&store, &locks, GameMode::Normal, "pond", entry("A", 500))
            .await
            .unwrap();
        assert!(outcome.global.is_some());
        assert!(outcome.daily.is_some());

        let global = load_scope(&store, &keys::lb_global("pond")).await.unwrap();
        let daily = load_scope(&store, &keys::lb_daily(&utc_today(), "pond"))
            .await
            .unwrap();
        assert_eq!(global.len(), 1);
        assert_eq!(daily.len(), 1);
    }

    #[tokio::test]
    async fn daily_mode_writes_only_daily_challenge_scope() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();

        let outcome = submit_score(&store, &locks, GameMode::Daily, "pond", entry("A", 500))
            .await
            .unwrap();
        assert!(outcome.global.is_none());
        assert!(outcome.daily.is_some());

        let shared = load_scope(&store, &keys::lb_daily_challenge(&utc_today()))
            .await
            .unwrap();
        assert_eq!(shared.len(), 1);
        let global = load_scope(&store, &keys::lb_global("pond")).await.unwrap();
        assert!(global.is_empty());
    }

    #[tokio::test]
    async fn challenge_mode_writes_both_challenge_scopes() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();

        let outcome = submit_score(&store, &locks, GameMode::Challenge, "glacier", entry("A", 777))
            .await
            .unwrap();
        assert!(outcome.global.is_some());
        assert!(outcome.daily.is_some());

        let global = load_scope(&store, &keys::lb_challenge_global("glacier"))
            .await
            .unwrap();
        let daily = load_scope(&store, &keys::lb_challenge_daily(&utc_today(), "glacier"))
            .await
            .unwrap();
        assert_eq!(global.len(), 1);
        assert_eq!(daily.len(), 1);
    }
}
