//! Friend codes, friend requests, and the bidirectional friends graph.

use crate::error::{AppError, Result};
use crate::models::{FriendRequest, FriendView, RequestStatus, UserProfile};
use crate::store::{get_json, keys, put_json, KeyLocks, Storage};

use super::{new_id, now_ms};

pub async fn load_profile(store: &dyn Storage, user_id: &str) -> Result<Option<UserProfile>> {
    get_json(store, &keys::user(user_id)).await
}

async fn require_profile(store: &dyn Storage, user_id: &str) -> Result<UserProfile> {
    load_profile(store, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
}

/// Resolve a friend code to a user id through the `fc:` index.
pub async fn resolve_friend_code(store: &dyn Storage, code: &str) -> Result<Option<String>> {
    get_json(store, &keys::friend_code(code)).await
}

/// Append a pending request to the target's profile. Only the target is
/// persisted; the sender's profile is read for display fields.
pub async fn add_friend_request(
    store: &dyn Storage,
    locks: &KeyLocks,
    from_id: &str,
    to_friend_code: &str,
) -> Result<()> {
    let target_id = resolve_friend_code(store, to_friend_code)
        .await?
        .ok_or(AppError::FriendCodeNotFound)?;
    if target_id == from_id {
        return Err(AppError::SelfFriendRequest);
    }

    let sender = require_profile(store, from_id).await?;

    let target_key = keys::user(&target_id);
    let lock = locks.lock(&target_key).await;
    let _guard = lock.lock().await;

    let mut target = require_profile(store, &target_id).await?;
    if target.friends.contains(from_id) {
        return Err(AppError::AlreadyFriends);
    }
    if target
        .friend_requests
        .iter()
        .any(|r| r.from_user_id == from_id && r.status == RequestStatus::Pending)
    {
        return Err(AppError::DuplicateFriendRequest);
    }

    target.friend_requests.push(FriendRequest {
        id: new_id(),
        from_user_id: from_id.to_string(),
        from_user_name: sender.display_name,
        from_user_skin: sender.avatar_skin_id,
        timestamp: now_ms(),
        status: RequestStatus::Pending,
    });
    put_json(store, &target_key, &target).await?;

    tracing::info!(from = %from_id, to = %target_id, "Friend request sent");
    Ok(())
}

/// Consume a request from the responder's list. Accepting cross-inserts both
/// friends sets with two separate profile writes; the requester is only
/// persisted on accept.
pub async fn respond_to_friend_request(
    store: &dyn Storage,
    locks: &KeyLocks,
    user_id: &str,
    request_id: &str,
    accept: bool,
) -> Result<()> {
    // The responder's guard must drop before the requester's lock is taken:
    // two users accepting each other's requests concurrently would otherwise
    // take the same two locks in opposite order and deadlock.
    let responder_key = keys::user(user_id);
    let request = {
        let lock = locks.lock(&responder_key).await;
        let _guard = lock.lock().await;

        let mut responder = require_profile(store, user_id).await?;
        let position = responder
            .friend_requests
            .iter()
            .position(|r| r.id == request_id)
            .ok_or_else(|| AppError::NotFound(format!("friend request {request_id}")))?;
        let request = responder.friend_requests.remove(position);

        if accept {
            responder.friends.insert(request.from_user_id.clone());
        }
        put_json(store, &responder_key, &responder).await?;
        request
    };

    if accept {
        let requester_key = keys::user(&request.from_user_id);
        let lock = locks.lock(&requester_key).await;
        let _guard = lock.lock().await;

        if let Some(mut requester) = load_profile(store, &request.from_user_id).await? {
            requester.friends.insert(user_id.to_string());
            put_json(store, &requester_key, &requester).await?;
        }
        tracing::info!(user = %user_id, friend = %request.from_user_id, "Friend request accepted");
    }

    Ok(())
}

/// Symmetric removal from both friends sets; idempotent even if one side's
/// list never contained the other.
pub async fn remove_friend(
    store: &dyn Storage,
    locks: &KeyLocks,
    user_id: &str,
    friend_id: &str,
) -> Result<()> {
    for (owner, other) in [(user_id, friend_id), (friend_id, user_id)] {
        let key = keys::user(owner);
        let lock = locks.lock(&key).await;
        let _guard = lock.lock().await;

        if let Some(mut profile) = load_profile(store, owner).await? {
            profile.friends.remove(other);
            put_json(store, &key, &profile).await?;
        }
    }
    Ok(())
}

/// Expand friend ids into live views; always current data, never a cached
/// snapshot. Ids whose profile has vanished are skipped.
pub async fn get_friends(store: &dyn Storage, user_id: &str) -> Result<Vec<FriendView>> {
    let profile = require_profile(store, user_id).await?;

    let mut views = Vec::with_capacity(profile.friends.len());
    for friend_id in &profile.friends {
        if let Some(friend) = load_profile(store, friend_id).await? {
            views.push(FriendView {
                id: friend.id,
                display_name: friend.display_name,
                avatar_skin_id: friend.avatar_skin_id,
                best_time: friend.best_time,
                friend_code: friend.friend_code,
            });
        }
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::profile_merge::sync_profile;
    use crate::store::MemoryStorage;

    async fn seeded_user(
        store: &MemoryStorage,
        locks: &KeyLocks,
        id: &str,
        name: &str,
    ) -> UserProfile {
        let profile = UserProfile {
            id: id.to_string(),
            display_name: name.to_string(),
            avatar_skin_id: "default".to_string(),
            ..Default::default()
        };
        sync_profile(store, locks, profile).await.unwrap()
    }

    #[tokio::test]
    async fn request_then_accept_links_both_sides() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();
        seeded_user(&store, &locks, "alice", "Alice").await;
        let bob = seeded_user(&store, &locks, "bob", "Bob").await;
        let bob_code = bob.friend_code.unwrap();

        add_friend_request(&store, &locks, "alice", &bob_code)
            .await
            .unwrap();

        let bob_profile = require_profile(&store, "bob").await.unwrap();
        assert_eq!(bob_profile.friend_requests.len(), 1);
        let request_id = bob_profile.friend_requests[0].id.clone();
        assert_eq!(bob_profile.friend_requests[0].from_user_name, "Alice");

        respond_to_friend_request(&store, &locks, "bob", &request_id, true)
            .await
            .unwrap();

        let bob_profile = require_profile(&store, "bob").await.unwrap();
        let alice_profile = require_profile(&store, "alice").await.unwrap();
        assert!(bob_profile.friend_requests.is_empty());
        assert!(bob_profile.friends.contains("alice"));
        assert!(alice_profile.friends.contains("bob"));
    }

    #[tokio::test]
    async fn reject_consumes_request_without_linking() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();
        seeded_user(&store, &locks, "alice", "Alice").await;
        let bob = seeded_user(&store, &locks, "bob", "Bob").await;

        add_friend_request(&store, &locks, "alice", &bob.friend_code.unwrap())
            .await
            .unwrap();
        let request_id = require_profile(&store, "bob").await.unwrap().friend_requests[0]
            .id
            .clone();

        respond_to_friend_request(&store, &locks, "bob", &request_id, false)
            .await
            .unwrap();

        let bob_profile = require_profile(&store, "bob").await.unwrap();
        let alice_profile = require_profile(&store, "alice").await.unwrap();
        assert!(bob_profile.friend_requests.is_empty());
        assert!(bob_profile.friends.is_empty());
        assert!(alice_profile.friends.is_empty());
    }

    #[tokio::test]
    async fn duplicate_pending_request_is_rejected() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();
        seeded_user(&store, &locks, "alice", "Alice").await;
        let bob = seeded_user(&store, &locks, "bob", "Bob").await;
        let code = bob.friend_code.unwrap();

        add_friend_request(&store, &locks, "alice", &code)
            .await
            .unwrap();
        let second = add_friend_request(&store, &locks, "alice", &code).await;
        assert!(matches!(second, Err(AppError::DuplicateFriendRequest)));

        // No duplicate entry landed
        let bob_profile = require_profile(&store, "bob").await.unwrap();
        assert_eq!(bob_profile.friend_requests.len(), 1);
    }

    #[tokio::test]
    async fn own_friend_code_is_rejected() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();
        let alice = seeded_user(&store, &locks, "alice", "Alice").await;

        let result =
            add_friend_request(&store, &locks, "alice", &alice.friend_code.unwrap()).await;
        assert!(matches!(result, Err(AppError::SelfFriendRequest)));
    }

    #[tokio::test]
    async fn unknown_friend_code_is_not_found() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();
        seeded_user(&store, &locks, "alice", "Alice").await;

        let result = add_friend_request(&store, &locks, "alice", "ZZZZZZ").await;
        assert!(matches!(result, Err(AppError::FriendCodeNotFound)));
    }

    #[tokio::test]
    async fn already_friends_is_rejected() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();
        seeded_user(&store, &locks, "alice", "Alice").await;
        let bob = seeded_user(&store, &locks, "bob", "Bob").await;
        let code = bob.friend_code.unwrap();

        add_friend_request(&store, &locks, "alice", &code)
            .await
            .unwrap();
        let request_id = require_profile(&store, "bob").await.unwrap().friend_requests[0]
            .id
            .clone();
        respond_to_friend_request(&store, &locks, "bob", &request_id, true)
            .await
            .unwrap();

        let again = add_friend_request(&store, &locks, "alice", &code).await;
        assert!(matches!(again, Err(AppError::AlreadyFriends)));
    }

    #[tokio::test]
    async fn concurrent_mutual_accepts_complete() {
        use std::time::Duration;

        let store = MemoryStorage::new();
        let locks = KeyLocks::new();
        let alice = seeded_user(&store, &locks, "alice", "Alice").await;
        let bob = seeded_user(&store, &locks, "bob", "Bob").await;

        // Cross requests are legal: the duplicate check only blocks repeats
        // in the same direction
        add_friend_request(&store, &locks, "alice", &bob.friend_code.unwrap())
            .await
            .unwrap();
        add_friend_request(&store, &locks, "bob", &alice.friend_code.unwrap())
            .await
            .unwrap();
        let alice_request = require_profile(&store, "alice").await.unwrap().friend_requests[0]
            .id
            .clone();
        let bob_request = require_profile(&store, "bob").await.unwrap().friend_requests[0]
            .id
            .clone();

        // Both accepts in flight at once must finish; holding the responder
        // lock across the requester write would hang this pair forever
        let (store_a, locks_a) = (store.clone(), locks.clone());
        let accept_a = tokio::spawn(async move {
            respond_to_friend_request(&store_a, &locks_a, "alice", &alice_request, true).await
        });
        let (store_b, locks_b) = (store.clone(), locks.clone());
        let accept_b = tokio::spawn(async move {
            respond_to_friend_request(&store_b, &locks_b, "bob", &bob_request, true).await
        });

        let (first, second) = tokio::time::timeout(Duration::from_secs(2), async {
            (accept_a.await, accept_b.await)
        })
        .await
        .expect("mutual accepts must not deadlock");
        first.unwrap().unwrap();
        second.unwrap().unwrap();

        assert!(require_profile(&store, "alice").await.unwrap().friends.contains("bob"));
        assert!(require_profile(&store, "bob").await.unwrap().friends.contains("alice"));
    }

    #[tokio::test]
    async fn remove_friend_is_symmetric_and_idempotent() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();
        seeded_user(&store, &locks, "alice", "Alice").await;
        let bob = seeded_user(&store, &locks, "bob", "Bob").await;

        add_friend_request(&store, &locks, "alice", &bob.friend_code.unwrap())
            .await
            .unwrap();
        let request_id = require_profile(&store, "bob").await.unwrap().friend_requests[0]
            .id
            .clone();
        respond_to_friend_request(&store, &locks, "bob", &request_id, true)
            .await
            .unwrap();

        remove_friend(&store, &locks, "alice", "bob").await.unwrap();
        // Removing again must not error
        remove_friend(&store, &locks, "alice", "bob").await.unwrap();

        assert!(require_profile(&store, "alice").await.unwrap().friends.is_empty());
        assert!(require_profile(&store, "bob").await.unwrap().friends.is_empty());
    }

    #[tokio::test]
    async fn friend_views_reflect_live_profiles() {
        let store = MemoryStorage::new();
        let locks = KeyLocks::new();
        seeded_user(&store, &locks, "alice", "Alice").await;
        let bob = seeded_user(&store, &locks, "bob", "Bob").await;

        add_friend_request(&store, &locks, "alice", &bob.friend_code.unwrap())
            .await
            .unwrap();
        let request_id = require_profile(&store, "bob").await.unwrap().friend_requests[0]
            .id
            .clone();
        respond_to_friend_request(&store, &locks, "bob", &request_id, true)
            .await
            .unwrap();

        // Bob improves his best time; Alice's friend list must see it
        let mut bob_update = require_profile(&store, "bob").await.unwrap();
        bob_update.best_time = 99_000;
        sync_profile(&store, &locks, bob_update).await.unwrap();

        let friends = get_friends(&store, "alice").await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].id, "bob");
        assert_eq!(friends[0].best_time, 99_000);
    }
}
