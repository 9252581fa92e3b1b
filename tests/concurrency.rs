//! Concurrency tests.
//!
//! The store-wide write lock plus the live-username partial unique index
//! must keep registration correct under concurrent callers: one winner
//! per username, exactly one bootstrap teacher.

use std::sync::Arc;

use studyhall::{AuthConfig, AuthError, Authenticator, Database, ListOptions, Role, UserRepository};

async fn setup_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().await.unwrap())
}

#[tokio::test]
async fn test_concurrent_same_username_single_winner() {
    let db = setup_db().await;
    let auth = Arc::new(Authenticator::new(Arc::clone(&db), &AuthConfig::default()).unwrap());

    const ATTEMPTS: usize = 8;
    let mut handles = Vec::new();
    for i in 0..ATTEMPTS {
        let auth = Arc::clone(&auth);
        handles.push(tokio::spawn(async move {
            auth.register("contested", &format!("password{i}")).await
        }));
    }

    let mut successes = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AuthError::DuplicateUsername) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(successes, 1, "exactly one registration should win");
    assert_eq!(duplicates, ATTEMPTS - 1);

    let repo = UserRepository::new(&db);
    assert_eq!(repo.count_live().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_first_registrations_single_teacher() {
    let db = setup_db().await;
    let auth = Arc::new(Authenticator::new(Arc::clone(&db), &AuthConfig::default()).unwrap());

    const USERS: usize = 10;
    let mut handles = Vec::new();
    for i in 0..USERS {
        let auth = Arc::clone(&auth);
        handles.push(tokio::spawn(async move {
            auth.register(&format!("user{i:02}"), "password1").await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let repo = UserRepository::new(&db);
    let teachers = repo
        .list(&ListOptions::new().role(Role::Teacher).page_size(100))
        .await
        .unwrap();
    let students = repo
        .list(&ListOptions::new().role(Role::Student).page_size(100))
        .await
        .unwrap();

    assert_eq!(teachers.total, 1, "exactly one bootstrap teacher");
    assert_eq!(students.total, (USERS - 1) as i64);
}

#[tokio::test]
async fn test_concurrent_password_changes_are_serialized() {
    let db = setup_db().await;
    let repo = UserRepository::new(&db);

    let user = repo
        .create(&studyhall::NewUser::new("alice", "hash", "salt"))
        .await
        .unwrap();

    const BUMPS: usize = 10;
    let mut handles = Vec::new();
    for i in 0..BUMPS {
        let db = Arc::clone(&db);
        let user_id = user.id;
        handles.push(tokio::spawn(async move {
            UserRepository::new(&db)
                .set_password(user_id, &format!("hash{i}"), &format!("salt{i}"))
                .await
        }));
    }

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap().unwrap());
    }
    versions.sort_unstable();

    // Every bump got a distinct version; the counter never skips or repeats
    let expected: Vec<i64> = (1..=BUMPS as i64).collect();
    assert_eq!(versions, expected);

    let final_user = repo.get_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(final_user.version, BUMPS as i64);
}

#[tokio::test]
async fn test_delete_then_reregister_race() {
    let db = setup_db().await;
    let auth = Arc::new(Authenticator::new(Arc::clone(&db), &AuthConfig::default()).unwrap());

    // Seed and delete the same username repeatedly; the live-unique
    // invariant must hold throughout.
    for round in 0..5 {
        let token = auth.register("phoenix", &format!("pw{round}")).await.unwrap();
        let user = auth.verify_token(&token).await.unwrap();
        auth.delete_user(user.id).await.unwrap();
    }

    let repo = UserRepository::new(&db);
    assert_eq!(repo.count_live().await.unwrap(), 0);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(total, 5, "every incarnation keeps its own row");
}
