use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{EXERCISE_POINTS, Engine, EngineError, JOIN_EVENT_POINTS, Session, shop};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .session(Session::logged_out())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn logged_in_engine() -> (Engine, DatabaseConnection) {
    let (mut engine, db) = engine_with_db().await;
    engine
        .register_user("alice", "alice@example.com", "secret", None)
        .await
        .unwrap();
    engine.login("alice@example.com", "secret").await.unwrap();
    (engine, db)
}

fn event_date() -> DateTime<Utc> {
    Utc.timestamp_opt(1_760_000_000, 0).unwrap()
}

#[tokio::test]
async fn create_event_in_empty_store() {
    let (mut engine, _db) = logged_in_engine().await;

    let event_id = engine
        .create_event("Park", "Run", "Free", event_date(), "1h")
        .await
        .unwrap();

    assert_eq!(engine.events().len(), 1);
    let event = &engine.events()[0];
    assert_eq!(event.id, event_id);
    assert_eq!(event.address, "Park");
    assert_eq!(event.sports, "Run");
    assert_eq!(event.cost, "Free");
    assert_eq!(event.date, event_date());
    assert_eq!(event.duration, "1h");
    assert_eq!(event.participants_count, 0);
    assert!(engine.created_events().contains(&event_id));
}

#[tokio::test]
async fn create_event_accepts_empty_fields() {
    let (mut engine, _db) = logged_in_engine().await;

    engine
        .create_event("", "", "", event_date(), "")
        .await
        .unwrap();

    assert_eq!(engine.events().len(), 1);
    assert!(engine.events()[0].address.is_empty());
}

#[tokio::test]
async fn join_rewards_atomically() {
    let (mut engine, db) = logged_in_engine().await;
    let event_id = engine
        .create_event("Park", "Run", "Free", event_date(), "1h")
        .await
        .unwrap();

    engine.join_event(event_id).await.unwrap();

    assert_eq!(engine.events()[0].participants_count, 1);
    let user = engine.current_user().unwrap();
    assert_eq!(user.events_count, 1);
    assert_eq!(user.go_points, JOIN_EVENT_POINTS);

    // All three counters reached the store, not just the in-memory copies.
    let user_id = user.id.to_string();
    let reloaded = Engine::builder()
        .database(db)
        .session(Session::logged_in(user_id))
        .build()
        .await
        .unwrap();
    assert_eq!(reloaded.events()[0].participants_count, 1);
    let user = reloaded.current_user().unwrap();
    assert_eq!(user.events_count, 1);
    assert_eq!(user.go_points, JOIN_EVENT_POINTS);
}

#[tokio::test]
async fn second_join_changes_nothing() {
    let (mut engine, _db) = logged_in_engine().await;
    let event_id = engine
        .create_event("Park", "Run", "Free", event_date(), "1h")
        .await
        .unwrap();

    engine.join_event(event_id).await.unwrap();
    engine.join_event(event_id).await.unwrap();

    assert_eq!(engine.events()[0].participants_count, 1);
    let user = engine.current_user().unwrap();
    assert_eq!(user.events_count, 1);
    assert_eq!(user.go_points, JOIN_EVENT_POINTS);
}

#[tokio::test]
async fn join_missing_event_is_not_found() {
    let (mut engine, _db) = logged_in_engine().await;

    let result = engine.join_event(uuid::Uuid::new_v4()).await;

    assert_eq!(
        result.unwrap_err(),
        EngineError::KeyNotFound("event not exists".to_string())
    );
}

#[tokio::test]
async fn join_without_user_increments_participants_only() {
    let (mut engine, db) = engine_with_db().await;
    let event_id = engine
        .create_event("Park", "Run", "Free", event_date(), "1h")
        .await
        .unwrap();

    engine.join_event(event_id).await.unwrap();

    assert_eq!(engine.events()[0].participants_count, 1);
    assert!(engine.current_user().is_none());

    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM users",
        ))
        .await
        .unwrap()
        .unwrap();
    let n: i64 = row.try_get("", "n").unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn delete_removes_from_projection() {
    let (mut engine, db) = logged_in_engine().await;
    let event_id = engine
        .create_event("Park", "Run", "Free", event_date(), "1h")
        .await
        .unwrap();

    engine.delete_event(event_id).await.unwrap();

    assert!(engine.events().is_empty());
    assert!(!engine.created_events().contains(&event_id));

    let mut reloaded = Engine::builder()
        .database(db)
        .session(Session::logged_out())
        .build()
        .await
        .unwrap();
    reloaded.load_events().await.unwrap();
    assert!(reloaded.events().is_empty());
}

#[tokio::test]
async fn delete_missing_event_is_not_found() {
    let (mut engine, _db) = logged_in_engine().await;

    let result = engine.delete_event(uuid::Uuid::new_v4()).await;

    assert_eq!(
        result.unwrap_err(),
        EngineError::KeyNotFound("event not exists".to_string())
    );
}

#[tokio::test]
async fn foreign_session_cannot_delete() {
    let (mut creator, db) = logged_in_engine().await;
    let event_id = creator
        .create_event("Park", "Run", "Free", event_date(), "1h")
        .await
        .unwrap();

    // A second session against the same store never created the event.
    let mut other = Engine::builder()
        .database(db)
        .session(Session::logged_out())
        .build()
        .await
        .unwrap();

    let result = other.delete_event(event_id).await;

    assert_eq!(
        result.unwrap_err(),
        EngineError::NotAuthorized("only the creator can delete an event".to_string())
    );
    assert_eq!(other.events().len(), 1);
}

#[tokio::test]
async fn exercise_without_user_reports_no_current_user() {
    let (mut engine, db) = engine_with_db().await;

    let result = engine.complete_exercise().await;

    assert_eq!(result.unwrap_err(), EngineError::NoCurrentUser);

    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM users",
        ))
        .await
        .unwrap()
        .unwrap();
    let n: i64 = row.try_get("", "n").unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn exercise_reward_is_repeatable() {
    let (mut engine, _db) = logged_in_engine().await;

    assert_eq!(engine.complete_exercise().await.unwrap(), EXERCISE_POINTS);
    assert_eq!(
        engine.complete_exercise().await.unwrap(),
        2 * EXERCISE_POINTS
    );
}

#[tokio::test]
async fn purchase_requires_balance_and_persists() {
    let (mut engine, db) = logged_in_engine().await;
    let item = shop::catalog().into_iter().find(|i| i.cost == 1000).unwrap();

    let result = engine.purchase_item(&item).await;
    assert_eq!(
        result.unwrap_err(),
        EngineError::InsufficientFunds(item.name.to_string())
    );

    let user_id = engine.current_user().unwrap().id.to_string();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE users SET go_points = ? WHERE id = ?",
        vec![1500.into(), user_id.clone().into()],
    ))
    .await
    .unwrap();
    engine.load_current_user().await.unwrap();

    let balance = engine.purchase_item(&item).await.unwrap();
    assert_eq!(balance, 500);

    let reloaded = Engine::builder()
        .database(db)
        .session(Session::logged_in(user_id))
        .build()
        .await
        .unwrap();
    assert_eq!(reloaded.current_user().unwrap().go_points, 500);
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let (mut engine, _db) = engine_with_db().await;
    engine
        .register_user("alice", "alice@example.com", "secret", None)
        .await
        .unwrap();

    let result = engine
        .register_user("alice2", "alice@example.com", "other", None)
        .await;

    assert_eq!(
        result.unwrap_err(),
        EngineError::ExistingKey("alice@example.com".to_string())
    );
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let (mut engine, _db) = engine_with_db().await;
    engine
        .register_user("alice", "alice@example.com", "secret", None)
        .await
        .unwrap();

    assert_eq!(
        engine
            .login("alice@example.com", "wrong")
            .await
            .unwrap_err(),
        EngineError::InvalidCredentials
    );
    assert_eq!(
        engine.login("bob@example.com", "secret").await.unwrap_err(),
        EngineError::InvalidCredentials
    );
    assert!(engine.current_user().is_none());
}

#[tokio::test]
async fn login_binds_session_and_user() {
    let (mut engine, _db) = engine_with_db().await;
    let user = engine
        .register_user("alice", "alice@example.com", "secret", None)
        .await
        .unwrap();

    let session = engine.login("alice@example.com", "secret").await.unwrap();

    assert!(session.is_user_logged_in);
    assert_eq!(session.user_id(), Some(user.id.to_string().as_str()));
    assert_eq!(engine.current_user().unwrap().id, user.id);
}

#[tokio::test]
async fn missing_session_user_behaves_logged_out() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let engine = Engine::builder()
        .database(db)
        .session(Session::logged_in(uuid::Uuid::new_v4().to_string()))
        .build()
        .await
        .unwrap();

    assert!(engine.current_user().is_none());
}

#[tokio::test]
async fn logout_clears_session_scoped_state() {
    let (mut engine, _db) = logged_in_engine().await;
    let event_id = engine
        .create_event("Park", "Run", "Free", event_date(), "1h")
        .await
        .unwrap();
    engine.join_event(event_id).await.unwrap();

    let session = engine.logout();

    assert!(!session.is_user_logged_in);
    assert!(engine.current_user().is_none());
    assert!(engine.joined_events().is_empty());
    assert!(engine.created_events().is_empty());
    // The store is untouched, only the session-scoped sets are gone.
    assert_eq!(engine.events()[0].participants_count, 1);
}

#[tokio::test]
async fn login_drops_previous_session_sets() {
    let (mut engine, _db) = logged_in_engine().await;
    let event_id = engine
        .create_event("Park", "Run", "Free", event_date(), "1h")
        .await
        .unwrap();
    engine.join_event(event_id).await.unwrap();

    // Bob logs in over the live engine, without an explicit logout first.
    engine
        .register_user("bob", "bob@example.com", "secret", None)
        .await
        .unwrap();
    engine.login("bob@example.com", "secret").await.unwrap();

    assert!(engine.joined_events().is_empty());
    assert!(engine.created_events().is_empty());

    // Bob never created the event, so the ownership gate applies to him.
    assert_eq!(
        engine.delete_event(event_id).await.unwrap_err(),
        EngineError::NotAuthorized("only the creator can delete an event".to_string())
    );

    // Bob's join is a fresh one: counted and rewarded.
    engine.join_event(event_id).await.unwrap();
    assert_eq!(engine.events()[0].participants_count, 2);
    let bob = engine.current_user().unwrap();
    assert_eq!(bob.events_count, 1);
    assert_eq!(bob.go_points, JOIN_EVENT_POINTS);
}

#[tokio::test]
async fn events_keep_insertion_order() {
    let (mut engine, _db) = logged_in_engine().await;

    engine
        .create_event("A", "Run", "Free", event_date(), "1h")
        .await
        .unwrap();
    engine
        .create_event("B", "Swim", "Free", event_date(), "2h")
        .await
        .unwrap();
    engine
        .create_event("C", "Yoga", "Free", event_date(), "30m")
        .await
        .unwrap();

    let addresses: Vec<&str> = engine
        .events()
        .iter()
        .map(|event| event.address.as_str())
        .collect();
    assert_eq!(addresses, ["A", "B", "C"]);
}

#[tokio::test]
async fn snapshots_follow_mutations() {
    let (mut engine, _db) = logged_in_engine().await;
    let mut rx = engine.subscribe();

    let event_id = engine
        .create_event("Park", "Run", "Free", event_date(), "1h")
        .await
        .unwrap();

    assert!(rx.has_changed().unwrap());
    {
        let snapshot = rx.borrow_and_update();
        assert_eq!(snapshot.events.len(), 1);
        assert!(snapshot.created_events.contains(&event_id));
    }

    engine.join_event(event_id).await.unwrap();

    let snapshot = rx.borrow_and_update();
    assert_eq!(snapshot.events[0].participants_count, 1);
    assert!(snapshot.joined_events.contains(&event_id));
    assert_eq!(
        snapshot.current_user.as_ref().unwrap().go_points,
        JOIN_EVENT_POINTS
    );
}
