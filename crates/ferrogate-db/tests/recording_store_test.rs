//! Integration tests for the recording archive using in-memory
//! SurrealDB.

use chrono::{Duration, TimeZone, Utc};
use ferrogate_core::error::FerrogateError;
use ferrogate_core::models::position::Position;
use ferrogate_core::models::recording::NewFrame;
use ferrogate_core::models::session::{NewSession, SessionKind};
use ferrogate_core::store::{PurgeOutcome, RecordingStore, SessionStore};
use ferrogate_db::store::{SurrealRecordingStore, SurrealSessionStore};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, and create one
/// session per given seed.
async fn setup(seeds: &[u8]) -> (
    Surreal<surrealdb::engine::local::Db>,
    SurrealSessionStore<surrealdb::engine::local::Db>,
    SurrealRecordingStore<surrealdb::engine::local::Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    ferrogate_db::run_migrations(&db).await.unwrap();

    let sessions = SurrealSessionStore::new(db.clone());
    let recordings = SurrealRecordingStore::new(db.clone());

    for seed in seeds {
        sessions
            .create(NewSession {
                uid: uid(*seed),
                device_uid: uid(0x23),
                tenant_id: Uuid::new_v4(),
                username: "john_doe".into(),
                ip_address: "0.0.0.0".into(),
                authenticated: true,
                kind: SessionKind::Shell,
                term: "xterm".into(),
                position: Position::default(),
            })
            .await
            .unwrap();
    }

    (db, sessions, recordings)
}

fn uid(seed: u8) -> String {
    format!("{:02x}", seed).repeat(32)
}

fn frame_at(minutes: i64, message: &str) -> NewFrame {
    let base = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
    NewFrame {
        time: base + Duration::minutes(minutes),
        message: message.into(),
        width: 110,
        height: 30,
    }
}

#[tokio::test]
async fn append_to_missing_session_is_not_found() {
    let (_db, _sessions, recordings) = setup(&[]).await;

    let err = recordings
        .create_frame("nonexistent", frame_at(0, "message"))
        .await
        .unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));
}

#[tokio::test]
async fn first_append_marks_session_recorded() {
    let (_db, sessions, recordings) = setup(&[0xa3]).await;

    assert!(!sessions.get(&uid(0xa3)).await.unwrap().recorded);

    recordings
        .create_frame(&uid(0xa3), frame_at(0, "message"))
        .await
        .unwrap();

    assert!(sessions.get(&uid(0xa3)).await.unwrap().recorded);
}

#[tokio::test]
async fn frames_come_back_in_time_order() {
    let (_db, _sessions, recordings) = setup(&[0xa3]).await;

    // Appended out of order.
    for (minutes, message) in [(2, "second"), (0, "first"), (5, "third")] {
        recordings
            .create_frame(&uid(0xa3), frame_at(minutes, message))
            .await
            .unwrap();
    }

    let (frames, count) = recordings.frames(&uid(0xa3)).await.unwrap();
    assert_eq!(count, 3);

    let messages: Vec<_> = frames.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(messages, vec!["first", "second", "third"]);
    assert!(frames.windows(2).all(|w| w[0].time <= w[1].time));
    assert!(frames.iter().all(|f| f.session_uid == uid(0xa3)));
}

#[tokio::test]
async fn empty_sequence_is_not_an_error() {
    let (_db, _sessions, recordings) = setup(&[0xa3]).await;

    let (frames, count) = recordings.frames(&uid(0xa3)).await.unwrap();
    assert!(frames.is_empty());
    assert_eq!(count, 0);
}

#[tokio::test]
async fn delete_frames_for_one_session() {
    let (_db, _sessions, recordings) = setup(&[0xa3, 0xe7]).await;

    let err = recordings.delete_frames(&uid(0xa3)).await.unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));

    recordings
        .create_frame(&uid(0xa3), frame_at(0, "mine"))
        .await
        .unwrap();
    recordings
        .create_frame(&uid(0xe7), frame_at(0, "other"))
        .await
        .unwrap();

    recordings.delete_frames(&uid(0xa3)).await.unwrap();

    let (_, mine) = recordings.frames(&uid(0xa3)).await.unwrap();
    let (_, other) = recordings.frames(&uid(0xe7)).await.unwrap();
    assert_eq!(mine, 0);
    assert_eq!(other, 1);
}

#[tokio::test]
async fn purge_with_no_matches_changes_nothing() {
    let (_db, sessions, recordings) = setup(&[0xa3]).await;

    recordings
        .create_frame(&uid(0xa3), frame_at(60, "recent"))
        .await
        .unwrap();

    let cutoff = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
    let outcome = recordings.purge_before(cutoff).await.unwrap();

    assert_eq!(
        outcome,
        PurgeOutcome {
            frames_deleted: 0,
            sessions_updated: 0,
        }
    );
    assert!(sessions.get(&uid(0xa3)).await.unwrap().recorded);
}

#[tokio::test]
async fn purge_deletes_frames_and_resets_emptied_sessions() {
    let (_db, sessions, recordings) = setup(&[0xa3, 0xe7, 0xfc]).await;

    // Two sessions whose only frame is at/before the cutoff, one with
    // a frame safely after it.
    recordings
        .create_frame(&uid(0xa3), frame_at(-30, "old"))
        .await
        .unwrap();
    recordings
        .create_frame(&uid(0xe7), frame_at(0, "old"))
        .await
        .unwrap();
    recordings
        .create_frame(&uid(0xfc), frame_at(90, "recent"))
        .await
        .unwrap();

    let cutoff = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
    let outcome = recordings.purge_before(cutoff).await.unwrap();

    assert_eq!(
        outcome,
        PurgeOutcome {
            frames_deleted: 2,
            sessions_updated: 2,
        }
    );

    for seed in [0xa3, 0xe7] {
        let (frames, count) = recordings.frames(&uid(seed)).await.unwrap();
        assert!(frames.is_empty());
        assert_eq!(count, 0);
        assert!(!sessions.get(&uid(seed)).await.unwrap().recorded);
    }

    // The untouched session keeps its frame and its flag.
    let (_, count) = recordings.frames(&uid(0xfc)).await.unwrap();
    assert_eq!(count, 1);
    assert!(sessions.get(&uid(0xfc)).await.unwrap().recorded);
}

#[tokio::test]
async fn purge_keeps_flag_when_frames_remain() {
    let (_db, sessions, recordings) = setup(&[0xa3]).await;

    recordings
        .create_frame(&uid(0xa3), frame_at(-30, "old"))
        .await
        .unwrap();
    recordings
        .create_frame(&uid(0xa3), frame_at(90, "recent"))
        .await
        .unwrap();

    let cutoff = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
    let outcome = recordings.purge_before(cutoff).await.unwrap();

    assert_eq!(outcome.frames_deleted, 1);
    assert_eq!(outcome.sessions_updated, 0);
    assert!(sessions.get(&uid(0xa3)).await.unwrap().recorded);
}
