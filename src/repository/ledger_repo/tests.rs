use super::LedgerRepository;
use crate::domain::ledger::{LedgerEntry, MoveOutcome};
use crate::domain::plan::{ImbalanceAnalysis, ImpactPreview, MemberRef, Move, RebalancePlan, SubmissionPayload};
use crate::domain::types::ApplyStatus;
use crate::repository::error::RepositoryError;
use chrono::{Duration, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn make_payload() -> SubmissionPayload {
    SubmissionPayload {
        plan: RebalancePlan::new(vec![Move {
            work_item_id: "T1".to_string(),
            work_item_title: "Checkout".to_string(),
            story_id: Some("S-9".to_string()),
            from: MemberRef::new("A", "Ann"),
            to: MemberRef::new("B", "Bob"),
            points_moved: 3.0,
            impact_preview: ImpactPreview::default(),
        }]),
        sprint_id: Some("SP1".to_string()),
        manual_override: false,
        imbalance_analysis: ImbalanceAnalysis::default(),
    }
}

fn make_entry(team_id: &str, minutes_ago: i64, status: ApplyStatus) -> LedgerEntry {
    LedgerEntry {
        entry_id: uuid::Uuid::new_v4().to_string(),
        team_id: team_id.to_string(),
        sprint_id: Some("SP1".to_string()),
        applied_at: Utc::now() - Duration::minutes(minutes_ago),
        triggered_by: "alice".to_string(),
        total_points_moved: 3.0,
        total_moves: 1,
        manual_override: false,
        status,
        outcomes: vec![MoveOutcome {
            work_item_id: "T1".to_string(),
            work_item_title: Some("Checkout".to_string()),
            success: status != ApplyStatus::Failed,
            error: None,
        }],
    }
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = LedgerRepository::new(setup_test_db());
    let payload = make_payload();
    let entry = make_entry("team-1", 0, ApplyStatus::Applied);

    let id = repo.insert(&entry, Some(&payload)).unwrap();
    assert_eq!(id, entry.entry_id);

    let found = repo.find_by_id(&id).unwrap().unwrap();
    assert_eq!(found.team_id, "team-1");
    assert_eq!(found.status, ApplyStatus::Applied);
    assert_eq!(found.outcomes, entry.outcomes);
    assert_eq!(found.applied_at.timestamp_micros(), entry.applied_at.timestamp_micros());

    let stored_payload = repo.find_payload(&id).unwrap().unwrap();
    assert_eq!(stored_payload, payload);

    assert!(repo.find_by_id("missing").unwrap().is_none());
}

#[test]
fn test_list_by_team_newest_first_with_paging() {
    let repo = LedgerRepository::new(setup_test_db());
    let oldest = make_entry("team-1", 30, ApplyStatus::Applied);
    let middle = make_entry("team-1", 20, ApplyStatus::Partial);
    let newest = make_entry("team-1", 10, ApplyStatus::Failed);
    let other = make_entry("team-2", 5, ApplyStatus::Applied);

    for e in [&middle, &oldest, &newest, &other] {
        repo.insert(e, None).unwrap();
    }

    let page = repo.list_by_team("team-1", 2, 0).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].entry_id, newest.entry_id);
    assert_eq!(page[1].entry_id, middle.entry_id);

    let page = repo.list_by_team("team-1", 2, 2).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].entry_id, oldest.entry_id);

    assert_eq!(repo.count_by_team("team-1").unwrap(), 3);
    assert_eq!(repo.count_by_team("team-3").unwrap(), 0);
}

#[test]
fn test_ledger_is_append_only() {
    let conn = setup_test_db();
    let repo = LedgerRepository::new(conn.clone());
    let entry = make_entry("team-1", 0, ApplyStatus::Applied);
    repo.insert(&entry, None).unwrap();

    let guard = conn.lock().unwrap();
    let update = guard.execute(
        "UPDATE rebalance_ledger SET status = 'failed' WHERE entry_id = ?1",
        [&entry.entry_id],
    );
    let err: RepositoryError = update.unwrap_err().into();
    assert!(matches!(err, RepositoryError::AppendOnlyViolation(_)));

    let delete = guard.execute("DELETE FROM rebalance_ledger", []);
    assert!(delete.is_err());
    drop(guard);

    assert!(repo.find_by_id(&entry.entry_id).unwrap().is_some());
}

#[test]
fn test_duplicate_entry_id_rejected() {
    let repo = LedgerRepository::new(setup_test_db());
    let entry = make_entry("team-1", 0, ApplyStatus::Applied);
    repo.insert(&entry, None).unwrap();
    let err = repo.insert(&entry, None).unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
}
