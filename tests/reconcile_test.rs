use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use coursetable::draft::{DraftBuffer, DraftState};
use coursetable::error::AppError;
use coursetable::models::{CourseTable, NewTableRequest};
use coursetable::services::reconciler::{
    Reconciler, SaveOutcome, flat_replacement, slot_replacement,
};
use coursetable::table_api::{CourseTableApi, InMemoryTableApi};

fn seq(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn table(id: &str, courses: &[&str]) -> CourseTable {
    CourseTable {
        id: id.to_string(),
        name: "My Course Table".to_string(),
        user_id: None,
        semester: "1102".to_string(),
        expire_ts: Some(Utc::now() + Duration::days(1)),
        courses: seq(courses),
    }
}

fn setup(courses: &[&str]) -> (Arc<InMemoryTableApi>, Reconciler, CourseTable) {
    let api = Arc::new(InMemoryTableApi::new());
    let t = table("t1", courses);
    api.insert(t.clone());
    let reconciler = Reconciler::new(api.clone());
    (api, reconciler, t)
}

#[test]
fn flat_replacement_drops_marked_ids() {
    let mut draft = DraftBuffer::open(&seq(&["A", "B", "C"]));
    draft.mark_for_removal("B");
    let replacement = flat_replacement(draft.working(), draft.pending_removals());
    assert_eq!(replacement, seq(&["A", "C"]));
}

#[test]
fn slot_replacement_leaves_an_empty_placeholder() {
    let mut draft = DraftBuffer::open(&seq(&["A", "B", "C"]));
    draft.mark_for_removal("B");
    let replacement = slot_replacement(
        &seq(&["A", "B", "C"]),
        draft.baseline(),
        draft.working(),
        draft.pending_removals(),
    );
    assert_eq!(replacement, seq(&["A", "", "C"]));
}

#[test]
fn slot_replacement_only_touches_the_slots_own_positions() {
    // Slot holds A, B, C at table positions 1, 3, 5.
    let table_courses = seq(&["X", "A", "Y", "B", "Z", "C"]);
    let mut draft = DraftBuffer::open(&seq(&["A", "B", "C"]));
    draft.reorder(0, 2); // slot order becomes B, C, A
    let replacement = slot_replacement(
        &table_courses,
        draft.baseline(),
        draft.working(),
        draft.pending_removals(),
    );
    assert_eq!(replacement, seq(&["X", "B", "Y", "C", "Z", "A"]));
}

#[tokio::test]
async fn save_list_sends_the_filtered_sequence() {
    let (api, reconciler, t) = setup(&["A", "B", "C"]);
    let mut draft = DraftBuffer::open(&t.courses);
    draft.mark_for_removal("B");

    let outcome = reconciler
        .save_list(&t, &mut draft)
        .await
        .expect("save should succeed");
    match outcome {
        SaveOutcome::Saved(updated) => assert_eq!(updated.courses, seq(&["A", "C"])),
        other => panic!("unexpected outcome: {:?}", other),
    }

    let stored = api.stored("t1").expect("table should exist");
    assert_eq!(stored.courses, seq(&["A", "C"]));

    // Draft is rebaselined from the server response.
    assert!(!draft.is_edited());
    assert_eq!(draft.working(), seq(&["A", "C"]).as_slice());
    assert_eq!(draft.state(), DraftState::Open);
}

#[tokio::test]
async fn save_list_after_reorder_sends_the_new_order() {
    let (api, reconciler, t) = setup(&["A", "B", "C"]);
    let mut draft = DraftBuffer::open(&t.courses);
    draft.reorder(0, 2);

    reconciler
        .save_list(&t, &mut draft)
        .await
        .expect("save should succeed");

    let stored = api.stored("t1").expect("table should exist");
    assert_eq!(stored.courses, seq(&["B", "C", "A"]));
}

#[tokio::test]
async fn save_slot_vacates_removed_positions() {
    let (api, reconciler, t) = setup(&["A", "B", "C"]);
    let mut draft = DraftBuffer::open(&t.courses);
    draft.mark_for_removal("B");

    reconciler
        .save_slot(&t, &mut draft)
        .await
        .expect("save should succeed");

    let stored = api.stored("t1").expect("table should exist");
    assert_eq!(stored.courses, seq(&["A", "", "C"]));

    // The slot draft rebaselines to the surviving entries.
    assert!(!draft.is_edited());
    assert_eq!(draft.working(), seq(&["A", "C"]).as_slice());
}

#[tokio::test]
async fn unedited_draft_is_a_noop_save() {
    let (api, reconciler, t) = setup(&["A", "B"]);
    let mut draft = DraftBuffer::open(&t.courses);

    let outcome = reconciler
        .save_list(&t, &mut draft)
        .await
        .expect("noop save should not fail");
    assert!(matches!(outcome, SaveOutcome::NotEdited));

    let stored = api.stored("t1").expect("table should exist");
    assert_eq!(stored.courses, seq(&["A", "B"]));
}

#[tokio::test]
async fn transient_failure_keeps_edits_and_allows_retry() {
    let (api, reconciler, t) = setup(&["A", "B", "C"]);
    let mut draft = DraftBuffer::open(&t.courses);
    draft.reorder(0, 1);
    draft.mark_for_removal("C");

    api.fail_next_call();
    let err = reconciler
        .save_list(&t, &mut draft)
        .await
        .expect_err("save should fail");
    assert!(err.is_transient());

    // Nothing was lost and the draft is open for a user-initiated retry.
    assert_eq!(draft.state(), DraftState::Open);
    assert!(draft.is_edited());
    assert_eq!(draft.working(), seq(&["B", "A", "C"]).as_slice());
    assert!(draft.is_marked("C"));

    reconciler
        .save_list(&t, &mut draft)
        .await
        .expect("retry should succeed");
    let stored = api.stored("t1").expect("table should exist");
    assert_eq!(stored.courses, seq(&["B", "A"]));
}

#[tokio::test]
async fn expired_save_is_terminal_for_the_draft() {
    let (api, reconciler, t) = setup(&["A", "B", "C"]);
    let mut draft = DraftBuffer::open(&t.courses);
    draft.mark_for_removal("A");

    api.remove("t1");
    let err = reconciler
        .save_list(&t, &mut draft)
        .await
        .expect_err("save should fail");
    assert!(matches!(err, AppError::Expired));

    // Contents are untouched, but the draft is dead.
    assert_eq!(draft.state(), DraftState::Expired);
    assert_eq!(draft.working(), seq(&["A", "B", "C"]).as_slice());
    assert!(draft.is_marked("A"));

    // Further gestures and saves are rejected.
    draft.reorder(0, 2);
    assert_eq!(draft.working(), seq(&["A", "B", "C"]).as_slice());
    let err = reconciler
        .save_list(&t, &mut draft)
        .await
        .expect_err("save on an expired draft must be rejected");
    assert!(matches!(err, AppError::Expired));
}

/// Service that compacts empty slots out of every stored sequence, as a
/// normalizing server would.
struct CompactingApi {
    inner: InMemoryTableApi,
}

#[async_trait]
impl CourseTableApi for CompactingApi {
    async fn fetch_table(&self, table_id: &str) -> Result<Option<CourseTable>, AppError> {
        self.inner.fetch_table(table_id).await
    }

    async fn create_table(&self, req: &NewTableRequest) -> Result<CourseTable, AppError> {
        self.inner.create_table(req).await
    }

    async fn replace_table(
        &self,
        table_id: &str,
        name: &str,
        user_id: Option<&str>,
        expire_ts: Option<DateTime<Utc>>,
        courses: &[String],
    ) -> Result<Option<CourseTable>, AppError> {
        let compacted: Vec<String> = courses.iter().filter(|c| !c.is_empty()).cloned().collect();
        self.inner
            .replace_table(table_id, name, user_id, expire_ts, &compacted)
            .await
    }
}

#[tokio::test]
async fn rebaseline_uses_the_server_returned_sequence() {
    let t = table("t1", &["A", "B", "C"]);
    let api = CompactingApi {
        inner: InMemoryTableApi::new(),
    };
    api.inner.insert(t.clone());
    let reconciler = Reconciler::new(Arc::new(api));

    let mut draft = DraftBuffer::open(&t.courses);
    draft.mark_for_removal("B");

    // Locally the slot replacement is ["A", "", "C"], but the server compacts
    // it; the draft must follow the server, not the local computation.
    match reconciler
        .save_slot(&t, &mut draft)
        .await
        .expect("save should succeed")
    {
        SaveOutcome::Saved(updated) => assert_eq!(updated.courses, seq(&["A", "C"])),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(!draft.is_edited());
    assert_eq!(draft.working(), seq(&["A", "C"]).as_slice());
}
