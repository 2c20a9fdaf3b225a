use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::draft::DraftBuffer;
use crate::error::AppError;
use crate::models::CourseTable;
use crate::table_api::CourseTableApi;

/// Marks a vacated priority position in the wire sequence. The service keeps
/// the slot itself so the surviving entries do not shift rank.
pub const EMPTY_SLOT: &str = "";

#[derive(Debug)]
pub enum SaveOutcome {
    Saved(CourseTable),
    /// The draft had no pending changes; nothing was sent.
    NotEdited,
}

/// Translates a draft buffer into a whole-record replacement against the
/// course table service and folds the response back into the draft.
///
/// One replace call carries the full authoritative sequence; the service does
/// not merge, so concurrent saves from different surfaces are last-writer-wins.
pub struct Reconciler {
    api: Arc<dyn CourseTableApi>,
}

impl Reconciler {
    pub fn new(api: Arc<dyn CourseTableApi>) -> Self {
        Self { api }
    }

    /// Save a draft covering the whole table as a flat list: staged removals
    /// are dropped from the sequence entirely.
    pub async fn save_list(
        &self,
        table: &CourseTable,
        draft: &mut DraftBuffer,
    ) -> Result<SaveOutcome, AppError> {
        if !draft.is_edited() {
            return Ok(SaveOutcome::NotEdited);
        }
        draft.begin_save()?;

        let replacement = flat_replacement(draft.working(), draft.pending_removals());
        match self.replace(table, &replacement).await {
            Ok(Some(updated)) => {
                info!(table_id = %table.id, "course table saved");
                draft.complete_save(&updated.courses);
                Ok(SaveOutcome::Saved(updated))
            }
            Ok(None) => {
                warn!(table_id = %table.id, "course table gone, save rejected");
                draft.fail_save(true);
                Err(AppError::Expired)
            }
            Err(e) => {
                warn!(table_id = %table.id, "course table save failed: {}", e);
                draft.fail_save(false);
                Err(e)
            }
        }
    }

    /// Save a draft covering one weekly slot's priority-ordered choices. The
    /// slot's entries are overlaid onto the full table sequence; removed
    /// entries leave an empty placeholder so the other positions keep their
    /// rank.
    pub async fn save_slot(
        &self,
        table: &CourseTable,
        draft: &mut DraftBuffer,
    ) -> Result<SaveOutcome, AppError> {
        if !draft.is_edited() {
            return Ok(SaveOutcome::NotEdited);
        }
        draft.begin_save()?;

        let slot_baseline = draft.baseline().to_vec();
        let replacement = slot_replacement(
            &table.courses,
            &slot_baseline,
            draft.working(),
            draft.pending_removals(),
        );
        match self.replace(table, &replacement).await {
            Ok(Some(updated)) => {
                info!(table_id = %table.id, "slot ordering saved");
                let slot_view = slot_projection(&updated.courses, &table.courses, &slot_baseline);
                draft.complete_save(&slot_view);
                Ok(SaveOutcome::Saved(updated))
            }
            Ok(None) => {
                warn!(table_id = %table.id, "course table gone, slot save rejected");
                draft.fail_save(true);
                Err(AppError::Expired)
            }
            Err(e) => {
                warn!(table_id = %table.id, "slot save failed: {}", e);
                draft.fail_save(false);
                Err(e)
            }
        }
    }

    async fn replace(
        &self,
        table: &CourseTable,
        courses: &[String],
    ) -> Result<Option<CourseTable>, AppError> {
        self.api
            .replace_table(
                &table.id,
                &table.name,
                table.user_id.as_deref(),
                table.expire_ts,
                courses,
            )
            .await
    }
}

/// Flat-list replacement: the working order with every staged removal dropped.
pub fn flat_replacement(working: &[String], removals: &HashSet<String>) -> Vec<String> {
    working
        .iter()
        .filter(|id| !removals.contains(*id))
        .cloned()
        .collect()
}

/// Slot-indexed replacement: write the reordered slot entries back into the
/// table positions their pre-edit counterparts occupied.
///
/// `working[i]` lands at the table index of `slot_baseline[i]`; a staged
/// removal vacates that position instead of deleting it. Target positions are
/// looked up in the pre-edit table sequence, so a concurrent edit from
/// another surface that moved those ids is silently overwritten
/// (last-writer-wins). Slot ids missing from the table sequence are skipped.
pub fn slot_replacement(
    table_courses: &[String],
    slot_baseline: &[String],
    working: &[String],
    removals: &HashSet<String>,
) -> Vec<String> {
    let positions = slot_positions(table_courses, slot_baseline);

    // Fixed-length slot view: None marks a vacated priority position.
    let slots: Vec<Option<&String>> = working
        .iter()
        .map(|id| if removals.contains(id) { None } else { Some(id) })
        .collect();

    let mut replacement = table_courses.to_vec();
    for (slot, position) in slots.iter().zip(&positions) {
        if let Some(index) = position {
            replacement[*index] = match slot {
                Some(id) => (*id).clone(),
                None => EMPTY_SLOT.to_string(),
            };
        }
    }
    replacement
}

/// Read a slot's sub-sequence back out of a saved table sequence: the table
/// positions the slot occupied before the save, with vacated entries dropped.
pub fn slot_projection(
    updated_courses: &[String],
    table_courses: &[String],
    slot_baseline: &[String],
) -> Vec<String> {
    slot_positions(table_courses, slot_baseline)
        .into_iter()
        .flatten()
        .filter_map(|index| updated_courses.get(index))
        .filter(|id| !id.is_empty())
        .cloned()
        .collect()
}

fn slot_positions(table_courses: &[String], slot_baseline: &[String]) -> Vec<Option<usize>> {
    slot_baseline
        .iter()
        .map(|id| table_courses.iter().position(|c| c == id))
        .collect()
}
