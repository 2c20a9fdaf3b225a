use std::collections::HashSet;

use crate::error::AppError;

/// Lifecycle of one draft. Mutations are only honored in `Open`; `Saving`
/// covers the in-flight replace call, `Expired` is terminal for this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Open,
    Saving,
    Expired,
}

/// In-memory editable copy of one course-id sequence (a whole table in list
/// mode, or one weekly slot's priority-ordered choices in slot mode).
///
/// The working sequence stays a permutation of the sequence captured at open:
/// reorder moves elements, removal is only staged in `pending_removals` and
/// applied when the reconciler translates the draft into a replacement
/// sequence. Nothing here touches the network.
#[derive(Debug, Clone)]
pub struct DraftBuffer {
    baseline: Vec<String>,
    working: Vec<String>,
    pending_removals: HashSet<String>,
    state: DraftState,
}

impl DraftBuffer {
    pub fn open(sequence: &[String]) -> Self {
        Self {
            baseline: sequence.to_vec(),
            working: sequence.to_vec(),
            pending_removals: HashSet::new(),
            state: DraftState::Open,
        }
    }

    /// Re-open on a fresh server sequence, discarding any unsaved edits.
    /// An expired draft stays expired; recovering from expiry goes through
    /// table recreation and a new buffer, never through the dead one.
    pub fn reopen(&mut self, sequence: &[String]) {
        if self.state == DraftState::Expired {
            return;
        }
        *self = Self::open(sequence);
    }

    pub fn working(&self) -> &[String] {
        &self.working
    }

    pub fn baseline(&self) -> &[String] {
        &self.baseline
    }

    pub fn pending_removals(&self) -> &HashSet<String> {
        &self.pending_removals
    }

    pub fn is_marked(&self, course_id: &str) -> bool {
        self.pending_removals.contains(course_id)
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    /// True iff the working order differs from the baseline or any removal is
    /// staged. Cheap enough to call after every gesture.
    pub fn is_edited(&self) -> bool {
        self.working != self.baseline || !self.pending_removals.is_empty()
    }

    /// Move the element at `from` to position `to`, shifting the elements in
    /// between. Out-of-bounds indices are ignored.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if self.state != DraftState::Open {
            return;
        }
        if from >= self.working.len() || to >= self.working.len() {
            return;
        }
        let course_id = self.working.remove(from);
        self.working.insert(to, course_id);
    }

    /// Stage `course_id` for removal at save time. Ids not present in the
    /// working sequence are ignored.
    pub fn mark_for_removal(&mut self, course_id: &str) {
        if self.state != DraftState::Open {
            return;
        }
        if self.working.iter().any(|id| id == course_id) {
            self.pending_removals.insert(course_id.to_string());
        }
    }

    pub fn unmark_for_removal(&mut self, course_id: &str) {
        if self.state != DraftState::Open {
            return;
        }
        self.pending_removals.remove(course_id);
    }

    /// Delete-button gesture: first press stages the removal, second press
    /// takes it back.
    pub fn toggle_removal(&mut self, course_id: &str) {
        if self.is_marked(course_id) {
            self.unmark_for_removal(course_id);
        } else {
            self.mark_for_removal(course_id);
        }
    }

    /// Discard all edits and return to the sequence captured at open.
    pub fn reset(&mut self) {
        if self.state != DraftState::Open {
            return;
        }
        self.working = self.baseline.clone();
        self.pending_removals.clear();
    }

    /// Freeze the draft for an in-flight save. A second save while one is in
    /// flight is rejected, not queued.
    pub(crate) fn begin_save(&mut self) -> Result<(), AppError> {
        match self.state {
            DraftState::Open => {
                self.state = DraftState::Saving;
                Ok(())
            }
            DraftState::Saving => Err(AppError::SaveInFlight),
            DraftState::Expired => Err(AppError::Expired),
        }
    }

    /// Save succeeded: the server's returned sequence is the new baseline,
    /// not the locally computed replacement, in case the server normalized it.
    pub(crate) fn complete_save(&mut self, server_sequence: &[String]) {
        self.reopen(server_sequence);
    }

    /// Save failed. Edits are kept either way; `expired` decides whether the
    /// draft is terminally dead or open for a user-initiated retry.
    pub(crate) fn fail_save(&mut self, expired: bool) {
        self.state = if expired {
            DraftState::Expired
        } else {
            DraftState::Open
        };
    }
}
