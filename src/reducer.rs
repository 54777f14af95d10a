/*
State mutation layer.
Every operation takes the current state by reference and returns a new one;
none of them fail. Overlap checks are the caller's job: run
`selectors::find_conflict` before dispatching AddTimeBlock / UpdateTimeBlock.
*/

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Activity, ScheduleState, SettingsPatch, StatePatch, TimeBlock};

/// A dispatchable intent, serialized as `{"type": "...", "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddTimeBlock(TimeBlock),
    RemoveTimeBlock(Uuid),
    UpdateTimeBlock(TimeBlock),
    SetBlockCompleted {
        id: Uuid,
        completed_at: Option<DateTime<FixedOffset>>,
    },
    AddActivity(Activity),
    RemoveActivity(Uuid),
    UpdateActivity(Activity),
    SetActivityCompleted {
        id: Uuid,
        completed: bool,
    },
    UpdateSettings(SettingsPatch),
    ClearSchedule,
    ImportSchedule(StatePatch),
}

impl Action {
    // Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddTimeBlock(_) => "add_time_block",
            Action::RemoveTimeBlock(_) => "remove_time_block",
            Action::UpdateTimeBlock(_) => "update_time_block",
            Action::SetBlockCompleted { .. } => "set_block_completed",
            Action::AddActivity(_) => "add_activity",
            Action::RemoveActivity(_) => "remove_activity",
            Action::UpdateActivity(_) => "update_activity",
            Action::SetActivityCompleted { .. } => "set_activity_completed",
            Action::UpdateSettings(_) => "update_settings",
            Action::ClearSchedule => "clear_schedule",
            Action::ImportSchedule(_) => "import_schedule",
        }
    }
}

pub fn reduce(state: &ScheduleState, action: Action) -> ScheduleState {
    match action {
        Action::AddTimeBlock(block) => add_time_block(state, block),
        Action::RemoveTimeBlock(id) => remove_time_block(state, id),
        Action::UpdateTimeBlock(block) => update_time_block(state, block),
        Action::SetBlockCompleted { id, completed_at } => {
            set_block_completed(state, id, completed_at)
        }
        Action::AddActivity(activity) => add_activity(state, activity),
        Action::RemoveActivity(id) => remove_activity(state, id),
        Action::UpdateActivity(activity) => update_activity(state, activity),
        Action::SetActivityCompleted { id, completed } => {
            set_activity_completed(state, id, completed)
        }
        Action::UpdateSettings(patch) => update_settings(state, patch),
        Action::ClearSchedule => clear_schedule(state),
        Action::ImportSchedule(patch) => import_schedule(state, patch),
    }
}

// Appends without re-validating overlaps (caller contract).
pub fn add_time_block(state: &ScheduleState, block: TimeBlock) -> ScheduleState {
    let mut next = state.clone();
    next.time_blocks.push(block);
    next
}

pub fn remove_time_block(state: &ScheduleState, id: Uuid) -> ScheduleState {
    let mut next = state.clone();
    next.time_blocks.retain(|b| b.id != id);
    next
}

pub fn update_time_block(state: &ScheduleState, block: TimeBlock) -> ScheduleState {
    let mut next = state.clone();
    if let Some(slot) = next.time_blocks.iter_mut().find(|b| b.id == block.id) {
        *slot = block;
    }
    next
}

pub fn set_block_completed(
    state: &ScheduleState,
    id: Uuid,
    completed_at: Option<DateTime<FixedOffset>>,
) -> ScheduleState {
    let mut next = state.clone();
    if let Some(b) = next.time_blocks.iter_mut().find(|b| b.id == id) {
        b.completed_at = completed_at;
    }
    next
}

pub fn add_activity(state: &ScheduleState, activity: Activity) -> ScheduleState {
    let mut next = state.clone();
    next.activities.push(activity);
    next
}

pub fn remove_activity(state: &ScheduleState, id: Uuid) -> ScheduleState {
    let mut next = state.clone();
    next.activities.retain(|a| a.id != id);
    next
}

pub fn update_activity(state: &ScheduleState, activity: Activity) -> ScheduleState {
    let mut next = state.clone();
    if let Some(slot) = next.activities.iter_mut().find(|a| a.id == activity.id) {
        *slot = activity;
    }
    next
}

pub fn set_activity_completed(state: &ScheduleState, id: Uuid, completed: bool) -> ScheduleState {
    let mut next = state.clone();
    if let Some(a) = next.activities.iter_mut().find(|a| a.id == id) {
        a.completed = completed;
    }
    next
}

// Shallow merge: each present field replaces the current one wholesale.
pub fn update_settings(state: &ScheduleState, patch: SettingsPatch) -> ScheduleState {
    let mut next = state.clone();
    let s = &mut next.settings;

    if let Some(v) = patch.active_window {
        s.active_window = v;
    }
    if let Some(v) = patch.type_weights {
        s.type_weights = v;
    }
    if let Some(v) = patch.urgency_weights {
        s.urgency_weights = v;
    }
    if let Some(v) = patch.productivity_weights {
        s.productivity_weights = v;
    }
    if let Some(v) = patch.study_techniques {
        s.study_techniques = v;
    }
    if let Some(v) = patch.minimum_sleep_hours {
        s.minimum_sleep_hours = v;
    }
    if let Some(v) = patch.break_duration {
        s.break_duration = v;
    }
    if let Some(v) = patch.maximum_study_session {
        s.maximum_study_session = v;
    }
    next
}

pub fn clear_schedule(_state: &ScheduleState) -> ScheduleState {
    ScheduleState::default()
}

// Backup restore: top-level keys present in the patch replace the current ones.
pub fn import_schedule(state: &ScheduleState, patch: StatePatch) -> ScheduleState {
    let mut next = state.clone();
    if let Some(blocks) = patch.time_blocks {
        next.time_blocks = blocks;
    }
    if let Some(activities) = patch.activities {
        next.activities = activities;
    }
    if let Some(settings) = patch.settings {
        next.settings = settings;
    }
    next
}
