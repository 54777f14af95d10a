// --------------------------------------------------
// Handles API endpoints that change the schedule.
//
// Responsibilities:
// - Create / update / delete time blocks (with same-day overlap checks)
// - Create / update / delete activities, toggle completion
// - Get / merge settings
// - Export, import and clear the whole document
//
// Every change goes through `ScheduleStore::dispatch`.
// -------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Activity, ActivityType, BlockType, Day, PreferredTime, ScheduleState, Settings, SettingsPatch,
    StatePatch, TimeBlock, Urgency,
};
use crate::reducer::Action;
use crate::selectors::find_conflict;
use crate::store::{FileStorage, Persistence, ScheduleStore};
use crate::time::ClockTime;

pub type SharedStore = Arc<Mutex<ScheduleStore<FileStorage>>>;

pub fn shared(store: ScheduleStore<FileStorage>) -> SharedStore {
    Arc::new(Mutex::new(store))
}

pub(crate) fn lock(store: &SharedStore) -> AppResult<MutexGuard<'_, ScheduleStore<FileStorage>>> {
    store
        .lock()
        .map_err(|_| AppError::Other("schedule store lock poisoned".to_string()))
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation("invalid id"))
}

fn now_fixed_offset() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Body of every mutating response. `saved` is false when the write to disk
/// failed; the change is still live and will be written on the next mutation.
#[derive(Debug, Serialize)]
pub struct MutationResponse<T> {
    pub data: T,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T> MutationResponse<T> {
    pub(crate) fn new(data: T, persistence: Persistence) -> Self {
        match persistence {
            Persistence::Saved => Self {
                data,
                saved: true,
                warning: None,
            },
            Persistence::Deferred { reason } => Self {
                data,
                saved: false,
                warning: Some(format!("change kept in memory but not saved: {reason}")),
            },
        }
    }
}

// -----------------------------
// GET /api/state
// Returns the whole schedule document
// -----------------------------
pub async fn get_state(State(store): State<SharedStore>) -> AppResult<Json<ScheduleState>> {
    let store = lock(&store)?;
    Ok(Json(store.state().clone()))
}

// -----------------------------
// GET /api/export
// Same document, offered as a backup download
// -----------------------------
pub async fn export_state(State(store): State<SharedStore>) -> AppResult<impl IntoResponse> {
    let store = lock(&store)?;
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"schedule-backup.json\"",
        )],
        Json(store.state().clone()),
    ))
}

// -----------------------------
// POST /api/import
// Restores a backup; present top-level keys replace current ones.
// The payload is checked as a whole before anything is replaced.
// -----------------------------
pub async fn import_state(
    State(store): State<SharedStore>,
    Json(patch): Json<StatePatch>,
) -> AppResult<Json<MutationResponse<ScheduleState>>> {
    validate_import(&patch)?;

    let mut store = lock(&store)?;
    let persistence = store.dispatch(Action::ImportSchedule(patch));
    info!(
        blocks = store.state().time_blocks.len(),
        activities = store.state().activities.len(),
        "schedule imported"
    );
    Ok(Json(MutationResponse::new(store.state().clone(), persistence)))
}

// -----------------------------
// POST /api/clear
// Resets to the empty default schedule
// -----------------------------
pub async fn clear_state(
    State(store): State<SharedStore>,
) -> AppResult<Json<MutationResponse<ScheduleState>>> {
    let mut store = lock(&store)?;
    let persistence = store.dispatch(Action::ClearSchedule);
    warn!("schedule cleared");
    Ok(Json(MutationResponse::new(store.state().clone(), persistence)))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInput {
    pub day: Day,
    pub start_time: String, // "HH:MM"
    pub end_time: String,   // "HH:MM", earlier than start = crosses midnight
    #[serde(rename = "type", default)]
    pub block_type: BlockType,
    pub activity_type: Option<ActivityType>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
}

impl BlockInput {
    fn into_block(self, id: Uuid, completed_at: Option<DateTime<FixedOffset>>) -> AppResult<TimeBlock> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title required"));
        }
        let start_time = ClockTime::parse(&self.start_time)?;
        let end_time = ClockTime::parse(&self.end_time)?;
        if start_time == end_time {
            return Err(AppError::validation("block must not be empty"));
        }

        Ok(TimeBlock {
            id,
            day: self.day,
            start_time,
            end_time,
            block_type: self.block_type,
            activity_type: self.activity_type,
            title: self.title,
            description: self.description,
            location: self.location,
            color: self.color,
            completed_at,
        })
    }
}

fn ensure_no_conflict(state: &ScheduleState, block: &TimeBlock, ignore: Option<Uuid>) -> AppResult<()> {
    match find_conflict(state, block, ignore) {
        Some(existing) => Err(AppError::conflict(format!(
            "overlaps \"{}\" ({}-{})",
            existing.title, existing.start_time, existing.end_time
        ))),
        None => Ok(()),
    }
}

// -----------------------------
// POST /api/blocks
// Creates a block; rejects same-day overlaps
// -----------------------------
pub async fn create_block(
    State(store): State<SharedStore>,
    Json(input): Json<BlockInput>,
) -> AppResult<Json<MutationResponse<TimeBlock>>> {
    let block = input.into_block(Uuid::new_v4(), None)?;

    let mut store = lock(&store)?;
    ensure_no_conflict(store.state(), &block, None)?;

    let persistence = store.dispatch(Action::AddTimeBlock(block.clone()));
    Ok(Json(MutationResponse::new(block, persistence)))
}

// -----------------------------
// PUT /api/blocks/:id
// Replaces a block, keeping its completion mark
// -----------------------------
pub async fn update_block(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    Json(input): Json<BlockInput>,
) -> AppResult<Json<MutationResponse<TimeBlock>>> {
    let id = parse_id(&id)?;

    let mut store = lock(&store)?;
    let Some(existing) = store.state().time_blocks.iter().find(|b| b.id == id) else {
        return Err(AppError::not_found("block"));
    };

    let block = input.into_block(id, existing.completed_at)?;
    ensure_no_conflict(store.state(), &block, Some(id))?;

    let persistence = store.dispatch(Action::UpdateTimeBlock(block.clone()));
    Ok(Json(MutationResponse::new(block, persistence)))
}

// -----------------------------
// DELETE /api/blocks/:id
// Removes a block and unlinks activities that pointed at it
// -----------------------------
pub async fn delete_block(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> AppResult<Json<MutationResponse<serde_json::Value>>> {
    let id = parse_id(&id)?;

    let mut store = lock(&store)?;
    if !store.state().time_blocks.iter().any(|b| b.id == id) {
        return Err(AppError::not_found("block"));
    }

    let linked: Vec<Activity> = store
        .state()
        .activities
        .iter()
        .filter(|a| a.time_block_id == Some(id))
        .cloned()
        .collect();

    let mut persistence = store.dispatch(Action::RemoveTimeBlock(id));
    for mut activity in linked {
        activity.time_block_id = None;
        persistence = store.dispatch(Action::UpdateActivity(activity));
    }

    Ok(Json(MutationResponse::new(
        serde_json::json!({ "ok": true }),
        persistence,
    )))
}

// -----------------------------
// POST /api/blocks/:id/complete
// Toggles the completion mark (now <-> none)
// -----------------------------
pub async fn complete_block(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> AppResult<Json<MutationResponse<TimeBlock>>> {
    let id = parse_id(&id)?;

    let mut store = lock(&store)?;
    let Some(block) = store.state().time_blocks.iter().find(|b| b.id == id) else {
        return Err(AppError::not_found("block"));
    };
    let completed_at = match block.completed_at {
        Some(_) => None,
        None => Some(now_fixed_offset()),
    };

    let persistence = store.dispatch(Action::SetBlockCompleted { id, completed_at });
    let updated = store
        .state()
        .time_blocks
        .iter()
        .find(|b| b.id == id)
        .cloned()
        .ok_or_else(|| AppError::not_found("block"))?;
    Ok(Json(MutationResponse::new(updated, persistence)))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInput {
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
    pub estimated_duration: Option<f64>, // hours
    pub estimated_minutes: Option<u32>,
    pub day_index: Option<u32>,
    pub order: Option<i64>,
    #[serde(default)]
    pub completed: bool,
    pub time_block_id: Option<Uuid>,
    pub preferred_time: Option<PreferredTime>,
    #[serde(default)]
    pub preferred_days: Vec<Day>,
}

impl ActivityInput {
    fn into_activity(self, id: Uuid, state: &ScheduleState) -> AppResult<Activity> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name required"));
        }
        check_day_index(self.day_index)?;
        check_hours("estimatedDuration", self.estimated_duration)?;
        check_preferred_time(self.preferred_time)?;
        if let Some(block_id) = self.time_block_id {
            if !state.time_blocks.iter().any(|b| b.id == block_id) {
                return Err(AppError::validation("timeBlockId does not match any block"));
            }
        }

        Ok(Activity {
            id,
            name: self.name,
            activity_type: self.activity_type,
            description: self.description,
            urgency: self.urgency,
            estimated_duration: self.estimated_duration,
            estimated_minutes: self.estimated_minutes,
            duration: None,
            day_index: self.day_index,
            order: self.order,
            completed: self.completed,
            time_block_id: self.time_block_id,
            preferred_time: self.preferred_time,
            preferred_days: self.preferred_days,
            priority: None,
            time_slot: None,
        })
    }
}

fn check_day_index(day_index: Option<u32>) -> AppResult<()> {
    match day_index {
        Some(day) if Day::from_index(day).is_none() => {
            Err(AppError::validation("dayIndex must be 0..=6"))
        }
        _ => Ok(()),
    }
}

fn check_hours(field: &str, hours: Option<f64>) -> AppResult<()> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => {
            Err(AppError::validation(format!("{field} must be >= 0")))
        }
        _ => Ok(()),
    }
}

fn check_preferred_time(pref: Option<PreferredTime>) -> AppResult<()> {
    match pref {
        Some(p) if p.start_hour >= p.end_hour || p.end_hour > 24 => Err(AppError::validation(
            "preferredTime must satisfy start < end <= 24",
        )),
        _ => Ok(()),
    }
}

// Stored activities carry the same constraints as new ones, except for
// block links: a backup may reference blocks it does not contain.
fn validate_activity(activity: &Activity) -> AppResult<()> {
    check_day_index(activity.day_index)?;
    check_hours("estimatedDuration", activity.estimated_duration)?;
    check_hours("duration", activity.duration)?;
    check_preferred_time(activity.preferred_time)
}

fn validate_import(patch: &StatePatch) -> AppResult<()> {
    if let Some(settings) = &patch.settings {
        validate_settings(settings)?;
    }
    if let Some(activities) = &patch.activities {
        for activity in activities {
            validate_activity(activity)?;
        }
    }
    Ok(())
}

// -----------------------------
// POST /api/activities
// -----------------------------
pub async fn create_activity(
    State(store): State<SharedStore>,
    Json(input): Json<ActivityInput>,
) -> AppResult<Json<MutationResponse<Activity>>> {
    let mut store = lock(&store)?;
    let activity = input.into_activity(Uuid::new_v4(), store.state())?;

    let persistence = store.dispatch(Action::AddActivity(activity.clone()));
    Ok(Json(MutationResponse::new(activity, persistence)))
}

// -----------------------------
// PUT /api/activities/:id
// Also used by drag-and-drop reordering (new `order` / `dayIndex`)
// -----------------------------
pub async fn update_activity(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    Json(input): Json<ActivityInput>,
) -> AppResult<Json<MutationResponse<Activity>>> {
    let id = parse_id(&id)?;

    let mut store = lock(&store)?;
    let Some(existing) = store.state().activities.iter().find(|a| a.id == id) else {
        return Err(AppError::not_found("activity"));
    };
    let (legacy_duration, priority, time_slot) = (existing.duration, existing.priority, existing.time_slot);

    let mut activity = input.into_activity(id, store.state())?;
    activity.duration = legacy_duration;
    activity.priority = priority;
    activity.time_slot = time_slot;

    let persistence = store.dispatch(Action::UpdateActivity(activity.clone()));
    Ok(Json(MutationResponse::new(activity, persistence)))
}

// -----------------------------
// DELETE /api/activities/:id
// -----------------------------
pub async fn delete_activity(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> AppResult<Json<MutationResponse<serde_json::Value>>> {
    let id = parse_id(&id)?;

    let mut store = lock(&store)?;
    if !store.state().activities.iter().any(|a| a.id == id) {
        return Err(AppError::not_found("activity"));
    }

    let persistence = store.dispatch(Action::RemoveActivity(id));
    Ok(Json(MutationResponse::new(
        serde_json::json!({ "ok": true }),
        persistence,
    )))
}

// -----------------------------
// POST /api/activities/:id/toggle
// Flips `completed`
// -----------------------------
pub async fn toggle_activity(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> AppResult<Json<MutationResponse<Activity>>> {
    let id = parse_id(&id)?;

    let mut store = lock(&store)?;
    let Some(activity) = store.state().activities.iter().find(|a| a.id == id) else {
        return Err(AppError::not_found("activity"));
    };
    let completed = !activity.completed;

    let persistence = store.dispatch(Action::SetActivityCompleted { id, completed });
    let updated = store
        .state()
        .activities
        .iter()
        .find(|a| a.id == id)
        .cloned()
        .ok_or_else(|| AppError::not_found("activity"))?;
    Ok(Json(MutationResponse::new(updated, persistence)))
}

// -----------------------------
// GET /api/settings
// -----------------------------
pub async fn get_settings(State(store): State<SharedStore>) -> AppResult<Json<Settings>> {
    let store = lock(&store)?;
    Ok(Json(store.state().settings.clone()))
}

fn validate_settings_patch(patch: &SettingsPatch) -> AppResult<()> {
    if let Some(w) = patch.active_window {
        if !w.is_valid() {
            return Err(AppError::validation("activeWindow must satisfy start < end <= 24"));
        }
    }

    let in_unit = |v: f64| (0.0..=1.0).contains(&v);
    if let Some(t) = patch.type_weights {
        if !ActivityType::ALL.iter().all(|a| in_unit(t.get(*a))) {
            return Err(AppError::validation("typeWeights must be within [0, 1]"));
        }
    }
    if let Some(u) = patch.urgency_weights {
        let all = [u.very_urgent, u.urgent, u.medium, u.normal, u.low];
        if !all.into_iter().all(in_unit) {
            return Err(AppError::validation("urgencyWeights must be within [0, 1]"));
        }
    }
    if let Some(p) = patch.productivity_weights {
        if !in_unit(p.adherence_weight) || !in_unit(p.completion_weight) {
            return Err(AppError::validation("productivityWeights must be within [0, 1]"));
        }
    }
    Ok(())
}

// A full settings object must pass every check a patch would.
fn validate_settings(settings: &Settings) -> AppResult<()> {
    validate_settings_patch(&SettingsPatch {
        active_window: Some(settings.active_window),
        type_weights: Some(settings.type_weights),
        urgency_weights: Some(settings.urgency_weights),
        productivity_weights: Some(settings.productivity_weights),
        ..SettingsPatch::default()
    })
}

// -----------------------------
// PUT /api/settings
// Shallow-merges the given fields
// -----------------------------
pub async fn put_settings(
    State(store): State<SharedStore>,
    Json(patch): Json<SettingsPatch>,
) -> AppResult<Json<MutationResponse<Settings>>> {
    validate_settings_patch(&patch)?;

    let mut store = lock(&store)?;
    let persistence = store.dispatch(Action::UpdateSettings(patch));
    Ok(Json(MutationResponse::new(
        store.state().settings.clone(),
        persistence,
    )))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::STATE_KEY;
    use crate::models::ActiveWindow;
    use tempfile::TempDir;

    pub(crate) fn test_store() -> (SharedStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = ScheduleStore::open(FileStorage::new(dir.path()), STATE_KEY);
        (shared(store), dir)
    }

    pub(crate) fn block_input(day: Day, start: &str, end: &str, title: &str) -> BlockInput {
        BlockInput {
            day,
            start_time: start.to_string(),
            end_time: end.to_string(),
            block_type: BlockType::Occupied,
            activity_type: Some(ActivityType::Academic),
            title: title.to_string(),
            description: None,
            location: None,
            color: None,
        }
    }

    fn activity_input(name: &str) -> ActivityInput {
        ActivityInput {
            name: name.to_string(),
            activity_type: ActivityType::Study,
            description: None,
            urgency: Urgency::Urgent,
            estimated_duration: Some(1.0),
            estimated_minutes: None,
            day_index: Some(1),
            order: None,
            completed: false,
            time_block_id: None,
            preferred_time: None,
            preferred_days: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_block_rejects_same_day_overlap() {
        let (store, _dir) = test_store();
        let Json(created) = create_block(
            State(store.clone()),
            Json(block_input(Day::Monday, "08:00", "10:00", "Calculus")),
        )
        .await
        .unwrap();
        assert!(created.saved);

        let err = create_block(
            State(store.clone()),
            Json(block_input(Day::Monday, "09:00", "11:00", "Physics")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // same slot on another day is fine
        create_block(
            State(store.clone()),
            Json(block_input(Day::Tuesday, "09:00", "11:00", "Physics")),
        )
        .await
        .unwrap();
        assert_eq!(lock(&store).unwrap().state().time_blocks.len(), 2);
    }

    #[tokio::test]
    async fn create_block_validates_input() {
        let (store, _dir) = test_store();
        let err = create_block(
            State(store.clone()),
            Json(block_input(Day::Monday, "8am", "10:00", "Calculus")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidTime { .. }));

        let err = create_block(State(store), Json(block_input(Day::Monday, "08:00", "10:00", " ")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_block_may_keep_its_own_slot() {
        let (store, _dir) = test_store();
        let Json(created) = create_block(
            State(store.clone()),
            Json(block_input(Day::Monday, "08:00", "10:00", "Calculus")),
        )
        .await
        .unwrap();

        let Json(updated) = update_block(
            State(store.clone()),
            Path(created.data.id.to_string()),
            Json(block_input(Day::Monday, "08:30", "10:30", "Calculus II")),
        )
        .await
        .unwrap();
        assert_eq!(updated.data.title, "Calculus II");

        let err = update_block(
            State(store),
            Path(Uuid::new_v4().to_string()),
            Json(block_input(Day::Monday, "12:00", "13:00", "Ghost")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_a_block_unlinks_activities() {
        let (store, _dir) = test_store();
        let Json(created) = create_block(
            State(store.clone()),
            Json(block_input(Day::Monday, "08:00", "10:00", "Calculus")),
        )
        .await
        .unwrap();

        let mut input = activity_input("homework");
        input.time_block_id = Some(created.data.id);
        let Json(activity) = create_activity(State(store.clone()), Json(input)).await.unwrap();

        delete_block(State(store.clone()), Path(created.data.id.to_string()))
            .await
            .unwrap();

        let guard = lock(&store).unwrap();
        assert!(guard.state().time_blocks.is_empty());
        let a = guard
            .state()
            .activities
            .iter()
            .find(|a| a.id == activity.data.id)
            .unwrap();
        assert_eq!(a.time_block_id, None);
    }

    #[tokio::test]
    async fn activity_link_must_exist() {
        let (store, _dir) = test_store();
        let mut input = activity_input("homework");
        input.time_block_id = Some(Uuid::new_v4());
        let err = create_activity(State(store), Json(input)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn toggling_flips_completion() {
        let (store, _dir) = test_store();
        let Json(created) = create_activity(State(store.clone()), Json(activity_input("flashcards")))
            .await
            .unwrap();

        let Json(toggled) = toggle_activity(State(store.clone()), Path(created.data.id.to_string()))
            .await
            .unwrap();
        assert!(toggled.data.completed);

        let Json(toggled) = toggle_activity(State(store), Path(created.data.id.to_string()))
            .await
            .unwrap();
        assert!(!toggled.data.completed);
    }

    #[tokio::test]
    async fn completing_a_block_sets_and_clears_timestamp() {
        let (store, _dir) = test_store();
        let Json(created) = create_block(
            State(store.clone()),
            Json(block_input(Day::Friday, "10:00", "11:00", "Lab")),
        )
        .await
        .unwrap();
        let id = created.data.id.to_string();

        let Json(done) = complete_block(State(store.clone()), Path(id.clone())).await.unwrap();
        assert!(done.data.completed_at.is_some());
        let Json(undone) = complete_block(State(store), Path(id)).await.unwrap();
        assert!(undone.data.completed_at.is_none());
    }

    #[tokio::test]
    async fn settings_patch_is_validated_and_merged() {
        let (store, _dir) = test_store();
        let bad = SettingsPatch {
            active_window: Some(ActiveWindow {
                start_hour: 21,
                end_hour: 5,
            }),
            ..SettingsPatch::default()
        };
        let err = put_settings(State(store.clone()), Json(bad)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let good = SettingsPatch {
            minimum_sleep_hours: Some(8),
            ..SettingsPatch::default()
        };
        let Json(resp) = put_settings(State(store.clone()), Json(good)).await.unwrap();
        assert_eq!(resp.data.minimum_sleep_hours, 8);
        assert_eq!(resp.data.active_window, ActiveWindow::default());
    }

    #[tokio::test]
    async fn import_rejects_invalid_settings_and_keeps_state() {
        let (store, _dir) = test_store();
        create_block(
            State(store.clone()),
            Json(block_input(Day::Monday, "08:00", "10:00", "Calculus")),
        )
        .await
        .unwrap();
        let before = lock(&store).unwrap().state().clone();

        let inverted = Settings {
            active_window: ActiveWindow {
                start_hour: 21,
                end_hour: 5,
            },
            ..Settings::default()
        };
        let patch = StatePatch {
            time_blocks: Some(Vec::new()),
            settings: Some(inverted),
            ..StatePatch::default()
        };
        let err = import_state(State(store.clone()), Json(patch)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let huge = Settings {
            active_window: ActiveWindow {
                start_hour: 0,
                end_hour: 80_000_000,
            },
            ..Settings::default()
        };
        let err = import_state(
            State(store.clone()),
            Json(StatePatch {
                settings: Some(huge),
                ..StatePatch::default()
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut heavy = Settings::default();
        heavy.type_weights.study = 1.5;
        let err = import_state(
            State(store.clone()),
            Json(StatePatch {
                settings: Some(heavy),
                ..StatePatch::default()
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // nothing was replaced and the lock is still usable
        let Json(state) = get_state(State(store.clone())).await.unwrap();
        assert_eq!(state, before);
        assert_eq!(crate::store::load_state(lock(&store).unwrap().backend(), STATE_KEY), before);
    }

    #[tokio::test]
    async fn import_rejects_invalid_activities() {
        let (store, _dir) = test_store();

        let mut wrong_day = Activity::new("reading", ActivityType::Study);
        wrong_day.day_index = Some(9);
        let err = import_state(
            State(store.clone()),
            Json(StatePatch {
                activities: Some(vec![wrong_day]),
                ..StatePatch::default()
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut negative = Activity::new("essay", ActivityType::Academic);
        negative.estimated_duration = Some(-2.0);
        let err = import_state(
            State(store.clone()),
            Json(StatePatch {
                activities: Some(vec![negative]),
                ..StatePatch::default()
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(lock(&store).unwrap().state().activities.is_empty());

        // a link to a block missing from the backup is tolerated
        let mut linked = Activity::new("homework", ActivityType::Academic);
        linked.time_block_id = Some(Uuid::new_v4());
        linked.day_index = Some(6);
        let Json(resp) = import_state(
            State(store),
            Json(StatePatch {
                activities: Some(vec![linked]),
                ..StatePatch::default()
            }),
        )
        .await
        .unwrap();
        assert!(resp.saved);
        assert_eq!(resp.data.activities.len(), 1);
    }

    #[tokio::test]
    async fn updating_an_activity_keeps_legacy_fields() {
        let (store, _dir) = test_store();
        let mut old = Activity::new("lab report", ActivityType::Academic);
        old.duration = Some(2.0);
        old.priority = Some(crate::models::LegacyPriority::High);
        let id = old.id;
        import_state(
            State(store.clone()),
            Json(StatePatch {
                activities: Some(vec![old]),
                ..StatePatch::default()
            }),
        )
        .await
        .unwrap();

        let Json(updated) = update_activity(State(store), Path(id.to_string()), Json(activity_input("lab report v2")))
            .await
            .unwrap();
        assert_eq!(updated.data.name, "lab report v2");
        assert_eq!(updated.data.duration, Some(2.0));
        assert_eq!(updated.data.priority, Some(crate::models::LegacyPriority::High));
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected() {
        let (store, _dir) = test_store();
        let err = delete_activity(State(store), Path("not-a-uuid".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
