// --------------------------------------------------
// Handles API endpoints for the daily to-do list.
//
// Responsibilities:
// - List tasks for a date, with completed / total / percent
// - Create / delete tasks
// - Toggle task completion
//
// Tasks are stored under their own key, apart from the schedule.
// -------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::routes_schedule::MutationResponse;
use crate::store::{FileStorage, TaskStore};
use crate::tasks::{DailyTask, DayProgress, TaskAction};

pub type SharedTasks = Arc<Mutex<TaskStore<FileStorage>>>;

pub fn shared_tasks(store: TaskStore<FileStorage>) -> SharedTasks {
    Arc::new(Mutex::new(store))
}

fn lock_tasks(store: &SharedTasks) -> AppResult<MutexGuard<'_, TaskStore<FileStorage>>> {
    store
        .lock()
        .map_err(|_| AppError::Other("task store lock poisoned".to_string()))
}

fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| AppError::validation("invalid date"))
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation("invalid id"))
}

#[derive(Debug, Deserialize)]
pub struct TasksQuery {
    pub date: Option<String>, // "YYYY-MM-DD", defaults to today
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub date: NaiveDate,
    pub tasks: Vec<DailyTask>,
    pub progress: DayProgress,
}

// -----------------------------
// GET /api/tasks?date=YYYY-MM-DD
// Returns the tasks for one date and how many are done
// -----------------------------
pub async fn get_tasks(
    State(store): State<SharedTasks>,
    Query(q): Query<TasksQuery>,
) -> AppResult<Json<TasksResponse>> {
    let date = match q.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Local::now().date_naive(),
    };

    let store = lock_tasks(&store)?;
    let tasks = store.state();
    Ok(Json(TasksResponse {
        date,
        tasks: tasks.for_date(date).to_vec(),
        progress: tasks.progress(date),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskInput {
    pub date: String, // "YYYY-MM-DD"
    pub title: String,
}

// -----------------------------
// POST /api/tasks
// Appends a task to the given date
// -----------------------------
pub async fn create_task(
    State(store): State<SharedTasks>,
    Json(input): Json<CreateTaskInput>,
) -> AppResult<Json<MutationResponse<DailyTask>>> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title required"));
    }
    let date = parse_date(&input.date)?;
    let task = DailyTask::new(title, Local::now().fixed_offset());

    let mut store = lock_tasks(&store)?;
    let persistence = store.dispatch(TaskAction::AddTask {
        date,
        task: task.clone(),
    });
    Ok(Json(MutationResponse::new(task, persistence)))
}

// -----------------------------
// POST /api/tasks/:id/toggle
// Flips `completed`
// -----------------------------
pub async fn toggle_task(
    State(store): State<SharedTasks>,
    Path(id): Path<String>,
) -> AppResult<Json<MutationResponse<DailyTask>>> {
    let id = parse_id(&id)?;

    let mut store = lock_tasks(&store)?;
    let Some(date) = store.state().date_of(id) else {
        return Err(AppError::not_found("task"));
    };

    let persistence = store.dispatch(TaskAction::ToggleTask { date, id });
    let updated = store
        .state()
        .for_date(date)
        .iter()
        .find(|t| t.id == id)
        .cloned()
        .ok_or_else(|| AppError::not_found("task"))?;
    Ok(Json(MutationResponse::new(updated, persistence)))
}

// -----------------------------
// DELETE /api/tasks/:id
// -----------------------------
pub async fn delete_task(
    State(store): State<SharedTasks>,
    Path(id): Path<String>,
) -> AppResult<Json<MutationResponse<DayProgress>>> {
    let id = parse_id(&id)?;

    let mut store = lock_tasks(&store)?;
    let Some(date) = store.state().date_of(id) else {
        return Err(AppError::not_found("task"));
    };

    let persistence = store.dispatch(TaskAction::RemoveTask { date, id });
    Ok(Json(MutationResponse::new(
        store.state().progress(date),
        persistence,
    )))
}
