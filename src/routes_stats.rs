// Read-only endpoints backed by the selectors and scoring engine.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::insights::ScheduleSummary;
use crate::models::{Activity, Day, TimeBlock};
use crate::routes_schedule::{lock, SharedStore};
use crate::selectors::{
    first_free_hour, next_blocks_at, planned_minutes_by_day, unplanned_activities_by_day,
};
use crate::time::week_minute_now;

const DEFAULT_NEXT_COUNT: usize = 3;
const MAX_NEXT_COUNT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub n: Option<usize>,
}

impl NextQuery {
    fn count(&self) -> usize {
        self.n.unwrap_or(DEFAULT_NEXT_COUNT).min(MAX_NEXT_COUNT)
    }
}

// GET /api/summary?n=3
pub async fn get_summary(
    State(store): State<SharedStore>,
    Query(q): Query<NextQuery>,
) -> AppResult<Json<ScheduleSummary>> {
    let store = lock(&store)?;
    let summary = ScheduleSummary::build(store.state(), week_minute_now(), q.count());
    Ok(Json(summary))
}

// GET /api/upcoming?n=3
pub async fn get_upcoming(
    State(store): State<SharedStore>,
    Query(q): Query<NextQuery>,
) -> AppResult<Json<Vec<TimeBlock>>> {
    let store = lock(&store)?;
    let blocks = next_blocks_at(store.state(), week_minute_now(), q.count())
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(blocks))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub day: Day,
    pub planned_minutes: u32,
    pub first_free_hour: Option<u32>,
    pub unplanned: Vec<Activity>,
}

// GET /api/days/:day_index   (0 = Monday)
pub async fn get_day(
    State(store): State<SharedStore>,
    Path(day_index): Path<u32>,
) -> AppResult<Json<DayView>> {
    let day = Day::from_index(day_index)
        .ok_or_else(|| AppError::validation("day index must be 0..=6"))?;

    let store = lock(&store)?;
    let state = store.state();
    Ok(Json(DayView {
        day,
        planned_minutes: planned_minutes_by_day(state, day_index),
        first_free_hour: first_free_hour(state, day),
        unplanned: unplanned_activities_by_day(state, day_index)
            .into_iter()
            .cloned()
            .collect(),
    }))
}
