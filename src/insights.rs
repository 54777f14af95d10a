use serde::Serialize;

use crate::models::{ActivityType, ScheduleState, TimeBlock};
use crate::scoring::{adherence_rate, balance_score, completion_progress, productivity_score};
use crate::selectors::{
    hours_by_type, next_blocks_at, total_free_hours, total_occupied_hours,
    unplanned_activity_hours_by_type, weekly_available_minutes,
};

// Thresholds for dashboard advice.
const MIN_FREE_SHARE: f64 = 15.0; // % of weekly budget
const MIN_ACADEMIC_SHARE: f64 = 30.0; // % of planned hours
const MIN_EXERCISE_HOURS: f64 = 3.0;
const MIN_REST_SHARE: f64 = 0.15; // fraction of planned hours
const MAX_ACADEMIC_HOURS: f64 = 40.0;

/// Advice derived from the current week. The UI owns the wording.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    NeedsSchedule,
    OverBooked,
    LowAcademicShare,
    LowExercise,
    LowRest,
    HeavyAcademicLoad,
    Balanced,
}

pub fn recommendations(state: &ScheduleState) -> Vec<Recommendation> {
    if state.time_blocks.is_empty() {
        return vec![Recommendation::NeedsSchedule];
    }

    let has_activities = !state.activities.is_empty();
    let academic_hours =
        hours_by_type(state, ActivityType::Academic) + hours_by_type(state, ActivityType::Study);
    let planned_hours = planned_hours(state);
    let academic_share = if planned_hours > 0.0 {
        academic_hours / planned_hours * 100.0
    } else {
        0.0
    };

    let budget_hours = f64::from(weekly_available_minutes(&state.settings)) / 60.0;
    let free_share = if budget_hours > 0.0 {
        total_free_hours(state) / budget_hours * 100.0
    } else {
        0.0
    };

    let mut out = Vec::new();
    if free_share < MIN_FREE_SHARE {
        out.push(Recommendation::OverBooked);
    }
    if has_activities && academic_share < MIN_ACADEMIC_SHARE {
        out.push(Recommendation::LowAcademicShare);
    }
    if has_activities && hours_by_type(state, ActivityType::Exercise) < MIN_EXERCISE_HOURS {
        out.push(Recommendation::LowExercise);
    }
    if has_activities && hours_by_type(state, ActivityType::Rest) < planned_hours * MIN_REST_SHARE {
        out.push(Recommendation::LowRest);
    }
    if academic_hours > MAX_ACADEMIC_HOURS {
        out.push(Recommendation::HeavyAcademicLoad);
    }
    if out.is_empty() {
        out.push(Recommendation::Balanced);
    }
    out
}

// Block hours summed over every activity type.
pub fn planned_hours(state: &ScheduleState) -> f64 {
    ActivityType::ALL.iter().map(|t| hours_by_type(state, *t)).sum()
}

// Estimated hours of activities not yet tied to a block.
pub fn unplanned_backlog_hours(state: &ScheduleState) -> f64 {
    ActivityType::ALL
        .iter()
        .map(|t| unplanned_activity_hours_by_type(state, *t))
        .sum()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeHours {
    pub activity_type: ActivityType,
    pub planned_hours: f64,
    pub unplanned_hours: f64,
}

/// Everything the dashboard shows, computed in one pass over the state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub occupied_hours: f64,
    pub free_hours: f64,
    pub available_hours: f64,
    pub planned_hours: f64,
    pub unplanned_backlog_hours: f64,
    pub by_type: Vec<TypeHours>,
    pub adherence_rate: u32,
    pub completion_progress: u32,
    pub productivity_score: u32,
    pub balance_score: u32,
    pub recommendations: Vec<Recommendation>,
    pub next_blocks: Vec<TimeBlock>,
}

impl ScheduleSummary {
    pub fn build(state: &ScheduleState, now_minute: u32, next_count: usize) -> Self {
        let by_type = ActivityType::ALL
            .iter()
            .map(|t| TypeHours {
                activity_type: *t,
                planned_hours: hours_by_type(state, *t),
                unplanned_hours: unplanned_activity_hours_by_type(state, *t),
            })
            .collect();

        Self {
            occupied_hours: total_occupied_hours(state),
            free_hours: total_free_hours(state),
            available_hours: f64::from(weekly_available_minutes(&state.settings)) / 60.0,
            planned_hours: planned_hours(state),
            unplanned_backlog_hours: unplanned_backlog_hours(state),
            by_type,
            adherence_rate: adherence_rate(state),
            completion_progress: completion_progress(state),
            productivity_score: productivity_score(state),
            balance_score: balance_score(state),
            recommendations: recommendations(state),
            next_blocks: next_blocks_at(state, now_minute, next_count)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}
