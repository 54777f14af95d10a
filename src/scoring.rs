/*
Weighted adherence, completion and productivity scores.
All scores are integer percentages in 0..=100.
*/

use crate::models::{Activity, ActivityType, ScheduleState, Settings};
use crate::selectors::{hours_by_type, weekly_available_minutes};

// round(min(100, 100 * completed_weight / total_weight)), 0 on an empty denominator.
//
// Denominator weighs each activity by its type; the numerator additionally
// scales completed activities by their urgency.
fn weighted_completion<'a, I>(activities: I, settings: &Settings) -> u32
where
    I: IntoIterator<Item = &'a Activity>,
{
    let type_weights = &settings.type_weights;
    let urgency_weights = &settings.urgency_weights;

    let (num, denom) = activities
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(num, denom), a| {
            let type_weight = type_weights.get(a.activity_type);
            let num = if a.completed {
                num + type_weight * urgency_weights.get(a.urgency)
            } else {
                num
            };
            (num, denom + type_weight)
        });

    if denom <= 0.0 {
        return 0;
    }
    percentage(num / denom * 100.0)
}

fn percentage(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u32
}

// Completion over planned activities only (linked to a block or carrying hints).
pub fn adherence_rate(state: &ScheduleState) -> u32 {
    weighted_completion(
        state.activities.iter().filter(|a| a.is_planned()),
        &state.settings,
    )
}

// Same formula as adherence, over every activity.
pub fn completion_progress(state: &ScheduleState) -> u32 {
    weighted_completion(&state.activities, &state.settings)
}

pub fn productivity_score(state: &ScheduleState) -> u32 {
    let weights = &state.settings.productivity_weights;
    let score = f64::from(adherence_rate(state)) * weights.adherence_weight
        + f64::from(completion_progress(state)) * weights.completion_weight;
    percentage(score)
}

// Share of the weekly budget spent in productive block types, capped at 100.
pub fn balance_score(state: &ScheduleState) -> u32 {
    let budget = weekly_available_minutes(&state.settings);
    if budget == 0 {
        return 0;
    }
    let productive_minutes: f64 = ActivityType::ALL
        .iter()
        .filter(|t| t.is_productive())
        .map(|t| hours_by_type(state, *t) * 60.0)
        .sum();
    percentage(productive_minutes / f64::from(budget) * 100.0)
}
