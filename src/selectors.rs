/*
Read-only queries over the schedule state.
Nothing in here mutates the state or touches storage.
*/

use uuid::Uuid;

use crate::models::{Activity, ActivityType, Day, ScheduleState, Settings, TimeBlock};
use crate::time::{
    MINUTES_PER_DAY, clipped_duration_minutes, full_duration_minutes, overlaps, week_minute_now,
    week_range,
};

// Slot-picker search range for `first_free_hour`.
const FIRST_PICKER_HOUR: u32 = 6;
const LAST_PICKER_HOUR: u32 = 22;

fn occupied_blocks(state: &ScheduleState) -> impl Iterator<Item = &TimeBlock> {
    state.time_blocks.iter().filter(|b| b.is_occupied())
}

// Sum of window-clipped minutes over occupied blocks.
pub fn total_occupied_minutes(state: &ScheduleState) -> u32 {
    let window = &state.settings.active_window;
    occupied_blocks(state)
        .map(|b| clipped_duration_minutes(b, window))
        .sum()
}

pub fn total_occupied_hours(state: &ScheduleState) -> f64 {
    f64::from(total_occupied_minutes(state)) / 60.0
}

// Hours of occupied blocks tagged with `activity_type`.
//
// Clipped to the active window, except rest, which is credited in full
// since sleep and breaks legitimately happen outside active hours.
pub fn hours_by_type(state: &ScheduleState, activity_type: ActivityType) -> f64 {
    let window = &state.settings.active_window;
    let minutes: u32 = occupied_blocks(state)
        .filter(|b| b.activity_type == Some(activity_type))
        .map(|b| {
            if activity_type == ActivityType::Rest {
                full_duration_minutes(b)
            } else {
                clipped_duration_minutes(b, window)
            }
        })
        .sum();
    f64::from(minutes) / 60.0
}

// Blocks that have not finished yet relative to `now_minute`,
// ordered by weekly start.
pub fn next_blocks_at(state: &ScheduleState, now_minute: u32, n: usize) -> Vec<&TimeBlock> {
    let mut upcoming: Vec<(u32, &TimeBlock)> = state
        .time_blocks
        .iter()
        .map(|b| (week_range(b), b))
        .filter(|(range, _)| range.end > now_minute)
        .map(|(range, b)| (range.start, b))
        .collect();

    upcoming.sort_by_key(|(start, _)| *start);
    upcoming.into_iter().take(n).map(|(_, b)| b).collect()
}

pub fn next_blocks(state: &ScheduleState, n: usize) -> Vec<&TimeBlock> {
    next_blocks_at(state, week_minute_now(), n)
}

// Clipped occupied minutes declared on the given day (Monday = 0).
// Out-of-range indices yield 0.
pub fn planned_minutes_by_day(state: &ScheduleState, day_index: u32) -> u32 {
    let Some(day) = Day::from_index(day_index) else {
        return 0;
    };
    let window = &state.settings.active_window;
    occupied_blocks(state)
        .filter(|b| b.day == day)
        .map(|b| clipped_duration_minutes(b, window))
        .sum()
}

// Weekly budget derived from the active window: 16h x 7 = 6720 by default.
pub fn weekly_available_minutes(settings: &Settings) -> u32 {
    settings.active_window.daily_minutes() * 7
}

// Remaining budget in hours, floored at zero.
pub fn total_free_hours(state: &ScheduleState) -> f64 {
    let budget = weekly_available_minutes(&state.settings);
    let free = budget.saturating_sub(total_occupied_minutes(state));
    f64::from(free) / 60.0
}

// Activities not tied to a block, bucketed on `day_index`, sorted by `order`.
pub fn unplanned_activities_by_day(state: &ScheduleState, day_index: u32) -> Vec<&Activity> {
    let mut activities: Vec<&Activity> = state
        .activities
        .iter()
        .filter(|a| a.time_block_id.is_none() && a.day_index == Some(day_index))
        .collect();
    activities.sort_by_key(|a| a.order.unwrap_or(0));
    activities
}

pub fn unplanned_activity_hours_by_type(state: &ScheduleState, activity_type: ActivityType) -> f64 {
    state
        .activities
        .iter()
        .filter(|a| a.time_block_id.is_none() && a.activity_type == activity_type)
        .map(|a| a.estimated_minutes_total() / 60.0)
        .sum()
}

// Hours per type across all activities.
//
// An activity linked to an existing block is credited with that block's
// duration; otherwise its own estimate, then the legacy `duration` field.
pub fn activity_duration_by_type(state: &ScheduleState, activity_type: ActivityType) -> f64 {
    state
        .activities
        .iter()
        .filter(|a| a.activity_type == activity_type)
        .map(|a| {
            let linked = a
                .time_block_id
                .and_then(|id| state.time_blocks.iter().find(|b| b.id == id));
            match linked {
                Some(block) => f64::from(full_duration_minutes(block)) / 60.0,
                None => own_estimate_hours(a),
            }
        })
        .sum()
}

fn own_estimate_hours(activity: &Activity) -> f64 {
    if activity.estimated_minutes.is_some() || activity.estimated_duration.is_some() {
        activity.estimated_minutes_total() / 60.0
    } else {
        activity.duration.unwrap_or(0.0)
    }
}

// First whole hour in 06..=22 whose start is not covered by a block on `day`.
pub fn first_free_hour(state: &ScheduleState, day: Day) -> Option<u32> {
    let covers = |b: &TimeBlock, minute: u32| {
        let start = b.start_time.minutes();
        let end = b.end_time.minutes();
        if end >= start {
            minute >= start && minute < end
        } else {
            minute >= start || minute < end
        }
    };

    (FIRST_PICKER_HOUR..=LAST_PICKER_HOUR).find(|hour| {
        let minute = hour * 60;
        debug_assert!(minute < MINUTES_PER_DAY);
        !state
            .time_blocks
            .iter()
            .filter(|b| b.day == day)
            .any(|b| covers(b, minute))
    })
}

// First block on the candidate's declared day that overlaps it.
// `ignore` skips the block being edited.
pub fn find_conflict<'a>(
    state: &'a ScheduleState,
    candidate: &TimeBlock,
    ignore: Option<Uuid>,
) -> Option<&'a TimeBlock> {
    state
        .time_blocks
        .iter()
        .filter(|b| Some(b.id) != ignore)
        .filter(|b| b.day == candidate.day)
        .find(|b| overlaps(candidate, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActiveWindow, BlockType};
    use crate::time::tests::block;
    use crate::time::{MINUTES_PER_DAY, MINUTES_PER_WEEK, week_minute};

    const EPS: f64 = 1e-9;

    fn typed(day: Day, start: &str, end: &str, t: ActivityType) -> TimeBlock {
        let mut b = block(day, start, end);
        b.activity_type = Some(t);
        b
    }

    fn with_blocks(blocks: Vec<TimeBlock>) -> ScheduleState {
        ScheduleState {
            time_blocks: blocks,
            ..ScheduleState::default()
        }
    }

    fn unplanned(t: ActivityType, hours: f64) -> Activity {
        let mut a = Activity::new("task", t);
        a.estimated_duration = Some(hours);
        a
    }

    #[test]
    fn hours_by_type_for_classes_and_study() {
        let state = with_blocks(vec![
            typed(Day::Monday, "08:00", "10:00", ActivityType::Academic),
            typed(Day::Tuesday, "06:00", "07:00", ActivityType::Study),
        ]);
        assert!((hours_by_type(&state, ActivityType::Academic) - 2.0).abs() < EPS);
        assert!((hours_by_type(&state, ActivityType::Study) - 1.0).abs() < EPS);
        assert!((hours_by_type(&state, ActivityType::Work)).abs() < EPS);
        assert_eq!(total_occupied_minutes(&state), 180);
        assert!((total_free_hours(&state) - 109.0).abs() < EPS);
    }

    #[test]
    fn rest_is_credited_outside_the_window() {
        let state = with_blocks(vec![
            typed(Day::Monday, "22:00", "23:00", ActivityType::Rest),
            typed(Day::Tuesday, "22:00", "23:00", ActivityType::Academic),
        ]);
        assert!((hours_by_type(&state, ActivityType::Rest) - 1.0).abs() < EPS);
        assert!(hours_by_type(&state, ActivityType::Academic).abs() < EPS);
        assert_eq!(total_occupied_minutes(&state), 0);
    }

    #[test]
    fn rest_crossing_midnight_counts_full_night() {
        let state = with_blocks(vec![typed(Day::Sunday, "23:00", "07:00", ActivityType::Rest)]);
        assert!((hours_by_type(&state, ActivityType::Rest) - 8.0).abs() < EPS);
        // only 05:00-07:00 lies in the default window
        assert_eq!(total_occupied_minutes(&state), 120);
    }

    #[test]
    fn free_blocks_do_not_count() {
        let mut free = typed(Day::Monday, "08:00", "10:00", ActivityType::Academic);
        free.block_type = BlockType::Free;
        let state = with_blocks(vec![free]);
        assert_eq!(total_occupied_minutes(&state), 0);
        assert!(hours_by_type(&state, ActivityType::Academic).abs() < EPS);
        assert_eq!(planned_minutes_by_day(&state, 0), 0);
    }

    #[test]
    fn free_hours_shrink_and_floor_at_zero() {
        let mut state = ScheduleState::default();
        let mut previous = total_free_hours(&state);
        assert!((previous - 112.0).abs() < EPS);

        for day in Day::ALL {
            state.time_blocks.push(block(day, "05:00", "21:00"));
            let free = total_free_hours(&state);
            assert!(free <= previous);
            previous = free;
        }
        assert_eq!(total_free_hours(&state), 0.0);

        state.time_blocks.push(block(Day::Monday, "06:00", "07:00"));
        assert_eq!(total_free_hours(&state), 0.0);
    }

    #[test]
    fn weekly_budget_follows_active_window() {
        let mut state = ScheduleState::default();
        assert_eq!(weekly_available_minutes(&state.settings), 6720);
        state.settings.active_window = ActiveWindow {
            start_hour: 8,
            end_hour: 20,
        };
        assert_eq!(weekly_available_minutes(&state.settings), 12 * 60 * 7);
        assert!((total_free_hours(&state) - 84.0).abs() < EPS);
    }

    #[test]
    fn planned_minutes_by_day_uses_declared_day() {
        let state = with_blocks(vec![
            block(Day::Monday, "08:00", "10:00"),
            block(Day::Monday, "20:00", "22:00"),
            block(Day::Wednesday, "09:00", "10:00"),
        ]);
        assert_eq!(planned_minutes_by_day(&state, 0), 180);
        assert_eq!(planned_minutes_by_day(&state, 1), 0);
        assert_eq!(planned_minutes_by_day(&state, 2), 60);
        assert_eq!(planned_minutes_by_day(&state, 9), 0);
    }

    #[test]
    fn next_blocks_skips_finished_and_sorts() {
        let state = with_blocks(vec![
            block(Day::Wednesday, "09:00", "10:00"),
            block(Day::Monday, "08:00", "10:00"),
            block(Day::Tuesday, "14:00", "16:00"),
            block(Day::Tuesday, "08:00", "09:00"),
        ]);
        let now = week_minute(Day::Tuesday, 8, 30);
        let next = next_blocks_at(&state, now, 2);
        let titles: Vec<&str> = next.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["08:00-09:00", "14:00-16:00"]);
        assert_eq!(next[0].day, Day::Tuesday);

        assert_eq!(next_blocks_at(&state, now, 10).len(), 3);
        assert!(next_blocks_at(&state, now, 0).is_empty());
        assert!(next_blocks_at(&state, MINUTES_PER_WEEK, 5).is_empty());
    }

    #[test]
    fn next_blocks_keeps_in_progress_midnight_block() {
        let state = with_blocks(vec![block(Day::Sunday, "23:00", "01:00")]);
        let now = MINUTES_PER_WEEK - 10;
        assert_eq!(next_blocks_at(&state, now, 1).len(), 1);
    }

    #[test]
    fn unplanned_by_day_filters_and_orders() {
        let mut state = ScheduleState::default();
        let mut a = Activity::new("third", ActivityType::Study);
        a.day_index = Some(2);
        a.order = Some(3);
        let mut b = Activity::new("first", ActivityType::Study);
        b.day_index = Some(2);
        let mut c = Activity::new("second", ActivityType::Study);
        c.day_index = Some(2);
        c.order = Some(1);
        let mut linked = Activity::new("linked", ActivityType::Study);
        linked.day_index = Some(2);
        linked.time_block_id = Some(Uuid::new_v4());
        let mut other_day = Activity::new("other", ActivityType::Study);
        other_day.day_index = Some(3);
        state.activities = vec![a, b, c, linked, other_day];

        let names: Vec<&str> = unplanned_activities_by_day(&state, 2)
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn unplanned_hours_exclude_linked_activities() {
        let mut planned = unplanned(ActivityType::Study, 3.0);
        planned.time_block_id = Some(Uuid::new_v4());
        let state = ScheduleState {
            activities: vec![
                unplanned(ActivityType::Academic, 2.0),
                planned,
                unplanned(ActivityType::Academic, 1.5),
            ],
            ..ScheduleState::default()
        };
        assert!((unplanned_activity_hours_by_type(&state, ActivityType::Academic) - 3.5).abs() < EPS);
        assert!(unplanned_activity_hours_by_type(&state, ActivityType::Study).abs() < EPS);
    }

    #[test]
    fn unplanned_hours_prefer_minutes() {
        let mut a = unplanned(ActivityType::Personal, 5.0);
        a.estimated_minutes = Some(30);
        let state = ScheduleState {
            activities: vec![a],
            ..ScheduleState::default()
        };
        assert!((unplanned_activity_hours_by_type(&state, ActivityType::Personal) - 0.5).abs() < EPS);
    }

    #[test]
    fn activity_duration_uses_linked_block() {
        let class = block(Day::Monday, "08:00", "11:00");
        let mut linked = Activity::new("lecture", ActivityType::Academic);
        linked.time_block_id = Some(class.id);
        linked.estimated_duration = Some(1.0);
        let mut dangling = Activity::new("seminar", ActivityType::Academic);
        dangling.time_block_id = Some(Uuid::new_v4());
        dangling.duration = Some(2.0);
        let loose = unplanned(ActivityType::Academic, 0.5);

        let state = ScheduleState {
            time_blocks: vec![class],
            activities: vec![linked, dangling, loose],
            ..ScheduleState::default()
        };
        assert!((activity_duration_by_type(&state, ActivityType::Academic) - 5.5).abs() < EPS);
    }

    #[test]
    fn activity_duration_counts_overnight_blocks_in_full() {
        let shift = block(Day::Saturday, "22:00", "01:00");
        let mut linked = Activity::new("night shift", ActivityType::Work);
        linked.time_block_id = Some(shift.id);
        linked.duration = Some(8.0);
        // an estimate wins over the legacy field for loose activities
        let mut loose = Activity::new("invoices", ActivityType::Work);
        loose.estimated_minutes = Some(90);
        loose.duration = Some(4.0);
        let mut legacy = Activity::new("timesheets", ActivityType::Work);
        legacy.duration = Some(0.25);

        let state = ScheduleState {
            time_blocks: vec![shift],
            activities: vec![linked, loose, legacy],
            ..ScheduleState::default()
        };
        assert!((activity_duration_by_type(&state, ActivityType::Work) - (3.0 + 1.5 + 0.25)).abs() < EPS);
    }

    #[test]
    fn oversized_window_does_not_overflow_the_budget() {
        let mut state = with_blocks(vec![block(Day::Monday, "08:00", "10:00")]);
        state.settings.active_window = ActiveWindow {
            start_hour: 0,
            end_hour: 80_000_000,
        };
        assert_eq!(weekly_available_minutes(&state.settings), MINUTES_PER_DAY * 7);
        assert!((total_free_hours(&state) - (24.0 * 7.0 - 2.0)).abs() < EPS);
    }

    #[test]
    fn first_free_hour_skips_taken_slots() {
        let state = with_blocks(vec![
            block(Day::Monday, "06:00", "08:00"),
            block(Day::Monday, "08:00", "09:30"),
        ]);
        assert_eq!(first_free_hour(&state, Day::Monday), Some(10));
        assert_eq!(first_free_hour(&state, Day::Tuesday), Some(6));

        let full = with_blocks(vec![block(Day::Friday, "05:00", "23:30")]);
        assert_eq!(first_free_hour(&full, Day::Friday), None);
    }

    #[test]
    fn find_conflict_checks_same_day_only() {
        let existing = block(Day::Monday, "08:00", "10:00");
        let existing_id = existing.id;
        let state = with_blocks(vec![existing, block(Day::Tuesday, "00:00", "02:00")]);

        let clash = block(Day::Monday, "09:00", "11:00");
        assert_eq!(find_conflict(&state, &clash, None).map(|b| b.id), Some(existing_id));
        assert!(find_conflict(&state, &clash, Some(existing_id)).is_none());

        // crosses into Tuesday, but cross-day conflicts are not checked
        let late = block(Day::Monday, "23:00", "01:00");
        assert!(find_conflict(&state, &late, None).is_none());
    }
}
