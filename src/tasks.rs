/*
Daily to-do list, kept apart from the weekly schedule.
Tasks belong to a calendar date and live in their own stored document.
*/

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Document;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<FixedOffset>,
}

impl DailyTask {
    pub fn new(title: impl Into<String>, created_at: DateTime<FixedOffset>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
            created_at,
        }
    }
}

/// Tasks grouped by date, stored as `{"YYYY-MM-DD": [task, ...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DailyTasks {
    by_date: BTreeMap<NaiveDate, Vec<DailyTask>>,
}

impl DailyTasks {
    // Tasks for `date` in insertion order; empty when the date has none.
    pub fn for_date(&self, date: NaiveDate) -> &[DailyTask] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    // Date holding the task with `id`, if any.
    pub fn date_of(&self, id: Uuid) -> Option<NaiveDate> {
        self.by_date
            .iter()
            .find(|(_, tasks)| tasks.iter().any(|t| t.id == id))
            .map(|(date, _)| *date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_date.keys().copied()
    }

    pub fn progress(&self, date: NaiveDate) -> DayProgress {
        let tasks = self.for_date(date);
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let percent = if total == 0 {
            0
        } else {
            (completed as f64 / total as f64 * 100.0).round() as u32
        };
        DayProgress {
            date,
            total,
            completed,
            percent,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub total: usize,
    pub completed: usize,
    // 0..=100, rounded; 0 for a day without tasks
    pub percent: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskAction {
    AddTask { date: NaiveDate, task: DailyTask },
    ToggleTask { date: NaiveDate, id: Uuid },
    RemoveTask { date: NaiveDate, id: Uuid },
}

impl Document for DailyTasks {
    type Action = TaskAction;

    const LABEL: &'static str = "daily_tasks";

    fn apply(&self, action: TaskAction) -> Self {
        match action {
            TaskAction::AddTask { date, task } => add_task(self, date, task),
            TaskAction::ToggleTask { date, id } => toggle_task(self, date, id),
            TaskAction::RemoveTask { date, id } => remove_task(self, date, id),
        }
    }

    fn action_name(action: &TaskAction) -> &'static str {
        match action {
            TaskAction::AddTask { .. } => "add_task",
            TaskAction::ToggleTask { .. } => "toggle_task",
            TaskAction::RemoveTask { .. } => "remove_task",
        }
    }
}

pub fn add_task(tasks: &DailyTasks, date: NaiveDate, task: DailyTask) -> DailyTasks {
    let mut next = tasks.clone();
    next.by_date.entry(date).or_default().push(task);
    next
}

// Unknown ids leave the list unchanged.
pub fn toggle_task(tasks: &DailyTasks, date: NaiveDate, id: Uuid) -> DailyTasks {
    let mut next = tasks.clone();
    if let Some(task) = next
        .by_date
        .get_mut(&date)
        .and_then(|list| list.iter_mut().find(|t| t.id == id))
    {
        task.completed = !task.completed;
    }
    next
}

// A date left without tasks is dropped from the document.
pub fn remove_task(tasks: &DailyTasks, date: NaiveDate, id: Uuid) -> DailyTasks {
    let mut next = tasks.clone();
    if let Some(list) = next.by_date.get_mut(&date) {
        list.retain(|t| t.id != id);
        if list.is_empty() {
            next.by_date.remove(&date);
        }
    }
    next
}
