use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::ClockTime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    // Monday = 0 .. Sunday = 6
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Option<Day> {
        Day::ALL.get(index as usize).copied()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Occupied,
    Free,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Academic,
    Work,
    Study,
    Exercise,
    Rest,
    Social,
    Personal,
}

impl ActivityType {
    pub const ALL: [ActivityType; 7] = [
        ActivityType::Academic,
        ActivityType::Work,
        ActivityType::Study,
        ActivityType::Exercise,
        ActivityType::Rest,
        ActivityType::Social,
        ActivityType::Personal,
    ];

    // Types that count toward the balance score.
    pub fn is_productive(self) -> bool {
        matches!(
            self,
            ActivityType::Academic
                | ActivityType::Work
                | ActivityType::Study
                | ActivityType::Exercise
                | ActivityType::Rest
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    VeryUrgent,
    Urgent,
    Medium,
    #[default]
    Normal,
    Low,
}

/// A recurring, scheduled interval on the weekly grid.
///
/// `end_time` earlier than `start_time` means the block runs past midnight
/// into the following day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: Uuid,
    pub day: Day,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(rename = "type", default)]
    pub block_type: BlockType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<ActivityType>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    // Display colour chosen in the UI; carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<FixedOffset>>,
}

impl TimeBlock {
    pub fn is_occupied(&self) -> bool {
        self.block_type == BlockType::Occupied
    }
}

// Soft hint: hours of the day the activity would ideally happen in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreferredTime {
    pub start_hour: u32,
    pub end_hour: u32,
}

// Older three-level priority, superseded by `Urgency`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LegacyPriority {
    High,
    Medium,
    Low,
}

// Fixed slot recorded by older documents before blocks could be linked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub day: Day,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

/// A discretionary task, optionally tied to a block through `time_block_id`.
///
/// `priority` and `time_slot` are kept so older backups survive a
/// load/save cycle; no selector reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
    // hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    // legacy hours field kept by older documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_block_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<PreferredTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_days: Vec<Day>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<LegacyPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<TimeSlot>,
}

impl Activity {
    pub fn new(name: impl Into<String>, activity_type: ActivityType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            activity_type,
            description: None,
            urgency: Urgency::default(),
            estimated_duration: None,
            estimated_minutes: None,
            duration: None,
            day_index: None,
            order: None,
            completed: false,
            time_block_id: None,
            preferred_time: None,
            preferred_days: Vec::new(),
            priority: None,
            time_slot: None,
        }
    }

    // Planned = tied to a block, or carrying a preferred day/time hint.
    pub fn is_planned(&self) -> bool {
        self.time_block_id.is_some() || !self.preferred_days.is_empty() || self.preferred_time.is_some()
    }

    // Minutes take precedence over hours when both are present.
    pub fn estimated_minutes_total(&self) -> f64 {
        match (self.estimated_minutes, self.estimated_duration) {
            (Some(min), _) => f64::from(min),
            (None, Some(hours)) => hours * 60.0,
            (None, None) => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for ActiveWindow {
    fn default() -> Self {
        Self {
            start_hour: 5,
            end_hour: 21,
        }
    }
}

impl ActiveWindow {
    // Hours past 24 are read as 24, keeping the minutes within one day.
    pub fn start_minutes(&self) -> u32 {
        self.start_hour.min(24) * 60
    }

    pub fn end_minutes(&self) -> u32 {
        self.end_hour.min(24) * 60
    }

    pub fn is_valid(&self) -> bool {
        self.start_hour < self.end_hour && self.end_hour <= 24
    }

    // Minutes per day inside the window; 0 for an empty or inverted window.
    pub fn daily_minutes(&self) -> u32 {
        self.end_minutes().saturating_sub(self.start_minutes())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TypeWeights {
    pub academic: f64,
    pub work: f64,
    pub study: f64,
    pub exercise: f64,
    pub rest: f64,
    pub social: f64,
    pub personal: f64,
}

impl Default for TypeWeights {
    fn default() -> Self {
        Self {
            academic: 1.0,
            work: 0.5,
            study: 0.9,
            exercise: 0.6,
            rest: 0.4,
            social: 0.4,
            personal: 0.3,
        }
    }
}

impl TypeWeights {
    pub fn get(&self, activity_type: ActivityType) -> f64 {
        match activity_type {
            ActivityType::Academic => self.academic,
            ActivityType::Work => self.work,
            ActivityType::Study => self.study,
            ActivityType::Exercise => self.exercise,
            ActivityType::Rest => self.rest,
            ActivityType::Social => self.social,
            ActivityType::Personal => self.personal,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UrgencyWeights {
    pub very_urgent: f64,
    pub urgent: f64,
    pub medium: f64,
    pub normal: f64,
    pub low: f64,
}

impl Default for UrgencyWeights {
    fn default() -> Self {
        Self {
            very_urgent: 1.0,
            urgent: 0.8,
            medium: 0.6,
            normal: 0.4,
            low: 0.2,
        }
    }
}

impl UrgencyWeights {
    pub fn get(&self, urgency: Urgency) -> f64 {
        match urgency {
            Urgency::VeryUrgent => self.very_urgent,
            Urgency::Urgent => self.urgent,
            Urgency::Medium => self.medium,
            Urgency::Normal => self.normal,
            Urgency::Low => self.low,
        }
    }
}

// Blend of adherence and completion; meant to sum to 1, not enforced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductivityWeights {
    pub adherence_weight: f64,
    pub completion_weight: f64,
}

impl Default for ProductivityWeights {
    fn default() -> Self {
        Self {
            adherence_weight: 0.7,
            completion_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StudyTechniques {
    pub pomodoro: bool,
    pub feynman: bool,
    pub spaced: bool,
    pub concept_mapping: bool,
}

impl Default for StudyTechniques {
    fn default() -> Self {
        Self {
            pomodoro: true,
            feynman: false,
            spaced: false,
            concept_mapping: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub active_window: ActiveWindow,
    pub type_weights: TypeWeights,
    pub urgency_weights: UrgencyWeights,
    pub productivity_weights: ProductivityWeights,
    pub study_techniques: StudyTechniques,
    pub minimum_sleep_hours: u32,
    // minutes
    pub break_duration: u32,
    // minutes
    pub maximum_study_session: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_window: ActiveWindow::default(),
            type_weights: TypeWeights::default(),
            urgency_weights: UrgencyWeights::default(),
            productivity_weights: ProductivityWeights::default(),
            study_techniques: StudyTechniques::default(),
            minimum_sleep_hours: 7,
            break_duration: 15,
            maximum_study_session: 120,
        }
    }
}

/// Partial settings update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub active_window: Option<ActiveWindow>,
    pub type_weights: Option<TypeWeights>,
    pub urgency_weights: Option<UrgencyWeights>,
    pub productivity_weights: Option<ProductivityWeights>,
    pub study_techniques: Option<StudyTechniques>,
    pub minimum_sleep_hours: Option<u32>,
    pub break_duration: Option<u32>,
    pub maximum_study_session: Option<u32>,
}

/// The whole persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleState {
    pub time_blocks: Vec<TimeBlock>,
    pub activities: Vec<Activity>,
    pub settings: Settings,
}

// Backup/restore payload: present keys replace the current ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    pub time_blocks: Option<Vec<TimeBlock>>,
    pub activities: Option<Vec<Activity>>,
    pub settings: Option<Settings>,
}
