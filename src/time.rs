/*
Time-of-day arithmetic on the recurring week.
Every point maps to a minute offset on a 7 x 1440 ring; no calendar dates involved.
*/

use std::fmt;

use chrono::{Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{ActiveWindow, Day, TimeBlock};

pub const MINUTES_PER_DAY: u32 = 24 * 60;
pub const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

// Parse "HH:MM" into minutes since midnight (0..=1439).
//
// Hours may be one or two digits, minutes exactly two.
// Anything else (signs, spaces, 24:00, 12:60) is rejected.
pub fn to_minutes(hhmm: &str) -> AppResult<u32> {
    let (h, m) = hhmm
        .split_once(':')
        .ok_or_else(|| AppError::invalid_time(hhmm))?;

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(h) || h.len() > 2 || !all_digits(m) || m.len() != 2 {
        return Err(AppError::invalid_time(hhmm));
    }

    let h: u32 = h.parse().map_err(|_| AppError::invalid_time(hhmm))?;
    let m: u32 = m.parse().map_err(|_| AppError::invalid_time(hhmm))?;
    if h >= 24 || m >= 60 {
        return Err(AppError::invalid_time(hhmm));
    }
    Ok(h * 60 + m)
}

// Format minutes as "HH:MM"; hours wrap past midnight.
pub fn minutes_to_hhmm(minutes: u32) -> String {
    let h = (minutes / 60) % 24;
    let m = minutes % 60;
    format!("{h:02}:{m:02}")
}

/// Validated wall-clock time with minute resolution.
///
/// Serialized as the `"HH:MM"` string it was parsed from, so malformed
/// times are rejected when a document or request is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub fn parse(hhmm: &str) -> AppResult<Self> {
        to_minutes(hhmm).map(ClockTime)
    }

    pub fn from_minutes(minutes: u32) -> AppResult<Self> {
        if minutes < MINUTES_PER_DAY {
            Ok(ClockTime(minutes))
        } else {
            Err(AppError::invalid_time(minutes.to_string()))
        }
    }

    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl TryFrom<String> for ClockTime {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ClockTime::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        minutes_to_hhmm(value.0)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&minutes_to_hhmm(self.0))
    }
}

// Half-open [start, end) in minutes from Monday 00:00.
// `end` may exceed MINUTES_PER_WEEK for a Sunday block that crosses midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub start: u32,
    pub end: u32,
}

pub fn week_range(block: &TimeBlock) -> WeekRange {
    let day_offset = block.day.index() * MINUTES_PER_DAY;
    let start = block.start_time.minutes();
    let end = block.end_time.minutes();

    let end_day_offset = if end >= start {
        day_offset
    } else {
        day_offset + MINUTES_PER_DAY
    };

    WeekRange {
        start: day_offset + start,
        end: end_day_offset + end,
    }
}

// Half-open intersection on the weekly ring.
//
// `b` is also compared one week later and earlier, so a Sunday-night block
// that spills into Monday collides with early Monday blocks.
pub fn overlaps(a: &TimeBlock, b: &TimeBlock) -> bool {
    let ra = week_range(a);
    let rb = week_range(b);

    let intersects = |b_start: i64, b_end: i64| {
        i64::from(ra.start) < b_end && i64::from(ra.end) > b_start
    };

    let week = i64::from(MINUTES_PER_WEEK);
    let (b_start, b_end) = (i64::from(rb.start), i64::from(rb.end));

    intersects(b_start, b_end)
        || intersects(b_start + week, b_end + week)
        || intersects(b_start - week, b_end - week)
}

// Unclipped length of a block, midnight-aware.
pub fn full_duration_minutes(block: &TimeBlock) -> u32 {
    let start = block.start_time.minutes();
    let end = block.end_time.minutes();
    if end >= start {
        end - start
    } else {
        (MINUTES_PER_DAY - start) + end
    }
}

// Minutes of a block's time of day that fall inside the daily active window.
//
// A block crossing midnight is split into [start, 1440) and [0, end).
// The weekday is irrelevant: the window is the same every day.
pub fn clipped_duration_minutes(block: &TimeBlock, window: &ActiveWindow) -> u32 {
    let start = block.start_time.minutes();
    let end = block.end_time.minutes();
    let (win_start, win_end) = (window.start_minutes(), window.end_minutes());

    let segments = if end >= start {
        vec![(start, end)]
    } else {
        vec![(start, MINUTES_PER_DAY), (0, end)]
    };

    segments
        .iter()
        .map(|&(seg_start, seg_end)| {
            let s = seg_start.max(win_start);
            let e = seg_end.min(win_end);
            e.saturating_sub(s)
        })
        .sum()
}

// Minute offset of a weekday/time pair on the weekly ring.
pub fn week_minute(day: Day, hour: u32, minute: u32) -> u32 {
    day.index() * MINUTES_PER_DAY + hour * 60 + minute
}

// Current host wall-clock position on the weekly ring (Monday = 0).
pub fn week_minute_now() -> u32 {
    let now = Local::now();
    let day_index = now.weekday().num_days_from_monday();
    let day = Day::from_index(day_index).unwrap_or(Day::Monday);
    week_minute(day, now.hour(), now.minute())
}
