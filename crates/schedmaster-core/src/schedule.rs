use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::date::CalendarDate;
use crate::error::{PlannerError, PlannerResult, validate_text};

pub const SLOT_COUNT: u32 = 14;
pub const MIN_START_HOUR: u32 = 6;
pub const MAX_START_HOUR: u32 = 22;
pub const MINUTE_STEP: u32 = 5;
pub const MAX_SUBJECT_CHARS: usize = 20;
pub const MAX_MEMO_CHARS: usize = 50;

/// Column labels, Monday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];

const MONDAY_FIRST: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Accepts a column label (`월` .. `일`) or an English day name (`mon`,
/// `Monday`).
pub fn parse_weekday(raw: &str) -> PlannerResult<Weekday> {
    let token = raw.trim();
    if let Some(idx) = WEEKDAY_LABELS.iter().position(|label| *label == token) {
        return Ok(MONDAY_FIRST[idx]);
    }
    token
        .parse::<Weekday>()
        .map_err(|_| PlannerError::Validation(format!("unknown weekday: {token:?}")))
}

/// Timetable column index for `date`: Monday is 0, Sunday is 6.
pub fn today_index(date: CalendarDate) -> usize {
    (usize::from(date.day_of_week()) + 6) % 7
}

/// Wall-clock time at 5-minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotTime {
    pub hour: u32,
    pub minute: u32,
}

impl SlotTime {
    pub fn new(hour: u32, minute: u32) -> PlannerResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(PlannerError::Validation(format!(
                "invalid time {hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    fn total_minutes(self) -> u32 {
        self.hour * 60 + self.minute
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for SlotTime {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlannerError::Validation(format!("expected HH:MM, got {s:?}"));
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = h.parse().map_err(|_| invalid())?;
        let minute = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

/// (weekday, start time) cell of the timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub weekday: usize,
    pub time: SlotTime,
}

impl SlotKey {
    pub fn new(weekday: Weekday, time: SlotTime) -> Self {
        Self {
            weekday: weekday.num_days_from_monday() as usize,
            time,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = WEEKDAY_LABELS.get(self.weekday).copied().unwrap_or("?");
        write!(f, "{label}-{}", self.time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub subject: String,
    pub memo: String,
}

/// Weekly timetable: 14 hourly rows from an adjustable start time.
#[derive(Debug, Clone)]
pub struct WeeklySchedule {
    start: SlotTime,
    entries: BTreeMap<SlotKey, SlotEntry>,
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self {
            start: SlotTime { hour: 9, minute: 0 },
            entries: BTreeMap::new(),
        }
    }
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> SlotTime {
        self.start
    }

    /// Sets the start time directly; the hour must lie in 6..=22 and the
    /// minute on a 5-minute step.
    pub fn set_start(&mut self, start: SlotTime) -> PlannerResult<()> {
        if !(MIN_START_HOUR..=MAX_START_HOUR).contains(&start.hour)
            || start.minute % MINUTE_STEP != 0
        {
            return Err(PlannerError::Validation(format!(
                "start time {start} must be between {MIN_START_HOUR:02}:00 and \
                 {MAX_START_HOUR:02}:55 on a {MINUTE_STEP}-minute step"
            )));
        }
        self.start = start;
        Ok(())
    }

    /// Moves the start hour by `direction`; ignored past the 6..=22 bounds.
    pub fn adjust_hour(&mut self, direction: i32) -> SlotTime {
        let hour = self.start.hour as i32 + direction;
        if (MIN_START_HOUR as i32..=MAX_START_HOUR as i32).contains(&hour) {
            self.start.hour = hour as u32;
        }
        self.start
    }

    /// Moves the start minute by one 5-minute step in `direction`, wrapping
    /// into the neighbouring hour. Ignored when that hour leaves 6..=22.
    pub fn adjust_minute(&mut self, direction: i32) -> SlotTime {
        let mut minute = self.start.minute as i32 + direction * MINUTE_STEP as i32;
        let mut hour = self.start.hour as i32;

        if minute >= 60 {
            minute = 0;
            hour += 1;
        } else if minute < 0 {
            minute = 60 - MINUTE_STEP as i32;
            hour -= 1;
        }

        if (MIN_START_HOUR as i32..=MAX_START_HOUR as i32).contains(&hour) {
            self.start = SlotTime {
                hour: hour as u32,
                minute: minute as u32,
            };
        }
        self.start
    }

    /// Row start times, one per hour from the start time. Hours past 23 are
    /// kept as-is (`25:00`) so late start times still produce 14 rows.
    pub fn time_slots(&self) -> Vec<SlotTime> {
        let base = self.start.total_minutes();
        (0..SLOT_COUNT)
            .map(|i| {
                let total = base + i * 60;
                SlotTime {
                    hour: total / 60,
                    minute: total % 60,
                }
            })
            .collect()
    }

    pub fn entry(&self, key: SlotKey) -> Option<&SlotEntry> {
        self.entries.get(&key)
    }

    #[tracing::instrument(skip(self, subject, memo), fields(slot = %key))]
    pub fn save(&mut self, key: SlotKey, subject: &str, memo: &str) -> PlannerResult<SlotEntry> {
        let subject = validate_text("subject", subject, MAX_SUBJECT_CHARS)?;
        let memo = memo.trim().to_string();
        if memo.chars().count() > MAX_MEMO_CHARS {
            return Err(PlannerError::Validation(format!(
                "memo is longer than {MAX_MEMO_CHARS} characters"
            )));
        }

        let entry = SlotEntry { subject, memo };
        let replaced = self.entries.insert(key, entry.clone()).is_some();
        info!(replaced, "saved timetable slot");
        Ok(entry)
    }

    #[tracing::instrument(skip(self), fields(slot = %key))]
    pub fn remove(&mut self, key: SlotKey) -> PlannerResult<SlotEntry> {
        let entry = self
            .entries
            .remove(&key)
            .ok_or_else(|| PlannerError::NotFound(format!("timetable slot {key}")))?;
        debug!(subject = %entry.subject, "removed timetable slot");
        Ok(entry)
    }

    pub fn entries(&self) -> impl Iterator<Item = (SlotKey, &SlotEntry)> + '_ {
        self.entries.iter().map(|(key, entry)| (*key, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(s: &str) -> SlotTime {
        s.parse().expect("valid time")
    }

    #[test]
    fn fourteen_hourly_slots_from_start() {
        let mut schedule = WeeklySchedule::new();
        let labels: Vec<_> = schedule.time_slots().iter().map(ToString::to_string).collect();
        assert_eq!(labels.len(), 14);
        assert_eq!(labels[0], "09:00");
        assert_eq!(labels[13], "22:00");

        schedule.set_start(time("22:55")).expect("start");
        let last = schedule.time_slots()[13];
        assert_eq!(last.to_string(), "35:55");
    }

    #[test]
    fn hour_adjustment_is_clamped() {
        let mut schedule = WeeklySchedule::new();
        schedule.set_start(time("22:00")).expect("start");
        assert_eq!(schedule.adjust_hour(1), time("22:00"));
        schedule.set_start(time("06:30")).expect("start");
        assert_eq!(schedule.adjust_hour(-1), time("06:30"));
        assert_eq!(schedule.adjust_hour(1), time("07:30"));
    }

    #[test]
    fn minute_adjustment_wraps_hours() {
        let mut schedule = WeeklySchedule::new();
        assert_eq!(schedule.adjust_minute(-1), time("08:55"));
        assert_eq!(schedule.adjust_minute(1), time("09:00"));

        schedule.set_start(time("09:55")).expect("start");
        assert_eq!(schedule.adjust_minute(1), time("10:00"));

        schedule.set_start(time("22:55")).expect("start");
        assert_eq!(schedule.adjust_minute(1), time("22:55"));

        schedule.set_start(time("06:00")).expect("start");
        assert_eq!(schedule.adjust_minute(-1), time("06:00"));
    }

    #[test]
    fn rejects_start_outside_bounds() {
        let mut schedule = WeeklySchedule::new();
        assert!(schedule.set_start(time("05:00")).is_err());
        assert!(schedule.set_start(time("09:03")).is_err());
        assert!(schedule.set_start(time("23:00")).is_err());
    }

    #[test]
    fn save_replace_remove() {
        let mut schedule = WeeklySchedule::new();
        let key = SlotKey::new(Weekday::Mon, time("09:00"));

        assert!(schedule.save(key, "  ", "memo").is_err());
        assert!(schedule.save(key, &"x".repeat(21), "").is_err());

        schedule.save(key, " 수학 ", " 교실 변경 ").expect("save");
        assert_eq!(
            schedule.entry(key),
            Some(&SlotEntry {
                subject: "수학".to_string(),
                memo: "교실 변경".to_string()
            })
        );

        schedule.save(key, "영어", "").expect("replace");
        assert_eq!(schedule.len(), 1);

        schedule.remove(key).expect("remove");
        assert!(matches!(schedule.remove(key), Err(PlannerError::NotFound(_))));
        assert_eq!(key.to_string(), "월-09:00");
    }

    #[test]
    fn weekday_accepts_labels_and_names() {
        assert_eq!(parse_weekday("수").expect("label"), Weekday::Wed);
        assert_eq!(parse_weekday("Fri").expect("short name"), Weekday::Fri);
        assert_eq!(parse_weekday("sunday").expect("full name"), Weekday::Sun);
        assert!(parse_weekday("someday").is_err());
    }

    #[test]
    fn sunday_is_last_column() {
        let sunday: CalendarDate = "2025-08-03".parse().expect("date");
        let monday: CalendarDate = "2025-08-04".parse().expect("date");
        assert_eq!(today_index(sunday), 6);
        assert_eq!(today_index(monday), 0);
    }
}
