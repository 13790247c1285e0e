use anyhow::Context;
use chrono::{NaiveDate, Weekday};

use crate::category::Category;
use crate::date::{CalendarDate, ReferenceMonth};
use crate::events::EventStore;
use crate::grid::{CalendarGridCell, month_view};
use crate::memo::MemoList;
use crate::schedule::{SlotKey, WeeklySchedule};

/// All in-memory state behind the three planner tabs.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    pub events: EventStore,
    pub schedule: WeeklySchedule,
    pub memos: MemoList,
}

const SAMPLE_EVENTS: &[(&str, &str, Category)] = &[
    ("2025-08-05", "프로젝트 미팅", Category::Work),
    ("2025-08-15", "광복절", Category::Holiday),
    ("2025-08-20", "엄마 생신", Category::Family),
];

const SAMPLE_TIMETABLE: &[(Weekday, &str, &str, &str)] = &[
    (Weekday::Mon, "09:00", "수학", "교실 변경"),
    (Weekday::Tue, "10:00", "영어", "원어민 수업"),
    (Weekday::Wed, "11:00", "과학", "실험실"),
    (Weekday::Thu, "14:00", "체육", "운동장"),
    (Weekday::Fri, "13:00", "음악", "음악실"),
];

/// Oldest first; each add goes on top.
const SAMPLE_MEMOS: &[(u32, u32, &str)] = &[
    (11, 45, "영어 숙제 완성하고 제출"),
    (13, 15, "엄마 생신 선물 구매하기"),
    (14, 30, "내일 프로젝트 발표 준비하기"),
];

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A planner holding the demo events, timetable and memos.
    #[tracing::instrument]
    pub fn with_sample_data() -> anyhow::Result<Self> {
        let mut planner = Self::new();

        for &(date, title, category) in SAMPLE_EVENTS {
            let date: CalendarDate = date.parse()?;
            planner
                .events
                .add_event(date, title, category)
                .with_context(|| format!("seeding event {title}"))?;
        }

        for &(weekday, time, subject, memo) in SAMPLE_TIMETABLE {
            let key = SlotKey::new(weekday, time.parse()?);
            planner
                .schedule
                .save(key, subject, memo)
                .with_context(|| format!("seeding slot {key}"))?;
        }

        for &(hour, minute, text) in SAMPLE_MEMOS {
            let created = NaiveDate::from_ymd_opt(2025, 8, 4)
                .and_then(|day| day.and_hms_opt(hour, minute, 0))
                .context("sample memo timestamp")?;
            planner.memos.add(text, created)?;
        }

        tracing::debug!(
            events = planner.events.len(),
            slots = planner.schedule.len(),
            memos = planner.memos.len(),
            "seeded sample planner"
        );
        Ok(planner)
    }

    pub fn month_view(&self, month: ReferenceMonth, today: CalendarDate) -> Vec<CalendarGridCell> {
        month_view(month, today, &self.events)
    }
}
