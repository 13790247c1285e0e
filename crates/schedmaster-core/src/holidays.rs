use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::date::CalendarDate;

/// Korean public holidays for 2025, including the extra days around 설날 and
/// 추석.
const KOREAN_HOLIDAYS_2025: &[(u32, u32, &str)] = &[
    (1, 1, "신정"),
    (1, 28, "설날연휴"),
    (1, 29, "설날"),
    (1, 30, "설날연휴"),
    (3, 1, "삼일절"),
    (5, 5, "어린이날"),
    (5, 13, "부처님오신날"),
    (6, 6, "현충일"),
    (8, 15, "광복절"),
    (9, 6, "추석연휴"),
    (9, 7, "추석"),
    (9, 8, "추석연휴"),
    (10, 3, "개천절"),
    (10, 9, "한글날"),
    (12, 25, "성탄절"),
];

const HOLIDAY_YEAR: i32 = 2025;

/// Read-only date → holiday label table, built once per process.
#[derive(Debug)]
pub struct HolidayTable {
    entries: BTreeMap<CalendarDate, &'static str>,
}

impl HolidayTable {
    pub fn global() -> &'static HolidayTable {
        static TABLE: OnceLock<HolidayTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            let entries: BTreeMap<_, _> = KOREAN_HOLIDAYS_2025
                .iter()
                .filter_map(|&(month, day, label)| {
                    CalendarDate::new(HOLIDAY_YEAR, month, day)
                        .ok()
                        .map(|date| (date, label))
                })
                .collect();
            tracing::debug!(year = HOLIDAY_YEAR, count = entries.len(), "built holiday table");
            HolidayTable { entries }
        })
    }

    pub fn lookup(&self, date: CalendarDate) -> Option<&'static str> {
        self.entries.get(&date).copied()
    }

    pub fn is_holiday(&self, date: CalendarDate) -> bool {
        self.entries.contains_key(&date)
    }

    /// Entries in date order.
    pub fn iter(&self) -> impl Iterator<Item = (CalendarDate, &'static str)> + '_ {
        self.entries.iter().map(|(date, label)| (*date, *label))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Label as it fits in a grid cell: anything longer than 3 characters is cut
/// to its first 2.
pub fn short_label(label: &str) -> String {
    if label.chars().count() > 3 {
        label.chars().take(2).collect()
    } else {
        label.to_string()
    }
}
