//! Per-cell decoration rules for the month grid.
//!
//! Several flags can apply to one date at once (a holiday that falls on a
//! Sunday, today shown as a trailing day of the previous month). The tone
//! and background resolvers below fix which one wins.

use serde::Serialize;

use crate::date::{CalendarDate, ReferenceMonth};

/// Events drawn inside a cell before the rest collapse into an overflow count.
pub const DEFAULT_VISIBLE_EVENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellDecoration {
    pub is_current_month: bool,
    pub is_today: bool,
    pub day_of_week: u8,
    pub is_weekend_sunday: bool,
    pub is_weekend_saturday: bool,
}

/// Color of the date number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateTone {
    Normal,
    OtherMonth,
    Today,
    Saturday,
    Sunday,
    Holiday,
}

/// Fill of the whole cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellBackground {
    Normal,
    OtherMonth,
    Today,
}

pub fn decorate(date: CalendarDate, month: ReferenceMonth, today: CalendarDate) -> CellDecoration {
    let day_of_week = date.day_of_week();
    CellDecoration {
        is_current_month: month.contains(date),
        is_today: date == today,
        day_of_week,
        is_weekend_sunday: day_of_week == 0,
        is_weekend_saturday: day_of_week == 6,
    }
}

impl CellDecoration {
    /// Holiday beats weekend, weekend beats today, today beats other-month.
    /// Weekend coloring only applies inside the displayed month.
    pub fn date_tone(&self, is_holiday: bool) -> DateTone {
        if is_holiday {
            DateTone::Holiday
        } else if self.is_current_month && self.is_weekend_sunday {
            DateTone::Sunday
        } else if self.is_current_month && self.is_weekend_saturday {
            DateTone::Saturday
        } else if self.is_today {
            DateTone::Today
        } else if !self.is_current_month {
            DateTone::OtherMonth
        } else {
            DateTone::Normal
        }
    }

    pub fn background(&self) -> CellBackground {
        if self.is_today {
            CellBackground::Today
        } else if !self.is_current_month {
            CellBackground::OtherMonth
        } else {
            CellBackground::Normal
        }
    }

    /// Only dates of the displayed month accept new events.
    pub fn is_selectable(&self) -> bool {
        self.is_current_month
    }
}

/// Splits `total` events into the number drawn and the overflow count.
pub fn visible_split(total: usize, limit: usize) -> (usize, usize) {
    let shown = total.min(limit);
    (shown, total - shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> CalendarDate {
        s.parse().expect("valid date")
    }

    fn aug() -> ReferenceMonth {
        ReferenceMonth::new(2025, 8).expect("month")
    }

    #[test]
    fn decorate_is_pure() {
        let today = date("2025-08-20");
        let a = decorate(date("2025-08-17"), aug(), today);
        let b = decorate(date("2025-08-17"), aug(), today);
        assert_eq!(a, b);
        assert!(a.is_weekend_sunday);
        assert!(a.is_current_month);
        assert!(!a.is_today);
    }

    #[test]
    fn holiday_tone_beats_weekend() {
        // 2025-03-01 (삼일절) is a Saturday
        let march = ReferenceMonth::new(2025, 3).expect("month");
        let deco = decorate(date("2025-03-01"), march, date("2025-03-10"));
        assert!(deco.is_weekend_saturday);
        assert_eq!(deco.date_tone(true), DateTone::Holiday);
        assert_eq!(deco.date_tone(false), DateTone::Saturday);
    }

    #[test]
    fn weekend_tone_beats_today_in_current_month() {
        let sunday = date("2025-08-17");
        let deco = decorate(sunday, aug(), sunday);
        assert_eq!(deco.date_tone(false), DateTone::Sunday);
        assert_eq!(deco.background(), CellBackground::Today);
    }

    #[test]
    fn weekend_ignored_outside_displayed_month() {
        // 2025-07-27 is a Sunday shown as leading padding of August
        let deco = decorate(date("2025-07-27"), aug(), date("2025-08-20"));
        assert_eq!(deco.date_tone(false), DateTone::OtherMonth);
        assert_eq!(deco.background(), CellBackground::OtherMonth);
        assert!(!deco.is_selectable());
    }

    #[test]
    fn today_background_beats_other_month() {
        let today = date("2025-07-31");
        let deco = decorate(today, aug(), today);
        assert!(!deco.is_current_month);
        assert_eq!(deco.background(), CellBackground::Today);
        assert_eq!(deco.date_tone(false), DateTone::Today);
    }

    #[test]
    fn overflow_split() {
        assert_eq!(visible_split(2, DEFAULT_VISIBLE_EVENTS), (2, 0));
        assert_eq!(visible_split(5, DEFAULT_VISIBLE_EVENTS), (3, 2));
    }
}
