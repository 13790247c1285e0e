use serde::Serialize;

use crate::date::{CalendarDate, ReferenceMonth};
use crate::events::{Event, EventStore};
use crate::holidays::HolidayTable;
use crate::policy::{CellBackground, CellDecoration, DateTone, decorate};

pub const GRID_WEEKS: usize = 6;
pub const GRID_CELLS: usize = GRID_WEEKS * 7;

/// English header labels, Sunday first.
pub const WEEKDAY_HEADERS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// The 42 dates shown for `month`: six full weeks starting on the Sunday
/// on or before the 1st.
pub fn generate(month: ReferenceMonth) -> [CalendarDate; GRID_CELLS] {
    let first = month.first_day();
    let anchor = first.add_days(-i64::from(first.day_of_week()));
    std::array::from_fn(|offset| anchor.add_days(offset as i64))
}

/// One rendered grid position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarGridCell {
    pub date: CalendarDate,
    pub is_current_month: bool,
    pub is_today: bool,
    pub day_of_week: u8,
    /// Whether the cell accepts new events.
    pub selectable: bool,
    pub holiday_label: Option<&'static str>,
    pub events: Vec<Event>,
    pub tone: DateTone,
    pub background: CellBackground,
}

impl CalendarGridCell {
    fn build(
        date: CalendarDate,
        decoration: CellDecoration,
        holiday_label: Option<&'static str>,
        events: &[Event],
    ) -> Self {
        Self {
            date,
            is_current_month: decoration.is_current_month,
            is_today: decoration.is_today,
            day_of_week: decoration.day_of_week,
            selectable: decoration.is_selectable(),
            holiday_label,
            events: events.to_vec(),
            tone: decoration.date_tone(holiday_label.is_some()),
            background: decoration.background(),
        }
    }
}

/// Assembles the full grid for `month` from the generator, holiday table,
/// render policy and event store.
#[tracing::instrument(skip(store), fields(month = %month, today = %today))]
pub fn month_view(
    month: ReferenceMonth,
    today: CalendarDate,
    store: &EventStore,
) -> Vec<CalendarGridCell> {
    let holidays = HolidayTable::global();
    let cells: Vec<_> = generate(month)
        .into_iter()
        .map(|date| {
            CalendarGridCell::build(
                date,
                decorate(date, month, today),
                holidays.lookup(date),
                store.events_on(date),
            )
        })
        .collect();

    tracing::debug!(
        first = %cells.first().map(|c| c.date.key()).unwrap_or_default(),
        with_events = cells.iter().filter(|c| !c.events.is_empty()).count(),
        "built month view"
    );
    cells
}
