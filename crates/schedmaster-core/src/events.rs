use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::category::Category;
use crate::date::{CalendarDate, ReferenceMonth};
use crate::error::{PlannerError, PlannerResult, validate_text};

pub const MAX_TITLE_CHARS: usize = 50;

/// Store-assigned event identifier. Never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub category: Category,
}

/// Date → ordered events. Insertion order is display order.
///
/// A date whose last event is removed is dropped from the map, so every key
/// present maps to a non-empty list.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    by_date: BTreeMap<CalendarDate, Vec<Event>>,
    last_id: u64,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events_on(&self, date: CalendarDate) -> &[Event] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    #[tracing::instrument(skip(self, title), fields(date = %date, category = %category))]
    pub fn add_event(
        &mut self,
        date: CalendarDate,
        title: &str,
        category: Category,
    ) -> PlannerResult<Event> {
        let title = validate_text("title", title, MAX_TITLE_CHARS)?;
        let event = Event {
            id: self.next_id(),
            title,
            category,
        };

        self.by_date.entry(date).or_default().push(event.clone());
        info!(id = %event.id, "added event");
        Ok(event)
    }

    #[tracing::instrument(skip(self, title), fields(date = %date, id = %id, category = %category))]
    pub fn update_event(
        &mut self,
        date: CalendarDate,
        id: EventId,
        title: &str,
        category: Category,
    ) -> PlannerResult<Event> {
        let title = validate_text("title", title, MAX_TITLE_CHARS)?;
        let slot = self
            .by_date
            .get_mut(&date)
            .and_then(|events| events.iter_mut().find(|event| event.id == id))
            .ok_or_else(|| not_found(date, id))?;

        slot.title = title;
        slot.category = category;
        info!("updated event");
        Ok(slot.clone())
    }

    #[tracing::instrument(skip(self), fields(date = %date, id = %id))]
    pub fn remove_event(&mut self, date: CalendarDate, id: EventId) -> PlannerResult<()> {
        let events = self
            .by_date
            .get_mut(&date)
            .ok_or_else(|| not_found(date, id))?;
        let idx = events
            .iter()
            .position(|event| event.id == id)
            .ok_or_else(|| not_found(date, id))?;

        events.remove(idx);
        if events.is_empty() {
            self.by_date.remove(&date);
            debug!("date has no events left; dropped key");
        }
        info!("removed event");
        Ok(())
    }

    /// Locates an event by id alone.
    pub fn find(&self, id: EventId) -> Option<(CalendarDate, &Event)> {
        self.by_date.iter().find_map(|(date, events)| {
            events
                .iter()
                .find(|event| event.id == id)
                .map(|event| (*date, event))
        })
    }

    /// Dates that carry at least one event, ascending.
    pub fn dates(&self) -> impl Iterator<Item = CalendarDate> + '_ {
        self.by_date.keys().copied()
    }

    /// Every (date, event) pair inside `month`, in date then insertion order.
    pub fn events_in(&self, month: ReferenceMonth) -> Vec<(CalendarDate, &Event)> {
        self.by_date
            .range(month.first_day()..=month.last_day())
            .flat_map(|(date, events)| events.iter().map(move |event| (*date, event)))
            .collect()
    }

    /// Total number of events.
    pub fn len(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    fn next_id(&mut self) -> EventId {
        self.last_id += 1;
        EventId(self.last_id)
    }
}

fn not_found(date: CalendarDate, id: EventId) -> PlannerError {
    PlannerError::NotFound(format!("event {id} on {date}"))
}
