//! Day marking for a month-grid calendar.
//!
//! An event covers every date from its start to its end inclusive. The first
//! and last day are reported separately from the days in between so a
//! calendar can draw period caps.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::types::CalendarEvent;

/// Position of a date inside an event's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayRole {
    /// The event starts and ends on this date.
    Single,
    Start,
    Interior,
    End,
}

impl DayRole {
    pub fn is_boundary(&self) -> bool {
        !matches!(self, DayRole::Interior)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayMark {
    pub event_id: i64,
    pub role: DayRole,
}

/// Every date `event` covers, in order, with its role.
///
/// An event that ends before it starts covers nothing.
pub fn covered_days(event: &CalendarEvent) -> Vec<(NaiveDate, DayRole)> {
    if event.end_date < event.start_date {
        warn!(event_id = event.id, start = %event.start_date, end = %event.end_date, "event range is inverted");
        return Vec::new();
    }
    if event.is_single_day() {
        return vec![(event.start_date, DayRole::Single)];
    }

    event
        .start_date
        .iter_days()
        .take_while(|day| *day <= event.end_date)
        .map(|day| {
            let role = if day == event.start_date {
                DayRole::Start
            } else if day == event.end_date {
                DayRole::End
            } else {
                DayRole::Interior
            };
            (day, role)
        })
        .collect()
}

/// Marks for every date covered by any of `events`, keyed by date. Marks on
/// one date keep the order of `events`.
pub fn mark_calendar(events: &[CalendarEvent]) -> BTreeMap<NaiveDate, Vec<DayMark>> {
    let mut marks: BTreeMap<NaiveDate, Vec<DayMark>> = BTreeMap::new();
    for event in events {
        for (day, role) in covered_days(event) {
            marks.entry(day).or_default().push(DayMark {
                event_id: event.id,
                role,
            });
        }
    }
    marks
}

/// Events that cover `date`.
pub fn events_on(events: &[CalendarEvent], date: NaiveDate) -> Vec<&CalendarEvent> {
    events.iter().filter(|event| event.covers(date)).collect()
}
