use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::visibility::VisibilityState;

/// Query parameter that carries a one-shot toggle request.
pub const TOGGLE_PARAM: &str = "toggle";

/// A single user interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Switch the active category (by key).
    SelectCategory(String),
    SetStartDate(NaiveDate),
    SetEndDate(NaiveDate),
    SetDateRange { start: NaiveDate, end: NaiveDate },
    /// Flip chart visibility for one instrument (by display name).
    Toggle(String),
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::SelectCategory(key) => write!(f, "SelectCategory({key})"),
            SessionEvent::SetStartDate(d) => write!(f, "SetStartDate({d})"),
            SessionEvent::SetEndDate(d) => write!(f, "SetEndDate({d})"),
            SessionEvent::SetDateRange { start, end } => write!(f, "SetDateRange({start}..={end})"),
            SessionEvent::Toggle(name) => write!(f, "Toggle({name})"),
        }
    }
}

impl SessionEvent {
    /// Whether this event can change the fetch key `(category, start_date)`.
    ///
    /// End-date changes only re-slice the fetched table (which always runs
    /// through today) and toggles only affect the chart.
    pub fn requires_fetch(&self) -> bool {
        match self {
            SessionEvent::SelectCategory(_)
            | SessionEvent::SetStartDate(_)
            | SessionEvent::SetDateRange { .. } => true,
            SessionEvent::SetEndDate(_) | SessionEvent::Toggle(_) => false,
        }
    }
}

/// Everything the user has chosen in the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub visibility: VisibilityState,
}

impl ViewState {
    pub fn new(
        category: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        visibility: VisibilityState,
    ) -> Self {
        Self {
            category: category.into(),
            start_date,
            end_date,
            visibility,
        }
    }

    /// Session defaults: year-to-date, i.e. January 1 of `today`'s year through `today`.
    pub fn initial(category: impl Into<String>, today: NaiveDate, visibility: VisibilityState) -> Self {
        let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        Self::new(category, start, today, visibility)
    }

    /// Pure transition: the state after `event`. Nothing is fetched or rendered here.
    #[must_use]
    pub fn apply(mut self, event: SessionEvent) -> Self {
        match event {
            SessionEvent::SelectCategory(key) => self.category = key,
            SessionEvent::SetStartDate(d) => self.start_date = d,
            SessionEvent::SetEndDate(d) => self.end_date = d,
            SessionEvent::SetDateRange { start, end } => {
                self.start_date = start;
                self.end_date = end;
            }
            SessionEvent::Toggle(name) => {
                self.visibility.toggle(&name);
            }
        }
        self
    }

    /// Consume the `toggle` query parameter, if present, and apply it once.
    ///
    /// The key is removed from `params` whether or not it held a usable name,
    /// so a refresh that resubmits the same parameters cannot toggle again.
    /// Returns the toggled name.
    pub fn take_toggle_param(&mut self, params: &mut HashMap<String, String>) -> Option<String> {
        let raw = params.remove(TOGGLE_PARAM)?;
        let name = raw.trim();
        if name.is_empty() {
            return None;
        }
        self.visibility.toggle(name);
        Some(name.to_string())
    }
}
