//! Year / month / platform narrowing of report collections.

use std::collections::BTreeSet;

use crate::models::Record;
use crate::months::{year_segment, MonthKey};

/// One filter dimension: everything, or a single value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

impl Selector {
    /// `"all"` (or an empty string) means no constraint.
    pub fn parse(value: &str) -> Self {
        let v = value.trim();
        if v.is_empty() || v.eq_ignore_ascii_case("all") {
            Selector::All
        } else {
            Selector::Only(v.to_string())
        }
    }

    pub fn from_option(value: Option<&str>) -> Self {
        value.map(Selector::parse).unwrap_or_default()
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selector::All)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Selector::All => None,
            Selector::Only(v) => Some(v),
        }
    }

    /// Filter value as it appears in export file names.
    pub fn label(&self) -> &str {
        self.value().unwrap_or("all")
    }
}

/// Anything carrying a `YYYY-MM` month key that the filter can inspect.
pub trait Filterable {
    fn month_key(&self) -> Option<&str>;

    fn platform_key(&self) -> Option<&str> {
        None
    }
}

impl<T: Record> Filterable for T {
    fn month_key(&self) -> Option<&str> {
        let month = self.meta().month.as_str();
        if month.is_empty() {
            None
        } else {
            Some(month)
        }
    }

    fn platform_key(&self) -> Option<&str> {
        self.platform_name()
    }
}

/// The active selection on a report view.
///
/// The year and month selectors are private so that changing the year always
/// clears a month that may no longer belong to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    year: Selector,
    month: Selector,
    platform: Selector,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from command-line style options.
    ///
    /// A month given without a year implies its own year.
    pub fn from_options(year: Option<&str>, month: Option<&str>, platform: Option<&str>) -> Self {
        let mut filter = Filter::new();
        let implied_year = month.and_then(year_segment);
        filter.set_year(Selector::from_option(year.or(implied_year)));
        filter.set_month(Selector::from_option(month));
        filter.set_platform(Selector::from_option(platform));
        filter
    }

    pub fn year(&self) -> &Selector {
        &self.year
    }

    pub fn month(&self) -> &Selector {
        &self.month
    }

    pub fn platform(&self) -> &Selector {
        &self.platform
    }

    /// Select a year. Always resets the month to `All`.
    pub fn set_year(&mut self, year: Selector) {
        self.year = year;
        self.month = Selector::All;
    }

    pub fn set_month(&mut self, month: Selector) {
        self.month = month;
    }

    pub fn set_platform(&mut self, platform: Selector) {
        self.platform = platform;
    }

    pub fn matches_parts(&self, month: Option<&str>, platform: Option<&str>) -> bool {
        let Some(month) = month else {
            return false;
        };
        if let Selector::Only(y) = &self.year {
            if year_segment(month) != Some(y.as_str()) {
                return false;
            }
        }
        if let Selector::Only(m) = &self.month {
            if month != m {
                return false;
            }
        }
        if let Selector::Only(p) = &self.platform {
            match platform {
                Some(actual) if actual.eq_ignore_ascii_case(p) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn matches<T: Filterable + ?Sized>(&self, record: &T) -> bool {
        self.matches_parts(record.month_key(), record.platform_key())
    }

    /// Records matching every active selector, in their original order.
    pub fn apply<T: Filterable + Clone>(&self, records: &[T]) -> Vec<T> {
        records.iter().filter(|r| self.matches(*r)).cloned().collect()
    }

    /// Human-readable description of the selection.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(y) = self.year.value() {
            parts.push(y.to_string());
        }
        if let Some(m) = self.month.value() {
            parts.push(crate::months::format_month_name(m));
        }
        if let Some(p) = self.platform.value() {
            parts.push(p.to_string());
        }
        if parts.is_empty() {
            "Tüm dönemler".to_string()
        } else {
            parts.join(" / ")
        }
    }
}

/// Distinct years present in the month keys, most recent first.
pub fn available_years<T: Filterable>(records: &[T]) -> Vec<String> {
    let years: BTreeSet<i32> = records
        .iter()
        .filter_map(|r| r.month_key())
        .filter_map(|m| year_segment(m)?.parse().ok())
        .collect();
    years.into_iter().rev().map(|y| format!("{y:04}")).collect()
}

/// Distinct months present (optionally within one year), in calendar order.
pub fn available_months<T: Filterable>(records: &[T], year: &Selector) -> Vec<MonthKey> {
    let months: BTreeSet<MonthKey> = records
        .iter()
        .filter_map(|r| r.month_key())
        .filter(|m| match year {
            Selector::All => true,
            Selector::Only(y) => year_segment(m) == Some(y.as_str()),
        })
        .filter_map(MonthKey::parse)
        .collect();
    months.into_iter().collect()
}
