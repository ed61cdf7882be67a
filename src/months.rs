//! `YYYY-MM` month keys and their Turkish display names.

use std::fmt;
use std::str::FromStr;

use chrono::Datelike;

pub const MONTH_NAMES: [&str; 12] = [
    "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran",
    "Temmuz", "Ağustos", "Eylül", "Ekim", "Kasım", "Aralık",
];

pub const MONTH_NAMES_SHORT: [&str; 12] = [
    "Oca", "Şub", "Mar", "Nis", "May", "Haz",
    "Tem", "Ağu", "Eyl", "Eki", "Kas", "Ara",
];

/// A calendar month as stored in every report's `month` field.
///
/// Ordering is chronological, which for the `YYYY-MM` encoding also matches
/// lexicographic order of [`MonthKey::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Parse a strict `YYYY-MM` code. Anything else is `None`.
    pub fn parse(code: &str) -> Option<Self> {
        let (y, m) = code.split_once('-')?;
        if y.len() != 4 || m.len() != 2 {
            return None;
        }
        if !y.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Self::new(y.parse().ok()?, m.parse().ok()?)
    }

    pub fn current() -> Self {
        let now = chrono::Local::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn code(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Turkish label, e.g. `Ocak 2025`.
    pub fn name(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }

    pub fn short_name(&self) -> String {
        format!("{} {}", MONTH_NAMES_SHORT[(self.month - 1) as usize], self.year)
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid month '{s}', expected YYYY-MM"))
    }
}

/// Month number (1-12) to Turkish name.
pub fn month_name(number: u32) -> Option<&'static str> {
    MONTH_NAMES.get(number.checked_sub(1)? as usize).copied()
}

/// Turkish month name to number (1-12). Case-insensitive.
pub fn month_number(name: &str) -> Option<u32> {
    let wanted = name.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|n| n.to_lowercase() == wanted)
        .map(|i| i as u32 + 1)
}

/// `2025-01` -> `Ocak 2025`. Malformed codes are returned unchanged.
pub fn format_month_name(code: &str) -> String {
    match MonthKey::parse(code) {
        Some(key) => key.name(),
        None => code.to_string(),
    }
}

/// `Ocak 2025` -> `2025-01`.
pub fn parse_month_name(label: &str) -> Option<String> {
    let mut parts = label.split_whitespace();
    let name = parts.next()?;
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    MonthKey::new(year, month_number(name)?).map(|k| k.code())
}

/// Leading year segment of a month code, if the code has one.
pub fn year_segment(code: &str) -> Option<&str> {
    let (year, _) = code.split_once('-')?;
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        Some(year)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthOption {
    pub code: String,
    pub label: String,
}

/// Every selectable month from January of `start_year` up to `until`, newest first.
pub fn month_options(start_year: i32, until: MonthKey) -> Vec<MonthOption> {
    let mut out = Vec::new();
    let mut key = until;
    while key.year() >= start_year {
        out.push(MonthOption {
            code: key.code(),
            label: key.name(),
        });
        key = key.previous();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_code() {
        let key = MonthKey::parse("2025-03").unwrap();
        assert_eq!(key.year(), 2025);
        assert_eq!(key.month(), 3);
        assert_eq!(key.code(), "2025-03");
        assert_eq!(key.to_string(), "2025-03");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "2025", "2025-13", "2025-00", "25-01", "2025-1", "2025/01", "abcd-01"] {
            assert!(MonthKey::parse(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_month_name_round_trip_all_months() {
        for year in [2024, 2025] {
            for m in 1..=12 {
                let code = format!("{year}-{m:02}");
                let label = format_month_name(&code);
                assert_eq!(parse_month_name(&label).as_deref(), Some(code.as_str()), "{label}");
            }
        }
    }

    #[test]
    fn test_name_number_mapping_is_exhaustive() {
        for n in 1..=12 {
            let name = month_name(n).unwrap();
            assert_eq!(month_number(name), Some(n));
        }
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn test_month_number_ignores_case() {
        assert_eq!(month_number("şubat"), Some(2));
        assert_eq!(month_number(" Aralık "), Some(12));
    }

    #[test]
    fn test_format_month_name_keeps_malformed_input() {
        assert_eq!(format_month_name("2025-08"), "Ağustos 2025");
        assert_eq!(format_month_name("garbage"), "garbage");
    }

    #[test]
    fn test_parse_month_name_rejects_unknown() {
        assert_eq!(parse_month_name("Foo 2025"), None);
        assert_eq!(parse_month_name("Ocak"), None);
        assert_eq!(parse_month_name("Ocak 2025 extra"), None);
    }

    #[test]
    fn test_year_segment() {
        assert_eq!(year_segment("2025-01"), Some("2025"));
        assert_eq!(year_segment("20251-01"), None);
        assert_eq!(year_segment("2025"), None);
    }

    #[test]
    fn test_month_options_newest_first() {
        let until = MonthKey::new(2025, 2).unwrap();
        let opts = month_options(2024, until);
        assert_eq!(opts.len(), 14);
        assert_eq!(opts[0].code, "2025-02");
        assert_eq!(opts[0].label, "Şubat 2025");
        assert_eq!(opts[13].code, "2024-01");
    }
}
