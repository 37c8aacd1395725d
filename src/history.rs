//! School history options for year and term pickers.
//!
//! The admin service stores a school's history as a JSON string: an array of
//! per-year arrays of `{term, year}` objects, where entries may be `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// English ordinal suffix for `n`: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st.
pub fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// One picker entry, e.g. `{ text: "2nd Term", value: 2 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub text: String,
    pub value: u32,
}

impl SelectOption {
    fn ordinal(value: u32, noun: &str) -> Self {
        Self {
            text: format!("{}{} {}", value, ordinal_suffix(value), noun),
            value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TermEntry {
    term: u32,
    year: u32,
}

/// Terms recorded per year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolHistory {
    years: BTreeMap<u32, Vec<u32>>,
}

impl SchoolHistory {
    /// `None` or an empty string yields an empty history.
    pub fn parse(raw: Option<&str>) -> Result<Self, serde_json::Error> {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Self::default()),
        };

        let parsed: Vec<Vec<Option<TermEntry>>> = serde_json::from_str(raw)?;
        let mut years: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for entry in parsed.into_iter().flatten().flatten() {
            let terms = years.entry(entry.year).or_default();
            if !terms.contains(&entry.term) {
                terms.push(entry.term);
            }
        }
        Ok(Self { years })
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Years in ascending order.
    pub fn years(&self) -> Vec<SelectOption> {
        self.years
            .keys()
            .map(|&year| SelectOption::ordinal(year, "Year"))
            .collect()
    }

    /// Terms of `year` in the order first recorded; empty for unknown years.
    pub fn terms(&self, year: u32) -> Vec<SelectOption> {
        self.years
            .get(&year)
            .map(|terms| {
                terms
                    .iter()
                    .map(|&term| SelectOption::ordinal(term, "Term"))
                    .collect()
            })
            .unwrap_or_default()
    }
}
