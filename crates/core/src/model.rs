use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::Serialize;

/// A single checkbox item inside the recognized section of a daily note.
///
/// `index` is an ephemeral position: it is assigned by occurrence order at
/// parse time and renumbered contiguously to `0..n-1` after every reparse
/// and after every deletion. It is not a stable identifier across file
/// edits; callers must address todos against a freshly parsed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    pub index: usize,
    pub text: String,
    pub done: bool,
}

impl Todo {
    pub fn new(index: usize, text: impl Into<String>, done: bool) -> Self {
        Self {
            index,
            text: text.into(),
            done,
        }
    }
}

/// All todos for one calendar date. History aggregation only ever produces
/// entries with a non-empty todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTodos {
    pub date: NaiveDate,
    pub todos: Vec<Todo>,
}

/// Addressing for mutations: the mutable "today" view or a specific date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoTarget {
    Today,
    Date(NaiveDate),
}

impl TodoTarget {
    /// The concrete date this target refers to, given today's date.
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            TodoTarget::Today => today,
            TodoTarget::Date(date) => *date,
        }
    }
}

impl fmt::Display for TodoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoTarget::Today => write!(f, "today"),
            TodoTarget::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for TodoTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("today") {
            return Ok(TodoTarget::Today);
        }
        match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(date) => Ok(TodoTarget::Date(date)),
            Err(_) => Err(anyhow!(
                "Unknown target '{}': expected 'today' or a YYYY-MM-DD date",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddOutcome {
    pub date: NaiveDate,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub index: usize,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub index: usize,
    pub deleted: bool,
}
