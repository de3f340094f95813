use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use tracing::warn;

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::model::DayTodos;
use crate::parser;

/// History aggregation covers the trailing window of this many days,
/// ending today inclusive.
pub const HISTORY_WINDOW_DAYS: u64 = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// File-backed storage for daily notes: one `YYYY-MM-DD.md` per calendar
/// date under the vault root.
#[derive(Debug, Clone)]
pub struct DailyNoteStore {
    vault_root: PathBuf,
    template_path: Option<PathBuf>,
    section_header: String,
}

impl DailyNoteStore {
    /// Build a store from the configuration. Fails with
    /// [`StoreError::ConfigurationMissing`] when no vault root is set.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let vault_root = config
            .vault_root()
            .ok_or(StoreError::ConfigurationMissing)?
            .to_path_buf();
        Ok(Self {
            vault_root,
            template_path: config.template_path().map(|p| p.to_path_buf()),
            section_header: config.section_header().to_string(),
        })
    }

    pub fn section_header(&self) -> &str {
        &self.section_header
    }

    pub fn note_path(&self, date: NaiveDate) -> PathBuf {
        self.vault_root
            .join(format!("{}.md", date.format(DATE_FORMAT)))
    }

    /// Read the note for `date`, or `Ok(None)` when no file exists.
    pub fn read(&self, date: NaiveDate) -> Result<Option<String>, StoreError> {
        let path = self.note_path(date);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(path, err)),
        }
    }

    /// Replace the note for `date` atomically: the text lands under a
    /// temporary sibling name and is renamed over the target, so a reader
    /// never observes a partial file.
    pub fn write(&self, date: NaiveDate, text: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.vault_root)
            .map_err(|err| StoreError::io(&self.vault_root, err))?;

        let path = self.note_path(date);
        let staging = path.with_extension("md.tmp");
        fs::write(&staging, text).map_err(|err| StoreError::io(&staging, err))?;
        fs::rename(&staging, &path).map_err(|err| StoreError::io(path, err))
    }

    /// Initial content for a date whose note does not exist yet.
    ///
    /// The configured template (if any) has every literal `{{date}}` and
    /// `{{today}}` replaced with the date string; when that leaves nothing
    /// but whitespace, a minimal note is synthesized instead.
    pub fn initial_content(&self, date: NaiveDate) -> String {
        let date_str = date.format(DATE_FORMAT).to_string();
        let content = self
            .template_text()
            .replace("{{date}}", &date_str)
            .replace("{{today}}", &date_str);

        if content.trim().is_empty() {
            format!("{}\n\n{}\n\n", date_str, self.section_header)
        } else {
            content
        }
    }

    fn template_text(&self) -> String {
        let Some(path) = &self.template_path else {
            return String::new();
        };
        match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "template unreadable, using minimal note");
                String::new()
            }
        }
    }

    /// Read the note for `date`, creating it from [`Self::initial_content`]
    /// when absent, and return its text.
    pub fn ensure_note(&self, date: NaiveDate) -> Result<String, StoreError> {
        if let Some(text) = self.read(date)? {
            return Ok(text);
        }
        let text = self.initial_content(date);
        self.write(date, &text)?;
        Ok(text)
    }

    /// Aggregate the trailing [`HISTORY_WINDOW_DAYS`]-day window ending at
    /// `today` inclusive, newest first. Dates without a note and dates whose
    /// section holds no todos are omitted entirely; an unreadable note is
    /// logged and skipped.
    pub fn collect_recent(&self, today: NaiveDate) -> Vec<DayTodos> {
        let mut days = Vec::new();
        for offset in 0..HISTORY_WINDOW_DAYS {
            let Some(date) = today.checked_sub_days(Days::new(offset)) else {
                break;
            };
            let text = match self.read(date) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(err) => {
                    warn!(%date, error = %err, "skipping unreadable daily note");
                    continue;
                }
            };
            let todos = parser::parse_todos(&text, &self.section_header);
            if todos.is_empty() {
                continue;
            }
            days.push(DayTodos { date, todos });
        }
        days
    }
}
