use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::model::{AddOutcome, DayTodos, DeleteResult, StatusUpdate, Todo, TodoTarget};
use crate::parser;
use crate::store::DailyNoteStore;

/// Orchestrates the todo list for "today" and for historical dates against
/// the notes on disk.
///
/// All mutations for a document are serialized through one session
/// instance; callers must not start a second mutating call before the
/// previous persistence step completes. After a successful write the
/// in-memory list is trusted as committed; after a failed one the session
/// resynchronizes from disk so memory and disk never disagree.
pub struct TodoSession {
    config: AppConfig,
    today: Vec<Todo>,
    loaded_date: Option<NaiveDate>,
}

impl TodoSession {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            today: Vec::new(),
            loaded_date: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The date captured at the last successful today-load, used by the
    /// rollover ticker to detect calendar advance.
    pub fn loaded_date(&self) -> Option<NaiveDate> {
        self.loaded_date
    }

    /// Load today's note (creating it from the template when absent) and
    /// return the parsed todos. Degrades to an empty list on failure.
    pub fn list_today(&mut self) -> Vec<Todo> {
        match self.load_today() {
            Ok(todos) => todos,
            Err(err) => {
                warn!(error = %err, "failed to load today's todos");
                self.today.clear();
                self.loaded_date = None;
                Vec::new()
            }
        }
    }

    /// Reload funnel for the file watcher and the rollover ticker as well
    /// as explicit refreshes; identical to the normal load path.
    pub fn reload(&mut self) -> Vec<Todo> {
        self.list_today()
    }

    /// The trailing 30-day window, newest first, non-empty days only.
    pub fn list_history(&self) -> Vec<DayTodos> {
        match self.store() {
            Ok(store) => store.collect_recent(self.current_date()),
            Err(err) => {
                warn!(error = %err, "failed to aggregate history");
                Vec::new()
            }
        }
    }

    /// Insert a new unchecked todo into today's note. Whitespace-only input
    /// is a no-op; the committed list is re-derived from the written
    /// document because placeholder replacement can shift positions.
    pub fn add_today(&mut self, text: &str) -> Option<AddOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("ignoring empty todo text");
            return None;
        }
        match self.try_add_today(trimmed) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(error = %err, "failed to add todo");
                self.resync(self.current_date());
                None
            }
        }
    }

    pub fn toggle(&mut self, target: TodoTarget, index: usize, done: bool) -> StatusUpdate {
        let changed = self.apply(target, "toggle", move |todos| match todos.get_mut(index) {
            Some(todo) if todo.done != done => {
                todo.done = done;
                true
            }
            Some(_) => false,
            None => {
                debug!(index, "toggle index out of range");
                false
            }
        });
        StatusUpdate { index, changed }
    }

    pub fn edit(&mut self, target: TodoTarget, index: usize, text: &str) -> StatusUpdate {
        let new_text = text.trim().to_string();
        if new_text.is_empty() {
            debug!(index, "refusing to edit todo text to empty");
            return StatusUpdate {
                index,
                changed: false,
            };
        }
        let changed = self.apply(target, "edit", move |todos| match todos.get_mut(index) {
            Some(todo) if todo.text != new_text => {
                todo.text = new_text;
                true
            }
            Some(_) => false,
            None => {
                debug!(index, "edit index out of range");
                false
            }
        });
        StatusUpdate { index, changed }
    }

    /// Remove the todo at `index` and renumber the survivors to `0..n-1`.
    pub fn delete(&mut self, target: TodoTarget, index: usize) -> DeleteResult {
        let deleted = self.apply(target, "delete", move |todos| {
            if index >= todos.len() {
                debug!(index, len = todos.len(), "delete index out of range");
                return false;
            }
            todos.remove(index);
            for (position, todo) in todos.iter_mut().enumerate() {
                todo.index = position;
            }
            true
        });
        DeleteResult { index, deleted }
    }

    /// Persist a new vault root and reload today's list against it.
    pub fn set_vault_root(&mut self, path: PathBuf) -> Result<()> {
        self.config.set_vault_root(path)?;
        self.reload();
        Ok(())
    }

    fn store(&self) -> Result<DailyNoteStore, StoreError> {
        DailyNoteStore::from_config(&self.config)
    }

    fn current_date(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn load_today(&mut self) -> Result<Vec<Todo>, StoreError> {
        let store = self.store()?;
        let date = self.current_date();
        let text = store.ensure_note(date)?;
        self.today = parser::parse_todos(&text, store.section_header());
        self.loaded_date = Some(date);
        Ok(self.today.clone())
    }

    fn try_add_today(&mut self, text: &str) -> Result<AddOutcome, StoreError> {
        let store = self.store()?;
        let date = self.current_date();
        let current = match store.read(date)? {
            Some(existing) => existing,
            None => store.initial_content(date),
        };
        let updated = parser::add_todo(&current, text, store.section_header());
        store.write(date, &updated)?;
        self.today = parser::parse_todos(&updated, store.section_header());
        self.loaded_date = Some(date);
        Ok(AddOutcome {
            date,
            text: text.to_string(),
        })
    }

    fn apply(
        &mut self,
        target: TodoTarget,
        op: &'static str,
        edit: impl FnOnce(&mut Vec<Todo>) -> bool,
    ) -> bool {
        let today = self.current_date();
        let date = target.resolve(today);
        let result = if date == today {
            self.apply_today(date, edit)
        } else {
            self.apply_dated(date, edit)
        };
        match result {
            Ok(changed) => changed,
            Err(err) => {
                warn!(op, %date, error = %err, "mutation aborted");
                if date == today {
                    self.resync(date);
                }
                false
            }
        }
    }

    fn apply_today(
        &mut self,
        date: NaiveDate,
        edit: impl FnOnce(&mut Vec<Todo>) -> bool,
    ) -> Result<bool, StoreError> {
        let store = self.store()?;
        if self.loaded_date != Some(date) {
            let text = store.ensure_note(date)?;
            self.today = parser::parse_todos(&text, store.section_header());
            self.loaded_date = Some(date);
        }

        let mut updated = self.today.clone();
        if !edit(&mut updated) {
            return Ok(false);
        }

        let original = store
            .read(date)?
            .ok_or(StoreError::DocumentNotFound(date))?;
        let new_text = parser::reconstruct_content(&original, &updated, store.section_header());
        store.write(date, &new_text)?;
        self.today = updated;
        Ok(true)
    }

    fn apply_dated(
        &self,
        date: NaiveDate,
        edit: impl FnOnce(&mut Vec<Todo>) -> bool,
    ) -> Result<bool, StoreError> {
        let store = self.store()?;
        let Some(original) = store.read(date)? else {
            debug!(%date, "no daily note for target date");
            return Ok(false);
        };

        let mut todos = parser::parse_todos(&original, store.section_header());
        if !edit(&mut todos) {
            return Ok(false);
        }

        let updated = parser::reconstruct_content(&original, &todos, store.section_header());
        store.write(date, &updated)?;
        Ok(true)
    }

    /// Re-derive the cached list from disk after a failed mutation so
    /// memory never disagrees with the file.
    fn resync(&mut self, date: NaiveDate) {
        let resynced = self.store().and_then(|store| {
            let text = store.read(date)?.unwrap_or_default();
            Ok(parser::parse_todos(&text, store.section_header()))
        });
        match resynced {
            Ok(todos) => {
                self.today = todos;
                self.loaded_date = Some(date);
            }
            Err(err) => {
                warn!(error = %err, "resynchronization failed, clearing cached todos");
                self.today.clear();
                self.loaded_date = None;
            }
        }
    }
}
