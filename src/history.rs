//! Browsing, bulk deletion and bulk export of stored calculations.

use chrono::{Local, NaiveDateTime};

use crate::model::{Calculation, Category, Record};
use crate::report::Render;
use crate::store::{HISTORY_CAP, RecordStore, Storage};

/// Placed between records in an export.
pub const EXPORT_SEPARATOR: &str = "\n====================\n\n";

const CALCULATION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A view over one store's history.
pub struct History<'a, S> {
    store: &'a mut RecordStore<S>,
}

impl<'a, S: Storage> History<'a, S> {
    pub fn new(store: &'a mut RecordStore<S>) -> Self {
        Self { store }
    }

    pub fn list<T: Calculation>(&self, limit: usize) -> Vec<Record<T>> {
        self.store.list(limit)
    }

    /// Remove every selected id, returning how many removals were persisted.
    pub fn remove_selected<I>(&mut self, category: Category, ids: &[I]) -> usize
    where
        I: AsRef<str>,
    {
        ids.iter()
            .map(|id| id.as_ref())
            .filter(|id| self.store.remove(category, id))
            .count()
    }

    /// Export text for the selected records, in stored order.
    ///
    /// Built from the stored figures, nothing is recomputed. Unknown ids are
    /// ignored; an empty string means nothing matched.
    pub fn export_selected<T, I>(&self, ids: &[I]) -> String
    where
        T: Calculation + Render,
        I: AsRef<str>,
    {
        self.store
            .list::<T>(HISTORY_CAP)
            .iter()
            .filter(|record| ids.iter().any(|id| id.as_ref() == record.id))
            .map(|record| format!("[작성일: {}]\n\n{}", export_date(record), record.fields.copy_text()))
            .collect::<Vec<_>>()
            .join(EXPORT_SEPARATOR)
    }
}

/// One listing line: `YYYY.MM.DD HH:MM  <id>`.
pub fn summary_line<T>(record: &Record<T>) -> String {
    format!("{}  {}", local_time(record).format("%Y.%m.%d %H:%M"), record.id)
}

/// `Y. M. D.` without padding, as Korean locales print short dates.
fn export_date<T>(record: &Record<T>) -> String {
    local_time(record).format("%Y. %-m. %-d.").to_string()
}

/// Prefer the recorded wall-clock time; fall back to the creation timestamp.
fn local_time<T>(record: &Record<T>) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&record.calculation_date, CALCULATION_DATE_FORMAT)
        .unwrap_or_else(|_| record.created_at.with_timezone(&Local).naive_local())
}
