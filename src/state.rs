use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::{LastReportEntry, ReportData};

/// Remembers which issues the last generated report covered, so a later bulk
/// status update can act on them without querying the board again.
///
/// Each report overwrites the previous record wholesale. Generating a report
/// while a bulk update of the previous one is still running is not supported.
#[derive(Debug, Default)]
pub struct LastReportStore {
    entries: Mutex<Vec<LastReportEntry>>,
}

impl LastReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LastReportEntry>> {
        // The record is replaced wholesale, so a poisoned lock still holds a
        // complete value.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn replace(&self, entries: Vec<LastReportEntry>) {
        *self.lock() = entries;
    }

    /// Records every row of `data`. Epics are never rows, so none are kept.
    pub fn record(&self, data: &ReportData) {
        let entries = data
            .iter()
            .filter(|issue| !issue.kind.as_ref().is_some_and(|k| k.is_epic()))
            .map(LastReportEntry::from)
            .collect();
        self.replace(entries);
    }

    pub fn snapshot(&self) -> Vec<LastReportEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
