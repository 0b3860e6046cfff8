use super::error::StudyError;
use super::navigator::{Navigator, NavigatorOptions};
use super::record::Record;
use super::split::split_records;

/// All records of one chapter file, in file order.
#[derive(Debug, Clone, Default)]
pub struct Chapter {
    records: Vec<Record>,
}

impl Chapter {
    pub fn parse(text: &str) -> Self {
        let records: Vec<Record> = split_records(text).into_iter().map(Record::parse).collect();
        tracing::debug!("Parsed chapter with {} records", records.len());
        Self { records }
    }

    /// True when the file held no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

/// A chapter being studied: the current record and its navigator.
///
/// The navigator belongs to the current record only. Switching records throws
/// it away and builds a fresh one, so no cursor or played move leaks across.
pub struct Session {
    chapter: Chapter,
    index: usize,
    navigator: Option<Navigator>,
    options: NavigatorOptions,
}

impl Session {
    pub fn new(chapter: Chapter, options: NavigatorOptions) -> Self {
        let navigator = chapter.get(0).map(|record| Navigator::new(record, options));
        Self {
            chapter,
            index: 0,
            navigator,
            options,
        }
    }

    pub fn chapter(&self) -> &Chapter {
        &self.chapter
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn record(&self) -> Option<&Record> {
        self.chapter.get(self.index)
    }

    /// `None` only for an empty chapter.
    pub fn navigator(&self) -> Option<&Navigator> {
        self.navigator.as_ref()
    }

    pub fn navigator_mut(&mut self) -> Option<&mut Navigator> {
        self.navigator.as_mut()
    }

    pub fn open_record(&mut self, index: usize) -> Result<&Navigator, StudyError> {
        let len = self.chapter.len();
        let record = self
            .chapter
            .get(index)
            .ok_or(StudyError::NoSuchRecord { index, len })?;

        if let Some(diagnostics) = record.diagnostics().as_deref() {
            tracing::debug!("Record {index} diagnostics: {diagnostics}");
        }
        self.index = index;
        Ok(self.navigator.insert(Navigator::new(record, self.options)))
    }

    /// Clamped at the last record; returns whether the record changed.
    pub fn next_record(&mut self) -> bool {
        if self.index + 1 >= self.chapter.len() {
            return false;
        }
        self.open_record(self.index + 1).is_ok()
    }

    /// Clamped at the first record; returns whether the record changed.
    pub fn previous_record(&mut self) -> bool {
        if self.index == 0 || self.chapter.is_empty() {
            return false;
        }
        self.open_record(self.index - 1).is_ok()
    }
}
