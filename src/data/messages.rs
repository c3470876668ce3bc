// messages.rs - Error and warning stores with per-code detail caps

use std::collections::{BTreeMap, HashMap};

/// First id handed to custom rules; built-in codes stay below it
pub const CUSTOM_RULE_ID_START: u32 = 1000;

/// Detail entries kept per code before only counting
pub const DEFAULT_MAX_DETAIL_PER_CODE: usize = 150;

/// Built-in message codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum MessageCode {
    LineStartsWithSpace = 1,
    ProteinNameIsTooLong = 2,
    BlankLineBetweenProteinNameAndResidues = 3,
    BlankLineInMiddleOfResidues = 4,
    ResiduesFoundWithoutProteinHeader = 5,
    ProteinEntriesNotFound = 6,
    FinalProteinEntryMissingResidues = 7,
    FileDoesNotEndWithLinefeed = 8,
    DuplicateProteinName = 9,
    ProteinHasNoResidues = 10,
    CorruptLineSkipped = 11,
    DuplicateProteinSequence = 12,
    ProteinNameIsTooShort = 13,
    BlankLineBeforeProteinName = 14,
    ResiduesLineTooLong = 15,
    LineIsVeryLong = 16,
    RenamedProtein = 17,
    DuplicateProteinNameRetained = 18,
    ProteinNameTruncated = 19,
    ProteinNameSplit = 20,
    ProteinRemovedSinceDuplicateSequence = 21,
    ProteinRemovedNotInKeepList = 22,
    ProteinNameInvalidCharactersReplaced = 23,
}

impl MessageCode {
    pub const ALL: [MessageCode; 23] = [
        MessageCode::LineStartsWithSpace,
        MessageCode::ProteinNameIsTooLong,
        MessageCode::BlankLineBetweenProteinNameAndResidues,
        MessageCode::BlankLineInMiddleOfResidues,
        MessageCode::ResiduesFoundWithoutProteinHeader,
        MessageCode::ProteinEntriesNotFound,
        MessageCode::FinalProteinEntryMissingResidues,
        MessageCode::FileDoesNotEndWithLinefeed,
        MessageCode::DuplicateProteinName,
        MessageCode::ProteinHasNoResidues,
        MessageCode::CorruptLineSkipped,
        MessageCode::DuplicateProteinSequence,
        MessageCode::ProteinNameIsTooShort,
        MessageCode::BlankLineBeforeProteinName,
        MessageCode::ResiduesLineTooLong,
        MessageCode::LineIsVeryLong,
        MessageCode::RenamedProtein,
        MessageCode::DuplicateProteinNameRetained,
        MessageCode::ProteinNameTruncated,
        MessageCode::ProteinNameSplit,
        MessageCode::ProteinRemovedSinceDuplicateSequence,
        MessageCode::ProteinRemovedNotInKeepList,
        MessageCode::ProteinNameInvalidCharactersReplaced,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Errors go to the error store, everything else is a warning
    pub fn is_error(self) -> bool {
        self.code() <= MessageCode::CorruptLineSkipped.code()
    }

    /// Structural problems make the whole file unusable
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            MessageCode::ProteinEntriesNotFound
                | MessageCode::FinalProteinEntryMissingResidues
                | MessageCode::CorruptLineSkipped
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            MessageCode::LineStartsWithSpace => "Line starts with a space or tab",
            MessageCode::ProteinNameIsTooLong => "Protein name is longer than the maximum allowed length",
            MessageCode::BlankLineBetweenProteinNameAndResidues => {
                "Blank line found between the protein name and its residues"
            }
            MessageCode::BlankLineInMiddleOfResidues => "Blank line found in the middle of the residues",
            MessageCode::ResiduesFoundWithoutProteinHeader => {
                "Residues found without a preceding protein header line"
            }
            MessageCode::ProteinEntriesNotFound => "No protein entries were found in the file",
            MessageCode::FinalProteinEntryMissingResidues => "The last protein entry has no residues",
            MessageCode::FileDoesNotEndWithLinefeed => "File does not end with a line terminator",
            MessageCode::DuplicateProteinName => "Duplicate protein name found",
            MessageCode::ProteinHasNoResidues => "Protein entry has no residues",
            MessageCode::CorruptLineSkipped => "Line is too long to be valid and was skipped",
            MessageCode::DuplicateProteinSequence => "Duplicate protein sequence found",
            MessageCode::ProteinNameIsTooShort => "Protein name is shorter than the minimum length",
            MessageCode::BlankLineBeforeProteinName => "Blank line found before a protein header line",
            MessageCode::ResiduesLineTooLong => "Residues line is longer than the maximum allowed length",
            MessageCode::LineIsVeryLong => "Line is unusually long",
            MessageCode::RenamedProtein => "Renamed protein because the name was a duplicate",
            MessageCode::DuplicateProteinNameRetained => {
                "Duplicate protein name retained because the sequence may differ"
            }
            MessageCode::ProteinNameTruncated => "Protein name was too long and was shortened",
            MessageCode::ProteinNameSplit => "Protein name held multiple references and was split",
            MessageCode::ProteinRemovedSinceDuplicateSequence => {
                "Protein removed because its sequence duplicates another protein"
            }
            MessageCode::ProteinRemovedNotInKeepList => "Protein removed because it is not in the keep list",
            MessageCode::ProteinNameInvalidCharactersReplaced => {
                "Invalid characters in the protein name were replaced"
            }
        }
    }
}

/// One recorded error or warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    pub line_number: usize,
    pub column_number: usize,
    pub protein_name: String,
    pub code: u32,
    pub extra_info: String,
    pub context: String,
}

/// Aggregate counters for one code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeCount {
    pub recorded_in_detail: usize,
    pub overflow: usize,
}

impl CodeCount {
    pub fn total(&self) -> usize {
        self.recorded_in_detail + self.overflow
    }
}

/// Store of messages of one kind (errors or warnings)
///
/// Only the first `max_detail_per_code` occurrences of each code are kept
/// in detail; later ones are counted as overflow.
#[derive(Debug)]
pub struct MessageStore {
    entries: Vec<MessageEntry>,
    counts: BTreeMap<u32, CodeCount>,
    custom_descriptions: HashMap<u32, String>,
    max_detail_per_code: usize,
}

impl MessageStore {
    pub fn new(max_detail_per_code: usize) -> Self {
        Self {
            entries: Vec::new(),
            counts: BTreeMap::new(),
            custom_descriptions: HashMap::new(),
            max_detail_per_code,
        }
    }

    /// Register the text of a custom rule id
    pub fn register_description(&mut self, code: u32, description: &str) {
        self.custom_descriptions.insert(code, description.to_string());
    }

    /// Would another message with this code be kept in detail
    pub fn accepts_detail(&self, code: u32) -> bool {
        self.counts
            .get(&code)
            .map_or(true, |c| c.recorded_in_detail < self.max_detail_per_code)
    }

    pub fn record(&mut self, entry: MessageEntry) {
        let max = self.max_detail_per_code;
        let count = self.counts.entry(entry.code).or_default();
        if count.recorded_in_detail < max {
            count.recorded_in_detail += 1;
            self.entries.push(entry);
        } else {
            count.overflow += 1;
        }
    }

    /// Count an occurrence without building its detail entry
    pub fn record_overflow(&mut self, code: u32) {
        self.counts.entry(code).or_default().overflow += 1;
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn counts(&self) -> &BTreeMap<u32, CodeCount> {
        &self.counts
    }

    /// Total occurrences of one code
    pub fn count_of(&self, code: u32) -> usize {
        self.counts.get(&code).map_or(0, CodeCount::total)
    }

    /// Total occurrences of all codes
    pub fn total(&self) -> usize {
        self.counts.values().map(CodeCount::total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Text for a code, built-in or custom
    pub fn describe(&self, code: u32) -> String {
        if let Some(builtin) = MessageCode::from_code(code) {
            return builtin.description().to_string();
        }
        self.custom_descriptions
            .get(&code)
            .cloned()
            .unwrap_or_else(|| format!("Message code {}", code))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.counts.clear();
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DETAIL_PER_CODE)
    }
}

/// Errors and warnings of one file
#[derive(Debug, Default)]
pub struct MessageLog {
    pub errors: MessageStore,
    pub warnings: MessageStore,
}

impl MessageLog {
    pub fn new(max_detail_per_code: usize) -> Self {
        Self {
            errors: MessageStore::new(max_detail_per_code),
            warnings: MessageStore::new(max_detail_per_code),
        }
    }

    /// Record a built-in message in the store matching its kind
    pub fn record(
        &mut self,
        code: MessageCode,
        line_number: usize,
        protein_name: &str,
        extra_info: impl Into<String>,
    ) {
        self.record_entry(
            code.is_error(),
            MessageEntry {
                line_number,
                column_number: 0,
                protein_name: protein_name.to_string(),
                code: code.code(),
                extra_info: extra_info.into(),
                context: String::new(),
            },
        );
    }

    pub fn record_entry(&mut self, is_error: bool, entry: MessageEntry) {
        if is_error {
            self.errors.record(entry);
        } else {
            self.warnings.record(entry);
        }
    }

    /// Count of a built-in code across both stores
    pub fn count_of(&self, code: MessageCode) -> usize {
        self.errors.count_of(code.code()) + self.warnings.count_of(code.code())
    }

    pub fn error_count(&self) -> usize {
        self.errors.total()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: u32, line: usize) -> MessageEntry {
        MessageEntry {
            line_number: line,
            column_number: 1,
            protein_name: "P1".to_string(),
            code,
            extra_info: String::new(),
            context: String::new(),
        }
    }

    #[test]
    fn test_codes_are_unique_and_below_custom_range() {
        let mut codes: Vec<u32> = MessageCode::ALL.iter().map(|c| c.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), MessageCode::ALL.len());
        assert!(codes.iter().all(|&c| c < CUSTOM_RULE_ID_START));
        assert_eq!(MessageCode::from_code(15), Some(MessageCode::ResiduesLineTooLong));
    }

    #[test]
    fn test_error_classification() {
        assert!(MessageCode::DuplicateProteinName.is_error());
        assert!(MessageCode::CorruptLineSkipped.is_error());
        assert!(!MessageCode::RenamedProtein.is_error());
        assert!(MessageCode::ProteinEntriesNotFound.is_structural());
        assert!(!MessageCode::DuplicateProteinName.is_structural());
    }

    #[test]
    fn test_detail_cap() {
        let mut store = MessageStore::new(2);
        for line in 1..=5 {
            store.record(entry(7, line));
        }
        store.record(entry(8, 6));

        assert_eq!(store.entries().len(), 3);
        let count = store.counts()[&7];
        assert_eq!(count.recorded_in_detail, 2);
        assert_eq!(count.overflow, 3);
        assert_eq!(store.count_of(7), 5);
        assert_eq!(store.total(), 6);
        assert!(!store.accepts_detail(7));
        assert!(store.accepts_detail(8));
    }

    #[test]
    fn test_describe_custom() {
        let mut store = MessageStore::default();
        store.register_description(1000, "Name contains 'sp|'");
        assert_eq!(store.describe(1000), "Name contains 'sp|'");
        assert_eq!(store.describe(9), "Duplicate protein name found");
        assert_eq!(store.describe(4242), "Message code 4242");
    }

    #[test]
    fn test_log_routes_by_kind() {
        let mut log = MessageLog::new(10);
        log.record(MessageCode::DuplicateProteinName, 3, "P1", "");
        log.record(MessageCode::RenamedProtein, 3, "P1", "P1-b");
        assert_eq!(log.error_count(), 1);
        assert_eq!(log.warning_count(), 1);
        assert_eq!(log.warnings.entries()[0].extra_info, "P1-b");
        assert_eq!(log.count_of(MessageCode::RenamedProtein), 1);
    }
}
