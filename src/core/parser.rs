// parser.rs - Streaming protein FASTA parser and record state machine

use crate::core::duplicates::{DuplicateNamePolicy, NameDecision, NameTracker, SequenceTracker};
use crate::core::names::{replace_invalid_characters, split_multiple_refs, NameFixer};
use crate::core::options::ValidatorOptions;
use crate::core::rules::{evaluate, RuleCategory, RuleHit, RuleSet, DEFAULT_CONTEXT_WIDTH};
use crate::data::{LineEnding, LineReader, MessageCode, MessageEntry, MessageLog};
use crate::error::{FastaError, Result};
use crate::hashers::{compute_hash, SequenceHasher};
use crate::output::HashInfoWriter;
use crate::preload::{KeepDecision, KeepList};
use indicatif::ProgressBar;
use log::info;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lines longer than this are corrupt: skipped and never buffered in full
pub const MAX_LINE_LENGTH: usize = 10_000_000;
pub const VERY_LONG_LINE: usize = 100_000;
pub const EXTREMELY_LONG_LINE: usize = 1_000_000;

/// Line lengths that trigger the long-line warnings and the corrupt-line cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLimits {
    pub corrupt: usize,
    pub very_long: usize,
    pub extremely_long: usize,
}

impl Default for LineLimits {
    fn default() -> Self {
        Self {
            corrupt: MAX_LINE_LENGTH,
            very_long: VERY_LONG_LINE,
            extremely_long: EXTREMELY_LONG_LINE,
        }
    }
}

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    AwaitingHeader,
    HeaderSeen,
    InResidueBlock,
}

/// Counters of one parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub line_count: usize,
    pub protein_count: usize,
    pub residue_count: u64,
    /// A structural error makes the file unusable
    pub fatal: bool,
    pub aborted: bool,
}

impl ParseSummary {
    pub fn success(&self) -> bool {
        !self.fatal && !self.aborted
    }
}

/// Fixed FASTA destination of a parse
pub struct FixedOutput<'a> {
    pub path: &'a Path,
    pub writer: &'a mut dyn Write,
}

/// Optional sinks fed while parsing
#[derive(Default)]
pub struct ParseOutputs<'a> {
    pub fixed: Option<FixedOutput<'a>>,
    pub hash_info: Option<&'a mut HashInfoWriter>,
    pub progress: Option<&'a ProgressBar>,
}

/// Current protein between its header and the next header
#[derive(Debug)]
struct PendingProtein {
    name: String,
    description: String,
    header_line: usize,
    residues: String,
    line_lengths: Vec<usize>,
    /// Line number and buffer offset of the newest residue line, checked once
    /// it is known whether it ends the block
    unchecked_line: Option<(usize, usize)>,
    /// Goes to the fixed file
    write: bool,
    /// Recorded by the sequence tracker
    track: bool,
    /// Written to the hash info file
    hash_info: bool,
}

impl PendingProtein {
    fn new(name: String, description: String, header_line: usize) -> Self {
        Self {
            name,
            description,
            header_line,
            residues: String::new(),
            line_lengths: Vec::new(),
            unchecked_line: None,
            write: true,
            track: true,
            hash_info: true,
        }
    }

    fn unusable(header_line: usize) -> Self {
        Self {
            write: false,
            track: false,
            hash_info: false,
            ..Self::new(String::new(), String::new(), header_line)
        }
    }
}

/// Write one record as a header line followed by residue lines
pub fn write_record<'r, I>(
    writer: &mut dyn Write,
    marker: char,
    name: &str,
    description: &str,
    residue_lines: I,
    line_ending: LineEnding,
) -> std::io::Result<()>
where
    I: IntoIterator<Item = &'r [u8]>,
{
    let eol = line_ending.as_bytes();
    if description.is_empty() {
        write!(writer, "{}{}", marker, name)?;
    } else {
        write!(writer, "{}{} {}", marker, name, description)?;
    }
    writer.write_all(eol)?;
    for line in residue_lines {
        writer.write_all(line)?;
        writer.write_all(eol)?;
    }
    Ok(())
}

/// Residues cut to the original line lengths; leftovers form a final line
pub(crate) fn original_wrapping<'r>(residues: &'r [u8], line_lengths: &[usize]) -> Vec<&'r [u8]> {
    let mut lines = Vec::with_capacity(line_lengths.len() + 1);
    let mut rest = residues;
    for &length in line_lengths {
        if rest.is_empty() {
            break;
        }
        let take = length.min(rest.len());
        if take == 0 {
            continue;
        }
        lines.push(&rest[..take]);
        rest = &rest[take..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}

/// Single pass over a FASTA stream
pub struct FastaParser<'a> {
    source: &'a Path,
    options: &'a ValidatorOptions,
    rules: &'a RuleSet,
    name_fixer: &'a NameFixer,
    hasher: Arc<dyn SequenceHasher>,
    messages: &'a mut MessageLog,
    sequences: Option<&'a mut SequenceTracker>,
    keep_list: Option<&'a mut KeepList>,
    names: NameTracker,
    abort: &'a AtomicBool,
    line_ending: LineEnding,
    line_limits: LineLimits,

    state: ParseState,
    pending: Option<PendingProtein>,
    blank_line: Option<usize>,
    orphan_reported: bool,
    summary: ParseSummary,
}

impl<'a> FastaParser<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: &'a Path,
        options: &'a ValidatorOptions,
        rules: &'a RuleSet,
        name_fixer: &'a NameFixer,
        hasher: Arc<dyn SequenceHasher>,
        messages: &'a mut MessageLog,
        abort: &'a AtomicBool,
        name_spanner_length: u8,
    ) -> Self {
        Self {
            source,
            options,
            rules,
            name_fixer,
            hasher,
            messages,
            sequences: None,
            keep_list: None,
            names: NameTracker::new(name_spanner_length),
            abort,
            line_ending: LineEnding::default(),
            line_limits: LineLimits::default(),
            state: ParseState::AwaitingHeader,
            pending: None,
            blank_line: None,
            orphan_reported: false,
            summary: ParseSummary::default(),
        }
    }

    pub fn with_sequences(mut self, sequences: &'a mut SequenceTracker) -> Self {
        self.sequences = Some(sequences);
        self
    }

    pub fn with_keep_list(mut self, keep_list: &'a mut KeepList) -> Self {
        self.keep_list = Some(keep_list);
        self
    }

    /// Line ending used for the fixed file
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_line_limits(mut self, line_limits: LineLimits) -> Self {
        self.line_limits = line_limits;
        self
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn name_tracker(&self) -> &NameTracker {
        &self.names
    }

    pub fn parse<R: BufRead>(&mut self, reader: R, outputs: &mut ParseOutputs<'_>) -> Result<ParseSummary> {
        let limits = self.line_limits;
        let mut lines = LineReader::new(reader, limits.corrupt);
        let mut buf = Vec::new();
        let mut last_terminated = true;
        let mut last_progress = Instant::now();
        let interval = self.options.abort_check_interval.max(1);

        while let Some(info) = lines
            .read_line(&mut buf)
            .map_err(|e| FastaError::io(self.source, e))?
        {
            self.summary.line_count += 1;
            let line_number = self.summary.line_count;
            last_terminated = info.terminated;

            if line_number % interval == 0 {
                if self.abort.load(Ordering::Relaxed) {
                    info!("Aborted {} at line {}", self.source.display(), line_number);
                    self.summary.aborted = true;
                    return Ok(self.summary);
                }
                if let Some(progress) = outputs.progress {
                    if last_progress.elapsed() >= PROGRESS_INTERVAL {
                        progress.set_position(lines.bytes_consumed());
                        last_progress = Instant::now();
                    }
                }
            }

            if info.truncated {
                let name = self.current_name();
                self.messages.record(
                    MessageCode::CorruptLineSkipped,
                    line_number,
                    &name,
                    format!("{} characters", info.length),
                );
                self.summary.fatal = true;
                continue;
            }
            let long_line_limit = if info.length > limits.extremely_long {
                Some(limits.extremely_long)
            } else if info.length > limits.very_long {
                Some(limits.very_long)
            } else {
                None
            };
            if let Some(limit) = long_line_limit {
                let name = self.current_name();
                self.messages.record(
                    MessageCode::LineIsVeryLong,
                    line_number,
                    &name,
                    format!("over {} characters", limit),
                );
            }

            let text = String::from_utf8_lossy(&buf);
            self.process_line(&text, line_number, outputs)?;
        }

        self.finish(last_terminated, outputs)?;
        if let Some(progress) = outputs.progress {
            progress.set_position(lines.bytes_consumed());
        }
        Ok(self.summary)
    }

    fn current_name(&self) -> String {
        self.pending.as_ref().map(|p| p.name.clone()).unwrap_or_default()
    }

    fn record_hits(&mut self, hits: Vec<RuleHit>, line_number: usize, protein_name: &str) {
        for hit in hits {
            self.messages.record_entry(
                hit.is_error,
                MessageEntry {
                    line_number,
                    column_number: hit.column,
                    protein_name: protein_name.to_string(),
                    code: hit.rule_id,
                    extra_info: hit.extra_info,
                    context: hit.context,
                },
            );
        }
    }

    fn process_line(&mut self, line: &str, line_number: usize, outputs: &mut ParseOutputs<'_>) -> Result<()> {
        if line.trim().is_empty() {
            self.blank_line.get_or_insert(line_number);
            return Ok(());
        }

        let content = if line.starts_with(char::is_whitespace) {
            let name = self.current_name();
            self.messages
                .record(MessageCode::LineStartsWithSpace, line_number, &name, "");
            line.trim_start()
        } else {
            line
        };

        if content.starts_with(self.options.marker) {
            self.process_header(content, line_number, outputs)
        } else {
            self.process_residues(content, line_number);
            Ok(())
        }
    }

    fn process_header(&mut self, line: &str, line_number: usize, outputs: &mut ParseOutputs<'_>) -> Result<()> {
        if let Some(blank) = self.blank_line.take() {
            if self.options.warn_blank_lines_between_proteins {
                let name = self.current_name();
                self.messages
                    .record(MessageCode::BlankLineBeforeProteinName, blank, &name, "");
            }
        }

        match self.state {
            ParseState::HeaderSeen => {
                if let Some(previous) = self.pending.take() {
                    self.messages.record(
                        MessageCode::ProteinHasNoResidues,
                        previous.header_line,
                        &previous.name,
                        "",
                    );
                }
            }
            ParseState::InResidueBlock => self.flush_protein(outputs)?,
            ParseState::AwaitingHeader => {}
        }

        self.summary.protein_count += 1;
        self.state = ParseState::HeaderSeen;
        self.orphan_reported = false;

        let hits = evaluate(
            self.rules.rules(RuleCategory::Header),
            line,
            0,
            line,
            DEFAULT_CONTEXT_WIDTH,
        );
        self.record_hits(hits, line_number, "");

        // Name runs from the marker to the first space or tab; the rest is the description
        let after_marker = &line[self.options.marker.len_utf8()..];
        let rest = after_marker.trim_start();
        let name_offset = line.len() - rest.len();
        let name_end = rest.find([' ', '\t']).unwrap_or(rest.len());
        let name = &rest[..name_end];
        let description_raw = rest[name_end..].trim_start();
        let description_offset = line.len() - description_raw.len();
        let description = description_raw.trim_end();

        if name.is_empty() {
            self.pending = Some(PendingProtein::unusable(line_number));
            return Ok(());
        }

        let hits = evaluate(
            self.rules.rules(RuleCategory::Name),
            name,
            name_offset,
            line,
            DEFAULT_CONTEXT_WIDTH,
        );
        self.record_hits(hits, line_number, name);
        if !description.is_empty() {
            let hits = evaluate(
                self.rules.rules(RuleCategory::Description),
                description,
                description_offset,
                line,
                DEFAULT_CONTEXT_WIDTH,
            );
            self.record_hits(hits, line_number, name);
        }

        let options = self.options;
        let fixed = &options.fixed;
        let name_length = name.chars().count();
        let truncating = fixed.generate && fixed.truncate_long_names;
        if name_length > options.max_protein_name_length && !truncating {
            self.messages.record(
                MessageCode::ProteinNameIsTooLong,
                line_number,
                name,
                name_length.to_string(),
            );
        }

        let mut protein = PendingProtein::new(name.to_string(), description.to_string(), line_number);
        if fixed.generate {
            if truncating {
                if let Some((new_name, new_description)) = self.name_fixer.auto_fix_name(
                    &protein.name,
                    &protein.description,
                    options.max_protein_name_length,
                    &fixed.long_name_split_chars,
                ) {
                    self.messages
                        .record(MessageCode::ProteinNameTruncated, line_number, name, new_name.as_str());
                    protein.name = new_name;
                    protein.description = new_description;
                }
            }
            if fixed.replace_invalid_name_characters {
                if let Some(new_name) =
                    replace_invalid_characters(&protein.name, options.allow_all_symbols_in_protein_names)
                {
                    self.messages.record(
                        MessageCode::ProteinNameInvalidCharactersReplaced,
                        line_number,
                        name,
                        new_name.as_str(),
                    );
                    protein.name = new_name;
                }
            }
            if fixed.split_multiple_refs_in_names {
                if let Some((new_name, new_description)) = split_multiple_refs(&protein.name, &protein.description) {
                    self.messages
                        .record(MessageCode::ProteinNameSplit, line_number, name, new_name.as_str());
                    protein.name = new_name;
                    protein.description = new_description;
                }
            }
        }

        // Checked on the final name since fixes can shorten it
        let final_length = protein.name.chars().count();
        if final_length < options.min_protein_name_length {
            self.messages.record(
                MessageCode::ProteinNameIsTooShort,
                line_number,
                name,
                final_length.to_string(),
            );
        }

        protein.hash_info = options.output.save_basic_hash_info;
        if let Some(keep_list) = self.keep_list.as_deref_mut() {
            match keep_list.lookup(&protein.name) {
                KeepDecision::Keep => {}
                KeepDecision::NotListed => {
                    self.messages.record(
                        MessageCode::ProteinRemovedNotInKeepList,
                        line_number,
                        &protein.name,
                        "",
                    );
                    protein.write = false;
                }
                KeepDecision::Duplicate => {
                    self.messages
                        .record(MessageCode::DuplicateProteinName, line_number, &protein.name, "");
                    protein.write = false;
                }
            }
        } else if options.check_for_duplicate_names {
            let policy = DuplicateNamePolicy {
                rename: fixed.generate && fixed.rename_duplicate_names,
                keep_unless_matching_sequence: fixed.keep_duplicate_names_unless_matching_sequence,
                max_name_length: Some(options.max_protein_name_length),
            };
            match self.names.examine_protein_name(&protein.name, policy) {
                NameDecision::Unique => {}
                NameDecision::Renamed(new_name) => {
                    self.messages.record(
                        MessageCode::RenamedProtein,
                        line_number,
                        &protein.name,
                        new_name.as_str(),
                    );
                    protein.name = new_name;
                }
                NameDecision::Retained => {
                    self.messages.record(
                        MessageCode::DuplicateProteinNameRetained,
                        line_number,
                        &protein.name,
                        "",
                    );
                }
                NameDecision::Duplicate => {
                    self.messages
                        .record(MessageCode::DuplicateProteinName, line_number, &protein.name, "");
                    protein.write = false;
                    protein.track = false;
                }
            }
        }

        self.pending = Some(protein);
        Ok(())
    }

    fn process_residues(&mut self, line: &str, line_number: usize) {
        if self.state == ParseState::AwaitingHeader {
            if !self.orphan_reported {
                self.messages.record(
                    MessageCode::ResiduesFoundWithoutProteinHeader,
                    line_number,
                    "",
                    "",
                );
                self.orphan_reported = true;
            }
            self.blank_line = None;
            return;
        }

        if let Some(blank) = self.blank_line.take() {
            let code = if self.state == ParseState::HeaderSeen {
                MessageCode::BlankLineBetweenProteinNameAndResidues
            } else {
                MessageCode::BlankLineInMiddleOfResidues
            };
            let name = self.current_name();
            self.messages.record(code, blank, &name, "");
        }

        // Trailing whitespace is not part of the sequence
        let line = line.trim_end();
        if line.len() > self.options.max_residues_per_line {
            let name = self.current_name();
            self.messages.record(
                MessageCode::ResiduesLineTooLong,
                line_number,
                &name,
                line.len().to_string(),
            );
        }

        // A line followed by more residues cannot end the block
        let previous = self.pending.as_mut().and_then(|p| p.unchecked_line.take());
        if let Some((previous_line, start)) = previous {
            self.check_residue_line(previous_line, start, false);
        }
        if let Some(protein) = self.pending.as_mut() {
            protein.unchecked_line = Some((line_number, protein.residues.len()));
            protein.residues.push_str(line);
            protein.line_lengths.push(line.len());
        }
        self.summary.residue_count += line.len() as u64;
        self.state = ParseState::InResidueBlock;
    }

    /// Run the sequence rules over the buffered residue line starting at `start`.
    ///
    /// Only the last line of a block may end in '*'; flush strips it.
    fn check_residue_line(&mut self, line_number: usize, start: usize, ends_block: bool) {
        let Some(protein) = self.pending.as_ref() else {
            return;
        };
        let line = &protein.residues[start..];
        let checked = if ends_block { line.trim_end_matches('*') } else { line };
        let hits = evaluate(
            self.rules.rules(RuleCategory::Sequence),
            checked,
            0,
            line,
            DEFAULT_CONTEXT_WIDTH,
        );
        if !hits.is_empty() {
            let name = protein.name.clone();
            self.record_hits(hits, line_number, &name);
        }
    }

    /// Hash, report and write the buffered protein
    fn flush_protein(&mut self, outputs: &mut ParseOutputs<'_>) -> Result<()> {
        let last = self.pending.as_mut().and_then(|p| p.unchecked_line.take());
        if let Some((line_number, start)) = last {
            self.check_residue_line(line_number, start, true);
        }
        let Some(mut protein) = self.pending.take() else {
            return Ok(());
        };
        let options = self.options;

        let kept = protein.residues.trim_end_matches('*').len();
        protein.residues.truncate(kept);
        if options.fixed.generate && options.fixed.remove_invalid_residues {
            protein.residues.retain(|c| {
                c.is_ascii_alphabetic()
                    || (c == '*' && options.allow_asterisk)
                    || (c == '-' && options.allow_dash)
            });
        }
        if protein.residues.is_empty() {
            if protein.track {
                self.messages.record(
                    MessageCode::ProteinHasNoResidues,
                    protein.header_line,
                    &protein.name,
                    "",
                );
            }
            return Ok(());
        }

        let mut hash = None;
        if protein.track {
            if let Some(sequences) = self.sequences.as_deref_mut() {
                let outcome = sequences.record_sequence(&protein.name, &protein.residues);
                if let Some(first) = outcome.duplicate_of {
                    if options.check_for_duplicate_sequences {
                        self.messages.record(
                            MessageCode::DuplicateProteinSequence,
                            protein.header_line,
                            &protein.name,
                            first,
                        );
                    }
                }
                hash = Some(outcome.hash);
            }
        }

        if protein.hash_info {
            if let Some(writer) = outputs.hash_info.as_deref_mut() {
                let hash = hash.unwrap_or_else(|| {
                    compute_hash(
                        self.hasher.as_ref(),
                        &protein.residues,
                        options.fixed.ignore_il_difference,
                    )
                });
                writer.write_protein(&protein.name, protein.residues.len(), &hash)?;
            }
        }

        if protein.write {
            if let Some(fixed) = outputs.fixed.as_mut() {
                let residues = protein.residues.as_bytes();
                let lines: Vec<&[u8]> = if options.fixed.wrap_long_residue_lines {
                    residues.chunks(options.fixed.residues_per_line).collect()
                } else {
                    original_wrapping(residues, &protein.line_lengths)
                };
                write_record(
                    &mut *fixed.writer,
                    options.marker,
                    &protein.name,
                    &protein.description,
                    lines,
                    self.line_ending,
                )
                .map_err(|e| FastaError::io(fixed.path, e))?;
            }
        }
        Ok(())
    }

    fn finish(&mut self, last_terminated: bool, outputs: &mut ParseOutputs<'_>) -> Result<()> {
        let last_line = self.summary.line_count;
        if last_line > 0 && !last_terminated && !self.options.add_missing_linefeed {
            let name = self.current_name();
            self.messages
                .record(MessageCode::FileDoesNotEndWithLinefeed, last_line, &name, "");
        }

        match self.state {
            ParseState::HeaderSeen => {
                if let Some(last) = self.pending.take() {
                    self.messages.record(
                        MessageCode::FinalProteinEntryMissingResidues,
                        last.header_line,
                        &last.name,
                        "",
                    );
                }
                self.summary.fatal = true;
            }
            ParseState::InResidueBlock => self.flush_protein(outputs)?,
            ParseState::AwaitingHeader => {}
        }

        if self.summary.protein_count == 0 {
            self.messages
                .record(MessageCode::ProteinEntriesNotFound, last_line, "", "");
            self.summary.fatal = true;
        }

        if let Some(fixed) = outputs.fixed.as_mut() {
            fixed.writer.flush().map_err(|e| FastaError::io(fixed.path, e))?;
        }
        if let Some(writer) = outputs.hash_info.as_deref_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
