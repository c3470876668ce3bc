// spanner.rs - Adaptive spanner length estimation by sampling names

use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Spanner used when a sample gives no usable information
pub const DEFAULT_SPANNER_LENGTH: u8 = 1;
pub const MIN_SPANNER_LENGTH: u8 = 1;
pub const MAX_SPANNER_LENGTH: u8 = 12;

/// Number of windows read by the sampling pre-scan
pub const SAMPLE_WINDOW_COUNT: u64 = 5;
/// Size of each sampled window
pub const SAMPLE_WINDOW_BYTES: u64 = 256 * 1024;

/// Outcome of a spanner estimation
#[derive(Debug, Clone, PartialEq)]
pub struct SpannerEstimate {
    pub spanner_length: u8,
    pub names_sampled: usize,
    pub base_names: usize,
    pub average_occurrence: f64,
}

/// Number of leading characters shared by two names
pub fn common_prefix_length(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Choose the spanner length for a run of names in file order
///
/// Consecutive names are compared and their common prefix is counted as a
/// "base name". Base names seen at least as often as the average are the
/// frequent ones; the spanner is the shortest length that reaches the end of
/// the majority of those frequent base names.
pub fn estimate_spanner_length<I, S>(names: I) -> SpannerEstimate
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut previous: Option<String> = None;
    let mut names_sampled = 0;

    for name in names {
        let name = name.as_ref();
        names_sampled += 1;
        if let Some(prev) = previous.as_deref() {
            let shared = common_prefix_length(prev, name);
            if shared > 0 {
                let base: String = name.chars().take(shared).collect();
                *counts.entry(base).or_insert(0) += 1;
            }
        }
        previous = Some(name.to_string());
    }

    if counts.is_empty() {
        return SpannerEstimate {
            spanner_length: DEFAULT_SPANNER_LENGTH,
            names_sampled,
            base_names: 0,
            average_occurrence: 0.0,
        };
    }

    let total: usize = counts.values().sum();
    let average_occurrence = total as f64 / counts.len() as f64;

    let mut lengths: Vec<usize> = counts
        .iter()
        .filter(|(_, count)| **count as f64 >= average_occurrence)
        .map(|(base, _)| base.chars().count())
        .collect();
    lengths.sort_unstable();

    let majority = lengths.len().div_ceil(2);
    let chosen = lengths[majority.saturating_sub(1)];
    let spanner_length = chosen.clamp(MIN_SPANNER_LENGTH as usize, MAX_SPANNER_LENGTH as usize) as u8;

    debug!(
        "Spanner estimate: {} names, {} base names, average occurrence {:.2}, length {}",
        names_sampled,
        counts.len(),
        average_occurrence,
        spanner_length
    );

    SpannerEstimate {
        spanner_length,
        names_sampled,
        base_names: counts.len(),
        average_occurrence,
    }
}

/// Read several windows spread across the file and hand each complete line to `extract`
fn sample_windows<F>(path: &Path, mut extract: F) -> std::io::Result<Vec<String>>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut file = File::open(path)?;
    let file_length = file.metadata()?.len();
    let mut values = Vec::new();

    let offsets: Vec<u64> = if file_length <= SAMPLE_WINDOW_COUNT * SAMPLE_WINDOW_BYTES {
        vec![0]
    } else {
        (0..SAMPLE_WINDOW_COUNT)
            .map(|i| file_length / SAMPLE_WINDOW_COUNT * i)
            .collect()
    };
    let window = if offsets.len() == 1 {
        file_length
    } else {
        SAMPLE_WINDOW_BYTES
    };

    for offset in offsets {
        file.seek(SeekFrom::Start(offset))?;
        let reader = BufReader::new((&mut file).take(window));
        let mut lines = reader.split(b'\n');

        // A window starting mid-file begins inside a line
        if offset > 0 {
            lines.next();
        }

        for line in lines {
            let line = line?;
            let text = String::from_utf8_lossy(&line);
            if let Some(value) = extract(text.trim_end_matches('\r')) {
                values.push(value);
            }
        }
    }

    Ok(values)
}

/// Sample protein names from the header lines of a FASTA file
pub fn sample_fasta_names(path: &Path, marker: char) -> std::io::Result<Vec<String>> {
    sample_windows(path, |line| {
        let rest = line.trim_start().strip_prefix(marker)?;
        rest.split([' ', '\t']).next().map(str::to_string)
    })
}

/// Sample one column of a delimited file, skipping its header row
pub fn sample_column(path: &Path, column: usize, delimiter: char) -> std::io::Result<Vec<String>> {
    let mut first = true;
    sample_windows(path, |line| {
        if std::mem::take(&mut first) {
            return None;
        }
        line.split(delimiter)
            .nth(column)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_common_prefix_length() {
        assert_eq!(common_prefix_length("XP_0001", "XP_0002"), 6);
        assert_eq!(common_prefix_length("abc", "xyz"), 0);
        assert_eq!(common_prefix_length("abc", "ab"), 2);
    }

    #[test]
    fn test_estimate_numbered_names() {
        let names: Vec<String> = (100..400).map(|i| format!("XP_{:06}", i)).collect();
        let estimate = estimate_spanner_length(&names);
        assert_eq!(estimate.names_sampled, 300);
        // Names share "XP_0001", "XP_0002", ... ten at a time
        assert_eq!(estimate.spanner_length, 8);
    }

    #[test]
    fn test_estimate_without_shared_prefixes() {
        let estimate = estimate_spanner_length(["alpha", "beta", "gamma"]);
        assert_eq!(estimate.spanner_length, DEFAULT_SPANNER_LENGTH);
        assert_eq!(estimate.base_names, 0);
    }

    #[test]
    fn test_estimate_is_clamped() {
        let names: Vec<String> = (0..50)
            .map(|i| format!("a_very_long_shared_protein_prefix_{}", i % 10))
            .collect();
        let estimate = estimate_spanner_length(&names);
        assert!(estimate.spanner_length <= MAX_SPANNER_LENGTH);
    }

    #[test]
    fn test_sample_fasta_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, ">P1 first\nMKV\n>P2\r\nMKV\r\n  >P3\tdesc\nAAA\n").unwrap();
        let names = sample_fasta_names(file.path(), '>').unwrap();
        assert_eq!(names, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_sample_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Protein_Name\tCount\nP1\t0\nP2\t0\n").unwrap();
        let names = sample_column(file.path(), 0, '\t').unwrap();
        assert_eq!(names, vec!["P1", "P2"]);
    }
}
