// keep_list.rs - Protein names to retain, loaded from a preprocessed hash file

use crate::error::{FastaError, Result};
use crate::index::{ShardedSortedList, StringIndex};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Outcome of looking a protein name up in the keep list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepDecision {
    /// Not listed: the protein is dropped from the fixed file
    NotListed,
    /// First occurrence of a listed name
    Keep,
    /// Listed name seen again
    Duplicate,
}

/// Names to keep, with how often each has been seen in the current pass
#[derive(Debug)]
pub struct KeepList {
    names: ShardedSortedList<usize>,
}

impl KeepList {
    /// Build from names in byte order; adjacent repeats are collapsed
    pub fn from_sorted_names<I, S>(names: I, spanner_length: u8) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = ShardedSortedList::strict(spanner_length);
        let mut previous: Option<String> = None;
        for name in names {
            let name = name.as_ref();
            if previous.as_deref() == Some(name) {
                continue;
            }
            index.add(name, 0)?;
            previous = Some(name.to_string());
        }
        Ok(Self { names: index })
    }

    /// Load the first column of a sorted, tab-delimited keep file with a header row
    pub fn load(path: &Path, spanner_length: u8) -> Result<Self> {
        let reader = BufReader::new(File::open(path).map_err(|e| FastaError::io(path, e))?);
        let mut names = Vec::new();
        for line in reader.lines().skip(1) {
            let line = line.map_err(|e| FastaError::io(path, e))?;
            let name = line.split('\t').next().unwrap_or("").trim_end_matches('\r');
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        Self::from_sorted_names(names, spanner_length)
    }

    pub fn lookup(&mut self, protein_name: &str) -> KeepDecision {
        match self.names.get_value_mut(protein_name) {
            None => KeepDecision::NotListed,
            Some(seen) => {
                *seen += 1;
                if *seen == 1 {
                    KeepDecision::Keep
                } else {
                    KeepDecision::Duplicate
                }
            }
        }
    }

    /// Forget occurrence counts before another pass
    pub fn reset_counts(&mut self) {
        let names: Vec<String> = self.names.iter().map(|(k, _)| k.to_string()).collect();
        for name in names {
            self.names.set_value(&name, 0);
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn spanner_length(&self) -> u8 {
        self.names.spanner_length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_counts_occurrences() {
        let mut keep = KeepList::from_sorted_names(["P1", "P1", "P2", "Q7"], 1).unwrap();
        assert_eq!(keep.len(), 3);
        assert_eq!(keep.lookup("P1"), KeepDecision::Keep);
        assert_eq!(keep.lookup("P1"), KeepDecision::Duplicate);
        assert_eq!(keep.lookup("P3"), KeepDecision::NotListed);

        keep.reset_counts();
        assert_eq!(keep.lookup("P1"), KeepDecision::Keep);
    }

    #[test]
    fn test_unsorted_input_rejected() {
        let err = KeepList::from_sorted_names(["P2", "P1"], 1).unwrap_err();
        assert!(matches!(err, FastaError::Index { .. }));
    }
}
