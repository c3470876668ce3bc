// traits.rs - Core trait for the sequence hasher system

use std::fmt::Debug;

/// Trait for sequence content hashing strategies
///
/// A hasher turns the residues of one protein into the key used to detect
/// identical sequences, rendered as uppercase hexadecimal
pub trait SequenceHasher: Send + Sync + Debug {
    /// Compute the uppercase hex digest of the residues
    fn hash_residues(&self, residues: &[u8]) -> String;

    /// Get a human-readable name for this hasher
    fn name(&self) -> &'static str;

    /// Get a description of this hasher
    fn description(&self) -> &'static str;

    /// Number of hex characters in a digest
    fn digest_length(&self) -> usize;

    /// Check that a string read back from a hash file looks like a digest of this hasher
    fn is_valid_hash(&self, hash: &str) -> bool {
        hash.len() == self.digest_length() && hash.chars().all(|c| c.is_ascii_hexdigit())
    }
}

/// Hash the residues of one protein
///
/// With `ignore_il_difference` every `L` is replaced by `I` first, so that
/// sequences differing only by leucine/isoleucine share a hash.
pub fn compute_hash(hasher: &dyn SequenceHasher, residues: &str, ignore_il_difference: bool) -> String {
    if ignore_il_difference && residues.contains('L') {
        let replaced = residues.replace('L', "I");
        hasher.hash_residues(replaced.as_bytes())
    } else {
        hasher.hash_residues(residues.as_bytes())
    }
}
