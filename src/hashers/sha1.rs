// sha1.rs - SHA1 hasher implementation

use super::traits::SequenceHasher;

/// SHA1 hasher - default, matches historical protein hash files
#[derive(Debug, Clone)]
pub struct Sha1Hasher;

impl SequenceHasher for Sha1Hasher {
    fn hash_residues(&self, residues: &[u8]) -> String {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(residues);
        format!("{:X}", hasher.finalize())
    }

    fn name(&self) -> &'static str {
        "SHA1"
    }

    fn description(&self) -> &'static str {
        "SHA1 hash compatible with existing protein hash files"
    }

    fn digest_length(&self) -> usize {
        40
    }
}
