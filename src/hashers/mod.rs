// mod.rs - Hashers module root

pub mod md5;
pub mod registry;
pub mod sha1;
pub mod sha256;
pub mod traits;

// Re-export main types for convenience
pub use md5::Md5Hasher;
pub use registry::{HasherRegistry, DEFAULT_HASHER};
pub use sha1::Sha1Hasher;
pub use sha256::Sha256Hasher;
pub use traits::{compute_hash, SequenceHasher};
