// mod.rs - Data structures module

pub mod hash_record;
pub mod lines;
pub mod messages;
pub mod temp_files;

// Re-export main types for convenience
pub use hash_record::ProteinHashRecord;
pub use lines::{LineEnding, LineInfo, LineReader};
pub use messages::{CodeCount, MessageCode, MessageEntry, MessageLog, MessageStore};
pub use temp_files::TempFileList;
