// mod.rs - External-sort preload of protein hash files

pub mod external_sort;
pub mod keep_list;
pub mod workflow;

// Re-export main types for convenience
pub use external_sort::{ChunkedMergeSorter, ExternalSorter, SortSummary};
pub use keep_list::{KeepDecision, KeepList};
pub use workflow::{HashFileColumns, PreloadSummary, PreloadWorkflow};
