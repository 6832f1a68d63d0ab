mod json_file;
mod memory;

pub use json_file::JsonFileDreamStore;
pub use memory::InMemoryDreamStore;

use dreammap_core::CompletedDreamRecord;

/// Newest first; ties keep insertion order reversed.
fn newest_first(records: &[CompletedDreamRecord]) -> Vec<CompletedDreamRecord> {
    let mut sorted: Vec<CompletedDreamRecord> = records.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}
