// ── Configuration store ──
//
// One aggregate, loaded and saved whole. Services clone it, mutate the
// clone, and hand it back through `Repository::save`.

mod aggregate;
mod index;
mod repository;

pub use aggregate::{CHANGELOG_LIMIT, ChangeNote, ChangeRecord, FIRST_DYNAMIC_ID, SystemConfig};
pub use index::UserIndex;
pub use repository::{FileRepository, MemoryRepository, Repository};
