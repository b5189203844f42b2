pub mod memory;
pub mod sqlite;
pub mod trait_def;

pub use memory::MemoryAnalysisStore;
pub use sqlite::SqliteAnalysisStore;
pub use trait_def::AnalysisStore;
