pub mod model;
pub mod structure;
pub mod util;

pub use model::{Chunk, Counts, Document, SegmentTree, StructureKind, TocKind, TocNode};
pub use structure::{NormalizeRules, NormalizeStats, ParsedDocument, StructureParser};
