//! Message catalogs: the tree model, path addressing and file storage.

/// Format-preserving JSON edits
mod edit;
/// Dot-path addressing
mod path;
/// Catalog file storage
mod store;
/// Message tree data model
mod tree;
/// Tree traversal
mod walker;

pub use edit::apply_writes_to_json_text;
pub use path::DotPath;
pub use store::{
    CatalogError,
    CatalogFile,
    CatalogStore,
    PersistOutcome,
    to_pretty_json,
};
pub use tree::{
    MessageMap,
    MessageTree,
    ShapeError,
};
pub use walker::{
    ConflictKind,
    StructuralConflict,
    flatten,
    flatten_entries,
    read_at,
    write_at,
};
