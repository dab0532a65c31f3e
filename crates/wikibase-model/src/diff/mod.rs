//! Structural diffs between entity snapshots.
//!
//! Each section of an entity (labels, descriptions, aliases, claims, site
//! links) is diffed independently into a [`MapDiff`] of add, remove and
//! change operations. The sections together form an [`EntityDiff`], which
//! can be applied, reversed for undo, and merged with a concurrent diff.

pub mod entity;
pub mod map;
pub mod merge;
pub mod statement;

pub use entity::{diff_entities, EntityDiff};
pub use map::{DiffOp, MapDiff, PatchTarget};
pub use merge::{merge_diffs, resolve_edit_conflict};
pub use statement::{apply_statement_diff, diff_statements, statement_keys, StatementDiffer, StatementDifference};
