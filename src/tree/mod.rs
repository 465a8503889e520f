//! Tree Module
//!
//! The shared store: a binary search tree mapping names to values with a
//! reader/writer lock on every node.
//!
//! ## Concurrency Model
//! Traversal uses hand-over-hand lock coupling: the lock on a parent is
//! released only after the lock on the child has been acquired. Readers
//! couple read locks, writers couple write locks, and all acquisition is
//! strictly top-down, so the tree is deadlock-free. Two writers on
//! disjoint paths do not conflict; a reader and a writer on disjoint
//! subtrees only contend above their lowest common ancestor.
//!
//! ## Root Sentinel
//! The tree owns a sentinel node with an empty name that is never removed.
//! Every legal name compares greater than the empty string, so all real
//! data lives in the sentinel's right subtree; the sentinel exists to give
//! every real node a locked parent and remove the root-pointer special
//! case.

mod bst;
mod node;

pub use bst::Tree;
pub use node::MAX_FIELD_LEN;
