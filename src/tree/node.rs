//! Tree node representation
//!
//! Each node carries its own `parking_lot::RwLock` guarding the name, the
//! value, and both child links. Descent code uses the `arc_lock` guards so
//! a parent guard can be held across acquisition of the child.

use std::sync::Arc;

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};

use crate::error::{DbError, Result};

/// Upper bound on the byte length of a stored name or value.
pub const MAX_FIELD_LEN: usize = 256;

/// Shared handle to a locked node.
pub(crate) type NodeRef = Arc<RwLock<NodeBody>>;

/// An optional child link.
pub(crate) type Link = Option<NodeRef>;

/// Owned read guard over a node; keeps the node alive while held.
pub(crate) type ReadGuard = ArcRwLockReadGuard<RawRwLock, NodeBody>;

/// Owned write guard over a node; keeps the node alive while held.
pub(crate) type WriteGuard = ArcRwLockWriteGuard<RawRwLock, NodeBody>;

/// The lock-protected contents of one tree node.
#[derive(Debug)]
pub(crate) struct NodeBody {
    pub name: String,
    pub value: String,
    pub left: Link,
    pub right: Link,
}

impl NodeBody {
    /// Allocate a detached, unlocked node.
    ///
    /// Rejects names and values over [`MAX_FIELD_LEN`] bytes.
    pub fn alloc(name: &str, value: &str) -> Result<NodeRef> {
        if name.len() > MAX_FIELD_LEN {
            return Err(DbError::EntryTooLarge { len: name.len() });
        }
        if value.len() > MAX_FIELD_LEN {
            return Err(DbError::EntryTooLarge { len: value.len() });
        }

        Ok(Arc::new(RwLock::new(NodeBody {
            name: name.to_string(),
            value: value.to_string(),
            left: None,
            right: None,
        })))
    }

    /// The root sentinel: empty name and value, never removed.
    pub fn sentinel() -> NodeRef {
        Arc::new(RwLock::new(NodeBody {
            name: String::new(),
            value: String::new(),
            left: None,
            right: None,
        }))
    }
}
