//! Binary search tree with per-node lock coupling
//!
//! All descent is iterative and strictly top-down. Owned (`Arc`) lock
//! guards let the loop hold the parent's lock across acquisition of the
//! child, then drop the parent: the coupling invariant with no unsafe
//! code.

use std::io::Write;
use std::mem;

use crate::error::Result;

use super::node::{Link, NodeBody, NodeRef, ReadGuard, WriteGuard};

/// Outcome of a write-locked descent. The parent guard is always retained
/// for the caller, which either mutates a child slot (insert, splice) or
/// drops it unused.
enum WriteSearch {
    /// Target found; both the target and its parent remain write-locked.
    Hit {
        parent: WriteGuard,
        target: WriteGuard,
    },
    /// Target absent; the would-be parent remains write-locked.
    Miss { parent: WriteGuard },
}

/// The shared name/value store.
///
/// Cheap to share via reference; all interior mutability is behind the
/// per-node locks.
#[derive(Debug)]
pub struct Tree {
    root: NodeRef,
}

impl Tree {
    /// Create an empty tree holding only the root sentinel.
    pub fn new() -> Self {
        Self {
            root: NodeBody::sentinel(),
        }
    }

    /// Look up `name`, returning a copy of its value.
    pub fn query(&self, name: &str) -> Option<String> {
        let target = self.read_descend(name)?;
        Some(target.value.clone())
    }

    /// Insert a `name`/`value` pair. Returns `false` if the name is
    /// already present (the stored value is left untouched).
    ///
    /// Fails only on oversize fields; the new node is constructed detached
    /// and becomes reachable in the same critical section that links it.
    pub fn add(&self, name: &str, value: &str) -> Result<bool> {
        match self.write_descend(name) {
            WriteSearch::Hit { .. } => Ok(false),
            WriteSearch::Miss { mut parent } => {
                let node = NodeBody::alloc(name, value)?;
                if name < parent.name.as_str() {
                    parent.left = Some(node);
                } else {
                    parent.right = Some(node);
                }
                Ok(true)
            }
        }
    }

    /// Remove `name`. Returns `false` if it was not present.
    pub fn remove(&self, name: &str) -> bool {
        let (mut parent, mut target) = match self.write_descend(name) {
            WriteSearch::Miss { .. } => return false,
            WriteSearch::Hit { parent, target } => (parent, target),
        };

        let target_goes_left = target.name < parent.name;

        if target.right.is_none() {
            // No right child: the left subtree moves up into the parent's
            // slot.
            let replacement = target.left.take();
            if target_goes_left {
                parent.left = replacement;
            } else {
                parent.right = replacement;
            }
        } else if target.left.is_none() {
            let replacement = target.right.take();
            if target_goes_left {
                parent.left = replacement;
            } else {
                parent.right = replacement;
            }
        } else {
            // Two children: overwrite the target with its in-order
            // successor (the smallest name in the right subtree), then
            // splice the successor out. The descent write-locks the spine
            // hand-over-hand, retaining the guard of the node whose left
            // slot will be rewired.
            let first = target.right.clone().expect("right child checked above");
            let mut spine_owner = first.write_arc();

            if spine_owner.left.is_none() {
                // Zero-length spine: the right child itself is the
                // successor, and the target's own right slot is rewired.
                target.name = mem::take(&mut spine_owner.name);
                target.value = mem::take(&mut spine_owner.value);
                target.right = spine_owner.right.take();
            } else {
                let mut cur = spine_owner
                    .left
                    .as_ref()
                    .expect("non-empty spine checked above")
                    .write_arc();
                loop {
                    if cur.left.is_none() {
                        target.name = mem::take(&mut cur.name);
                        target.value = mem::take(&mut cur.value);
                        spine_owner.left = cur.right.take();
                        break;
                    }
                    let next = cur
                        .left
                        .as_ref()
                        .expect("left child checked above")
                        .write_arc();
                    // Release the grandparent in the spine; keep the node
                    // owning the slot to rewire.
                    spine_owner = mem::replace(&mut cur, next);
                }
            }
        }

        true
    }

    /// Print the whole tree to `out`, one node per line, indented one
    /// space per depth level. Each node stays read-locked for the duration
    /// of its own subtree, so the output is consistent within every
    /// subtree though not atomic across siblings.
    pub fn print<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        Self::print_node(&self.root, 0, out)
    }

    /// List all names in order. Intended for quiescent inspection; the
    /// traversal read-locks each node for the duration of its subtree.
    pub fn keys_in_order(&self) -> Vec<String> {
        fn visit(link: &Link, out: &mut Vec<String>) {
            if let Some(node) = link {
                let guard = node.read();
                visit(&guard.left, out);
                out.push(guard.name.clone());
                visit(&guard.right, out);
            }
        }

        let root = self.root.read();
        let mut out = Vec::new();
        visit(&root.left, &mut out);
        visit(&root.right, &mut out);
        out
    }

    /// Detach and drop every node below the sentinel.
    ///
    /// For use after the last worker has drained; the teardown loop is
    /// iterative so arbitrarily deep trees cannot overflow the stack.
    pub fn cleanup(&self) {
        let mut pending: Vec<NodeRef> = Vec::new();
        {
            let mut root = self.root.write();
            pending.extend(root.left.take());
            pending.extend(root.right.take());
        }
        while let Some(node) = pending.pop() {
            let mut body = node.write();
            pending.extend(body.left.take());
            pending.extend(body.right.take());
        }
    }

    /// Read-locked descent from the sentinel. On a hit the target is
    /// returned still read-locked and every ancestor has been released; on
    /// a miss the last lock in the chain is released here.
    fn read_descend(&self, name: &str) -> Option<ReadGuard> {
        let mut parent = self.root.read_arc();
        loop {
            let next = if name < parent.name.as_str() {
                parent.left.clone()
            } else {
                parent.right.clone()
            };
            let child = next?;
            let child_guard = child.read_arc();
            if child_guard.name == name {
                return Some(child_guard);
            }
            // Child locked before the parent is released.
            parent = child_guard;
        }
    }

    /// Write-locked descent from the sentinel, retaining the parent guard
    /// for the caller.
    fn write_descend(&self, name: &str) -> WriteSearch {
        let mut parent = self.root.write_arc();
        loop {
            let next = if name < parent.name.as_str() {
                parent.left.clone()
            } else {
                parent.right.clone()
            };
            let child = match next {
                None => return WriteSearch::Miss { parent },
                Some(child) => child,
            };
            let child_guard = child.write_arc();
            if child_guard.name == name {
                return WriteSearch::Hit {
                    parent,
                    target: child_guard,
                };
            }
            parent = child_guard;
        }
    }

    fn print_node<W: Write>(node: &NodeRef, depth: usize, out: &mut W) -> std::io::Result<()> {
        let guard = node.read();
        write!(out, "{:depth$}", "")?;
        if depth == 0 {
            writeln!(out, "(root)")?;
        } else {
            writeln!(out, "{} {}", guard.name, guard.value)?;
        }
        Self::print_link(&guard.left, depth + 1, out)?;
        Self::print_link(&guard.right, depth + 1, out)
    }

    fn print_link<W: Write>(link: &Link, depth: usize, out: &mut W) -> std::io::Result<()> {
        match link {
            None => {
                write!(out, "{:depth$}", "")?;
                writeln!(out, "(null)")
            }
            Some(node) => Self::print_node(node, depth, out),
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tree_print() {
        let tree = Tree::new();
        let mut out = Vec::new();
        tree.print(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "(root)\n (null)\n (null)\n"
        );
    }

    #[test]
    fn test_real_nodes_land_right_of_sentinel() {
        let tree = Tree::new();
        tree.add("a", "1").unwrap();
        tree.add("b", "2").unwrap();

        let mut out = Vec::new();
        tree.print(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        // The sentinel's left subtree stays empty.
        assert!(text.starts_with("(root)\n (null)\n a 1\n"));
    }
}
