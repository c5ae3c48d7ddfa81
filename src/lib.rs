//! Ordered, mutable n-ary tree.
//!
//! A [`TreeNode`] holds an optional payload, owns an ordered list of children
//! and keeps a weak link to its parent. Children can be appended, inserted at
//! a position, removed by payload or position, and whole subtrees can be
//! detached and reattached elsewhere.
//!
//! ```
//! use nodetree::TreeNode;
//!
//! let root = TreeNode::new("root");
//! let a = root.add_child("a");
//! let b = root.add_child("b");
//!
//! assert_eq!(root.child_count(), 2);
//! assert_eq!(a.next_sibling(), Some(b.clone()));
//! assert!(root.remove_child(&"a"));
//! assert_eq!(root.child_payload_at(0), Ok(Some("b")));
//! ```
//!
//! Nodes are `Rc`-based and therefore confined to one thread.

pub mod errors;
pub mod tree;
pub mod tree_queue;
pub mod tree_stack;
pub mod tree_traits;

pub use errors::{TreeError, TreeResult};
pub use tree::{Ancestors, TreeNode};
pub use tree_queue::BreadthFirstIter;
pub use tree_stack::{PostOrderIter, PreOrderIter};
pub use tree_traits::TreeNodeConvert;
