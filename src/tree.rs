//! Ordered n-ary tree built from shared node handles.
//!
//! Each node is an `Rc<RefCell<..>>` holding its payload, a strong list of
//! children and a weak back-reference to its parent. Parents own children;
//! children never own parents, so dropping the last handle to a root releases
//! the whole subtree.
//!
//! ```text
//!      root
//!      /  \
//!     a    b        root.first_child() == a
//!     |             a.next_sibling()   == b
//!     c             c.root()           == root
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, instrument, trace};

use crate::errors::{TreeError, TreeResult};

type NodeRef<T> = Rc<RefCell<NodeInner<T>>>;
type WeakNodeRef<T> = Weak<RefCell<NodeInner<T>>>;

struct NodeInner<T> {
    payload: Option<T>,
    parent: WeakNodeRef<T>,
    children: Vec<TreeNode<T>>,
}

// The default drop recurses once per level. Subtrees are torn down from a
// work list instead: every child we hold the last handle to gives up its own
// children to the list before it is dropped with an empty `children`.
impl<T> Drop for NodeInner<T> {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Ok(cell) = Rc::try_unwrap(child.inner) {
                let mut inner = cell.into_inner();
                pending.append(&mut inner.children);
            }
        }
    }
}

/// Handle to one node of a tree.
///
/// Cloning a `TreeNode` clones the handle, not the subtree. Two handles compare
/// equal when they point at the same node; payloads are never compared here.
pub struct TreeNode<T> {
    inner: NodeRef<T>,
}

impl<T> Clone for TreeNode<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for TreeNode<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for TreeNode<T> {}

impl<T> Default for TreeNode<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<T> for TreeNode<T> {
    fn from(payload: T) -> Self {
        Self::new(payload)
    }
}

// One node only: children are counted, not printed, and the parent link is
// left out. Use `to_tree_string` for the whole subtree.
impl<T: fmt::Debug> fmt::Debug for TreeNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("TreeNode")
                .field("payload", &inner.payload)
                .field("children", &inner.children.len())
                .finish(),
            Err(_) => f.write_str("TreeNode { <borrowed> }"),
        }
    }
}

impl<T> TreeNode<T> {
    /// Creates a root node holding `payload`.
    pub fn new(payload: T) -> Self {
        Self::from_optional(Some(payload))
    }

    /// Creates a root node without payload.
    pub fn empty() -> Self {
        Self::from_optional(None)
    }

    fn from_optional(payload: Option<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NodeInner {
                payload,
                parent: Weak::new(),
                children: Vec::new(),
            })),
        }
    }

    // ------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------

    /// Appends a new node holding `payload` as the last child and returns it.
    #[instrument(level = "trace", skip(self, payload))]
    pub fn add_child(&self, payload: T) -> TreeNode<T> {
        let child = TreeNode::new(payload);
        let index = self.child_count();
        self.link_child(&child, index);
        child
    }

    /// Inserts a new node holding `payload` at `index`, shifting later children
    /// to the right.
    ///
    /// `index == child_count()` appends. Anything beyond that is rejected with
    /// [`TreeError::OutOfRange`]; no node is created in that case.
    #[instrument(level = "trace", skip(self, payload))]
    pub fn add_child_at(&self, payload: T, index: usize) -> TreeResult<TreeNode<T>> {
        self.check_insert_index(index)?;
        let child = TreeNode::new(payload);
        self.link_child(&child, index);
        Ok(child)
    }

    /// Attaches an existing root node (and its subtree) as the last child.
    pub fn append_node(&self, child: &TreeNode<T>) -> TreeResult<()> {
        let index = self.child_count();
        self.insert_node_at(child, index)
    }

    /// Attaches an existing root node (and its subtree) at `index`.
    ///
    /// # Errors
    ///
    /// * [`TreeError::AlreadyAttached`] if `child` still has a parent.
    /// * [`TreeError::CycleDetected`] if `child` is this node or one of its
    ///   ancestors.
    /// * [`TreeError::OutOfRange`] if `index > child_count()`.
    ///
    /// Both trees are left untouched on error.
    #[instrument(level = "trace", skip(self, child))]
    pub fn insert_node_at(&self, child: &TreeNode<T>, index: usize) -> TreeResult<()> {
        if !child.is_root() {
            debug!("refusing to attach a node that already has a parent");
            return Err(TreeError::AlreadyAttached);
        }
        if self.ptr_eq(child) || self.ancestors().any(|ancestor| ancestor.ptr_eq(child)) {
            debug!("refusing to attach a node beneath itself");
            return Err(TreeError::CycleDetected);
        }
        self.check_insert_index(index)?;
        self.link_child(child, index);
        Ok(())
    }

    /// Removes the first child whose payload equals `payload`.
    ///
    /// Children are scanned in order, so with several equal payloads only the
    /// leftmost one goes. Children without payload never match. Returns
    /// whether a child was removed.
    #[instrument(level = "trace", skip(self, payload))]
    pub fn remove_child(&self, payload: &T) -> bool
    where
        T: PartialEq,
    {
        let position = self
            .inner
            .borrow()
            .children
            .iter()
            .position(|child| child.inner.borrow().payload.as_ref() == Some(payload));

        match position {
            Some(index) => {
                self.unlink_child(index);
                true
            }
            None => {
                trace!("no child with a matching payload");
                false
            }
        }
    }

    /// Removes the child at `index`.
    pub fn remove_child_at(&self, index: usize) -> TreeResult<()> {
        self.detach_child_at(index)?;
        Ok(())
    }

    /// Removes the child at `index` and hands it back as a new root.
    ///
    /// The returned node keeps its own subtree. Dropping it releases that
    /// subtree unless other handles are still around.
    #[instrument(level = "trace", skip(self))]
    pub fn detach_child_at(&self, index: usize) -> TreeResult<TreeNode<T>> {
        let len = self.child_count();
        if index >= len {
            debug!(index, len, "child index out of range");
            return Err(TreeError::OutOfRange { index, len });
        }
        Ok(self.unlink_child(index))
    }

    /// Removes every child. Does nothing on a leaf.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_all_children(&self) {
        let children = std::mem::take(&mut self.inner.borrow_mut().children);
        trace!(count = children.len(), "removing children");
        for child in &children {
            child.inner.borrow_mut().parent = Weak::new();
        }
    }

    /// Removes this node from its parent. Returns `false` for a root.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&self) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        match parent.position_of(self) {
            Some(index) => {
                parent.unlink_child(index);
                true
            }
            None => false,
        }
    }

    /// Replaces the payload. The previous payload is dropped.
    pub fn set_payload(&self, payload: T) {
        self.replace_payload(payload);
    }

    /// Replaces the payload and returns the previous one.
    pub fn replace_payload(&self, payload: T) -> Option<T> {
        self.inner.borrow_mut().payload.replace(payload)
    }

    /// Takes the payload out, leaving the node empty.
    pub fn take_payload(&self) -> Option<T> {
        self.inner.borrow_mut().payload.take()
    }

    // ------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------

    pub fn parent(&self) -> Option<TreeNode<T>> {
        self.inner
            .borrow()
            .parent
            .upgrade()
            .map(|inner| TreeNode { inner })
    }

    /// Follows parent links to the top. A root returns itself.
    pub fn root(&self) -> TreeNode<T> {
        self.ancestors().last().unwrap_or_else(|| self.clone())
    }

    /// Iterates over the parent, grandparent, ... up to the root.
    pub fn ancestors(&self) -> Ancestors<T> {
        Ancestors {
            next: self.parent(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.child_count() == 0
    }

    /// Number of ancestors; 0 for a root.
    pub fn level(&self) -> usize {
        self.ancestors().count()
    }

    pub fn first_child(&self) -> Option<TreeNode<T>> {
        self.inner.borrow().children.first().cloned()
    }

    pub fn last_child(&self) -> Option<TreeNode<T>> {
        self.inner.borrow().children.last().cloned()
    }

    /// The child following this one in the parent's list. A root has no siblings.
    pub fn next_sibling(&self) -> Option<TreeNode<T>> {
        let parent = self.parent()?;
        let index = parent.position_of(self)?;
        parent.child_at(index + 1)
    }

    pub fn previous_sibling(&self) -> Option<TreeNode<T>> {
        let parent = self.parent()?;
        let index = parent.position_of(self)?;
        let previous = index.checked_sub(1)?;
        parent.child_at(previous)
    }

    /// Position of this node within its parent's children.
    pub fn index_in_parent(&self) -> Option<usize> {
        self.parent()?.position_of(self)
    }

    pub fn child_count(&self) -> usize {
        self.inner.borrow().children.len()
    }

    pub fn node_at(&self, index: usize) -> TreeResult<TreeNode<T>> {
        self.child_at(index).ok_or_else(|| {
            let len = self.child_count();
            debug!(index, len, "child index out of range");
            TreeError::OutOfRange { index, len }
        })
    }

    /// Payload of the child at `index`; `Ok(None)` when that child is empty.
    pub fn child_payload_at(&self, index: usize) -> TreeResult<Option<T>>
    where
        T: Clone,
    {
        Ok(self.node_at(index)?.payload())
    }

    /// All children of this node's parent, this node included, in order.
    ///
    /// A root is its own only sibling.
    pub fn all_sibling_nodes(&self) -> Vec<TreeNode<T>> {
        match self.parent() {
            Some(parent) => parent.child_nodes(),
            None => vec![self.clone()],
        }
    }

    pub fn all_sibling_payloads(&self) -> Vec<Option<T>>
    where
        T: Clone,
    {
        self.all_sibling_nodes().iter().map(TreeNode::payload).collect()
    }

    /// Snapshot of the child list; later mutation does not show up in it.
    pub fn child_nodes(&self) -> Vec<TreeNode<T>> {
        self.inner.borrow().children.clone()
    }

    pub fn child_payloads(&self) -> Vec<Option<T>>
    where
        T: Clone,
    {
        self.inner
            .borrow()
            .children
            .iter()
            .map(TreeNode::payload)
            .collect()
    }

    pub fn payload(&self) -> Option<T>
    where
        T: Clone,
    {
        self.inner.borrow().payload.clone()
    }

    /// Runs `f` against the payload without cloning it.
    ///
    /// `f` must not mutate this node; doing so panics on the inner `RefCell`.
    pub fn with_payload<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.inner.borrow().payload.as_ref())
    }

    pub fn ptr_eq(&self, other: &TreeNode<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------

    fn child_at(&self, index: usize) -> Option<TreeNode<T>> {
        self.inner.borrow().children.get(index).cloned()
    }

    fn position_of(&self, child: &TreeNode<T>) -> Option<usize> {
        self.inner
            .borrow()
            .children
            .iter()
            .position(|candidate| candidate.ptr_eq(child))
    }

    fn check_insert_index(&self, index: usize) -> TreeResult<()> {
        let len = self.child_count();
        if index > len {
            debug!(index, len, "insert index out of range");
            return Err(TreeError::OutOfRange { index, len });
        }
        Ok(())
    }

    // Callers validate `index` and the child's detached state beforehand.
    fn link_child(&self, child: &TreeNode<T>, index: usize) {
        child.inner.borrow_mut().parent = Rc::downgrade(&self.inner);
        self.inner.borrow_mut().children.insert(index, child.clone());
    }

    fn unlink_child(&self, index: usize) -> TreeNode<T> {
        let child = self.inner.borrow_mut().children.remove(index);
        child.inner.borrow_mut().parent = Weak::new();
        child
    }
}

/// Iterator over the ancestors of a node, nearest first.
pub struct Ancestors<T> {
    next: Option<TreeNode<T>>,
}

impl<T> Iterator for Ancestors<T> {
    type Item = TreeNode<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      root
    //      /  \
    //     a    b
    //     |
    //     c
    type Node = TreeNode<&'static str>;

    fn sample() -> (Node, Node, Node, Node) {
        let root = TreeNode::new("root");
        let a = root.add_child("a");
        let b = root.add_child("b");
        let c = a.add_child("c");
        (root, a, b, c)
    }

    #[test]
    fn test_new_node_is_root_and_leaf() {
        let node = TreeNode::new(1);
        assert!(node.is_root());
        assert!(node.is_leaf());
        assert_eq!(node.payload(), Some(1));
        assert_eq!(node.level(), 0);
    }

    #[test]
    fn test_empty_node_has_no_payload() {
        let node: TreeNode<String> = TreeNode::default();
        assert_eq!(node.payload(), None);
        assert!(node.with_payload(|p| p.is_none()));
    }

    #[test]
    fn test_parent_link_is_weak() {
        let (root, a, _b, c) = sample();
        // root is held by `root` only; children hold no strong ref upward
        assert_eq!(Rc::strong_count(&root.inner), 1);
        assert_eq!(Rc::strong_count(&a.inner), 2);
        assert_eq!(c.root(), root);
    }

    #[test]
    fn test_dropping_root_orphans_held_descendant() {
        let (root, a, _b, c) = sample();
        drop(root);
        assert!(a.is_root());
        assert_eq!(c.root(), a);
        assert_eq!(a.all_sibling_nodes(), vec![a.clone()]);
    }

    #[test]
    fn test_unlink_clears_parent_link() {
        let (root, a, _b, _c) = sample();
        let detached = root.detach_child_at(0).unwrap();
        assert_eq!(detached, a);
        assert!(a.is_root());
        assert!(a.inner.borrow().parent.upgrade().is_none());
        assert_eq!(a.child_count(), 1);
    }

    #[test]
    fn test_removed_payload_is_released() {
        let payload = Rc::new("shared".to_string());
        let root = TreeNode::new(Rc::new("root".to_string()));
        root.add_child(Rc::clone(&payload));
        assert_eq!(Rc::strong_count(&payload), 2);

        assert!(root.remove_child(&payload));
        assert_eq!(Rc::strong_count(&payload), 1);
    }

    #[test]
    fn test_set_payload_releases_previous() {
        let first = Rc::new(1);
        let node = TreeNode::new(Rc::clone(&first));
        node.set_payload(Rc::new(2));
        assert_eq!(Rc::strong_count(&first), 1);
        assert_eq!(node.take_payload().map(|p| *p), Some(2));
        assert_eq!(node.payload(), None);
    }

    #[test]
    fn test_remove_child_skips_empty_payloads() {
        let root = TreeNode::new(0);
        root.append_node(&TreeNode::empty()).unwrap();
        root.add_child(7);
        assert!(root.remove_child(&7));
        assert_eq!(root.child_count(), 1);
        assert_eq!(root.child_payload_at(0), Ok(None));
    }

    #[test]
    fn test_debug_shows_single_node() {
        let (root, a, ..) = sample();
        assert_eq!(
            format!("{:?}", root),
            "TreeNode { payload: Some(\"root\"), children: 2 }"
        );
        assert_eq!(
            format!("{:?}", a),
            "TreeNode { payload: Some(\"a\"), children: 1 }"
        );
    }

    fn chain(len: u32) -> (TreeNode<u32>, TreeNode<u32>) {
        let root = TreeNode::new(0);
        let mut current = root.clone();
        for i in 1..len {
            current = current.add_child(i);
        }
        (root, current)
    }

    #[test]
    fn test_drop_deep_chain() {
        let (root, last) = chain(200_000);
        drop(last);
        drop(root);
    }

    #[test]
    fn test_remove_all_children_on_deep_chain() {
        let (root, last) = chain(200_000);
        drop(last);
        root.remove_all_children();
        assert!(root.is_leaf());
    }

    #[test]
    fn test_drop_keeps_externally_held_subtree() {
        let (root, last) = chain(1_000);
        let middle = last.ancestors().nth(499).unwrap();
        drop(root);

        assert!(middle.is_root());
        assert_eq!(last.root(), middle);
        assert_eq!(last.level(), 500);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let (root, a, _b, c) = sample();
        let ancestors: Vec<_> = c.ancestors().collect();
        assert_eq!(ancestors, vec![a, root]);
        assert_eq!(c.level(), 2);
    }
}
