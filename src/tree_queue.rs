use std::collections::VecDeque;

use tracing::instrument;

use crate::tree::TreeNode;

impl<T> TreeNode<T> {
    /// Level-order iterator: this node, then its children, then grandchildren.
    pub fn iter_breadth_first(&self) -> BreadthFirstIter<T> {
        BreadthFirstIter {
            queue: VecDeque::from([self.clone()]),
        }
    }

    /// Number of nodes on each level of the subtree, starting with this node's
    /// level (always 1).
    #[instrument(level = "trace", skip(self))]
    pub fn level_widths(&self) -> Vec<usize> {
        let mut widths = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back((self.clone(), 0)); // (node, level)

        while let Some((node, level)) = queue.pop_front() {
            if widths.len() <= level {
                widths.push(0);
            }
            widths[level] += 1;
            for child in node.child_nodes() {
                queue.push_back((child, level + 1));
            }
        }

        widths
    }
}

pub struct BreadthFirstIter<T> {
    queue: VecDeque<TreeNode<T>>,
}

impl<T> Iterator for BreadthFirstIter<T> {
    type Item = TreeNode<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.queue.pop_front()?;
        self.queue.extend(current.child_nodes());
        Some(current)
    }
}
