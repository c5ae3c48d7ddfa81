/*
Depth-first traversals driven by an explicit stack instead of recursion,
so deep trees cannot overflow the call stack.

Every step takes a snapshot of the current node's child list (`child_nodes()`)
and pushes the handles. Nothing stays borrowed between steps: the caller may
mutate the tree while iterating, and will see each node as it is when visited.

Children are pushed in reverse so they pop off left to right.
 */
use tracing::instrument;

use crate::tree::TreeNode;

impl<T> TreeNode<T> {
    /// Pre-order iterator over this node and its descendants.
    pub fn iter(&self) -> PreOrderIter<T> {
        PreOrderIter {
            stack: vec![self.clone()],
        }
    }

    /// Post-order iterator: every node comes after all of its descendants.
    pub fn iter_postorder(&self) -> PostOrderIter<T> {
        PostOrderIter {
            stack: vec![(self.clone(), false)],
        }
    }

    /// Height of the subtree in nodes; a lone node has depth 1.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.clone(), 1)]; // (node, depth)

        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for child in node.child_nodes() {
                stack.push((child, depth + 1));
            }
        }

        max_depth
    }

    /// Leaves of the subtree, left to right.
    #[instrument(level = "trace", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<TreeNode<T>> {
        self.iter().filter(TreeNode::is_leaf).collect()
    }

    /// One path per leaf, each running from this node down to the leaf.
    #[instrument(level = "trace", skip(self))]
    pub fn leaf_paths(&self) -> Vec<Vec<TreeNode<T>>> {
        let mut paths = Vec::new();
        let mut stack = vec![(self.clone(), vec![self.clone()])];

        while let Some((node, path)) = stack.pop() {
            let children = node.child_nodes();
            if children.is_empty() {
                paths.push(path);
                continue;
            }
            for child in children.into_iter().rev() {
                let mut child_path = path.clone();
                child_path.push(child.clone());
                stack.push((child, child_path));
            }
        }

        paths
    }
}

pub struct PreOrderIter<T> {
    stack: Vec<TreeNode<T>>,
}

impl<T> Iterator for PreOrderIter<T> {
    type Item = TreeNode<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack.extend(current.child_nodes().into_iter().rev());
        Some(current)
    }
}

pub struct PostOrderIter<T> {
    stack: Vec<(TreeNode<T>, bool)>,
}

impl<T> Iterator for PostOrderIter<T> {
    type Item = TreeNode<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if visited {
                return Some(current);
            }
            let children = current.child_nodes();
            self.stack.push((current, true));
            for child in children.into_iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}
