use std::fmt::Display;

use itertools::Itertools;
use termtree::Tree;
use tracing::instrument;

use crate::tree::TreeNode;

/// Label used for nodes that carry no payload.
pub const EMPTY_LABEL: &str = "<empty>";

/// Human-readable renderings of a subtree, for debugging and logs.
pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;

    /// One line per leaf, the leaf first and each ancestor after it, up to
    /// and including this node: `leaf <- parent <- ... <- self`.
    fn leaf_path_strings(&self) -> Vec<String>;
}

impl<T: Display> TreeNodeConvert for TreeNode<T> {
    /// Built bottom-up from an explicit stack. A node is expanded first and
    /// stays on the stack with its child count; once its children are built
    /// they sit, in order, at the end of `built` and get gathered under it.
    ///
    /// The returned `termtree::Tree` nests one `Vec` per level and drops
    /// recursively, so very deep trees should be rendered a subtree at a time.
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let mut stack = vec![(self.clone(), None)]; // (node, child count once expanded)
        let mut built: Vec<Tree<String>> = Vec::new();

        while let Some((node, expanded)) = stack.pop() {
            match expanded {
                None => {
                    let children = node.child_nodes();
                    stack.push((node, Some(children.len())));
                    stack.extend(children.into_iter().rev().map(|child| (child, None)));
                }
                Some(count) => {
                    let leaves = built.split_off(built.len() - count);
                    built.push(Tree::new(label(&node)).with_leaves(leaves));
                }
            }
        }

        built.pop().unwrap_or_else(|| Tree::new(label(self)))
    }

    #[instrument(level = "trace", skip(self))]
    fn leaf_path_strings(&self) -> Vec<String> {
        self.leaf_paths()
            .iter()
            .map(|path| path.iter().rev().map(label).join(" <- "))
            .collect()
    }
}

fn label<T: Display>(node: &TreeNode<T>) -> String {
    node.with_payload(|payload| match payload {
        Some(payload) => payload.to_string(),
        None => EMPTY_LABEL.to_string(),
    })
}
