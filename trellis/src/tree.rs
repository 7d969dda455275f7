//! Command tree nodes.

use std::collections::BTreeMap;

use crate::command::Command;

/// One named node of the command tree: the command itself plus its children.
pub(crate) struct Node {
    pub command: Box<dyn Command>,
    pub children: BTreeMap<String, Node>,
}

impl Node {
    /// Wrap a command, recursively attaching everything its
    /// [`Command::subcommands`] capability exposes.
    pub fn attach(mut command: Box<dyn Command>) -> Self {
        let children = command
            .subcommands()
            .into_iter()
            .map(|(name, child)| (name, Node::attach(child)))
            .collect();
        Node { command, children }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
