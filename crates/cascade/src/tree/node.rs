//! Nodes and the locked registry state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::TreeConfig;
use crate::key::ResourceKey;
use crate::trace::AllocationTrace;

/// One tracked resource: parent link, ordered child list, optional
/// registration trace and creation-order stamp.
pub(crate) struct Node<R: ?Sized> {
    /// Strong handle; keeps the identity key valid while tracked.
    pub(crate) resource: Arc<R>,
    /// `None` for root objects.
    pub(crate) parent: Option<ResourceKey>,
    /// Children in registration order; traversal runs it in reverse.
    pub(crate) children: Vec<ResourceKey>,
    /// Call stack of the registration site, when capture is configured.
    pub(crate) registration_trace: Option<AllocationTrace>,
    /// Modification-counter value at creation.
    pub(crate) stamp: u64,
}

/// Registry innards. Every field is guarded by the tree's structural lock;
/// nothing in here is reachable without holding it.
pub(crate) struct TreeState<R: ?Sized> {
    /// Identity-keyed node registry.
    pub(crate) nodes: HashMap<ResourceKey, Node<R>>,
    /// Tracked resources with no parent.
    pub(crate) roots: HashSet<ResourceKey>,
    /// Monotonic counter, bumped on every structural mutation.
    pub(crate) modifications: u64,
}

impl<R: ?Sized> TreeState<R> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: HashSet::new(),
            modifications: 0,
        }
    }

    /// Node key for `resource`, creating the node as a root if the resource
    /// was previously unseen.
    pub(crate) fn ensure_node(&mut self, resource: &Arc<R>, config: &TreeConfig) -> ResourceKey {
        let key = ResourceKey::of(resource);
        if !self.nodes.contains_key(&key) {
            self.modifications += 1;
            let node = Node {
                resource: Arc::clone(resource),
                parent: None,
                children: Vec::new(),
                registration_trace: config
                    .capture_registration_traces
                    .then(AllocationTrace::capture),
                stamp: self.modifications,
            };
            self.nodes.insert(key, node);
            self.roots.insert(key);
        }
        key
    }

    /// Whether `candidate` is `start` itself or one of its ancestors.
    ///
    /// Parent links are acyclic (attach rejects anything else), so the walk
    /// terminates.
    pub(crate) fn is_self_or_ancestor(&self, candidate: ResourceKey, start: ResourceKey) -> bool {
        let mut cursor = Some(start);
        while let Some(key) = cursor {
            if key == candidate {
                return true;
            }
            cursor = self.nodes.get(&key).and_then(|node| node.parent);
        }
        false
    }

    /// Detach `child` from wherever it currently hangs and append it to
    /// `parent`'s children list.
    pub(crate) fn attach(&mut self, parent: ResourceKey, child: ResourceKey) {
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        self.modifications += 1;
    }

    /// Remove `key` from its parent's children list, or from the root set if
    /// it has no parent. The node itself stays tracked.
    pub(crate) fn detach(&mut self, key: ResourceKey) {
        let parent = match self.nodes.get(&key) {
            Some(node) => node.parent,
            None => return,
        };
        match parent {
            Some(parent_key) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent_key) {
                    parent_node.children.retain(|child| *child != key);
                }
                if let Some(node) = self.nodes.get_mut(&key) {
                    node.parent = None;
                }
            }
            None => {
                self.roots.remove(&key);
            }
        }
    }

    /// Forget `key` entirely: unlink it and drop its node.
    pub(crate) fn remove(&mut self, key: ResourceKey) {
        self.detach(key);
        if self.nodes.remove(&key).is_some() {
            self.modifications += 1;
        }
    }
}
