//! The disposal tree registry.
//!
//! # Overview
//!
//! [`DisposalTree`] tracks parent/child ownership between arbitrary
//! long-lived resources and guarantees that tearing down a parent cascades
//! teardown to every descendant, exactly once, children before parents,
//! most-recently-registered sibling first.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                  DisposalTree<R>                       │
//! ├────────────────────────────────────────────────────────┤
//! │  state: Mutex<TreeState>     structural lock           │
//! │    ├─ nodes: identity map    resource -> Node          │
//! │    ├─ roots: identity set    parentless resources      │
//! │    └─ modifications: u64     monotonic counter         │
//! │  guard: ReentrancyGuard      in-progress set, own lock │
//! │  listeners: RwLock<Vec<..>>  register/execute hooks    │
//! │  config: TreeConfig          diagnostics               │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! The structural lock is never held while a user-supplied callback runs,
//! so arbitrarily long or reentrant teardown code cannot deadlock unrelated
//! disposals. The guard's in-progress set locks independently of the
//! structural lock.
//!
//! Each tree is an explicit context object. Independent trees (one per test,
//! one per subsystem) share nothing, including the reentrancy guard.

mod node;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{error, warn};

use crate::action::TeardownAction;
use crate::config::TreeConfig;
use crate::error::{ActionError, Canceled, LeakError, LeakedRoot, RetainedResourceError};
use crate::guard::ReentrancyGuard;
use crate::key::ResourceKey;
use crate::listener::TreeListener;

use self::node::TreeState;

/// Identity-keyed registry of resource ownership with cascading teardown.
///
/// Resources are handed in as `Arc<R>` and identified by the allocation
/// address of the `Arc`, never by `Eq`/`Hash` of `R`. The tree holds a
/// strong reference to every tracked resource until the resource is
/// executed with removal.
///
/// All operations are synchronous on the calling thread; the tree spawns
/// nothing and is safe to share across threads.
pub struct DisposalTree<R: ?Sized> {
    /// Structural lock over the node registry, the root set, every children
    /// list and the modification counter.
    state: Mutex<TreeState<R>>,
    /// In-progress set shared by tracked and untracked execution paths.
    guard: ReentrancyGuard,
    listeners: RwLock<Vec<Arc<dyn TreeListener<R>>>>,
    config: TreeConfig,
}

impl<R: ?Sized> Default for DisposalTree<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ?Sized> DisposalTree<R> {
    /// Empty tree with default configuration (no trace capture).
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Empty tree with the given configuration.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            state: Mutex::new(TreeState::new()),
            guard: ReentrancyGuard::new(),
            listeners: RwLock::new(Vec::new()),
            config,
        }
    }

    /// The configuration this tree was built with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Attach `child` to `parent`.
    ///
    /// A previously unseen `parent` enters the tree as a root. A `child`
    /// already hanging elsewhere is re-parented: detached from its former
    /// parent (or from the root set) and appended to `parent`'s children
    /// list, which makes it the first sibling to execute.
    ///
    /// Registering a resource under itself or under one of its own
    /// descendants would create a cycle; such a call is rejected and logged
    /// at error level, leaving the tree unchanged.
    ///
    /// Fires [`TreeListener::object_registered`] once per successful call,
    /// after the structural lock has been released.
    pub fn register(&self, parent: &Arc<R>, child: &Arc<R>) {
        let child_key = ResourceKey::of(child);
        {
            let mut state = self.state.lock();
            let parent_key = state.ensure_node(parent, &self.config);
            if state.is_self_or_ancestor(child_key, parent_key) {
                error!(
                    child = %child_key,
                    parent = %parent_key,
                    "rejected registration: child is the parent or one of its ancestors"
                );
                return;
            }
            state.ensure_node(child, &self.config);
            state.attach(parent_key, child_key);
        }
        self.notify_registered(child);
    }

    /// Execute the teardown of `resource` and, if tracked, of its whole
    /// subtree, depth-first, children before self.
    ///
    /// - `dispose_tree = true`: executed nodes are unlinked and forgotten;
    ///   the subtree is gone when the call returns.
    /// - `dispose_tree = false` ("soft execute"): the action runs but the
    ///   structure is preserved; a later call will run the action again,
    ///   which is the caller's responsibility to guard against if undesired.
    /// - `process_unregistered = true`: an untracked `resource` still has
    ///   its [`TeardownAction::execute`] run, under the same reentrancy
    ///   guard, with no tree linkage and no listener events.
    ///
    /// Returns `Ok(true)` when the resource was handled (tracked, or
    /// untracked with `process_unregistered`), `Ok(false)` when there was
    /// nothing to do. The only error is [`Canceled`], raised by the action
    /// to abort the remainder of this call; completed child teardowns are
    /// not rolled back.
    pub fn execute_all(
        &self,
        resource: &Arc<R>,
        dispose_tree: bool,
        action: &dyn TeardownAction<R>,
        process_unregistered: bool,
    ) -> Result<bool, Canceled> {
        let key = ResourceKey::of(resource);
        let tracked = self.state.lock().nodes.contains_key(&key);
        if tracked {
            self.execute_node(key, dispose_tree, action)?;
            return Ok(true);
        }
        if !process_unregistered {
            return Ok(false);
        }
        let outcome = self.guard.enter(key, || match action.execute(resource) {
            Ok(()) => Ok(()),
            Err(ActionError::Canceled(canceled)) => Err(canceled),
            Err(failure) => {
                error!(resource = %key, error = %failure, "teardown action failed");
                Ok(())
            }
        });
        match outcome {
            Some(result) => result.map(|()| true),
            // Reentrant teardown of the same untracked resource: handled,
            // as a no-op.
            None => Ok(true),
        }
    }

    /// Execute the subtree rooted at `to_execute`, then register
    /// `to_replace` under `to_execute`'s former parent.
    ///
    /// # Panics
    ///
    /// `to_execute` must be tracked and must have a parent; anything else is
    /// an API-contract violation.
    pub fn execute_child_and_replace(
        &self,
        to_execute: &Arc<R>,
        to_replace: &Arc<R>,
        dispose_tree: bool,
        action: &dyn TeardownAction<R>,
    ) -> Result<(), Canceled> {
        let key = ResourceKey::of(to_execute);
        let former_parent = {
            let state = self.state.lock();
            let node = state
                .nodes
                .get(&key)
                .expect("execute_child_and_replace: resource is not registered");
            let parent_key = node
                .parent
                .expect("execute_child_and_replace: resource has no parent");
            Arc::clone(&state.nodes[&parent_key].resource)
        };
        self.execute_node(key, dispose_tree, action)?;
        self.register(&former_parent, to_replace);
        Ok(())
    }

    /// Whether `resource` is currently tracked.
    pub fn contains_key(&self, resource: &Arc<R>) -> bool {
        self.state.lock().nodes.contains_key(&ResourceKey::of(resource))
    }

    /// Whether the tree tracks nothing at all.
    pub fn is_empty(&self) -> bool {
        self.state.lock().nodes.is_empty()
    }

    /// Number of tracked resources.
    pub fn size(&self) -> usize {
        self.state.lock().nodes.len()
    }

    /// Current value of the monotonic structural-modification counter.
    pub fn modification_count(&self) -> u64 {
        self.state.lock().modifications
    }

    /// Fail if any node in the tree still holds `resource`.
    ///
    /// Walks every tracked node. The error says whether the retaining node
    /// is a root or hangs under a parent, and carries the registration
    /// trace when capture was configured.
    pub fn assert_no_reference_kept_in_tree(
        &self,
        resource: &Arc<R>,
    ) -> Result<(), RetainedResourceError> {
        let state = self.state.lock();
        for node in state.nodes.values() {
            if Arc::ptr_eq(&node.resource, resource) {
                return Err(RetainedResourceError {
                    is_root: node.parent.is_none(),
                    registration_trace: node.registration_trace.clone(),
                });
            }
        }
        Ok(())
    }

    /// Leak check over the root set.
    ///
    /// With `fail_on_leak = true` any remaining root makes the call return
    /// [`LeakError`], listing every leaked root in creation order together
    /// with its captured allocation trace; test suites use this to turn a
    /// leak into a hard failure. With `fail_on_leak = false` each leak is
    /// logged as a warning and the call succeeds.
    pub fn assert_is_empty(&self, fail_on_leak: bool) -> Result<(), LeakError> {
        let leaks: Vec<LeakedRoot> = {
            let state = self.state.lock();
            let mut roots: Vec<_> = state
                .roots
                .iter()
                .filter_map(|key| state.nodes.get(key))
                .collect();
            roots.sort_by_key(|node| node.stamp);
            roots
                .into_iter()
                .map(|node| LeakedRoot {
                    stamp: node.stamp,
                    registration_trace: node.registration_trace.clone(),
                })
                .collect()
        };

        if leaks.is_empty() {
            return Ok(());
        }
        if fail_on_leak {
            return Err(LeakError { leaks });
        }
        for leak in &leaks {
            match &leak.registration_trace {
                Some(trace) => warn!(
                    stamp = leak.stamp,
                    "resource never torn down, registered at:\n{}", trace
                ),
                None => warn!(
                    stamp = leak.stamp,
                    "resource never torn down (registration traces disabled)"
                ),
            }
        }
        Ok(())
    }

    /// Subscribe `listener` to register/execute events.
    pub fn add_listener(&self, listener: Arc<dyn TreeListener<R>>) {
        self.listeners.write().push(listener);
    }

    /// Unsubscribe a previously added listener, matched by identity.
    pub fn remove_listener(&self, listener: &Arc<dyn TreeListener<R>>) {
        self.listeners
            .write()
            .retain(|existing| !Arc::ptr_eq(existing, listener));
    }

    /// Depth-first post-order execution of one tracked node, under the
    /// reentrancy guard.
    fn execute_node(
        &self,
        key: ResourceKey,
        dispose_tree: bool,
        action: &dyn TeardownAction<R>,
    ) -> Result<(), Canceled> {
        let outcome = self.guard.enter(key, || {
            let (resource, children) = {
                let state = self.state.lock();
                match state.nodes.get(&key) {
                    // Children are snapshotted under the lock; concurrent
                    // re-parenting cannot corrupt the iteration below.
                    Some(node) => (Arc::clone(&node.resource), node.children.clone()),
                    // Lost a race with a concurrent removal.
                    None => return Ok(()),
                }
            };

            if let Err(failure) = action.before_tree_execution(&resource) {
                warn!(resource = %key, error = %failure, "pre-execution hook failed");
            }

            // Reverse registration order: teardown unwinds acquisition.
            for child in children.iter().rev() {
                self.execute_node(*child, dispose_tree, action)?;
            }

            if dispose_tree {
                let mut state = self.state.lock();
                let state = &mut *state;
                if let Some(current) = state.nodes.get_mut(&key) {
                    current.children.clear();
                    state.modifications += 1;
                }
            }

            match action.execute(&resource) {
                Ok(()) => {}
                Err(ActionError::Canceled(canceled)) => return Err(canceled),
                Err(failure) => {
                    error!(resource = %key, error = %failure, "teardown action failed");
                }
            }

            self.notify_executed(&resource);

            if dispose_tree {
                self.state.lock().remove(key);
            }
            Ok(())
        });
        outcome.unwrap_or(Ok(()))
    }

    fn notify_registered(&self, resource: &Arc<R>) {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener.object_registered(resource);
        }
    }

    fn notify_executed(&self, resource: &Arc<R>) {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener.object_executed(resource);
        }
    }
}

impl<R: ?Sized + PartialEq> DisposalTree<R> {
    /// Linear scan of `parent`'s children for one structurally equal to
    /// `candidate`.
    ///
    /// This is the one place structural equality is consulted; callers use
    /// it to register equivalent children idempotently. Returns the tracked
    /// handle of the match, if any.
    pub fn find_registered_object(&self, parent: &Arc<R>, candidate: &Arc<R>) -> Option<Arc<R>> {
        let state = self.state.lock();
        let parent_node = state.nodes.get(&ResourceKey::of(parent))?;
        parent_node
            .children
            .iter()
            .filter_map(|key| state.nodes.get(key))
            .find(|node| *node.resource == **candidate)
            .map(|node| Arc::clone(&node.resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::FnAction;
    use std::sync::Mutex as StdMutex;

    fn noop() -> FnAction<impl Fn(&Arc<String>) -> Result<(), ActionError> + Send + Sync> {
        FnAction::new(|_: &Arc<String>| Ok::<_, ActionError>(()))
    }

    fn res(name: &str) -> Arc<String> {
        Arc::new(name.to_string())
    }

    #[test]
    fn test_register_tracks_resources() {
        let tree: DisposalTree<String> = DisposalTree::new();
        let parent = res("parent");
        let child = res("child");

        assert!(tree.is_empty());
        tree.register(&parent, &child);

        assert!(tree.contains_key(&parent));
        assert!(tree.contains_key(&child));
        assert_eq!(tree.size(), 2);
    }

    #[test]
    fn test_execute_all_removes_subtree() {
        let tree: DisposalTree<String> = DisposalTree::new();
        let parent = res("parent");
        let child = res("child");
        tree.register(&parent, &child);

        let handled = tree.execute_all(&parent, true, &noop(), false).unwrap();

        assert!(handled);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_execute_order_is_children_first() {
        let tree: DisposalTree<String> = DisposalTree::new();
        let a = res("a");
        let b = res("b");
        tree.register(&a, &b);

        let order = StdMutex::new(Vec::new());
        let action = FnAction::new(|resource: &Arc<String>| {
            order.lock().unwrap().push(resource.as_str().to_string());
            Ok::<_, ActionError>(())
        });
        tree.execute_all(&a, true, &action, false).unwrap();

        assert_eq!(order.into_inner().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_modification_counter_is_monotonic() {
        let tree: DisposalTree<String> = DisposalTree::new();
        let parent = res("parent");
        let child = res("child");

        let before = tree.modification_count();
        tree.register(&parent, &child);
        let after_register = tree.modification_count();
        tree.execute_all(&parent, true, &noop(), false).unwrap();
        let after_execute = tree.modification_count();

        assert!(before < after_register);
        assert!(after_register < after_execute);
    }
}
