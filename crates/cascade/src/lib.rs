//! Hierarchical resource-ownership and cascading-teardown engine.
//!
//! # Overview
//!
//! `cascade` tracks parent/child ownership between arbitrary long-lived
//! resources and guarantees that tearing down a parent cascades teardown to
//! all of its descendants, exactly once, in a deterministic order, safely
//! under reentrant teardown code and concurrent callers.
//!
//! It is not a garbage collector: nothing is reclaimed and nothing
//! unreachable is discovered. The engine orchestrates explicit,
//! user-registered teardown ordering and detects structural leaks
//! (resources registered but never torn down).
//!
//! # Guarantees
//!
//! - **Post-order**: a parent's teardown never runs before every current
//!   child's teardown has completed.
//! - **Sibling LIFO**: siblings execute most-recently-registered first, so
//!   teardown reverses acquisition order.
//! - **Exactly once**: the reentrancy guard turns nested teardown requests
//!   for an already-executing resource into no-ops.
//! - **Isolation**: the structural lock is never held while user callbacks
//!   run, and independent trees share no state.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use cascade::{ActionError, DisposalTree, FnAction};
//!
//! let tree: DisposalTree<String> = DisposalTree::new();
//! let editor = Arc::new("editor".to_string());
//! let highlighter = Arc::new("highlighter".to_string());
//! tree.register(&editor, &highlighter);
//!
//! let action = FnAction::new(|resource: &Arc<String>| {
//!     println!("tearing down {resource}");
//!     Ok::<_, ActionError>(())
//! });
//!
//! // Tears down the highlighter first, then the editor, and forgets both.
//! let handled = tree.execute_all(&editor, true, &action, false)?;
//! assert!(handled);
//! assert!(tree.is_empty());
//! # Ok::<(), cascade::Canceled>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod config;
pub mod error;
pub mod guard;
pub mod key;
pub mod listener;
pub mod trace;
pub mod tree;

pub use action::{FnAction, TeardownAction};
pub use config::{TreeConfig, REGISTRATION_TRACES_ENV};
pub use error::{ActionError, Canceled, LeakError, LeakedRoot, RetainedResourceError};
pub use guard::ReentrancyGuard;
pub use key::ResourceKey;
pub use listener::TreeListener;
pub use trace::AllocationTrace;
pub use tree::DisposalTree;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
