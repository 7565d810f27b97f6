//! Git synchronization of a workspace onto its remote repository.
//!
//! The engine drives the `git` executable for everything that talks to the
//! remote and reads working-tree status through libgit2.

mod engine;

pub use engine::{GitSyncEngine, SyncOutcome, commit_message};
