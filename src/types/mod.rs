//! Domain types shared across the crate.

mod ids;

pub use ids::{prune_dotgit_suffix, InvalidCloneUrl, RepoId, Sha};
