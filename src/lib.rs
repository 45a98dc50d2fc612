//! ptree - render the running processes of a system as a text tree.
//!
//! The library behind the `ptree` binary, organized as a one-way pipeline:
//! - `collector` captures one flat snapshot of process records from `/proc`
//! - `tree` links the snapshot into a rooted forest and orders siblings
//! - `render` prints the forest as indented branch art
//! - `users` resolves owner uids to account names for annotations

pub mod collector;
pub mod model;
pub mod render;
pub mod tree;
pub mod users;
pub mod util;
