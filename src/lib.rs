//! Consume free space on the filesystem behind a directory, and give it back.
//!
//! A start computes how many MiB to take (fixed size, target percent used,
//! or space to leave free), fills `chaos_filldisk.log.dat` with `fallocate`
//! or a background `dd`, and can leave a detached process holding the file
//! open. A stop kills those processes by name and deletes the file.

pub mod channel;
pub mod collectors;
pub mod config;
pub mod error;
pub mod fill;
pub mod models;
pub mod util;

pub use error::{FillError, Result};
