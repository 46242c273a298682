//! CLI command implementations.

pub mod albums;
pub mod favorite;
pub mod list;
pub mod preview;
pub mod show;
