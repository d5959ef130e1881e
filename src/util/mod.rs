//! Shared utilities.

pub mod arena;
