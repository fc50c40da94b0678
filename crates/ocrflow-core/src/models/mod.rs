//! Data models shared across the library.

pub mod config;
pub mod invoice;
pub mod task;
