//! Configuration sources: global file and environment overlay.

pub mod environment;
pub mod global_file;
