//! Per-tree storage locations.

pub mod storage_paths;
