//! Merge policy and service composing configuration sources.

pub(crate) mod merge_policy;
pub mod service;
