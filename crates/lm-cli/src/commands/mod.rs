//! CLI command implementations

pub(crate) mod migrate;
