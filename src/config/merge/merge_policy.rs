//! Built-in defaults seeded into every config builder.

use crate::config::{
    default_base_path, default_display_name, default_suppression_ttl_ms,
};
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

/// Builder seeded with scalar defaults; lists and tables fall back to serde defaults.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default(
            "base_path",
            default_base_path().to_string_lossy().to_string(),
        )?
        .set_default("read_only", false)?
        .set_default("display_name", default_display_name())?
        .set_default("suppression_ttl_ms", default_suppression_ttl_ms())
}
