//! Environment variable source: NOTESYNC_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// Uses NOTESYNC_ prefix and __ as separator for nested keys
/// (e.g. `NOTESYNC_LOGGING__LEVEL=debug`).
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("NOTESYNC")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    ))
}
