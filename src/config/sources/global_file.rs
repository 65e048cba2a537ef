//! Global config file source: `$XDG_CONFIG_HOME/notesync/config.toml`, optional.

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Ok(config_home) = xdg::config_home() else {
        return Ok(builder);
    };
    let path = config_home.join("notesync").join("config.toml");
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(false)))
}
