use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use crate::config::DopamindConfig;
use crate::errors::{DopamindError, DopamindResult};

pub const DEFAULT_CONFIG_FILE: &str = "dopamind.toml";
pub const ENV_PREFIX: &str = "DOPAMIND_";
pub const CONFIG_PATH_ENV: &str = "DOPAMIND_CONFIG";

/// Defaults, then the TOML file, then `DOPAMIND_*` environment variables
/// (`__` separates nested keys, e.g. `DOPAMIND_SERVER__PORT`).
pub fn figment(path: Option<&Path>) -> Figment {
    let file: PathBuf = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    Figment::from(Serialized::defaults(DopamindConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
}

pub fn load_config(path: Option<&Path>) -> DopamindResult<DopamindConfig> {
    let config: DopamindConfig = figment(path)
        .extract()
        .map_err(|e| DopamindError::config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Effective configuration rendered as TOML.
pub fn render_config(config: &DopamindConfig) -> DopamindResult<String> {
    toml::to_string_pretty(config)
        .map_err(|e| DopamindError::config(format!("failed to render config: {e}")))
}
