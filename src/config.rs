use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("OVERLAYRS_CONFIG_PATH").unwrap_or("/usr/local/etc/overlayrs/config.toml"))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Draw the centered guide oval over the feed
    pub guide_oval: bool,
    pub oval_color: [u8; 4],
    pub oval_stroke: f32,
    pub box_color: [u8; 4],
    pub box_stroke: f32,
    pub landmark_color: [u8; 4],
    pub landmark_radius: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            guide_oval: true,
            oval_color: [255, 0, 0, 255],
            oval_stroke: 5.0,
            box_color: [0, 255, 0, 255],
            box_stroke: 4.0,
            landmark_color: [255, 255, 0, 255],
            landmark_radius: 6.0,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
