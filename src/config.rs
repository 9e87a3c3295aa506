use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config/import.json";
pub const DEFAULT_GRID_SIZE: u32 = 5;
/// Largest accepted `grid_size`. Buffers are allocated per tile and consumer
/// up front.
pub const MAX_GRID_SIZE: u32 = 255;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    /// `.osm` export, optionally `.xz` compressed.
    pub input_path: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Tiles per side of the square grid. Must be odd and at most
    /// [`MAX_GRID_SIZE`].
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    /// Rebuild the container even when one already exists.
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Consumers in registration order.
    #[serde(default = "default_consumers")]
    pub consumers: Vec<ConsumerConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsumerConfig {
    Archive {
        #[serde(default)]
        tag_keys: Option<String>,
    },
    JsonLines {
        #[serde(default)]
        tag_keys: Option<String>,
    },
    Stats,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_grid_size() -> u32 {
    DEFAULT_GRID_SIZE
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_consumers() -> Vec<ConsumerConfig> {
    vec![ConsumerConfig::Archive { tag_keys: None }]
}

impl ImportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), path)
    }

    pub fn from_reader<R: Read>(reader: R, path: &Path) -> Result<Self> {
        let config: ImportConfig = serde_json::from_reader(reader).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.grid_size % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid_size must be odd, got {}",
                self.grid_size
            )));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(Error::InvalidConfig(format!(
                "grid_size must be at most {MAX_GRID_SIZE}, got {}",
                self.grid_size
            )));
        }
        Ok(())
    }
}
