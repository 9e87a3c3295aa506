use std::env;
use std::fs::create_dir_all;
use std::io;
use std::path::{Path, PathBuf};

use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_tiler::config::{ImportConfig, DEFAULT_CONFIG_PATH};
use osm_tiler::etl::import_osm::ImportOsmEtl;
use osm_tiler::etl::Etl;
use osm_tiler::Result;

fn create_output_dir(config: &ImportConfig) -> Result<PathBuf> {
    let input_fname = config
        .input_path
        .file_name()
        .ok_or_else(|| osm_tiler::Error::InvalidConfig("input_path has no file name".into()))?;
    let output_dir = config.output_dir.join(input_fname);
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let config = ImportConfig::load(Path::new(&config_path))?;
    setup_logging(&config.log_level);

    let output_dir = create_output_dir(&config)?;
    let mut etl = ImportOsmEtl::new(&config)?;
    etl.process(&output_dir)?;

    Ok(())
}
