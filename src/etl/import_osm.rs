use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::ImportConfig;
use crate::consumers::{build_consumers, TileConsumer};
use crate::container::{write_container_file, TileDirectory};
use crate::data::World;
use crate::errors::Result;
use crate::etl::Etl;
use crate::import::{ImportOutput, ImportRun};
use crate::source::XmlElementSource;

pub const ETL_NAME: &str = "import_osm";
pub const OUTPUT_FILE_NAME: &str = "map.tiles";

/// Reads the configured map export and writes its tile container.
pub struct ImportOsmEtl<'a> {
    config: &'a ImportConfig,
    consumers: Vec<Box<dyn TileConsumer>>,
    world: Option<World>,
    directory: Option<TileDirectory>,
}

impl<'a> ImportOsmEtl<'a> {
    pub fn new(config: &'a ImportConfig) -> Result<Self> {
        let consumers = build_consumers(&config.consumers)?;
        Ok(Self::with_consumers(config, consumers))
    }

    /// Uses the given consumers instead of the configured ones.
    pub fn with_consumers(config: &'a ImportConfig, consumers: Vec<Box<dyn TileConsumer>>) -> Self {
        ImportOsmEtl {
            config,
            consumers,
            world: None,
            directory: None,
        }
    }

    pub fn output_path(dir: &Path) -> PathBuf {
        dir.join(OUTPUT_FILE_NAME)
    }

    /// Records stored by the last run, unless the output was cached.
    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn directory(&self) -> Option<&TileDirectory> {
        self.directory.as_ref()
    }
}

impl Etl for ImportOsmEtl<'_> {
    type Input = XmlElementSource<Box<dyn BufRead>>;
    type Output = ImportOutput;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        let exists = Self::output_path(dir).try_exists()?;
        Ok(!self.config.overwrite && exists)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        let path = Self::output_path(dir);
        if path.try_exists()? {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        XmlElementSource::open(&self.config.input_path)
    }

    fn transform(&mut self, mut input: Self::Input) -> Result<Self::Output> {
        let consumers = std::mem::take(&mut self.consumers);
        ImportRun::new(self.config.grid_size, consumers)?.run(&mut input)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let directory = write_container_file(&Self::output_path(dir), &output.tiles)?;
        let (width, height) = output.geo_map.grid_dimensions();
        info!(
            etl_name = ETL_NAME,
            grid_width = width,
            grid_height = height,
            nodes = output.world.nodes.len(),
            ways = output.world.ways.len();
            "Container written"
        );
        self.consumers = output.consumers;
        self.world = Some(output.world);
        self.directory = Some(directory);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConsumerConfig, DEFAULT_GRID_SIZE};
    use crate::consumers::ArchiveConsumer;
    use crate::errors::ErrorKind;
    use std::fs::File;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <bounds minlat="51.50" minlon="-0.13" maxlat="51.52" maxlon="-0.11"/>
  <node id="1" lat="51.51" lon="-0.12"><tag k="name" v="Centre"/></node>
  <node id="2" lat="51.519" lon="-0.111"/>
  <node id="3" lat="48.85" lon="2.35"/>
  <way id="20"><nd ref="1"/><nd ref="2"/><tag k="highway" v="service"/></way>
</osm>"#;

    fn config_for(dir: &TempDir, overwrite: bool) -> Result<ImportConfig> {
        let input_path = dir.path().join("sample.osm");
        fs::write(&input_path, SAMPLE)?;
        Ok(ImportConfig {
            input_path,
            output_dir: dir.path().to_path_buf(),
            grid_size: DEFAULT_GRID_SIZE,
            overwrite,
            log_level: "info".into(),
            consumers: vec![ConsumerConfig::Archive { tag_keys: None }],
        })
    }

    #[test]
    fn process_writes_a_container() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config_for(&dir, false)?;
        let mut etl = ImportOsmEtl::new(&config)?;
        etl.process(dir.path())?;

        let world = etl.world().expect("import ran");
        assert_eq!(world.nodes.len(), 2);
        assert_eq!(world.ways.len(), 1);

        let directory = etl.directory().expect("container written").clone();
        let mut file = File::open(ImportOsmEtl::output_path(dir.path()))?;
        assert_eq!(TileDirectory::read_from(&mut file, 25)?, directory);

        let centre = directory.read_tile(&mut file, 12)?.expect("centre tile");
        let records = ArchiveConsumer::decode(&centre)?;
        assert_eq!(records.len(), 2, "centre node and its way");
        Ok(())
    }

    #[test]
    fn existing_container_is_reused_unless_overwriting() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(ImportOsmEtl::output_path(dir.path()), b"stale")?;

        let cached = config_for(&dir, false)?;
        let mut etl = ImportOsmEtl::new(&cached)?;
        etl.process(dir.path())?;
        assert!(etl.world().is_none(), "cached output skips the import");

        let rebuild = config_for(&dir, true)?;
        let mut etl = ImportOsmEtl::new(&rebuild)?;
        etl.process(dir.path())?;
        assert!(etl.world().is_some());
        let written = fs::metadata(ImportOsmEtl::output_path(dir.path()))?.len();
        assert!(written > 400);
        Ok(())
    }

    #[test]
    fn clean_removes_the_container() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config_for(&dir, false)?;
        let etl = ImportOsmEtl::new(&config)?;
        fs::write(ImportOsmEtl::output_path(dir.path()), b"old")?;

        etl.clean(dir.path())?;
        assert!(!etl.is_cached(dir.path())?);
        etl.clean(dir.path())?;
        Ok(())
    }

    #[test]
    fn missing_input_fails_extraction() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = config_for(&dir, false)?;
        config.input_path = dir.path().join("absent.osm");
        let mut etl = ImportOsmEtl::new(&config)?;

        let err = etl.process(dir.path()).expect_err("input is missing");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!ImportOsmEtl::output_path(dir.path()).exists());
        Ok(())
    }

    #[test]
    fn failed_rebuild_removes_the_stale_container() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let output = ImportOsmEtl::output_path(dir.path());
        fs::write(&output, b"stale")?;
        let config = config_for(&dir, true)?;
        let xml = r#"<osm><node id="1" lat="0" lon="0"/></osm>"#;
        fs::write(&config.input_path, xml)?;
        let mut etl = ImportOsmEtl::new(&config)?;

        let err = etl.process(dir.path()).expect_err("node precedes bounds");
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(!output.exists(), "stale container survived");
        Ok(())
    }
}
