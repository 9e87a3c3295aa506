pub mod import_osm;

use std::path::Path;

use log::{error, info};

use crate::errors::Result;

/// A job whose output lives in a directory. `process` reuses that output
/// when `is_cached` says so, and otherwise cleans it before rebuilding, so a
/// failed rebuild never leaves stale output behind.
pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn is_cached(&self, dir: &Path) -> Result<bool>;
    fn clean(&self, dir: &Path) -> Result<()>;

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    fn process(&mut self, dir: &Path) -> Result<()> {
        info!(etl_name = self.etl_name(); "Starting ETL process");
        if self.is_cached(dir)? {
            info!(etl_name = self.etl_name(); "Using cached output");
            return Ok(());
        }

        let cleaned = self.clean(dir);
        self.logged("cleaning", cleaned)?;
        let extracted = self.extract(dir);
        let input = self.logged("extracting", extracted)?;
        let transformed = self.transform(input);
        let output = self.logged("transforming", transformed)?;
        let loaded = self.load(dir, output);
        self.logged("loading", loaded)?;

        info!(etl_name = self.etl_name(); "Process finished");
        Ok(())
    }

    /// Logs the outcome of one phase and passes the result through.
    fn logged<T>(&self, phase: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => info!(etl_name = self.etl_name(), phase = phase; "Phase done"),
            Err(err) => {
                let message = err.to_string();
                error!(
                    etl_name = self.etl_name(),
                    phase = phase,
                    err = message.as_str();
                    "Phase failed"
                );
            }
        }
        result
    }
}
