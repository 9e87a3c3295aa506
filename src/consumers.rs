//! Consumers encode completed records into tile scratch buffers.

pub mod archive;
pub mod json_lines;
pub mod stats;

use regex::Regex;

use crate::config::ConsumerConfig;
use crate::data::osm::{Node, Tags, Way};
use crate::errors::Result;
use crate::tiles::TileBuffer;

pub use archive::{ArchiveConsumer, ArchivedRecord};
pub use json_lines::JsonLinesConsumer;
pub use stats::StatsConsumer;

/// Receives every record stored during an import.
///
/// Notifications arrive in input order, and every registered consumer is
/// called for a record before the next record is read. The buffer belongs to
/// the record's tile and to this consumer alone; it is only borrowed for the
/// duration of the call.
pub trait TileConsumer {
    fn name(&self) -> &'static str;

    fn import_node(&mut self, node: &Node, buffer: &mut TileBuffer) -> Result<()>;

    fn import_way(&mut self, way: &Way, buffer: &mut TileBuffer) -> Result<()>;

    /// Called once after the whole input has been read.
    fn import_finished(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Optional allow-list of tag keys, given as a regular expression.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    keys: Option<Regex>,
}

impl TagFilter {
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        Ok(TagFilter {
            keys: pattern.map(Regex::new).transpose()?,
        })
    }

    pub fn keeps(&self, key: &str) -> bool {
        self.keys.as_ref().map_or(true, |keys| keys.is_match(key))
    }

    pub fn apply(&self, tags: &Tags) -> Tags {
        tags.iter()
            .filter(|(key, _)| self.keeps(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Instantiates the configured consumers, keeping their order.
pub fn build_consumers(configs: &[ConsumerConfig]) -> Result<Vec<Box<dyn TileConsumer>>> {
    configs
        .iter()
        .map(|config| -> Result<Box<dyn TileConsumer>> {
            Ok(match config {
                ConsumerConfig::Archive { tag_keys } => {
                    let filter = TagFilter::new(tag_keys.as_deref())?;
                    Box::new(ArchiveConsumer::new(filter))
                }
                ConsumerConfig::JsonLines { tag_keys } => {
                    let filter = TagFilter::new(tag_keys.as_deref())?;
                    Box::new(JsonLinesConsumer::new(filter))
                }
                ConsumerConfig::Stats => Box::new(StatsConsumer::default()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case(None, "anything", true)]
    #[case(Some("^(name|highway)$"), "name", true)]
    #[case(Some("^(name|highway)$"), "name:en", false)]
    #[case(Some("^name"), "name:en", true)]
    fn filters_tag_keys(#[case] pattern: Option<&str>, #[case] key: &str, #[case] kept: bool) {
        let filter = TagFilter::new(pattern).expect("valid pattern");
        assert_eq!(filter.keeps(key), kept);
    }

    #[test]
    fn invalid_filter_is_a_config_error() {
        let err = TagFilter::new(Some("(unclosed")).expect_err("invalid regex");
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn builds_consumers_in_configured_order() -> Result<()> {
        let consumers = build_consumers(&[
            ConsumerConfig::Stats,
            ConsumerConfig::Archive { tag_keys: None },
            ConsumerConfig::JsonLines {
                tag_keys: Some("^name$".into()),
            },
        ])?;
        let names: Vec<&str> = consumers.iter().map(|consumer| consumer.name()).collect();
        assert_eq!(names, ["stats", "archive", "json_lines"]);
        Ok(())
    }
}
