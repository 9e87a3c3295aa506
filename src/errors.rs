use std::{io, num::TryFromIntError, path::PathBuf, str::Utf8Error};

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

use crate::geo::GeoError;

/// Broad classification of an [`Error`], used by callers deciding how to
/// report a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    Io,
    Config,
    Consumer,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("<{element}> attribute `{attribute}` is not a number: {value:?}")]
    InvalidNumber {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },

    #[error("<{element}> is not allowed inside {parent}")]
    MisplacedElement {
        element: &'static str,
        parent: &'static str,
    },

    #[error("<{element}> appeared before <bounds>")]
    BeforeBounds { element: &'static str },

    #[error("<bounds> appeared more than once")]
    DuplicateBounds,

    #[error("input ended without a <bounds> element")]
    MissingBounds,

    #[error("input ended with {open} unterminated element(s)")]
    UnterminatedElements { open: usize },

    #[error("closing tag without a matching opening tag")]
    UnexpectedEnd,

    #[error("invalid geometry: {0}")]
    Geo(#[from] GeoError),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("xml attribute error: {0}")]
    Attribute(#[from] AttrError),

    #[error("input is not valid utf-8: {0}")]
    Utf8(#[from] Utf8Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("could not read config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid tag filter: {0}")]
    TagFilter(#[from] regex::Error),

    #[error("consumer `{consumer}` failed to encode a record: {message}")]
    Encoding {
        consumer: &'static str,
        message: String,
    },

    #[error("integer out of range: {0}")]
    IntegerOverflow(#[from] TryFromIntError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Geo(GeoError::EvenGridDimension(_)) => ErrorKind::Config,
            Error::Geo(GeoError::InvalidElementSize { .. }) => ErrorKind::Config,
            Error::MissingAttribute { .. }
            | Error::InvalidNumber { .. }
            | Error::MisplacedElement { .. }
            | Error::BeforeBounds { .. }
            | Error::DuplicateBounds
            | Error::MissingBounds
            | Error::UnterminatedElements { .. }
            | Error::UnexpectedEnd
            | Error::Geo(_)
            | Error::Xml(_)
            | Error::Attribute(_)
            | Error::Utf8(_)
            | Error::IntegerOverflow(_) => ErrorKind::MalformedInput,
            Error::Io(_) => ErrorKind::Io,
            Error::Config { .. } | Error::InvalidConfig(_) | Error::TagFilter(_) => {
                ErrorKind::Config
            }
            Error::Encoding { .. } => ErrorKind::Consumer,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
