//! Pull-based element events, the only view of the input the importer needs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::errors::Result;

/// An opening tag together with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementStart {
    name: String,
    self_closing: bool,
    attributes: Vec<(String, String)>,
}

impl ElementStart {
    pub fn new(name: impl Into<String>, self_closing: bool) -> Self {
        ElementStart {
            name: name.into(),
            self_closing,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for `<tag/>` elements. No end event follows them.
    pub fn is_self_closing(&self) -> bool {
        self.self_closing
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn from_xml(el: &BytesStart, self_closing: bool) -> Result<Self> {
        let mut start = ElementStart::new(str::from_utf8(el.name().as_ref())?, self_closing);
        for attribute_res in el.attributes() {
            let attribute = attribute_res?;
            let key = str::from_utf8(attribute.key.as_ref())?.to_owned();
            let value = attribute.unescape_value()?.into_owned();
            start.attributes.push((key, value));
        }
        Ok(start)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementEvent {
    Start(ElementStart),
    End,
}

/// Source of element events. `Ok(None)` marks the end of the stream.
pub trait ElementSource {
    fn next_event(&mut self) -> Result<Option<ElementEvent>>;
}

/// Element events read from an XML map export.
pub struct XmlElementSource<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> XmlElementSource<R> {
    pub fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.trim_text(true);
        XmlElementSource {
            reader,
            buf: Vec::new(),
        }
    }

    /// Byte position in the (decompressed) input.
    pub fn position(&self) -> usize {
        self.reader.buffer_position()
    }
}

impl XmlElementSource<Box<dyn BufRead>> {
    /// Opens an `.osm` file, decompressing it on the fly if it ends in `.xz`.
    pub fn open(path: &Path) -> Result<Self> {
        let file_reader = BufReader::new(File::open(path)?);
        let input: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "xz") {
            Box::new(BufReader::new(XzDecoder::new(file_reader)))
        } else {
            Box::new(file_reader)
        };
        Ok(XmlElementSource::new(input))
    }
}

impl<R: BufRead> ElementSource for XmlElementSource<R> {
    fn next_event(&mut self) -> Result<Option<ElementEvent>> {
        loop {
            // Nothing borrows the buffer between events, so it can be reused.
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => ElementEvent::Start(ElementStart::from_xml(&e, false)?),
                Event::Empty(e) => ElementEvent::Start(ElementStart::from_xml(&e, true)?),
                Event::End(_) => ElementEvent::End,
                Event::Eof => return Ok(None),
                Event::Decl(_)
                | Event::Text(_)
                | Event::CData(_)
                | Event::Comment(_)
                | Event::PI(_)
                | Event::DocType(_) => continue,
            };
            return Ok(Some(event));
        }
    }
}
