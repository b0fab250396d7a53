use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::{ElementKind, RawElement, Tag};
use crate::errors::{Error, Result};

// <osm> is depth 1, its entities depth 2, their <tag>/<nd> children depth 3.
const ENTITY_DEPTH: usize = 2;
const CHILD_DEPTH: usize = 3;

/// Pulls top-level OSM entities out of an XML stream one at a time. Only the
/// element being assembled is held in memory.
pub struct OsmElements<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    current: Option<RawElement>,
    element_offset: u64,
    done: bool,
}

/// Opens an `.osm` file, decompressing on the fly when the name ends in `.xz`.
pub fn open_osm(path: &Path) -> Result<OsmElements<Box<dyn BufRead>>> {
    let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
    let file_reader = BufReader::new(file);
    let input: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "xz") {
        Box::new(BufReader::new(XzDecoder::new(file_reader)))
    } else {
        Box::new(file_reader)
    };
    Ok(OsmElements::new(input))
}

impl<R: BufRead> OsmElements<R> {
    pub fn new(input: R) -> OsmElements<R> {
        let mut reader = Reader::from_reader(input);
        reader.trim_text(true);
        OsmElements {
            reader,
            buf: Vec::new(),
            depth: 0,
            current: None,
            element_offset: 0,
            done: false,
        }
    }

    /// Byte offset where the most recent entity started.
    pub fn offset(&self) -> u64 {
        self.element_offset
    }

    fn stream_position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    fn fail(&mut self, source: quick_xml::Error) -> Option<Result<RawElement>> {
        self.done = true;
        Some(Err(Error::Xml {
            offset: self.stream_position(),
            source,
        }))
    }
}

fn read_attributes(el: &BytesStart) -> quick_xml::Result<HashMap<String, String>> {
    let mut attributes = HashMap::new();
    for attribute_res in el.attributes() {
        let attribute = attribute_res.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}

fn start_entity(el: &BytesStart) -> quick_xml::Result<RawElement> {
    let mut entity = RawElement::new(ElementKind::from_name(el.name().as_ref()));
    entity.attributes = read_attributes(el)?;
    Ok(entity)
}

fn add_child(entity: &mut RawElement, el: &BytesStart) -> quick_xml::Result<()> {
    match el.name().as_ref() {
        b"tag" => {
            let mut attributes = read_attributes(el)?;
            match (attributes.remove("k"), attributes.remove("v")) {
                (Some(k), Some(v)) => entity.tags.push(Tag { k, v }),
                _ => debug!(id = entity.id().unwrap_or("?"); "Ignoring tag without k or v"),
            }
        }
        b"nd" => {
            let mut attributes = read_attributes(el)?;
            if let Some(node_ref) = attributes.remove("ref") {
                entity.node_refs.push(node_ref);
            }
        }
        // <member> and anything unexpected
        _ => (),
    }
    Ok(())
}

impl<R: BufRead> Iterator for OsmElements<R> {
    type Item = Result<RawElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            let position = self.stream_position();
            match self.reader.read_event_into(&mut self.buf) {
                Err(e) => return self.fail(e),
                Ok(Event::Eof) => {
                    self.done = true;
                    return match self.current.take() {
                        Some(_) => Some(Err(Error::Xml {
                            offset: position,
                            source: quick_xml::Error::UnexpectedEof("unclosed element".to_string()),
                        })),
                        None => None,
                    };
                }
                Ok(Event::Start(e)) => {
                    self.depth += 1;
                    let res = match self.depth {
                        ENTITY_DEPTH => start_entity(&e).map(|entity| {
                            self.element_offset = position;
                            self.current = Some(entity);
                        }),
                        CHILD_DEPTH => match self.current.as_mut() {
                            Some(entity) => add_child(entity, &e),
                            None => Ok(()),
                        },
                        _ => Ok(()),
                    };
                    if let Err(e) = res {
                        return self.fail(e);
                    }
                }
                Ok(Event::Empty(e)) => match self.depth + 1 {
                    ENTITY_DEPTH => {
                        self.element_offset = position;
                        return match start_entity(&e) {
                            Ok(entity) => Some(Ok(entity)),
                            Err(e) => self.fail(e),
                        };
                    }
                    CHILD_DEPTH => {
                        if let Some(entity) = self.current.as_mut() {
                            if let Err(e) = add_child(entity, &e) {
                                return self.fail(e);
                            }
                        }
                    }
                    _ => (),
                },
                Ok(Event::End(_)) => {
                    let closing = self.depth;
                    self.depth = self.depth.saturating_sub(1);
                    if closing == ENTITY_DEPTH {
                        if let Some(entity) = self.current.take() {
                            return Some(Ok(entity));
                        }
                    }
                }
                // declarations, text, comments and the like carry nothing we keep
                Ok(_) => (),
            }
        }
    }
}
