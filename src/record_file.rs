//! The on-disk form of shaped records: one JSON document per record, either
//! on a single line or indented.

use std::io::{Read, Write};

use serde_json::de::IoRead;
use serde_json::{Deserializer, StreamDeserializer};

use crate::data::NormalizedRecord;
use crate::errors::{Error, Result};

pub struct RecordWriter<W: Write> {
    out: W,
    pretty: bool,
    buf: Vec<u8>,
    written: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W, pretty: bool) -> RecordWriter<W> {
        RecordWriter {
            out,
            pretty,
            buf: Vec::new(),
            written: 0,
        }
    }

    /// Serializes the whole record before handing it to the writer, so a
    /// failure never leaves half a record behind in the buffer.
    pub fn write(&mut self, record: &NormalizedRecord) -> Result<()> {
        self.buf.clear();
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.buf, record)?;
        } else {
            serde_json::to_writer(&mut self.buf, record)?;
        }
        self.buf.push(b'\n');
        self.out.write_all(&self.buf).map_err(|source| Error::Sink {
            element_id: record.label(),
            source,
        })?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Reads records back in file order. Accepts both layouts.
pub struct RecordReader<R: Read> {
    stream: StreamDeserializer<'static, IoRead<R>, NormalizedRecord>,
    failed: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(input: R) -> RecordReader<R> {
        RecordReader {
            stream: Deserializer::from_reader(input).into_iter(),
            failed: false,
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<NormalizedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.stream.next()? {
            Ok(record) => Some(Ok(record)),
            Err(source) => {
                self.failed = true;
                Some(Err(Error::Record {
                    offset: self.stream.byte_offset(),
                    source,
                }))
            }
        }
    }
}
