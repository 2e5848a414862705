//! XML spectral library (`LibraryDataSet`, schema version 2).
//!
//! ```text
//! LibraryDataSet (SchemaVersion="2", xmlns="Quantitation.LibraryDatabase")
//! ├── Library (LibraryID, CreationDateTime)
//! ├── Compound (CompoundID = 1)
//! ├── Spectrum (CompoundID = 1)
//! ├── Compound (CompoundID = 2)
//! └── Spectrum (CompoundID = 2)
//! ```
//!
//! Spectrum arrays are base64-encoded little-endian float64 values (see
//! [`super::binary`]); compound names are transliterated to ASCII.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::binary::encode_f64_array;
use super::{format_decimal, ExportError, ExportOptions};
use crate::compound::MergedCompoundEntry;

/// XML namespace of the library document
pub const LIBRARY_NAMESPACE: &str = "Quantitation.LibraryDatabase";

/// Schema version written on the root element
pub const SCHEMA_VERSION: &str = "2";

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SS.fffffff+HH:MM`.
pub fn format_timestamp(time: &DateTime<FixedOffset>) -> String {
    let ticks = (time.timestamp_subsec_nanos() / 100).min(9_999_999);
    format!(
        "{}.{:07}{}",
        time.format("%Y-%m-%dT%H:%M:%S"),
        ticks,
        time.format("%:z")
    )
}

/// Closest plain-ASCII spelling of a compound name.
pub fn transliterate(name: &str) -> String {
    deunicode::deunicode(name)
}

/// Writes a library document to any [`Write`] sink.
pub struct LibraryWriter<W: Write> {
    handle: Writer<W>,
    options: ExportOptions,
    timestamp: String,
    compound_count: u32,
}

impl<W: Write> LibraryWriter<W> {
    /// Start a document: declaration, root element and `Library` header.
    pub fn new(inner: W, options: ExportOptions, created: &DateTime<FixedOffset>) -> Result<Self, ExportError> {
        let mut writer = Self {
            handle: Writer::new_with_indent(inner, b' ', 2),
            options,
            timestamp: format_timestamp(created),
            compound_count: 0,
        };
        writer.write_header()?;
        Ok(writer)
    }

    fn write_header(&mut self) -> Result<(), ExportError> {
        self.handle
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut root = BytesStart::new("LibraryDataSet");
        root.push_attribute(("SchemaVersion", SCHEMA_VERSION));
        root.push_attribute(("xmlns", LIBRARY_NAMESPACE));
        self.handle.write_event(Event::Start(root))?;

        let library_id = self.options.library_id.to_string();
        let timestamp = self.timestamp.clone();
        self.start("Library")?;
        self.text_element("LibraryID", &library_id)?;
        self.text_element("CreationDateTime", &timestamp)?;
        self.end("Library")
    }

    /// Append the `Compound` and `Spectrum` elements of one entry.
    pub fn write_entry(&mut self, entry: &MergedCompoundEntry) -> Result<(), ExportError> {
        if entry.peaks.is_empty() {
            return Err(ExportError::EmptySpectrum {
                name: entry.display_name().to_string(),
            });
        }
        self.compound_count += 1;
        let library_id = self.options.library_id.to_string();
        let compound_id = self.compound_count.to_string();
        let timestamp = self.timestamp.clone();

        self.start("Compound")?;
        self.text_element("LibraryID", &library_id)?;
        self.text_element("CompoundID", &compound_id)?;
        self.text_element("AlternateNames", "")?;
        self.text_element("CASNumber", entry.cas_number.as_deref().unwrap_or(""))?;
        self.text_element("CompoundName", &transliterate(entry.display_name()))?;
        self.text_element("Description", &entry.source_file)?;
        self.text_element("Formula", entry.formula.as_deref().unwrap_or(""))?;
        self.text_element("LastEditDateTime", &timestamp)?;
        self.text_element("RetentionTimeRTL", &format_decimal(entry.retention_time))?;
        self.text_element("RetentionIndex", &format_decimal(entry.retention_index))?;
        self.text_element("UserDefined", &entry.ri_reference)?;
        self.end("Compound")?;

        let mz: Vec<f64> = entry.peaks.iter().map(|p| p.mz as f64).collect();
        let abundance: Vec<f64> = entry.peaks.iter().map(|p| p.intensity).collect();
        let origin = self.options.origin.clone();
        let polarity = self.options.ion_polarity.clone();

        self.start("Spectrum")?;
        self.text_element("LibraryID", &library_id)?;
        self.text_element("CompoundID", &compound_id)?;
        self.text_element("SpectrumID", "0")?;
        self.text_element("AbundanceValues", &encode_f64_array(&abundance))?;
        self.text_element("IonPolarity", &polarity)?;
        self.text_element("LastEditDateTime", &timestamp)?;
        self.text_element("MzValues", &encode_f64_array(&mz))?;
        self.text_element("Origin", &origin)?;
        self.text_element("Owner", "")?;
        self.text_element("ScanType", "Scan")?;
        self.end("Spectrum")
    }

    /// Number of compounds written so far
    pub fn compound_count(&self) -> u32 {
        self.compound_count
    }

    /// Close the root element and return the sink.
    pub fn finish(mut self) -> Result<W, ExportError> {
        self.end("LibraryDataSet")?;
        let mut inner = self.handle.into_inner();
        inner.write_all(b"\n")?;
        inner.flush()?;
        Ok(inner)
    }

    fn start(&mut self, name: &str) -> Result<(), ExportError> {
        self.handle.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.handle.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), ExportError> {
        if text.is_empty() {
            self.handle.write_event(Event::Empty(BytesStart::new(name)))?;
            return Ok(());
        }
        self.start(name)?;
        self.handle.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }
}

/// Write all entries as a library document, returning the number written.
pub fn write_library<'a, W, I>(
    inner: W,
    entries: I,
    options: &ExportOptions,
    created: &DateTime<FixedOffset>,
) -> Result<u32, ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a MergedCompoundEntry>,
{
    let mut writer = LibraryWriter::new(inner, options.clone(), created)?;
    for entry in entries {
        writer.write_entry(entry)?;
    }
    let count = writer.compound_count();
    writer.finish()?;
    Ok(count)
}

/// Write all entries to a library file.
pub fn write_library_file<'a, P, I>(
    path: P,
    entries: I,
    options: &ExportOptions,
    created: &DateTime<FixedOffset>,
) -> Result<u32, ExportError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a MergedCompoundEntry>,
{
    let file = File::create(path)?;
    write_library(BufWriter::new(file), entries, options, created)
}
