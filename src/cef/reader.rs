//! Streaming CEF reader built on quick-xml.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::CefError;
use crate::compound::{CompoundRecord, Peak, MAX_NOMINAL_MZ};

/// Pull-based reader yielding one [`CompoundRecord`] per `Compound` element.
pub struct CefReader<R: BufRead> {
    reader: Reader<R>,
    source_file: String,
    compound_index: usize,
    depth: usize,
    seen_root: bool,
    finished: bool,
}

impl CefReader<BufReader<File>> {
    /// Open a CEF file. Records are tagged with the file's base name.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CefError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(BufReader::new(file), source_file))
    }
}

impl<R: BufRead> CefReader<R> {
    /// Create a reader over any buffered source
    pub fn new(reader: R, source_file: impl Into<String>) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);

        Self {
            reader: xml_reader,
            source_file: source_file.into(),
            compound_index: 0,
            depth: 0,
            seen_root: false,
            finished: false,
        }
    }

    /// Name attached to records as their provenance
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Read the next compound.
    ///
    /// A [`CefError::MalformedRecord`] only concerns the compound just read and
    /// the reader can be called again; any other error is terminal.
    pub fn next_compound(&mut self) -> Result<Option<CompoundRecord>, CefError> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    self.finished = true;
                    return Err(CefError::XmlError(e));
                }
            };
            match event {
                Event::Start(e) => {
                    self.depth += 1;
                    self.seen_root = true;
                    if e.local_name().as_ref() == b"Compound" {
                        return self.read_compound(false).map(Some);
                    }
                }
                Event::Empty(e) => {
                    self.seen_root = true;
                    if e.local_name().as_ref() == b"Compound" {
                        return self.read_compound(true).map(Some);
                    }
                }
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                }
                Event::Eof => {
                    self.finished = true;
                    if !self.seen_root {
                        return Err(CefError::UnreadableSource(
                            "document has no root element".to_string(),
                        ));
                    }
                    if self.depth != 0 {
                        return Err(CefError::UnreadableSource(
                            "unexpected end of document".to_string(),
                        ));
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    /// Consume one `Compound` element whose start tag was just read.
    fn read_compound(&mut self, empty: bool) -> Result<CompoundRecord, CefError> {
        let index = self.compound_index;
        self.compound_index += 1;

        let decoder = self.reader.decoder();
        let mut draft = CompoundDraft::default();
        if !empty {
            let mut depth = 1;
            let mut buf = Vec::new();
            loop {
                buf.clear();
                let event = match self.reader.read_event_into(&mut buf) {
                    Ok(event) => event,
                    Err(e) => {
                        self.finished = true;
                        return Err(CefError::XmlError(e));
                    }
                };
                let step = match event {
                    Event::Start(e) => {
                        depth += 1;
                        let step = draft.open(&e, depth, false, decoder);
                        draft.stack.push(e.local_name().as_ref().to_vec());
                        step
                    }
                    Event::Empty(e) => draft.open(&e, depth + 1, true, decoder),
                    Event::End(_) => {
                        if depth == 1 {
                            break;
                        }
                        draft.close(depth);
                        depth -= 1;
                        Ok(())
                    }
                    Event::Eof => Err(CefError::UnreadableSource(format!(
                        "unexpected end of document inside compound #{index}"
                    ))),
                    _ => Ok(()),
                };
                if let Err(e) = step {
                    self.finished = true;
                    return Err(e);
                }
            }
            self.depth = self.depth.saturating_sub(1);
        }

        draft.finish(index, &self.source_file)
    }
}

impl<R: BufRead> Iterator for CefReader<R> {
    type Item = Result<CompoundRecord, CefError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_compound() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Everything read from one CEF file
#[derive(Debug)]
pub struct CefFile {
    /// Base name of the file
    pub source_file: String,
    /// Well-formed compounds in document order
    pub records: Vec<CompoundRecord>,
    /// Compounds that were skipped, as [`CefError::MalformedRecord`] values
    pub malformed: Vec<CefError>,
}

/// Read a whole CEF file, separating usable compounds from malformed ones.
///
/// Fails only when the file itself cannot be read or is not well-formed XML;
/// in that case none of its compounds are returned.
pub fn read_cef_file<P: AsRef<Path>>(path: P) -> Result<CefFile, CefError> {
    let mut reader = CefReader::open(path.as_ref())?;
    let mut records = Vec::new();
    let mut malformed = Vec::new();

    while !reader.finished {
        match reader.next_compound() {
            Ok(Some(record)) => records.push(record),
            Ok(None) => break,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("{}: skipping {}", reader.source_file(), e);
                malformed.push(e);
            }
        }
    }

    debug!(
        "{}: {} compounds read, {} skipped",
        reader.source_file(),
        records.len(),
        malformed.len()
    );

    Ok(CefFile {
        source_file: reader.source_file,
        records,
        malformed,
    })
}

/// Tracks a "first matching element" capture within a compound.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Capture {
    #[default]
    Pending,
    Open(usize),
    Done,
}

impl Capture {
    /// Claim this element if nothing was captured yet.
    fn begin(&mut self, depth: usize, empty: bool) -> bool {
        if *self != Capture::Pending {
            return false;
        }
        *self = if empty { Capture::Done } else { Capture::Open(depth) };
        true
    }

    fn close(&mut self, depth: usize) {
        if *self == Capture::Open(depth) {
            *self = Capture::Done;
        }
    }

    fn is_open(&self) -> bool {
        matches!(self, Capture::Open(_))
    }
}

/// Values collected while walking one `Compound` subtree.
#[derive(Debug, Default)]
struct CompoundDraft {
    stack: Vec<Vec<u8>>,
    location: Capture,
    molecule: Capture,
    database: Capture,
    accession_seen: bool,
    spectrum: Capture,
    ms_peaks: Capture,
    chemical_name: Option<String>,
    formula: Option<String>,
    cas_number: Option<String>,
    retention_time: Option<f64>,
    retention_index: f64,
    max_area: f64,
    peaks: Vec<Peak>,
    problem: Option<String>,
}

impl CompoundDraft {
    /// Handle a start or empty tag at `depth` (the compound itself is depth 1).
    ///
    /// Invalid values are remembered as the compound's problem; only XML-level
    /// failures are returned.
    fn open(&mut self, e: &BytesStart, depth: usize, empty: bool, decoder: Decoder) -> Result<(), CefError> {
        match e.local_name().as_ref() {
            b"Location" => {
                if self.location.begin(depth, empty) {
                    self.read_location(e, decoder)?;
                }
            }
            b"Molecule" => {
                if self.in_results() && self.molecule.begin(depth, empty) {
                    self.chemical_name = get_attribute(e, "name", decoder)?;
                    self.formula = get_attribute(e, "formula", decoder)?;
                }
            }
            b"Database" => {
                if self.molecule.is_open() {
                    self.database.begin(depth, empty);
                }
            }
            b"Accession" => {
                if self.database.is_open() && !self.accession_seen {
                    self.accession_seen = true;
                    self.cas_number = get_attribute(e, "id", decoder)?;
                }
            }
            b"Spectrum" => {
                self.spectrum.begin(depth, empty);
            }
            b"MSPeaks" => {
                if self.spectrum.is_open() {
                    self.ms_peaks.begin(depth, empty);
                }
            }
            b"p" => {
                if self.ms_peaks.is_open() {
                    self.read_peak(e, decoder)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, depth: usize) {
        self.stack.pop();
        for capture in [
            &mut self.location,
            &mut self.molecule,
            &mut self.database,
            &mut self.spectrum,
            &mut self.ms_peaks,
        ] {
            capture.close(depth);
        }
    }

    fn in_results(&self) -> bool {
        self.stack.iter().any(|name| name.as_slice() == b"Results")
    }

    fn read_location(&mut self, e: &BytesStart, decoder: Decoder) -> Result<(), CefError> {
        match get_attribute(e, "rt", decoder)? {
            Some(value) => match parse_number(&value, "rt") {
                Ok(rt) if rt < 0.0 => self.fail(format!("negative retention time {rt}")),
                Ok(rt) => self.retention_time = Some(rt),
                Err(reason) => self.fail(reason),
            },
            None => self.fail("Location has no rt attribute"),
        }

        if let Some(value) = get_attribute(e, "ri", decoder)? {
            match parse_number(&value, "ri") {
                Ok(ri) => self.retention_index = ri,
                Err(reason) => self.fail(reason),
            }
        }

        if let Some(value) = get_attribute(e, "a", decoder)? {
            match parse_number(&value, "a") {
                Ok(area) => self.max_area = area,
                Err(reason) => self.fail(reason),
            }
        }
        Ok(())
    }

    fn read_peak(&mut self, e: &BytesStart, decoder: Decoder) -> Result<(), CefError> {
        let x = get_attribute(e, "x", decoder)?;
        let y = get_attribute(e, "y", decoder)?;
        let (Some(x), Some(y)) = (x, y) else {
            self.fail("peak without x or y attribute");
            return Ok(());
        };

        let mz = match parse_number(&x, "x") {
            Ok(mz) => mz.round_ties_even(),
            Err(reason) => {
                self.fail(reason);
                return Ok(());
            }
        };
        if mz < 0.0 || mz > MAX_NOMINAL_MZ as f64 {
            self.fail(format!("m/z {x} out of range 0..={MAX_NOMINAL_MZ}"));
            return Ok(());
        }

        match parse_number(&y, "y") {
            Ok(intensity) if intensity < 0.0 => self.fail(format!("negative intensity {intensity}")),
            Ok(intensity) => self.peaks.push(Peak::new(mz as u32, intensity)),
            Err(reason) => self.fail(reason),
        }
        Ok(())
    }

    fn fail(&mut self, reason: impl Into<String>) {
        if self.problem.is_none() {
            self.problem = Some(reason.into());
        }
    }

    fn finish(self, index: usize, source_file: &str) -> Result<CompoundRecord, CefError> {
        if let Some(reason) = self.problem {
            return Err(CefError::malformed(index, reason));
        }
        let Some(retention_time) = self.retention_time else {
            return Err(CefError::malformed(index, "missing retention time"));
        };
        if self.peaks.is_empty() {
            return Err(CefError::malformed(index, "no spectrum peaks"));
        }

        Ok(CompoundRecord {
            chemical_name: self.chemical_name,
            formula: self.formula,
            cas_number: self.cas_number,
            retention_time,
            retention_index: self.retention_index,
            max_area: self.max_area,
            peaks: self.peaks,
            source_file: source_file.to_string(),
        })
    }
}

/// Helper function to get an unescaped attribute value from a BytesStart
fn get_attribute(e: &BytesStart, name: &str, decoder: Decoder) -> Result<Option<String>, CefError> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.decode_and_unescape_value(decoder)?.into_owned())),
        None => Ok(None),
    }
}

fn parse_number(value: &str, attribute: &str) -> Result<f64, String> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("invalid {attribute} value {value:?}")),
    }
}
