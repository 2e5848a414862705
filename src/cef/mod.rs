//! # CEF Reader Module
//!
//! This module reads Compound Exchange Format (CEF) files, the XML dialect in
//! which vendor deconvolution software reports detected compounds together
//! with their identification results and centroided spectra.
//!
//! ## CEF Structure
//!
//! ```text
//! CEF
//! └── CompoundList
//!     └── Compound* (many)
//!         ├── Location (rt, ri, a = area, y = height)
//!         ├── Results (optional)
//!         │   └── Molecule (name, formula)
//!         │       └── Database
//!         │           └── Accession (id = CAS number)
//!         └── Spectrum
//!             └── MSPeaks
//!                 └── p* (x = m/z, y = intensity)
//! ```
//!
//! Only the first `Location`, `Molecule`, `Accession` and `Spectrum` of a
//! compound are used. A compound without a retention time or without peaks is
//! reported as [`CefError::MalformedRecord`] and the reader moves on to the
//! next compound; any XML-level failure ends the file.

mod error;
mod reader;

#[cfg(test)]
mod tests;

pub use error::CefError;
pub use reader::{read_cef_file, CefFile, CefReader};

/// File extension (case-insensitive) recognised as a CEF source
pub const CEF_EXTENSION: &str = "cef";
