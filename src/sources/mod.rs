//! Message sources — where raw export messages come from.
//!
//! Sources only load and decode. Normalization and classification live in
//! `pipeline`.

pub mod export_file;

pub use export_file::ExportFileSource;
