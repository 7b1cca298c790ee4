//! Reader and writer for LAMMPS data files.
//!
//! A [`Registry`] holds one [`key::Key`] per requested [`Name`] together with
//! the Counters those Keys depend on. [`Decoder`] fills it from text and
//! validates it; [`Encoder`] propagates table sizes into Counters, validates and
//! writes the sections in canonical order.
//!
//! ```no_run
//! use lmpsdat_core::{AtomStyle, Name, decode_str};
//!
//! let registry = decode_str(&[Name::Title, Name::Atoms], AtomStyle::Full, "...")?;
//! let atoms = registry.value(Name::Atoms)?;
//! # Ok::<(), lmpsdat_core::CodecError>(())
//! ```

pub mod config;
pub mod decode;
pub mod domain;
pub mod encode;
pub mod key;
pub mod registry;
pub mod schema;
pub mod serialization;

pub use config::{CodecConfig, FloatFormat};
pub use decode::{DecodeState, Decoder};
pub use domain::{
    AtomRecord, BindingError, Bounds, CodecError, CodecResult, Document, ErrorKind, KeyError,
    KeyKind, KeyResult, LinkRecord, Name, Value, ValueShape,
};
pub use encode::Encoder;
pub use key::{AtomStyle, Key};
pub use registry::{Diagnostic, Registry};
pub use schema::{FieldBinding, Schema};

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Write};
use std::path::Path;

/// Builds a Registry for `requested`, fills it from `reader` and validates it.
pub fn decode<R: BufRead>(
    requested: &[Name],
    atom_style: AtomStyle,
    reader: R,
) -> CodecResult<Registry> {
    let mut registry = Registry::build(requested, atom_style)?;
    Decoder::new(reader).decode(&mut registry)?;
    Ok(registry)
}

pub fn decode_str(requested: &[Name], atom_style: AtomStyle, text: &str) -> CodecResult<Registry> {
    decode(requested, atom_style, Cursor::new(text))
}

pub fn encode<W: Write>(registry: &mut Registry, writer: W) -> CodecResult<W> {
    Encoder::new(writer).encode(registry)
}

pub fn encode_to_string(registry: &mut Registry, config: &CodecConfig) -> CodecResult<String> {
    let bytes = Encoder::new(Vec::new())
        .with_config(config)
        .encode(registry)?;
    String::from_utf8(bytes)
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error).into())
}

pub fn read_data_file(
    path: impl AsRef<Path>,
    requested: &[Name],
    atom_style: AtomStyle,
) -> CodecResult<Registry> {
    let file = File::open(path.as_ref())?;
    decode(requested, atom_style, BufReader::new(file))
}

/// Encodes `registry` and writes it to `path` with `\n` line endings.
pub fn write_data_file(
    path: impl AsRef<Path>,
    registry: &mut Registry,
    config: &CodecConfig,
) -> CodecResult<()> {
    let content = encode_to_string(registry, config)?;
    serialization::write_data_text(path.as_ref(), &content)?;
    Ok(())
}
