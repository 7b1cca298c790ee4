use super::lines::{parse_float, parse_int};
use crate::config::FloatFormat;
use crate::domain::{AtomRecord, KeyError, KeyResult};
use crate::serialization::format_float;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::io::Write;

/// Column layout of one Atoms row (after the atom identifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomStyle {
    #[default]
    Full,
    Atomic,
    Charge,
    Molecular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomColumn {
    Molecule,
    AtomType,
    Charge,
    X,
    Y,
    Z,
}

impl AtomColumn {
    const fn label(self) -> &'static str {
        match self {
            Self::Molecule => "molecule tag",
            Self::AtomType => "atom type",
            Self::Charge => "charge",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

const FULL_COLUMNS: [AtomColumn; 6] = [
    AtomColumn::Molecule,
    AtomColumn::AtomType,
    AtomColumn::Charge,
    AtomColumn::X,
    AtomColumn::Y,
    AtomColumn::Z,
];
const ATOMIC_COLUMNS: [AtomColumn; 4] =
    [AtomColumn::AtomType, AtomColumn::X, AtomColumn::Y, AtomColumn::Z];
const CHARGE_COLUMNS: [AtomColumn; 5] = [
    AtomColumn::AtomType,
    AtomColumn::Charge,
    AtomColumn::X,
    AtomColumn::Y,
    AtomColumn::Z,
];
const MOLECULAR_COLUMNS: [AtomColumn; 5] = [
    AtomColumn::Molecule,
    AtomColumn::AtomType,
    AtomColumn::X,
    AtomColumn::Y,
    AtomColumn::Z,
];

const IMAGE_FIELDS: usize = 3;

impl AtomStyle {
    pub const ALL: [AtomStyle; 4] = [Self::Full, Self::Atomic, Self::Charge, Self::Molecular];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Atomic => "atomic",
            Self::Charge => "charge",
            Self::Molecular => "molecular",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.as_str() == text)
    }

    pub const fn columns(self) -> &'static [AtomColumn] {
        match self {
            Self::Full => &FULL_COLUMNS,
            Self::Atomic => &ATOMIC_COLUMNS,
            Self::Charge => &CHARGE_COLUMNS,
            Self::Molecular => &MOLECULAR_COLUMNS,
        }
    }

    /// Field count of a row without image flags, identifier included.
    pub const fn min_fields(self) -> usize {
        self.columns().len() + 1
    }

    /// Field count of a row carrying the trailing `nx ny nz` image flags.
    pub const fn max_fields(self) -> usize {
        self.min_fields() + IMAGE_FIELDS
    }

    pub fn decode_row(self, fields: &[&str], line: usize) -> KeyResult<(i64, AtomRecord)> {
        let has_image = if fields.len() == self.min_fields() {
            false
        } else if fields.len() == self.max_fields() {
            true
        } else {
            return Err(KeyError::malformed(
                line,
                format!(
                    "atom style '{}' expects {} or {} fields, found {}",
                    self,
                    self.min_fields(),
                    self.max_fields(),
                    fields.len()
                ),
            ));
        };

        let id = parse_int(fields[0], line, "atom id")?;
        let mut record = AtomRecord::default();
        for (column, token) in self.columns().iter().zip(&fields[1..]) {
            match column {
                AtomColumn::Molecule => record.molecule = parse_int(token, line, column.label())?,
                AtomColumn::AtomType => record.atom_type = parse_int(token, line, column.label())?,
                AtomColumn::Charge => record.charge = parse_float(token, line, column.label())?,
                AtomColumn::X => record.position[0] = parse_float(token, line, column.label())?,
                AtomColumn::Y => record.position[1] = parse_float(token, line, column.label())?,
                AtomColumn::Z => record.position[2] = parse_float(token, line, column.label())?,
            }
        }

        if has_image {
            let image = &fields[self.min_fields()..];
            record.image = Some([
                parse_int(image[0], line, "image flag nx")?,
                parse_int(image[1], line, "image flag ny")?,
                parse_int(image[2], line, "image flag nz")?,
            ]);
        }

        Ok((id, record))
    }

    /// Writes one complete row, identifier first and newline last.
    pub fn encode_row<W: Write>(
        self,
        writer: &mut W,
        id: i64,
        record: &AtomRecord,
        format: FloatFormat,
    ) -> std::io::Result<()> {
        write!(writer, "{}", id)?;
        for column in self.columns() {
            match column {
                AtomColumn::Molecule => write!(writer, " {}", record.molecule)?,
                AtomColumn::AtomType => write!(writer, " {}", record.atom_type)?,
                AtomColumn::Charge => write!(writer, " {}", format_float(record.charge, format))?,
                AtomColumn::X => write!(writer, " {}", format_float(record.position[0], format))?,
                AtomColumn::Y => write!(writer, " {}", format_float(record.position[1], format))?,
                AtomColumn::Z => write!(writer, " {}", format_float(record.position[2], format))?,
            }
        }
        if let Some([nx, ny, nz]) = record.image {
            write!(writer, " {} {} {}", nx, ny, nz)?;
        }
        writeln!(writer)
    }
}

impl Display for AtomStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}
