pub mod errors;

pub use errors::{BindingError, CodecError, CodecResult, ErrorKind, KeyError, KeyResult};

use crate::key::AtomStyle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Identifier of one section or header field of a data file.
///
/// The textual form returned by [`Name::as_str`] is exactly what appears in the
/// file, so it is case-sensitive: `atoms` is the atom count, `Atoms` the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Name {
    #[serde(rename = "Title")]
    Title,
    #[serde(rename = "atoms")]
    AtomCount,
    #[serde(rename = "bonds")]
    BondCount,
    #[serde(rename = "angles")]
    AngleCount,
    #[serde(rename = "dihedrals")]
    DihedralCount,
    #[serde(rename = "impropers")]
    ImproperCount,
    #[serde(rename = "atom types")]
    AtomTypes,
    #[serde(rename = "bond types")]
    BondTypes,
    #[serde(rename = "angle types")]
    AngleTypes,
    #[serde(rename = "dihedral types")]
    DihedralTypes,
    #[serde(rename = "improper types")]
    ImproperTypes,
    #[serde(rename = "xlo xhi")]
    XBounds,
    #[serde(rename = "ylo yhi")]
    YBounds,
    #[serde(rename = "zlo zhi")]
    ZBounds,
    #[serde(rename = "Masses")]
    Masses,
    #[serde(rename = "Pair Coeffs")]
    PairCoeffs,
    #[serde(rename = "Bond Coeffs")]
    BondCoeffs,
    #[serde(rename = "Angle Coeffs")]
    AngleCoeffs,
    #[serde(rename = "Dihedral Coeffs")]
    DihedralCoeffs,
    #[serde(rename = "Improper Coeffs")]
    ImproperCoeffs,
    #[serde(rename = "Atoms")]
    Atoms,
    #[serde(rename = "Bonds")]
    Bonds,
    #[serde(rename = "Angles")]
    Angles,
    #[serde(rename = "Dihedrals")]
    Dihedrals,
    #[serde(rename = "Impropers")]
    Impropers,
}

impl Name {
    pub const ALL: [Name; 25] = [
        Self::Title,
        Self::AtomCount,
        Self::BondCount,
        Self::AngleCount,
        Self::DihedralCount,
        Self::ImproperCount,
        Self::AtomTypes,
        Self::BondTypes,
        Self::AngleTypes,
        Self::DihedralTypes,
        Self::ImproperTypes,
        Self::XBounds,
        Self::YBounds,
        Self::ZBounds,
        Self::Masses,
        Self::PairCoeffs,
        Self::BondCoeffs,
        Self::AngleCoeffs,
        Self::DihedralCoeffs,
        Self::ImproperCoeffs,
        Self::Atoms,
        Self::Bonds,
        Self::Angles,
        Self::Dihedrals,
        Self::Impropers,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::AtomCount => "atoms",
            Self::BondCount => "bonds",
            Self::AngleCount => "angles",
            Self::DihedralCount => "dihedrals",
            Self::ImproperCount => "impropers",
            Self::AtomTypes => "atom types",
            Self::BondTypes => "bond types",
            Self::AngleTypes => "angle types",
            Self::DihedralTypes => "dihedral types",
            Self::ImproperTypes => "improper types",
            Self::XBounds => "xlo xhi",
            Self::YBounds => "ylo yhi",
            Self::ZBounds => "zlo zhi",
            Self::Masses => "Masses",
            Self::PairCoeffs => "Pair Coeffs",
            Self::BondCoeffs => "Bond Coeffs",
            Self::AngleCoeffs => "Angle Coeffs",
            Self::DihedralCoeffs => "Dihedral Coeffs",
            Self::ImproperCoeffs => "Improper Coeffs",
            Self::Atoms => "Atoms",
            Self::Bonds => "Bonds",
            Self::Angles => "Angles",
            Self::Dihedrals => "Dihedrals",
            Self::Impropers => "Impropers",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.as_str() == text)
    }

    pub const fn kind(self) -> KeyKind {
        match self {
            Self::Title => KeyKind::Title,
            Self::AtomCount
            | Self::BondCount
            | Self::AngleCount
            | Self::DihedralCount
            | Self::ImproperCount
            | Self::AtomTypes
            | Self::BondTypes
            | Self::AngleTypes
            | Self::DihedralTypes
            | Self::ImproperTypes => KeyKind::Counter,
            Self::XBounds | Self::YBounds | Self::ZBounds => KeyKind::BoxDimension,
            Self::Masses => KeyKind::Masses,
            Self::PairCoeffs
            | Self::BondCoeffs
            | Self::AngleCoeffs
            | Self::DihedralCoeffs
            | Self::ImproperCoeffs => KeyKind::Coeffs,
            Self::Atoms => KeyKind::Atoms,
            Self::Bonds | Self::Angles | Self::Dihedrals | Self::Impropers => KeyKind::Links,
        }
    }

    pub const fn shape(self) -> ValueShape {
        self.kind().shape()
    }

    /// Names whose Keys must exist, and be wired, before this Name's Key.
    pub const fn dependencies(self) -> &'static [Name] {
        match self {
            Self::Masses | Self::PairCoeffs => &[Self::AtomTypes],
            Self::BondCoeffs => &[Self::BondTypes],
            Self::AngleCoeffs => &[Self::AngleTypes],
            Self::DihedralCoeffs => &[Self::DihedralTypes],
            Self::ImproperCoeffs => &[Self::ImproperTypes],
            Self::Atoms => &[Self::AtomCount, Self::AtomTypes],
            Self::Bonds => &[Self::AtomCount, Self::BondCount, Self::BondTypes],
            Self::Angles => &[Self::AtomCount, Self::AngleCount, Self::AngleTypes],
            Self::Dihedrals => &[Self::AtomCount, Self::DihedralCount, Self::DihedralTypes],
            Self::Impropers => &[Self::AtomCount, Self::ImproperCount, Self::ImproperTypes],
            _ => &[],
        }
    }

    /// The type-count Counter that bounds the type column of a Coeffs or Links table.
    pub const fn type_counter(self) -> Option<Name> {
        match self {
            Self::Masses | Self::PairCoeffs => Some(Self::AtomTypes),
            Self::BondCoeffs | Self::Bonds => Some(Self::BondTypes),
            Self::AngleCoeffs | Self::Angles => Some(Self::AngleTypes),
            Self::DihedralCoeffs | Self::Dihedrals => Some(Self::DihedralTypes),
            Self::ImproperCoeffs | Self::Impropers => Some(Self::ImproperTypes),
            _ => None,
        }
    }

    /// The row-count Counter of a Links table.
    pub const fn count_counter(self) -> Option<Name> {
        match self {
            Self::Bonds => Some(Self::BondCount),
            Self::Angles => Some(Self::AngleCount),
            Self::Dihedrals => Some(Self::DihedralCount),
            Self::Impropers => Some(Self::ImproperCount),
            _ => None,
        }
    }

    /// Number of atom identifiers carried by one row of a Links table.
    pub const fn link_arity(self) -> Option<usize> {
        match self {
            Self::Bonds => Some(2),
            Self::Angles => Some(3),
            Self::Dihedrals | Self::Impropers => Some(4),
            _ => None,
        }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Title,
    Counter,
    BoxDimension,
    Masses,
    Coeffs,
    Atoms,
    Links,
}

impl KeyKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Counter => "Counter",
            Self::BoxDimension => "BoxDimension",
            Self::Masses => "Masses",
            Self::Coeffs => "Coeffs",
            Self::Atoms => "Atoms",
            Self::Links => "Links",
        }
    }

    pub const fn shape(self) -> ValueShape {
        match self {
            Self::Title => ValueShape::Text,
            Self::Counter => ValueShape::Count,
            Self::BoxDimension => ValueShape::Bounds,
            Self::Masses => ValueShape::Masses,
            Self::Coeffs => ValueShape::Coeffs,
            Self::Atoms => ValueShape::Atoms,
            Self::Links => ValueShape::Links,
        }
    }

    /// Scalar Keys decoded entirely from their header line.
    pub const fn is_header(self) -> bool {
        matches!(self, Self::Counter | Self::BoxDimension)
    }

    pub const fn is_table(self) -> bool {
        matches!(self, Self::Masses | Self::Coeffs | Self::Atoms | Self::Links)
    }
}

impl Display for KeyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Text,
    Count,
    Bounds,
    Masses,
    Coeffs,
    Atoms,
    Links,
}

impl ValueShape {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Count => "integer",
            Self::Bounds => "float pair",
            Self::Masses => "type -> mass map",
            Self::Coeffs => "type -> coefficients map",
            Self::Atoms => "id -> atom record map",
            Self::Links => "id -> link record map",
        }
    }
}

impl Display for ValueShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub lo: f64,
    pub hi: f64,
}

impl Bounds {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn length(&self) -> f64 {
        self.hi - self.lo
    }
}

/// One row of the Atoms table, without its identifier.
///
/// Which of `molecule` and `charge` are meaningful depends on the atom style;
/// columns a style does not carry keep their default of zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AtomRecord {
    #[serde(default)]
    pub molecule: i64,
    pub atom_type: i64,
    #[serde(default)]
    pub charge: f64,
    pub position: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<[i64; 3]>,
}

impl AtomRecord {
    pub fn new(atom_type: i64, position: [f64; 3]) -> Self {
        Self {
            atom_type,
            position,
            ..Self::default()
        }
    }

    pub fn with_molecule(mut self, molecule: i64) -> Self {
        self.molecule = molecule;
        self
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_image(mut self, image: [i64; 3]) -> Self {
        self.image = Some(image);
        self
    }
}

/// One row of a Bonds/Angles/Dihedrals/Impropers table, without its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(rename = "type")]
    pub link_type: i64,
    pub atoms: Vec<i64>,
}

impl LinkRecord {
    pub fn new(link_type: i64, atoms: impl Into<Vec<i64>>) -> Self {
        Self {
            link_type,
            atoms: atoms.into(),
        }
    }
}

/// The value exchanged with a Key through `assign`/`value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Count(i64),
    Bounds(Bounds),
    Masses(BTreeMap<i64, f64>),
    Coeffs(BTreeMap<i64, Vec<f64>>),
    Atoms(BTreeMap<i64, AtomRecord>),
    Links(BTreeMap<i64, LinkRecord>),
}

impl Value {
    pub const fn shape(&self) -> ValueShape {
        match self {
            Self::Text(_) => ValueShape::Text,
            Self::Count(_) => ValueShape::Count,
            Self::Bounds(_) => ValueShape::Bounds,
            Self::Masses(_) => ValueShape::Masses,
            Self::Coeffs(_) => ValueShape::Coeffs,
            Self::Atoms(_) => ValueShape::Atoms,
            Self::Links(_) => ValueShape::Links,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<i64> {
        match self {
            Self::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub fn as_bounds(&self) -> Option<Bounds> {
        match self {
            Self::Bounds(bounds) => Some(*bounds),
            _ => None,
        }
    }

    pub fn as_masses(&self) -> Option<&BTreeMap<i64, f64>> {
        match self {
            Self::Masses(masses) => Some(masses),
            _ => None,
        }
    }

    pub fn as_coeffs(&self) -> Option<&BTreeMap<i64, Vec<f64>>> {
        match self {
            Self::Coeffs(coeffs) => Some(coeffs),
            _ => None,
        }
    }

    pub fn as_atoms(&self) -> Option<&BTreeMap<i64, AtomRecord>> {
        match self {
            Self::Atoms(atoms) => Some(atoms),
            _ => None,
        }
    }

    pub fn as_links(&self) -> Option<&BTreeMap<i64, LinkRecord>> {
        match self {
            Self::Links(links) => Some(links),
            _ => None,
        }
    }

    pub fn into_text(self) -> KeyResult<String> {
        match self {
            Self::Text(text) => Ok(text),
            other => Err(KeyError::type_mismatch(ValueShape::Text, &other)),
        }
    }

    pub fn into_count(self) -> KeyResult<i64> {
        match self {
            Self::Count(count) => Ok(count),
            other => Err(KeyError::type_mismatch(ValueShape::Count, &other)),
        }
    }

    pub fn into_bounds(self) -> KeyResult<Bounds> {
        match self {
            Self::Bounds(bounds) => Ok(bounds),
            other => Err(KeyError::type_mismatch(ValueShape::Bounds, &other)),
        }
    }

    pub fn into_masses(self) -> KeyResult<BTreeMap<i64, f64>> {
        match self {
            Self::Masses(masses) => Ok(masses),
            other => Err(KeyError::type_mismatch(ValueShape::Masses, &other)),
        }
    }

    pub fn into_coeffs(self) -> KeyResult<BTreeMap<i64, Vec<f64>>> {
        match self {
            Self::Coeffs(coeffs) => Ok(coeffs),
            other => Err(KeyError::type_mismatch(ValueShape::Coeffs, &other)),
        }
    }

    pub fn into_atoms(self) -> KeyResult<BTreeMap<i64, AtomRecord>> {
        match self {
            Self::Atoms(atoms) => Ok(atoms),
            other => Err(KeyError::type_mismatch(ValueShape::Atoms, &other)),
        }
    }

    pub fn into_links(self) -> KeyResult<BTreeMap<i64, LinkRecord>> {
        match self {
            Self::Links(links) => Ok(links),
            other => Err(KeyError::type_mismatch(ValueShape::Links, &other)),
        }
    }
}

/// Host-neutral snapshot of a filled Registry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub atom_style: AtomStyle,
    pub values: BTreeMap<Name, Value>,
}

impl Document {
    pub fn new(atom_style: AtomStyle) -> Self {
        Self {
            atom_style,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, name: Name, value: Value) -> Self {
        self.values.insert(name, value);
        self
    }

    pub fn get(&self, name: Name) -> Option<&Value> {
        self.values.get(&name)
    }

    pub fn to_json_pretty(&self) -> CodecResult<String> {
        serde_json::to_string_pretty(self).map_err(CodecError::from)
    }

    pub fn from_json_str(source: &str) -> CodecResult<Self> {
        serde_json::from_str(source).map_err(CodecError::from)
    }
}
