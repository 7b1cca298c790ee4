//! Section codecs: one [`Key`] per Name of a data file.
//!
//! Table Keys reach the Counters they depend on through typed [`CounterRef`]s
//! into the owning Registry's arena, never through owned copies, so every
//! dependent of a Counter reads and writes the same instance.

pub mod atom_style;
pub mod lines;

mod atoms;
mod bounds;
mod coeffs;
mod counter;
mod links;
mod masses;
mod title;

pub use atom_style::{AtomColumn, AtomStyle};
pub use atoms::AtomsKey;
pub use bounds::BoundsKey;
pub use coeffs::CoeffsKey;
pub use counter::CounterKey;
pub use lines::{Line, LineSource};
pub use links::LinksKey;
pub use masses::MassesKey;
pub use title::TitleKey;

use crate::config::FloatFormat;
use crate::domain::{KeyError, KeyKind, KeyResult, Name, Value};
use std::io::{BufRead, Write};

/// Arena position and identity of a Key offered as a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRef {
    slot: usize,
    name: Name,
    kind: KeyKind,
}

impl DependencyRef {
    pub fn new(slot: usize, key: &Key) -> Self {
        Self {
            slot,
            name: key.name(),
            kind: key.kind(),
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }
}

/// A wired reference to a Counter Key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterRef {
    slot: usize,
    name: Name,
}

impl CounterRef {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn name(&self) -> Name {
        self.name
    }
}

/// Read access to the current values of the Counters a Key depends on.
pub trait CounterValues {
    fn counter_value(&self, counter: CounterRef) -> Option<i64>;
}

impl CounterValues for [Key] {
    fn counter_value(&self, counter: CounterRef) -> Option<i64> {
        match self.get(counter.slot)? {
            Key::Counter(key) if key.name() == counter.name => Some(key.count()),
            _ => None,
        }
    }
}

/// Checks that `deps` are exactly the Counters named by `roles`, returned in role order.
pub(crate) fn expect_dependencies(
    key: Name,
    deps: &[DependencyRef],
    roles: &[Name],
) -> KeyResult<Vec<CounterRef>> {
    if let Some(other) = deps.iter().find(|dep| dep.kind != KeyKind::Counter) {
        return Err(KeyError::arity(
            key,
            format!("'{}' is a {} key, expected a Counter", other.name, other.kind),
        ));
    }
    if deps.len() != roles.len() {
        return Err(KeyError::arity(
            key,
            format!("expected {} dependencies, got {}", roles.len(), deps.len()),
        ));
    }

    roles
        .iter()
        .map(|role| {
            deps.iter()
                .find(|dep| dep.name == *role)
                .map(|dep| CounterRef {
                    slot: dep.slot,
                    name: dep.name,
                })
                .ok_or_else(|| KeyError::arity(key, format!("'{}' was not supplied", role)))
        })
        .collect()
}

pub(crate) fn expect_no_dependencies(key: Name, deps: &[DependencyRef]) -> KeyResult<()> {
    if deps.is_empty() {
        Ok(())
    } else {
        Err(KeyError::arity(
            key,
            format!("accepts no dependencies, got {}", deps.len()),
        ))
    }
}

/// Current value of a wired dependency, or `MissingDependency` naming `role`.
pub(crate) fn required<C: CounterValues + ?Sized>(
    counts: &C,
    counter: Option<CounterRef>,
    role: Name,
) -> KeyResult<i64> {
    counter
        .and_then(|counter| counts.counter_value(counter))
        .ok_or(KeyError::MissingDependency(role))
}

pub(crate) fn wired(counter: Option<CounterRef>, role: Name) -> KeyResult<CounterRef> {
    counter.ok_or(KeyError::MissingDependency(role))
}

pub(crate) fn check_range(field: &'static str, id: i64, value: i64, max: i64) -> KeyResult<()> {
    if value < 1 || value > max {
        return Err(KeyError::RangeViolation {
            field,
            id,
            value,
            max,
        });
    }
    Ok(())
}

pub(crate) fn check_count(expected: i64, found: usize) -> KeyResult<()> {
    if i64::try_from(found).ok() != Some(expected) {
        return Err(KeyError::CountMismatch { expected, found });
    }
    Ok(())
}

pub(crate) fn row_total(rows: usize) -> i64 {
    i64::try_from(rows).unwrap_or(i64::MAX)
}

/// The closed set of section codecs.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Title(TitleKey),
    Counter(CounterKey),
    BoxDimension(BoundsKey),
    Masses(MassesKey),
    Coeffs(CoeffsKey),
    Atoms(AtomsKey),
    Links(LinksKey),
}

impl Key {
    /// An empty, unwired Key for `name`; `style` only matters for `Atoms`.
    pub fn for_name(name: Name, style: AtomStyle) -> Self {
        match name.kind() {
            KeyKind::Title => Self::Title(TitleKey::new()),
            KeyKind::Counter => Self::Counter(CounterKey::new(name)),
            KeyKind::BoxDimension => Self::BoxDimension(BoundsKey::new(name)),
            KeyKind::Masses => Self::Masses(MassesKey::new()),
            KeyKind::Coeffs => Self::Coeffs(CoeffsKey::new(name)),
            KeyKind::Atoms => Self::Atoms(AtomsKey::new(style)),
            KeyKind::Links => Self::Links(LinksKey::new(name)),
        }
    }

    pub fn name(&self) -> Name {
        match self {
            Self::Title(_) => Name::Title,
            Self::Counter(key) => key.name(),
            Self::BoxDimension(key) => key.name(),
            Self::Masses(_) => Name::Masses,
            Self::Coeffs(key) => key.name(),
            Self::Atoms(_) => Name::Atoms,
            Self::Links(key) => key.name(),
        }
    }

    pub fn kind(&self) -> KeyKind {
        match self {
            Self::Title(_) => KeyKind::Title,
            Self::Counter(_) => KeyKind::Counter,
            Self::BoxDimension(_) => KeyKind::BoxDimension,
            Self::Masses(_) => KeyKind::Masses,
            Self::Coeffs(_) => KeyKind::Coeffs,
            Self::Atoms(_) => KeyKind::Atoms,
            Self::Links(_) => KeyKind::Links,
        }
    }

    /// Tests whether `line` opens this Key's section.
    ///
    /// Header Keys keep the matched value tokens for the following `decode`.
    pub fn matches_header(&mut self, line: &str) -> bool {
        match self {
            Self::Title(_) => false,
            Self::Counter(key) => key.matches_header(line),
            Self::BoxDimension(key) => key.matches_header(line),
            Self::Masses(key) => key.matches_header(line),
            Self::Coeffs(key) => key.matches_header(line),
            Self::Atoms(key) => key.matches_header(line),
            Self::Links(key) => key.matches_header(line),
        }
    }

    pub fn declare_dependencies(&mut self, deps: &[DependencyRef]) -> KeyResult<()> {
        match self {
            Self::Title(_) | Self::Counter(_) | Self::BoxDimension(_) => {
                expect_no_dependencies(self.name(), deps)
            }
            Self::Masses(key) => key.declare_dependencies(deps),
            Self::Coeffs(key) => key.declare_dependencies(deps),
            Self::Atoms(key) => key.declare_dependencies(deps),
            Self::Links(key) => key.declare_dependencies(deps),
        }
    }

    /// Counter values implied by this Key's records, for the Registry to push.
    ///
    /// Scalar Keys have nothing to derive and answer `Unsupported`.
    pub fn derived_counts(&self) -> KeyResult<Vec<(CounterRef, i64)>> {
        match self {
            Self::Title(_) | Self::Counter(_) | Self::BoxDimension(_) => {
                Err(KeyError::Unsupported("derived value propagation"))
            }
            Self::Masses(key) => key.derived_counts(),
            Self::Coeffs(key) => key.derived_counts(),
            Self::Atoms(key) => key.derived_counts(),
            Self::Links(key) => key.derived_counts(),
        }
    }

    /// Decodes the section opened by `line`, pulling table rows from `source`.
    pub fn decode<R: BufRead, C: CounterValues + ?Sized>(
        &mut self,
        line: &Line,
        source: &mut LineSource<R>,
        counts: &C,
    ) -> KeyResult<()> {
        match self {
            Self::Title(key) => {
                key.decode(line);
                Ok(())
            }
            Self::Counter(key) => key.decode(line),
            Self::BoxDimension(key) => key.decode(line),
            Self::Masses(key) => key.decode(source, counts),
            Self::Coeffs(key) => key.decode(source, counts),
            Self::Atoms(key) => key.decode(source, counts),
            Self::Links(key) => key.decode(source, counts),
        }
    }

    pub fn encode<W: Write>(&self, writer: &mut W, format: FloatFormat) -> std::io::Result<()> {
        match self {
            Self::Title(key) => key.encode(writer),
            Self::Counter(key) => key.encode(writer),
            Self::BoxDimension(key) => key.encode(writer, format),
            Self::Masses(key) => key.encode(writer, format),
            Self::Coeffs(key) => key.encode(writer, format),
            Self::Atoms(key) => key.encode(writer, format),
            Self::Links(key) => key.encode(writer),
        }
    }

    pub fn assign(&mut self, value: Value) -> KeyResult<()> {
        match self {
            Self::Title(key) => key.set_text(value.into_text()?)?,
            Self::Counter(key) => key.set_count(value.into_count()?),
            Self::BoxDimension(key) => key.set_bounds(value.into_bounds()?),
            Self::Masses(key) => key.set_masses(value.into_masses()?),
            Self::Coeffs(key) => key.set_coeffs(value.into_coeffs()?),
            Self::Atoms(key) => key.set_atoms(value.into_atoms()?),
            Self::Links(key) => key.set_links(value.into_links()?),
        }
        Ok(())
    }

    pub fn value(&self) -> Value {
        match self {
            Self::Title(key) => Value::Text(key.text().to_string()),
            Self::Counter(key) => Value::Count(key.count()),
            Self::BoxDimension(key) => Value::Bounds(key.bounds()),
            Self::Masses(key) => Value::Masses(key.masses().clone()),
            Self::Coeffs(key) => Value::Coeffs(key.coeffs().clone()),
            Self::Atoms(key) => Value::Atoms(key.atoms().clone()),
            Self::Links(key) => Value::Links(key.links().clone()),
        }
    }

    pub fn validate<C: CounterValues + ?Sized>(&self, counts: &C) -> KeyResult<()> {
        match self {
            Self::Title(_) => Ok(()),
            Self::Counter(key) => key.validate(),
            Self::BoxDimension(key) => key.validate(),
            Self::Masses(key) => key.validate(counts),
            Self::Coeffs(key) => key.validate(counts),
            Self::Atoms(key) => key.validate(counts),
            Self::Links(key) => key.validate(counts),
        }
    }

    /// Number of records held by a table Key.
    pub fn row_count(&self) -> Option<usize> {
        match self {
            Self::Title(_) | Self::Counter(_) | Self::BoxDimension(_) => None,
            Self::Masses(key) => Some(key.masses().len()),
            Self::Coeffs(key) => Some(key.coeffs().len()),
            Self::Atoms(key) => Some(key.atoms().len()),
            Self::Links(key) => Some(key.links().len()),
        }
    }

    pub fn as_counter_mut(&mut self) -> Option<&mut CounterKey> {
        match self {
            Self::Counter(key) => Some(key),
            _ => None,
        }
    }
}
