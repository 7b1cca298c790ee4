use super::atom_style::AtomStyle;
use super::lines::{
    LineSource, announced_rows, match_section_title, read_table_rows, trailing_comment,
};
use super::{
    CounterRef, CounterValues, DependencyRef, check_count, check_range, expect_dependencies,
    required, row_total, wired,
};
use crate::config::FloatFormat;
use crate::domain::{AtomRecord, KeyError, KeyResult, Name};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

/// `Atoms` table; the row layout is delegated to the configured [`AtomStyle`].
#[derive(Debug, Clone, PartialEq)]
pub struct AtomsKey {
    style: AtomStyle,
    atoms: BTreeMap<i64, AtomRecord>,
    count: Option<CounterRef>,
    types: Option<CounterRef>,
    style_hint: Option<String>,
}

impl AtomsKey {
    pub fn new(style: AtomStyle) -> Self {
        Self {
            style,
            atoms: BTreeMap::new(),
            count: None,
            types: None,
            style_hint: None,
        }
    }

    pub fn style(&self) -> AtomStyle {
        self.style
    }

    pub fn atoms(&self) -> &BTreeMap<i64, AtomRecord> {
        &self.atoms
    }

    pub fn set_atoms(&mut self, atoms: BTreeMap<i64, AtomRecord>) {
        self.atoms = atoms;
    }

    /// Comment found after `Atoms` on the section line, e.g. `full` in `Atoms # full`.
    pub fn style_hint(&self) -> Option<&str> {
        self.style_hint.as_deref()
    }

    pub(crate) fn matches_header(&mut self, line: &str) -> bool {
        if !match_section_title(line, Name::Atoms.as_str()) {
            return false;
        }

        self.style_hint = trailing_comment(line).map(str::to_string);
        if let Some(hint) = self.style_hint.as_deref() {
            match AtomStyle::parse(hint) {
                Some(declared) if declared != self.style => warn!(
                    declared = %declared,
                    configured = %self.style,
                    "Atoms section names a different atom style; using the configured one"
                ),
                Some(_) => {}
                None => debug!(hint, "Atoms section comment is not a known atom style"),
            }
        }
        true
    }

    pub(crate) fn declare_dependencies(&mut self, deps: &[DependencyRef]) -> KeyResult<()> {
        let wired = expect_dependencies(Name::Atoms, deps, &[Name::AtomCount, Name::AtomTypes])?;
        self.count = wired.first().copied();
        self.types = wired.get(1).copied();
        Ok(())
    }

    pub(crate) fn derived_counts(&self) -> KeyResult<Vec<(CounterRef, i64)>> {
        let count = wired(self.count, Name::AtomCount)?;
        Ok(vec![(count, row_total(self.atoms.len()))])
    }

    pub(crate) fn decode<R: BufRead, C: CounterValues + ?Sized>(
        &mut self,
        source: &mut LineSource<R>,
        counts: &C,
    ) -> KeyResult<()> {
        let rows = announced_rows(required(counts, self.count, Name::AtomCount)?);
        let style = self.style;
        let atoms = &mut self.atoms;
        atoms.clear();
        let read = read_table_rows(source, rows, |line, fields| {
            let (id, record) = style.decode_row(fields, line)?;
            atoms.insert(id, record);
            Ok(())
        })?;
        debug!(style = %style, rows = read, announced = rows, "decoded Atoms");
        Ok(())
    }

    pub(crate) fn encode<W: Write>(
        &self,
        writer: &mut W,
        format: FloatFormat,
    ) -> std::io::Result<()> {
        if self.atoms.is_empty() {
            return Ok(());
        }
        write!(writer, "{}\n\n", Name::Atoms)?;
        for (id, record) in &self.atoms {
            self.style.encode_row(writer, *id, record, format)?;
        }
        writeln!(writer)
    }

    pub(crate) fn validate<C: CounterValues + ?Sized>(&self, counts: &C) -> KeyResult<()> {
        let count = required(counts, self.count, Name::AtomCount)?;
        let types = required(counts, self.types, Name::AtomTypes)?;
        check_count(count, self.atoms.len())?;

        let with_image = self
            .atoms
            .values()
            .next()
            .is_some_and(|record| record.image.is_some());
        for (&id, record) in &self.atoms {
            check_range("atom id", id, id, count)?;
            check_range("atom type", id, record.atom_type, types)?;
            if record.image.is_some() != with_image {
                return Err(KeyError::InconsistentOptionalField {
                    id,
                    expected: with_image,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::AtomsKey;
    use crate::config::FloatFormat;
    use crate::domain::{AtomRecord, ErrorKind, KeyError, Name};
    use crate::key::{AtomStyle, CounterKey, DependencyRef, Key, LineSource};
    use std::collections::BTreeMap;
    use std::io::Cursor;

    fn counters(atoms: i64, types: i64) -> Vec<Key> {
        let mut count = CounterKey::new(Name::AtomCount);
        count.set_count(atoms);
        let mut atom_types = CounterKey::new(Name::AtomTypes);
        atom_types.set_count(types);
        vec![Key::Counter(count), Key::Counter(atom_types)]
    }

    fn wired_atoms(style: AtomStyle, counters: &[Key]) -> AtomsKey {
        let mut atoms = AtomsKey::new(style);
        atoms
            .declare_dependencies(&[
                DependencyRef::new(1, &counters[1]),
                DependencyRef::new(0, &counters[0]),
            ])
            .expect("atom count and atom types should wire");
        atoms
    }

    #[test]
    fn atoms_decode_rows_with_the_configured_style() {
        let counters = counters(2, 2);
        let mut atoms = wired_atoms(AtomStyle::Full, &counters);
        assert!(atoms.matches_header("Atoms # full"));
        assert_eq!(atoms.style_hint(), Some("full"));

        let mut source = LineSource::new(Cursor::new(
            "\n1 1 1 0.0 0.5 0.5 0.5\n2 1 2 -0.4 0.5 0.5 0.6 # tail\n\nBonds\n",
        ));
        atoms
            .decode(&mut source, counters.as_slice())
            .expect("atoms should decode");

        assert_eq!(atoms.atoms().len(), 2);
        assert_eq!(
            atoms.atoms().get(&2),
            Some(
                &AtomRecord::new(2, [0.5, 0.5, 0.6])
                    .with_molecule(1)
                    .with_charge(-0.4)
            )
        );
        atoms
            .validate(counters.as_slice())
            .expect("atoms are consistent");
    }

    #[test]
    fn mismatched_style_hint_is_not_fatal() {
        let mut atoms = AtomsKey::new(AtomStyle::Atomic);
        assert!(atoms.matches_header("Atoms # full"));
        assert_eq!(atoms.style(), AtomStyle::Atomic);
        assert!(!atoms.matches_header("Atom"));
    }

    #[test]
    fn atoms_validation_reports_each_violation() {
        let counters = counters(2, 1);
        let mut atoms = wired_atoms(AtomStyle::Atomic, &counters);

        atoms.set_atoms(BTreeMap::from([(1, AtomRecord::new(1, [0.0; 3]))]));
        let error = atoms
            .validate(counters.as_slice())
            .expect_err("one atom for two declared");
        assert_eq!(error.kind(), ErrorKind::CountMismatch);

        atoms.set_atoms(BTreeMap::from([
            (1, AtomRecord::new(1, [0.0; 3])),
            (3, AtomRecord::new(1, [0.0; 3])),
        ]));
        let error = atoms
            .validate(counters.as_slice())
            .expect_err("id 3 is out of range");
        assert_eq!(error.to_string(), "atom id 3 of record 3 is outside [1, 2]");

        atoms.set_atoms(BTreeMap::from([
            (1, AtomRecord::new(1, [0.0; 3])),
            (2, AtomRecord::new(2, [0.0; 3])),
        ]));
        let error = atoms
            .validate(counters.as_slice())
            .expect_err("type 2 is out of range");
        assert_eq!(error.to_string(), "atom type 2 of record 2 is outside [1, 1]");

        atoms.set_atoms(BTreeMap::from([
            (1, AtomRecord::new(1, [0.0; 3]).with_image([0, 0, 0])),
            (2, AtomRecord::new(1, [0.0; 3])),
        ]));
        let error = atoms
            .validate(counters.as_slice())
            .expect_err("image flags must be uniform");
        assert!(matches!(
            error,
            KeyError::InconsistentOptionalField {
                id: 2,
                expected: true
            }
        ));
    }

    #[test]
    fn atoms_propagate_their_row_count() {
        let counters = counters(0, 1);
        let mut atoms = wired_atoms(AtomStyle::Atomic, &counters);
        atoms.set_atoms(BTreeMap::from([
            (1, AtomRecord::new(1, [0.0; 3])),
            (2, AtomRecord::new(1, [1.0; 3])),
        ]));

        let derived = atoms.derived_counts().expect("wired atoms derive");
        assert_eq!(derived.len(), 1);
        assert_eq!((derived[0].0.name(), derived[0].1), (Name::AtomCount, 2));
    }

    #[test]
    fn atoms_encode_header_rows_and_trailing_blank_line() {
        let mut atoms = AtomsKey::new(AtomStyle::Atomic);
        atoms.set_atoms(BTreeMap::from([(1, AtomRecord::new(1, [0.5, 0.5, 0.5]))]));

        let mut out = Vec::new();
        atoms
            .encode(&mut out, FloatFormat::General)
            .expect("in-memory write should succeed");
        assert_eq!(
            String::from_utf8(out).expect("utf-8"),
            "Atoms\n\n1 1 0.5 0.5 0.5\n\n"
        );
    }
}
