use super::lines::{
    LineSource, announced_rows, ensure_field_count, match_section_title, parse_float, parse_int,
    read_table_rows,
};
use super::{
    CounterRef, CounterValues, DependencyRef, check_count, check_range, expect_dependencies,
    required, row_total, wired,
};
use crate::config::FloatFormat;
use crate::domain::{KeyError, KeyResult, Name};
use crate::serialization::format_float;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use tracing::debug;

/// `Masses` table: atom type -> mass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MassesKey {
    masses: BTreeMap<i64, f64>,
    types: Option<CounterRef>,
}

impl MassesKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn masses(&self) -> &BTreeMap<i64, f64> {
        &self.masses
    }

    pub fn set_masses(&mut self, masses: BTreeMap<i64, f64>) {
        self.masses = masses;
    }

    pub(crate) fn matches_header(&mut self, line: &str) -> bool {
        match_section_title(line, Name::Masses.as_str())
    }

    pub(crate) fn declare_dependencies(&mut self, deps: &[DependencyRef]) -> KeyResult<()> {
        let wired = expect_dependencies(Name::Masses, deps, &[Name::AtomTypes])?;
        self.types = wired.first().copied();
        Ok(())
    }

    pub(crate) fn derived_counts(&self) -> KeyResult<Vec<(CounterRef, i64)>> {
        let types = wired(self.types, Name::AtomTypes)?;
        Ok(vec![(types, row_total(self.masses.len()))])
    }

    pub(crate) fn decode<R: BufRead, C: CounterValues + ?Sized>(
        &mut self,
        source: &mut LineSource<R>,
        counts: &C,
    ) -> KeyResult<()> {
        let rows = announced_rows(required(counts, self.types, Name::AtomTypes)?);
        let masses = &mut self.masses;
        masses.clear();
        let read = read_table_rows(source, rows, |line, fields| {
            ensure_field_count(fields, 2, line, "Masses")?;
            let atom_type = parse_int(fields[0], line, "atom type")?;
            let mass = parse_float(fields[1], line, "mass")?;
            masses.insert(atom_type, mass);
            Ok(())
        })?;
        debug!(rows = read, announced = rows, "decoded Masses");
        Ok(())
    }

    pub(crate) fn encode<W: Write>(
        &self,
        writer: &mut W,
        format: FloatFormat,
    ) -> std::io::Result<()> {
        if self.masses.is_empty() {
            return Ok(());
        }
        write!(writer, "{}\n\n", Name::Masses)?;
        for (atom_type, mass) in &self.masses {
            writeln!(writer, "{} {}", atom_type, format_float(*mass, format))?;
        }
        writeln!(writer)
    }

    pub(crate) fn validate<C: CounterValues + ?Sized>(&self, counts: &C) -> KeyResult<()> {
        let types = required(counts, self.types, Name::AtomTypes)?;
        check_count(types, self.masses.len())?;
        for (&atom_type, &mass) in &self.masses {
            check_range("atom type", atom_type, atom_type, types)?;
            if mass.is_nan() || mass < 0.0 {
                return Err(KeyError::NegativeMass { atom_type, mass });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MassesKey;
    use crate::config::FloatFormat;
    use crate::domain::{ErrorKind, KeyError, Name};
    use crate::key::{CounterKey, DependencyRef, Key, LineSource};
    use std::collections::BTreeMap;
    use std::io::Cursor;

    fn atom_types(count: i64) -> Vec<Key> {
        let mut counter = CounterKey::new(Name::AtomTypes);
        counter.set_count(count);
        vec![Key::Counter(counter)]
    }

    fn wired_masses(counters: &[Key]) -> MassesKey {
        let mut masses = MassesKey::new();
        masses
            .declare_dependencies(&[DependencyRef::new(0, &counters[0])])
            .expect("atom types should wire");
        masses
    }

    #[test]
    fn masses_decode_one_row_per_type() {
        let counters = atom_types(2);
        let mut masses = wired_masses(&counters);
        let mut source = LineSource::new(Cursor::new("\n1 12.011 # C\n2 1.008\n\nAtoms\n"));

        masses
            .decode(&mut source, counters.as_slice())
            .expect("masses should decode");
        assert_eq!(masses.masses().get(&1), Some(&12.011));
        assert_eq!(masses.masses().get(&2), Some(&1.008));
        assert_eq!(source.lines_consumed(), 3);
        masses
            .validate(counters.as_slice())
            .expect("masses are consistent");
    }

    #[test]
    fn masses_row_without_value_is_malformed() {
        let counters = atom_types(1);
        let mut masses = wired_masses(&counters);
        let mut source = LineSource::new(Cursor::new("\n1\n"));

        let error = masses
            .decode(&mut source, counters.as_slice())
            .expect_err("mass is missing");
        assert_eq!(error.kind(), ErrorKind::MalformedLine);
        assert_eq!(
            error.to_string(),
            "line 2: Masses row has 1 fields, expected at least 2"
        );
    }

    #[test]
    fn masses_validate_count_range_and_sign() {
        let counters = atom_types(2);
        let mut masses = wired_masses(&counters);

        masses.set_masses(BTreeMap::from([(1, 1.0)]));
        let error = masses
            .validate(counters.as_slice())
            .expect_err("one mass for two types");
        assert!(matches!(
            error,
            KeyError::CountMismatch {
                expected: 2,
                found: 1
            }
        ));

        masses.set_masses(BTreeMap::from([(1, 1.0), (3, 1.0)]));
        let error = masses
            .validate(counters.as_slice())
            .expect_err("type 3 is out of range");
        assert_eq!(error.kind(), ErrorKind::RangeViolation);

        masses.set_masses(BTreeMap::from([(1, 1.0), (2, -4.0)]));
        let error = masses
            .validate(counters.as_slice())
            .expect_err("negative mass");
        assert_eq!(error.to_string(), "mass -4 of atom type 2 is not a non-negative number");
    }

    #[test]
    fn masses_encode_sorted_rows_with_trailing_blank_line() {
        let mut masses = MassesKey::new();
        masses.set_masses(BTreeMap::from([(2, 1.008), (1, 12.011)]));

        let mut out = Vec::new();
        masses
            .encode(&mut out, FloatFormat::General)
            .expect("in-memory write should succeed");
        assert_eq!(
            String::from_utf8(out).expect("utf-8"),
            "Masses\n\n1 12.011\n2 1.008\n\n"
        );
    }
}
