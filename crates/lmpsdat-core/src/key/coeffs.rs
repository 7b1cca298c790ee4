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

/// A `... Coeffs` table: type -> free-length coefficient list.
#[derive(Debug, Clone, PartialEq)]
pub struct CoeffsKey {
    name: Name,
    coeffs: BTreeMap<i64, Vec<f64>>,
    types: Option<CounterRef>,
}

impl CoeffsKey {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            coeffs: BTreeMap::new(),
            types: None,
        }
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn coeffs(&self) -> &BTreeMap<i64, Vec<f64>> {
        &self.coeffs
    }

    pub fn set_coeffs(&mut self, coeffs: BTreeMap<i64, Vec<f64>>) {
        self.coeffs = coeffs;
    }

    fn type_role(&self) -> Name {
        self.name.type_counter().unwrap_or(Name::AtomTypes)
    }

    pub(crate) fn matches_header(&mut self, line: &str) -> bool {
        match_section_title(line, self.name.as_str())
    }

    pub(crate) fn declare_dependencies(&mut self, deps: &[DependencyRef]) -> KeyResult<()> {
        let wired = expect_dependencies(self.name, deps, &[self.type_role()])?;
        self.types = wired.first().copied();
        Ok(())
    }

    pub(crate) fn derived_counts(&self) -> KeyResult<Vec<(CounterRef, i64)>> {
        let types = wired(self.types, self.type_role())?;
        Ok(vec![(types, row_total(self.coeffs.len()))])
    }

    pub(crate) fn decode<R: BufRead, C: CounterValues + ?Sized>(
        &mut self,
        source: &mut LineSource<R>,
        counts: &C,
    ) -> KeyResult<()> {
        let rows = announced_rows(required(counts, self.types, self.type_role())?);
        let table = self.name.as_str();
        let coeffs = &mut self.coeffs;
        coeffs.clear();
        let read = read_table_rows(source, rows, |line, fields| {
            ensure_field_count(fields, 2, line, table)?;
            let coeff_type = parse_int(fields[0], line, "type")?;
            let values = fields[1..]
                .iter()
                .map(|token| parse_float(token, line, "coefficient"))
                .collect::<Result<Vec<_>, _>>()?;
            coeffs.insert(coeff_type, values);
            Ok(())
        })?;
        debug!(table, rows = read, announced = rows, "decoded coefficients");
        Ok(())
    }

    pub(crate) fn encode<W: Write>(
        &self,
        writer: &mut W,
        format: FloatFormat,
    ) -> std::io::Result<()> {
        if self.coeffs.is_empty() {
            return Ok(());
        }
        write!(writer, "{}\n\n", self.name)?;
        for (coeff_type, values) in &self.coeffs {
            write!(writer, "{}", coeff_type)?;
            for value in values {
                write!(writer, " {}", format_float(*value, format))?;
            }
            writeln!(writer)?;
        }
        writeln!(writer)
    }

    pub(crate) fn validate<C: CounterValues + ?Sized>(&self, counts: &C) -> KeyResult<()> {
        let types = required(counts, self.types, self.type_role())?;
        check_count(types, self.coeffs.len())?;
        for (&coeff_type, values) in &self.coeffs {
            check_range("type", coeff_type, coeff_type, types)?;
            if values.is_empty() {
                return Err(KeyError::EmptyCoefficients { id: coeff_type });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CoeffsKey;
    use crate::config::FloatFormat;
    use crate::domain::{ErrorKind, Name};
    use crate::key::{CounterKey, DependencyRef, Key, LineSource};
    use std::collections::BTreeMap;
    use std::io::Cursor;

    fn bond_types(count: i64) -> Vec<Key> {
        let mut counter = CounterKey::new(Name::BondTypes);
        counter.set_count(count);
        vec![Key::Counter(counter)]
    }

    #[test]
    fn coefficient_rows_keep_every_value() {
        let counters = bond_types(2);
        let mut coeffs = CoeffsKey::new(Name::BondCoeffs);
        coeffs
            .declare_dependencies(&[DependencyRef::new(0, &counters[0])])
            .expect("bond types should wire");

        assert!(coeffs.matches_header("Bond Coeffs # harmonic"));
        let mut source = LineSource::new(Cursor::new("\n1 450 1.0\n2 340.5 1.09 7\n"));
        coeffs
            .decode(&mut source, counters.as_slice())
            .expect("coefficients should decode");

        assert_eq!(coeffs.coeffs().get(&1), Some(&vec![450.0, 1.0]));
        assert_eq!(coeffs.coeffs().get(&2), Some(&vec![340.5, 1.09, 7.0]));
        coeffs
            .validate(counters.as_slice())
            .expect("coefficients are consistent");
    }

    #[test]
    fn coefficients_are_bound_to_their_own_type_counter() {
        let atom_types = Key::for_name(Name::AtomTypes, crate::key::AtomStyle::Full);
        let mut coeffs = CoeffsKey::new(Name::AngleCoeffs);
        let error = coeffs
            .declare_dependencies(&[DependencyRef::new(0, &atom_types)])
            .expect_err("angle coefficients need angle types");
        assert_eq!(error.kind(), ErrorKind::DependencyArity);
    }

    #[test]
    fn out_of_range_type_is_rejected() {
        let counters = bond_types(1);
        let mut coeffs = CoeffsKey::new(Name::BondCoeffs);
        coeffs
            .declare_dependencies(&[DependencyRef::new(0, &counters[0])])
            .expect("bond types should wire");
        coeffs.set_coeffs(BTreeMap::from([(0, vec![1.0])]));

        let error = coeffs
            .validate(counters.as_slice())
            .expect_err("type 0 is out of range");
        assert_eq!(error.to_string(), "type 0 of record 0 is outside [1, 1]");
    }

    #[test]
    fn coefficient_row_without_values_is_rejected() {
        let counters = bond_types(1);
        let mut coeffs = CoeffsKey::new(Name::BondCoeffs);
        coeffs
            .declare_dependencies(&[DependencyRef::new(0, &counters[0])])
            .expect("bond types should wire");
        coeffs.set_coeffs(BTreeMap::from([(1, Vec::new())]));

        let error = coeffs
            .validate(counters.as_slice())
            .expect_err("a row needs at least one coefficient");
        assert_eq!(error.kind(), ErrorKind::RangeViolation);
        assert_eq!(error.to_string(), "coefficient row 1 holds no values");
    }

    #[test]
    fn coefficients_encode_in_type_order() {
        let mut coeffs = CoeffsKey::new(Name::PairCoeffs);
        coeffs.set_coeffs(BTreeMap::from([(2, vec![0.5, 3.0]), (1, vec![0.25, 2.5])]));

        let mut out = Vec::new();
        coeffs
            .encode(&mut out, FloatFormat::General)
            .expect("in-memory write should succeed");
        assert_eq!(
            String::from_utf8(out).expect("utf-8"),
            "Pair Coeffs\n\n1 0.25 2.5\n2 0.5 3\n\n"
        );
    }
}
