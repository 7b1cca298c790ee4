use crate::config::{CodecConfig, FloatFormat};
use crate::domain::{CodecError, CodecResult, KeyError, Name};
use crate::registry::Registry;
use std::io::Write;
use tracing::debug;

/// Header fields in canonical order; each non-empty group is followed by a blank line.
const HEADER_GROUPS: [&[Name]; 3] = [
    &[
        Name::AtomCount,
        Name::BondCount,
        Name::AngleCount,
        Name::DihedralCount,
        Name::ImproperCount,
    ],
    &[
        Name::AtomTypes,
        Name::BondTypes,
        Name::AngleTypes,
        Name::DihedralTypes,
        Name::ImproperTypes,
    ],
    &[Name::XBounds, Name::YBounds, Name::ZBounds],
];

const TABLE_ORDER: [Name; 11] = [
    Name::Masses,
    Name::PairCoeffs,
    Name::BondCoeffs,
    Name::AngleCoeffs,
    Name::DihedralCoeffs,
    Name::ImproperCoeffs,
    Name::Atoms,
    Name::Bonds,
    Name::Angles,
    Name::Dihedrals,
    Name::Impropers,
];

/// Canonical writer for a filled [`Registry`].
#[derive(Debug)]
pub struct Encoder<W> {
    writer: W,
    float_format: FloatFormat,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            float_format: FloatFormat::default(),
        }
    }

    pub fn with_float_format(mut self, float_format: FloatFormat) -> Self {
        self.float_format = float_format;
        self
    }

    pub fn with_config(self, config: &CodecConfig) -> Self {
        self.with_float_format(config.float_format)
    }

    /// Propagates derived counts, validates, then writes every section and
    /// hands the writer back.
    pub fn encode(mut self, registry: &mut Registry) -> CodecResult<W> {
        registry.propagate_derived_values()?;
        registry.validate()?;
        self.write_sections(registry)?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_sections(&mut self, registry: &Registry) -> CodecResult<()> {
        if !self.write_key(Name::Title, registry)? {
            writeln!(self.writer)?;
        }
        writeln!(self.writer)?;

        for group in HEADER_GROUPS {
            let mut written = false;
            for &name in group {
                written |= self.write_key(name, registry)?;
            }
            if written {
                writeln!(self.writer)?;
            }
        }

        for name in TABLE_ORDER {
            self.write_key(name, registry)?;
        }
        Ok(())
    }

    fn write_key(&mut self, name: Name, registry: &Registry) -> CodecResult<bool> {
        let Some(key) = registry.key(name) else {
            return Ok(false);
        };
        key.encode(&mut self.writer, self.float_format)
            .map_err(|error| CodecError::key(name, KeyError::Io(error)))?;
        debug!(name = %name, "encoded section");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::Encoder;
    use crate::config::FloatFormat;
    use crate::domain::{Bounds, ErrorKind, LinkRecord, Name, Value};
    use crate::key::AtomStyle;
    use crate::registry::Registry;
    use std::collections::BTreeMap;

    fn encode(registry: &mut Registry, float_format: FloatFormat) -> String {
        let bytes = Encoder::new(Vec::new())
            .with_float_format(float_format)
            .encode(registry)
            .expect("registry should encode");
        String::from_utf8(bytes).expect("output is utf-8")
    }

    #[test]
    fn missing_title_still_writes_the_leading_lines() {
        let mut registry =
            Registry::build(&[Name::AtomCount], AtomStyle::Full).expect("registry should build");
        registry
            .assign(Name::AtomCount, Value::Count(0))
            .expect("count should assign");

        assert_eq!(encode(&mut registry, FloatFormat::General), "\n\n0 atoms\n\n");
    }

    #[test]
    fn sections_follow_canonical_order_regardless_of_request_order() {
        let mut registry = Registry::build(
            &[Name::Bonds, Name::ZBounds, Name::BondCoeffs, Name::Title],
            AtomStyle::Full,
        )
        .expect("registry should build");
        registry
            .assign(Name::Title, Value::Text("ordered".to_string()))
            .expect("title should assign");
        registry
            .assign(Name::AtomCount, Value::Count(2))
            .expect("atom count should assign");
        registry
            .assign(Name::ZBounds, Value::Bounds(Bounds::new(-0.5, 0.5)))
            .expect("bounds should assign");
        registry
            .assign(
                Name::BondCoeffs,
                Value::Coeffs(BTreeMap::from([(1, vec![100.0, 1.5])])),
            )
            .expect("coefficients should assign");
        registry
            .assign(
                Name::Bonds,
                Value::Links(BTreeMap::from([(1, LinkRecord::new(1, [1, 2]))])),
            )
            .expect("bonds should assign");

        assert_eq!(
            encode(&mut registry, FloatFormat::General),
            "ordered\n\n\
             2 atoms\n1 bonds\n\n\
             1 bond types\n\n\
             -0.5 0.5 zlo zhi\n\n\
             Bond Coeffs\n\n1 100 1.5\n\n\
             Bonds\n\n1 1 1 2\n\n"
        );
    }

    #[test]
    fn fixed_float_format_applies_to_every_float_column() {
        let mut registry = Registry::build(&[Name::XBounds, Name::Masses], AtomStyle::Full)
            .expect("registry should build");
        registry
            .assign(Name::XBounds, Value::Bounds(Bounds::new(0.0, 2.0)))
            .expect("bounds should assign");
        registry
            .assign(Name::Masses, Value::Masses(BTreeMap::from([(1, 1.008)])))
            .expect("masses should assign");

        assert_eq!(
            encode(&mut registry, FloatFormat::Fixed { precision: 2 }),
            "\n\n1 atom types\n\n0.00 2.00 xlo xhi\n\nMasses\n\n1 1.01\n\n"
        );
    }

    #[test]
    fn invalid_registry_is_not_written() {
        let mut registry =
            Registry::build(&[Name::XBounds], AtomStyle::Full).expect("registry should build");
        registry
            .assign(Name::XBounds, Value::Bounds(Bounds::new(1.0, 0.0)))
            .expect("bounds should assign");

        let mut out = Vec::new();
        let error = Encoder::new(&mut out)
            .encode(&mut registry)
            .expect_err("inverted bounds are rejected");
        assert_eq!(error.kind(), ErrorKind::RangeViolation);
        assert!(out.is_empty());
    }
}
