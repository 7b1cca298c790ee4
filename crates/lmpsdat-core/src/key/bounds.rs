use super::lines::{Line, match_header, parse_float};
use crate::config::FloatFormat;
use crate::domain::{Bounds, KeyError, KeyResult, Name};
use crate::serialization::format_float;
use std::io::Write;

/// Box extent along one axis: `<lo> <hi> xlo xhi`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsKey {
    name: Name,
    bounds: Bounds,
    pending: Option<(String, String)>,
}

impl BoundsKey {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            bounds: Bounds::default(),
            pending: None,
        }
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    fn split_pair(values: &[&str]) -> Option<(String, String)> {
        match values {
            [lo, hi] => Some(((*lo).to_string(), (*hi).to_string())),
            _ => None,
        }
    }

    pub(crate) fn matches_header(&mut self, line: &str) -> bool {
        match match_header(line, 2, self.name.as_str()) {
            Some(values) => {
                self.pending = Self::split_pair(&values);
                true
            }
            None => false,
        }
    }

    pub(crate) fn decode(&mut self, line: &Line) -> KeyResult<()> {
        let (lo, hi) = match self.pending.take() {
            Some(pair) => pair,
            None => match_header(&line.text, 2, self.name.as_str())
                .and_then(|values| Self::split_pair(&values))
                .ok_or_else(|| {
                    KeyError::malformed(line.number, format!("expected '<lo> <hi> {}'", self.name))
                })?,
        };
        self.bounds = Bounds::new(
            parse_float(&lo, line.number, "lower bound")?,
            parse_float(&hi, line.number, "upper bound")?,
        );
        Ok(())
    }

    pub(crate) fn encode<W: Write>(
        &self,
        writer: &mut W,
        format: FloatFormat,
    ) -> std::io::Result<()> {
        writeln!(
            writer,
            "{} {} {}",
            format_float(self.bounds.lo, format),
            format_float(self.bounds.hi, format),
            self.name
        )
    }

    pub(crate) fn validate(&self) -> KeyResult<()> {
        let Bounds { lo, hi } = self.bounds;
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(KeyError::InvertedBounds { lo, hi });
        }
        Ok(())
    }
}
