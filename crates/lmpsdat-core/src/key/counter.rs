use super::lines::{Line, match_header, parse_int};
use crate::domain::{KeyError, KeyResult, Name};
use std::io::Write;

/// Integer header field such as `12 atoms` or `3 bond types`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterKey {
    name: Name,
    count: i64,
    explicit: bool,
    pending: Option<String>,
}

impl CounterKey {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            count: 0,
            explicit: false,
            pending: None,
        }
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    /// Whether the count was decoded or assigned rather than derived from a table.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn set_count(&mut self, count: i64) {
        self.count = count;
        self.explicit = true;
    }

    /// Applies a count derived from a dependent table; explicit counts are kept.
    pub fn derive(&mut self, count: i64) -> bool {
        if self.explicit {
            return false;
        }
        self.count = count;
        true
    }

    pub(crate) fn matches_header(&mut self, line: &str) -> bool {
        match match_header(line, 1, self.name.as_str()) {
            Some(values) => {
                self.pending = values.first().map(|token| (*token).to_string());
                true
            }
            None => false,
        }
    }

    pub(crate) fn decode(&mut self, line: &Line) -> KeyResult<()> {
        let token = match self.pending.take() {
            Some(token) => token,
            None => match_header(&line.text, 1, self.name.as_str())
                .and_then(|values| values.first().map(|token| (*token).to_string()))
                .ok_or_else(|| {
                    KeyError::malformed(line.number, format!("expected '<count> {}'", self.name))
                })?,
        };
        let count = parse_int(&token, line.number, self.name.as_str())?;
        self.set_count(count);
        Ok(())
    }

    pub(crate) fn encode<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{} {}", self.count, self.name)
    }

    pub(crate) fn validate(&self) -> KeyResult<()> {
        if self.count < 0 {
            return Err(KeyError::NegativeCount(self.count));
        }
        Ok(())
    }
}
