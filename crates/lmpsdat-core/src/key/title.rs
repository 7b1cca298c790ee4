use super::lines::Line;
use crate::domain::{KeyError, KeyResult};
use std::io::Write;

/// Free-form first line of a data file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleKey {
    text: String,
}

impl TitleKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the title; it must fit on the first line of the file.
    pub fn set_text(&mut self, text: String) -> KeyResult<()> {
        if text.contains(['\n', '\r']) {
            return Err(KeyError::LineBreakInTitle);
        }
        self.text = text;
        Ok(())
    }

    pub(crate) fn decode(&mut self, line: &Line) {
        self.text.clone_from(&line.text);
    }

    pub(crate) fn encode<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::TitleKey;
    use crate::domain::ErrorKind;
    use crate::key::Line;

    #[test]
    fn title_takes_the_whole_line_verbatim() {
        let mut title = TitleKey::new();
        title.decode(&Line::new(1, "  water box # generated  "));
        assert_eq!(title.text(), "  water box # generated  ");

        let mut out = Vec::new();
        title.encode(&mut out).expect("in-memory write should succeed");
        assert_eq!(out, b"  water box # generated  \n");
    }

    #[test]
    fn title_with_a_line_break_is_rejected() {
        let mut title = TitleKey::new();
        title
            .set_text("water".to_string())
            .expect("single-line title is accepted");

        for text in ["water\n3 atoms", "water\r"] {
            let error = title
                .set_text(text.to_string())
                .expect_err("line break would split the title");
            assert_eq!(error.kind(), ErrorKind::RangeViolation);
        }
        assert_eq!(title.text(), "water");
    }
}
