use crate::domain::{CodecResult, Name};
use crate::key::LineSource;
use crate::registry::Registry;
use std::io::BufRead;
use tracing::{debug, trace};

/// Position of the decoder within a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    ExpectTitle,
    InHeader,
    /// Entered by the first table section; header fields are no longer matched.
    InBody,
}

/// Single-pass reader filling a [`Registry`] from data-file text.
///
/// Header Keys are offered each line in Registry creation order and table Keys
/// after them; a Key that matched leaves its pool, so every section is decoded
/// at most once. Lines nothing claims are skipped.
#[derive(Debug)]
pub struct Decoder<R> {
    source: LineSource<R>,
    state: DecodeState,
}

impl<R: BufRead> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            source: LineSource::new(reader),
            state: DecodeState::ExpectTitle,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn lines_consumed(&self) -> usize {
        self.source.lines_consumed()
    }

    /// Reads the stream to its end, then validates every Key.
    pub fn decode(&mut self, registry: &mut Registry) -> CodecResult<()> {
        self.read_sections(registry)?;
        registry.validate()
    }

    /// Reads the stream to its end without the validation pass.
    pub fn read_sections(&mut self, registry: &mut Registry) -> CodecResult<()> {
        let mut headers = registry.header_names();
        let mut tables = registry.table_names();

        while let Some(line) = self.source.next_line()? {
            match self.state {
                DecodeState::ExpectTitle => {
                    if registry.contains(Name::Title) {
                        registry.decode_key(Name::Title, &line, &mut self.source)?;
                    }
                    self.state = DecodeState::InHeader;
                    continue;
                }
                DecodeState::InHeader => {
                    if let Some(index) = headers
                        .iter()
                        .position(|&name| registry.matches_header(name, &line.text))
                    {
                        let name = headers.remove(index);
                        registry.decode_key(name, &line, &mut self.source)?;
                        continue;
                    }
                }
                DecodeState::InBody => {}
            }

            if let Some(index) = tables
                .iter()
                .position(|&name| registry.matches_header(name, &line.text))
            {
                let name = tables.remove(index);
                self.state = DecodeState::InBody;
                registry.decode_key(name, &line, &mut self.source)?;
                continue;
            }

            trace!(line = line.number, text = %line.text, "skipped line");
        }

        debug!(
            lines = self.source.lines_consumed(),
            unmatched_headers = headers.len(),
            unmatched_tables = tables.len(),
            "reached end of stream"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeState, Decoder};
    use crate::domain::{Bounds, ErrorKind, Name, Value};
    use crate::key::AtomStyle;
    use crate::registry::Registry;
    use std::io::Cursor;

    #[test]
    fn title_line_is_consumed_even_when_not_requested() {
        let mut registry =
            Registry::build(&[Name::AtomCount], AtomStyle::Full).expect("registry should build");
        let mut decoder = Decoder::new(Cursor::new("3 atoms\n\n3 atoms\n"));

        decoder.decode(&mut registry).expect("document should decode");
        assert_eq!(registry.value(Name::AtomCount).expect("registered"), Value::Count(3));
        assert_eq!(decoder.state(), DecodeState::InHeader);
        assert_eq!(decoder.lines_consumed(), 3);
    }

    #[test]
    fn header_fields_after_the_first_table_are_ignored() {
        let mut registry = Registry::build(&[Name::Masses, Name::XBounds], AtomStyle::Full)
            .expect("registry should build");
        let text = "t\n\n1 atom types\n\nMasses\n\n1 2.0\n\n0 5 xlo xhi\n";
        let mut decoder = Decoder::new(Cursor::new(text));

        decoder
            .read_sections(&mut registry)
            .expect("sections should be read");
        assert_eq!(decoder.state(), DecodeState::InBody);
        assert_eq!(
            registry.value(Name::XBounds).expect("registered"),
            Value::Bounds(Bounds::default())
        );
    }

    #[test]
    fn each_header_field_is_decoded_once() {
        let mut registry =
            Registry::build(&[Name::AtomCount], AtomStyle::Full).expect("registry should build");
        let mut decoder = Decoder::new(Cursor::new("t\n2 atoms\n5 atoms\n"));

        decoder.decode(&mut registry).expect("document should decode");
        assert_eq!(registry.value(Name::AtomCount).expect("registered"), Value::Count(2));
    }

    #[test]
    fn malformed_table_row_aborts_with_key_name() {
        let mut registry =
            Registry::build(&[Name::Masses], AtomStyle::Full).expect("registry should build");
        let mut decoder = Decoder::new(Cursor::new("t\n\n1 atom types\n\nMasses\n\n1 heavy\n"));

        let error = decoder
            .decode(&mut registry)
            .expect_err("mass must be numeric");
        assert_eq!(error.kind(), ErrorKind::MalformedLine);
        assert_eq!(error.name(), Some(Name::Masses));
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [DATA.MALFORMED_LINE] key 'Masses': line 7: invalid mass 'heavy'"
        );
    }
}
