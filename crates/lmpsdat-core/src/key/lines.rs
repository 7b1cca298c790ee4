use crate::domain::{KeyError, KeyResult};
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based position in the stream.
    pub number: usize,
    pub text: String,
}

impl Line {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Pull-based line reader shared by the decoder and the table Keys.
///
/// Lines are handed out one at a time; nothing is buffered beyond the line
/// being returned, so a Key decoding its body consumes exactly the lines it reads.
#[derive(Debug)]
pub struct LineSource<R> {
    reader: R,
    consumed: usize,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            consumed: 0,
        }
    }

    pub fn next_line(&mut self) -> std::io::Result<Option<Line>> {
        let mut text = String::new();
        if self.reader.read_line(&mut text)? == 0 {
            return Ok(None);
        }
        self.consumed += 1;

        let content_len = text.trim_end_matches(['\n', '\r']).len();
        text.truncate(content_len);
        Ok(Some(Line {
            number: self.consumed,
            text,
        }))
    }

    pub fn lines_consumed(&self) -> usize {
        self.consumed
    }
}

pub(crate) fn strip_comment(line: &str) -> &str {
    if let Some((prefix, _)) = line.split_once('#') {
        prefix
    } else {
        line
    }
}

/// Trimmed text after the first `#`, if any.
pub(crate) fn trailing_comment(line: &str) -> Option<&str> {
    line.split_once('#')
        .map(|(_, comment)| comment.trim())
        .filter(|comment| !comment.is_empty())
}

pub(crate) fn data_fields(line: &str) -> Vec<&str> {
    strip_comment(line).split_whitespace().collect()
}

/// Matches `<value>{value_count} <keyword words>` and returns the value tokens.
///
/// Keyword words must match exactly and nothing but a comment may follow them.
pub(crate) fn match_header<'a>(
    line: &'a str,
    value_count: usize,
    keyword: &str,
) -> Option<Vec<&'a str>> {
    let mut tokens = strip_comment(line).split_whitespace();
    let values: Vec<&str> = tokens.by_ref().take(value_count).collect();
    if values.len() != value_count {
        return None;
    }

    let mut words = keyword.split_whitespace();
    loop {
        match (tokens.next(), words.next()) {
            (None, None) => return Some(values),
            (Some(token), Some(word)) if token == word => continue,
            _ => return None,
        }
    }
}

pub(crate) fn match_section_title(line: &str, title: &str) -> bool {
    strip_comment(line).trim() == title
}

pub(crate) fn ensure_field_count(
    fields: &[&str],
    minimum: usize,
    line: usize,
    row: &str,
) -> KeyResult<()> {
    if fields.len() < minimum {
        return Err(KeyError::malformed(
            line,
            format!(
                "{} row has {} fields, expected at least {}",
                row,
                fields.len(),
                minimum
            ),
        ));
    }
    Ok(())
}

pub(crate) fn parse_int(token: &str, line: usize, field: &str) -> KeyResult<i64> {
    token
        .parse::<i64>()
        .map_err(|_| KeyError::malformed(line, format!("invalid {} '{}'", field, token)))
}

pub(crate) fn parse_float(token: &str, line: usize, field: &str) -> KeyResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| KeyError::malformed(line, format!("invalid {} '{}'", field, token)))
}

/// Reads a table body: one separator line, then up to `rows` data lines.
///
/// Running out of input early is not an error here; the row count is checked
/// by validation once the whole document has been read.
pub(crate) fn read_table_rows<R, F>(
    source: &mut LineSource<R>,
    rows: usize,
    mut parse_row: F,
) -> KeyResult<usize>
where
    R: BufRead,
    F: FnMut(usize, &[&str]) -> KeyResult<()>,
{
    if source.next_line()?.is_none() {
        return Ok(0);
    }

    let mut read = 0;
    while read < rows {
        let Some(line) = source.next_line()? else {
            break;
        };
        let fields = data_fields(&line.text);
        parse_row(line.number, &fields)?;
        read += 1;
    }
    Ok(read)
}

/// Number of data rows a Counter value announces; negative counts announce none.
pub(crate) fn announced_rows(count: i64) -> usize {
    usize::try_from(count).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{
        LineSource, data_fields, match_header, match_section_title, parse_float, parse_int,
        read_table_rows, trailing_comment,
    };
    use crate::domain::ErrorKind;
    use std::io::Cursor;

    #[test]
    fn line_source_numbers_lines_and_strips_line_endings() {
        let mut source = LineSource::new(Cursor::new("first\r\nsecond\n\nlast"));

        let first = source.next_line().expect("read").expect("line");
        assert_eq!((first.number, first.text.as_str()), (1, "first"));
        let second = source.next_line().expect("read").expect("line");
        assert_eq!((second.number, second.text.as_str()), (2, "second"));
        let blank = source.next_line().expect("read").expect("line");
        assert_eq!(blank.text, "");
        let last = source.next_line().expect("read").expect("line");
        assert_eq!((last.number, last.text.as_str()), (4, "last"));
        assert!(source.next_line().expect("read").is_none());
        assert_eq!(source.lines_consumed(), 4);
    }

    #[test]
    fn header_match_requires_exact_keyword_words() {
        assert_eq!(match_header("  12 atoms", 1, "atoms"), Some(vec!["12"]));
        assert_eq!(
            match_header("3 atom types # from builder", 1, "atom types"),
            Some(vec!["3"])
        );
        assert_eq!(
            match_header("-1.5 2.5 xlo xhi", 2, "xlo xhi"),
            Some(vec!["-1.5", "2.5"])
        );
        assert_eq!(match_header("3 atom types", 1, "atoms"), None);
        assert_eq!(match_header("2 atoms", 1, "atom types"), None);
        assert_eq!(match_header("2 atoms extra", 1, "atoms"), None);
        assert_eq!(match_header("# 2 atoms", 1, "atoms"), None);
        assert_eq!(match_header("atoms", 1, "atoms"), None);
    }

    #[test]
    fn section_titles_ignore_comments_and_padding() {
        assert!(match_section_title("Atoms # full", "Atoms"));
        assert!(match_section_title("  Masses  ", "Masses"));
        assert!(!match_section_title("Bond Coeffs", "Bonds"));
        assert_eq!(trailing_comment("Atoms # full"), Some("full"));
        assert_eq!(trailing_comment("Atoms #"), None);
        assert_eq!(trailing_comment("Atoms"), None);
    }

    #[test]
    fn data_fields_drop_trailing_comments() {
        assert_eq!(data_fields("1 12.011 # carbon"), vec!["1", "12.011"]);
        assert!(data_fields("# only a comment").is_empty());
    }

    #[test]
    fn numeric_parse_failures_are_malformed_lines() {
        assert_eq!(parse_int("7", 1, "id").expect("int"), 7);
        assert_eq!(parse_float("1e-3", 1, "mass").expect("float"), 1e-3);

        let error = parse_int("x", 9, "atom type").expect_err("not an int");
        assert_eq!(error.kind(), ErrorKind::MalformedLine);
        assert_eq!(error.to_string(), "line 9: invalid atom type 'x'");
    }

    #[test]
    fn table_reader_consumes_separator_then_requested_rows() {
        let mut source = LineSource::new(Cursor::new("\n1 a\n2 b\n3 c\n"));
        let mut seen = Vec::new();
        let read = read_table_rows(&mut source, 2, |line, fields| {
            seen.push((line, fields.join(" ")));
            Ok(())
        })
        .expect("rows should be read");

        assert_eq!(read, 2);
        assert_eq!(seen, vec![(2, "1 a".to_string()), (3, "2 b".to_string())]);
        let rest = source.next_line().expect("read").expect("line");
        assert_eq!(rest.text, "3 c");
    }

    #[test]
    fn table_reader_stops_quietly_at_end_of_stream() {
        let mut source = LineSource::new(Cursor::new("\n1 a\n"));
        let read = read_table_rows(&mut source, 5, |_, _| Ok(())).expect("short table");
        assert_eq!(read, 1);
    }
}
