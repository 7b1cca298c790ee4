use crate::config::FloatFormat;
use std::fs;
use std::path::Path;

const GENERAL_PLAIN_MIN: f64 = 1.0e-5;
const GENERAL_PLAIN_MAX: f64 = 1.0e16;

pub fn format_float(value: f64, format: FloatFormat) -> String {
    match format {
        FloatFormat::General => format_general_f64(value),
        FloatFormat::Fixed { precision } => format_fixed_f64(value, precision),
    }
}

pub fn format_general_f64(value: f64) -> String {
    let magnitude = value.abs();
    if value != 0.0
        && magnitude.is_finite()
        && !(GENERAL_PLAIN_MIN..GENERAL_PLAIN_MAX).contains(&magnitude)
    {
        format!("{value:e}")
    } else {
        format!("{value}")
    }
}

pub fn format_fixed_f64(value: f64, precision: usize) -> String {
    format!("{value:.precision$}", precision = precision)
}

/// Data-file text with `\n` line endings and a terminated last line.
pub fn normalize_data_text(content: &str) -> String {
    let mut normalized = String::with_capacity(content.len() + 1);
    for line in content.lines() {
        normalized.push_str(line.strip_suffix('\r').unwrap_or(line));
        normalized.push('\n');
    }
    normalized
}

/// Writes `content` with `\n` line endings, creating missing parent directories.
pub fn write_data_text(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, normalize_data_text(content))
}

#[cfg(test)]
mod tests {
    use super::{
        format_fixed_f64, format_float, format_general_f64, normalize_data_text, write_data_text,
    };
    use crate::config::FloatFormat;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn general_format_prints_shortest_plain_digits() {
        assert_eq!(format_general_f64(0.0), "0");
        assert_eq!(format_general_f64(1.0), "1");
        assert_eq!(format_general_f64(0.5), "0.5");
        assert_eq!(format_general_f64(-12.011), "-12.011");
        assert_eq!(format_general_f64(0.0001), "0.0001");
    }

    #[test]
    fn general_format_switches_to_exponent_at_extremes() {
        assert_eq!(format_general_f64(1.0e20), "1e20");
        assert_eq!(format_general_f64(-2.5e-7), "-2.5e-7");
        assert_eq!(format_general_f64(f64::INFINITY), "inf");

        for value in [1.0e20, -2.5e-7, 6.02214076e23, 1.0e-300] {
            let text = format_general_f64(value);
            assert_eq!(text.parse::<f64>().expect("rendered float parses"), value);
        }
    }

    #[test]
    fn fixed_format_is_deterministic() {
        assert_eq!(format_fixed_f64(1.23, 5), "1.23000");
        assert_eq!(
            format_float(0.5, FloatFormat::Fixed { precision: 2 }),
            "0.50"
        );
        assert_eq!(format_float(0.5, FloatFormat::General), "0.5");
    }

    #[test]
    fn data_text_is_normalized_to_unix_line_endings() {
        assert_eq!(
            normalize_data_text("water\r\n\r\n3 atoms\r\n2 atom types"),
            "water\n\n3 atoms\n2 atom types\n"
        );
        assert_eq!(normalize_data_text("Masses\n\n1 15.9994\n"), "Masses\n\n1 15.9994\n");
        assert_eq!(normalize_data_text(""), "");
    }

    #[test]
    fn rewriting_a_data_file_keeps_it_byte_for_byte() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("nested/water.data");
        let content = "water\r\n\r\n3 atoms\r\n\r\n-5 5 xlo xhi";

        write_data_text(&path, content).expect("first write should create the directory");
        let first = fs::read(&path).expect("data file should be readable");
        write_data_text(&path, content).expect("rewrite should succeed");

        assert_eq!(fs::read(&path).expect("data file should be readable"), first);
        assert_eq!(first, b"water\n\n3 atoms\n\n-5 5 xlo xhi\n");
    }
}
