//! Lazy row source over delimited log bytes

use std::io::{self, BufRead, Lines};

/// One non-blank data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based physical line number (the header is line 1)
    pub line_number: usize,
    /// Line text as read, without the line terminator
    pub raw: String,
    pub fields: Vec<String>,
}

/// Iterator over the data rows of a comma-separated log
///
/// Skips the header line and blank lines. Double quotes toggle quoting so
/// that a quoted field may contain commas; the quotes themselves are dropped
/// and every field is trimmed. Read failures (including invalid UTF-8) are
/// yielded as errors.
pub struct RowSource<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: BufRead> RowSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for RowSource<R> {
    type Item = io::Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            self.line_number += 1;

            if self.line_number == 1 || line.trim().is_empty() {
                continue;
            }

            return Some(Ok(Row {
                line_number: self.line_number,
                fields: split_fields(&line),
                raw: line,
            }));
        }
    }
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn rows(input: &str) -> Vec<Row> {
        RowSource::new(Cursor::new(input))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_skips_header_and_blank_lines() {
        let parsed = rows("a,b\n1,2\n\n   \n3,4\n");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].fields, vec!["1", "2"]);
        assert_eq!(parsed[0].line_number, 2);
        assert_eq!(parsed[1].fields, vec!["3", "4"]);
        assert_eq!(parsed[1].line_number, 5);
    }

    #[test]
    fn test_quoted_fields_keep_commas() {
        let parsed = rows("h\n\"1/15/2024, 10:30:45.123 AM\", 1.1.1.1 ,GET\n");

        assert_eq!(
            parsed[0].fields,
            vec!["1/15/2024, 10:30:45.123 AM", "1.1.1.1", "GET"]
        );
        assert_eq!(parsed[0].raw, "\"1/15/2024, 10:30:45.123 AM\", 1.1.1.1 ,GET");
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = rows("h\r\nx,y\r\n");
        assert_eq!(parsed[0].fields, vec!["x", "y"]);
    }

    #[test]
    fn test_header_only_input() {
        assert!(rows("timeGenerated,clientIp\n").is_empty());
        assert!(rows("").is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let bytes: &[u8] = b"h\n\xff\xfe,1\n";
        let mut source = RowSource::new(Cursor::new(bytes));
        assert!(source.next().unwrap().is_err());
    }
}
