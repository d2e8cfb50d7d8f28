use std::borrow::Cow;

const DELIMITER: char = ',';

/// A small comma separated document. Fields containing the delimiter, a quote or a line break
/// are wrapped in quotes, with inner quotes doubled.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvDocument {
    content: String,
    rows: usize,
}

impl CsvDocument {
    pub fn with_header(header: &[&str]) -> Self {
        let mut document = Self {
            content: String::new(),
            rows: 0,
        };
        document.push_fields(header.iter().copied());
        document
    }

    pub fn push_row<'a>(&mut self, fields: impl IntoIterator<Item = &'a str>) {
        self.push_fields(fields);
        self.rows += 1;
    }

    fn push_fields<'a>(&mut self, fields: impl IntoIterator<Item = &'a str>) {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                self.content.push(DELIMITER);
            }
            self.content.push_str(&escape_field(field));
        }
        self.content.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Number of rows after the header.
    pub fn row_count(&self) -> usize {
        self.rows
    }
}

pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([DELIMITER, '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_field, CsvDocument};

    #[test]
    fn test_plain_fields_are_untouched() {
        assert_eq!(escape_field("Safari"), "Safari");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_special_fields_are_quoted() {
        assert_eq!(escape_field("a, b"), "\"a, b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_document_rows() {
        let mut document = CsvDocument::with_header(&["App Name", "Total Time (seconds)"]);
        document.push_row(["Visual Studio Code, Insiders", "42"]);
        document.push_row(["Terminal", "7"]);

        assert_eq!(
            document.as_str(),
            "App Name,Total Time (seconds)\n\"Visual Studio Code, Insiders\",42\nTerminal,7\n"
        );
        assert_eq!(document.row_count(), 2);
    }
}
