//! CSV tokenizing into rows of string fields.

use std::fmt;
use std::io::Read;

use crate::error::Result;

/// Quote character configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quote {
    /// No quoting.
    None,
    /// Quote with the specified character.
    Some(u8),
}

impl Default for Quote {
    fn default() -> Self {
        Quote::Some(b'"')
    }
}

impl Quote {
    /// Returns the quote character if set.
    pub fn char(&self) -> Option<u8> {
        match self {
            Quote::None => None,
            Quote::Some(c) => Some(*c),
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quote::None => write!(f, "none"),
            Quote::Some(c) => write!(f, "{}", *c as char),
        }
    }
}

/// Field splitting options for the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Field delimiter character.
    pub delimiter: u8,
    /// Quote character configuration.
    pub quote: Quote,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: Quote::default(),
        }
    }
}

/// Streaming iterator over the rows of a CSV source.
///
/// Rows are not assumed to be rectangular: every row is yielded with the
/// number of fields it actually has. The first row is not treated specially.
pub struct RowReader<R: Read> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
    failed: bool,
}

impl<R: Read> RowReader<R> {
    /// Create a row reader over `source`.
    pub fn new(source: R, options: &TokenizerOptions) -> Self {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(options.delimiter)
            .has_headers(false)
            .flexible(true);

        match options.quote {
            Quote::None => {
                builder.quoting(false);
            }
            Quote::Some(q) => {
                builder.quoting(true);
                builder.quote(q);
            }
        }

        Self {
            reader: builder.from_reader(source),
            record: csv::StringRecord::new(),
            failed: false,
        }
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(Ok(self
                .record
                .iter()
                .map(std::string::ToString::to_string)
                .collect())),
            Ok(false) => None,
            Err(e) => {
                // Stop after the first error; the caller abandons the import
                self.failed = true;
                Some(Err(e.into()))
            }
        }
    }
}

/// Tokenize already decoded text.
pub fn tokenize_str<'a>(text: &'a str, options: &TokenizerOptions) -> RowReader<&'a [u8]> {
    RowReader::new(text.as_bytes(), options)
}

/// Returns true for the row a tokenizer produces from a blank line: exactly
/// one empty field.
pub fn is_blank_row<S: AsRef<str>>(row: &[S]) -> bool {
    matches!(row, [only] if only.as_ref().is_empty())
}
