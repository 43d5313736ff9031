//! Minimal CSV reader for the dataset format.
//!
//! The header must name `measure`, `comparison`, `group` and `value` (any order);
//! a `color` column is optional and other columns are ignored. Fields may be
//! quoted with `"` and embed `""` escapes. Blank lines are skipped.
use crate::data::Row;
use crate::error::{Error, Result};

const REQUIRED: [&str; 4] = ["measure", "comparison", "group", "value"];

/// Parses CSV text into rows.
pub fn parse_rows(input: &str) -> Result<Vec<Row>> {
    let records = parse_records(input)?;
    let mut iter = records.into_iter();
    let Some((header_line, header)) = iter.next() else {
        return Err(Error::load(1, "empty dataset"));
    };

    let column = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::load(header_line, format!("missing column '{name}'")))
    };
    let [measure, comparison, group, value] = [
        column(REQUIRED[0])?,
        column(REQUIRED[1])?,
        column(REQUIRED[2])?,
        column(REQUIRED[3])?,
    ];
    let color = header
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("color"));

    let mut rows = Vec::new();
    for (line, fields) in iter {
        let field = |idx: usize| -> Result<&str> {
            fields
                .get(idx)
                .map(|s| s.trim())
                .ok_or_else(|| Error::load(line, format!("expected at least {} fields", idx + 1)))
        };
        let raw_value = field(value)?;
        let parsed: f64 = raw_value
            .parse()
            .map_err(|_| Error::load(line, format!("invalid value '{raw_value}'")))?;
        if !parsed.is_finite() {
            return Err(Error::load(line, format!("invalid value '{raw_value}'")));
        }
        let color = color
            .and_then(|idx| fields.get(idx))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        rows.push(Row {
            measure: field(measure)?.to_owned(),
            comparison: field(comparison)?.to_owned(),
            group: field(group)?.to_owned(),
            value: parsed,
            color,
        });
    }
    Ok(rows)
}

/// Splits CSV text into records, each tagged with its 1-based starting line.
fn parse_records(input: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut p = CsvParser::new(input);
    let mut records = Vec::new();
    loop {
        p.consume_blank_lines();
        if p.eof() {
            break;
        }
        let line = p.line;
        let mut fields = vec![p.parse_field()?];
        while p.try_consume_char(',') {
            fields.push(p.parse_field()?);
        }
        if !p.try_consume_newline() && !p.eof() {
            return Err(Error::load(p.line, "expected end of record"));
        }
        records.push((line, fields));
    }
    Ok(records)
}

struct CsvParser<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> CsvParser<'a> {
    fn new(input: &'a str) -> Self {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn try_consume_char(&mut self, ch: char) -> bool {
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn try_consume_newline(&mut self) -> bool {
        match self.peek_char() {
            Some('\n') => {
                self.pos += 1;
                self.line += 1;
                true
            }
            Some('\r') => {
                self.pos += 1;
                if self.peek_char() == Some('\n') {
                    self.pos += 1;
                }
                self.line += 1;
                true
            }
            _ => false,
        }
    }

    fn consume_blank_lines(&mut self) {
        loop {
            let rest = self.rest();
            let blank = rest
                .find(['\n', '\r'])
                .map(|end| rest[..end].trim().is_empty())
                .unwrap_or(false);
            if !blank {
                // Trailing whitespace without a newline ends the input.
                if rest.trim().is_empty() {
                    self.pos = self.input.len();
                }
                return;
            }
            while matches!(self.peek_char(), Some(c) if c != '\n' && c != '\r') {
                self.pos += self.peek_char().map_or(1, char::len_utf8);
            }
            self.try_consume_newline();
        }
    }

    fn parse_field(&mut self) -> Result<String> {
        if self.try_consume_char('"') {
            let mut out = String::new();
            loop {
                match self.peek_char() {
                    None => return Err(Error::load(self.line, "unterminated quoted field")),
                    Some('"') => {
                        self.pos += 1;
                        if self.try_consume_char('"') {
                            out.push('"');
                        } else {
                            break;
                        }
                    }
                    Some(ch) => {
                        if ch == '\n' {
                            self.line += 1;
                        }
                        out.push(ch);
                        self.pos += ch.len_utf8();
                    }
                }
            }
            Ok(out)
        } else {
            let rest = self.rest();
            let end = rest.find([',', '\n', '\r']).unwrap_or(rest.len());
            let field = rest[..end].to_owned();
            self.pos += end;
            Ok(field)
        }
    }
}
