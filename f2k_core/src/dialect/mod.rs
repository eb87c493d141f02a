//! # Dialect Codecs
//!
//! F2K files come in two textual dialects:
//!
//! - **Modern**: tables open with `TABLE:  "<name>"` and the data ends at a
//!   line containing `END TABLE DATA`.
//! - **Legacy**: tables open with `$ <name>` (optionally quoted) and the data
//!   ends at a bare `$` line or, in files written by newer exporters, at the
//!   modern `END TABLE DATA` marker.
//!
//! Both share one contract, [`DialectCodec`]. The trait's provided methods
//! implement the parse state machine and the serializer; each dialect only
//! supplies its line predicates, header/footer text, unit declaration lookup
//! and point record format.
//!
//! ## Parse state machine
//!
//! ```text
//! Outside ──header──▶ InTable(name, buffer)
//! InTable ──header──▶ InTable(new name)      (previous buffer flushed)
//! InTable ──terminator──▶ done               (buffer flushed)
//! InTable ──other line──▶ InTable            (line appended verbatim)
//! InTable ──end of input──▶ done             (flushed, TruncatedInput warning)
//! ```
//!
//! Lines outside any table are not retained.

pub mod legacy;
pub mod modern;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{InterchangeError, InterchangeResult, InterchangeWarning};
use crate::points::{PointId, PointRecord};
use crate::tables::TableStore;
use crate::units::UnitPair;

pub use legacy::LegacyCodec;
pub use modern::ModernCodec;

/// End-of-data marker of the modern dialect, also honored by legacy files
pub const END_TABLE_DATA: &str = "END TABLE DATA";

static MODERN: ModernCodec = ModernCodec;
static LEGACY: LegacyCodec = LegacyCodec;

/// The two supported F2K dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Quoted `TABLE:` headers (dialect A)
    #[default]
    #[serde(alias = "a")]
    Modern,
    /// `$` sigil headers (dialect B)
    #[serde(alias = "b")]
    Legacy,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::Modern, Dialect::Legacy];

    /// Codec implementing this dialect
    pub fn codec(&self) -> &'static dyn DialectCodec {
        match self {
            Dialect::Modern => &MODERN,
            Dialect::Legacy => &LEGACY,
        }
    }

    /// Dialect of the first recognizable header line in `raw`
    pub fn detect(raw: &str) -> Option<Dialect> {
        raw.lines().find_map(|line| {
            Dialect::ALL
                .into_iter()
                .find(|dialect| dialect.codec().header_name(line).is_some())
        })
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Dialect::Modern => "modern",
            Dialect::Legacy => "legacy",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Dialect {
    type Err = InterchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modern" | "a" => Ok(Dialect::Modern),
            "legacy" | "b" => Ok(Dialect::Legacy),
            other => Err(InterchangeError::invalid_input(
                "dialect",
                other,
                "Expected 'modern' (a) or 'legacy' (b)",
            )),
        }
    }
}

/// Result of parsing raw text into tables
#[derive(Debug, Clone)]
pub struct ParsedTables {
    pub store: TableStore,
    pub warnings: Vec<InterchangeWarning>,
    /// True if the terminator line was reached
    pub terminated: bool,
}

enum ParseState<'a> {
    Outside,
    InTable { name: &'a str, buffer: String },
}

/// Textual syntax of one F2K dialect.
pub trait DialectCodec: Sync {
    fn dialect(&self) -> Dialect;

    /// Table name if `line` is a header line
    fn header_name<'a>(&self, line: &'a str) -> Option<&'a str>;

    /// True if `line` ends the table data
    fn is_terminator(&self, line: &str) -> bool;

    /// Header line for `name`, newline included
    fn header_line(&self, name: &str) -> String;

    /// Text emitted after the last table
    fn footer(&self) -> &'static str;

    /// Active force/length units of a parsed file.
    ///
    /// `raw` is the full source text, for dialects that locate the unit
    /// declaration by sequential read rather than by table.
    fn parse_units(&self, store: &TableStore, raw: &str) -> InterchangeResult<UnitPair>;

    /// Point record encoded by `line`, if it matches the point pattern
    fn parse_point(&self, line: &str) -> Option<PointRecord>;

    /// Point record line, newline included
    fn format_point(&self, record: &PointRecord) -> String;

    /// Identifier for a newly allocated point number
    fn point_id(&self, number: u64) -> PointId;

    /// Table holding point coordinates when none is configured
    fn default_point_table(&self) -> &'static str;

    /// Parse `raw` into a table store (see the module docs for the state machine)
    fn parse(&self, raw: &str) -> InterchangeResult<ParsedTables> {
        self.parse_source(raw, "<text>")
    }

    /// [`DialectCodec::parse`] with a source name used in errors and logs
    fn parse_source(&self, raw: &str, source_name: &str) -> InterchangeResult<ParsedTables> {
        let mut store = TableStore::new();
        let mut warnings = Vec::new();
        let mut state = ParseState::Outside;
        let mut saw_header = false;
        let mut terminated = false;

        for line in raw.lines() {
            if self.is_terminator(line) {
                if let ParseState::InTable { name, buffer } = std::mem::replace(&mut state, ParseState::Outside) {
                    store.append(name, &buffer);
                }
                terminated = true;
                break;
            }

            if let Some(name) = self.header_name(line) {
                if let ParseState::InTable { name: open, buffer } = std::mem::replace(&mut state, ParseState::Outside) {
                    store.append(open, &buffer);
                }
                debug!(table = name, dialect = %self.dialect(), "opening table");
                saw_header = true;
                state = ParseState::InTable {
                    name,
                    buffer: String::new(),
                };
                continue;
            }

            if let ParseState::InTable { buffer, .. } = &mut state {
                buffer.push_str(line);
                buffer.push('\n');
            }
        }

        if !saw_header {
            return Err(InterchangeError::format_mismatch(self.dialect(), source_name));
        }

        if let ParseState::InTable { name, buffer } = state {
            warn!(table = name, source = source_name, "input ended inside an open table");
            store.append(name, &buffer);
            warnings.push(InterchangeWarning::TruncatedInput {
                table: name.to_string(),
            });
        }

        Ok(ParsedTables {
            store,
            warnings,
            terminated,
        })
    }

    /// Emit every table in store order, then the footer
    fn serialize(&self, store: &TableStore) -> String {
        let mut out = String::new();
        for table in store.iter() {
            out.push_str(&self.header_line(&table.name));
            out.push_str(&table.content);
            if !table.content.is_empty() && !table.content.ends_with('\n') {
                out.push('\n');
            }
        }
        out.push_str(self.footer());
        out
    }
}

/// Parse a coordinate token, tolerating surrounding quotes
pub(crate) fn parse_number(token: &str) -> Option<f64> {
    token.trim().trim_matches('"').parse::<f64>().ok().filter(|v| v.is_finite())
}
