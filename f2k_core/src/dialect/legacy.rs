//! Legacy dialect (B): `$ <name>` headers, positional records with quoted ids,
//! and a `UNITS <force> <length>` line found by sequential read.
//!
//! Data ends at a bare `$` line. Files touched by newer exporters may end at
//! the modern `END TABLE DATA` marker instead; both are accepted.

use crate::errors::{InterchangeError, InterchangeResult};
use crate::points::{Point3, PointId, PointRecord};
use crate::tables::TableStore;
use crate::units::{ForceUnit, LengthUnit, UnitPair};

use super::{parse_number, Dialect, DialectCodec, END_TABLE_DATA};

const SIGIL: char = '$';
const UNITS_TOKEN: &str = "UNITS";
const POINT_TOKEN: &str = "POINT";
const POINT_TABLE: &str = "POINT COORDINATES";

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyCodec;

impl DialectCodec for LegacyCodec {
    fn dialect(&self) -> Dialect {
        Dialect::Legacy
    }

    fn header_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = line.strip_prefix(SIGIL)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim();
        let name = match rest.strip_prefix('"') {
            Some(quoted) => quoted.split('"').next().unwrap_or(quoted),
            None => rest,
        };
        let name = name.trim();
        (!name.is_empty()).then_some(name)
    }

    fn is_terminator(&self, line: &str) -> bool {
        line.trim_end() == "$" || line.contains(END_TABLE_DATA)
    }

    fn header_line(&self, name: &str) -> String {
        format!("{} {}\n", SIGIL, name)
    }

    fn footer(&self) -> &'static str {
        "$\n$ END OF MODEL FILE\n"
    }

    fn parse_units(&self, _store: &TableStore, raw: &str) -> InterchangeResult<UnitPair> {
        for line in raw.lines() {
            let mut tokens = line.split_whitespace();
            if !tokens.any(|t| t.eq_ignore_ascii_case(UNITS_TOKEN)) {
                continue;
            }
            let (Some(force), Some(length)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            let force: ForceUnit = force.parse()?;
            let length: LengthUnit = length.parse()?;
            return Ok(UnitPair::new(force, length));
        }
        Err(InterchangeError::units_not_found(format!(
            "no '{} <force> <length>' line",
            UNITS_TOKEN
        )))
    }

    fn parse_point(&self, line: &str) -> Option<PointRecord> {
        let rest = line.trim_start();
        let (token, rest) = rest.split_once(char::is_whitespace)?;
        if !token.eq_ignore_ascii_case(POINT_TOKEN) {
            return None;
        }
        let (id, rest) = rest.trim_start().strip_prefix('"')?.split_once('"')?;

        let coords: Vec<f64> = rest
            .split_whitespace()
            .map(parse_number)
            .collect::<Option<Vec<f64>>>()?;
        let coord = match coords.as_slice() {
            [x, y] => Point3::new(*x, *y, 0.0),
            [x, y, z] => Point3::new(*x, *y, *z),
            _ => return None,
        };
        Some(PointRecord {
            id: PointId::Label(id.to_string()),
            coord,
            special: false,
        })
    }

    fn format_point(&self, record: &PointRecord) -> String {
        format!(
            "  {}  \"{}\"  {}  {}  {}\n",
            POINT_TOKEN, record.id, record.coord.x, record.coord.y, record.coord.z
        )
    }

    fn point_id(&self, number: u64) -> PointId {
        PointId::Label(number.to_string())
    }

    fn default_point_table(&self) -> &'static str {
        POINT_TABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_forms() {
        let codec = LegacyCodec;
        assert_eq!(codec.header_name("$ POINT COORDINATES"), Some("POINT COORDINATES"));
        assert_eq!(codec.header_name("$ \"POINT COORDINATES\""), Some("POINT COORDINATES"));
        assert_eq!(codec.header_name("$\tSTATIC LOADS  "), Some("STATIC LOADS"));
        assert_eq!(codec.header_name("$"), None);
        assert_eq!(codec.header_name("$NOSPACE"), None);
        assert_eq!(codec.header_name("  POINT \"1\" 0 0"), None);
    }

    #[test]
    fn test_both_terminators() {
        let codec = LegacyCodec;
        assert!(codec.is_terminator("$"));
        assert!(codec.is_terminator("$   "));
        assert!(codec.is_terminator("END TABLE DATA"));
        assert!(!codec.is_terminator("$ AREAS"));

        let text = "$ A\na\nEND TABLE DATA\n$ B\nb\n";
        let parsed = codec.parse(text).unwrap();
        assert!(parsed.terminated);
        assert_eq!(parsed.store.names(), vec!["A"]);
    }

    #[test]
    fn test_parse_units_by_sequential_read() {
        let raw = "$ File saved by exporter\n  PROGRAM \"SAFE\"\n  UNITS  Tonf  M\n$ AREAS\n";
        let units = LegacyCodec.parse_units(&TableStore::new(), raw).unwrap();
        assert_eq!(units, UnitPair::new(ForceUnit::Tonf, LengthUnit::M));

        let err = LegacyCodec.parse_units(&TableStore::new(), "$ AREAS\n").unwrap_err();
        assert_eq!(err.error_code(), "UNITS_NOT_FOUND");
    }

    #[test]
    fn test_parse_point_two_or_three_coords() {
        let two = LegacyCodec.parse_point("  POINT  \"12\"  3.5  -4").unwrap();
        assert_eq!(two.id, PointId::Label("12".to_string()));
        assert_eq!(two.coord, Point3::new(3.5, -4.0, 0.0));

        let three = LegacyCodec.parse_point("POINT \"A7\" 1 2 3").unwrap();
        assert_eq!(three.coord, Point3::new(1.0, 2.0, 3.0));

        assert!(LegacyCodec.parse_point("  POINT  \"1\"  0").is_none());
        assert!(LegacyCodec.parse_point("  POINT  1  0  0").is_none());
        assert!(LegacyCodec.parse_point("  AREA  \"1\"  0  0").is_none());
    }

    #[test]
    fn test_format_point_parses_back() {
        let record = PointRecord {
            id: PointId::Label("1001".to_string()),
            coord: Point3::new(2.82, 0.0, -1.5),
            special: false,
        };
        let line = LegacyCodec.format_point(&record);
        assert_eq!(line, "  POINT  \"1001\"  2.82  0  -1.5\n");
        assert_eq!(LegacyCodec.parse_point(&line), Some(record));
    }
}
