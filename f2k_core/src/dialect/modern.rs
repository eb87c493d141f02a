//! Modern dialect (A): `TABLE:  "<name>"` headers, `END TABLE DATA` terminator,
//! keyed `Field=Value` records.

use crate::errors::{InterchangeError, InterchangeResult};
use crate::points::{Point3, PointId, PointRecord};
use crate::tables::TableStore;
use crate::units::{ForceUnit, LengthUnit, UnitPair};

use super::{parse_number, Dialect, DialectCodec, END_TABLE_DATA};

const HEADER_TOKEN: &str = "TABLE:";
const PROGRAM_CONTROL: &str = "PROGRAM CONTROL";
const CURR_UNITS: &str = "CurrUnits=";
const POINT_TABLE: &str = "OBJECT GEOMETRY - POINT COORDINATES";

#[derive(Debug, Clone, Copy, Default)]
pub struct ModernCodec;

impl ModernCodec {
    /// Value of `Key=Value` in a whitespace-separated record line
    fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
        line.split_whitespace().find_map(|token| {
            let (k, v) = token.split_once('=')?;
            (k == key).then_some(v)
        })
    }
}

impl DialectCodec for ModernCodec {
    fn dialect(&self) -> Dialect {
        Dialect::Modern
    }

    fn header_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = line.strip_prefix(HEADER_TOKEN)?.trim_start();
        let rest = rest.strip_prefix('"')?;
        let end = rest.find('"')?;
        Some(&rest[..end])
    }

    fn is_terminator(&self, line: &str) -> bool {
        line.contains(END_TABLE_DATA)
    }

    fn header_line(&self, name: &str) -> String {
        format!("{}  \"{}\"\n", HEADER_TOKEN, name)
    }

    fn footer(&self) -> &'static str {
        "END TABLE DATA\n"
    }

    fn parse_units(&self, store: &TableStore, _raw: &str) -> InterchangeResult<UnitPair> {
        if !store.contains(PROGRAM_CONTROL) {
            return Err(InterchangeError::units_not_found(format!(
                "no '{}' table",
                PROGRAM_CONTROL
            )));
        }
        let content = store.get(PROGRAM_CONTROL);
        let start = content
            .find(CURR_UNITS)
            .ok_or_else(|| InterchangeError::units_not_found(format!("no {} field", CURR_UNITS)))?;
        let value = content[start + CURR_UNITS.len()..]
            .strip_prefix('"')
            .and_then(|rest| rest.split_once('"'))
            .map(|(value, _)| value)
            .ok_or_else(|| InterchangeError::units_not_found(format!("unquoted {} value", CURR_UNITS)))?;

        let mut parts = value.split(',');
        let force: ForceUnit = parts
            .next()
            .ok_or_else(|| InterchangeError::units_not_found("missing force unit"))?
            .parse()?;
        let length: LengthUnit = parts
            .next()
            .ok_or_else(|| InterchangeError::units_not_found(format!("missing length unit in \"{}\"", value)))?
            .parse()?;
        Ok(UnitPair::new(force, length))
    }

    fn parse_point(&self, line: &str) -> Option<PointRecord> {
        let id: u64 = Self::field(line, "Point")?.trim_matches('"').parse().ok()?;
        let x = parse_number(Self::field(line, "GlobalX")?)?;
        let y = parse_number(Self::field(line, "GlobalY")?)?;
        let z = parse_number(Self::field(line, "GlobalZ")?)?;
        let special = Self::field(line, "SpecialPt").is_some_and(|v| v.eq_ignore_ascii_case("Yes"));
        Some(PointRecord {
            id: PointId::Number(id),
            coord: Point3::new(x, y, z),
            special,
        })
    }

    fn format_point(&self, record: &PointRecord) -> String {
        format!(
            "   Point={}   GlobalX={}   GlobalY={}   GlobalZ={}   SpecialPt={}\n",
            record.id,
            record.coord.x,
            record.coord.y,
            record.coord.z,
            if record.special { "Yes" } else { "No" }
        )
    }

    fn point_id(&self, number: u64) -> PointId {
        PointId::Number(number)
    }

    fn default_point_table(&self) -> &'static str {
        POINT_TABLE
    }
}
