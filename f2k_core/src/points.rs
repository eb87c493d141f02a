//! # Point Registry
//!
//! Coordinate -> identifier map for the point table of an F2K file.
//!
//! The registry guarantees that no two records lie within matching tolerance
//! of each other once registration went through it: a coordinate close to a
//! known point resolves to that point's id instead of creating a duplicate.
//! This keeps repeated exports of the same model from piling up copies of
//! the same point.
//!
//! New ids come from an [`IdAllocator`] seeded above a reserved base, so ids
//! generated in this session never collide with ids already in the file.
//!
//! ## Example
//!
//! ```rust
//! use f2k_core::dialect::Dialect;
//! use f2k_core::points::{IdAllocator, Point3, PointId, PointRegistry};
//!
//! let codec = Dialect::Modern.codec();
//! let mut registry = PointRegistry::new("OBJECT GEOMETRY - POINT COORDINATES");
//! registry.load_existing(
//!     "   Point=115   GlobalX=2820   GlobalY=0   GlobalZ=0   SpecialPt=No\n",
//!     codec,
//! );
//!
//! let mut ids = IdAllocator::new(1000);
//! ids.observe_all(registry.records());
//!
//! let hit = registry.find_or_register(Point3::new(2820.0005, 0.0, 0.0), 0.001, &mut ids, codec)?;
//! assert_eq!(hit.id, PointId::Number(115));
//! assert!(!hit.is_new);
//!
//! let miss = registry.find_or_register(Point3::new(2820.0, 20.0, 0.0), 0.001, &mut ids, codec)?;
//! assert_eq!(miss.id, PointId::Number(1001));
//! assert!(miss.is_new);
//! # Ok::<(), f2k_core::errors::InterchangeError>(())
//! ```

use std::fmt;

use crate::dialect::DialectCodec;
use crate::errors::{InterchangeError, InterchangeResult};

/// Reserved base for point ids generated by ordinary producers
pub const DEFAULT_RESERVED_BASE: u64 = 1_000;

/// Reserved base for producers that emit very large point counts
pub const HIGH_VOLUME_RESERVED_BASE: u64 = 1_000_000;

/// A 3-D coordinate in the file's native length unit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point3 { x, y, z }
    }

    /// Multiply every axis by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Point3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// True if every axis differs from `other` by at most `tolerance`
    pub fn within(&self, other: &Point3, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Point identifier.
///
/// The modern dialect numbers points with plain integers; the legacy dialect
/// uses quoted labels, which are usually (but not always) numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PointId {
    Number(u64),
    Label(String),
}

impl PointId {
    /// Numeric value of the id, if it has one
    pub fn numeric_value(&self) -> Option<u64> {
        match self {
            PointId::Number(n) => Some(*n),
            PointId::Label(label) => label.trim().parse().ok(),
        }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Number(n) => write!(f, "{}", n),
            PointId::Label(label) => f.write_str(label),
        }
    }
}

/// One point record of a point table
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub id: PointId,
    pub coord: Point3,
    /// Modern-dialect `SpecialPt` flag; always false for legacy records
    pub special: bool,
}

/// Outcome of [`PointRegistry::find_or_register`]
#[derive(Debug, Clone, PartialEq)]
pub struct PointMatch {
    pub id: PointId,
    /// True when the point was created by this call
    pub is_new: bool,
}

/// Hands out point ids above every id seen so far and above a reserved base.
///
/// One allocator serves a whole session, so ids stay unique across all
/// point tables and all producers writing into that session.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    reserved_base: u64,
    highest_known: u64,
}

impl IdAllocator {
    pub fn new(reserved_base: u64) -> Self {
        IdAllocator {
            reserved_base,
            highest_known: 0,
        }
    }

    pub fn reserved_base(&self) -> u64 {
        self.reserved_base
    }

    /// Record an existing id so it is never handed out
    pub fn observe(&mut self, id: &PointId) {
        if let Some(n) = id.numeric_value() {
            self.highest_known = self.highest_known.max(n);
        }
    }

    pub fn observe_all<'a>(&mut self, records: impl IntoIterator<Item = &'a PointRecord>) {
        for record in records {
            self.observe(&record.id);
        }
    }

    /// `max(highest known id, reserved base) + 1`, then remembered as known.
    ///
    /// Fails once the id space above the highest known id is used up.
    pub fn next_id(&mut self) -> InterchangeResult<u64> {
        let floor = self.highest_known.max(self.reserved_base);
        let id = floor.checked_add(1).ok_or_else(|| {
            InterchangeError::invalid_input("point id", floor.to_string(), "No point ids left above this id")
        })?;
        self.highest_known = id;
        Ok(id)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        IdAllocator::new(DEFAULT_RESERVED_BASE)
    }
}

/// Known points of one table.
#[derive(Debug, Clone)]
pub struct PointRegistry {
    table: String,
    records: Vec<PointRecord>,
    created: usize,
}

impl PointRegistry {
    /// Create an empty registry owned by `table`
    pub fn new(table: impl Into<String>) -> Self {
        PointRegistry {
            table: table.into(),
            records: Vec::new(),
            created: 0,
        }
    }

    /// Name of the table these points live in
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Extract every point record `codec` recognizes in `content`.
    ///
    /// Lines that do not match the dialect's point pattern are skipped.
    /// Returns the number of records added.
    pub fn load_existing(&mut self, content: &str, codec: &dyn DialectCodec) -> usize {
        let before = self.records.len();
        self.records
            .extend(content.lines().filter_map(|line| codec.parse_point(line)));
        self.records.len() - before
    }

    /// Replace the known records with the points found in `content`.
    ///
    /// The count of records created in this session is kept.
    pub fn reload(&mut self, content: &str, codec: &dyn DialectCodec) -> usize {
        self.records.clear();
        self.load_existing(content, codec)
    }

    /// First known record within `tolerance` of `coord` on every axis
    pub fn find(&self, coord: Point3, tolerance: f64) -> Option<&PointRecord> {
        self.records.iter().find(|r| r.coord.within(&coord, tolerance))
    }

    /// Resolve `coord` to a known point, or create one.
    ///
    /// Coordinates and tolerance are in the file's length unit. A created
    /// record is appended to the registry; writing its line into the table
    /// is the caller's job (see [`PointRegistry::last_created`]).
    pub fn find_or_register(
        &mut self,
        coord: Point3,
        tolerance: f64,
        ids: &mut IdAllocator,
        codec: &dyn DialectCodec,
    ) -> InterchangeResult<PointMatch> {
        if !coord.is_finite() {
            return Err(InterchangeError::invalid_input(
                "coord",
                format!("({}, {}, {})", coord.x, coord.y, coord.z),
                "Point coordinates must be finite",
            ));
        }
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(InterchangeError::invalid_input(
                "tolerance",
                tolerance.to_string(),
                "Tolerance must be a non-negative number",
            ));
        }

        if let Some(existing) = self.find(coord, tolerance) {
            return Ok(PointMatch {
                id: existing.id.clone(),
                is_new: false,
            });
        }

        let id = codec.point_id(ids.next_id()?);
        self.records.push(PointRecord {
            id: id.clone(),
            coord,
            special: false,
        });
        self.created += 1;
        Ok(PointMatch { id, is_new: true })
    }

    /// The most recently created record, if any was created in this session
    pub fn last_created(&self) -> Option<&PointRecord> {
        if self.created == 0 {
            return None;
        }
        self.records.last()
    }

    pub fn records(&self) -> &[PointRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records created in this session (as opposed to loaded)
    pub fn created_count(&self) -> usize {
        self.created
    }
}
