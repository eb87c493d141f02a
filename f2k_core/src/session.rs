//! # Interchange Session
//!
//! One read-modify-write cycle over an F2K file: parse the source through a
//! dialect codec, let feature producers append to tables and register points,
//! then serialize everything back out.
//!
//! ```text
//! source file ──parse──▶ TableStore ──▶ UnitPair (program control)
//!                                   └─▶ PointRegistry per point table
//! producers ──append / replace / find_or_register_point──▶ session
//! session ──serialize──▶ destination file
//! ```
//!
//! The registry of a point table is the source of truth for which points
//! exist. Points created through the session are written into the table as
//! they are registered; content appended or replaced by producers is read
//! back into the registry so the two never disagree.
//!
//! ## Example
//!
//! ```rust
//! use f2k_core::config::SessionConfig;
//! use f2k_core::points::{Point3, PointId};
//! use f2k_core::session::InterchangeSession;
//! use f2k_core::units::QuantityKind;
//!
//! let source = "TABLE:  \"PROGRAM CONTROL\"\n\
//!               \x20  ProgramName=SAFE   CurrUnits=\"KN, m, C\"\n\
//!               TABLE:  \"OBJECT GEOMETRY - POINT COORDINATES\"\n\
//!               \x20  Point=115   GlobalX=2820   GlobalY=0   GlobalZ=0   SpecialPt=No\n\
//!               END TABLE DATA\n";
//!
//! let mut session = InterchangeSession::from_text(source, SessionConfig::default())?;
//!
//! let hit = session.find_or_register_point(Point3::new(2820.0, 0.0, 0.0))?;
//! assert_eq!(hit.id, PointId::Number(115));
//!
//! // producers model in N and mm by default; the file is in KN and m
//! let thickness = session.convert(250.0, QuantityKind::Length)?;
//! assert!((thickness - 0.25).abs() < 1e-12);
//!
//! session.append_to_table("SLAB PROPERTIES", "   Slab=S250   Thickness=0.25\n");
//! assert!(session.serialize().contains("TABLE:  \"SLAB PROPERTIES\""));
//! # Ok::<(), f2k_core::errors::InterchangeError>(())
//! ```

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::dialect::{Dialect, DialectCodec};
use crate::errors::{InterchangeError, InterchangeResult, InterchangeWarning};
use crate::file_io::{read_source, write_atomic};
use crate::points::{IdAllocator, Point3, PointId, PointMatch, PointRegistry};
use crate::tables::TableStore;
use crate::units::{QuantityKind, UnitPair};

/// A read-modify-write session over one F2K file.
pub struct InterchangeSession {
    config: SessionConfig,
    codec: &'static dyn DialectCodec,
    store: TableStore,
    registries: Vec<PointRegistry>,
    ids: IdAllocator,
    file_units: Option<UnitPair>,
    units_issue: Option<String>,
    warnings: Vec<InterchangeWarning>,
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
}

impl InterchangeSession {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open `source` with the configured dialect. The destination defaults
    /// to the source path.
    pub fn open(source: impl AsRef<Path>, config: SessionConfig) -> InterchangeResult<Self> {
        let path = source.as_ref();
        let raw = read_source(path)?;
        let mut session = Self::from_source(&raw, &path.display().to_string(), config)?;
        session.source = Some(path.to_path_buf());
        session.destination = Some(path.to_path_buf());
        Ok(session)
    }

    /// Open `source`, choosing the dialect from its first header line
    /// instead of the configured one.
    pub fn open_detected(source: impl AsRef<Path>, mut config: SessionConfig) -> InterchangeResult<Self> {
        let path = source.as_ref();
        let raw = read_source(path)?;
        config.dialect = Dialect::detect(&raw)
            .ok_or_else(|| InterchangeError::format_mismatch(config.dialect, path.display().to_string()))?;
        let mut session = Self::from_source(&raw, &path.display().to_string(), config)?;
        session.source = Some(path.to_path_buf());
        session.destination = Some(path.to_path_buf());
        Ok(session)
    }

    /// Session over in-memory text. Set a destination before calling
    /// [`InterchangeSession::write`], or use [`InterchangeSession::write_to`].
    pub fn from_text(raw: &str, config: SessionConfig) -> InterchangeResult<Self> {
        Self::from_source(raw, "<text>", config)
    }

    /// Write-only session with an empty store.
    pub fn create(destination: impl Into<PathBuf>, config: SessionConfig) -> InterchangeResult<Self> {
        config.validate()?;
        let codec = config.dialect.codec();
        let file_units = config.file_units;
        let units_issue = file_units
            .is_none()
            .then(|| "write-only session without configured file units".to_string());

        let mut session = InterchangeSession {
            codec,
            store: TableStore::new(),
            registries: Vec::new(),
            ids: IdAllocator::new(config.reserved_id_base),
            file_units,
            units_issue,
            warnings: Vec::new(),
            source: None,
            destination: Some(destination.into()),
            config,
        };
        session.seed_registries();
        info!(dialect = %session.codec.dialect(), "created write-only session");
        Ok(session)
    }

    /// Send output to `destination` instead of the source path
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    fn from_source(raw: &str, source_name: &str, config: SessionConfig) -> InterchangeResult<Self> {
        config.validate()?;
        let codec = config.dialect.codec();
        let parsed = codec.parse_source(raw, source_name)?;

        let (file_units, units_issue) = match codec.parse_units(&parsed.store, raw) {
            Ok(declared) => {
                if let Some(configured) = config.file_units.filter(|c| *c != declared) {
                    warn!(%declared, %configured, "file declares other units than configured; using the file's");
                }
                (Some(declared), None)
            }
            Err(err) => match config.file_units {
                Some(configured) => {
                    info!(%configured, reason = %err, "no unit declaration in file; using configured units");
                    (Some(configured), None)
                }
                None => {
                    warn!(reason = %err, "no unit declaration in file and none configured");
                    (None, Some(err.to_string()))
                }
            },
        };

        let mut session = InterchangeSession {
            codec,
            store: parsed.store,
            registries: Vec::new(),
            ids: IdAllocator::new(config.reserved_id_base),
            file_units,
            units_issue,
            warnings: parsed.warnings,
            source: None,
            destination: None,
            config,
        };
        session.seed_registries();

        info!(
            source = source_name,
            dialect = %session.codec.dialect(),
            tables = session.store.len(),
            points = session.registries.iter().map(PointRegistry::len).sum::<usize>(),
            "opened interchange session"
        );
        Ok(session)
    }

    /// Seed the configured point tables, then every other table that holds
    /// point records, so all ids in the source are known before any is
    /// allocated
    fn seed_registries(&mut self) {
        for table in self.config.resolved_point_tables() {
            self.registry_index(&table);
        }

        let others: Vec<String> = self
            .store
            .iter()
            .filter(|t| self.registries.iter().all(|r| r.table() != t.name))
            .filter(|t| holds_points(self.codec, &t.content))
            .map(|t| t.name.clone())
            .collect();
        for table in others {
            self.registry_index(&table);
        }
    }

    /// Re-read the points of `name` after its content changed
    fn resync_registry(&mut self, name: &str) {
        match self.registries.iter().position(|r| r.table() == name) {
            Some(index) => {
                let registry = &mut self.registries[index];
                registry.reload(self.store.get(name), self.codec);
                self.ids.observe_all(registry.records());
            }
            None => {
                if holds_points(self.codec, self.store.get(name)) {
                    self.registry_index(name);
                }
            }
        }
    }

    /// Index of the registry for `table`, seeding it from the table's
    /// current content on first use
    fn registry_index(&mut self, table: &str) -> usize {
        if let Some(index) = self.registries.iter().position(|r| r.table() == table) {
            return index;
        }

        let mut registry = PointRegistry::new(table);
        let content = self.store.get(table);
        let loaded = registry.load_existing(content, self.codec);
        if loaded == 0 && !content.trim().is_empty() {
            let warning = InterchangeWarning::PointPatternUnrecognized {
                table: table.to_string(),
            };
            warn!(table, dialect = %self.codec.dialect(), "{}", warning);
            self.warnings.push(warning);
        }
        self.ids.observe_all(registry.records());
        self.registries.push(registry);
        self.registries.len() - 1
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    /// Content of a table (`""` if absent)
    pub fn table(&self, name: &str) -> &str {
        self.store.get(name)
    }

    /// Concatenate `text` after the table's content, creating the table if needed
    pub fn append_to_table(&mut self, name: &str, text: &str) {
        self.store.append(name, text);
        self.resync_registry(name);
    }

    /// Overwrite the table's content
    pub fn replace_table(&mut self, name: &str, text: &str) {
        self.store.replace(name, text);
        self.resync_registry(name);
    }

    /// Table names in output order
    pub fn table_names(&self) -> Vec<&str> {
        self.store.names()
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Points
    // ------------------------------------------------------------------

    /// Resolve a coordinate (file units) in the default point table using
    /// the session tolerance
    pub fn find_or_register_point(&mut self, coord: Point3) -> InterchangeResult<PointMatch> {
        self.find_or_register_point_with(coord, None)
    }

    /// Like [`InterchangeSession::find_or_register_point`], with an
    /// optional tolerance override (file length units)
    pub fn find_or_register_point_with(
        &mut self,
        coord: Point3,
        tolerance: Option<f64>,
    ) -> InterchangeResult<PointMatch> {
        let table = self.default_point_table();
        let tolerance = tolerance.unwrap_or(self.config.point_tolerance);
        self.find_or_register_point_in(&table, coord, tolerance)
    }

    /// Resolve a coordinate (file units) in `table` with an explicit tolerance.
    ///
    /// A new point gets the next session-wide id and its record line is
    /// appended to `table`.
    pub fn find_or_register_point_in(
        &mut self,
        table: &str,
        coord: Point3,
        tolerance: f64,
    ) -> InterchangeResult<PointMatch> {
        let index = self.registry_index(table);
        let registry = &mut self.registries[index];
        let found = registry.find_or_register(coord, tolerance, &mut self.ids, self.codec)?;

        if found.is_new {
            if let Some(record) = registry.last_created() {
                let mut line = self.codec.format_point(record);
                let current = self.store.get(table);
                if !current.is_empty() && !current.ends_with('\n') {
                    line.insert(0, '\n');
                }
                self.store.append(table, &line);
                debug!(table, id = %found.id, x = coord.x, y = coord.y, z = coord.z, "registered point");
            }
        }
        Ok(found)
    }

    /// Resolve a coordinate given in model units, scaling it to file units first
    pub fn find_or_register_model_point(&mut self, coord: Point3) -> InterchangeResult<PointMatch> {
        let factor = self.convert(1.0, QuantityKind::Length)?;
        self.find_or_register_point(coord.scaled(factor))
    }

    /// Resolve a sequence of file-unit coordinates in order, e.g. the corners
    /// of an area or the vertices of a strip
    pub fn register_polyline(&mut self, coords: &[Point3]) -> InterchangeResult<Vec<PointId>> {
        coords
            .iter()
            .map(|&coord| self.find_or_register_point(coord).map(|found| found.id))
            .collect()
    }

    /// Registry of `table`, if it has been seeded
    pub fn points(&self, table: &str) -> Option<&PointRegistry> {
        self.registries.iter().find(|r| r.table() == table)
    }

    /// Name of the table new points go to by default
    pub fn default_point_table(&self) -> String {
        self.config
            .resolved_point_tables()
            .into_iter()
            .next()
            .unwrap_or_else(|| self.codec.default_point_table().to_string())
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    /// Active file units
    pub fn units(&self) -> InterchangeResult<UnitPair> {
        self.file_units.ok_or_else(|| {
            InterchangeError::units_not_found(
                self.units_issue
                    .clone()
                    .unwrap_or_else(|| "file units unknown".to_string()),
            )
        })
    }

    /// Set the file units explicitly (e.g. after `UnitsNotFound`)
    pub fn set_file_units(&mut self, units: UnitPair) {
        self.file_units = Some(units);
        self.units_issue = None;
    }

    /// Convert a value from the producers' model units into file units
    pub fn convert(&self, value: f64, kind: QuantityKind) -> InterchangeResult<f64> {
        let file_units = self.units()?;
        Ok(self.config.model_units.convert_to(value, kind, &file_units))
    }

    /// Convert a value between two arbitrary unit pairs
    pub fn convert_between(&self, value: f64, kind: QuantityKind, from: UnitPair, to: UnitPair) -> f64 {
        from.convert_to(value, kind, &to)
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Serialize every table through the session's dialect
    pub fn serialize(&self) -> String {
        self.codec.serialize(&self.store)
    }

    /// Write to the session destination
    pub fn write(&self) -> InterchangeResult<PathBuf> {
        let destination = self
            .destination
            .clone()
            .ok_or_else(|| InterchangeError::missing_field("destination"))?;
        self.write_to(&destination)?;
        Ok(destination)
    }

    /// Write to an explicit path.
    ///
    /// A session without tables is refused: its output would hold no header
    /// and could not be opened again.
    pub fn write_to(&self, path: &Path) -> InterchangeResult<()> {
        if self.store.is_empty() {
            return Err(InterchangeError::missing_field("tables"));
        }
        let mut text = String::new();
        if self.config.stamp_header && self.codec.dialect() == Dialect::Modern {
            text.push_str(&saved_banner(path));
        }
        text.push_str(&self.serialize());
        write_atomic(path, &text)?;
        info!(path = %path.display(), tables = self.store.len(), "wrote interchange file");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn dialect(&self) -> Dialect {
        self.codec.dialect()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Recovered conditions met while opening and seeding
    pub fn warnings(&self) -> &[InterchangeWarning] {
        &self.warnings
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Serializable overview of the session state
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            dialect: self.dialect(),
            source: self.source.as_ref().map(|p| p.display().to_string()),
            units: self.file_units,
            tables: self
                .store
                .iter()
                .map(|t| TableSummary {
                    name: t.name.clone(),
                    lines: t.line_count(),
                })
                .collect(),
            point_tables: self
                .registries
                .iter()
                .map(|r| PointTableSummary {
                    table: r.table().to_string(),
                    known: r.len(),
                    created: r.created_count(),
                })
                .collect(),
            warnings: self.warnings.clone(),
        }
    }
}

/// True if any line of `content` is a point record
fn holds_points(codec: &dyn DialectCodec, content: &str) -> bool {
    content.lines().any(|line| codec.parse_point(line).is_some())
}

/// `File <path> was saved on <date> at <time>` line written by modern exporters
fn saved_banner(path: &Path) -> String {
    let now = Local::now();
    format!(
        "File {} was saved on {} at {}\n\n",
        path.display(),
        now.format("%-m/%-d/%y"),
        now.format("%-H:%M:%S")
    )
}

/// Overview returned by [`InterchangeSession::summary`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub dialect: Dialect,
    pub source: Option<String>,
    pub units: Option<UnitPair>,
    pub tables: Vec<TableSummary>,
    pub point_tables: Vec<PointTableSummary>,
    pub warnings: Vec<InterchangeWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointTableSummary {
    pub table: String,
    pub known: usize,
    pub created: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{ForceUnit, LengthUnit};

    const POINTS: &str = "OBJECT GEOMETRY - POINT COORDINATES";

    const SOURCE: &str = "TABLE:  \"PROGRAM CONTROL\"\n\
                          \x20  ProgramName=SAFE   Version=20.0.0   CurrUnits=\"KN, m, C\"\n\
                          \n\
                          TABLE:  \"OBJECT GEOMETRY - POINT COORDINATES\"\n\
                          \x20  Point=115   GlobalX=2820   GlobalY=0   GlobalZ=0   SpecialPt=No\n\
                          \x20  Point=116   GlobalX=0   GlobalY=0   GlobalZ=0   SpecialPt=No\n\
                          \n\
                          TABLE:  \"SLAB PROPERTIES\"\n\
                          \x20  Slab=SLAB1   Type=Slab   Thickness=0.3\n\
                          \n\
                          END TABLE DATA\n";

    fn session() -> InterchangeSession {
        InterchangeSession::from_text(SOURCE, SessionConfig::default()).unwrap()
    }

    #[test]
    fn test_open_derives_units_and_points() {
        let s = session();
        assert_eq!(s.units().unwrap(), UnitPair::new(ForceUnit::KN, LengthUnit::M));
        assert_eq!(s.points(POINTS).unwrap().len(), 2);
        assert!(s.warnings().is_empty());
        assert_eq!(s.table_names(), vec!["PROGRAM CONTROL", POINTS, "SLAB PROPERTIES"]);
    }

    #[test]
    fn test_registered_point_is_written_to_table() {
        let mut s = session();
        let found = s.find_or_register_point(Point3::new(2820.0, 20.0, 0.0)).unwrap();
        assert!(found.is_new);
        assert_eq!(found.id, PointId::Number(1001));
        assert!(s
            .table(POINTS)
            .ends_with("   Point=1001   GlobalX=2820   GlobalY=20   GlobalZ=0   SpecialPt=No\n"));

        let again = s.find_or_register_point(Point3::new(2820.0, 20.0, 0.0)).unwrap();
        assert!(!again.is_new);
        assert_eq!(s.table(POINTS).matches("Point=1001").count(), 1);
    }

    #[test]
    fn test_tolerance_override() {
        let mut s = session();
        let loose = s
            .find_or_register_point_with(Point3::new(2820.4, 0.0, 0.0), Some(0.5))
            .unwrap();
        assert_eq!(loose.id, PointId::Number(115));
        let strict = s.find_or_register_point(Point3::new(2820.4, 0.0, 0.0)).unwrap();
        assert!(strict.is_new);
    }

    #[test]
    fn test_model_point_is_scaled_to_file_units() {
        let mut s = session();
        // 2 820 000 mm == 2820 m
        let found = s
            .find_or_register_model_point(Point3::new(2_820_000.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(found.id, PointId::Number(115));
    }

    #[test]
    fn test_register_polyline_preserves_order() {
        let mut s = session();
        let ids = s
            .register_polyline(&[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(10.0, 10.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ])
            .unwrap();
        assert_eq!(
            ids,
            vec![
                PointId::Number(116),
                PointId::Number(1001),
                PointId::Number(1002),
                PointId::Number(116)
            ]
        );
    }

    #[test]
    fn test_replace_resyncs_registry() {
        let mut s = session();
        s.replace_table(POINTS, "   Point=5000   GlobalX=1   GlobalY=1   GlobalZ=0   SpecialPt=No\n");
        assert_eq!(s.points(POINTS).unwrap().len(), 1);
        let fresh = s.find_or_register_point(Point3::new(2820.0, 0.0, 0.0)).unwrap();
        assert!(fresh.is_new);
        assert_eq!(fresh.id, PointId::Number(5001));
    }

    #[test]
    fn test_appended_point_lines_are_known() {
        let mut s = session();
        s.append_to_table(POINTS, "   Point=2000   GlobalX=7   GlobalY=7   GlobalZ=0   SpecialPt=No\n");
        let hit = s.find_or_register_point(Point3::new(7.0, 7.0, 0.0)).unwrap();
        assert_eq!(hit.id, PointId::Number(2000));
        let fresh = s.find_or_register_point(Point3::new(8.0, 8.0, 0.0)).unwrap();
        assert_eq!(fresh.id, PointId::Number(2001));
    }

    #[test]
    fn test_ids_unique_across_point_tables() {
        let config = SessionConfig {
            point_tables: vec![POINTS.to_string(), "STRIP POINTS".to_string()],
            ..SessionConfig::default()
        };
        let mut s = InterchangeSession::from_text(SOURCE, config).unwrap();
        let a = s.find_or_register_point(Point3::new(1.0, 1.0, 0.0)).unwrap();
        let b = s
            .find_or_register_point_in("STRIP POINTS", Point3::new(1.0, 1.0, 0.0), 0.001)
            .unwrap();
        assert_eq!(a.id, PointId::Number(1001));
        assert_eq!(b.id, PointId::Number(1002));
        assert_eq!(s.table_names().last(), Some(&"STRIP POINTS"));
    }

    #[test]
    fn test_points_in_every_table_reserve_their_ids() {
        let text = format!(
            "{}TABLE:  \"STRIP POINTS\"\n   Point=1001   GlobalX=5   GlobalY=5   GlobalZ=0   SpecialPt=No\nEND TABLE DATA\n",
            SOURCE.trim_end_matches("END TABLE DATA\n")
        );
        let mut s = InterchangeSession::from_text(&text, SessionConfig::default()).unwrap();
        assert_eq!(s.points("STRIP POINTS").unwrap().len(), 1);

        let fresh = s.find_or_register_point(Point3::new(9.0, 9.0, 0.0)).unwrap();
        assert_eq!(fresh.id, PointId::Number(1002));

        let existing = s
            .find_or_register_point_in("STRIP POINTS", Point3::new(5.0, 5.0, 0.0), 0.001)
            .unwrap();
        assert_eq!(existing.id, PointId::Number(1001));
        assert!(!existing.is_new);
    }

    #[test]
    fn test_point_lines_appended_to_new_table_reserve_ids() {
        let mut s = session();
        s.append_to_table(
            "COLUMN POINTS",
            "   Point=3000   GlobalX=1   GlobalY=2   GlobalZ=0   SpecialPt=No\n",
        );
        let fresh = s.find_or_register_point(Point3::new(9.0, 9.0, 0.0)).unwrap();
        assert_eq!(fresh.id, PointId::Number(3001));
    }

    #[test]
    fn test_new_point_starts_on_its_own_line() {
        let mut s = session();
        s.append_to_table(POINTS, "   Point=2000   GlobalX=7   GlobalY=7   GlobalZ=0   SpecialPt=No");
        let fresh = s.find_or_register_point(Point3::new(8.0, 8.0, 0.0)).unwrap();
        assert_eq!(fresh.id, PointId::Number(2001));
        assert!(s.table(POINTS).contains("SpecialPt=No\n   Point=2001   GlobalX=8"));

        let reopened = InterchangeSession::from_text(&s.serialize(), SessionConfig::default()).unwrap();
        assert_eq!(reopened.points(POINTS).unwrap().len(), 4);
        assert_eq!(s.points(POINTS).unwrap().len(), 4);
    }

    #[test]
    fn test_empty_session_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.f2k");
        let s = InterchangeSession::create(&path, SessionConfig::default()).unwrap();
        let err = s.write().unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");
        assert!(!path.exists());
    }

    #[test]
    fn test_convert() {
        let s = session();
        assert!((s.convert(10.0, QuantityKind::Force).unwrap() - 0.01).abs() < 1e-12);
        assert!((s.convert(1.0, QuantityKind::Pressure).unwrap() - 1000.0).abs() < 1e-9);
        let tonf = s.convert_between(
            1.0,
            QuantityKind::Force,
            UnitPair::new(ForceUnit::Tonf, LengthUnit::M),
            UnitPair::new(ForceUnit::Kgf, LengthUnit::M),
        );
        assert!((tonf - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_units_surface_until_set() {
        let text = "TABLE:  \"SLAB PROPERTIES\"\n   Slab=S1\nEND TABLE DATA\n";
        let mut s = InterchangeSession::from_text(text, SessionConfig::default()).unwrap();
        let err = s.convert(1.0, QuantityKind::Length).unwrap_err();
        assert_eq!(err.error_code(), "UNITS_NOT_FOUND");

        s.set_file_units(UnitPair::new(ForceUnit::KN, LengthUnit::Cm));
        assert!((s.convert(10.0, QuantityKind::Length).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_configured_units_fill_in() {
        let text = "TABLE:  \"SLAB PROPERTIES\"\n   Slab=S1\nEND TABLE DATA\n";
        let config = SessionConfig {
            file_units: Some(UnitPair::new(ForceUnit::Kgf, LengthUnit::Cm)),
            ..SessionConfig::default()
        };
        let s = InterchangeSession::from_text(text, config).unwrap();
        assert_eq!(s.units().unwrap(), UnitPair::new(ForceUnit::Kgf, LengthUnit::Cm));
    }

    #[test]
    fn test_unrecognized_point_table_is_warning() {
        let text = "TABLE:  \"OBJECT GEOMETRY - POINT COORDINATES\"\n   Pt 1 at origin\nEND TABLE DATA\n";
        let s = InterchangeSession::from_text(text, SessionConfig::default()).unwrap();
        assert_eq!(s.points(POINTS).unwrap().len(), 0);
        assert_eq!(
            s.warnings(),
            &[InterchangeWarning::PointPatternUnrecognized {
                table: POINTS.to_string()
            }]
        );
    }

    #[test]
    fn test_format_mismatch_is_fatal() {
        let legacy = "$ POINT COORDINATES\n  POINT \"1\" 0 0\n$\n";
        let err = InterchangeSession::from_text(legacy, SessionConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "FORMAT_MISMATCH");
    }

    #[test]
    fn test_write_without_destination_fails() {
        let s = session();
        let err = s.write().unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_summary() {
        let mut s = session();
        s.find_or_register_point(Point3::new(1.0, 2.0, 3.0)).unwrap();
        let summary = s.summary();
        assert_eq!(summary.tables.len(), 3);
        assert_eq!(summary.point_tables[0].known, 3);
        assert_eq!(summary.point_tables[0].created, 1);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"dialect\":\"modern\""));
    }
}
