//! # f2k_core - Structural-Model Interchange Engine
//!
//! `f2k_core` reads and writes the table-keyed, line-oriented text files
//! (F2K) used to exchange a structural model with an external analysis
//! program. Feature producers (slabs, soils, openings, strips, rebars,
//! columns) append content to named tables and register geometric points;
//! the engine keeps table order, deduplicates points within a tolerance and
//! converts quantities into the file's units.
//!
//! ## Design Philosophy
//!
//! - **Schema-less tables**: table content is opaque text. Record layouts
//!   belong to the producers, not to the engine
//! - **Order is output**: tables and points appear in the order they were
//!   first touched
//! - **One policy per session**: tolerance, reserved id range and units are
//!   fixed once per session, never per call site
//! - **Rich Errors**: structured error types, recoverable conditions reported
//!   as warnings
//!
//! ## Quick Start
//!
//! ```rust
//! use f2k_core::{InterchangeSession, SessionConfig};
//! use f2k_core::points::Point3;
//!
//! let source = "TABLE:  \"PROGRAM CONTROL\"\n   CurrUnits=\"KN, m, C\"\nEND TABLE DATA\n";
//! let mut session = InterchangeSession::from_text(source, SessionConfig::default())?;
//!
//! let corner = session.find_or_register_point(Point3::new(0.0, 0.0, 0.0))?;
//! assert!(corner.is_new);
//!
//! let text = session.serialize();
//! assert!(text.ends_with("END TABLE DATA\n"));
//! # Ok::<(), f2k_core::errors::InterchangeError>(())
//! ```
//!
//! ## Modules
//!
//! - [`session`] - Read-modify-write workflow exposed to feature producers
//! - [`dialect`] - Modern and legacy text codecs
//! - [`tables`] - Ordered table store
//! - [`points`] - Point registry with tolerance-based deduplication
//! - [`units`] - Force/length unit families and conversion factors
//! - [`config`] - TOML session configuration
//! - [`errors`] - Structured error and warning types
//! - [`file_io`] - Source reading and atomic saves

pub mod config;
pub mod dialect;
pub mod errors;
pub mod file_io;
pub mod points;
pub mod session;
pub mod tables;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use config::{InterchangeConfig, SessionConfig};
pub use dialect::{Dialect, DialectCodec};
pub use errors::{InterchangeError, InterchangeResult, InterchangeWarning};
pub use session::InterchangeSession;
pub use tables::TableStore;
pub use units::{ForceUnit, LengthUnit, QuantityKind, UnitPair};
