//! Schema Lineage
//!
//! Versioned families of schemas ("lineages") that can tell which version a
//! value belongs to and move values between versions, accounting for every
//! piece of information lost or invented along the way.
//!
//! ## Features
//!
//! - **Syntactic Versioning**: `major.minor` versions; a major bump breaks, a minor bump only adds
//! - **Evolution Checks**: adjacent schemas are diffed when a lineage is loaded
//! - **Newest-First Resolution**: find the most recent schema a value conforms to
//! - **Lenses**: declarative translation between adjacent versions, inverted automatically
//! - **Lacunas**: every defaulted, dropped or narrowed value is recorded
//! - **Muxers**: decode, resolve, translate and re-encode in one call
//! - **Convergent Binding**: bind a concrete Rust type to one version, checked once up front
//!
//! ## Architecture
//!
//! ```text
//! LineageSource (JSON)
//!   └── load_lineage ──> Lineage ─┬── Schema 0.0 ──> 0.1 ──> 1.0 (latest)
//!        (SchemaEngine)           ├── find / search_and_validate
//!                                 ├── translate ──> (Value, TranslationLacunas)
//!                                 └── ConvergentLineage<T>
//!                                        └── UntypedMux / ByteMux / TypedMux / ValueMux
//! ```
//!
//! ## Example
//!
//! ```
//! use schema_lineage::{exemplars, sv, LineageOptions};
//! use serde_json::json;
//!
//! let lineage = exemplars::rename(LineageOptions::default()).unwrap();
//! let (value, lacunas) = lineage
//!     .translate(&json!({"before": "x", "unchanged": "y"}), sv(0, 0), sv(1, 0))
//!     .unwrap();
//! assert_eq!(value, json!({"after": "x", "unchanged": "y"}));
//! assert!(lacunas.is_empty());
//! ```

pub mod checksum;
pub mod compatibility;
pub mod config;
pub mod convergent;
pub mod endec;
pub mod engine;
pub mod error;
pub mod exemplars;
pub mod lacuna;
pub mod lens;
pub mod lineage;
pub mod mux;
pub mod resolve;
pub mod schema;
pub mod search;
pub mod translate;
pub mod version;

pub use checksum::Checksum;
pub use compatibility::{CompatibilityChecker, CompatibilityResult};
pub use config::{LineageConfig, OutputFormat};
pub use convergent::{bind_type, bind_type_with, Assignee, ConvergentLineage, TypedSchema};
pub use endec::{Endec, JsonEndec};
pub use engine::{JsonSchemaEngine, SchemaEngine, SchemaHandle, TypeDescriptor};
pub use error::{
    BindError, ConfigError, LensError, LineageError, ResolutionError, Result, TranslationError,
    ValidationError, Violation,
};
pub use lacuna::{Lacuna, LacunaKind, TranslationLacunas};
pub use lens::{Lens, LensOp, ValueMapping};
pub use lineage::{load_lineage, Lineage, LineageOptions, LineageSource};
pub use mux::{
    new_byte_mux, new_typed_mux, new_untyped_mux, new_value_mux, ByteMux, Mux, MuxFn, TypedMux,
    UntypedMux, ValueMux,
};
pub use resolve::{as_array, search_and_validate};
pub use schema::{Instance, Schema, SchemaDefinition};
pub use search::{find, find_with, SearchCriterion, SearchSpec};
pub use translate::translate;
pub use version::{sv, SyntacticVersion};
