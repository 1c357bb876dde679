//! # bitschema: declarative bit-level packing for bounded fields
//!
//! A schema language for packing heterogeneous bounded fields (booleans,
//! ranged integers, enumerations, dates, bitmasks, any of them nullable)
//! into a single `u64`, with exact bit-width computation, deterministic
//! layout planning, and byte-exact encode/decode symmetry.
//!
//! ## Pipeline
//!
//! - **Schema**: validated field definitions in declaration order
//! - **Layout**: per-field bit offset/width, planned once, immutable after
//! - **Codec**: validate → normalize → pack, and extract → denormalize
//! - **Outputs**: generated Rust code, JSON Schema export, layout tables
//!
//! ## Example
//!
//! ```
//! use bitschema::{compute_layout, decode, encode, FieldDef, FieldKind, Value};
//! use indexmap::IndexMap;
//! use std::collections::HashMap;
//!
//! let mut fields = IndexMap::new();
//! fields.insert("active".to_string(), FieldDef::new(FieldKind::Bool));
//! fields.insert(
//!     "age".to_string(),
//!     FieldDef::new(FieldKind::Int { min: 0, max: 127 }),
//! );
//! let (layouts, total) = compute_layout(&fields).unwrap();
//! assert_eq!(total, 8);
//!
//! let mut data = HashMap::new();
//! data.insert("active".to_string(), Value::Bool(true));
//! data.insert("age".to_string(), Value::Int(42));
//! let packed = encode(&data, &layouts).unwrap();
//! assert_eq!(packed, 85);
//! assert_eq!(decode(packed, &layouts), data);
//! ```
//!
//! Nullable fields carry a presence bit at the base of their range: 0 means
//! null (the value bits stay zero), 1 means the value follows.

pub mod codec;
pub mod codegen;
pub mod errors;
pub mod jsonschema;
pub mod layout;
pub mod loader;
pub mod schema;
pub mod table;
pub mod validate;
pub mod value;

pub use codec::{decode, denormalize, encode, normalize};
pub use codegen::generate_rust_code;
pub use errors::{EncodeError, SchemaError};
pub use jsonschema::{generate_json_schema, layout_report};
pub use layout::{compute_layout, plan_schema, value_bits, FieldLayout};
pub use loader::{load_schema, schema_from_json, schema_from_yaml, schema_to_json};
pub use schema::{FieldDef, FieldKind, Resolution, Schema};
pub use table::{render_layout, TableFormat};
pub use validate::{validate, validate_value};
pub use value::Value;
