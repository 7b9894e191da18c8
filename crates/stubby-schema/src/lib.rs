//! Stubby schema: what the contracts of an API talk about.
//!
//! [`TypeRef`] names a declared type, [`Schema`] holds the named structs and
//! enums, [`MethodDescriptor`] ties a method's signature to its parsed
//! contracts, and [`Api`] loads all of it (plus [`SynthConfig`]) from TOML.

pub mod api;
pub mod config;
pub mod error;
pub mod method;
pub mod schema;
pub mod ty;

pub use api::Api;
pub use config::SynthConfig;
pub use error::{LoadError, SchemaError};
pub use method::{MethodDescriptor, ParamDef};
pub use schema::{Constructor, EnumDef, FieldDef, Schema, StructDef, TypeDef};
pub use ty::{SemanticType, TypeRef};
