//! API file loading.
//!
//! An API file is TOML with an optional `[config]` table, one `[types.<Name>]`
//! table per schema type and an array of `[[methods]]`:
//!
//! ```toml
//! [types.Foo]
//! fields = [{ name = "a", type = "Int" }]
//!
//! [[methods]]
//! name = "getFoo"
//! returns = "Foo"
//! contracts = "ensures result.a > 5;"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::SynthConfig;
use crate::error::{LoadError, SchemaError};
use crate::method::{MethodDescriptor, ParamDef};
use crate::schema::{Constructor, EnumDef, FieldDef, Schema, StructDef, TypeDef};
use crate::ty::TypeRef;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawApi {
    #[serde(default)]
    config: SynthConfig,
    #[serde(default)]
    types: BTreeMap<String, RawType>,
    #[serde(default)]
    methods: Vec<RawMethod>,
}

/// A struct (`fields`, optional `constructors`) or an enum (`variants`).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawType {
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    constructors: Vec<RawConstructor>,
    #[serde(default)]
    variants: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConstructor {
    params: Vec<String>,
    #[serde(default = "default_public")]
    public: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMethod {
    name: String,
    #[serde(default)]
    params: Vec<RawField>,
    #[serde(default = "default_returns")]
    returns: String,
    #[serde(default)]
    contracts: String,
}

fn default_returns() -> String {
    "Void".to_string()
}

/// A loaded, validated API: schema, methods with parsed contracts, config.
#[derive(Debug, Clone)]
pub struct Api {
    pub config: SynthConfig,
    pub schema: Schema,
    pub methods: Vec<MethodDescriptor>,
}

impl Api {
    pub fn from_file(path: &Path) -> Result<Api, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Api, LoadError> {
        let raw: RawApi = toml::from_str(content).map_err(|e| LoadError::Toml {
            message: e.to_string(),
        })?;
        raw.config.validate()?;

        let mut schema = Schema::new();
        for (name, raw_type) in raw.types {
            schema.insert(build_type(name, raw_type)?);
        }
        schema.validate()?;

        let mut methods: Vec<MethodDescriptor> = Vec::with_capacity(raw.methods.len());
        for raw_method in raw.methods {
            if methods.iter().any(|m| m.name == raw_method.name) {
                return Err(SchemaError::DuplicateMethod {
                    name: raw_method.name,
                }
                .into());
            }
            methods.push(build_method(raw_method, &schema)?);
        }

        Ok(Api {
            config: raw.config,
            schema,
            methods,
        })
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

fn build_type(name: String, raw: RawType) -> Result<TypeDef, SchemaError> {
    if let Some(variants) = raw.variants {
        return Ok(TypeDef::Enum(EnumDef { name, variants }));
    }
    let mut fields = Vec::with_capacity(raw.fields.len());
    for f in raw.fields {
        fields.push(FieldDef {
            ty: TypeRef::parse(&f.ty)?,
            name: f.name,
        });
    }
    let constructors = raw
        .constructors
        .into_iter()
        .map(|c| Constructor {
            params: c.params,
            public: c.public,
        })
        .collect();
    Ok(TypeDef::Struct(StructDef {
        name,
        fields,
        constructors,
    }))
}

fn build_method(raw: RawMethod, schema: &Schema) -> Result<MethodDescriptor, LoadError> {
    let returns = TypeRef::parse(&raw.returns)?;
    schema.check_type(&returns, &format!("the return type of `{}`", raw.name))?;

    let mut params = Vec::with_capacity(raw.params.len());
    for p in raw.params {
        let ty = TypeRef::parse(&p.ty)?;
        schema.check_type(&ty, &format!("parameter `{}` of `{}`", p.name, raw.name))?;
        params.push(ParamDef { name: p.name, ty });
    }

    let contracts = match stubby_parser::parse_contracts(&raw.contracts) {
        Ok(contracts) => contracts,
        Err(error) => {
            return Err(LoadError::Parse {
                method: raw.name,
                error,
                source: raw.contracts,
            })
        }
    };

    Ok(MethodDescriptor {
        name: raw.name,
        params,
        returns,
        contracts,
        contract_source: raw.contracts,
    })
}
