use stubby_parser::{ContractKind, ContractRecord};

use crate::ty::TypeRef;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeRef,
}

/// Everything synthesis needs to know about one API method.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<ParamDef>,
    pub returns: TypeRef,
    pub contracts: Vec<ContractRecord>,
    /// The contract block the spans in `contracts` point into.
    pub contract_source: String,
}

impl MethodDescriptor {
    pub fn param(&self, name: &str) -> Option<&ParamDef> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn requires(&self) -> impl Iterator<Item = &ContractRecord> {
        self.contracts
            .iter()
            .filter(|c| c.kind == ContractKind::Requires)
    }

    pub fn ensures(&self) -> impl Iterator<Item = &ContractRecord> {
        self.contracts
            .iter()
            .filter(|c| c.kind == ContractKind::Ensures)
    }
}
