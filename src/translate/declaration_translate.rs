//! Declaration Translation
//!
//! Business-rule declarations become Python classes:
//!
//! ```text
//! class Customer extends Person {      class Customer(Person):
//!     name: string                ->       name: str = ""
//!     age = 30                             age = 30
//! }
//!
//! enum Tier { GOLD, SILVER }      ->   class Tier(Enum):
//!                                          GOLD = "GOLD"
//!                                          SILVER = "SILVER"
//!
//! interface Priced {                   class Priced(Protocol):
//!     price: number               ->       price: float
//!     total(qty: number): number           def total(self, qty: float) -> float: ...
//! }
//! ```

use crate::ast::{ClassDecl, ClassMember, EnumVariant, InterfaceDecl, InterfaceMember};
use crate::helpers::py_string_literal;
use crate::translate::condition_translate::translate_expression;
use crate::type_registry::TypeRegistry;

pub const ENUM_IMPORT: &str = "from enum import Enum";
pub const PROTOCOL_IMPORT: &str = "from typing import Protocol";

/// Python annotation for a business-rule type name
pub fn python_type(type_name: &str) -> String {
    let type_name = type_name.trim();

    if let Some(inner) = type_name.strip_suffix("[]") {
        return format!("list[{}]", python_type(inner));
    }
    if let Some(inner) = type_name
        .strip_prefix("list<")
        .or_else(|| type_name.strip_prefix("List<"))
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return format!("list[{}]", python_type(inner));
    }

    match type_name.to_lowercase().as_str() {
        "string" | "str" | "text" => "str".to_string(),
        "number" | "float" | "decimal" => "float".to_string(),
        "int" | "integer" => "int".to_string(),
        "boolean" | "bool" => "bool".to_string(),
        "list" | "array" => "list".to_string(),
        "map" | "dict" => "dict".to_string(),
        "any" | "object" => "object".to_string(),
        "void" => "None".to_string(),
        _ => type_name.to_string(),
    }
}

fn header_with_bases(name: &str, bases: &[String]) -> String {
    if bases.is_empty() {
        format!("class {}:", name)
    } else {
        format!("class {}({}):", name, bases.join(", "))
    }
}

pub fn class_header(decl: &ClassDecl) -> String {
    let bases: Vec<String> = decl.extends.iter().chain(decl.implements.iter()).cloned().collect();
    header_with_bases(&decl.name, &bases)
}

/// A class attribute. Typed members without a value get the type's
/// default from the registry.
pub fn class_member_line(member: &ClassMember, registry: &TypeRegistry) -> String {
    let value = member.value.as_deref().map(translate_expression);
    match (&member.type_name, value) {
        (Some(ty), Some(value)) => format!("{}: {} = {}", member.name, python_type(ty), value),
        (Some(ty), None) => format!(
            "{}: {} = {}",
            member.name,
            python_type(ty),
            registry.default_value(ty)
        ),
        (None, Some(value)) => format!("{} = {}", member.name, value),
        (None, None) => format!("{} = None", member.name),
    }
}

pub fn enum_header(name: &str) -> String {
    format!("class {}(Enum):", name)
}

pub fn enum_variant_line(variant: &EnumVariant) -> String {
    match &variant.value {
        Some(value) => format!("{} = {}", variant.name, translate_expression(value)),
        None => format!("{} = {}", variant.name, py_string_literal(&variant.name)),
    }
}

pub fn interface_header(decl: &InterfaceDecl) -> String {
    let mut bases = decl.extends.clone();
    bases.push("Protocol".to_string());
    header_with_bases(&decl.name, &bases)
}

pub fn interface_member_line(member: &InterfaceMember) -> String {
    match member {
        InterfaceMember::Property { name, type_name, .. } => {
            format!("{}: {}", name, python_type(type_name))
        }
        InterfaceMember::Method { name, params, return_type, .. } => {
            let mut args = vec!["self".to_string()];
            args.extend(params.iter().map(|p| match &p.type_name {
                Some(ty) => format!("{}: {}", p.name, python_type(ty)),
                None => p.name.clone(),
            }));
            let ret = return_type.as_deref().map_or_else(|| "None".to_string(), python_type);
            format!("def {}({}) -> {}: ...", name, args.join(", "), ret)
        }
    }
}
