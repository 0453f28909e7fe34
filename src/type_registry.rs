//! Business Object / Type Registry
//!
//! Indexes every type a rule can refer to, in merge order:
//!
//! 1. user `class`, `interface` and `enum` declarations
//! 2. each module's return object, plus the module itself as a type
//! 3. global business objects
//!
//! Merges are additive. A property or method name is unique within a type:
//! the first registration wins and later duplicates are dropped with a
//! warning. The generator asks the registry for defaults of typed class
//! members; editors use it for completion.

use std::collections::{HashMap, HashSet};

use crate::ast::{ClassDecl, EnumDecl, InterfaceDecl, InterfaceMember, Node, StatementKind};
use crate::grouping::StatementGrouper;
use crate::helpers::{is_number_literal, is_string_literal};
use crate::parser::parse_program;
use crate::schema::{BOMethod, BOParameter, BOProperty, BOType, ModuleSchema};

/// Type registry built fresh for every translation
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<BOType>,
    index: HashMap<String, usize>,
    /// `extends` lists of user classes and interfaces
    bases: HashMap<String, Vec<String>>,
    enums: HashSet<String>,
    warnings: Vec<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for a parsed rule plus the schema tables
    pub fn build(nodes: &[Node], modules: &[ModuleSchema], globals: &[BOType]) -> Self {
        let mut registry = TypeRegistry::new();
        for node in nodes {
            node.walk(&mut |n| match n.kind() {
                StatementKind::ClassDecl(class) => registry.add_class(class),
                StatementKind::InterfaceDecl(interface) => registry.add_interface(interface),
                StatementKind::EnumDecl(decl) => registry.add_enum(decl),
                _ => {}
            });
        }
        registry.add_modules(modules);
        registry.add_globals(globals);
        registry
    }

    /// Registry for raw rule text. Declarations that fail to parse are
    /// reported as a warning and only the schema tables are indexed.
    pub fn from_source(text: &str, modules: &[ModuleSchema], globals: &[BOType]) -> Self {
        let groups = StatementGrouper::new().group_statements(text);
        match parse_program(&groups, false) {
            Ok(program) => TypeRegistry::build(&program.nodes, modules, globals),
            Err(err) => {
                let mut registry = TypeRegistry::build(&[], modules, globals);
                registry
                    .warnings
                    .push(format!("user types not indexed: {}", err));
                registry
            }
        }
    }

    //=========================================================================
    // REGISTRATION
    //=========================================================================

    /// Add a type, merging into an existing one of the same name
    pub fn register(&mut self, ty: BOType) {
        let idx = match self.index.get(&ty.name) {
            Some(&idx) => idx,
            None => {
                self.index.insert(ty.name.clone(), self.types.len());
                self.types.push(BOType::new(ty.name.clone()));
                self.types.len() - 1
            }
        };

        for property in ty.properties {
            let existing = &mut self.types[idx];
            if existing.property(&property.name).is_some() {
                let msg = format!(
                    "type `{}`: property `{}` already declared, keeping the first",
                    existing.name, property.name
                );
                log::warn!("{}", msg);
                self.warnings.push(msg);
            } else {
                existing.properties.push(property);
            }
        }

        for method in ty.methods {
            let existing = &mut self.types[idx];
            if existing.method(&method.name).is_some() {
                let msg = format!(
                    "type `{}`: method `{}` already declared, keeping the first",
                    existing.name, method.name
                );
                log::warn!("{}", msg);
                self.warnings.push(msg);
            } else {
                existing.methods.push(method);
            }
        }
    }

    pub fn add_class(&mut self, class: &ClassDecl) {
        let mut ty = BOType::new(class.name.clone());
        for member in &class.members {
            let type_name = member
                .type_name
                .clone()
                .or_else(|| member.value.as_deref().map(infer_literal_type))
                .unwrap_or_else(|| "any".to_string());
            ty.properties.push(BOProperty {
                name: member.name.clone(),
                type_name,
                description: None,
            });
        }
        let mut bases = class.extends.clone();
        bases.extend(class.implements.iter().cloned());
        if !bases.is_empty() {
            self.bases.insert(class.name.clone(), bases);
        }
        self.register(ty);
    }

    pub fn add_interface(&mut self, interface: &InterfaceDecl) {
        let mut ty = BOType::new(interface.name.clone());
        for member in &interface.members {
            match member {
                InterfaceMember::Property { name, type_name, .. } => ty.properties.push(BOProperty {
                    name: name.clone(),
                    type_name: type_name.clone(),
                    description: None,
                }),
                InterfaceMember::Method { name, params, return_type, .. } => ty.methods.push(BOMethod {
                    name: name.clone(),
                    return_type: return_type.clone().unwrap_or_else(|| "void".to_string()),
                    parameters: params
                        .iter()
                        .map(|p| BOParameter {
                            name: p.name.clone(),
                            type_name: p.type_name.clone().unwrap_or_else(|| "any".to_string()),
                        })
                        .collect(),
                    description: None,
                }),
            }
        }
        if !interface.extends.is_empty() {
            self.bases.insert(interface.name.clone(), interface.extends.clone());
        }
        self.register(ty);
    }

    /// Enum variants are properties typed as the enum itself
    pub fn add_enum(&mut self, decl: &EnumDecl) {
        let mut ty = BOType::new(decl.name.clone());
        for variant in &decl.variants {
            ty.properties.push(BOProperty {
                name: variant.name.clone(),
                type_name: decl.name.clone(),
                description: None,
            });
        }
        self.enums.insert(decl.name.clone());
        self.register(ty);
    }

    pub fn add_modules(&mut self, modules: &[ModuleSchema]) {
        for module in modules {
            let mut ty = BOType::new(module.name.clone());
            ty.methods = module.methods.clone();
            self.register(ty);
            if let Some(ret) = &module.return_object {
                self.register(ret.clone());
            }
        }
    }

    pub fn add_globals(&mut self, globals: &[BOType]) {
        for global in globals {
            self.register(global.clone());
        }
    }

    //=========================================================================
    // QUERIES
    //=========================================================================

    pub fn get_type(&self, name: &str) -> Option<&BOType> {
        self.index.get(name).map(|&idx| &self.types[idx])
    }

    /// Declared type of `type_name.prop_name`, searching base types too
    pub fn get_property_type(&self, type_name: &str, prop_name: &str) -> Option<&str> {
        self.lookup(type_name, &mut Vec::new(), &|ty| {
            ty.property(prop_name).map(|p| p.type_name.as_str())
        })
    }

    /// Return type of `type_name.method_name(...)`, searching base types too
    pub fn get_method_return_type(&self, type_name: &str, method_name: &str) -> Option<&str> {
        self.lookup(type_name, &mut Vec::new(), &|ty| {
            ty.method(method_name).map(|m| m.return_type.as_str())
        })
    }

    fn lookup<'a>(
        &'a self,
        type_name: &str,
        seen: &mut Vec<String>,
        find: &dyn Fn(&'a BOType) -> Option<&'a str>,
    ) -> Option<&'a str> {
        if seen.iter().any(|s| s == type_name) {
            return None;
        }
        seen.push(type_name.to_string());

        if let Some(found) = self.get_type(type_name).and_then(find) {
            return Some(found);
        }
        let bases = self.bases.get(type_name)?;
        bases.iter().find_map(|base| self.lookup(base, seen, find))
    }

    pub fn get_all_types(&self) -> &[BOType] {
        &self.types
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Python literal used for a typed member declared without a value.
    /// A registered enum defaults to its first variant.
    pub fn default_value(&self, type_name: &str) -> String {
        let type_name = type_name.trim();
        let literal = match type_name.to_lowercase().as_str() {
            "string" | "str" | "text" => "\"\"",
            "number" | "int" | "integer" | "float" | "decimal" => "0",
            "boolean" | "bool" => "False",
            _ => "None",
        };
        if literal != "None" {
            return literal.to_string();
        }
        match self.first_enum_variant(type_name) {
            Some(variant) => format!("{}.{}", type_name, variant),
            None => literal.to_string(),
        }
    }

    fn first_enum_variant(&self, type_name: &str) -> Option<&str> {
        if !self.enums.contains(type_name) {
            return None;
        }
        self.get_type(type_name)?.properties.first().map(|p| p.name.as_str())
    }
}

/// Business-rule type of a literal value
fn infer_literal_type(value: &str) -> String {
    let value = value.trim();
    let lower = value.to_lowercase();
    if is_string_literal(value) {
        "string".to_string()
    } else if is_number_literal(value) {
        "number".to_string()
    } else if lower == "true" || lower == "false" {
        "boolean".to_string()
    } else if value.starts_with('[') {
        "list".to_string()
    } else {
        // `new Customer()` and `Customer()` construct a user type
        let call = value.strip_prefix("new ").map_or(value, str::trim);
        match call.find('(') {
            Some(open) if call.ends_with(')') && call[..open].chars().next().map_or(false, char::is_uppercase) => {
                call[..open].trim().to_string()
            }
            _ => "any".to_string(),
        }
    }
}
