//! Business Object Schemas
//!
//! Read-only tables describing what is available to a business rule
//! without being declared in it:
//!
//! - **modules** (`date`, `math`, `http`): callable methods plus the shape
//!   of the object their methods return
//! - **global objects** (`UTR`): root domain objects every rule can use
//!
//! The defaults here are what a transpiler gets when the host supplies no
//! tables of its own; hosts replace them through `TranspileOptions`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BOProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BOParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BOMethod {
    pub name: String,
    pub return_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<BOParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A business-object type: named properties and methods
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BOType {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<BOProperty>,
    #[serde(default)]
    pub methods: Vec<BOMethod>,
}

impl BOType {
    pub fn new(name: impl Into<String>) -> Self {
        BOType { name: name.into(), ..Default::default() }
    }

    pub fn property(&self, name: &str) -> Option<&BOProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&BOMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Builder-style property
    pub fn with_property(mut self, name: &str, type_name: &str, description: &str) -> Self {
        self.properties.push(BOProperty {
            name: name.to_string(),
            type_name: type_name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
        });
        self
    }

    /// Builder-style method; `params` are `(name, type)` pairs
    pub fn with_method(mut self, name: &str, return_type: &str, params: &[(&str, &str)]) -> Self {
        self.methods.push(method(name, return_type, params));
        self
    }
}

/// A built-in module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub methods: Vec<BOMethod>,
    /// Shape of the object the module's methods return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_object: Option<BOType>,
}

fn method(name: &str, return_type: &str, params: &[(&str, &str)]) -> BOMethod {
    BOMethod {
        name: name.to_string(),
        return_type: return_type.to_string(),
        parameters: params
            .iter()
            .map(|(n, t)| BOParameter { name: n.to_string(), type_name: t.to_string() })
            .collect(),
        description: None,
    }
}

/// `date`, `math` and `http`
pub fn default_modules() -> Vec<ModuleSchema> {
    vec![
        ModuleSchema {
            name: "date".to_string(),
            description: Some("Calendar dates and times".to_string()),
            methods: vec![
                method("now", "DateValue", &[]),
                method("today", "DateValue", &[]),
                method("parse", "DateValue", &[("text", "string")]),
                method("addDays", "DateValue", &[("date", "DateValue"), ("days", "number")]),
                method("diffDays", "number", &[("from", "DateValue"), ("to", "DateValue")]),
            ],
            return_object: Some(
                BOType::new("DateValue")
                    .with_property("year", "number", "Four-digit year")
                    .with_property("month", "number", "Month, 1-12")
                    .with_property("day", "number", "Day of month")
                    .with_property("hour", "number", "")
                    .with_property("minute", "number", "")
                    .with_property("second", "number", "")
                    .with_method("format", "string", &[("pattern", "string")])
                    .with_method("toISOString", "string", &[]),
            ),
        },
        ModuleSchema {
            name: "math".to_string(),
            description: Some("Numeric helpers".to_string()),
            methods: vec![
                method("round", "number", &[("value", "number"), ("digits", "number")]),
                method("floor", "number", &[("value", "number")]),
                method("ceil", "number", &[("value", "number")]),
                method("abs", "number", &[("value", "number")]),
                method("min", "number", &[("a", "number"), ("b", "number")]),
                method("max", "number", &[("a", "number"), ("b", "number")]),
                method("sqrt", "number", &[("value", "number")]),
                method("pow", "number", &[("base", "number"), ("exponent", "number")]),
            ],
            return_object: None,
        },
        ModuleSchema {
            name: "http".to_string(),
            description: Some("Outbound HTTP calls".to_string()),
            methods: vec![
                method("get", "HttpResponse", &[("url", "string")]),
                method("post", "HttpResponse", &[("url", "string"), ("body", "object")]),
                method("put", "HttpResponse", &[("url", "string"), ("body", "object")]),
                method("delete", "HttpResponse", &[("url", "string")]),
            ],
            return_object: Some(
                BOType::new("HttpResponse")
                    .with_property("status", "number", "HTTP status code")
                    .with_property("body", "string", "Raw response body")
                    .with_property("headers", "object", "")
                    .with_method("json", "object", &[]),
            ),
        },
    ]
}

/// The `UTR` root object
pub fn default_global_objects() -> Vec<BOType> {
    vec![BOType::new("UTR")
        .with_property("id", "string", "Unique transaction reference")
        .with_property("type", "string", "")
        .with_property("status", "string", "")
        .with_property("amount", "number", "")
        .with_property("currency", "string", "")
        .with_property("createdAt", "DateValue", "")
        .with_property("data", "object", "Free-form payload")
        .with_method("get", "any", &[("key", "string")])
        .with_method("set", "void", &[("key", "string"), ("value", "any")])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let modules = default_modules();
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["date", "math", "http"]);
        assert!(modules[1].return_object.is_none());

        let utr = &default_global_objects()[0];
        assert_eq!(utr.property("amount").map(|p| p.type_name.as_str()), Some("number"));
        assert_eq!(utr.method("get").map(|m| m.parameters.len()), Some(1));
    }

    #[test]
    fn test_bo_type_json_uses_type_key() {
        let json = serde_json::to_string(&BOType::new("A").with_property("x", "number", "")).expect("json");
        assert_eq!(json, r#"{"name":"A","properties":[{"name":"x","type":"number"}],"methods":[]}"#);

        let parsed: BOType = serde_json::from_str(r#"{"name":"B","methods":[{"name":"m","returnType":"string"}]}"#)
            .expect("parses");
        assert_eq!(parsed.methods[0].return_type, "string");
        assert!(parsed.properties.is_empty());
    }
}
