//! Capability registry and dispatch errors.
//!
//! A capability is a named, schema-described unit of work an agent can invoke:
//! either a local computation (a knowledge lookup) or a delegation that spawns
//! a child agent one level deeper. Each agent carries a fixed, statically
//! declared registry, used both to tell the model what it may invoke and to
//! validate and dispatch the invocations that come back.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::budget::BudgetError;
use super::context::AgentContext;
use crate::llm::ToolDefinition;

/// Errors from resolving or executing one capability invocation.
///
/// `Unknown`, `InvalidArguments`, and `Delegate` are recoverable: the dispatch
/// loop records them as error payloads in the conversation so the model can
/// self-correct. `Budget` and `Model` are terminal for the whole root request.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("unknown capability: {0}")]
    Unknown(String),

    #[error("invalid arguments for {name}: {reason}")]
    InvalidArguments { name: String, reason: String },

    #[error("delegate failure in {name}: {reason}")]
    Delegate { name: String, reason: String },

    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error("model service failure in {name}: {reason}")]
    Model { name: String, reason: String },
}

impl CapabilityError {
    /// True if the dispatch loop should surface this into the conversation
    /// rather than abort the request.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            CapabilityError::Budget(_) | CapabilityError::Model { .. }
        )
    }
}

/// A named capability with a natural-language description and a typed
/// parameter schema.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Unique name within one agent's registry.
    fn name(&self) -> &str;

    /// Natural-language description the model (and the decomposer) sees.
    fn description(&self) -> &str;

    /// JSON schema of the parameters (`type: object` with `properties` and
    /// `required`).
    fn parameters_schema(&self) -> Value;

    /// Execute with validated arguments.
    ///
    /// `depth` is the calling agent's recursion depth; a delegating capability
    /// must construct its child agent at `depth + 1`.
    async fn execute(
        &self,
        args: Value,
        ctx: &AgentContext,
        depth: usize,
    ) -> Result<String, CapabilityError>;
}

/// Ordered, immutable set of capabilities bound to one agent.
#[derive(Clone)]
pub struct CapabilityRegistry {
    capabilities: Arc<Vec<Arc<dyn Capability>>>,
}

impl CapabilityRegistry {
    /// Build a registry. Order is preserved and meaningful: it is the order
    /// the schemas are advertised to the model.
    pub fn new(capabilities: Vec<Arc<dyn Capability>>) -> Self {
        Self {
            capabilities: Arc::new(capabilities),
        }
    }

    /// Registry with no capabilities (pure-text agent).
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Resolve a capability by exact name match.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.capabilities.iter().find(|c| c.name() == name)
    }

    /// Schemas in the model's tool format, in registration order.
    pub fn schemas(&self) -> Vec<ToolDefinition> {
        self.capabilities
            .iter()
            .map(|c| ToolDefinition::function(c.name(), c.description(), c.parameters_schema()))
            .collect()
    }

    /// Bullet list of `name: description` lines for the decomposition prompt.
    pub fn description_lines(&self) -> String {
        self.capabilities
            .iter()
            .map(|c| format!("- {}: {}", c.name(), c.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse a raw argument string from the model into a JSON object.
///
/// An empty string counts as an empty object (no-argument capabilities).
pub fn parse_arguments(raw: &str) -> Result<Value, String> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    let value: Value =
        serde_json::from_str(raw).map_err(|e| format!("arguments are not valid JSON: {e}"))?;
    if !value.is_object() {
        return Err("arguments must be a JSON object".to_string());
    }
    Ok(value)
}

/// Structural validation of arguments against a capability's schema.
///
/// Checks that every `required` key is present, and best-effort that values
/// declared `string`/`number` in `properties` have that JSON type. Content is
/// not validated; the model is trusted for that.
pub fn validate_arguments(schema: &Value, args: &Value) -> Result<(), String> {
    let obj = args
        .as_object()
        .ok_or_else(|| "arguments must be a JSON object".to_string())?;

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for key in required.iter().filter_map(|k| k.as_str()) {
            if !obj.contains_key(key) {
                return Err(format!("missing required argument: {key}"));
            }
        }
    }

    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, value) in obj {
            let declared = props
                .get(key)
                .and_then(|p| p.get("type"))
                .and_then(|t| t.as_str());
            match declared {
                Some("string") if !value.is_string() => {
                    return Err(format!("argument {key} must be a string"));
                }
                Some("number") if !value.is_number() => {
                    return Err(format!("argument {key} must be a number"));
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Schema helper: an object schema of string parameters.
///
/// `params` are `(name, description, required)` triples, in advertised order.
pub fn string_object_schema(params: &[(&str, &str, bool)]) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    for (name, description, is_required) in params {
        properties.insert(
            name.to_string(),
            serde_json::json!({ "type": "string", "description": description }),
        );
        if *is_required {
            required.push(Value::String(name.to_string()));
        }
    }
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Capability for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the input text back."
        }

        fn parameters_schema(&self) -> Value {
            string_object_schema(&[("text", "The text to echo", true)])
        }

        async fn execute(
            &self,
            args: Value,
            _ctx: &AgentContext,
            _depth: usize,
        ) -> Result<String, CapabilityError> {
            Ok(args["text"].as_str().unwrap_or_default().to_string())
        }
    }

    #[test]
    fn registry_resolves_by_exact_name() {
        let registry = CapabilityRegistry::new(vec![Arc::new(Echo)]);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("Echo").is_none());
        assert!(registry.get("nonexistent_tool").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn schemas_preserve_registration_order() {
        let registry = CapabilityRegistry::new(vec![Arc::new(Echo)]);
        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].function.name, "echo");
        assert_eq!(schemas[0].tool_type, "function");
        assert!(registry.description_lines().starts_with("- echo:"));
    }

    #[test]
    fn parse_arguments_accepts_empty_and_objects() {
        assert!(parse_arguments("").unwrap().is_object());
        assert!(parse_arguments(r#"{"a": 1}"#).is_ok());
        assert!(parse_arguments("[1, 2]").is_err());
        assert!(parse_arguments("not json").is_err());
    }

    #[test]
    fn validate_arguments_checks_required_keys() {
        let schema = string_object_schema(&[
            ("drug_name", "The drug name", true),
            ("disease_name", "The disease name", true),
        ]);

        let ok = serde_json::json!({ "drug_name": "aspirin", "disease_name": "headache" });
        assert!(validate_arguments(&schema, &ok).is_ok());

        let missing = serde_json::json!({ "drug_name": "aspirin" });
        let err = validate_arguments(&schema, &missing).unwrap_err();
        assert!(err.contains("disease_name"));
    }

    #[test]
    fn validate_arguments_checks_declared_types() {
        let schema = string_object_schema(&[("drug_name", "The drug name", true)]);
        let wrong = serde_json::json!({ "drug_name": 42 });
        assert!(validate_arguments(&schema, &wrong).is_err());
    }

    #[test]
    fn budget_errors_are_not_recoverable() {
        let err = CapabilityError::Budget(BudgetError::InvocationsExhausted { max: 8 });
        assert!(!err.is_recoverable());
        assert!(CapabilityError::Unknown("x".into()).is_recoverable());
    }
}
