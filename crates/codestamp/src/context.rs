//! Rendering context and its assembly.
//!
//! A [`Context`] is the flat, ordered set of values a template sees. The
//! [`ContextAssembler`] builds one per generation from three sources, in
//! increasing precedence:
//!
//! 1. the template's configured defaults
//! 2. the caller's parameters
//! 3. derived keys, which only fill keys that are still absent
//!
//! # Derivation rules
//!
//! | Trigger | Output | Transform |
//! |---------|--------|-----------|
//! | `model_name` | `model_name_snake` | snake_case |
//! | `model_name` | `model_name_camel` | lowerCamelCase |
//! | `model_name` | `model_name_pascal` | PascalCase |
//! | `model_name` | `model_name_kebab` | kebab-case |
//!
//! Rules fire only when the trigger holds a string. More rules can be added
//! with [`ContextAssembler::with_rule`].

use std::collections::BTreeMap;

use codestamp_render::CaseTransform;
use serde::Serialize;

use crate::config::TemplateConfig;
use crate::error::ConfigError;

/// A value in a rendering context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<ContextValue>),
}

impl ContextValue {
    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        ContextValue::String(s.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        ContextValue::String(s)
    }
}

impl From<i64> for ContextValue {
    fn from(n: i64) -> Self {
        ContextValue::Integer(n)
    }
}

impl From<i32> for ContextValue {
    fn from(n: i32) -> Self {
        ContextValue::Integer(n.into())
    }
}

impl From<f64> for ContextValue {
    fn from(n: f64) -> Self {
        ContextValue::Float(n)
    }
}

impl From<bool> for ContextValue {
    fn from(b: bool) -> Self {
        ContextValue::Bool(b)
    }
}

impl<T: Into<ContextValue>> From<Vec<T>> for ContextValue {
    fn from(items: Vec<T>) -> Self {
        ContextValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ContextValue>, const N: usize> From<[T; N]> for ContextValue {
    fn from(items: [T; N]) -> Self {
        ContextValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<&serde_yaml::Value> for ContextValue {
    type Error = String;

    fn try_from(value: &serde_yaml::Value) -> Result<Self, Self::Error> {
        use serde_yaml::Value;

        match value {
            Value::String(s) => Ok(ContextValue::String(s.clone())),
            Value::Bool(b) => Ok(ContextValue::Bool(*b)),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(ContextValue::Integer(i)),
                (None, Some(f)) => Ok(ContextValue::Float(f)),
                (None, None) => Err(format!("unsupported number {n}")),
            },
            Value::Sequence(items) => items
                .iter()
                .map(ContextValue::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(ContextValue::List),
            Value::Null => Err("null is not a valid context value".to_string()),
            Value::Mapping(_) => Err("mappings are not valid context values".to_string()),
            Value::Tagged(tagged) => Err(format!("tagged value {} is not supported", tagged.tag)),
        }
    }
}

/// An ordered mapping from parameter names to values.
///
/// Used both for caller parameters and for the assembled rendering context.
///
/// ```rust
/// use codestamp::Context;
///
/// let params = Context::new()
///     .with("model_name", "User")
///     .with("fields", ["id", "name", "email"]);
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, ContextValue>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ContextValue>,
    ) -> Option<ContextValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts the context to the JSON object handed to the template engine.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl<K: Into<String>, V: Into<ContextValue>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<ContextValue>> Extend<(K, V)> for Context {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Context {
    type Item = (String, ContextValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, ContextValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Computes an extra context key from a string-valued trigger key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationRule {
    trigger: String,
    output: String,
    transform: CaseTransform,
}

impl DerivationRule {
    /// Creates a rule writing `transform(context[trigger])` to `output`.
    pub fn new(
        trigger: impl Into<String>,
        output: impl Into<String>,
        transform: CaseTransform,
    ) -> Self {
        Self {
            trigger: trigger.into(),
            output: output.into(),
            transform,
        }
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn transform(&self) -> CaseTransform {
        self.transform
    }

    /// Fills the output key if the trigger is a string and the output is unset.
    fn apply(&self, context: &mut Context) {
        if context.contains_key(&self.output) {
            return;
        }
        let Some(source) = context.get(&self.trigger).and_then(ContextValue::as_str) else {
            return;
        };
        let derived = self.transform.apply(source);
        context.insert(self.output.clone(), derived);
    }
}

/// The built-in rules, see the module documentation.
pub fn default_rules() -> Vec<DerivationRule> {
    vec![
        DerivationRule::new("model_name", "model_name_snake", CaseTransform::Snake),
        DerivationRule::new("model_name", "model_name_camel", CaseTransform::Camel),
        DerivationRule::new("model_name", "model_name_pascal", CaseTransform::Pascal),
        DerivationRule::new("model_name", "model_name_kebab", CaseTransform::Kebab),
    ]
}

/// Merges defaults, caller parameters and derived keys into a [`Context`].
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    rules: Vec<DerivationRule>,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl ContextAssembler {
    /// An assembler with the built-in derivation rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// An assembler with no derivation rules.
    pub fn without_rules() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a rule. Rules run in insertion order.
    pub fn with_rule(mut self, rule: DerivationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[DerivationRule] {
        &self.rules
    }

    /// Builds the context for one generation.
    ///
    /// Defaults shadowed by a caller parameter are ignored, so only defaults
    /// that end up in the context need to be valid context values.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MalformedDefault`] if a used default is null, a
    /// mapping, or a tagged value.
    pub fn assemble(
        &self,
        template_id: &str,
        config: &TemplateConfig,
        params: &Context,
    ) -> Result<Context, ConfigError> {
        let mut context = Context::new();

        for (key, value) in &config.defaults {
            if params.contains_key(key) {
                continue;
            }
            let value =
                ContextValue::try_from(value).map_err(|reason| ConfigError::MalformedDefault {
                    template_id: template_id.to_string(),
                    key: key.clone(),
                    reason,
                })?;
            context.insert(key.clone(), value);
        }

        for (key, value) in params.iter() {
            context.insert(key, value.clone());
        }

        for rule in &self.rules {
            rule.apply(&mut context);
        }

        tracing::debug!(template_id = %template_id, keys = context.len(), "Assembled context");
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn config(yaml: &str) -> TemplateConfig {
        TemplateConfig {
            defaults: serde_yaml::from_str(yaml).unwrap(),
            ..TemplateConfig::default()
        }
    }

    #[test]
    fn test_defaults_then_params() {
        let config = config("author: codegen\nversion: 1\n");
        let params = Context::new().with("author", "alice");

        let ctx = ContextAssembler::without_rules()
            .assemble("t", &config, &params)
            .unwrap();
        assert_eq!(ctx.get("author"), Some(&ContextValue::from("alice")));
        assert_eq!(ctx.get("version"), Some(&ContextValue::Integer(1)));
    }

    #[test]
    fn test_model_name_derivations() {
        let params = Context::new().with("model_name", "OrderItem");
        let ctx = ContextAssembler::new()
            .assemble("t", &TemplateConfig::default(), &params)
            .unwrap();

        assert_eq!(ctx.get("model_name_snake").and_then(ContextValue::as_str), Some("order_item"));
        assert_eq!(ctx.get("model_name_camel").and_then(ContextValue::as_str), Some("orderItem"));
        assert_eq!(ctx.get("model_name_pascal").and_then(ContextValue::as_str), Some("OrderItem"));
        assert_eq!(ctx.get("model_name_kebab").and_then(ContextValue::as_str), Some("order-item"));
    }

    #[test]
    fn test_derivation_never_overwrites() {
        let params = Context::new()
            .with("model_name", "User")
            .with("model_name_snake", "custom");
        let ctx = ContextAssembler::new()
            .assemble("t", &TemplateConfig::default(), &params)
            .unwrap();

        assert_eq!(ctx.get("model_name_snake").and_then(ContextValue::as_str), Some("custom"));
    }

    #[test]
    fn test_derivation_ignores_non_strings() {
        let params = Context::new().with("model_name", 42);
        let ctx = ContextAssembler::new()
            .assemble("t", &TemplateConfig::default(), &params)
            .unwrap();

        assert!(!ctx.contains_key("model_name_snake"));
    }

    #[test]
    fn test_custom_rule() {
        let assembler = ContextAssembler::without_rules().with_rule(DerivationRule::new(
            "table",
            "TABLE_CONST",
            CaseTransform::ScreamingSnake,
        ));
        let params = Context::new().with("table", "orderItems");
        let ctx = assembler.assemble("t", &TemplateConfig::default(), &params).unwrap();

        assert_eq!(ctx.get("TABLE_CONST").and_then(ContextValue::as_str), Some("ORDER_ITEMS"));
    }

    #[test]
    fn test_malformed_default() {
        let config = config("nested:\n  a: 1\n");
        let err = ContextAssembler::new()
            .assemble("crud/create", &config, &Context::new())
            .unwrap_err();

        match err {
            ConfigError::MalformedDefault { template_id, key, .. } => {
                assert_eq!(template_id, "crud/create");
                assert_eq!(key, "nested");
            }
            other => panic!("expected malformed default, got {other:?}"),
        }
    }

    #[test]
    fn test_shadowed_malformed_default_is_ignored() {
        let config = config("owner: ~\n");
        let params = Context::new().with("owner", "bob");
        let ctx = ContextAssembler::new().assemble("t", &config, &params).unwrap();
        assert_eq!(ctx.get("owner").and_then(ContextValue::as_str), Some("bob"));
    }

    #[test]
    fn test_yaml_conversion() {
        let value: serde_yaml::Value = serde_yaml::from_str("[1, 2.5, true, x]").unwrap();
        assert_eq!(
            ContextValue::try_from(&value).unwrap(),
            ContextValue::List(vec![
                ContextValue::Integer(1),
                ContextValue::Float(2.5),
                ContextValue::Bool(true),
                ContextValue::from("x"),
            ])
        );
    }

    #[test]
    fn test_to_json_is_flat_object() {
        let ctx = Context::new()
            .with("model_name", "User")
            .with("fields", ["id", "email"])
            .with("soft_delete", false);

        assert_eq!(
            ctx.to_json().unwrap(),
            json!({"model_name": "User", "fields": ["id", "email"], "soft_delete": false})
        );
    }

    proptest! {
        #[test]
        fn caller_params_override_defaults(
            key in "[a-z]{1,8}",
            default in "[a-z]{0,8}",
            supplied in "[A-Z]{0,8}",
        ) {
            let mut defaults = BTreeMap::new();
            defaults.insert(key.clone(), serde_yaml::Value::from(default));
            let config = TemplateConfig { defaults, ..TemplateConfig::default() };
            let params = Context::new().with(key.clone(), supplied.clone());

            let ctx = ContextAssembler::new().assemble("t", &config, &params).unwrap();
            prop_assert_eq!(ctx.get(&key), Some(&ContextValue::String(supplied)));
        }
    }
}
