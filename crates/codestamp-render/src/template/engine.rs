//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait which lets the generator
//! work with different template backends. The default implementation is
//! [`RenderingEnvironment`], a MiniJinja environment whose loader reads
//! sources through a shared [`TemplateRegistry`].

use std::sync::Arc;

use minijinja::value::Rest;
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior, Value};

use super::filters::register_filters;
use super::registry::{TemplateHandle, TemplateRegistry};
use crate::error::{FilterError, RenderError};

/// Signature of a user-supplied filter.
///
/// The first argument is the piped value, the slice holds any call
/// arguments (`{{ value | pad(4, "-") }}`).
pub type FilterFn = dyn Fn(
        &serde_json::Value,
        &[serde_json::Value],
    ) -> Result<serde_json::Value, FilterError>
    + Send
    + Sync;

/// A template engine that can render resolved templates with a context.
///
/// Template engines handle:
/// - Template compilation and caching
/// - Variable substitution, loops, conditionals
/// - Custom filters and global variables
/// - Includes between templates of the same registry
pub trait TemplateEngine: Send + Sync {
    /// Renders a resolved template.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] describing syntax errors, undefined
    /// variables, and failing filters.
    fn render(
        &self,
        handle: &TemplateHandle,
        context: &serde_json::Value,
    ) -> Result<String, RenderError>;

    /// Renders an inline template string.
    fn render_str(
        &self,
        source: &str,
        context: &serde_json::Value,
    ) -> Result<String, RenderError>;

    /// Registers a named filter. A later registration replaces an earlier one.
    fn register_filter(&mut self, name: &str, filter: Arc<FilterFn>);

    /// Registers a value visible to every template under `name`.
    fn register_global(&mut self, name: &str, value: serde_json::Value);

    /// Drops compiled templates so the next render re-reads sources.
    fn clear_cache(&mut self);
}

/// MiniJinja-based rendering environment.
///
/// Configured for generating source code rather than markup:
/// - no auto-escaping
/// - `trim_blocks` and `lstrip_blocks`, so block tags leave no stray whitespace
/// - strict undefined handling: a missing variable is an error, never ""
/// - the final newline of a template is kept
///
/// The case filters (`snake_case`, `camel_case`, `pascal_case`, `kebab_case`,
/// `screaming_snake_case`) are always registered.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use codestamp_render::{RenderingEnvironment, TemplateEngine, TemplateRegistry};
/// use serde_json::json;
///
/// let dir = tempfile::tempdir().unwrap();
/// let registry = Arc::new(TemplateRegistry::new([dir.path()]).unwrap());
/// let engine = RenderingEnvironment::new(registry);
///
/// let output = engine
///     .render_str("class {{ model | pascal_case }}:", &json!({"model": "order_item"}))
///     .unwrap();
/// assert_eq!(output, "class OrderItem:");
/// ```
pub struct RenderingEnvironment {
    env: Environment<'static>,
    registry: Arc<TemplateRegistry>,
}

impl RenderingEnvironment {
    /// Creates an environment loading templates from `registry`.
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        register_filters(&mut env);

        let loader_registry = Arc::clone(&registry);
        env.set_loader(move |name| {
            loader_registry
                .load_source(name)
                .map_err(|e| Error::new(ErrorKind::TemplateNotFound, e.to_string()))
        });

        Self { env, registry }
    }

    /// The registry templates are loaded from.
    pub fn registry(&self) -> &Arc<TemplateRegistry> {
        &self.registry
    }

    /// Returns a reference to the underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Returns a mutable reference to the underlying MiniJinja environment.
    ///
    /// This allows advanced users to register functions or tests directly.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl std::fmt::Debug for RenderingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingEnvironment")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl TemplateEngine for RenderingEnvironment {
    fn render(
        &self,
        handle: &TemplateHandle,
        context: &serde_json::Value,
    ) -> Result<String, RenderError> {
        tracing::debug!(template = %handle.name, "Rendering template");
        let template = self.env.get_template(&handle.name)?;
        Ok(template.render(Value::from_serialize(context))?)
    }

    fn render_str(
        &self,
        source: &str,
        context: &serde_json::Value,
    ) -> Result<String, RenderError> {
        Ok(self.env.render_str(source, Value::from_serialize(context))?)
    }

    fn register_filter(&mut self, name: &str, filter: Arc<FilterFn>) {
        let filter_name = name.to_string();
        self.env.add_filter(
            name.to_string(),
            move |value: Value, args: Rest<Value>| -> Result<Value, Error> {
                let input = to_json(&value)?;
                let args = args.iter().map(to_json).collect::<Result<Vec<_>, _>>()?;
                let output = filter(&input, &args).map_err(|e| {
                    Error::new(
                        ErrorKind::InvalidOperation,
                        format!("filter {filter_name} failed: {e}"),
                    )
                })?;
                Ok(Value::from_serialize(&output))
            },
        );
    }

    fn register_global(&mut self, name: &str, value: serde_json::Value) {
        self.env.add_global(name.to_string(), Value::from_serialize(&value));
    }

    fn clear_cache(&mut self) {
        self.env.clear_templates();
    }
}

fn to_json(value: &Value) -> Result<serde_json::Value, Error> {
    serde_json::to_value(value)
        .map_err(|e| Error::new(ErrorKind::BadSerialization, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn setup(files: &[(&str, &str)]) -> (TempDir, RenderingEnvironment) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let registry = Arc::new(TemplateRegistry::new([dir.path()]).unwrap());
        (dir, RenderingEnvironment::new(registry))
    }

    fn filter<F>(f: F) -> Arc<FilterFn>
    where
        F: Fn(&serde_json::Value, &[serde_json::Value]) -> Result<serde_json::Value, FilterError>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(f)
    }

    fn render_id(
        engine: &RenderingEnvironment,
        id: &str,
        ctx: serde_json::Value,
    ) -> Result<String, RenderError> {
        let handle = engine.registry().resolve(id).unwrap();
        engine.render(&handle, &ctx)
    }

    #[test]
    fn test_render_resolved_template() {
        let (_dir, engine) = setup(&[("greeting.txt", "Hello, {{ name }}!\n")]);
        let output = render_id(&engine, "greeting", json!({"name": "World"})).unwrap();
        assert_eq!(output, "Hello, World!\n");
    }

    #[test]
    fn test_render_serialized_struct() {
        #[derive(Serialize)]
        struct Model {
            model_name: String,
            fields: Vec<String>,
        }

        let (_dir, engine) = setup(&[]);
        let ctx = serde_json::to_value(Model {
            model_name: "User".into(),
            fields: vec!["id".into(), "email".into()],
        })
        .unwrap();

        let source = "{{ model_name }}(\
            {% for f in fields %}{{ f }}{% if not loop.last %}, {% endif %}{% endfor %})";
        let output = engine.render_str(source, &ctx).unwrap();
        assert_eq!(output, "User(id, email)");
    }

    #[test]
    fn test_no_autoescape() {
        let (_dir, engine) = setup(&[("cmp.html", "{{ expr }}")]);
        let ctx = json!({"expr": "a < b && c > \"d\""});
        let output = render_id(&engine, "cmp.html", ctx).unwrap();
        assert_eq!(output, "a < b && c > \"d\"");
    }

    #[test]
    fn test_strict_undefined() {
        let (_dir, engine) = setup(&[]);
        let result = engine.render_str("{{ missing }}", &json!({}));
        assert!(matches!(result, Err(RenderError::Undefined(_))));
    }

    #[test]
    fn test_syntax_error() {
        let (_dir, engine) = setup(&[]);
        let result = engine.render_str("{{ unclosed", &json!({}));
        assert!(matches!(result, Err(RenderError::Syntax(_))));
    }

    #[test]
    fn test_block_whitespace_trimmed() {
        let (_dir, engine) = setup(&[]);
        let source = "fields:\n    {% for f in fields %}\n- {{ f }}\n    {% endfor %}\n";
        let output = engine
            .render_str(source, &json!({"fields": ["id", "name"]}))
            .unwrap();
        assert_eq!(output, "fields:\n- id\n- name\n");
    }

    #[test]
    fn test_builtin_case_filters() {
        let (_dir, engine) = setup(&[]);
        let output = engine
            .render_str(
                "{{ n | snake_case }} {{ n | camel_case }} {{ n | kebab_case }}",
                &json!({"n": "UserProfile"}),
            )
            .unwrap();
        assert_eq!(output, "user_profile userProfile user-profile");
    }

    #[test]
    fn test_include_through_registry() {
        let (_dir, engine) = setup(&[
            ("partials/header.txt", "# generated for {{ model }}\n"),
            ("model.py", "{% include \"partials/header\" %}class {{ model }}:\n    pass\n"),
        ]);
        let output = render_id(&engine, "model", json!({"model": "User"})).unwrap();
        assert_eq!(output, "# generated for User\nclass User:\n    pass\n");
    }

    #[test]
    fn test_include_missing_template() {
        let (_dir, engine) = setup(&[]);
        let result = engine.render_str("{% include \"nope\" %}", &json!({}));
        assert!(matches!(result, Err(RenderError::TemplateNotFound(_))));
    }

    #[test]
    fn test_render_exact_name_beside_longer_name_in_other_root() {
        let project = TempDir::new().unwrap();
        let vendor = TempDir::new().unwrap();
        fs::write(project.path().join("greeting.txt"), "Hello, {{ name }}!\n").unwrap();
        fs::write(vendor.path().join("greeting.txt.j2"), "vendored\n").unwrap();
        let registry = Arc::new(TemplateRegistry::new([project.path(), vendor.path()]).unwrap());
        let engine = RenderingEnvironment::new(registry);

        let output = render_id(&engine, "greeting", json!({"name": "Ada"})).unwrap();
        assert_eq!(output, "Hello, Ada!\n");
    }

    #[test]
    fn test_include_collision_is_lookup_error() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(first.path().join("part.txt"), "one").unwrap();
        fs::write(second.path().join("part.txt"), "two").unwrap();
        let registry = Arc::new(TemplateRegistry::new([first.path(), second.path()]).unwrap());
        let engine = RenderingEnvironment::new(registry);

        let result = engine.render_str("{% include \"part.txt\" %}", &json!({}));
        assert!(matches!(result, Err(RenderError::TemplateNotFound(_))));
    }

    #[test]
    fn test_custom_filter() {
        let (_dir, mut engine) = setup(&[]);
        engine.register_filter(
            "repeat",
            filter(|value, args| {
                let s = value.as_str().ok_or_else(|| FilterError::new("expects a string"))?;
                let n = args.first().and_then(|a| a.as_u64()).unwrap_or(2) as usize;
                Ok(json!(s.repeat(n)))
            }),
        );

        let output = engine
            .render_str("{{ s | repeat(3) }}|{{ s | repeat }}", &json!({"s": "ab"}))
            .unwrap();
        assert_eq!(output, "ababab|abab");
    }

    #[test]
    fn test_custom_filter_error() {
        let (_dir, mut engine) = setup(&[]);
        engine.register_filter("fail", filter(|_, _| Err(FilterError::new("always fails"))));

        let err = engine.render_str("{{ 1 | fail }}", &json!({})).unwrap_err();
        assert!(matches!(err, RenderError::Evaluation(_)));
        assert!(err.to_string().contains("always fails"));
    }

    #[test]
    fn test_custom_filter_replaces_builtin() {
        let (_dir, mut engine) = setup(&[]);
        engine.register_filter("snake_case", filter(|_, _| Ok(json!("overridden"))));

        let output = engine.render_str("{{ 'X' | snake_case }}", &json!({})).unwrap();
        assert_eq!(output, "overridden");
    }

    #[test]
    fn test_global_variable() {
        let (_dir, mut engine) = setup(&[]);
        engine.register_global("project", json!({"name": "billing", "version": 2}));

        let output = engine
            .render_str("{{ project.name }} v{{ project.version }}", &json!({}))
            .unwrap();
        assert_eq!(output, "billing v2");
    }

    #[test]
    fn test_context_shadows_global() {
        let (_dir, mut engine) = setup(&[]);
        engine.register_global("author", json!("global"));

        let output = engine.render_str("{{ author }}", &json!({"author": "local"})).unwrap();
        assert_eq!(output, "local");
    }

    #[test]
    fn test_clear_cache_picks_up_changes() {
        let (dir, mut engine) = setup(&[("note.txt", "v1")]);
        assert_eq!(render_id(&engine, "note", json!({})).unwrap(), "v1");

        fs::write(dir.path().join("note.txt"), "v2").unwrap();
        assert_eq!(render_id(&engine, "note", json!({})).unwrap(), "v1");

        engine.clear_cache();
        assert_eq!(render_id(&engine, "note", json!({})).unwrap(), "v2");
    }
}
