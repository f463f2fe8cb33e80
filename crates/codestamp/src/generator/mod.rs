//! Generation orchestration.
//!
//! [`CodeGenerator`] runs each request through a fixed pipeline:
//!
//! ```text
//! Validating → Resolving → Assembling → Rendering → Writing
//! ```
//!
//! Any step can fail with an [`Error`](crate::Error) whose
//! [`stage`](crate::Error::stage) names the step. Validation, resolution,
//! assembly and rendering all finish before anything touches the output path,
//! so a failed request never leaves a file behind.
//!
//! ## Validation
//!
//! Checks run in this order, stopping at the first failure:
//!
//! 1. The template id is not empty
//! 2. The output path is not empty and is not a directory
//! 3. No part of the output directory path is a regular file, and the
//!    directory exists (the latter skipped with `create_missing_dirs`)
//! 4. The output path holds no content (skipped with [`OverwritePolicy::Overwrite`])
//! 5. Every required parameter is supplied or defaulted
//!
//! ## Example
//!
//! ```rust,ignore
//! use codestamp::{CodeGenerator, Context};
//!
//! let generator = CodeGenerator::builder()
//!     .config_file("codegen.yaml")
//!     .template_dir("templates")
//!     .build()?;
//!
//! generator.generate_code(
//!     "crud/create",
//!     "out/user.py",
//!     &Context::new()
//!         .with("model_name", "User")
//!         .with("fields", ["id", "name", "email"]),
//! )?;
//! ```

mod batch;
mod builder;

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use codestamp_render::{FilterError, TemplateEngine, TemplateRegistry};

use crate::config::{ConfigStore, TemplateConfig};
use crate::context::{Context, ContextAssembler, ContextValue};
use crate::error::{ConfigError, Error, GenerationStage, Result, ValidationError};
use crate::output::{self, OverwritePolicy};

pub use batch::{BatchFailure, BatchPolicy, BatchReport};
pub use builder::GeneratorBuilder;

/// One file to generate.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub template_id: String,
    pub output_path: PathBuf,
    pub params: Context,
}

impl GenerationRequest {
    /// Creates a request with no parameters.
    pub fn new(template_id: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            template_id: template_id.into(),
            output_path: output_path.into(),
            params: Context::new(),
        }
    }

    /// Adds a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Replaces all parameters.
    pub fn with_params(mut self, params: Context) -> Self {
        self.params = params;
        self
    }
}

/// Generates files from configured templates.
///
/// Owns the configuration store, the template registry and the rendering
/// engine; filters and globals registered on a generator apply to every
/// later render.
pub struct CodeGenerator {
    config: ConfigStore,
    registry: Arc<TemplateRegistry>,
    engine: Box<dyn TemplateEngine>,
    assembler: ContextAssembler,
    overwrite: OverwritePolicy,
    create_missing_dirs: bool,
    require_template_config: bool,
}

impl std::fmt::Debug for CodeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("assembler", &self.assembler)
            .field("overwrite", &self.overwrite)
            .field("create_missing_dirs", &self.create_missing_dirs)
            .field("require_template_config", &self.require_template_config)
            .finish_non_exhaustive()
    }
}

impl CodeGenerator {
    /// Starts building a generator.
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::new()
    }

    /// A generator reading `config_path`, with templates under the default
    /// template directory.
    pub fn from_config_file(config_path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().config_file(config_path).build()
    }

    /// Generates one file and returns its path.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`] for bad ids, paths, conflicts or missing parameters
    /// - [`Error::TemplateLookup`] if the template does not resolve
    /// - [`Error::Render`] if rendering fails
    /// - [`Error::Output`] if the file cannot be written
    pub fn generate_code(
        &self,
        template_id: &str,
        output_path: impl AsRef<Path>,
        params: &Context,
    ) -> Result<PathBuf> {
        let output_path = output_path.as_ref();
        let config = self.validate(template_id, Some(output_path), params)?;
        let rendered = self.render_validated(template_id, &config, params)?;
        self.write(output_path, &rendered)?;

        tracing::info!(
            template_id = %template_id,
            path = ?output_path,
            bytes = rendered.len(),
            "Generated file"
        );
        Ok(output_path.to_path_buf())
    }

    /// Generates the file described by `request`.
    pub fn generate(&self, request: &GenerationRequest) -> Result<PathBuf> {
        self.generate_code(&request.template_id, &request.output_path, &request.params)
    }

    /// Renders a template without writing anything.
    ///
    /// Runs the same template id and parameter checks as
    /// [`generate_code`](Self::generate_code).
    pub fn render(&self, template_id: &str, params: &Context) -> Result<String> {
        let config = self.validate(template_id, None, params)?;
        self.render_validated(template_id, &config, params)
    }

    /// Templates at the top level of every template directory.
    pub fn list_available_templates(&self) -> Result<BTreeSet<String>> {
        Ok(self.registry.list()?)
    }

    /// The unrendered source of a template.
    pub fn template_source(&self, template_id: &str) -> Result<String> {
        self.registry
            .read_raw(template_id)
            .map_err(|source| Error::TemplateLookup {
                template_id: template_id.to_string(),
                source,
            })
    }

    /// Registers a filter available to every template.
    ///
    /// ```rust,ignore
    /// generator.add_custom_filter("pluralize", |value, _args| {
    ///     let word = value.as_str().ok_or_else(|| FilterError::new("expects a string"))?;
    ///     Ok(format!("{word}s").into())
    /// });
    /// ```
    pub fn add_custom_filter<F>(&mut self, name: &str, filter: F)
    where
        F: Fn(
                &serde_json::Value,
                &[serde_json::Value],
            ) -> std::result::Result<serde_json::Value, FilterError>
            + Send
            + Sync
            + 'static,
    {
        tracing::debug!(filter = %name, "Registering filter");
        self.engine.register_filter(name, Arc::new(filter));
    }

    /// Registers a value available to every template.
    pub fn add_global_variable(&mut self, name: &str, value: impl Into<serde_json::Value>) {
        tracing::debug!(global = %name, "Registering global");
        self.engine.register_global(name, value.into());
    }

    /// Reads a dotted configuration key.
    pub fn get_config_value(&self, key: &str) -> Result<serde_yaml::Value> {
        Ok(self.config.get_value(key)?.clone())
    }

    /// Sets a dotted configuration key in memory.
    pub fn set_config_value(
        &mut self,
        key: &str,
        value: impl Into<serde_yaml::Value>,
    ) -> Result<()> {
        Ok(self.config.set_value(key, value)?)
    }

    /// Writes the configuration back to its file.
    pub fn save_config(&self) -> Result<()> {
        Ok(self.config.save()?)
    }

    /// Makes later renders observe template files changed on disk.
    pub fn reload_templates(&mut self) {
        self.registry.reload();
        self.engine.clear_cache();
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    fn validate(
        &self,
        template_id: &str,
        output_path: Option<&Path>,
        params: &Context,
    ) -> Result<TemplateConfig> {
        tracing::debug!(
            template_id = %template_id,
            stage = %GenerationStage::Validating,
            "Generation stage"
        );

        if template_id.trim().is_empty() {
            return Err(ValidationError::EmptyTemplateId.into());
        }
        if let Some(path) = output_path {
            self.validate_output(path)?;
        }

        let config = match self.config.template_config(template_id)? {
            Some(config) => config,
            None if self.require_template_config => {
                return Err(ConfigError::MissingTemplate {
                    template_id: template_id.to_string(),
                }
                .into())
            }
            None => TemplateConfig::default(),
        };

        for parameter in &config.required_params {
            if !params.contains_key(parameter) && !config.defaults.contains_key(parameter) {
                return Err(ValidationError::MissingParameter {
                    template_id: template_id.to_string(),
                    parameter: parameter.clone(),
                }
                .into());
            }
        }
        Ok(config)
    }

    fn validate_output(&self, path: &Path) -> Result<()> {
        let invalid = |reason| -> Error {
            ValidationError::InvalidPath {
                path: path.to_path_buf(),
                reason,
            }
            .into()
        };

        if path.as_os_str().is_empty() {
            return Err(invalid("output path is empty"));
        }
        if path.is_dir() {
            return Err(invalid("output path is a directory"));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            // The closest existing ancestor is where directory creation starts.
            let blocked = parent
                .ancestors()
                .find(|dir| dir.exists())
                .is_some_and(|dir| !dir.is_dir());
            if blocked {
                return Err(invalid("output directory is not a directory"));
            }
            if !self.create_missing_dirs && !parent.is_dir() {
                return Err(invalid("output directory does not exist"));
            }
        }

        let occupied = output::has_content(path).map_err(|source| Error::Output {
            path: path.to_path_buf(),
            source,
        })?;
        if occupied && self.overwrite == OverwritePolicy::Fail {
            return Err(ValidationError::OutputConflict {
                path: path.to_path_buf(),
            }
            .into());
        }
        Ok(())
    }

    fn render_validated(
        &self,
        template_id: &str,
        config: &TemplateConfig,
        params: &Context,
    ) -> Result<String> {
        tracing::debug!(
            template_id = %template_id,
            stage = %GenerationStage::Resolving,
            "Generation stage"
        );
        let handle = self
            .registry
            .resolve(template_id)
            .map_err(|source| Error::TemplateLookup {
                template_id: template_id.to_string(),
                source,
            })?;

        tracing::debug!(
            template_id = %template_id,
            stage = %GenerationStage::Assembling,
            "Generation stage"
        );
        let context = self.assembler.assemble(template_id, config, params)?;

        tracing::debug!(
            template_id = %template_id,
            stage = %GenerationStage::Rendering,
            "Generation stage"
        );
        let render_error = |source| Error::Render {
            template_id: template_id.to_string(),
            source,
        };
        let data = context.to_json().map_err(|e| render_error(e.into()))?;
        self.engine.render(&handle, &data).map_err(render_error)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        tracing::debug!(path = ?path, stage = %GenerationStage::Writing, "Generation stage");
        let output_error = |source: io::Error| -> Error {
            if source.kind() == io::ErrorKind::AlreadyExists {
                ValidationError::OutputConflict {
                    path: path.to_path_buf(),
                }
                .into()
            } else {
                Error::Output {
                    path: path.to_path_buf(),
                    source,
                }
            }
        };

        if self.create_missing_dirs {
            output::ensure_parent(path).map_err(output_error)?;
        }
        output::write_atomic(path, contents, self.overwrite).map_err(output_error)
    }
}
