//! Builder for [`CodeGenerator`].

use std::path::PathBuf;
use std::sync::Arc;

use codestamp_render::{RenderingEnvironment, TemplateEngine, TemplateRegistry};

use super::CodeGenerator;
use crate::config::ConfigStore;
use crate::context::ContextAssembler;
use crate::error::Result;
use crate::output::OverwritePolicy;

/// Configures and builds a [`CodeGenerator`].
///
/// Every option has a default:
///
/// | Option | Default |
/// |--------|---------|
/// | configuration | empty store |
/// | template directories | `./templates` |
/// | template extensions | any non-hidden file |
/// | overwrite | [`OverwritePolicy::Fail`] |
/// | create missing directories | `false` |
/// | require template configuration | `false` |
/// | assembler | [`ContextAssembler::new`] |
/// | engine | [`RenderingEnvironment`] over the registry |
///
/// # Example
///
/// ```rust
/// use codestamp::{CodeGenerator, ConfigStore, OverwritePolicy};
///
/// let templates = tempfile::tempdir().unwrap();
/// let generator = CodeGenerator::builder()
///     .config(ConfigStore::from_yaml_str("greet:\n  required_params: [name]\n").unwrap())
///     .template_dir(templates.path())
///     .overwrite(OverwritePolicy::Overwrite)
///     .build()
///     .unwrap();
///
/// assert_eq!(generator.config().template_ids(), vec!["greet"]);
/// ```
#[derive(Default)]
pub struct GeneratorBuilder {
    config_file: Option<PathBuf>,
    config: Option<ConfigStore>,
    template_dirs: Vec<PathBuf>,
    template_extensions: Option<Vec<String>>,
    overwrite: OverwritePolicy,
    create_missing_dirs: bool,
    require_template_config: bool,
    assembler: Option<ContextAssembler>,
    engine: Option<Box<dyn TemplateEngine>>,
}

impl GeneratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file at build time.
    ///
    /// Ignored when [`config`](Self::config) is also set.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Uses an already loaded configuration store.
    pub fn config(mut self, config: ConfigStore) -> Self {
        self.config = Some(config);
        self
    }

    /// Adds a template search directory. Can be called repeatedly; directories
    /// are searched in the order added.
    pub fn template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dirs.push(dir.into());
        self
    }

    /// Only treats files with these extensions as templates, in priority order.
    pub fn template_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template_extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite = policy;
        self
    }

    /// Creates the output directory when it does not exist.
    pub fn create_missing_dirs(mut self, enabled: bool) -> Self {
        self.create_missing_dirs = enabled;
        self
    }

    /// Rejects templates that have no configuration entry.
    pub fn require_template_config(mut self, enabled: bool) -> Self {
        self.require_template_config = enabled;
        self
    }

    pub fn assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = Some(assembler);
        self
    }

    /// Replaces the default MiniJinja engine.
    pub fn engine(mut self, engine: Box<dyn TemplateEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Builds the generator.
    ///
    /// # Errors
    ///
    /// - [`ConfigError`](crate::ConfigError) if the configuration file cannot be loaded
    /// - [`RegistryError::RootNotFound`](codestamp_render::RegistryError::RootNotFound)
    ///   if a template directory does not exist
    pub fn build(self) -> Result<CodeGenerator> {
        let config = match (self.config, self.config_file) {
            (Some(config), _) => config,
            (None, Some(path)) => ConfigStore::load(path)?,
            (None, None) => ConfigStore::empty(),
        };

        let mut registry = if self.template_dirs.is_empty() {
            TemplateRegistry::with_default_root()?
        } else {
            TemplateRegistry::new(self.template_dirs)?
        };
        if let Some(extensions) = self.template_extensions {
            registry = registry.with_extensions(extensions);
        }
        let registry = Arc::new(registry);
        tracing::debug!(roots = ?registry.roots(), "Template registry ready");

        let engine = self
            .engine
            .unwrap_or_else(|| Box::new(RenderingEnvironment::new(Arc::clone(&registry))));

        Ok(CodeGenerator {
            config,
            registry,
            engine,
            assembler: self.assembler.unwrap_or_default(),
            overwrite: self.overwrite,
            create_missing_dirs: self.create_missing_dirs,
            require_template_config: self.require_template_config,
        })
    }
}
