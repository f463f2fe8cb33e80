//! # Codestamp - Configuration-Driven Code Generation
//!
//! `codestamp` renders named templates with caller-supplied parameters and
//! writes the result to files. A YAML configuration declares, per template,
//! which parameters are required and which have defaults:
//!
//! ```yaml
//! crud/create:
//!   required_params: [model_name, fields]
//!   defaults:
//!     base_class: Model
//! ```
//!
//! Templates are MiniJinja files looked up in one or more template
//! directories (see [`TemplateRegistry`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use codestamp::{CodeGenerator, ConfigStore, Context};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let templates = dir.path().join("templates");
//! std::fs::create_dir_all(templates.join("crud")).unwrap();
//! std::fs::write(
//!     templates.join("crud/create.py"),
//!     "def create_{{ model_name_snake }}({{ fields | join(', ') }}):\n    pass\n",
//! )
//! .unwrap();
//!
//! let config = ConfigStore::from_yaml_str(
//!     "crud/create:\n  required_params: [model_name, fields]\n",
//! )
//! .unwrap();
//!
//! let generator = CodeGenerator::builder()
//!     .config(config)
//!     .template_dir(&templates)
//!     .build()
//!     .unwrap();
//!
//! let output = dir.path().join("user.py");
//! generator
//!     .generate_code(
//!         "crud/create",
//!         &output,
//!         &Context::new()
//!             .with("model_name", "UserProfile")
//!             .with("fields", ["id", "email"]),
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     std::fs::read_to_string(&output).unwrap(),
//!     "def create_user_profile(id, email):\n    pass\n",
//! );
//! ```
//!
//! ## Pipeline
//!
//! Each generation validates its input, resolves the template, assembles the
//! context (defaults, then parameters, then derived keys such as
//! `model_name_snake`), renders, and writes atomically. Nothing is written
//! unless every earlier step succeeds, and existing files are never replaced
//! unless [`OverwritePolicy::Overwrite`] is set.
//!
//! ## Modules
//!
//! - [`config`]: YAML configuration store and per-template settings
//! - [`context`]: Context values, derivation rules and assembly
//! - [`generator`]: The generator, its builder and batch generation
//! - [`output`]: Atomic file writing

pub mod config;
pub mod context;
mod error;
pub mod generator;
pub mod output;

pub use config::{ConfigStore, TemplateConfig};
pub use context::{default_rules, Context, ContextAssembler, ContextValue, DerivationRule};
pub use error::{ConfigError, Error, GenerationStage, KeyLookupError, Result, ValidationError};
pub use generator::{
    BatchFailure, BatchPolicy, BatchReport, CodeGenerator, GenerationRequest, GeneratorBuilder,
};
pub use output::OverwritePolicy;

// Re-export the rendering layer so most users need a single dependency.
pub use codestamp_render::{
    camel_to_snake, snake_to_camel, CaseTransform, FilterError, FilterFn, RegistryError,
    RenderError, RenderingEnvironment, TemplateEngine, TemplateHandle, TemplateRegistry,
    DEFAULT_TEMPLATE_DIR,
};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
