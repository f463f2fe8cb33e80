//! # Codestamp Render - Template Resolution and Rendering
//!
//! `codestamp-render` is the rendering half of `codestamp`, a configuration
//! driven code generator. It resolves template identifiers against a set of
//! template directories and renders them with MiniJinja, configured for
//! emitting source code: no HTML escaping, strict undefined variables, and
//! whitespace control that keeps block tags out of the output.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use codestamp_render::{RenderingEnvironment, TemplateEngine, TemplateRegistry};
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::create_dir(dir.path().join("crud")).unwrap();
//! std::fs::write(
//!     dir.path().join("crud/create.py"),
//!     "def create_{{ model | snake_case }}():\n    pass\n",
//! )
//! .unwrap();
//!
//! let registry = Arc::new(TemplateRegistry::new([dir.path()]).unwrap());
//! let engine = RenderingEnvironment::new(Arc::clone(&registry));
//!
//! let handle = registry.resolve("crud/create").unwrap();
//! let code = engine.render(&handle, &json!({"model": "UserProfile"})).unwrap();
//! assert_eq!(code, "def create_user_profile():\n    pass\n");
//! ```
//!
//! ## Filters
//!
//! Every environment carries the case filters `snake_case`, `camel_case`,
//! `pascal_case`, `kebab_case` and `screaming_snake_case`. Additional filters
//! are plain closures over JSON values, see [`FilterFn`].
//!
//! ## Modules
//!
//! - [`template`]: Registry, engine trait and MiniJinja environment
//! - [`case`]: Identifier case conversions shared with context derivation

pub mod case;
mod error;
pub mod template;

pub use case::{camel_to_snake, snake_to_camel, CaseTransform};
pub use error::{FilterError, RenderError};
pub use template::{
    register_filters, FilterFn, RegistryError, RenderingEnvironment, TemplateEngine,
    TemplateHandle, TemplateRegistry, DEFAULT_TEMPLATE_DIR,
};
