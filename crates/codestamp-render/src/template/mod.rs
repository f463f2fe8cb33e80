//! Template resolution and rendering.
//!
//! Templates live in files under one or more search roots. Rendering happens
//! in two steps:
//!
//! 1. [`TemplateRegistry`] turns an identifier such as `"crud/create"` into a
//!    [`TemplateHandle`] naming exactly one file
//! 2. A [`TemplateEngine`] (by default [`RenderingEnvironment`]) renders that
//!    handle with a JSON context
//!
//! ```rust,ignore
//! let registry = Arc::new(TemplateRegistry::new(["./templates"])?);
//! let engine = RenderingEnvironment::new(Arc::clone(&registry));
//! let handle = registry.resolve("crud/create")?;
//! let code = engine.render(&handle, &json!({"model_name": "User"}))?;
//! ```
//!
//! Includes (`{% include "partials/header" %}`) resolve through the same
//! registry, so they follow the same lookup and collision rules.
//!
//! ## Key Types
//!
//! - [`TemplateRegistry`]: Identifier to file resolution over ordered roots
//! - [`TemplateEngine`]: The rendering seam the generator depends on
//! - [`RenderingEnvironment`]: MiniJinja-backed engine with code-friendly defaults

mod engine;
pub mod filters;
pub mod registry;

pub use engine::{FilterFn, RenderingEnvironment, TemplateEngine};
pub use filters::register_filters;
pub use registry::{RegistryError, TemplateHandle, TemplateRegistry, DEFAULT_TEMPLATE_DIR};
