//! Error types for code generation.
//!
//! Every failure is reported as an [`Error`]. The variants wrap narrower
//! enums ([`ConfigError`], [`ValidationError`], ...) so callers can match on
//! the exact kind, and [`Error::stage`] tells which pipeline step failed.

use std::fmt;
use std::io;
use std::path::PathBuf;

use codestamp_render::{RegistryError, RenderError};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline steps of a single generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationStage {
    /// Checking the template id, output path and required parameters.
    Validating,
    /// Locating the template file.
    Resolving,
    /// Merging defaults, parameters and derived keys.
    Assembling,
    /// Running the template engine.
    Rendering,
    /// Persisting the rendered text.
    Writing,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationStage::Validating => "validating",
            GenerationStage::Resolving => "resolving",
            GenerationStage::Assembling => "assembling",
            GenerationStage::Rendering => "rendering",
            GenerationStage::Writing => "writing",
        };
        f.write_str(name)
    }
}

/// Errors raised by the configuration store.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Reading or writing the configuration file failed.
    #[error("configuration I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document is not valid YAML.
    #[error("malformed configuration in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document is valid YAML but has the wrong shape.
    #[error("malformed configuration in {origin}: {message}")]
    Malformed { origin: String, message: String },

    /// A template entry could not be interpreted.
    #[error("invalid configuration for template \"{template_id}\": {message}")]
    InvalidTemplateEntry { template_id: String, message: String },

    /// No entry exists for the template.
    #[error("no configuration found for template \"{template_id}\"")]
    MissingTemplate { template_id: String },

    /// A default value cannot be used as a context value.
    #[error("invalid default \"{key}\" for template \"{template_id}\": {reason}")]
    MalformedDefault {
        template_id: String,
        key: String,
        reason: String,
    },

    /// A dotted key is empty or has an empty segment.
    #[error("invalid configuration key \"{key}\"")]
    InvalidKey { key: String },

    /// `set_value` would have to descend through a non-mapping value.
    #[error("cannot set \"{key}\": \"{blocked_at}\" is not a mapping")]
    NotAMapping { key: String, blocked_at: String },

    /// `save` was called on a store that was not loaded from a file.
    #[error("configuration has no file path; use save_to")]
    NoPath,
}

/// A dotted configuration key that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("configuration key \"{key}\" not found (missing \"{missing}\")")]
pub struct KeyLookupError {
    /// The full key that was requested.
    pub key: String,
    /// The first path segment that was absent.
    pub missing: String,
}

/// Input problems detected before anything is rendered or written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The template id is empty.
    #[error("template id must not be empty")]
    EmptyTemplateId,

    /// A required parameter is neither supplied nor defaulted.
    #[error("missing required parameter \"{parameter}\" for template \"{template_id}\"")]
    MissingParameter {
        template_id: String,
        parameter: String,
    },

    /// The output path cannot be written to.
    #[error("invalid output path \"{}\": {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: &'static str },

    /// The output path already holds content and overwriting is not enabled.
    #[error("output path \"{}\" already has content", .path.display())]
    OutputConflict { path: PathBuf },
}

/// Error type for every public operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration could not be loaded, read or saved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A dotted configuration key does not exist.
    #[error(transparent)]
    KeyLookup(#[from] KeyLookupError),

    /// The request was rejected before any side effect.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The template registry could not be built or listed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The template id did not resolve to exactly one file.
    #[error("template lookup failed for \"{template_id}\": {source}")]
    TemplateLookup {
        template_id: String,
        #[source]
        source: RegistryError,
    },

    /// The template failed to render.
    #[error("failed to render template \"{template_id}\": {source}")]
    Render {
        template_id: String,
        #[source]
        source: RenderError,
    },

    /// Creating the output directory or writing the file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// The pipeline stage this error belongs to.
    ///
    /// Returns `None` for errors raised outside a generation, such as
    /// configuration accessors or registry construction.
    pub fn stage(&self) -> Option<GenerationStage> {
        match self {
            Error::Validation(_) | Error::Config(ConfigError::MissingTemplate { .. }) => {
                Some(GenerationStage::Validating)
            }
            Error::Config(ConfigError::InvalidTemplateEntry { .. }) => {
                Some(GenerationStage::Validating)
            }
            Error::Config(ConfigError::MalformedDefault { .. }) => {
                Some(GenerationStage::Assembling)
            }
            Error::TemplateLookup { .. } => Some(GenerationStage::Resolving),
            Error::Render { .. } => Some(GenerationStage::Rendering),
            Error::Output { .. } => Some(GenerationStage::Writing),
            Error::Config(_) | Error::KeyLookup(_) | Error::Registry(_) => None,
        }
    }

    /// Returns true for input validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
