//! MiniJinja filter registration.

use minijinja::{Environment, Error, ErrorKind, Value};

use crate::case::CaseTransform;

/// Registers all built-in filters on a minijinja environment.
///
/// Every [`CaseTransform`] is exposed under its filter name, so templates can
/// write `{{ model_name | snake_case }}` or `{{ table | pascal_case }}`.
///
/// # Arguments
///
/// * `env` - The MiniJinja environment to register filters on
pub fn register_filters(env: &mut Environment<'static>) {
    for transform in CaseTransform::ALL {
        env.add_filter(
            transform.filter_name(),
            move |value: Value| -> Result<String, Error> {
                let s = value.as_str().ok_or_else(|| {
                    Error::new(
                        ErrorKind::InvalidOperation,
                        format!("{} filter expects a string", transform.filter_name()),
                    )
                })?;
                Ok(transform.apply(s))
            },
        );
    }
}
