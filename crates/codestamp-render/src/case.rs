//! Identifier case conversion.
//!
//! Thin wrappers over [`heck`] used by the built-in template filters and by
//! context derivation rules.

use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

/// Converts a camelCase or PascalCase identifier to snake_case.
///
/// ```rust
/// use codestamp_render::camel_to_snake;
///
/// assert_eq!(camel_to_snake("UserProfile"), "user_profile");
/// assert_eq!(camel_to_snake("userProfile"), "user_profile");
/// ```
pub fn camel_to_snake(s: &str) -> String {
    s.to_snake_case()
}

/// Converts a snake_case identifier to lowerCamelCase.
///
/// ```rust
/// use codestamp_render::snake_to_camel;
///
/// assert_eq!(snake_to_camel("user_profile"), "userProfile");
/// ```
pub fn snake_to_camel(s: &str) -> String {
    s.to_lower_camel_case()
}

/// A named case transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseTransform {
    /// `user_profile`
    Snake,
    /// `userProfile`
    Camel,
    /// `UserProfile`
    Pascal,
    /// `user-profile`
    Kebab,
    /// `USER_PROFILE`
    ScreamingSnake,
}

impl CaseTransform {
    /// Applies the transformation to `s`.
    pub fn apply(self, s: &str) -> String {
        match self {
            CaseTransform::Snake => s.to_snake_case(),
            CaseTransform::Camel => s.to_lower_camel_case(),
            CaseTransform::Pascal => s.to_pascal_case(),
            CaseTransform::Kebab => s.to_kebab_case(),
            CaseTransform::ScreamingSnake => s.to_shouty_snake_case(),
        }
    }

    /// The filter name this transformation is registered under.
    pub fn filter_name(self) -> &'static str {
        match self {
            CaseTransform::Snake => "snake_case",
            CaseTransform::Camel => "camel_case",
            CaseTransform::Pascal => "pascal_case",
            CaseTransform::Kebab => "kebab_case",
            CaseTransform::ScreamingSnake => "screaming_snake_case",
        }
    }

    /// All transformations, in filter registration order.
    pub const ALL: [CaseTransform; 5] = [
        CaseTransform::Snake,
        CaseTransform::Camel,
        CaseTransform::Pascal,
        CaseTransform::Kebab,
        CaseTransform::ScreamingSnake,
    ];
}
