//! Translation from declared member names to wire names.

use core::fmt::Debug;

use heck::{ToKebabCase, ToShoutySnakeCase, ToSnakeCase, ToTitleCase, ToUpperCamelCase};

/// Maps a declared member name to its primary wire name.
///
/// Consulted only for members without an explicit `rename`.
pub trait NamingPolicy: Debug + Send + Sync {
    /// The wire name for `member`.
    fn translate(&self, member: &str) -> String;
}

/// Built-in naming policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldNaming {
    /// Use the declared name unchanged
    #[default]
    Identity,
    /// `first_name` becomes `FirstName`
    UpperCamelCase,
    /// `first_name` becomes `First Name`
    UpperCamelCaseWithSpaces,
    /// `firstName` becomes `FIRST_NAME`
    UpperCaseWithUnderscores,
    /// `firstName` becomes `first_name`
    LowerCaseWithUnderscores,
    /// `firstName` becomes `first-name`
    LowerCaseWithDashes,
    /// `firstName` becomes `first.name`
    LowerCaseWithDots,
}

impl NamingPolicy for FieldNaming {
    fn translate(&self, member: &str) -> String {
        match self {
            FieldNaming::Identity => member.to_string(),
            FieldNaming::UpperCamelCase => member.to_upper_camel_case(),
            FieldNaming::UpperCamelCaseWithSpaces => member.to_title_case(),
            FieldNaming::UpperCaseWithUnderscores => member.to_shouty_snake_case(),
            FieldNaming::LowerCaseWithUnderscores => member.to_snake_case(),
            FieldNaming::LowerCaseWithDashes => member.to_kebab_case(),
            FieldNaming::LowerCaseWithDots => member.to_snake_case().replace('_', "."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_snake_case_members() {
        let cases = [
            (FieldNaming::Identity, "first_name"),
            (FieldNaming::UpperCamelCase, "FirstName"),
            (FieldNaming::UpperCamelCaseWithSpaces, "First Name"),
            (FieldNaming::UpperCaseWithUnderscores, "FIRST_NAME"),
            (FieldNaming::LowerCaseWithUnderscores, "first_name"),
            (FieldNaming::LowerCaseWithDashes, "first-name"),
            (FieldNaming::LowerCaseWithDots, "first.name"),
        ];
        for (policy, expected) in cases {
            assert_eq!(policy.translate("first_name"), expected, "{policy:?}");
        }
    }

    #[test]
    fn splits_camel_case_members() {
        assert_eq!(
            FieldNaming::LowerCaseWithDashes.translate("someFieldName"),
            "some-field-name"
        );
    }
}
