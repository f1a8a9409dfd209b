//! Hierarchical Azure Resource Manager identifiers.
//!
//! An identifier is a path of `/{key}/{value}` pairs, for example
//! `/subscriptions/{id}/resourceGroups/{name}/providers/Microsoft.AppPlatform/spring/{name}`.
//! Every typed identifier in this module describes its layout as a list of [`Segment`]s, which
//! is used both for parsing and for formatting, so that parsing and formatting round-trip.
//!
//! Some API versions return identifiers with differently cased keys (`Spring` instead of
//! `spring`, `resourcegroups` instead of `resourceGroups`). Those can be read with the
//! `parse_insensitively` constructors, which always produce the canonical casing on output.

use std::fmt::Display;

use snafu::{Snafu, ensure};

#[macro_use]
mod macros;
mod springcloud;

pub use springcloud::*;

/// The error type for identifier parsing.
#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum ParseError {
    /// Indicates that the input is empty or only consists of slashes.
    #[snafu(display("resource id cannot be empty"))]
    EmptyInput,

    /// Indicates that the input does not consist of `/{key}/{value}` pairs.
    #[snafu(display("resource id {input:?} must consist of key/value pairs"))]
    UnpairedSegment { input: String },

    /// Indicates that the input has more or fewer pairs than the identifier layout.
    #[snafu(display(
        "resource id {input:?} has {found} segments, expected {expected} segments"
    ))]
    SegmentCount {
        input: String,
        expected: usize,
        found: usize,
    },

    /// Indicates that a key does not match the identifier layout.
    #[snafu(display("expected segment key {expected:?} but found {found:?}"))]
    UnexpectedKey {
        expected: &'static str,
        found: String,
    },

    /// Indicates that a fixed value (like the provider namespace) does not match.
    #[snafu(display("expected {expected:?} for segment {key:?} but found {found:?}"))]
    UnexpectedValue {
        key: &'static str,
        expected: &'static str,
        found: String,
    },

    /// Indicates that a user-specified value is empty.
    #[snafu(display("value of segment {key:?} cannot be empty"))]
    EmptyValue { key: String },
}

/// How segment keys (and fixed values) are compared during parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Casing {
    Sensitive,
    Insensitive,
}

impl Casing {
    fn matches(self, expected: &str, found: &str) -> bool {
        match self {
            Self::Sensitive => expected == found,
            Self::Insensitive => expected.eq_ignore_ascii_case(found),
        }
    }
}

/// One `/{key}/{value}` pair of an identifier layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    key: &'static str,
    fixed_value: Option<&'static str>,
}

impl Segment {
    /// A segment whose value is supplied by the user, like a resource group name.
    pub const fn user(key: &'static str) -> Self {
        Self {
            key,
            fixed_value: None,
        }
    }

    /// A segment whose value is part of the layout, like the provider namespace.
    pub const fn fixed(key: &'static str, value: &'static str) -> Self {
        Self {
            key,
            fixed_value: Some(value),
        }
    }

    pub const fn key(&self) -> &'static str {
        self.key
    }
}

/// Splits `input` into its `(key, value)` pairs.
fn pairs(input: &str) -> Result<Vec<(&str, &str)>, ParseError> {
    let trimmed = input.trim().trim_matches('/');
    ensure!(!trimmed.is_empty(), EmptyInputSnafu);

    let parts = trimmed.split('/').collect::<Vec<_>>();
    ensure!(
        parts.len() % 2 == 0,
        UnpairedSegmentSnafu {
            input: input.to_owned()
        }
    );

    Ok(parts
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect())
}

/// Parses `input` against `layout` and returns the user-specified values in layout order.
pub fn parse_segments(
    input: &str,
    layout: &[Segment],
    casing: Casing,
) -> Result<Vec<String>, ParseError> {
    let pairs = pairs(input)?;
    ensure!(
        pairs.len() == layout.len(),
        SegmentCountSnafu {
            input: input.to_owned(),
            expected: layout.len(),
            found: pairs.len(),
        }
    );

    let mut values = Vec::new();
    for (segment, (key, value)) in layout.iter().zip(pairs) {
        ensure!(
            casing.matches(segment.key, key),
            UnexpectedKeySnafu {
                expected: segment.key,
                found: key,
            }
        );
        ensure!(!value.is_empty(), EmptyValueSnafu { key: segment.key });

        match segment.fixed_value {
            Some(expected) => ensure!(
                // Provider namespaces are case-insensitive in every API version
                expected.eq_ignore_ascii_case(value),
                UnexpectedValueSnafu {
                    key: segment.key,
                    expected,
                    found: value,
                }
            ),
            None => values.push(value.to_owned()),
        }
    }

    Ok(values)
}

/// Writes `layout` with the given user values in canonical form.
pub fn format_segments(
    f: &mut std::fmt::Formatter<'_>,
    layout: &[Segment],
    values: &[&str],
) -> std::fmt::Result {
    let mut values = values.iter();
    for segment in layout {
        let value = match segment.fixed_value {
            Some(fixed) => fixed,
            None => values.next().copied().unwrap_or_default(),
        };
        write!(f, "/{}/{}", segment.key, value)?;
    }
    Ok(())
}

/// An identifier of any Azure resource, used where only the general shape can be validated
/// (for example a managed environment or a certificate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericResourceId {
    pub subscription_id: String,
    pub resource_group: Option<String>,
    path: Vec<(String, String)>,
}

impl GenericResourceId {
    /// Parses any identifier starting with a subscription. Keys are matched insensitively.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let pairs = pairs(input)?;
        let mut iter = pairs.into_iter();

        let (key, subscription_id) = iter.next().ok_or(ParseError::EmptyInput)?;
        ensure!(
            key.eq_ignore_ascii_case("subscriptions"),
            UnexpectedKeySnafu {
                expected: "subscriptions",
                found: key,
            }
        );
        ensure!(
            !subscription_id.is_empty(),
            EmptyValueSnafu {
                key: "subscriptions"
            }
        );

        let mut resource_group = None;
        let mut path = Vec::new();
        for (key, value) in iter {
            ensure!(!value.is_empty(), EmptyValueSnafu { key });
            if resource_group.is_none() && path.is_empty() && key.eq_ignore_ascii_case("resourceGroups")
            {
                resource_group = Some(value.to_owned());
            } else {
                path.push((key.to_owned(), value.to_owned()));
            }
        }

        Ok(Self {
            subscription_id: subscription_id.to_owned(),
            resource_group,
            path,
        })
    }

    /// Returns the value of the last segment, which is the name of the resource.
    pub fn name(&self) -> Option<&str> {
        self.path.last().map(|(_, value)| value.as_str())
    }
}

impl Display for GenericResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/subscriptions/{}", self.subscription_id)?;
        if let Some(resource_group) = &self.resource_group {
            write!(f, "/resourceGroups/{resource_group}")?;
        }
        for (key, value) in &self.path {
            write!(f, "/{key}/{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const LAYOUT: &[Segment] = &[
        Segment::user("subscriptions"),
        Segment::user("resourceGroups"),
        Segment::fixed("providers", "Microsoft.AppPlatform"),
        Segment::user("spring"),
    ];

    #[test]
    fn parse_segments_returns_user_values() {
        let values = parse_segments(
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc",
            LAYOUT,
            Casing::Sensitive,
        )
        .expect("valid id");

        assert_eq!(values, vec!["sub", "rg", "svc"]);
    }

    #[rstest]
    #[case("", ParseError::EmptyInput)]
    #[case("/", ParseError::EmptyInput)]
    #[case(
        "/subscriptions/sub/resourceGroups",
        ParseError::UnpairedSegment { input: "/subscriptions/sub/resourceGroups".to_owned() }
    )]
    #[case(
        "/subscriptions/sub/resourceGroups/rg",
        ParseError::SegmentCount {
            input: "/subscriptions/sub/resourceGroups/rg".to_owned(),
            expected: 4,
            found: 2,
        }
    )]
    #[case(
        "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/Spring/svc",
        ParseError::UnexpectedKey { expected: "spring", found: "Spring".to_owned() }
    )]
    #[case(
        "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Web/spring/svc",
        ParseError::UnexpectedValue {
            key: "providers",
            expected: "Microsoft.AppPlatform",
            found: "Microsoft.Web".to_owned(),
        }
    )]
    #[case(
        "/subscriptions//resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc",
        ParseError::EmptyValue { key: "subscriptions".to_owned() }
    )]
    fn parse_segments_strict_errors(#[case] input: &str, #[case] expected: ParseError) {
        let err = parse_segments(input, LAYOUT, Casing::Sensitive).unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn parse_segments_insensitive_accepts_other_casing() {
        let values = parse_segments(
            "/subscriptions/sub/resourcegroups/rg/providers/microsoft.appplatform/Spring/svc",
            LAYOUT,
            Casing::Insensitive,
        )
        .expect("valid id");

        assert_eq!(values, vec!["sub", "rg", "svc"]);
    }

    #[test]
    fn generic_resource_id() {
        let input = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.App/managedEnvironments/env";
        let id = GenericResourceId::parse(input).expect("valid id");

        assert_eq!(id.subscription_id, "sub");
        assert_eq!(id.resource_group.as_deref(), Some("rg"));
        assert_eq!(id.name(), Some("env"));
        assert_eq!(id.to_string(), input);
    }

    #[rstest]
    #[case("/resourceGroups/rg")]
    #[case("/subscriptions/sub/resourceGroups/")]
    #[case("not-an-id")]
    fn generic_resource_id_invalid(#[case] input: &str) {
        assert!(GenericResourceId::parse(input).is_err());
    }
}
