//! Checks that can be performed on configuration before any request is sent to Azure.
//!
//! All checks of one resource run to completion, so that the user sees every violation at once
//! instead of fixing them one by one. See [`Validator`].

use std::{fmt::Display, ops::RangeInclusive, str::FromStr, sync::LazyLock};

use regex::Regex;
use snafu::{IntoError, Snafu};
use springcloud_shared::id::{GenericResourceId, ParseError};

const SERVICE_NAME_FMT: &str = "[a-z][a-z0-9-]{2,30}[a-z0-9]";
const SERVICE_NAME_ERROR_MSG: &str = "a Spring Cloud service name must be between 4 and 32 characters long, contain only lowercase letters, numbers and hyphens, start with a letter and end with a letter or number";

static SERVICE_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{SERVICE_NAME_FMT}$")).expect("failed to compile service name regex")
});

/// The prefixes a git repository URI of the config server can start with.
pub const GIT_URI_PREFIXES: &[&str] = &["http://", "https://", "git@", "ssh://"];

type Result<T = (), E = Errors> = std::result::Result<T, E>;

/// A collection of errors discovered during validation.
#[derive(Debug, PartialEq, Eq)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.0.iter()
    }
}

impl Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            let prefix = match i {
                0 => "",
                _ => ", ",
            };
            write!(f, "{prefix}{error}")?;
        }
        Ok(())
    }
}
impl std::error::Error for Errors {}

/// A single validation error.
#[derive(Debug, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{field}: {source}"))]
    Regex { field: String, source: RegexError },

    #[snafu(display("{field}: value cannot be empty"))]
    Empty { field: String },

    #[snafu(display("{field}: {value} is not within {min}..={max}"))]
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    #[snafu(display("{field}: expected at least {min} items but found {found}"))]
    TooFewItems {
        field: String,
        min: usize,
        found: usize,
    },

    #[snafu(display("{field}: {value:?} must start with one of {prefixes:?}"))]
    InvalidPrefix {
        field: String,
        value: String,
        prefixes: &'static [&'static str],
    },

    #[snafu(display("{field}: invalid resource id"))]
    InvalidId { field: String, source: ParseError },

    #[snafu(display("{first} conflicts with {second}"))]
    Conflict { first: String, second: String },

    #[snafu(display("exactly one of {fields:?} must be set but {found} are set"))]
    ExactlyOneOf { fields: Vec<String>, found: usize },

    #[snafu(display("{field} requires {required} to be set"))]
    RequiredWith { field: String, required: String },

    #[snafu(display("{field}: name {name:?} is used more than once"))]
    DuplicateName { field: String, name: String },

    #[snafu(display("{field}: {message}"))]
    Unsupported { field: String, message: String },
}

#[derive(Debug, PartialEq, Eq)]
pub struct RegexError {
    /// The primary error message.
    msg: &'static str,

    /// The regex that the input must match.
    regex: &'static str,
}

impl Display for RegexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { msg, regex } = self;
        write!(f, "{msg} (regex used for validation is {regex:?})")
    }
}

impl std::error::Error for RegexError {}

/// Collects every violation instead of stopping at the first one.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<Error>,
}

impl Validator {
    pub fn push(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub fn check(&mut self, result: Result<(), Error>) {
        if let Err(error) = result {
            self.push(error);
        }
    }

    pub fn finish(self) -> Result {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Errors(self.errors))
        }
    }
}

/// Returns [`Ok`] if `name` is a valid Spring Cloud service name.
pub fn service_name(field: &str, name: &str) -> Result<(), Error> {
    if SERVICE_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(RegexSnafu { field }.into_error(RegexError {
            msg: SERVICE_NAME_ERROR_MSG,
            regex: SERVICE_NAME_FMT,
        }))
    }
}

pub fn not_empty(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return EmptySnafu { field }.fail();
    }
    Ok(())
}

pub fn in_range<T>(field: &str, value: T, range: RangeInclusive<T>) -> Result<(), Error>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        return Ok(());
    }
    OutOfRangeSnafu {
        field,
        value: value.to_string(),
        min: range.start().to_string(),
        max: range.end().to_string(),
    }
    .fail()
}

pub fn min_items(field: &str, found: usize, min: usize) -> Result<(), Error> {
    if found < min {
        return TooFewItemsSnafu { field, min, found }.fail();
    }
    Ok(())
}

pub fn has_prefix(field: &str, value: &str, prefixes: &'static [&'static str]) -> Result<(), Error> {
    if prefixes.iter().any(|prefix| value.starts_with(prefix)) {
        return Ok(());
    }
    InvalidPrefixSnafu {
        field,
        value,
        prefixes,
    }
    .fail()
}

/// Returns [`Ok`] if `value` has the general shape of an Azure resource id.
pub fn resource_id(field: &str, value: &str) -> Result<(), Error> {
    GenericResourceId::parse(value)
        .map(|_| ())
        .map_err(|source| Error::InvalidId {
            field: field.to_owned(),
            source,
        })
}

/// Returns [`Ok`] if `value` parses as the typed identifier `T`.
pub fn typed_id<T>(field: &str, value: &str) -> Result<(), Error>
where
    T: FromStr<Err = ParseError>,
{
    value
        .parse::<T>()
        .map(|_| ())
        .map_err(|source| Error::InvalidId {
            field: field.to_owned(),
            source,
        })
}

/// Fails if both fields are set.
pub fn conflicts(first: (&str, bool), second: (&str, bool)) -> Result<(), Error> {
    if first.1 && second.1 {
        return ConflictSnafu {
            first: first.0,
            second: second.0,
        }
        .fail();
    }
    Ok(())
}

/// Fails unless exactly one of the fields is set.
pub fn exactly_one_of(fields: &[(&str, bool)]) -> Result<(), Error> {
    let found = fields.iter().filter(|(_, set)| *set).count();
    if found == 1 {
        return Ok(());
    }
    ExactlyOneOfSnafu {
        fields: fields
            .iter()
            .map(|(name, _)| (*name).to_owned())
            .collect::<Vec<_>>(),
        found,
    }
    .fail()
}

/// Fails if `field` is set without `required`.
pub fn required_with(field: (&str, bool), required: (&str, bool)) -> Result<(), Error> {
    if field.1 && !required.1 {
        return RequiredWithSnafu {
            field: field.0,
            required: required.0,
        }
        .fail();
    }
    Ok(())
}

/// Returns the first name which is used more than once.
pub fn unique_names<'a>(field: &str, names: impl IntoIterator<Item = &'a str>) -> Result<(), Error> {
    let mut seen = std::collections::BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return DuplicateNameSnafu { field, name }.fail();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("spring")]
    #[case("abcd")]
    #[case("my-service-01")]
    #[case("a2345678901234567890123456789012")]
    fn service_name_valid(#[case] name: &str) {
        assert_eq!(service_name("name", name), Ok(()));
    }

    #[rstest]
    #[case("abc")]
    #[case("1spring")]
    #[case("spring-")]
    #[case("Spring")]
    #[case("my_service")]
    #[case("a23456789012345678901234567890123")]
    fn service_name_invalid(#[case] name: &str) {
        assert!(matches!(
            service_name("name", name),
            Err(Error::Regex { .. })
        ));
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(100.0, true)]
    #[case(10.5, true)]
    #[case(-0.1, false)]
    #[case(100.1, false)]
    fn sample_rate_range(#[case] value: f64, #[case] ok: bool) {
        assert_eq!(in_range("trace.sample_rate", value, 0.0..=100.0).is_ok(), ok);
    }

    #[rstest]
    #[case("https://github.com/org/repo", true)]
    #[case("http://github.com/org/repo", true)]
    #[case("git@github.com:org/repo.git", true)]
    #[case("ssh://git@github.com/org/repo", true)]
    #[case("ftp://github.com/org/repo", false)]
    #[case("", false)]
    fn git_uri_prefixes(#[case] uri: &str, #[case] ok: bool) {
        assert_eq!(has_prefix("uri", uri, GIT_URI_PREFIXES).is_ok(), ok);
    }

    #[rstest]
    #[case(&[("branch", true), ("commit", false), ("git_tag", false)], true)]
    #[case(&[("branch", false), ("commit", false), ("git_tag", false)], false)]
    #[case(&[("branch", true), ("commit", true), ("git_tag", false)], false)]
    fn exactly_one(#[case] fields: &[(&str, bool)], #[case] ok: bool) {
        assert_eq!(exactly_one_of(fields).is_ok(), ok);
    }

    #[test]
    fn validator_collects_every_error() {
        let mut validator = Validator::default();
        validator.check(not_empty("resource_group_name", ""));
        validator.check(min_items("network.cidr_ranges", 2, 3));
        validator.check(not_empty("location", "westeurope"));

        let errors = validator.finish().unwrap_err();
        assert_eq!(errors.iter().count(), 2);
        assert_eq!(
            errors.to_string(),
            "resource_group_name: value cannot be empty, network.cidr_ranges: expected at least 3 items but found 2"
        );
    }

    #[test]
    fn duplicate_names() {
        assert!(unique_names("repository", ["a", "b"]).is_ok());
        assert_eq!(
            unique_names("repository", ["a", "b", "a"]),
            Err(Error::DuplicateName {
                field: "repository".to_owned(),
                name: "a".to_owned()
            })
        );
    }
}
