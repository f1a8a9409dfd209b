//! Utility functions for writing data in the YAML file format
use std::io::Write;

use snafu::{ResultExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

/// Represents every error which can be encountered during YAML serialization.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to serialize YAML"))]
    SerializeYaml { source: serde_yaml::Error },

    #[snafu(display("failed to write YAML document header"))]
    WriteDocumentHeader { source: std::io::Error },

    #[snafu(display("failed to write YAML to stdout"))]
    WriteToStdout { source: std::io::Error },

    #[snafu(display("failed to parse bytes as valid UTF-8 string"))]
    ParseUtf8Bytes { source: std::string::FromUtf8Error },
}

/// Provides configurable options during YAML serialization.
///
/// The default writes an explicit document (`---`) without a title comment.
#[derive(Debug, Default)]
pub struct SerializeOptions {
    /// Written as a `# ...` comment line in front of the document.
    pub title: Option<String>,

    /// Omits the leading triple dashes (`---`).
    pub implicit_document: bool,
}

impl SerializeOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// Serializes the given data structure and writes it to a [`Writer`](Write).
pub fn serialize<T, W>(value: &T, mut writer: W, options: &SerializeOptions) -> Result<()>
where
    T: serde::Serialize,
    W: Write,
{
    if !options.implicit_document {
        writer
            .write_all(b"---\n")
            .context(WriteDocumentHeaderSnafu)?;
    }

    if let Some(title) = &options.title {
        writeln!(writer, "# {title}").context(WriteDocumentHeaderSnafu)?;
    }

    serde_yaml::to_writer(writer, value).context(SerializeYamlSnafu)
}

/// Serializes any [serializable](serde::Serialize) type as a YAML document.
pub trait YamlDocument: Sized + serde::Serialize {
    /// Returns the YAML document of `self` as a [`String`].
    fn to_yaml_document(&self, options: &SerializeOptions) -> Result<String> {
        let mut buffer = Vec::new();
        serialize(self, &mut buffer, options)?;
        String::from_utf8(buffer).context(ParseUtf8BytesSnafu)
    }

    /// Prints the YAML document of `self` to [stdout](std::io::stdout).
    fn print_yaml_document(&self, options: &SerializeOptions) -> Result<()> {
        let document = self.to_yaml_document(options)?;
        std::io::stdout()
            .write_all(document.as_bytes())
            .context(WriteToStdoutSnafu)
    }
}

impl<T> YamlDocument for T where T: serde::Serialize {}
