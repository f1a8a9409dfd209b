use std::{
    io::{Sink, sink},
    path::PathBuf,
};

use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{
        MakeWriter,
        writer::{EitherWriter, MakeWriterExt as _},
    },
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initializes `tracing` logging with options from the environment variable
/// given in the `env` parameter, e.g. `SPRINGCLOUD_PROVIDER_LOG`.
/// If the variable is not set, the maximum log level is set to INFO.
///
/// Log output can be copied to a file by setting `{env}_DIRECTORY` to a directory path.
/// This file will be rotated regularly. If the appender can not be created, logging
/// continues on stdout only and the failure is logged.
pub fn initialize_logging(env: &str, app_name: &str) {
    let filter = EnvFilter::try_from_env(env)
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let file_appender_directory = std::env::var_os(format!("{env}_DIRECTORY")).map(PathBuf::from);
    let file_appender = file_appender_directory.as_deref().map(|log_dir| {
        RollingFileAppender::builder()
            .filename_suffix(format!("{app_name}.log"))
            .max_log_files(6)
            .build(log_dir)
    });
    let (file_appender, appender_error) = match file_appender {
        Some(Ok(appender)) => (Some(appender), None),
        Some(Err(err)) => (None, Some(err)),
        None => (None, None),
    };

    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout.and(OptionalMakeWriter::from(file_appender)));
    // A second initialization (e.g. in tests) keeps the first subscriber
    let _ = Registry::default().with(filter).with(fmt).try_init();

    // need to delay logging until after tracing is initialized
    match (file_appender_directory, appender_error) {
        (Some(dir), Some(err)) => {
            tracing::warn!(%err, directory = %dir.display(), "failed to initialize file logging");
        }
        (Some(dir), None) => {
            tracing::info!(directory = %dir.display(), "file logging enabled");
        }
        (None, _) => tracing::debug!("file logging disabled, because no log directory set"),
    }
}

/// Like [`EitherWriter`] but implements [`MakeWriter`] instead of [`std::io::Write`].
/// For selecting writers depending on dynamic configuration.
enum EitherMakeWriter<A, B> {
    A(A),
    B(B),
}

impl<'a, A, B> MakeWriter<'a> for EitherMakeWriter<A, B>
where
    A: MakeWriter<'a>,
    B: MakeWriter<'a>,
{
    type Writer = EitherWriter<A::Writer, B::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        match self {
            Self::A(a) => EitherWriter::A(a.make_writer()),
            Self::B(b) => EitherWriter::B(b.make_writer()),
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        match self {
            Self::A(a) => EitherWriter::A(a.make_writer_for(meta)),
            Self::B(b) => EitherWriter::B(b.make_writer_for(meta)),
        }
    }
}

type OptionalMakeWriter<T> = EitherMakeWriter<T, fn() -> Sink>;

impl<T> From<Option<T>> for OptionalMakeWriter<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(t) => Self::A(t),
            None => Self::B(sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::{debug, error, info};

    // Mostly a sanity check, run with `NOT_SET=debug` and `--nocapture` to see all messages.
    #[test]
    fn default_tracing_level_is_info() {
        super::initialize_logging("NOT_SET", "test");

        error!("ERROR level messages should be seen.");
        info!("INFO level messages should also be seen by default.");
        debug!("DEBUG level messages should be seen only if you set the NOT_SET env var.");
    }
}
