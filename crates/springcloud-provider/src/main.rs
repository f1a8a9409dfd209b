use clap::Parser;
use snafu::{ResultExt, Snafu};
use springcloud_provider::{
    cli::{self, APP_NAME, Cli},
    logging::initialize_logging,
};

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("command failed"))]
    Run { source: cli::Error },
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    initialize_logging("SPRINGCLOUD_PROVIDER_LOG", APP_NAME);

    cli.run().await.context(RunSnafu)
}
