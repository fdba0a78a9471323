use color_eyre::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lightbox::cli::{self, parse_args};

fn main() -> Result<()> {
    color_eyre::install()?;

    // Logs go to stderr so command output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lightbox=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!("Run 'lightbox --help' for usage.");
            std::process::exit(2);
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(cli::run(command))
}
