use hubmigrate::cli::{self, commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const EXIT_FATAL: i32 = 2;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::run();

    let code = match commands::execute(args).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {:#}", error);
            EXIT_FATAL
        }
    };

    std::process::exit(code)
}
