use eventgate_cli::{run_cli, CliError};
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        error!("{}", e);

        let exit_code = match e {
            CliError::Configuration(_) => 1,
            CliError::Service(_) => 2,
            CliError::Request { .. } => 3,
            CliError::ServerError { .. } => 4,
            CliError::Io(_) => 5,
        };

        std::process::exit(exit_code);
    }
}
