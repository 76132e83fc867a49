use crate::export::{run_export, run_probe, ExportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use stress_check::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Stress Check",
    about = "Run the occupational stress check service or export stored results",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Render a stored scoring result into a printable document
    Export(ExportArgs),
    /// Wait for the scoring service to answer its health check
    Probe,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Export(args) => run_export(args),
        Command::Probe => run_probe().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["stress-check"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn export_requires_a_result_file() {
        assert!(Cli::try_parse_from(["stress-check", "export"]).is_err());

        let cli = Cli::try_parse_from([
            "stress-check",
            "export",
            "--result",
            "result.json",
            "--scale",
            "1.5",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Export(args)) => {
                assert_eq!(args.result.to_str(), Some("result.json"));
                assert_eq!(args.output_dir.to_str(), Some("."));
                assert_eq!(args.scale, Some(1.5));
            }
            other => panic!("expected export, got {other:?}"),
        }
    }
}
