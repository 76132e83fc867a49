use chrono::Local;
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use stress_check::config::AppConfig;
use stress_check::error::AppError;
use stress_check::telemetry;
use stress_check::workflows::diagnosis::{
    compose_report, wait_until_ready, DiagnosisError, ExportArtifact, ExportComposer,
    HttpScorerClient, ScoringResult,
};
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Scoring result JSON as returned by the scorer's diagnosis endpoint
    #[arg(long)]
    pub(crate) result: PathBuf,
    /// Directory that receives the exported document
    #[arg(long, default_value = ".")]
    pub(crate) output_dir: PathBuf,
    /// Override the configured capture scale
    #[arg(long)]
    pub(crate) scale: Option<f32>,
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let scale = args.scale.unwrap_or(config.export.scale);

    let result = read_result(&args.result)?;
    let report = compose_report(&result);
    let artifact = ExportComposer::standard(scale)
        .export(&report, Local::now().naive_local())
        .map_err(DiagnosisError::ExportFailed)?;

    let path = write_artifact(&args.output_dir, &artifact)?;
    info!(path = %path.display(), pages = artifact.pages.len(), scale, "result exported");
    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    println!("Exported {}", path.display());
    println!("  headline: {}", report.headline);
    println!("  pages:    {}", artifact.pages.len());
    for region in &artifact.pages {
        println!("    - {}", region.label());
    }
    println!("  type:     {mime}");
    println!("  bytes:    {}", artifact.bytes.len());
    Ok(())
}

pub(crate) async fn run_probe() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let client = HttpScorerClient::new(&config.scorer)?;
    let attempts = wait_until_ready(&client, config.scorer.readiness).await?;
    info!(attempts, scorer = %config.scorer.base_url, "scorer answered health check");
    println!(
        "Scorer at {} is ready (attempt {attempts})",
        config.scorer.base_url
    );
    Ok(())
}

fn read_result(path: &Path) -> Result<ScoringResult, AppError> {
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

fn write_artifact(dir: &Path, artifact: &ExportArtifact) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.bytes)?;
    Ok(path)
}
