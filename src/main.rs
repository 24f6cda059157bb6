//! testssl - generate a local root CA and a server certificate signed by it.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use testssl::generate::DEFAULT_OUTPUT_DIR;
use testssl::{SubjectConfig, generate_certificates};
use tracing_subscriber::EnvFilter;

/// Generate a root CA and a server certificate for local TLS development.
#[derive(Parser, Debug)]
#[command(name = "testssl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Domain for which you wish to generate SSL
    #[arg(long, env = "TESTSSL_DOMAIN")]
    domain: String,

    /// Directory where you want to generate SSL
    #[arg(long, env = "TESTSSL_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    dir: PathBuf,

    /// Organization (O) of both subjects
    #[arg(long)]
    organization: Option<String>,

    /// Country (C) of both subjects
    #[arg(long)]
    country: Option<String>,

    /// State or province (ST) of both subjects
    #[arg(long)]
    province: Option<String>,

    /// Locality (L) of both subjects
    #[arg(long)]
    locality: Option<String>,

    /// Street address of both subjects
    #[arg(long)]
    street_address: Option<String>,

    /// Postal code of both subjects
    #[arg(long)]
    postal_code: Option<String>,

    /// Organizational unit (OU) of both subjects
    #[arg(long)]
    organizational_unit: Option<String>,

    /// Increase verbosity
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn subject_config(&self) -> SubjectConfig {
        SubjectConfig::builder()
            .maybe_organization(self.organization.clone())
            .maybe_country(self.country.clone())
            .maybe_province(self.province.clone())
            .maybe_locality(self.locality.clone())
            .maybe_street_address(self.street_address.clone())
            .maybe_postal_code(self.postal_code.clone())
            .maybe_organizational_unit(self.organizational_unit.clone())
            .build()
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let generated = generate_certificates(&cli.domain, &cli.subject_config())
        .context("failed to generate certificates")?;
    generated
        .write_to_dir(&cli.dir)
        .with_context(|| format!("failed to write certificates to {}", cli.dir.display()))?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
