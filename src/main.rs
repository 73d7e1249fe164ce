//! dlp-audit CLI
//!
//! ```bash
//! dlp-audit extract --input-dir exports/ --output-dir reports/ --log maillog.csv
//! dlp-audit rules exports/policies.txt --output rules.csv
//! dlp-audit scan --base-url https://scanner.internal/api/footprints --footprint acme
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use secrecy::SecretString;

use dlp_audit::aggregate::MatchMode;
use dlp_audit::config::{ExtractConfig, ScanConfig};
use dlp_audit::pipeline::{self, Extractor};
use dlp_audit::policy::DEFAULT_RULE_PREFIX;
use dlp_audit::report::{ReportFormat, SheetLayout};

#[derive(Parser)]
#[command(name = "dlp-audit")]
#[command(version)]
#[command(about = "DLP whitelist policy extraction and scan export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract whitelisted entries from policy exports and count log traffic
    Extract {
        /// Directory of *.txt console exports
        #[arg(long, env = "DLP_AUDIT_INPUT_DIR", default_value = ".")]
        input_dir: PathBuf,

        /// Directory reports are written to
        #[arg(long, env = "DLP_AUDIT_OUTPUT_DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Mail log CSV with Sender and Recipients columns
        #[arg(long, env = "DLP_AUDIT_LOG")]
        log: Option<PathBuf>,

        /// Product prefix in rule names
        #[arg(long, env = "DLP_AUDIT_RULE_PREFIX", default_value = DEFAULT_RULE_PREFIX)]
        prefix: String,

        #[arg(long, short, value_enum, default_value_t = ReportFormat::Xlsx)]
        format: ReportFormat,

        #[arg(long, value_enum, default_value_t = SheetLayout::PerPolicyType)]
        layout: SheetLayout,

        /// How email entries are compared against log addresses
        #[arg(long, value_enum, env = "DLP_AUDIT_EMAIL_MATCH", default_value_t = MatchMode::Exact)]
        email_match: MatchMode,

        /// Drop entries that fail syntax checks instead of only warning
        #[arg(long)]
        drop_invalid: bool,
    },
    /// List every rule with its condition groups, actions and status
    Rules {
        /// Console export to read
        input: PathBuf,

        #[arg(long, short, default_value = "dlp_rules.csv")]
        output: PathBuf,
    },
    /// Export vulnerability-scan findings for a footprint
    Scan {
        #[arg(long, env = "SCAN_API_URL")]
        base_url: String,

        #[arg(long, env = "SCAN_API_FOOTPRINT")]
        footprint: String,

        #[arg(long, env = "SCAN_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Accept self-signed TLS certificates
        #[arg(long)]
        insecure: bool,

        #[arg(long, default_value_t = 1000)]
        max_pages: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        #[arg(long, short, default_value = "scan_findings.xlsx")]
        output: PathBuf,

        #[arg(long, short, value_enum, default_value_t = ReportFormat::Xlsx)]
        format: ReportFormat,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input_dir,
            output_dir,
            log,
            prefix,
            format,
            layout,
            email_match,
            drop_invalid,
        } => {
            let config = ExtractConfig {
                input_dir,
                output_dir,
                log_path: log,
                rule_prefix: prefix,
                format,
                layout,
                match_mode: email_match,
                drop_invalid,
            };
            let extractor = Extractor::new(config).context("Failed to set up extraction")?;
            let summary = extractor.run().context("Extraction failed")?;
            eprintln!(
                "Processed {} export(s), {} failed, {} rule(s), {} row(s)",
                summary.files_processed, summary.files_failed, summary.records, summary.rows
            );
            if summary.files_failed > 0 {
                std::process::exit(2);
            }
        }
        Commands::Rules { input, output } => {
            let count = pipeline::export_rule_listing(&input, &output)
                .with_context(|| format!("Failed to list rules in {}", input.display()))?;
            eprintln!("Listed {count} rule(s) to {}", output.display());
        }
        Commands::Scan {
            base_url,
            footprint,
            api_key,
            insecure,
            max_pages,
            timeout,
            output,
            format,
        } => {
            let config = ScanConfig {
                base_url,
                footprint,
                api_key: api_key.map(SecretString::from),
                accept_invalid_certs: insecure,
                timeout: Duration::from_secs(timeout),
                max_pages,
            };
            let export = pipeline::export_scan(&config, &output, format)
                .await
                .context("Scan export failed")?;
            eprintln!(
                "Saved {} finding(s) from {} page(s) to {}{}",
                export.rows.len(),
                export.pages,
                output.display(),
                if export.complete { "" } else { " (incomplete)" }
            );
        }
    }

    Ok(())
}
