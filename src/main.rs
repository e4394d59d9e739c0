use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use openmrs::CategoryKey;
use reports_core::config::settle_delay_from_env_value;
use reports_core::{
    CategoryProvider, ClientConfig, Collaborators, FormConfig, ReportCatalogue, RestClient,
    RunReportForm, SubmissionPhase, TokioClock, TracingNotifier, ValidityReport,
};

const DEFAULT_BASE_URL: &str = "http://localhost:8080/openmrs";

#[derive(Parser)]
#[command(name = "reports-run")]
#[command(about = "Run OpenMRS reports from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List report definitions
    Reports {
        /// Only reports in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// List report categories with counts
    Categories,
    /// Show the report category module metadata
    Metadata,
    /// List render designs for a report
    Designs {
        /// Report definition UUID
        report: String,
    },
    /// List locations
    Locations,
    /// Run a report and wait for it to settle
    Run {
        /// Report definition UUID
        #[arg(long)]
        report: String,
        /// Render design UUID or name
        #[arg(long)]
        design: String,
        /// Category to select the report from
        #[arg(long)]
        category: Option<String>,
        /// Report parameter as name=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

/// Main entry point for the reports CLI
///
/// # Environment Variables
/// - `OPENMRS_BASE_URL`: OpenMRS base URL (default: "http://localhost:8080/openmrs")
/// - `OPENMRS_USERNAME` / `OPENMRS_PASSWORD`: basic-auth credentials (optional)
/// - `REPORTS_CONFIG`: path to a YAML form configuration (optional)
/// - `REPORTS_SETTLE_DELAY_MS`: settle delay override in milliseconds (optional)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reports_run=info".parse()?)
                .add_directive("reports_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'reports-run --help' for commands");
        return Ok(());
    };

    let form_config = load_form_config()?;
    let client = Arc::new(RestClient::new(load_client_config()?)?);
    tracing::info!("++ Using OpenMRS at {}", client.config().base_url());

    match command {
        Commands::Reports { category } => {
            let mut form = load_form(form_config, &client).await?;
            if let Some(category) = category {
                let key = resolve_category(form.config(), &category)?;
                form.select_category(Some(key));
            }
            let reports = form.visible_reports();
            if reports.is_empty() {
                println!("No reports found.");
            }
            for report in reports {
                println!("{}  {}", report.uuid, report.name);
                for parameter in &report.parameters {
                    println!(
                        "    {} ({}){}",
                        parameter.display_label(),
                        parameter.parameter_type,
                        if parameter.required { " required" } else { "" }
                    );
                }
            }
        }
        Commands::Categories => {
            let form = load_form(form_config, &client).await?;
            let options = form.category_options();
            if options.is_empty() {
                println!("Report categories are not available on this server.");
            }
            for option in options {
                println!("{:<14} {:<14} {}", option.key.as_str(), option.label, option.count);
            }
        }
        Commands::Metadata => match client.fetch_metadata().await? {
            Some(metadata) => {
                println!("Module: {} {}", metadata.module_name, metadata.module_version);
                println!("Total reports: {}", metadata.total_reports);
                for (key, count) in &metadata.category_counts {
                    println!("  {key}: {count}");
                }
            }
            None => println!("Report categories are not available on this server."),
        },
        Commands::Designs { report } => {
            let designs = client.fetch_report_designs(&report).await?;
            if designs.is_empty() {
                println!("No render designs for report {report}.");
            }
            for design in designs {
                println!("{}  {}", design.uuid, design.name);
            }
        }
        Commands::Locations => {
            for location in client.fetch_locations().await? {
                println!("{}  {}", location.uuid, location.display);
            }
        }
        Commands::Run {
            report,
            design,
            category,
            params,
        } => {
            let mut form = load_form(form_config, &client).await?;
            run_report(&mut form, &report, &design, category.as_deref(), &params).await?;
        }
    }

    Ok(())
}

fn load_client_config() -> anyhow::Result<ClientConfig> {
    let base_url = std::env::var("OPENMRS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let username = std::env::var("OPENMRS_USERNAME").ok();
    let password = std::env::var("OPENMRS_PASSWORD").ok();

    Ok(ClientConfig::new(base_url, username, password)?)
}

fn load_form_config() -> anyhow::Result<FormConfig> {
    let mut config = match std::env::var("REPORTS_CONFIG").ok() {
        Some(path) => {
            let path = PathBuf::from(path);
            FormConfig::load(&path)
                .with_context(|| format!("loading form configuration from {}", path.display()))?
        }
        None => FormConfig::default(),
    };

    if let Some(delay) = settle_delay_from_env_value(std::env::var("REPORTS_SETTLE_DELAY_MS").ok())? {
        config = config.with_settle_delay(delay);
    }

    Ok(config)
}

async fn load_form(config: FormConfig, client: &Arc<RestClient>) -> anyhow::Result<RunReportForm> {
    let collaborators = Collaborators {
        catalogue: client.clone(),
        categories: client.clone(),
        transport: client.clone(),
        notifier: Arc::new(TracingNotifier),
        clock: Arc::new(TokioClock),
    };

    RunReportForm::load(config, collaborators)
        .await
        .context("loading report definitions")
}

fn resolve_category(config: &FormConfig, key: &str) -> anyhow::Result<CategoryKey> {
    match config.category(key) {
        Some(option) => Ok(option.key.clone()),
        None => {
            let known: Vec<_> = config.categories().iter().map(|o| o.key.as_str()).collect();
            bail!("unknown category '{key}' (expected one of: {})", known.join(", "))
        }
    }
}

async fn run_report(
    form: &mut RunReportForm,
    report: &str,
    design: &str,
    category: Option<&str>,
    params: &[(String, String)],
) -> anyhow::Result<()> {
    if let Some(category) = category {
        let key = resolve_category(form.config(), category)?;
        form.select_category(Some(key));
    }

    form.select_report(report).await;
    if form.selection().current_report().is_none() {
        bail!("report '{report}' is not available in the selected category");
    }

    let render_mode = form
        .report_designs()
        .iter()
        .find(|d| d.uuid == design || d.name.eq_ignore_ascii_case(design))
        .map(|d| d.uuid.clone())
        .with_context(|| format!("report '{report}' has no render design '{design}'"))?;
    form.select_render_mode(&render_mode);

    for (name, value) in params {
        form.set_parameter_from_input(name, value)?;
    }

    if !form.is_form_valid() {
        bail!("cannot run report: {}", describe_invalid(&form.validity()));
    }

    let mut phases = form.subscribe();
    form.submit(Box::new(|| tracing::info!("report run complete")))?;

    let outcome = phases
        .wait_for(|p| matches!(p, SubmissionPhase::Succeeded | SubmissionPhase::Failed { .. }))
        .await?
        .clone();

    match outcome {
        SubmissionPhase::Failed { message } => {
            bail!("report run failed: {}", message.as_deref().unwrap_or("no message from server"))
        }
        _ => {
            println!("Report {report} queued.");
            Ok(())
        }
    }
}

fn describe_invalid(validity: &ValidityReport) -> String {
    let mut reasons = Vec::new();
    if !validity.report_selected {
        reasons.push("no report selected".to_string());
    }
    if !validity.unsupported_types.is_empty() {
        let types: Vec<_> = validity.unsupported_types.iter().map(|t| t.as_str()).collect();
        reasons.push(format!("unsupported parameter types: {}", types.join(", ")));
    }
    if !validity.missing_required.is_empty() {
        reasons.push(format!(
            "missing required parameters: {}",
            validity.missing_required.join(", ")
        ));
    }
    if !validity.render_mode_present {
        reasons.push("no render design selected".to_string());
    }
    reasons.join("; ")
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}
