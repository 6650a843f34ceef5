use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use volley_config::domains::logging::LogLevel;
use volley_config::{ConfigLoader, VolleyConfig};
use volley_engine::{
    collect_errors, consistency_issues, save_summary, ExecutionRequest, LoadTestWorker,
    ReportStore, TestStatus, VariableInventory,
};

mod cli;
mod inputs;
use cli::{Cli, Commands, ConfigCommands, ReportCommands, TestInputs};

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<VolleyConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                info!("Loading configuration from: {:?}", path);
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}

/// Initialize logging, letting `--log-level` override the configured level
fn init_logging(config: &mut VolleyConfig, log_level: Option<&String>) -> Result<()> {
    if let Some(level) = log_level {
        match level.parse::<LogLevel>() {
            Ok(level) => config.logging.level = level,
            Err(_) => eprintln!(
                "Invalid log level '{}', keeping '{}'",
                level, config.logging.level
            ),
        }
    }
    volley_logging::init_logging(&config.logging)
}

/// Handle `volley run`
async fn handle_run(
    config: VolleyConfig,
    inputs: &TestInputs,
    summary_path: Option<&PathBuf>,
    test_id: Option<&String>,
) -> Result<()> {
    let test_config = inputs::load_test_config(inputs)?;

    let errors = collect_errors(&test_config);
    if !errors.is_empty() {
        for e in &errors {
            println!("❌ {}", e);
        }
        return Err(anyhow::anyhow!(
            "Test configuration is invalid ({} error(s))",
            errors.len()
        ));
    }
    for issue in consistency_issues(&test_config) {
        warn!("{}", issue);
    }

    let mut request = ExecutionRequest::new(test_config);
    if let Some(id) = test_id {
        request = request.with_test_id(id.clone());
    }

    let worker = LoadTestWorker::new(config);
    let response = worker.execute(request).await;

    let formatted =
        serde_json::to_string_pretty(&response).context("Failed to format response as JSON")?;
    println!("{}", formatted);

    if let (Some(path), Some(summary)) = (summary_path, &response.summary) {
        save_summary(summary, path)
            .await
            .with_context(|| format!("Failed to write summary to {:?}", path))?;
        info!("Summary written to {:?}", path);
    }

    if response.status == TestStatus::Failed {
        return Err(anyhow::anyhow!(
            "Test {} failed: {}",
            response.test_id,
            response.error.as_deref().unwrap_or("unknown error")
        ));
    }

    Ok(())
}

/// Handle `volley validate`
fn handle_validate(inputs: &TestInputs) -> Result<()> {
    let test_config = inputs::load_test_config(inputs)?;

    let errors = collect_errors(&test_config);
    let warnings = consistency_issues(&test_config);
    let inventory = VariableInventory::from_scenario(&test_config.scenario);

    for e in &errors {
        println!("❌ {}", e);
    }
    for w in &warnings {
        println!("⚠️  {}", w);
    }
    println!("Variables:");
    println!("  user:      {}", inventory.user.join(", "));
    println!("  env:       {}", inventory.env.join(", "));
    println!("  extracted: {}", inventory.extracted.join(", "));

    if errors.is_empty() {
        println!("✅ Test inputs are valid");
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Validation failed with {} error(s)",
            errors.len()
        ))
    }
}

/// Handle `volley reports ...`
async fn handle_reports(config: &VolleyConfig, reports_cmd: &ReportCommands) -> Result<()> {
    let store = ReportStore::new(config.reports.directory.clone());

    match reports_cmd {
        ReportCommands::List => {
            let reports = store.list().await.context("Failed to list reports")?;
            if reports.is_empty() {
                println!("No reports found in: {}", store.directory().display());
            }
            for name in reports {
                println!("{}", name);
            }
        }
        ReportCommands::Show { file } => {
            let report = store
                .load(file)
                .await
                .with_context(|| format!("Failed to load report {:?}", file))?;
            let formatted =
                serde_json::to_string_pretty(&report).context("Failed to format report")?;
            println!("{}", formatted);
        }
        ReportCommands::Cleanup { max_age } => {
            let max_age = resolve_max_age(*max_age, config.reports.retention)?;
            let removed = store
                .cleanup(max_age)
                .await
                .context("Failed to clean up reports")?;
            println!(
                "✅ Removed {} report(s) older than {}",
                removed,
                humantime::format_duration(max_age)
            );
        }
    }

    Ok(())
}

fn resolve_max_age(requested: Option<Duration>, retention: Option<Duration>) -> Result<Duration> {
    requested.or(retention).ok_or_else(|| {
        anyhow::anyhow!("No --max-age given and reports.retention is not configured")
    })
}

/// Handle configuration validation
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_config) => {
            println!("✅ Configuration file is valid");
            info!("Configuration validation passed");
            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration validation failed: {}", e);
            error!("Configuration validation failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handle configuration generation
fn handle_config_generate(output: &Path, force: bool) -> Result<()> {
    info!("Generating configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, VolleyConfig::generate_sample())
        .context("Failed to write configuration file")?;

    println!("✅ Configuration generated at: {:?}", output);
    println!(
        "🔧 Validate with: volley config validate --config-file {:?}",
        output
    );

    Ok(())
}

/// Handle configuration display
fn handle_config_show(config: &VolleyConfig, format: &str) -> Result<()> {
    let output = match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(config).context("Failed to serialize to YAML")?,
        "json" => {
            serde_json::to_string_pretty(config).context("Failed to serialize to JSON")?
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown output format: {}. Valid formats: yaml, json",
                format
            ));
        }
    };
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    init_logging(&mut config, cli.log_level.as_ref())?;

    match &cli.command {
        Commands::Run {
            inputs,
            summary,
            test_id,
        } => handle_run(config, inputs, summary.as_ref(), test_id.as_ref()).await,
        Commands::Validate { inputs } => handle_validate(inputs),
        Commands::Reports { reports_cmd } => handle_reports(&config, reports_cmd).await,
        Commands::Config { config_cmd } => match config_cmd {
            ConfigCommands::Validate { config_file } => handle_config_validate(config_file),
            ConfigCommands::Generate { output, force } => handle_config_generate(output, *force),
            ConfigCommands::Show { format } => handle_config_show(&config, format),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_max_age_prefers_flag() {
        let flag = Some(Duration::from_secs(60));
        let retention = Some(Duration::from_secs(3600));
        assert_eq!(resolve_max_age(flag, retention).unwrap(), Duration::from_secs(60));
        assert_eq!(resolve_max_age(None, retention).unwrap(), Duration::from_secs(3600));
        assert!(resolve_max_age(None, None).is_err());
    }

    #[test]
    fn test_generate_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("volley.yaml");

        handle_config_generate(&output, false).unwrap();
        assert!(handle_config_generate(&output, false).is_err());
        handle_config_generate(&output, true).unwrap();

        assert!(ConfigLoader::new().from_file(&output).is_ok());
    }
}
