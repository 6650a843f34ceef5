//! Simple configuration demo
//!
//! Loads engine settings from a YAML file and prints the effective values

use std::fs;
use tempfile::TempDir;
use volley_config::{loader::ConfigLoader, ConfigError, ConfigResult};

fn main() -> ConfigResult<()> {
    println!("🚀 Simple Volley Configuration Demo");

    let temp_dir = TempDir::new().map_err(ConfigError::FileReadError)?;

    let config_path = temp_dir.path().join("volley.yaml");
    let config_content = r#"
http:
  timeout: 30
  user_agent: "Volley/demo"
  verify_ssl: true

driver:
  default_test_duration: 60
  iteration_pause: 250

reports:
  directory: "/tmp/volley-demo/results"
  retention: 604800

logging:
  level: "info"
  format: "json"
"#;

    fs::write(&config_path, config_content).map_err(ConfigError::FileReadError)?;

    let loader = ConfigLoader::new();
    let config = loader.from_file(&config_path)?;

    println!("✅ Configuration loaded successfully!");
    println!("   HTTP timeout: {}s", config.http.timeout.as_secs());
    println!(
        "   Default test duration: {}s",
        config.driver.default_test_duration.as_secs()
    );
    println!(
        "   Iteration pause: {}ms",
        config.driver.iteration_pause.as_millis()
    );
    println!("   Reports directory: {}", config.reports.directory.display());
    println!("   Logging level: {}", config.logging.level);

    Ok(())
}
