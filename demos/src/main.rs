//! Minimal wiring example: declare a schema, load the layered config and
//! print the redacted result with origins.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use lamina::schema::SchemaField;
use lamina::{ConfigEngine, ConfigPlugin, EngineSettings, FieldValidator, Schema};
use lamina_plugin_file::{FilePlugin, FilePluginOptions};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "lamina-demo", about = "Load and print a demo configuration")]
struct Cli {
    /// Directory to resolve config files from
    #[arg(long, default_value = ".")]
    base_path: PathBuf,

    /// Extra glob patterns read through the file plugin
    #[arg(long)]
    pattern: Vec<String>,

    /// Disable permissive coercion of raw values
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let schema = Schema::builder()
        .field(
            "host",
            SchemaField::new(FieldValidator::string().default_value("127.0.0.1"))
                .description("Interface the service binds to"),
        )
        .field(
            "port",
            SchemaField::new(
                FieldValidator::integer()
                    .min(1.0)
                    .max(65535.0)
                    .default_value(8080),
            )
            .description("TCP port the service listens on"),
        )
        .field(
            "log_level",
            FieldValidator::string()
                .one_of(["trace", "debug", "info", "warn", "error"])
                .default_value("info"),
        )
        .field(
            "api_key",
            SchemaField::new(FieldValidator::string().optional())
                .description("Upstream API key")
                .sensitive()
                .alternate_key("SERVICE_API_KEY"),
        )
        .build();

    let settings = EngineSettings {
        base_path: cli.base_path,
        strict: cli.strict,
        print_config: true,
        ..Default::default()
    };

    let mut plugins: Vec<Box<dyn ConfigPlugin>> = Vec::new();
    if !cli.pattern.is_empty() {
        plugins.push(Box::new(FilePlugin::new(FilePluginOptions {
            patterns: cli.pattern.clone(),
            reload_interval: None,
        })?));
    }

    let engine = ConfigEngine::new(schema, settings, plugins)?;
    engine.load().await?;

    let config = engine.get_config()?;
    println!(
        "\nservice would bind {}:{}",
        config.get_str("host").unwrap_or_default(),
        config.get_i64("port").unwrap_or_default()
    );

    Ok(())
}
