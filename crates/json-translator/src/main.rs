//! translate-json - translate every string in a JSON file.

use anyhow::{Context, Result};
use clap::Parser;
use json_translator::{
    count_translatable, translate_value, HttpTranslator, TranslateOptions, TranslatorConfig,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "translate-json", version, about = "Translate string fields of a JSON document")]
struct Args {
    /// JSON file to translate
    input: PathBuf,

    /// Target language code (e.g. "ru", "uz", "en")
    #[arg(short, long)]
    target: String,

    /// Source language code; overrides TRANSLATOR__SOURCE_LANGUAGE
    #[arg(short, long)]
    source: Option<String>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Object key to copy untranslated (repeatable)
    #[arg(long = "skip-key")]
    skip_keys: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TranslatorConfig::load().context("Failed to load configuration")?;

    init_logging(&config.log_level);

    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.input.display()))?;

    let mut translator = HttpTranslator::new(&config.api_key, &config.base_url, config.timeout)
        .context("Failed to create translation client")?
        .with_max_retries(config.max_retries);
    if let Some(source) = args.source.or(config.source_language) {
        translator = translator.with_source(source);
    }

    let options = TranslateOptions {
        skip_keys: args.skip_keys.into_iter().collect(),
    };

    info!(
        "Translating {} fields from {} into {}",
        count_translatable(&document, &options),
        args.input.display(),
        args.target
    );

    let translated = translate_value(&translator, &document, &args.target, &options)
        .await
        .context("Translation failed")?;

    let rendered = serde_json::to_string_pretty(&translated)?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, rendered + "\n")
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Logs go to stderr so stdout stays clean JSON.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
