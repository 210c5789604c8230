// Emirates ID scanner command line

use clap::{Args, Parser, Subcommand};
use eidscan::{
    models::{FieldName, ScanReport, Side},
    BatchEntry, BatchItem, IdCardError, IdCardValidator, ScannerConfig,
};
use log::{error, info};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "eidscan", version, about = "Extract and validate Emirates ID card fields")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, env = "EIDSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// OCR languages, e.g. "eng+ara"
    #[arg(long, global = true, env = "EIDSCAN_OCR_LANG")]
    lang: Option<String>,

    /// Directory holding Tesseract language data
    #[arg(long, global = true, env = "TESSDATA_PREFIX")]
    tessdata: Option<PathBuf>,

    /// Print JSON instead of a report
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract fields from recognized text
    Extract(TextArgs),
    /// Extract and validate fields from recognized text
    Validate(TextArgs),
    /// Run OCR on a card image, then extract and validate
    Scan(ScanArgs),
    /// Scan every entry of a JSON manifest of {"image", "side"} objects
    Batch {
        manifest: PathBuf,
    },
}

#[derive(Args)]
struct TextArgs {
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    text: Option<String>,
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long, default_value = "front")]
    side: Side,
}

#[derive(Args)]
struct ScanArgs {
    /// Image file
    #[arg(conflicts_with = "base64", required_unless_present = "base64")]
    image: Option<PathBuf>,
    /// File holding base64 image data or a data URL
    #[arg(long)]
    base64: Option<PathBuf>,
    #[arg(long, default_value = "front")]
    side: Side,
    /// Skip validation and only report extracted fields
    #[arg(long)]
    extract_only: bool,
}

fn print_report(report: &ScanReport) {
    println!("\n===============================================");
    println!("      EMIRATES ID {} SIDE REPORT", report.side.as_str().to_uppercase());
    println!("===============================================\n");

    println!("EXTRACTED FIELDS:");
    if report.data.is_empty() {
        println!("  (none)");
    }
    for name in FieldName::ALL {
        if let Some(value) = report.data.get(name) {
            println!("  {}: {}", name, value);
        }
    }
    println!("  OCR Confidence: {:.2}", report.ocr_confidence);

    let Some(outcome) = &report.validation else {
        return;
    };

    println!("\nVALIDATION:");
    println!("  Emirates ID: {}", if outcome.is_emirates_id { "YES" } else { "NO" });
    println!("  Confidence: {:.2}", outcome.confidence);

    if !outcome.errors.is_empty() {
        println!("\nERRORS:");
        for message in &outcome.errors {
            println!("  - {}", message);
        }
    }
    if !outcome.warnings.is_empty() {
        println!("\nWARNINGS:");
        for message in &outcome.warnings {
            println!("  - {}", message);
        }
    }

    println!(
        "\nEmirates ID validation result: {}",
        if outcome.is_valid { "VALID" } else { "INVALID" }
    );
}

fn emit(report: &ScanReport, as_json: bool) -> Result<(), IdCardError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_report(report);
    }
    Ok(())
}

fn read_text(args: &TextArgs) -> Result<String, IdCardError> {
    match (&args.text, &args.file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => Ok(fs::read_to_string(path)?),
        (None, None) => Err(IdCardError::Config("Either --text or --file is required".to_string())),
    }
}

fn load_config(cli: &Cli) -> Result<ScannerConfig, IdCardError> {
    let mut config = match &cli.config {
        Some(path) => ScannerConfig::load(path)?,
        None => ScannerConfig::default(),
    };
    if let Some(lang) = &cli.lang {
        config.ocr.languages = lang.clone();
    }
    if let Some(dir) = &cli.tessdata {
        config.ocr.tessdata_dir = Some(dir.clone());
    }
    Ok(config)
}

fn run_batch(validator: &IdCardValidator, manifest: &Path, as_json: bool) -> Result<(), IdCardError> {
    let items: Vec<BatchItem> = serde_json::from_str(&fs::read_to_string(manifest)?)?;
    info!("Processing batch of {} image(s)", items.len());
    let entries = validator.process_batch(&items);

    if as_json {
        let results: Vec<_> = entries.iter().map(entry_json).collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "results": results }))?);
        return Ok(());
    }

    for entry in &entries {
        match &entry.result {
            Ok(report) => {
                println!("\n[{}] {} side", entry.index, entry.side);
                print_report(report);
            }
            Err(err) => println!("\n[{}] {} side FAILED: {}", entry.index, entry.side, err),
        }
    }
    Ok(())
}

fn entry_json(entry: &BatchEntry) -> serde_json::Value {
    match &entry.result {
        Ok(report) => json!({
            "index": entry.index,
            "success": true,
            "side": entry.side,
            "data": report.data,
            "validation": report.validation,
        }),
        Err(err) => json!({
            "index": entry.index,
            "success": false,
            "side": entry.side,
            "error": err.to_string(),
        }),
    }
}

fn run(cli: Cli) -> Result<(), IdCardError> {
    let config = load_config(&cli)?;
    let validator = IdCardValidator::from_config(&config);

    match &cli.command {
        Command::Extract(args) => {
            let text = read_text(args)?;
            let mut report = validator.process_text(&text, args.side);
            report.validation = None;
            emit(&report, cli.json)
        }
        Command::Validate(args) => {
            let text = read_text(args)?;
            emit(&validator.process_text(&text, args.side), cli.json)
        }
        Command::Scan(args) => {
            let report = match (&args.image, &args.base64) {
                (_, Some(path)) => {
                    let encoded = fs::read_to_string(path)?;
                    if args.extract_only {
                        validator.extract_image(&encoded, args.side)?
                    } else {
                        validator.process_image(&encoded, args.side)?
                    }
                }
                (Some(path), None) => {
                    let mut report = validator.process_image_file(path, args.side)?;
                    if args.extract_only {
                        report.validation = None;
                    }
                    report
                }
                (None, None) => {
                    return Err(IdCardError::Config("An image path or --base64 file is required".to_string()))
                }
            };
            emit(&report, cli.json)
        }
        Command::Batch { manifest } => run_batch(&validator, manifest, cli.json),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{}", err);
        let code = match err {
            IdCardError::OcrUnavailable(_) => 3,
            ref e if e.is_upstream() => 2,
            _ => 1,
        };
        process::exit(code);
    }
}
