//! Command-line harness for Screen Translator.
//!
//! Plays the part of the UI: loads settings and the usage ledger, triggers
//! the pipeline once for the configured region, waits for the outcome and
//! prints it.
//!
//! Usage:
//!   snip-translate                              Translate the configured region
//!   snip-translate --region 100,200,640,120     Set (and save) the region first
//!   snip-translate --vision                     Send the image to a vision model this run
//!   snip-translate --stats                      Print token usage and exit

use clap::Parser;
use screen_translator_lib::config::{default_config_path, default_ledger_path};
use screen_translator_lib::usage::TokenCount;
use screen_translator_lib::{
    CaptureRegion, ConfigStore, PipelineEvent, PipelineScheduler, ScreenCapture, TesseractOcr,
    UsageAccountant,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "snip-translate",
    about = "Capture a screen region and translate its text"
)]
struct Cli {
    /// Settings file (defaults to the platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Token usage ledger (defaults to the platform config dir).
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Region as x,y,width,height in logical pixels; saved to the settings.
    #[arg(long, value_parser = parse_region)]
    region: Option<CaptureRegion>,

    /// Send the image to a vision model for this run.
    #[arg(long, conflicts_with = "ocr")]
    vision: bool,

    /// Use local OCR for this run.
    #[arg(long)]
    ocr: bool,

    /// Print session/today/total token usage and exit.
    #[arg(long)]
    stats: bool,
}

fn parse_region(raw: &str) -> Result<CaptureRegion, String> {
    let parts: Vec<i32> = raw
        .split(',')
        .map(|p| p.trim().parse::<i32>().map_err(|e| format!("{:?}: {}", p, e)))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, w, h] => Ok(CaptureRegion::new(*x, *y, *w, *h)),
        _ => Err(format!("expected x,y,width,height, got {} values", parts.len())),
    }
}

fn print_count(label: &str, count: TokenCount) {
    println!(
        "{:<8} input: {:>10}  output: {:>10}",
        label, count.input, count.output
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Ok(cwd) = std::env::current_dir() {
        screen_translator_lib::load_env(&cwd);
    }
    screen_translator_lib::init_logging();

    let cli = Cli::parse();
    let store = ConfigStore::load(cli.config.unwrap_or_else(default_config_path));
    log::info!("[STARTUP] Settings file: {}", store.path().display());
    let usage = Arc::new(UsageAccountant::load(
        cli.ledger.unwrap_or_else(default_ledger_path),
    ));

    if cli.stats {
        let stats = usage.get_stats();
        print_count("session", stats.session);
        print_count("today", stats.today);
        print_count("total", stats.total);
        return Ok(());
    }

    if let Some(region) = cli.region {
        store.update(|c| c.region = region.to_config())?;
        log::info!("[STARTUP] Region updated: {:?}", region);
    }

    // Per-run overrides stay out of the saved settings.
    let mut config = store.snapshot();
    if cli.vision {
        config.advanced_mode = true;
    } else if cli.ocr {
        config.advanced_mode = false;
    }
    let lang = config.language;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let (scheduler, mut events) = PipelineScheduler::new(
        runtime.handle().clone(),
        Arc::new(ScreenCapture::new()),
        Arc::new(TesseractOcr::new()),
        usage,
    );

    if let Err(rejected) = scheduler.trigger(config.region(), config) {
        eprintln!("{}", rejected.user_message(lang));
        std::process::exit(1);
    }

    match runtime.block_on(events.recv()) {
        Some(PipelineEvent::Succeeded { text, usage }) => {
            println!("{}", text);
            eprintln!(
                "[tokens] input: {}, output: {}",
                usage.input_tokens, usage.output_tokens
            );
            Ok(())
        }
        Some(PipelineEvent::Failed { message, .. }) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
        None => Err("pipeline worker exited without an outcome".into()),
    }
}
