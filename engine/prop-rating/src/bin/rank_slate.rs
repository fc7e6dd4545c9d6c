use anyhow::Context;
use clap::{Parser, ValueEnum};
use prop_rating::logging::{initialize_logging, LogFormat};
use prop_rating::{PropRecord, RatingConfig, RatingPipeline, Side, SlateContext, SlateTracker};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SideArg {
    Favorable,
    Unfavorable,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Favorable => Side::Favorable,
            SideArg::Unfavorable => Side::Unfavorable,
        }
    }
}

/// Rank a slate of props read from a JSON file
#[derive(Debug, Parser)]
#[command(name = "rank-slate", version)]
struct Args {
    /// JSON array of prop records
    input: PathBuf,

    /// TOML rating configuration (defaults plus PROP_RATING_* env overrides otherwise)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "favorable")]
    side: SideArg,

    /// Sport key recorded on the slate context
    #[arg(long, default_value = "nfl")]
    sport: String,

    /// Print at most this many props
    #[arg(long)]
    limit: Option<usize>,

    /// Emit the ranked slate as JSON instead of a table
    #[arg(long)]
    json: bool,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// compact, pretty or json
    #[arg(long, default_value = "compact")]
    log_format: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level, LogFormat::parse(&args.log_format))?;

    let config = match &args.config {
        Some(path) => RatingConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RatingConfig::from_env().context("Invalid PROP_RATING_* environment")?,
    };
    info!("Loaded configuration: {:?}", config);

    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let records: Vec<PropRecord> = serde_json::from_str(&content)
        .context("Input must be a JSON array of prop records")?;
    info!(
        "Loaded {} props from {}",
        records.len(),
        args.input.display()
    );

    let pipeline = RatingPipeline::new(config);
    let tracker = SlateTracker::new();
    let ticket = tracker.begin(SlateContext {
        sport: args.sport.clone(),
        ..Default::default()
    });
    let side = Side::from(args.side);

    let outcome = pipeline.run(&ticket.slate(records), side);
    tracker.complete(&ticket, outcome);

    let Some(ranked) = tracker.latest() else {
        println!("No ranked data available");
        return Ok(());
    };

    let limit = args.limit.unwrap_or(ranked.len());
    if args.json {
        let shown = &ranked.props[..limit.min(ranked.len())];
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    println!(
        "{:>4}  {:<24} {:<28} {:>7} {:>6} {:>5} {:>4}  {}",
        "#", "player", "market", "line", "rating", "grade", "tier", "gate"
    );
    for (position, prop) in ranked.props.iter().take(limit).enumerate() {
        let gate = if pipeline.ranking().is_demoted(prop, side) {
            "demoted"
        } else if pipeline.ranking().is_gated(prop, side) {
            "gated"
        } else {
            ""
        };
        println!(
            "{:>4}  {:<24} {:<28} {:>7.1} {:>6} {:>5} {:>4}  {}",
            position + 1,
            prop.record.player_name,
            prop.record.category,
            prop.record.line,
            prop.rating(side),
            prop.grade(side).to_string(),
            prop.priority.tier,
            gate
        );
    }

    Ok(())
}
