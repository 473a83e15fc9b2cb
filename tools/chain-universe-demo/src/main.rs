// Chain Universe Demo Tool
// Runs a selection model inside the simulated engine and feeds an RSI alpha
// with synthetic prices for the selected chains

use anyhow::Context;
use chain_universe::{
    ChainUniverseSelectionModel, InMemoryPriceHistory, InstrumentId, PriceBar, Resolution,
    RsiAlphaConfig, RsiAlphaModel, SelectionConfig, SimulatedEngine, SymbolSelector,
    UniverseSelectionModel, UniverseSettings, parse_future_ticker,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chain-universe-demo", about = "Simulate chain universe selection")]
struct Args {
    /// TOML file with `selection` and `schedule` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of simulated steps
    #[arg(long)]
    steps: Option<u32>,

    /// Override the minutes between simulated steps
    #[arg(long)]
    step_minutes: Option<i64>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Tickers the selector returns from `from` onwards
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Rotation {
    from: DateTime<Utc>,
    market: String,
    tickers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScheduleConfig {
    start: DateTime<Utc>,
    steps: u32,
    step_minutes: i64,
    rotations: Vec<Rotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DemoConfig {
    selection: SelectionConfig,
    #[serde(default)]
    engine_settings: UniverseSettings,
    #[serde(default)]
    alpha: RsiAlphaConfig,
    schedule: ScheduleConfig,
}

impl DemoConfig {
    fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: DemoConfig = toml::from_str(&content)?;
        config.selection.validate()?;
        Ok(config)
    }

    fn builtin() -> Self {
        let start = Utc.with_ymd_and_hms(2025, 12, 15, 14, 30, 0).unwrap();
        Self {
            selection: SelectionConfig::default(),
            engine_settings: UniverseSettings::default(),
            alpha: RsiAlphaConfig { period: 6, resolution: Resolution::Hour },
            schedule: ScheduleConfig {
                start,
                steps: 24 * 7,
                step_minutes: 60,
                rotations: vec![
                    Rotation {
                        from: start,
                        market: "CME".to_string(),
                        tickers: vec!["ESZ25".into(), "ESH26".into(), "NQZ25".into()],
                    },
                    Rotation {
                        from: start + Duration::days(4),
                        market: "CME".to_string(),
                        tickers: vec!["ESH26".into(), "NQH26".into(), "RTYH26".into()],
                    },
                ],
            },
        }
    }
}

/// Returns the tickers of the latest rotation that has started
struct RotatingSelector {
    rotations: Vec<Rotation>,
}

impl RotatingSelector {
    fn new(mut rotations: Vec<Rotation>) -> Self {
        rotations.sort_by_key(|rotation| rotation.from);
        Self { rotations }
    }
}

impl SymbolSelector for RotatingSelector {
    fn select(&mut self, utc_time: DateTime<Utc>) -> anyhow::Result<Vec<InstrumentId>> {
        let Some(rotation) = self.rotations.iter().rev().find(|r| r.from <= utc_time) else {
            return Ok(Vec::new());
        };

        rotation
            .tickers
            .iter()
            .map(|ticker| parse_future_ticker(ticker, &rotation.market).map_err(Into::into))
            .collect()
    }
}

/// Triangle wave in cents, phase-shifted per chain
fn synthetic_close(symbol: &InstrumentId, step: u32) -> Decimal {
    let offset = symbol.raw_value.bytes().map(u32::from).sum::<u32>();
    let phase = i64::from((step + offset) % 24);
    let swing = if phase < 12 { phase } else { 24 - phase };
    Decimal::new(10_000 + swing * 40, 2)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => DemoConfig::from_file(path)?,
        None => DemoConfig::builtin(),
    };
    if let Some(steps) = args.steps {
        config.schedule.steps = steps;
    }
    if let Some(minutes) = args.step_minutes {
        config.schedule.step_minutes = minutes;
    }
    info!("Loaded configuration: {:?}", config.selection);

    let step = Duration::try_minutes(config.schedule.step_minutes)
        .filter(|step| *step > Duration::zero())
        .context("step_minutes must be positive")?;

    let selector = RotatingSelector::new(config.schedule.rotations.clone());
    let mut model = ChainUniverseSelectionModel::from_config(&config.selection, selector)?;
    let mut engine = SimulatedEngine::new(config.schedule.start, config.engine_settings.clone());
    let mut alpha = RsiAlphaModel::from_config(&config.alpha)?;
    let mut history = InMemoryPriceHistory::new();
    let mut insights = 0usize;

    println!("🎯 Chain Universe Demo");
    println!("=====================\n");

    for n in 0..config.schedule.steps {
        match engine.poll(&mut model) {
            Ok(true) => {
                let chains: Vec<String> =
                    engine.active_universes().iter().map(|u| u.symbol().to_string()).collect();
                println!(
                    "📈 {} -> [{}] (next refresh {})",
                    engine.utc_time(),
                    chains.join(", "),
                    model.next_refresh_time_utc()
                );
                alpha.on_securities_changed(engine.last_changes(), &mut history);
            }
            Ok(false) => {}
            Err(e) => error!("Selection failed at {}: {}", engine.utc_time(), e),
        }

        let bars: Vec<PriceBar> = engine
            .active_universes()
            .iter()
            .map(|u| PriceBar {
                symbol: u.symbol().clone(),
                time: engine.utc_time(),
                close: synthetic_close(u.symbol(), n),
            })
            .collect();
        for bar in &bars {
            history.push(bar.clone());
        }
        for insight in alpha.update(engine.utc_time(), &bars) {
            insights += 1;
            println!(
                "💡 {} {:?} {} until {}",
                insight.generated_time_utc,
                insight.direction,
                insight.symbol,
                insight.close_time_utc()
            );
        }

        engine.advance(step);
    }

    let metrics = model.metrics();
    println!("\n✅ Simulation finished at {}", engine.utc_time());
    println!("   - Refreshes: {}", engine.refreshes());
    println!("   - Securities created: {}", metrics.securities_created);
    println!("   - Securities reused: {}", metrics.securities_reused);
    println!("   - Duplicate candidates dropped: {}", metrics.duplicates_dropped);
    println!("   - Failed cycles: {}", metrics.failed_cycles);
    println!("   - {} insights: {}", alpha.name(), insights);

    Ok(())
}
