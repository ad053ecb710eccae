//! Command Line
//!
//! `rebate` prices a fixture set's order against its promotions and prints the breakdown.

use std::{io, path::PathBuf, time::Instant};

use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use jiff::{Zoned, civil::DateTime};
use thiserror::Error;
use tracing::info;

use crate::{
    breakdown::BreakdownError,
    engine::{CalculationError, CalculationRequest, ConfigError, EngineConfig, PromotionEngine},
    fixtures::{Fixture, FixtureError},
    observability::{LoggingConfig, ObservabilityError},
};

/// Errors surfaced by the `rebate` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Fixture loading failed
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    /// Config loading failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The calculation failed
    #[error(transparent)]
    Calculation(#[from] CalculationError),

    /// Rendering failed
    #[error(transparent)]
    Breakdown(#[from] BreakdownError),

    /// Logging could not be set up
    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Price an order against a promotion catalog.
#[derive(Debug, Parser)]
#[command(name = "rebate", about = "Promotion calculator", long_about = None)]
pub struct CliArgs {
    /// Fixture set to price
    #[arg(short, long, default_value = "scenarios")]
    pub fixture: String,

    /// Directory holding the fixture sets
    #[arg(long, env = "REBATE_FIXTURES", default_value = "./fixtures")]
    pub fixtures_dir: PathBuf,

    /// Only validate and apply this promotion code
    #[arg(short, long)]
    pub promo_code: Option<String>,

    /// Calculation time (e.g. 2024-06-07T12:00), defaults to now
    #[arg(long)]
    pub at: Option<DateTime>,

    /// Print the breakdown as JSON
    #[arg(long)]
    pub json: bool,

    /// Engine config file (YAML)
    #[arg(short, long, env = "REBATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Eligible promotion count above which combinations are chosen greedily
    #[arg(long, env = "REBATE_SEARCH_LIMIT")]
    pub search_limit: Option<usize>,

    /// Allow percentage rewards above 100%
    #[arg(long, env = "REBATE_ALLOW_OVER_100")]
    pub allow_over_100: bool,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl CliArgs {
    /// Engine config from the config file, if any, with flag overrides applied.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config file cannot be loaded.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };

        if let Some(limit) = self.search_limit {
            config = config.with_exhaustive_search_limit(limit);
        }

        if self.allow_over_100 {
            config = config.with_percentage_over_100(true);
        }

        Ok(config)
    }

    /// Calculation time: `--at`, or the local wall-clock time.
    pub fn now(&self) -> DateTime {
        self.at.unwrap_or_else(|| Zoned::now().datetime())
    }
}

/// Run one calculation and write the result to `out`.
///
/// # Errors
///
/// Returns a [`CliError`] if loading, calculating or writing fails.
pub fn run(args: &CliArgs, mut out: impl io::Write) -> Result<(), CliError> {
    let fixture = Fixture::with_base_path(&args.fixtures_dir).load_set(&args.fixture)?;
    let engine = PromotionEngine::new(args.engine_config()?);

    let mut request = CalculationRequest::new(fixture.order()?, fixture.promotions(), args.now());

    if let Some(customer) = fixture.customer() {
        request = request.with_customer(customer);
    }

    if let Some(code) = &args.promo_code {
        request = request.with_promo_code(code.as_str());
    }

    let start = Instant::now();
    let breakdown = engine.calculate(&request)?;
    let elapsed = start.elapsed();

    info!(
        fixture = %args.fixture,
        applied = breakdown.applied_promotions.len(),
        elapsed_us = elapsed.as_micros(),
        "calculation finished"
    );

    if args.json {
        writeln!(out, "{}", breakdown.to_json()?)?;
    } else {
        breakdown.write_to(&mut out)?;

        writeln!(
            out,
            " {} ({}s)",
            elapsed.human(Truncate::Nano),
            elapsed.as_secs_f32()
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn args(extra: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(["rebate", "--at", "2024-06-07T12:00:00"].iter().chain(extra))
    }

    #[test]
    fn flags_override_the_config() -> TestResult {
        let args = args(&["--search-limit", "3", "--allow-over-100"])?;
        let config = args.engine_config()?;

        assert_eq!(config.exhaustive_search_limit, 3);
        assert!(config.allow_percentage_over_100);

        Ok(())
    }

    #[test]
    fn at_sets_the_calculation_time() -> TestResult {
        let args = args(&[])?;

        assert_eq!(args.now().to_string(), "2024-06-07T12:00:00");

        Ok(())
    }

    #[test]
    fn run_prints_json_for_the_bundled_scenarios() -> TestResult {
        let args = args(&["--json"])?;
        let mut out = Vec::new();

        run(&args, &mut out)?;

        let json: serde_json::Value = serde_json::from_slice(&out)?;

        assert_eq!(json["currency"], "USD");
        assert!(json["applied_promotions"].as_array().is_some_and(|a| !a.is_empty()));

        Ok(())
    }

    #[test]
    fn run_reports_unknown_promo_codes() -> TestResult {
        let args = args(&["--promo-code", "NOPE"])?;

        let result = run(&args, Vec::new());

        assert!(matches!(
            result,
            Err(CliError::Calculation(CalculationError::UnknownPromotionCode(_)))
        ));

        Ok(())
    }
}
