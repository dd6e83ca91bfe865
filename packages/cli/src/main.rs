#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for pavement friction model evaluation.
//!
//! Lists the model catalog, evaluates a variant over segment data, pivots
//! predictions against a threshold per county, summarizes distributions
//! and produces sensitivity curves. Results are printed as JSON.

mod config;
mod pipeline;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use dialoguer::{Input, Password};
use friction_map_access::{AccessGate, Credentials, password_digest_hex};
use friction_map_analytics::{Grouping, column_range, histogram, join_both, summarize_by};
use friction_map_frame::SelectionFilter;
use friction_map_model::sensitivity::{SensitivityPlan, sensitivity_curves};
use friction_map_model_models::BaseForm;
use friction_map_segment_models::{FacilityClass, PavementType};
use friction_map_source::{CsvSource, SegmentSource};
use serde::Serialize;

use crate::config::AppConfig;
use crate::pipeline::{
    Parameter, evaluate_selection, load_registry, prediction_rows, required_path,
    threshold_pivot, variant,
};

#[derive(Parser)]
#[command(
    name = "friction_map",
    about = "Pavement friction model evaluation and aggregation"
)]
struct Cli {
    /// TOML config file
    #[arg(long, env = "FRICTION_MAP_CONFIG", global = true)]
    config: Option<PathBuf>,
    /// Segment-year CSV
    #[arg(long, env = "FRICTION_MAP_SEGMENTS", global = true)]
    segments: Option<PathBuf>,
    /// County reference CSV
    #[arg(long, env = "FRICTION_MAP_GEOGRAPHY", global = true)]
    geography: Option<PathBuf>,
    /// Credentials TOML; data commands require a login when set
    #[arg(long, env = "FRICTION_MAP_CREDENTIALS", global = true)]
    credentials: Option<PathBuf>,
    /// Comma-separated extra variant files
    #[arg(long, env = "FRICTION_MAP_VARIANTS", value_delimiter = ',', global = true)]
    variants: Vec<PathBuf>,
    /// Username for the credentials check (prompted if omitted)
    #[arg(long, env = "FRICTION_MAP_USER", global = true)]
    user: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

/// Which variant to use.
#[derive(Args)]
struct VariantArgs {
    /// Fitting approach (e.g. "stepwise", "`step_iter`", "`remove_facility`")
    #[arg(long, default_value = "stepwise")]
    approach: String,
    /// Base form: I/II or m1/m2
    #[arg(long, default_value = "I", value_parser = parse_form)]
    form: BaseForm,
}

/// Interactive row filters. Each is a comma-separated list.
#[derive(Args)]
struct FilterArgs {
    /// District abbreviations to keep
    #[arg(long, value_delimiter = ',')]
    districts: Option<Vec<String>>,
    /// Contract identifiers to keep
    #[arg(long, value_delimiter = ',')]
    contracts: Option<Vec<String>>,
    /// Facility classes to keep (FM, SH, US, IH)
    #[arg(long, value_delimiter = ',', value_parser = parse_facility)]
    facilities: Option<Vec<FacilityClass>>,
    /// Pavement types to keep (`AC_Thin`, `AC_Thick`, COM, JCP, CRCP)
    #[arg(long, value_delimiter = ',', value_parser = parse_pavement)]
    pavements: Option<Vec<PavementType>>,
}

impl FilterArgs {
    fn into_filter(self) -> SelectionFilter {
        SelectionFilter {
            districts: self.districts.map(BTreeSet::from_iter),
            contracts: self.contracts.map(BTreeSet::from_iter),
            facilities: self.facilities.map(BTreeSet::from_iter),
            pavements: self.pavements.map(BTreeSet::from_iter),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupBy {
    District,
    Facility,
    Pavement,
}

impl From<GroupBy> for Grouping {
    fn from(value: GroupBy) -> Self {
        match value {
            GroupBy::District => Self::District,
            GroupBy::Facility => Self::Facility,
            GroupBy::Pavement => Self::Pavement,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List every registered model variant
    Variants,
    /// Evaluate a variant and print one JSON row per segment-year
    Evaluate {
        #[command(flatten)]
        variant: VariantArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Count segments meeting a threshold per county
    Pivot {
        #[command(flatten)]
        variant: VariantArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Value to compare against the threshold
        #[arg(long, value_enum, default_value = "sn")]
        parameter: Parameter,
        /// Inclusive threshold. Defaults to the config value, then to the
        /// column minimum.
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Print histogram and box-plot statistics
    Summary {
        #[command(flatten)]
        variant: VariantArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Value to summarize
        #[arg(long, value_enum, default_value = "sn")]
        parameter: Parameter,
        /// Box-plot grouping
        #[arg(long, value_enum, default_value = "district")]
        by: GroupBy,
        /// Histogram bin count
        #[arg(long, default_value = "30")]
        bins: usize,
    },
    /// Predict friction curves varying one factor at a time
    Sensitivity {
        #[command(flatten)]
        variant: VariantArgs,
        /// TOML file overriding the default ages, baseline and levels
        #[arg(long)]
        plan: Option<PathBuf>,
    },
    /// Print the digest to store for a password in the credentials file
    HashPassword,
}

fn parse_form(s: &str) -> Result<BaseForm, String> {
    match s {
        "I" | "m1" => Ok(BaseForm::I),
        "II" | "m2" => Ok(BaseForm::II),
        _ => Err(format!("unknown form '{s}', expected I, II, m1 or m2")),
    }
}

fn parse_facility(s: &str) -> Result<FacilityClass, String> {
    s.parse()
        .map_err(|_| format!("unknown facility class '{s}'"))
}

fn parse_pavement(s: &str) -> Result<PavementType, String> {
    s.parse().map_err(|_| format!("unknown pavement type '{s}'"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VariantListing<'a> {
    approach: &'a str,
    form: BaseForm,
    covariate_set: String,
    coefficients: usize,
    group_effect: Option<String>,
    description: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PivotOutput<'a> {
    column: &'a str,
    threshold: Option<f64>,
    dropped_non_finite: usize,
    meets_threshold: Vec<friction_map_analytics::CountyCount>,
    below_threshold: Vec<friction_map_analytics::CountyCount>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryOutput<'a> {
    column: &'a str,
    range: Option<(f64, f64)>,
    histogram: Vec<friction_map_analytics::HistogramBin>,
    grouped_by: Grouping,
    groups: Vec<friction_map_analytics::GroupSummary>,
}

/// Flags and environment, with the config file behind them.
struct Context {
    config: AppConfig,
    segments: Option<PathBuf>,
    geography: Option<PathBuf>,
    credentials: Option<PathBuf>,
    variants: Vec<PathBuf>,
    user: Option<String>,
}

impl Context {
    fn new(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match &cli.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        let variants = config
            .variants
            .iter()
            .chain(&cli.variants)
            .cloned()
            .collect();
        Ok(Self {
            segments: cli.segments.clone(),
            geography: cli.geography.clone(),
            credentials: cli
                .credentials
                .clone()
                .or_else(|| config.credentials.clone()),
            variants,
            user: cli.user.clone(),
            config,
        })
    }

    fn source(&self) -> Result<CsvSource, String> {
        let segments = required_path(
            self.segments.as_deref(),
            self.config.segments.as_deref(),
            "segments",
        )?;
        let geography = required_path(
            self.geography.as_deref(),
            self.config.geography.as_deref(),
            "geography",
        )?;
        Ok(CsvSource::new(segments, geography))
    }

    fn prefix(&self) -> &str {
        self.config.prediction_prefix()
    }
}

/// Requires a successful login when a credentials file is configured.
fn authorize(
    credentials: Option<&Path>,
    user: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = credentials else {
        log::debug!("No credentials configured, skipping login");
        return Ok(());
    };

    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read credentials {}: {e}", path.display()))?;
    let mut gate = AccessGate::new(Credentials::from_toml(&contents)?);

    let user = match user {
        Some(user) => user.to_string(),
        None => Input::new().with_prompt("Username").interact_text()?,
    };
    let password = match std::env::var("FRICTION_MAP_PASSWORD") {
        Ok(password) => password,
        Err(_) => Password::new().with_prompt("Password").interact()?,
    };

    gate.unlock(&user, &password)?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[allow(clippy::too_many_lines)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let ctx = Context::new(&cli)?;

    match cli.command {
        Commands::HashPassword => {
            let password = Password::new()
                .with_prompt("Password")
                .with_confirmation("Repeat password", "Passwords do not match")
                .interact()?;
            println!("{}", password_digest_hex(&password));
        }
        Commands::Variants => {
            let registry = load_registry(&ctx.variants)?;
            let listing: Vec<VariantListing> = registry
                .variants()
                .map(|v| VariantListing {
                    approach: &v.key().name,
                    form: v.form(),
                    covariate_set: v.covariate_set().to_string(),
                    coefficients: v.coefficient_count(),
                    group_effect: v.group_effect().map(|g| g.mode.to_string()),
                    description: v.description(),
                })
                .collect();
            print_json(&listing)?;
        }
        Commands::Evaluate { variant: args, filter } => {
            authorize(ctx.credentials.as_deref(), ctx.user.as_deref())?;
            let registry = load_registry(&ctx.variants)?;
            let model = variant(&registry, &args.approach, args.form)?;
            let records = ctx.source()?.segments()?;

            let frame = evaluate_selection(model, &records, &filter.into_filter(), ctx.prefix())?;
            print_json(&prediction_rows(&frame, model.key(), ctx.prefix())?)?;
        }
        Commands::Pivot {
            variant: args,
            filter,
            parameter,
            threshold,
        } => {
            authorize(ctx.credentials.as_deref(), ctx.user.as_deref())?;
            let registry = load_registry(&ctx.variants)?;
            let model = variant(&registry, &args.approach, args.form)?;
            let source = ctx.source()?;
            let records = source.segments()?;
            let reference = source.geography()?;

            let frame = evaluate_selection(model, &records, &filter.into_filter(), ctx.prefix())?;
            let column = parameter.column(model.key(), ctx.prefix())?;
            let (threshold, table) =
                threshold_pivot(&frame, &column, threshold.or(ctx.config.default_threshold))?;
            let (meets_threshold, below_threshold) = join_both(&reference, &table);
            print_json(&PivotOutput {
                column: &column,
                threshold,
                dropped_non_finite: table.dropped_non_finite,
                meets_threshold,
                below_threshold,
            })?;
        }
        Commands::Summary {
            variant: args,
            filter,
            parameter,
            by,
            bins,
        } => {
            authorize(ctx.credentials.as_deref(), ctx.user.as_deref())?;
            let registry = load_registry(&ctx.variants)?;
            let model = variant(&registry, &args.approach, args.form)?;
            let records = ctx.source()?.segments()?;

            let frame = evaluate_selection(model, &records, &filter.into_filter(), ctx.prefix())?;
            let column = parameter.column(model.key(), ctx.prefix())?;
            let grouping = Grouping::from(by);
            print_json(&SummaryOutput {
                column: &column,
                range: column_range(&frame, &column)?,
                histogram: histogram(&frame, &column, bins)?,
                grouped_by: grouping,
                groups: summarize_by(&frame, &column, grouping)?,
            })?;
        }
        Commands::Sensitivity { variant: args, plan } => {
            let registry = load_registry(&ctx.variants)?;
            let model = variant(&registry, &args.approach, args.form)?;
            let plan = match plan {
                Some(path) => {
                    let contents = std::fs::read_to_string(&path)
                        .map_err(|e| format!("Failed to read plan {}: {e}", path.display()))?;
                    toml::de::from_str(&contents)?
                }
                None => SensitivityPlan::default(),
            };
            print_json(&sensitivity_curves(model, &plan)?)?;
        }
    }

    Ok(())
}
