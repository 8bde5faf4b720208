//! muonstat CLI

mod config;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ms_hist::{BinSpec, CombineMode, FitModel, combine, fill_up_down, fit_curve};
use ms_plateau::{CurveOptions, PlateauKind, Scintillator, rate_curve, ratio_curve};
use ms_table::Table;
use ms_viz::{HistogramArtifact, PlateauCurveArtifact};

use crate::config::{AnalysisConfig, load_config};

#[derive(Parser)]
#[command(name = "muonstat")]
#[command(about = "muonstat - detector plateau and muon timing statistics")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scintillator plateau curves with error bars
    Plateau {
        #[command(subcommand)]
        command: PlateauCommands,
    },

    /// Fill up/down timing histograms from an event table and combine them
    Hist {
        /// Event table (CSV with TDC columns)
        #[arg(short, long)]
        input: PathBuf,

        /// Which histogram to produce
        #[arg(long, value_enum, default_value = "sum")]
        mode: HistMode,

        /// Number of bins (overrides config)
        #[arg(long)]
        bins: Option<usize>,

        /// Lower time edge in ns (overrides config)
        #[arg(long)]
        t_min: Option<f64>,

        /// Upper time edge in ns (overrides config)
        #[arg(long)]
        t_max: Option<f64>,

        /// Chi-squared fit: N0·exp(-t/τ) over the fit range for up, down and sum;
        /// exp(-λt)·(a + b·cos(ωt)) for difference; c + A·cos(ωt + φ) for asymmetry
        #[arg(long, alias = "fit-lifetime")]
        fit: bool,

        /// Log and attach the per-bin up/down/combined dump
        #[arg(long)]
        dump: bool,

        /// Analysis config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file for the artifact (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also render the histogram to this SVG file
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Render an artifact JSON to SVG
    Render {
        /// Artifact JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Artifact kind
        #[arg(long, value_parser = ["plateau", "histogram"])]
        kind: String,

        /// Output SVG path
        #[arg(short, long)]
        output: PathBuf,

        /// Analysis config (YAML); only the `viz` section is used
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print version
    Version,
}

#[derive(Subcommand)]
enum PlateauCommands {
    /// Count rate vs voltage (Poisson chi-squared errors)
    Rate(PlateauArgs),
    /// Three-fold / two-fold coincidence ratio vs voltage (Clopper–Pearson errors)
    Ratio(PlateauArgs),
}

#[derive(Args)]
struct PlateauArgs {
    /// Plateau sheet (CSV)
    #[arg(short, long)]
    input: PathBuf,

    /// Scintillator id (1..=5); repeatable. Defaults to all five.
    #[arg(long = "scintillator", short = 's')]
    scintillators: Vec<u32>,

    /// Tail probability (overrides config)
    #[arg(long)]
    q: Option<f64>,

    /// Analysis config (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write `scint_{n}.json` per scintillator here instead of printing a JSON array
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Also write `scint_{n}.svg` (requires --out-dir)
    #[arg(long, requires = "out_dir")]
    svg: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum HistMode {
    Up,
    Down,
    Sum,
    Difference,
    Asymmetry,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries JSON artifacts; logs go to stderr.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Plateau { command } => match command {
            PlateauCommands::Rate(args) => cmd_plateau(PlateauKind::Rate, &args),
            PlateauCommands::Ratio(args) => cmd_plateau(PlateauKind::Ratio, &args),
        },
        Commands::Hist {
            input,
            mode,
            bins,
            t_min,
            t_max,
            fit,
            dump,
            config,
            output,
            svg,
        } => cmd_hist(
            &input,
            mode,
            HistOverrides { bins, t_min, t_max },
            fit,
            dump,
            config.as_deref(),
            output.as_deref(),
            svg.as_deref(),
        ),
        Commands::Render { input, kind, output, config } => {
            cmd_render(&input, &kind, &output, config.as_deref())
        }
        Commands::Version => {
            println!("muonstat {}", ms_core::VERSION);
            Ok(())
        }
    }
}

fn load_table(input: &Path) -> Result<Table> {
    Table::from_path(input).with_context(|| format!("failed to read table {}", input.display()))
}

fn write_json(output: Option<&Path>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

fn render_svg_file(json: &str, kind: &str, path: &Path, cfg: &AnalysisConfig) -> Result<()> {
    ms_viz_render::render_to_file(json, kind, path, &cfg.viz)
        .with_context(|| format!("failed to render {}", path.display()))?;
    tracing::info!(path = %path.display(), kind, "svg written");
    Ok(())
}

fn cmd_plateau(kind: PlateauKind, args: &PlateauArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let table = load_table(&args.input)?;

    let scintillators: Vec<Scintillator> = if args.scintillators.is_empty() {
        Scintillator::ALL.to_vec()
    } else {
        args.scintillators.iter().map(|&id| Scintillator::from_id(id)).collect::<Result<_, _>>()?
    };

    let (q, peaks, log_y) = match kind {
        PlateauKind::Rate => (cfg.rate.q, &cfg.rate.peaks, cfg.rate.log_y),
        PlateauKind::Ratio => (cfg.ratio.q, &cfg.ratio.peaks, cfg.ratio.log_y),
    };
    let q = args.q.unwrap_or(q);

    let mut artifacts = Vec::with_capacity(scintillators.len());
    for scint in scintillators {
        let opts = CurveOptions { q, peak: peaks.get(scint.index()).copied(), log_y };
        let curve = match kind {
            PlateauKind::Rate => rate_curve(&table, scint, opts),
            PlateauKind::Ratio => ratio_curve(&table, scint, opts),
        }
        .with_context(|| format!("scintillator {}", scint))?;
        tracing::info!(
            scintillator = scint.id(),
            points = curve.values.len(),
            mean = curve.mean,
            "plateau curve"
        );
        artifacts.push(PlateauCurveArtifact::from(curve));
    }

    let Some(dir) = &args.out_dir else {
        return write_json(None, serde_json::to_value(&artifacts)?);
    };
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    for art in &artifacts {
        let json = serde_json::to_string_pretty(art)?;
        let stem = format!("scint_{}", art.scintillator);
        let json_path = dir.join(format!("{stem}.json"));
        std::fs::write(&json_path, &json)
            .with_context(|| format!("failed to write {}", json_path.display()))?;
        if args.svg {
            render_svg_file(&json, "plateau", &dir.join(format!("{stem}.svg")), &cfg)?;
        }
    }
    Ok(())
}

struct HistOverrides {
    bins: Option<usize>,
    t_min: Option<f64>,
    t_max: Option<f64>,
}

#[allow(clippy::too_many_arguments)]
fn cmd_hist(
    input: &Path,
    mode: HistMode,
    overrides: HistOverrides,
    fit: bool,
    dump: bool,
    config: Option<&Path>,
    output: Option<&Path>,
    svg: Option<&Path>,
) -> Result<()> {
    let cfg = load_config(config)?;
    let h = &cfg.histogram;
    let spec = BinSpec::new(
        overrides.bins.unwrap_or(h.bins),
        overrides.t_min.unwrap_or(h.t_min),
        overrides.t_max.unwrap_or(h.t_max),
    )?;

    let table = load_table(input)?;
    // A missing cell means the channel did not fire for that event.
    let mut columns = HashMap::new();
    for name in [&h.up_column, &h.down_column] {
        columns.insert(name.clone(), table.column_or(name, 0.0)?);
    }
    let (up, down) = fill_up_down(&columns, &h.up_column, &h.down_column, h.ns_per_tick, spec)?;

    let (mut artifact, points) = match mode {
        HistMode::Up => (HistogramArtifact::from_histogram(&up, "up"), up.points()),
        HistMode::Down => (HistogramArtifact::from_histogram(&down, "down"), down.points()),
        HistMode::Sum | HistMode::Difference | HistMode::Asymmetry => {
            let combine_mode = match mode {
                HistMode::Sum => CombineMode::Sum,
                HistMode::Difference => CombineMode::Difference,
                _ => CombineMode::Asymmetry,
            };
            let combined = combine(&up, &down, combine_mode)?;
            if combined.n_undefined() > 0 {
                tracing::warn!(bins = combined.n_undefined(), "bins with up + down = 0 are undefined");
            }
            let mut artifact = HistogramArtifact::from_combined(&combined);
            if dump {
                combined.log_diagnostics();
                artifact = artifact.with_diagnostics(&combined);
            }
            (artifact, combined.defined_points())
        }
    };

    if fit {
        // The precession shapes span the whole window; the decay is fitted past the prompt peak.
        let (model, range) = match mode {
            HistMode::Difference => (FitModel::DecayOscillation, (spec.x_min, spec.x_max)),
            HistMode::Asymmetry => (FitModel::Oscillation, (spec.x_min, spec.x_max)),
            _ => (FitModel::Exponential, (h.fit_range[0], h.fit_range[1])),
        };
        let result =
            fit_curve(model, &points, range).with_context(|| format!("{model} fit failed"))?;
        artifact = artifact.with_fit(result);
    }

    let json = serde_json::to_string_pretty(&artifact)?;
    if let Some(path) = svg {
        render_svg_file(&json, "histogram", path, &cfg)?;
    }
    write_json(output, serde_json::to_value(&artifact)?)
}

fn cmd_render(input: &Path, kind: &str, output: &Path, config: Option<&Path>) -> Result<()> {
    let cfg = load_config(config)?;
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    render_svg_file(&json, kind, output, &cfg)
}
