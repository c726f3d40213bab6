//! Runs a wall recycling scenario and reports the result.
//!
//! # Usage
//!
//! ```text
//! wallflux
//! wallflux --config config/reference.toml --csv run.csv
//! wallflux --provenance
//! RUST_LOG=wallflux_model=debug wallflux
//! ```
//!
//! With no arguments the built-in reference scenario is run. `--plot` needs
//! the `plot` feature.

use std::{error::Error, path::PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wallflux_model::{
    DiagnosticSample, ScenarioConfig, SimulationError, provenance::REFERENCE_PROVENANCE, run,
};

#[derive(Parser, Debug)]
#[command(name = "wallflux", version, about = "Zero-dimensional plasma wall recycling model")]
struct Args {
    /// TOML scenario file; the reference scenario when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write per-sample diagnostics to a CSV file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Show a four-panel plot of the run
    #[arg(long)]
    plot: bool,

    /// Print where each reference parameter comes from and exit
    #[arg(long)]
    provenance: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    if args.provenance {
        print_provenance();
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => ScenarioConfig::load(path).map_err(SimulationError::from)?,
        None => ScenarioConfig::reference(),
    };
    let scenario = config.build().map_err(SimulationError::from)?;
    let result = run(&scenario)?;
    let diagnostics = result.diagnostics(&scenario).map_err(SimulationError::from)?;

    if let Some(path) = &args.csv {
        wallflux_report::write_csv_file(path, &diagnostics)?;
        tracing::info!(path = %path.display(), rows = diagnostics.len(), "wrote CSV");
    }

    if let Some(last) = diagnostics.last() {
        print_summary(last, result.violations.len());
    }

    if args.plot {
        show_plot(
            &diagnostics,
            scenario.model.params().wall_capacity(),
            scenario.near_unity_threshold,
        )?;
    }

    Ok(())
}

fn print_summary(last: &DiagnosticSample, violations: usize) {
    println!("t     = {:.3} s", last.t);
    println!("Np    = {:.6e} particles", last.plasma);
    println!("Nw    = {:.6e} particles", last.wall);
    match last.r_eff {
        Some(r_eff) => println!("R_eff = {r_eff:.6}"),
        None => println!("R_eff = undefined (no incident flux)"),
    }
    if violations > 0 {
        println!("{violations} boundary violation(s) recorded");
    }
}

fn print_provenance() {
    println!(
        "{:<34} {:<8} {:>12} {:<12} {:<18} note",
        "key", "symbol", "value", "unit", "provenance"
    );
    for entry in REFERENCE_PROVENANCE {
        let value = entry
            .value
            .map_or_else(|| "-".to_owned(), |v| format!("{v:.4e}"));
        println!(
            "{:<34} {:<8} {:>12} {:<12} {:<18} {}",
            entry.key,
            entry.symbol,
            value,
            entry.unit,
            entry.provenance.to_string(),
            entry.note
        );
    }
}

#[cfg(feature = "plot")]
fn show_plot(
    diagnostics: &[DiagnosticSample],
    wall_capacity: f64,
    near_unity: f64,
) -> Result<(), Box<dyn Error>> {
    use wallflux_report::plot::{Figure, ShowConfig};

    Figure::new(diagnostics, wall_capacity, near_unity)
        .show(ShowConfig::new().title("wallflux").legend())?;
    Ok(())
}

#[cfg(not(feature = "plot"))]
fn show_plot(
    _diagnostics: &[DiagnosticSample],
    _wall_capacity: f64,
    _near_unity: f64,
) -> Result<(), Box<dyn Error>> {
    Err("--plot requires building with the `plot` feature".into())
}
