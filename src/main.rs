mod app;
mod cli;
mod color;
mod state;
mod ui;

use anyhow::{anyhow, Context};
use app::CustomerLensApp;
use clap::Parser;
use cli::Args;
use customer_lens::data::export::export_to_path;
use customer_lens::data::filter::apply_strict;
use customer_lens::Session;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match &args.export {
        Some(out) => export_headless(&args, out),
        None => run_gui(&args),
    }
}

/// Load, filter and write the result without opening a window.
fn export_headless(args: &Args, out: &std::path::Path) -> anyhow::Result<()> {
    let session = Session::load(&args.customers, &args.stats)
        .with_context(|| format!("loading {}", args.customers.display()))?;

    let selected = apply_strict(&session.customers.records, &args.filter_spec())?;
    if selected.is_empty() {
        log::warn!("No customers match the given filters");
    }

    let written = export_to_path(out, &session.customers.columns, selected)
        .with_context(|| format!("exporting to {}", out.display()))?;
    println!("Exported {written} customers to {}", out.display());
    Ok(())
}

fn run_gui(args: &Args) -> anyhow::Result<()> {
    let state = AppState::open(&args.customers, &args.stats);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Customer Lens – Customer Analytics",
        options,
        Box::new(move |_cc| Ok(Box::new(CustomerLensApp::new(state)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
