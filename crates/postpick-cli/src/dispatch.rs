use anyhow::{Context, Result, bail};
use comfy_table::{Cell, ContentArrangement, Table};
use postpick_app::{App, SelectionReport};
use postpick_core::config::PostpickConfig;
use postpick_core::doctor::{DoctorReport, run_doctor};
use postpick_tui::UiExit;
use tracing::info;

use crate::cli::{Cli, Command};

/// `config` is the outcome of loading the config file; only the commands that
/// need it surface its error.
pub fn run_with_deps(cli: Cli, config: Result<PostpickConfig>) -> Result<()> {
    match cli.command {
        Some(Command::Show) => run_show_command(&config?),
        Some(Command::Doctor) => run_doctor_command(),
        None => run_root_command(&config?),
    }
}

fn run_root_command(config: &PostpickConfig) -> Result<()> {
    let app = App::from_config(config)?;

    let exit = postpick_tui::run_root(&app).context("selection screen failed")?;
    match exit {
        UiExit::Completed => info!("selection screen closed"),
        UiExit::Canceled => info!("selection screen canceled"),
    }

    Ok(())
}

fn run_show_command(config: &PostpickConfig) -> Result<()> {
    let report = SelectionReport::from_config(config)?;
    println!("{}", selection_table(&report));
    Ok(())
}

fn run_doctor_command() -> Result<()> {
    let report = run_doctor();
    println!("{}", doctor_table(&report));
    println!("{}", report.summary());

    if report.has_failures() {
        bail!("doctor found failing checks");
    }
    Ok(())
}

fn selection_table(report: &SelectionReport) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![
        Cell::new("store"),
        Cell::new(report.store_path.display().to_string()),
    ]);

    match &report.item {
        Some(item) => {
            table.add_row(vec![Cell::new("id"), Cell::new(item.id)]);
            table.add_row(vec![Cell::new("title"), Cell::new(item.title.as_str())]);
            table.add_row(vec![Cell::new("body"), Cell::new(item.body.as_str())]);
            if let Some(updated_at) = report.updated_at.as_deref() {
                table.add_row(vec![Cell::new("saved at"), Cell::new(updated_at)]);
            }
        }
        None => {
            table.add_row(vec![Cell::new("selection"), Cell::new("none")]);
        }
    }

    table
}

fn doctor_table(report: &DoctorReport) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Status", "Details"]);

    for check in &report.checks {
        table.add_row(vec![
            Cell::new(check.name.as_str()),
            Cell::new(check.state.to_string()),
            Cell::new(check.details.as_str()),
        ]);
    }

    table
}
