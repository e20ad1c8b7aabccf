use anyhow::{Result, bail};
use comfy_table::{Cell, ContentArrangement, Table};
use snack_import_app::{App, ImportInput, ImportPreview, load_config};
use snack_import_core::doctor::{CheckState, DoctorReport};
use snack_import_core::request::ManualFields;
use snack_import_tui::UiExit;

use crate::cli::{Cli, Command, ImportArgs};

pub fn run_with_deps(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Import(args)) => run_import_command(&args),
        Some(Command::Parse { url }) => run_parse_command(&url),
        Some(Command::Doctor) => run_doctor_command(),
        None => run_root_command(cli.url.as_deref()),
    }
}

fn run_root_command(initial_url: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let app = App::with_http_client(&config)?;

    match snack_import_tui::run_import(&app, &config, initial_url)? {
        UiExit::Imported { redirect } => println!("{redirect}"),
        UiExit::Dismissed | UiExit::Canceled => {}
    }

    Ok(())
}

fn run_import_command(args: &ImportArgs) -> Result<()> {
    let config = load_config()?;
    let app = App::with_http_client(&config)?;
    let result = app.import(&config, &import_input(args))?;
    println!("{}", result.link);
    Ok(())
}

fn import_input(args: &ImportArgs) -> ImportInput {
    if args.advanced {
        return ImportInput::Manual(ManualFields {
            repo: args.repo.clone().unwrap_or_default(),
            subpath: args.subpath.clone().unwrap_or_default(),
            branch: args.branch.clone().unwrap_or_default(),
        });
    }
    ImportInput::Url(args.url.clone().unwrap_or_default())
}

fn run_parse_command(url: &str) -> Result<()> {
    let config = load_config()?;
    let preview = App::preview(url, &config);
    print_preview(&preview);

    if let Err(error) = &preview.request {
        bail!("{error}");
    }
    Ok(())
}

fn print_preview(preview: &ImportPreview) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);

    let reference = &preview.reference;
    let repository = match &preview.request {
        Ok(request) => request.repo.clone(),
        Err(_) => String::new(),
    };
    let endpoint = match (&preview.request, &preview.endpoint) {
        (Ok(_), Some(endpoint)) => endpoint.to_string(),
        (Ok(_), None) => "(import service not configured)".to_string(),
        (Err(_), _) => String::new(),
    };

    for (field, value) in [
        ("scheme", reference.scheme.as_str()),
        ("host", reference.host.as_str()),
        ("owner", reference.owner.as_str()),
        ("name", reference.name.as_str()),
        ("branch", reference.git_ref.as_str()),
        ("subpath", reference.subpath.as_str()),
        ("repository", repository.as_str()),
        ("endpoint", endpoint.as_str()),
    ] {
        table.add_row(vec![Cell::new(field), Cell::new(display_or_dash(value))]);
    }

    println!("{table}");
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn run_doctor_command() -> Result<()> {
    let report = App::doctor()?;
    print_doctor_report(&report);
    Ok(())
}

fn print_doctor_report(report: &DoctorReport) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Status", "Details"]);

    for check in &report.checks {
        let status = match check.state {
            CheckState::Pass => "PASS",
            CheckState::Fail => "FAIL",
        };

        table.add_row(vec![
            Cell::new(check.name.as_str()),
            Cell::new(status),
            Cell::new(check.details.as_str()),
        ]);
    }

    println!("{table}");
    println!("{}", report.summary());
}
