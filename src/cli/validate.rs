use std::path::PathBuf;

use preflight::{ValidateOptions, WorkloadReport};

pub(super) struct Args {
    pub task: PathBuf,
    pub catalog: PathBuf,
    pub credentials: Option<PathBuf>,
    pub vtype: Vec<String>,
    pub namespace: Option<String>,
    pub allow_hidden: bool,
    pub format: super::Format,
}

pub(super) fn run(args: Args) {
    let catalog = super::load_catalog("validate", &args.catalog);

    let task = match preflight::load_task(&args.task) {
        Ok(task) => task,
        Err(e) => super::fail("validate", format!("{}: {e}", args.task.display())),
    };

    let credentials = match &args.credentials {
        Some(path) => match preflight::load_credentials(path) {
            Ok(creds) => Some(creds),
            Err(e) => super::fail("validate", format!("{}: {e}", path.display())),
        },
        None => None,
    };

    let mut options = ValidateOptions::new().allow_hidden(args.allow_hidden);
    if let Some(ns) = args.namespace {
        options = options.namespace(ns);
    }
    if !args.vtype.is_empty() {
        options = options.vtype(args.vtype);
    }

    let reports =
        match preflight::validate_task(&catalog, &task, credentials.as_ref(), &options) {
            Ok(reports) => reports,
            Err(e) => super::fail("validate", e),
        };

    match args.format {
        super::Format::Text => print_text(&reports),
        super::Format::Json => {
            let json = serde_json::to_string_pretty(&reports)
                .unwrap_or_else(|e| super::fail("validate", e));
            println!("{json}");
        }
    }

    if reports.iter().any(|r| !r.is_valid()) {
        std::process::exit(1);
    }
}

fn print_text(reports: &[WorkloadReport]) {
    for report in reports {
        if report.is_valid() {
            eprintln!("workload #{} ({}): ok", report.index, report.scenario);
            continue;
        }
        eprintln!("workload #{} ({}):", report.index, report.scenario);
        for result in &report.results {
            for line in result.to_string().lines() {
                eprintln!("  {line}");
            }
        }
    }
    let failed = reports.iter().filter(|r| !r.is_valid()).count();
    if failed == 0 {
        eprintln!("Task validation passed.");
    } else {
        eprintln!("{failed} of {} workload(s) failed validation.", reports.len());
    }
}
