//! Minisheet - a virtualized spreadsheet grid with a TUI

mod config;
mod tui;

use config::Config;
use minisheet_core::Document;
use minisheet_core::storage::{LocalStore, RemoteClient, export_workbook, import_workbook, load_sheet};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

fn print_usage() {
    eprintln!("Usage: minisheet [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <PATH>           Config file (default: <config dir>/config.toml)");
    eprintln!("  --store-dir <PATH>        Directory the sheet is persisted in");
    eprintln!("  --no-store                Do not load or persist the sheet");
    eprintln!("  --remote <URL>            Use the remote math/formula service");
    eprintln!("  --log-file <PATH>         Log destination (default: <data dir>/minisheet.log)");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula against the sheet and print it");
    eprintln!("  -i, --import <FILE>       Load a workbook (xlsx, xls, ods) into the sheet");
    eprintln!("  -o, --output <FILE>       Export the sheet to xlsx (non-interactive)");
    eprintln!("  -h, --help                Print help");
}

fn init_logging(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {}", path.display(), e);
            return;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn next_value(args: &[String], i: &mut usize, what: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(value) => value.clone(),
        None => fail(format!("{} requires {}", args[*i - 1], what)),
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut store_dir: Option<PathBuf> = None;
    let mut no_store = false;
    let mut remote_url: Option<String> = None;
    let mut log_file: Option<PathBuf> = None;
    let mut command: Option<String> = None;
    let mut import_file: Option<PathBuf> = None;
    let mut output_file: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--config" => config_path = Some(next_value(&args, &mut i, "a file path").into()),
            "--store-dir" => store_dir = Some(next_value(&args, &mut i, "a directory").into()),
            "--no-store" => no_store = true,
            "--remote" => remote_url = Some(next_value(&args, &mut i, "a URL")),
            "--log-file" => log_file = Some(next_value(&args, &mut i, "a file path").into()),
            "-c" | "--command" => command = Some(next_value(&args, &mut i, "a formula")),
            "-i" | "--import" => import_file = Some(next_value(&args, &mut i, "a file path").into()),
            "-o" | "--output" => output_file = Some(next_value(&args, &mut i, "a file path").into()),
            arg => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => fail(format!("{:#}", e)),
    };

    if let Some(path) = log_file.or_else(|| config::default_data_dir().map(|d| d.join("minisheet.log"))) {
        init_logging(&path);
    }

    let store = if no_store {
        None
    } else {
        store_dir.or_else(|| config.store_dir()).map(LocalStore::new)
    };

    let remote = match remote_url.or_else(|| config.remote.url.clone()) {
        Some(url) => match RemoteClient::new(&url) {
            Ok(client) => Some(client),
            Err(e) => fail(e),
        },
        None => None,
    };

    let imported = import_file.map(|path| match import_workbook(&path) {
        Ok(sheet) => sheet,
        Err(e) => fail(e),
    });

    // One-shot modes: evaluate and/or export, never touching the store.
    if command.is_some() || output_file.is_some() {
        let sheet = match (imported, &store) {
            (Some(sheet), _) => sheet,
            (None, Some(store)) => load_sheet(store),
            (None, None) => Default::default(),
        };
        let doc = Document::with_sheet(sheet, config.grid.geometry());

        let mut failed = false;
        if let Some(formula) = command {
            let value = doc.evaluate_condition(&formula);
            println!("{}", value);
            failed = value.is_error();
        }
        if let Some(path) = output_file {
            if let Err(e) = export_workbook(&doc.sheet, &path) {
                fail(e);
            }
            println!("Exported to {}", path.display());
        }
        if failed {
            std::process::exit(1);
        }
        return;
    }

    let mut app = tui::App::new(
        config.grid.geometry(),
        store,
        config.persistence.debounce(),
        remote,
    );
    if let Some(sheet) = imported {
        app.doc.replace_sheet(sheet);
    }

    if let Err(e) = tui::run(&mut app) {
        fail(format!("{:#}", e));
    }
}
