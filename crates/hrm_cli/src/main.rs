//! Operator CLI for the HR records core.
//!
//! # Responsibility
//! - Parse arguments and resolve configuration (flags over environment).
//! - Open the database and drive the same shell and list APIs a UI uses.

mod commands;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use hrm_core::{init_logging, open_db, AppConfig, LogLevel};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("hrm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Employee records: list, view, edit one tab at a time, export")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("SQLite database path (overrides HRM_DB_PATH)"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Absolute directory for rolling log files (overrides HRM_LOG_DIR)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("trace|debug|info|warn|error (overrides HRM_LOG_LEVEL)"),
        )
        .subcommand(
            Command::new("add")
                .about("Create an employee record")
                .arg(required_text("first-name", "First name"))
                .arg(required_text("last-name", "Last name"))
                .arg(required_text("email", "Work email"))
                .arg(required_text("number", "Employee number"))
                .arg(required_text("position", "Job title"))
                .arg(required_text("department", "Department name or code"))
                .arg(required_text("hire-date", "Hire date (YYYY-MM-DD)"))
                .arg(
                    Arg::new("status")
                        .long("status")
                        .default_value("active")
                        .help("Employment status"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List employees")
                .arg(Arg::new("query").long("query").short('q').help("Free-text search"))
                .arg(Arg::new("status").long("status").help("Status filter"))
                .arg(Arg::new("department").long("department").help("Department filter"))
                .arg(
                    Arg::new("sort")
                        .long("sort")
                        .help("last_name|hire_date|status|employee_number"),
                )
                .arg(
                    Arg::new("desc")
                        .long("desc")
                        .action(ArgAction::SetTrue)
                        .help("Sort descending"),
                )
                .arg(
                    Arg::new("page")
                        .long("page")
                        .default_value("1")
                        .value_parser(value_parser!(usize))
                        .help("1-based page number"),
                )
                .arg(
                    Arg::new("include-deleted")
                        .long("include-deleted")
                        .action(ArgAction::SetTrue)
                        .help("Include soft-deleted records"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Show one record tab")
                .arg(record_id_arg())
                .arg(
                    Arg::new("tab")
                        .long("tab")
                        .default_value("identity")
                        .help("identity|employment|documents|skills|schedule|leave|evaluations"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the tab as JSON"),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit fields of one tab and save them")
                .arg(record_id_arg())
                .arg(
                    Arg::new("slice")
                        .long("slice")
                        .required(true)
                        .help("Tab whose fields are edited"),
                )
                .arg(
                    Arg::new("set")
                        .long("set")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("field=value; lists and objects take JSON"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a record (soft by default)")
                .arg(record_id_arg())
                .arg(
                    Arg::new("hard")
                        .long("hard")
                        .action(ArgAction::SetTrue)
                        .help("Remove the row instead of marking it deleted"),
                )
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .short('y')
                        .action(ArgAction::SetTrue)
                        .help("Confirm the delete"),
                ),
        )
        .subcommand(
            Command::new("restore")
                .about("Restore a soft-deleted record")
                .arg(record_id_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Export records")
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("json")
                        .help("json|jsonl"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file; stdout when omitted"),
                )
                .arg(Arg::new("query").long("query").short('q').help("Free-text search"))
                .arg(Arg::new("status").long("status").help("Status filter"))
                .arg(Arg::new("department").long("department").help("Department filter"))
                .arg(
                    Arg::new("include-deleted")
                        .long("include-deleted")
                        .action(ArgAction::SetTrue)
                        .help("Include soft-deleted records"),
                ),
        )
        .subcommand(
            Command::new("dept")
                .about("Manage the department directory")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Add a department")
                        .arg(Arg::new("name").required(true).help("Department name"))
                        .arg(Arg::new("code").long("code").help("Short code")),
                )
                .subcommand(Command::new("list").about("List departments"))
                .subcommand(
                    Command::new("remove")
                        .about("Remove a department")
                        .arg(record_id_arg()),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Show the badge for a raw status value")
                .arg(Arg::new("raw").required(true).help("Status text")),
        )
}

fn required_text(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

fn record_id_arg() -> Arg {
    Arg::new("id").required(true).help("Record id (uuid)")
}

fn resolve_config(matches: &ArgMatches) -> Result<AppConfig, String> {
    let mut config = AppConfig::from_env();
    if let Some(path) = matches.get_one::<PathBuf>("db") {
        config.db_path = path.clone();
    }
    if let Some(dir) = matches.get_one::<PathBuf>("log-dir") {
        config.log_dir = Some(dir.clone());
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.log_level =
            LogLevel::parse(level).ok_or_else(|| format!("unsupported log level `{level}`"))?;
    }
    Ok(config)
}

fn run(matches: &ArgMatches) -> Result<(), String> {
    let config = resolve_config(matches)?;

    if let Some(dir) = &config.log_dir {
        let dir = dir
            .to_str()
            .ok_or_else(|| "log directory must be valid UTF-8".to_string())?;
        init_logging(config.log_level.as_str(), dir).map_err(|err| err.to_string())?;
    }

    // Badge lookup needs no database.
    if let Some(("status", args)) = matches.subcommand() {
        let raw = args.get_one::<String>("raw").map_or("", String::as_str);
        return commands::execute_status(raw, &mut std::io::stdout().lock());
    }

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let mut stdout = std::io::stdout().lock();
    commands::dispatch(&conn, &config, matches, &mut stdout)
}

fn main() {
    let matches = cli().get_matches();
    if let Err(message) = run(&matches) {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
