//! SQLite Insight CLI - inspect and edit SQLite database files from the terminal

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use insight_core::{InsightConfig, OutputFormat};
use insight_sqlite::{ConnectionOptions, DatabaseSession, grid_columns, templates::QueryTemplate};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod logging;
mod output;
mod shell;

use crate::output::Printer;
use crate::shell::Shell;

/// SQLite Insight
#[derive(Parser, Debug)]
#[command(name = "sqlite-insight")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and edit SQLite database files")]
#[command(long_about = r#"Inspect and edit SQLite database files

EXAMPLES:
    # Create a database with a (Key, Value) table
    sqlite-insight create notes.db --table notes

    # Run a statement, then show the refreshed table
    sqlite-insight exec notes.db "INSERT INTO notes (Key, Value) VALUES (1, 'a')"

    # Query
    sqlite-insight exec notes.db "SELECT * FROM notes WHERE Key > 0"

    # Interactive shell
    sqlite-insight shell notes.db

SQL tutorial: https://www.sqlitetutorial.net/"#)]
struct Cli {
    /// Config file (default: <config dir>/sqlite-insight/config.toml)
    #[arg(long, global = true, env = "SQLITE_INSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (overrides the config file)
    #[arg(long, global = true, value_enum)]
    format: Option<FormatArg>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether a file is a valid SQLite database
    Check { path: PathBuf },

    /// Create a new database file with a (Key INTEGER, Value TEXT) table
    Create {
        path: PathBuf,
        /// Table name (default: from config)
        #[arg(long, short)]
        table: Option<String>,
    },

    /// List tables
    Tables { path: PathBuf },

    /// Describe the columns of a table
    Columns {
        path: PathBuf,
        #[arg(long, short)]
        table: Option<String>,
    },

    /// Show every row of a table
    Show {
        path: PathBuf,
        #[arg(long, short)]
        table: Option<String>,
    },

    /// Execute SQL; SELECT results are printed, otherwise the table is refreshed and shown
    Exec {
        path: PathBuf,
        sql: String,
        #[arg(long, short)]
        table: Option<String>,
    },

    /// Print a starter statement for a table
    Template {
        kind: TemplateArg,
        path: Option<PathBuf>,
        #[arg(long, short)]
        table: Option<String>,
    },

    /// Show database file information
    Info { path: PathBuf },

    /// Interactive SQL shell
    Shell {
        path: PathBuf,
        #[arg(long, short)]
        table: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Table,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TemplateArg {
    Insert,
    Select,
    Delete,
}

impl From<TemplateArg> for QueryTemplate {
    fn from(arg: TemplateArg) -> Self {
        match arg {
            TemplateArg::Insert => QueryTemplate::Insert,
            TemplateArg::Select => QueryTemplate::Select,
            TemplateArg::Delete => QueryTemplate::Delete,
        }
    }
}

struct CliContext {
    config: InsightConfig,
    printer: Printer,
}

impl CliContext {
    fn options(&self) -> ConnectionOptions {
        ConnectionOptions::from(&self.config)
    }

    fn open(&self, path: &Path, table: Option<&str>) -> Result<DatabaseSession> {
        let session = match table {
            Some(table) => DatabaseSession::open_table(path, table, self.options()),
            None => DatabaseSession::open(path, self.options()),
        };
        session.with_context(|| format!("Failed to open '{}'", path.display()))
    }

    fn print_grid(&self, session: &DatabaseSession) -> Result<()> {
        let rows = session.displayed_rows();
        let fallback = if rows.is_empty() {
            session.list_columns()?
        } else {
            Vec::new()
        };
        println!("{}", self.printer.rows(rows, &grid_columns(rows, &fallback))?);
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = InsightConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    logging::init(&logging::LoggingConfig::from_settings(&config.logging, cli.verbose))?;

    let format = cli.format.map(OutputFormat::from).unwrap_or(config.output_format);
    let ctx = CliContext {
        printer: Printer::new(format),
        config,
    };

    match cli.command {
        Commands::Check { path } => {
            if DatabaseSession::is_valid_database(&path) {
                println!("valid");
            } else {
                println!("invalid");
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Create { path, table } => {
            let table = table.unwrap_or_else(|| ctx.config.default_table_name.clone());
            let session = DatabaseSession::create(&path, &table, ctx.options())
                .with_context(|| format!("Failed to create '{}'", path.display()))?;
            eprintln!("created {}", session.path().display());
            ctx.print_grid(&session)?;
        }
        Commands::Tables { path } => {
            let tables = DatabaseSession::list_tables(&path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            println!("{}", ctx.printer.names("Table", &tables)?);
        }
        Commands::Columns { path, table } => {
            let session = ctx.open(&path, table.as_deref())?;
            println!("{}", ctx.printer.columns(&session.describe_columns()?)?);
        }
        Commands::Show { path, table } => {
            let session = ctx.open(&path, table.as_deref())?;
            ctx.print_grid(&session)?;
        }
        Commands::Exec { path, sql, table } => {
            let mut session = ctx.open(&path, table.as_deref())?;
            if session.execute(&sql)?.is_none() {
                session.refresh()?;
            }
            ctx.print_grid(&session)?;
        }
        Commands::Template { kind, path, table } => {
            let session = match &path {
                Some(path) => Some(ctx.open(path, table.as_deref())?),
                None => None,
            };
            println!("{}", QueryTemplate::from(kind).render(session.as_ref())?);
        }
        Commands::Info { path } => {
            let session = ctx.open(&path, None)?;
            println!("{}", ctx.printer.info(&session.file_info()?)?);
        }
        Commands::Shell { path, table } => {
            let session = ctx.open(&path, table.as_deref())?;
            let mut shell = Shell::new(session, ctx.printer);
            shell.run(std::io::stdin().lock(), std::io::stdout().lock())?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
