//! Interactive shell
//!
//! Every input line is SQL for the open session, except dot-commands. After a
//! successful non-query the active table is refreshed and redrawn; a failed
//! statement prints the engine's message and leaves the grid untouched.

use anyhow::{Context, Result, bail};
use insight_sqlite::{DatabaseSession, GridColumns, grid_columns, templates::QueryTemplate};
use std::io::{BufRead, Write};

use crate::output::Printer;

const HELP: &str = "\
.tables            list tables
.columns           describe the active table
.use NAME          switch the active table
.refresh           reload the active table
.template KIND     print an insert/select/delete starter statement
.hide COLUMN       hide a grid column
.unhide COLUMN     show a hidden grid column
.info              database file information
.help              this text
.quit              leave the shell
Anything else is sent to the database as SQL.";

/// What the shell loop should do after a line
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Print(String),
    Nothing,
    Quit,
}

pub struct Shell {
    session: DatabaseSession,
    printer: Printer,
    columns: GridColumns,
}

impl Shell {
    pub fn new(session: DatabaseSession, printer: Printer) -> Self {
        Self {
            session,
            printer,
            columns: GridColumns::default(),
        }
    }

    pub fn session(&self) -> &DatabaseSession {
        &self.session
    }

    /// Run until `.quit` or end of input
    pub fn run(&mut self, input: impl BufRead, mut out: impl Write) -> Result<()> {
        writeln!(out, "{}", self.draw()?)?;
        write!(out, "{}> ", self.session.title())?;
        out.flush()?;

        for line in input.lines() {
            let line = line.context("Failed to read input")?;
            match self.handle_line(&line) {
                Ok(Step::Print(text)) => writeln!(out, "{}", text)?,
                Ok(Step::Nothing) => {}
                Ok(Step::Quit) => return Ok(()),
                Err(e) => {
                    tracing::debug!(error = %e, "shell command failed");
                    writeln!(out, "error: {:#}", e)?;
                }
            }
            write!(out, "{}> ", self.session.title())?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(())
    }

    pub fn handle_line(&mut self, line: &str) -> Result<Step> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Step::Nothing);
        }

        let Some(command) = line.strip_prefix('.') else {
            return self.run_sql(line);
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "quit" | "exit" => Ok(Step::Quit),
            "help" => Ok(Step::Print(HELP.to_string())),
            "tables" => {
                let tables = DatabaseSession::list_tables(self.session.path())?;
                Ok(Step::Print(self.printer.names("Table", &tables)?))
            }
            "columns" => Ok(Step::Print(
                self.printer.columns(&self.session.describe_columns()?)?,
            )),
            "use" => {
                if arg.is_empty() {
                    bail!("usage: .use NAME");
                }
                self.session.select_table(arg)?;
                Ok(Step::Print(self.draw()?))
            }
            "refresh" => {
                self.session.refresh()?;
                Ok(Step::Print(self.draw()?))
            }
            "template" => {
                let kind: QueryTemplate = arg.parse()?;
                Ok(Step::Print(kind.render(Some(&self.session))?))
            }
            "hide" | "unhide" => {
                if !self.columns.set_visible(arg, name == "unhide") {
                    bail!("no column named '{}'", arg);
                }
                Ok(Step::Print(self.printer.rows(self.session.displayed_rows(), &self.columns)?))
            }
            "info" => Ok(Step::Print(self.printer.info(&self.session.file_info()?)?)),
            other => bail!("unknown command '.{}', try .help", other),
        }
    }

    fn run_sql(&mut self, sql: &str) -> Result<Step> {
        match self.session.execute(sql)? {
            Some(_) => Ok(Step::Print(self.draw()?)),
            None => {
                self.session.refresh()?;
                Ok(Step::Print(self.draw()?))
            }
        }
    }

    /// Rebuild grid columns for the displayed rows and render them
    fn draw(&mut self) -> Result<String> {
        let rows = self.session.displayed_rows();
        let fallback = if rows.is_empty() {
            self.session.list_columns()?
        } else {
            Vec::new()
        };

        let mut columns = grid_columns(rows, &fallback);
        columns.inherit_visibility(&self.columns);
        self.columns = columns;
        self.printer.rows(self.session.displayed_rows(), &self.columns)
    }
}
