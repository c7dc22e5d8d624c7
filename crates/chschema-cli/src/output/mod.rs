//! Output formatting

use chschema_core::{Diagnostic, MappedTable, Severity};
use miette::{IntoDiagnostic, Result};

use crate::args::OutputFormat;

/// Output formatter for parse diagnostics and table listings
pub struct OutputFormatter {
    format: OutputFormat,
    file_name: String,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, file_name: String) -> Self {
        Self { format, file_name }
    }

    /// Print diagnostics in the configured format
    pub fn print_diagnostics(&self, diagnostics: &[Diagnostic], source: &str) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                self.print_human(diagnostics, source);
                Ok(())
            }
            OutputFormat::Json => self.print_json(diagnostics),
        }
    }

    fn print_human(&self, diagnostics: &[Diagnostic], source: &str) {
        for diag in diagnostics {
            let severity_str = match diag.severity {
                Severity::Warning => "\x1b[33mwarning\x1b[0m",
                Severity::Info => "\x1b[34minfo\x1b[0m",
            };

            eprintln!("{}[{}]: {}", severity_str, diag.code(), diag.message);

            if let Some(span) = &diag.span {
                eprintln!("  --> {}:{}:{}", self.file_name, span.line, span.column);

                if let Some(source_line) = get_source_line(source, span.line) {
                    eprintln!("   |");
                    eprintln!("{:>3} | {}", span.line, source_line);

                    // Statement spans can run past the first line; underline what fits
                    let padding = " ".repeat(span.column.saturating_sub(1));
                    let visible = source_line.len().saturating_sub(span.column.saturating_sub(1));
                    let underline = "^".repeat(span.length.min(visible).max(1));
                    eprintln!("   | {}{}", padding, underline);
                }
            }

            if let Some(help) = &diag.help {
                eprintln!("   = help: {}", help);
            }

            eprintln!();
        }
    }

    fn print_json(&self, diagnostics: &[Diagnostic]) -> Result<()> {
        let output = serde_json::json!({
            "file": self.file_name,
            "diagnostics": diagnostics
        });
        eprintln!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
        Ok(())
    }
}

/// Print mapped tables for the `tables` command
pub fn print_tables(tables: &[MappedTable], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for table in tables {
                println!("Table: {} ({})", table.source_name, table.declared_name);
                if let Some(engine) = &table.meta.engine {
                    println!("  Engine: {}", engine);
                }
                for column in &table.columns {
                    println!(
                        "    - {} {} -> {}",
                        column.name, column.raw_type_text, column.mapped_type
                    );
                }
                println!();
            }
            println!("{} table(s)", tables.len());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(tables).into_diagnostic()?);
        }
    }
    Ok(())
}

/// Get a specific line from source (1-indexed)
fn get_source_line(source: &str, line: usize) -> Option<&str> {
    source.lines().nth(line.saturating_sub(1))
}
