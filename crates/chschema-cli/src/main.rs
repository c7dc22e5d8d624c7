//! chschema CLI - typed artifacts from ClickHouse DDL

mod args;
mod config;
mod output;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chschema_core::{
    parse_with_diagnostics, render_interfaces, render_json_schema, resolve, DiagnosticKind,
    InterfaceOptions, MappedTable, ResolveOptions, TableDecl,
};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::Level;

use crate::args::{Args, Command, Emit, MappingArgs, OutputFormat};
use crate::config::{Config, CONFIG_FILE_NAME};
use crate::output::{print_tables, OutputFormatter};

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match (args.quiet, args.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    let quiet = args.quiet;

    match args.command {
        Command::Generate {
            files,
            mapping,
            emit,
            ts_out,
            json_schema_out,
            validators,
        } => {
            let config = Config::load(mapping.config.as_deref())?;
            let emit = emit.unwrap_or_else(|| config.default_emit());
            let emit_validators = validators || config.emit_validators.unwrap_or(false);
            let ts_out = ts_out.or_else(|| config.output.typescript.as_ref().map(PathBuf::from));
            let json_schema_out =
                json_schema_out.or_else(|| config.output.json_schema.as_ref().map(PathBuf::from));
            emit.check_destinations(ts_out.as_deref(), json_schema_out.as_deref())
                .map_err(|e| miette::miette!(e))?;

            let tables = load_and_resolve(config, &files, &mapping, quiet)?;

            if matches!(emit, Emit::Interfaces | Emit::All) {
                let text = render_interfaces(&tables, &InterfaceOptions { emit_validators })?;
                write_output(ts_out.as_deref(), &text)?;
            }
            if matches!(emit, Emit::JsonSchema | Emit::All) {
                let text = render_json_schema(&tables)?;
                write_output(json_schema_out.as_deref(), &text)?;
            }

            if !quiet {
                eprintln!("Generated types for {} table(s)", tables.len());
            }
            Ok(false)
        }

        Command::Tables {
            files,
            mapping,
            format,
        } => {
            let config = Config::load(mapping.config.as_deref())?;
            let tables = load_and_resolve(config, &files, &mapping, quiet)?;
            print_tables(&tables, format)?;
            Ok(false)
        }

        Command::Parse { file } => {
            let content = fs::read_to_string(&file).into_diagnostic()?;
            let output = parse_with_diagnostics(&content)?;

            println!(
                "{}",
                serde_json::to_string_pretty(&output.tables).into_diagnostic()?
            );
            if !quiet {
                OutputFormatter::new(OutputFormat::Human, file.display().to_string())
                    .print_diagnostics(&output.diagnostics, &content)?;
            }

            Ok(output
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::SkippedStatement))
        }
    }
}

/// Read every input file, parse it, and resolve all declarations together
/// so materialized views can reference tables from other files.
fn load_and_resolve(
    config: Config,
    files: &[PathBuf],
    mapping: &MappingArgs,
    quiet: bool,
) -> Result<Vec<MappedTable>> {
    let config = config.merge_with_args(files, mapping);
    let options: ResolveOptions = config.resolve_options()?;
    let input_files = expand_patterns(&config.files)?;

    if input_files.is_empty() {
        miette::bail!(
            "No DDL files specified. Pass files as arguments or configure `files` in {}",
            CONFIG_FILE_NAME
        );
    }

    let mut declarations: Vec<TableDecl> = Vec::new();
    for path in &input_files {
        let content = fs::read_to_string(path).into_diagnostic()?;
        let output = parse_with_diagnostics(&content)?;
        tracing::info!(
            file = %path.display(),
            tables = output.tables.len(),
            skipped = output.diagnostics.len(),
            "parsed DDL file"
        );

        if !quiet && !output.diagnostics.is_empty() {
            OutputFormatter::new(OutputFormat::Human, path.display().to_string())
                .print_diagnostics(&output.diagnostics, &content)?;
        }
        declarations.extend(output.tables);
    }

    Ok(resolve(declarations, &options)?)
}

/// Expand glob patterns; plain paths are kept as given
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if pattern.contains(['*', '?', '[']) {
            let mut matched = glob::glob(pattern).into_diagnostic()?.flatten().peekable();
            if matched.peek().is_none() {
                tracing::warn!(%pattern, "pattern matched no files");
            }
            files.extend(matched);
        } else {
            files.push(PathBuf::from(pattern));
        }
    }
    Ok(files)
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).into_diagnostic()?;
            }
            fs::write(path, text).into_diagnostic()?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => print!("{text}"),
    }
    Ok(())
}
