//! CLI argument definitions

use std::path::{Path, PathBuf};

use chschema_core::{
    DateTimeRepresentation, DecimalRepresentation, IdentifierCasing, Int64Representation,
};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "chschema")]
#[command(
    author,
    version,
    about = "Generate TypeScript interfaces, zod validators and JSON Schema from ClickHouse DDL"
)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate interfaces and/or JSON Schema from DDL files
    Generate {
        /// DDL files (supports glob patterns)
        files: Vec<PathBuf>,

        #[command(flatten)]
        mapping: MappingArgs,

        /// Which artifacts to produce
        #[arg(short, long, value_enum)]
        emit: Option<Emit>,

        /// Write interfaces to this file instead of stdout
        #[arg(long = "ts-out", value_name = "FILE")]
        ts_out: Option<PathBuf>,

        /// Write JSON Schema to this file instead of stdout
        #[arg(long = "json-schema-out", value_name = "FILE")]
        json_schema_out: Option<PathBuf>,

        /// Emit a zod schema after each interface
        #[arg(long)]
        validators: bool,
    },

    /// List tables with their resolved columns
    Tables {
        /// DDL files (supports glob patterns)
        files: Vec<PathBuf>,

        #[command(flatten)]
        mapping: MappingArgs,

        /// Output format
        #[arg(short, long, default_value = "human", value_enum)]
        format: OutputFormat,
    },

    /// Parse DDL and print the declarations as JSON (for debugging)
    Parse {
        /// DDL file to parse
        file: PathBuf,
    },
}

/// Options shared by every command that resolves types
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct MappingArgs {
    /// Configuration file (defaults to the nearest chschema.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Named bundle of representation options (default, strict, json-safe)
    #[arg(long)]
    pub preset: Option<String>,

    /// 64-bit integer representation (bigint, string)
    #[arg(long, value_name = "REPR")]
    pub int64: Option<Int64Representation>,

    /// Decimal representation (string, decimal)
    #[arg(long, value_name = "REPR")]
    pub decimal: Option<DecimalRepresentation>,

    /// Date and time representation (string, date)
    #[arg(long, value_name = "REPR")]
    pub datetime: Option<DateTimeRepresentation>,

    /// Column name casing (preserve, camel)
    #[arg(long)]
    pub casing: Option<IdentifierCasing>,

    /// Fail on types with no known representation
    #[arg(long)]
    pub fail_on_unknown_leaf: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum Emit {
    /// TypeScript interfaces (and zod schemas when enabled)
    Interfaces,
    /// JSON Schema documents
    JsonSchema,
    /// Both
    #[default]
    All,
}

impl Emit {
    /// Both artifacts on stdout would run together into one unusable stream
    pub fn check_destinations(
        self,
        ts_out: Option<&Path>,
        json_schema_out: Option<&Path>,
    ) -> Result<(), String> {
        if self == Emit::All && ts_out.is_none() && json_schema_out.is_none() {
            return Err(
                "--emit all needs --ts-out or --json-schema-out; only one artifact can go to stdout"
                    .to_string(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_all_needs_a_file_destination() {
        assert!(Emit::All.check_destinations(None, None).is_err());
        assert!(Emit::All
            .check_destinations(Some(Path::new("tables.ts")), None)
            .is_ok());
        assert!(Emit::Interfaces.check_destinations(None, None).is_ok());
        assert!(Emit::JsonSchema.check_destinations(None, None).is_ok());
    }

    #[test]
    fn test_generate_parses_mapping_flags() {
        let args = Args::parse_from([
            "chschema",
            "generate",
            "schema.sql",
            "--emit",
            "json-schema",
            "--int64",
            "string",
        ]);
        match args.command {
            Command::Generate { files, mapping, emit, .. } => {
                assert_eq!(files, vec![PathBuf::from("schema.sql")]);
                assert_eq!(emit, Some(Emit::JsonSchema));
                assert_eq!(mapping.int64, Some(Int64Representation::String));
            }
            _ => panic!("expected generate"),
        }
    }
}
