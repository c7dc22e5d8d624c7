//! Configuration file handling

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chschema_core::{
    DateTimeRepresentation, DecimalRepresentation, IdentifierCasing, Int64Representation,
    ResolveOptions,
};
use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};

use crate::args::{Emit, MappingArgs};

pub const CONFIG_FILE_NAME: &str = "chschema.toml";

/// Configuration for chschema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// DDL file paths or glob patterns
    pub files: Vec<String>,

    /// Preset name (default, strict, json-safe)
    pub preset: Option<String>,

    /// 64-bit integer representation (bigint, string)
    pub int64: Option<String>,

    /// Decimal representation (string, decimal)
    pub decimal: Option<String>,

    /// Date and time representation (string, date)
    pub datetime: Option<String>,

    /// Column name casing (preserve, camel)
    pub casing: Option<String>,

    pub fail_on_unknown_leaf: Option<bool>,

    pub emit_validators: Option<bool>,

    pub output: OutputConfig,
}

/// Where generated artifacts are written; stdout when unset
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    pub typescript: Option<String>,
    pub json_schema: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        let config: Config = toml::from_str(&contents).into_diagnostic()?;
        Ok(config)
    }

    /// Try to find and load chschema.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let mut current_dir = std::env::current_dir().into_diagnostic()?;

        loop {
            let config_path = current_dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "using configuration file");
                return Ok(Some(Self::from_file(&config_path)?));
            }

            if !current_dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load the file named by `--config`, or the nearest chschema.toml
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => Ok(Self::find_and_load()?.unwrap_or_default()),
        }
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(mut self, files: &[PathBuf], mapping: &MappingArgs) -> Self {
        if !files.is_empty() {
            self.files = files.iter().map(|p| p.display().to_string()).collect();
        }
        if let Some(preset) = &mapping.preset {
            self.preset = Some(preset.clone());
        }
        if let Some(int64) = mapping.int64 {
            self.int64 = Some(int64.to_string());
        }
        if let Some(decimal) = mapping.decimal {
            self.decimal = Some(decimal.to_string());
        }
        if let Some(datetime) = mapping.datetime {
            self.datetime = Some(datetime.to_string());
        }
        if let Some(casing) = mapping.casing {
            self.casing = Some(casing.to_string());
        }
        if mapping.fail_on_unknown_leaf {
            self.fail_on_unknown_leaf = Some(true);
        }
        self
    }

    /// Resolver options: preset first, then every explicitly set value
    pub fn resolve_options(&self) -> Result<ResolveOptions> {
        let preset = match &self.preset {
            Some(name) => parse_value::<Preset>(name)?,
            None => Preset::Default,
        };
        tracing::debug!(%preset, "applying preset");
        let mut options = preset.options();

        if let Some(int64) = &self.int64 {
            options.int64 = parse_value::<Int64Representation>(int64)?;
        }
        if let Some(decimal) = &self.decimal {
            options.decimal = parse_value::<DecimalRepresentation>(decimal)?;
        }
        if let Some(datetime) = &self.datetime {
            options.datetime = parse_value::<DateTimeRepresentation>(datetime)?;
        }
        if let Some(casing) = &self.casing {
            options.casing = parse_value::<IdentifierCasing>(casing)?;
        }
        if let Some(fail) = self.fail_on_unknown_leaf {
            options.fail_on_unknown_leaf = fail;
        }
        Ok(options)
    }

    /// Which artifacts `generate` writes when `--emit` is not given.
    /// Both only when both have a file; stdout carries a single artifact.
    pub fn default_emit(&self) -> Emit {
        match (&self.output.typescript, &self.output.json_schema) {
            (Some(_), Some(_)) => Emit::All,
            (None, Some(_)) => Emit::JsonSchema,
            _ => Emit::Interfaces,
        }
    }
}

fn parse_value<T: FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse().map_err(|e: String| miette::miette!(e))
}

/// Named bundles of representation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// bigint, string decimals, string dates
    #[default]
    Default,
    /// Arbitrary-precision decimals, Date objects, unknown types rejected
    Strict,
    /// Only values that survive JSON round-trips: no bigint, no Date
    JsonSafe,
}

impl Preset {
    pub fn options(self) -> ResolveOptions {
        let mut options = ResolveOptions::default();
        match self {
            Preset::Default => {}
            Preset::Strict => {
                options.decimal = DecimalRepresentation::ArbitraryPrecision;
                options.datetime = DateTimeRepresentation::DateType;
                options.fail_on_unknown_leaf = true;
            }
            Preset::JsonSafe => {
                options.int64 = Int64Representation::String;
            }
        }
        options
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Preset::Default),
            "strict" => Ok(Preset::Strict),
            "json-safe" | "jsonsafe" | "json" => Ok(Preset::JsonSafe),
            _ => Err(format!(
                "Unknown preset: '{}'. Supported presets: default, strict, json-safe.",
                s
            )),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Default => write!(f, "default"),
            Preset::Strict => write!(f, "strict"),
            Preset::JsonSafe => write!(f, "json-safe"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_toml() {
        let config: Config = toml::from_str(
            r#"
            files = ["schema/*.sql"]
            preset = "json-safe"
            casing = "camel"
            emit-validators = true

            [output]
            typescript = "generated/tables.ts"
            "#,
        )
        .unwrap();

        assert_eq!(config.files, vec!["schema/*.sql"]);
        assert_eq!(config.emit_validators, Some(true));
        assert_eq!(config.default_emit(), Emit::Interfaces);

        let options = config.resolve_options().unwrap();
        assert_eq!(options.int64, Int64Representation::String);
        assert_eq!(options.casing, IdentifierCasing::Camel);
    }

    #[test]
    fn test_args_override_preset_and_file() {
        let config = Config {
            preset: Some("strict".to_string()),
            datetime: Some("string".to_string()),
            ..Default::default()
        };
        let args = MappingArgs {
            int64: Some(Int64Representation::String),
            ..Default::default()
        };
        let options = config
            .merge_with_args(&[], &args)
            .resolve_options()
            .unwrap();

        assert_eq!(options.int64, Int64Representation::String);
        assert_eq!(options.decimal, DecimalRepresentation::ArbitraryPrecision);
        assert_eq!(options.datetime, DateTimeRepresentation::String);
        assert!(options.fail_on_unknown_leaf);
    }

    #[test]
    fn test_default_emit_follows_configured_outputs() {
        let mut config = Config::default();
        assert_eq!(config.default_emit(), Emit::Interfaces);

        config.output.json_schema = Some("schema.json".to_string());
        assert_eq!(config.default_emit(), Emit::JsonSchema);

        config.output.typescript = Some("tables.ts".to_string());
        assert_eq!(config.default_emit(), Emit::All);
    }

    #[test]
    fn test_unknown_values_are_reported() {
        let config = Config {
            preset: Some("lenient".to_string()),
            ..Default::default()
        };
        let err = config.resolve_options().unwrap_err();
        assert!(err.to_string().contains("Unknown preset: 'lenient'"));
    }
}
