//! `partpick config` command - Configuration management
//!
//! Provides commands to view and modify partpick configuration.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path(PathArgs),

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only the local (working directory) config file
    #[arg(long = "local-only")]
    pub local_only: bool,

    /// Show only the global (user) config file
    #[arg(long = "global-only")]
    pub global_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., delay_secs, lcsc.timeout_secs)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of the local config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of the local config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Show only the local config path
    #[arg(long = "local-only")]
    pub local_only: bool,

    /// Show only the global config path
    #[arg(long = "global-only")]
    pub global_only: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("source", "BOM workbook used when `run` is given no file"),
    ("output", "CSV file receiving the selected parts"),
    ("unavailable", "CSV file receiving families with no buyable part"),
    ("sheet_start", "First sheet to process (zero-based, default 1)"),
    ("sheet_end", "Sheet to stop before (default: all sheets)"),
    ("delay_secs", "Seconds between supplier queries (default 1)"),
    ("catalog", "Offline YAML catalog used instead of LCSC"),
    ("verbose", "Print per-candidate details during `run`"),
    ("lcsc.base_url", "LCSC API base URL"),
    ("lcsc.timeout_secs", "HTTP timeout per request"),
    ("lcsc.user_agent", "User agent sent to LCSC"),
    (
        "lcsc.max_consecutive_failures",
        "Connection failures in a row before the run stops",
    ),
];

/// Keys stored as text even when the value looks like a number
const TEXT_KEYS: &[&str] = &[
    "source",
    "output",
    "unavailable",
    "catalog",
    "lcsc.base_url",
    "lcsc.user_agent",
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path(args) => run_path(args),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    if args.local_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --local-only and --global-only"
        ));
    }

    let config = Config::load().map_err(|e| miette::miette!("{}", e))?;

    // If a specific key is requested, show just that value
    if let Some(key) = &args.key {
        if !is_valid_key(key) {
            return Err(unknown_key(key));
        }
        return match get_config_value(&config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if args.local_only {
        return show_config_file("Local config:", &Config::local_config_path());
    }
    if args.global_only {
        return show_config_file("Global config:", &get_global_config_path()?);
    }

    if global.format == OutputFormat::Json {
        let values: serde_json::Map<String, serde_json::Value> = VALID_KEYS
            .iter()
            .map(|(key, _)| {
                let value = get_config_value(&config, key)
                    .map(serde_json::Value::String)
                    .unwrap_or(serde_json::Value::Null);
                (key.to_string(), value)
            })
            .collect();
        let json = serde_json::to_string_pretty(&values).into_diagnostic()?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in VALID_KEYS {
        print_config_value(key, get_config_value(&config, key).as_deref());
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Command-line flags");
    println!("  2. Environment variables (PARTPICK_SOURCE, PARTPICK_OUTPUT, PARTPICK_UNAVAILABLE, PARTPICK_DELAY, PARTPICK_CATALOG)");
    println!("  3. Local config (./{})", crate::core::config::LOCAL_CONFIG_FILE);
    println!("  4. Global config (~/.config/partpick/config.yaml)");

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    if !is_valid_key(&args.key) {
        return Err(unknown_key(&args.key));
    }

    let config_path = target_config_path(args.global)?;
    let mut config_map = read_config_map(&config_path)?;

    let value = if TEXT_KEYS.contains(&args.key.as_str()) {
        serde_yml::Value::String(args.value.clone())
    } else {
        parse_scalar(&args.value)
    };
    set_nested_value(&mut config_map, &args.key, value)?;

    // Refuse to write a file the loader would reject
    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    serde_yml::from_str::<Config>(&yaml).map_err(|e| {
        miette::miette!("Invalid value '{}' for {}: {}", args.value, args.key, e)
    })?;

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }
    }
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope_name(args.global)
    );

    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    let config_path = target_config_path(args.global)?;

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_config_map(&config_path)?;

    if !unset_nested_value(&mut config_map, &args.key) {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope_name(args.global)
    );

    Ok(())
}

fn run_path(args: PathArgs) -> Result<()> {
    if args.local_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --local-only and --global-only"
        ));
    }

    if args.local_only {
        println!("{}", Config::local_config_path().display());
    } else if args.global_only {
        println!("{}", get_global_config_path()?.display());
    } else {
        let global_path = get_global_config_path()?;
        let local_path = Config::local_config_path();

        println!("{}", style("Configuration file paths:").bold());
        println!();
        println!("  {} {}", style("Global:").cyan(), global_path.display());
        print_exists(&global_path, 9);
        println!();
        println!("  {} {}", style("Local:").cyan(), local_path.display());
        print_exists(&local_path, 8);
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<30} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'partpick config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn is_valid_key(key: &str) -> bool {
    VALID_KEYS.iter().any(|(k, _)| *k == key)
}

fn unknown_key(key: &str) -> miette::Report {
    miette::miette!(
        "Unknown configuration key '{}'. Run 'partpick config keys' to list them.",
        key
    )
}

fn scope_name(global: bool) -> &'static str {
    if global {
        "global"
    } else {
        "local"
    }
}

fn get_global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn target_config_path(global: bool) -> Result<PathBuf> {
    if global {
        get_global_config_path()
    } else {
        Ok(Config::local_config_path())
    }
}

/// Load a config file as a raw YAML mapping; a missing or empty file is an empty mapping
fn read_config_map(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value = serde_yml::from_str(&content)
        .map_err(|e| miette::miette!("Invalid config file {}: {}", path.display(), e))?;
    if parsed.is_null() {
        Ok(serde_yml::Value::Mapping(Default::default()))
    } else {
        Ok(parsed)
    }
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
    match key {
        "source" => path(&config.source),
        "output" => path(&config.output),
        "unavailable" => path(&config.unavailable),
        "sheet_start" => config.sheet_start.map(|v| v.to_string()),
        "sheet_end" => config.sheet_end.map(|v| v.to_string()),
        "delay_secs" => config.delay_secs.map(|v| v.to_string()),
        "catalog" => path(&config.catalog),
        "verbose" => config.verbose.map(|v| v.to_string()),
        "lcsc.base_url" => config.lcsc.base_url.clone(),
        "lcsc.timeout_secs" => config.lcsc.timeout_secs.map(|v| v.to_string()),
        "lcsc.user_agent" => config.lcsc.user_agent.clone(),
        "lcsc.max_consecutive_failures" => {
            config.lcsc.max_consecutive_failures.map(|v| v.to_string())
        }
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

fn print_exists(path: &Path, indent: usize) {
    let marker = if path.exists() {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    };
    println!("{:indent$}{}", "", marker, indent = indent);
}

fn show_config_file(title: &str, path: &Path) -> Result<()> {
    println!("{} {}", style(title).bold(), style(path.display()).dim());
    println!();

    if path.exists() {
        let content = fs::read_to_string(path).into_diagnostic()?;
        print!("{}", content);
    } else {
        println!("{}", style("(not created)").dim());
    }

    Ok(())
}

/// Interpret a command-line value as a YAML scalar ("3" is a number, "true" a bool)
fn parse_scalar(value: &str) -> serde_yml::Value {
    match serde_yml::from_str::<serde_yml::Value>(value) {
        Ok(v @ (serde_yml::Value::Bool(_) | serde_yml::Value::Number(_))) => v,
        _ => serde_yml::Value::String(value.to_string()),
    }
}

fn set_nested_value(root: &mut serde_yml::Value, key: &str, value: serde_yml::Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| miette::miette!("Empty configuration key"))?;

    let mut current = root;
    for part in parents {
        let serde_yml::Value::Mapping(map) = current else {
            return Err(miette::miette!("'{}' is not a section in the config file", part));
        };
        let key = serde_yml::Value::String(part.to_string());
        if !map.contains_key(&key) {
            map.insert(key.clone(), serde_yml::Value::Mapping(Default::default()));
        }
        current = map
            .get_mut(&key)
            .ok_or_else(|| miette::miette!("Could not create section '{}'", part))?;
    }

    match current {
        serde_yml::Value::Mapping(map) => {
            map.insert(serde_yml::Value::String(last.to_string()), value);
            Ok(())
        }
        _ => Err(miette::miette!("Cannot set '{}': parent is not a section", key)),
    }
}

fn unset_nested_value(root: &mut serde_yml::Value, key: &str) -> bool {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        return false;
    };

    let mut current = root;
    for part in parents {
        let serde_yml::Value::Mapping(map) = current else {
            return false;
        };
        match map.get_mut(serde_yml::Value::String(part.to_string())) {
            Some(next) => current = next,
            None => return false,
        }
    }

    match current {
        serde_yml::Value::Mapping(map) => map
            .remove(serde_yml::Value::String(last.to_string()))
            .is_some(),
        _ => false,
    }
}
