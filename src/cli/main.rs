use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use exif_tree::codec::ContainerCodec;
use exif_tree::config;
use exif_tree::node::MetadataView;
use exif_tree::pipeline::{self, Action, Edit};
use exif_tree::value::Value;

#[derive(Parser, Debug)]
#[command(
    name = "exif-tree",
    version,
    about = "Read, edit and strip EXIF, IPTC, GPS and maker metadata in image files"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Display all metadata and exit
    #[arg(long)]
    show: bool,

    /// Set a value by key path, e.g. --set '{Exif}.ISOSpeedRatings=[200]' (null clears)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<Edit>,

    /// Remove all metadata except the orientation (or the configured keep-list)
    #[arg(long)]
    strip: bool,

    /// Preview changes without writing to files
    #[arg(long)]
    dry_run: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.output.dry_run = true;
    }

    let images = pipeline::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }
    let codec = ContainerCodec::new();

    // Handle --show
    if cli.show || (!cli.strip && cli.set.is_empty()) {
        return show_all(&codec, &images, &config, cli.json);
    }

    let action = match (cli.strip, cli.set.is_empty()) {
        (true, true) => Action::Strip,
        (false, false) => Action::Edit(cli.set),
        _ => anyhow::bail!("--strip and --set cannot be combined"),
    };

    log::info!("Found {} image(s) to process", images.len());
    if config.output.dry_run {
        log::info!("DRY RUN: no files will be modified");
    }

    let mut results = Vec::new();
    let total = images.len();

    for (i, image_path) in images.iter().enumerate() {
        log::info!(
            "[{}/{}] Processing: {}",
            i + 1,
            total,
            image_path.display()
        );

        let result = pipeline::process_image(&codec, image_path, &action, &config);

        if let Some(ref err) = result.error {
            log::error!("  Error: {err}");
        } else if result.changed_key_paths.is_empty() {
            log::info!("  Nothing to change");
        } else if !cli.json {
            print_changes(&result);
        }

        results.push(result);
    }

    // JSON output
    if cli.json {
        let json_results: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "path": r.path.display().to_string(),
                    "format": r.format.map(|f| f.type_identifier()),
                    "changed_key_paths": r.changed_key_paths,
                    "written": r.written,
                    "backup_path": r.backup_path.as_ref().map(|p| p.display().to_string()),
                    "error": r.error,
                })
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&json_results)?);
    }

    // Summary
    let success = results.iter().filter(|r| r.error.is_none()).count();
    let failed = results.iter().filter(|r| r.error.is_some()).count();
    log::info!("Done: {success} succeeded, {failed} failed out of {total} images");

    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (key column width + " : " = 31 chars + 2 leading spaces).
const INDENT: &str = "                                 ";

fn show_all(
    codec: &ContainerCodec,
    images: &[PathBuf],
    config: &config::Config,
    json: bool,
) -> Result<()> {
    let mut dumps = serde_json::Map::new();
    for image_path in images {
        let meta = match pipeline::read_metadata(codec, image_path, config) {
            Ok(meta) => meta,
            Err(e) => {
                log::error!("{e:#}");
                continue;
            }
        };
        if json {
            dumps.insert(
                image_path.display().to_string(),
                serde_json::to_value(meta.node().current())?,
            );
        } else {
            print_metadata(image_path, &meta);
        }
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&dumps)?);
    }
    Ok(())
}

/// Print the full tree for a file: top-level values, then one section per
/// namespace.
fn print_metadata(path: &Path, meta: &exif_tree::metadata::Metadata) {
    let current = meta.node().current();

    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(78));

    let top_level: Vec<(&String, &Value)> = current
        .iter()
        .filter(|(_, v)| v.as_dictionary().is_none())
        .collect();
    if !top_level.is_empty() {
        println!("  {BOLD}Image{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(76));
        for (key, value) in top_level {
            print_row(key, &value.to_string());
        }
        println!();
    }

    for (key, value) in current {
        let Some(section) = value.as_dictionary() else {
            continue;
        };
        println!("  {BOLD}{key}{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(76));
        for path in exif_tree::keypath::all_key_paths(section) {
            if let Some(v) = exif_tree::keypath::lookup(section, &path) {
                if v.as_dictionary().is_none() {
                    print_row(&path, &v.to_string());
                }
            }
        }
        println!();
    }

    if current.is_empty() {
        println!("  {DIM}(no metadata found){RESET}");
        println!();
    }
}

/// Print the key paths a run changed (or would change).
fn print_changes(result: &pipeline::ProcessResult) {
    let verb = if result.written { "Changed" } else { "Would change" };
    println!("  {BOLD}{verb}:{RESET}");
    for path in &result.changed_key_paths {
        println!("  {GREEN}{path}{RESET}");
    }
    if let Some(ref backup) = result.backup_path {
        println!("  {DIM}Backup: {}{RESET}", backup.display());
    }
}

/// Print a single row in the metadata table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<28}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
