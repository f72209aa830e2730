//! Command-line interface for prompt-highlight
//! Highlights a prompt file (or stdin) and prints it as markup, terminal colors or data.
//!
//! Usage:
//!   prompt-highlight `[<path>]` [--format `<format>`] [--config `<file>`]   - Highlight a prompt
//!   prompt-highlight --list-formats                                     - List output formats

use clap::{Arg, ArgAction, Command};
use prompt_highlight::highlight::config::{parse_color_list, HighlightConfig, Loader};
use prompt_highlight::highlight::error::{FormatError, HighlightError};
use prompt_highlight::highlight::formats::{render_reader, OutputFormat};
use std::fs::File;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("prompt-highlight")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Highlight weight groups, LoRA tags and embeddings in prompt text")
        .arg(
            Arg::new("path")
                .help("Prompt file to read; stdin when absent or '-'")
                .index(1),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (see --list-formats)")
                .default_value("markup"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .help("Highlight type: 'strength' or 'nesting'"),
        )
        .arg(
            Arg::new("colors")
                .long("colors")
                .help("Palette, one color per line"),
        )
        .arg(
            Arg::new("loras-dir")
                .long("loras-dir")
                .help("Folder whose files are the known LoRA names"),
        )
        .arg(
            Arg::new("embeddings-dir")
                .long("embeddings-dir")
                .help("Folder whose files are the known embedding names"),
        )
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available output formats")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("list-formats") {
        handle_list_formats_command();
        return;
    }

    let config = load_config(&matches).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });
    let path = matches.get_one::<String>("path").map(String::as_str);
    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("markup");
    handle_highlight_command(&config, path, format);
}

fn load_config(matches: &clap::ArgMatches) -> Result<HighlightConfig, config::ConfigError> {
    let mut loader = Loader::new();
    if let Some(file) = matches.get_one::<String>("config") {
        loader = loader.with_file(file);
    }
    if let Some(mode) = matches.get_one::<String>("mode") {
        loader = loader.set_override("highlight.highlight_type", mode.as_str())?;
    }
    if let Some(colors) = matches.get_one::<String>("colors") {
        loader = loader.set_override("highlight.colors", parse_color_list(colors))?;
    }
    if let Some(dir) = matches.get_one::<String>("loras-dir") {
        loader = loader.set_override("names.loras_dir", dir.as_str())?;
    }
    if let Some(dir) = matches.get_one::<String>("embeddings-dir") {
        loader = loader.set_override("names.embeddings_dir", dir.as_str())?;
    }
    loader.build()
}

/// Handle the highlight command
fn handle_highlight_command(config: &HighlightConfig, path: Option<&str>, format: &str) {
    let output = highlight_input(config, path, format).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        if let HighlightError::Format(FormatError::UnknownFormat(_)) = e {
            eprintln!("\nAvailable formats:");
            for format in OutputFormat::ALL {
                eprintln!("  {} - {}", format, format.description());
            }
        }
        std::process::exit(1);
    });

    print!("{}", output);
}

fn highlight_input(
    config: &HighlightConfig,
    path: Option<&str>,
    format: &str,
) -> Result<String, HighlightError> {
    let resources = config.resources()?;
    match path {
        None | Some("-") => render_reader(std::io::stdin().lock(), &resources, format),
        Some(path) => render_reader(File::open(path)?, &resources, format),
    }
}

/// Handle the list-formats command
fn handle_list_formats_command() {
    println!("Available output formats:\n");

    for format in OutputFormat::ALL {
        println!("  {}", format.name());
        println!("    {}", format.description());
        println!();
    }
}
