use anyhow::{Context, bail};
use clap::Parser;
use colored::*;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use eredmel_lib::config::{ConfigSetting, IndentStyle, ProjectConfig};
use eredmel_lib::diagnostics::Severity;
use eredmel_lib::document::{Document, Normalized};
use eredmel_lib::exit_codes;
use eredmel_lib::file_processor::{discover_files, output_path};
use eredmel_lib::output::WriterSink;
use eredmel_lib::{load_files, preprocess_files};

mod cli_types;

use cli_types::Cli;

/// Settings after merging the command line over the project file.
struct RunSettings {
    search_dirs: Vec<PathBuf>,
    indent: IndentStyle,
    output_tabwidth: usize,
}

fn init_logging(cli: &Cli) {
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn render(document: &Document<Normalized>, settings: &RunSettings) -> String {
    match settings.indent {
        IndentStyle::Tabs => document.render_with_tabs(),
        IndentStyle::Spaces => document.render_with_spaces(settings.output_tabwidth),
    }
}

fn write_outputs(
    roots: &[PathBuf],
    documents: &[Document<Normalized>],
    output_dir: Option<&Path>,
    settings: &RunSettings,
) -> anyhow::Result<()> {
    match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory {}", dir.display()))?;
            for (root, document) in roots.iter().zip(documents) {
                let target = output_path(root, dir);
                log::debug!("[eredmel] Writing {}", target.display());
                fs::write(&target, render(document, settings))
                    .with_context(|| format!("Failed to write {}", target.display()))?;
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            for document in documents {
                stdout
                    .write_all(render(document, settings).as_bytes())
                    .context("Failed to write to stdout")?;
            }
            stdout.flush().context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let project = if cli.no_config {
        ProjectConfig::default()
    } else {
        ProjectConfig::load(cli.config.as_deref())?
    };

    let mut config = project.base_configuration();
    if let Some(prefix) = &cli.prefix
        && !config.set(ConfigSetting::Prefix, prefix.as_str())
    {
        bail!("Invalid prefix '{prefix}': a prefix cannot contain whitespace");
    }

    let settings = RunSettings {
        search_dirs: cli.lib_dirs.iter().chain(&project.global.lib_dirs).cloned().collect(),
        indent: cli.indent.unwrap_or(project.global.indent),
        output_tabwidth: cli.output_tabwidth.unwrap_or(project.global.output_tabwidth),
    };
    if settings.output_tabwidth == 0 {
        bail!("--output-tabwidth must be at least 1");
    }

    let roots = discover_files(&cli.paths)?;
    if roots.is_empty() {
        if !cli.quiet {
            eprintln!("No .edmh files found");
        }
        return Ok(exit_codes::SUCCESS);
    }
    log::debug!("[eredmel] Preprocessing {} files", roots.len());

    let use_colors = !cli.no_color && io::stderr().is_terminal();
    let min_severity = if cli.quiet { Severity::High } else { Severity::Debug };
    let mut sink = WriterSink::new(io::stderr().lock(), cli.output_format.create_formatter(use_colors))
        .with_min_severity(min_severity)
        .stopping_at(cli.abort_on);

    let result = if cli.no_replace {
        load_files(&roots, &settings.search_dirs, &config, &mut sink)
    } else {
        preprocess_files(&roots, &settings.search_dirs, &config, &mut sink)
    };
    sink.finish().context("Failed to write diagnostics")?;

    match result {
        Ok(documents) => {
            write_outputs(&roots, &documents, cli.output_dir.as_deref(), &settings)?;
            Ok(exit_codes::SUCCESS)
        }
        Err(aborted) => {
            if !cli.quiet {
                eprintln!("{}: {aborted}", "Aborted".red().bold());
            }
            Ok(exit_codes::ABORTED)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(&cli) {
        Ok(exit_codes::SUCCESS) => exit_codes::exit::success(),
        Ok(_) => exit_codes::exit::aborted(),
        Err(e) => {
            eprintln!("{}: {e:#}", "Error".red().bold());
            exit_codes::exit::tool_error();
        }
    }
}
