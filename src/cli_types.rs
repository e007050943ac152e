use clap::Parser;
use eredmel_lib::config::IndentStyle;
use eredmel_lib::diagnostics::Severity;
use eredmel_lib::output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "eredmel", author, version, about, long_about = None)]
pub struct Cli {
    /// Files or directories to preprocess (directories are searched for *.edmh files)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Directory searched for included files, before the including file's own directory
    #[arg(short = 'L', long = "lib-dir", value_name = "DIR")]
    pub lib_dirs: Vec<PathBuf>,

    /// Directive prefix for every root file (session scope)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Indentation of the written output
    #[arg(long, value_enum)]
    pub indent: Option<IndentStyle>,

    /// Spaces per indentation level when writing with --indent spaces
    #[arg(long, value_name = "N")]
    pub output_tabwidth: Option<usize>,

    /// Write <stem>.edm files into this directory instead of printing to stdout
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stop after resolving includes, leaving replace directives untouched
    #[arg(long)]
    pub no_replace: bool,

    /// Output format for diagnostics: text, concise, json, json-lines
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub output_format: OutputFormat,

    /// Abort on the first diagnostic at or above this severity (debug, low, med, high, fatal)
    #[arg(long, value_name = "SEVERITY")]
    pub abort_on: Option<Severity>,

    /// Configuration file path (default: discover .eredmel.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Ignore any .eredmel.toml
    #[arg(long, conflicts_with = "config")]
    pub no_config: bool,

    /// Only report HIGH and FATAL diagnostics
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
