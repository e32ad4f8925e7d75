#![forbid(unsafe_code)]

//! Command-line argument parsing for the `frep` harness.
//!
//! Parses args manually, like the rest of the workspace's binaries.
//! Supports environment variable overrides via the `FREP_*` prefix.

use std::env;
use std::path::PathBuf;
use std::process;

use frep_core::{AddTraversal, RepeaterConfig};

use crate::error::HarnessError;
use crate::ops::Op;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
frep: drive a repeater tree over JSON markup and model files

USAGE:
    frep --markup=FILE [OPTIONS]

OPTIONS:
    --markup=FILE            Markup document (JSON)
    --model=FILE             Model file (JSON); created on --save if missing
    --no-model               Run without a model; structure only
    --op=OP                  Apply an operation (repeatable, in order)
    --add-traversal=DIR      Rename order after add: 'forward' (default) or 'reverse'
    --keep-last-on-remove    Do not clear the last sibling before a removal
    --no-populate-layout     Do not notify layout after population
    --dump=WHAT              What to print: tree, surface, model or all (default)
    --json                   Print the report as JSON
    --save                   Write the model back to --model
    --help, -h               Show this help message
    --version, -V            Show version

OPERATIONS:
    add:PATH                 Click add on the instance at PATH, e.g. item[0]
    remove:PATH              Click remove on the instance at PATH
    set:PATH:FIELD=VALUE     Type VALUE into FIELD of the instance at PATH

ENVIRONMENT VARIABLES:
    FREP_MARKUP              Override --markup
    FREP_MODEL               Override --model
    FREP_ADD_TRAVERSAL       Override --add-traversal
    FREP_KEEP_LAST           Set to 1 for --keep-last-on-remove
    FREP_DUMP                Override --dump
    FREP_LOG                 Log filter (e.g. 'frep_core=debug'), written to stderr";

/// Report sections to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dump {
    Tree,
    Surface,
    Model,
    #[default]
    All,
}

impl Dump {
    /// Parse `tree` / `surface` / `model` / `all`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" => Some(Dump::Tree),
            "surface" => Some(Dump::Surface),
            "model" => Some(Dump::Model),
            "all" => Some(Dump::All),
            _ => None,
        }
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Markup document path.
    pub markup: Option<PathBuf>,
    /// Model file path.
    pub model: Option<PathBuf>,
    /// Run without any model.
    pub no_model: bool,
    /// Operations, in order.
    pub ops: Vec<Op>,
    /// Engine configuration.
    pub config: RepeaterConfig,
    /// What to print.
    pub dump: Dump,
    /// Print JSON instead of text.
    pub json: bool,
    /// Save the model file afterwards.
    pub save: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            markup: None,
            model: None,
            no_model: false,
            ops: Vec::new(),
            config: RepeaterConfig::default(),
            dump: Dump::All,
            json: false,
            save: false,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse process arguments and environment, exiting on `--help`,
    /// `--version` or a usage error.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Invocation::Run(opts)) => opts,
            Ok(Invocation::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Invocation::Version) => {
                println!("frep {VERSION}");
                process::exit(0);
            }
            Err(e) => {
                eprintln!("{e}");
                eprintln!("Run with --help for usage information.");
                process::exit(2);
            }
        }
    }

    /// Parse `args` with environment lookups through `var`.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse_from<I, F>(args: I, var: F) -> Result<Invocation, HarnessError>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if let Some(val) = var("FREP_MARKUP") {
            opts.markup = Some(val.into());
        }
        if let Some(val) = var("FREP_MODEL") {
            opts.model = Some(val.into());
        }
        if let Some(val) = var("FREP_ADD_TRAVERSAL")
            && let Some(traversal) = AddTraversal::parse(&val)
        {
            opts.config.add_traversal = traversal;
        }
        if let Some(val) = var("FREP_KEEP_LAST")
            && matches!(val.trim(), "1" | "true" | "yes")
        {
            opts.config.clear_last_on_remove = false;
        }
        if let Some(val) = var("FREP_DUMP")
            && let Some(dump) = Dump::parse(&val)
        {
            opts.dump = dump;
        }

        // Parse command-line args (override env vars)
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Invocation::Help),
                "--version" | "-V" => return Ok(Invocation::Version),
                "--no-model" => opts.no_model = true,
                "--keep-last-on-remove" => opts.config.clear_last_on_remove = false,
                "--no-populate-layout" => opts.config.notify_layout_on_populate = false,
                "--json" => opts.json = true,
                "--save" => opts.save = true,
                other => {
                    if let Some(val) = other.strip_prefix("--markup=") {
                        opts.markup = Some(val.into());
                    } else if let Some(val) = other.strip_prefix("--model=") {
                        opts.model = Some(val.into());
                    } else if let Some(val) = other.strip_prefix("--op=") {
                        opts.ops.push(Op::parse(val)?);
                    } else if let Some(val) = other.strip_prefix("--add-traversal=") {
                        opts.config.add_traversal = AddTraversal::parse(val).ok_or_else(|| {
                            HarnessError::Usage(format!("Invalid --add-traversal value: {val}"))
                        })?;
                    } else if let Some(val) = other.strip_prefix("--dump=") {
                        opts.dump = Dump::parse(val).ok_or_else(|| {
                            HarnessError::Usage(format!("Invalid --dump value: {val}"))
                        })?;
                    } else {
                        return Err(HarnessError::Usage(format!("Unknown argument: {other}")));
                    }
                }
            }
        }

        if opts.markup.is_none() {
            return Err(HarnessError::Usage("Missing --markup=FILE".into()));
        }
        if opts.save && (opts.no_model || opts.model.is_none()) {
            return Err(HarnessError::Usage("--save needs --model=FILE".into()));
        }
        Ok(Invocation::Run(opts))
    }
}
