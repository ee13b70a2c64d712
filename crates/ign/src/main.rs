//! ign CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::input::VarArgs;

#[derive(Parser)]
#[command(name = "ign")]
#[command(version)]
#[command(about = "Generate projects from ign templates", long_about = None)]
struct Cli {
    /// Only report warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the directive structure of a template file
    Validate {
        /// Template file
        file: PathBuf,
    },

    /// List the variables a template file references
    Vars {
        /// Template file
        file: PathBuf,
    },

    /// Resolve a template file and write the result to stdout
    Render {
        /// Template file
        file: PathBuf,

        /// Template root for includes (defaults to the file's directory)
        #[arg(long)]
        root: Option<PathBuf>,

        #[command(flatten)]
        vars: VarArgs,

        /// Maximum include nesting depth
        #[arg(long, default_value_t = ign_template::DEFAULT_MAX_INCLUDE_DEPTH)]
        max_include_depth: usize,
    },

    /// Resolve directives in a relative path
    Filename {
        /// Path containing directives, `/`-separated
        path: String,

        #[command(flatten)]
        vars: VarArgs,
    },

    /// Generate a project from a template directory
    Generate {
        /// Template directory (may contain ign.json)
        template_dir: PathBuf,

        /// Output directory
        out_dir: PathBuf,

        #[command(flatten)]
        vars: VarArgs,

        /// Replace files that already exist in the output directory
        #[arg(long)]
        overwrite: bool,

        /// Maximum include nesting depth
        #[arg(long, default_value_t = ign_template::DEFAULT_MAX_INCLUDE_DEPTH)]
        max_include_depth: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.quiet { "warn" } else { "ign=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Validate { file } => commands::validate::execute(&file),
        Commands::Vars { file } => commands::vars::execute(&file),
        Commands::Render {
            file,
            root,
            vars,
            max_include_depth,
        } => commands::render::execute(commands::render::RenderArgs {
            file,
            root,
            vars,
            max_include_depth,
        }),
        Commands::Filename { path, vars } => commands::filename::execute(&path, &vars),
        Commands::Generate {
            template_dir,
            out_dir,
            vars,
            overwrite,
            max_include_depth,
        } => commands::generate::execute(commands::generate::GenerateArgs {
            template_dir,
            out_dir,
            vars,
            overwrite,
            max_include_depth,
        }),
    }
}
