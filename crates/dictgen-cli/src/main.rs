//! dictgen CLI
//!
//! Command-line interface for the dictgen macro expansion engine

mod commands;
mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use dictgen_core::{FallbackPolicy, init_tracing};
use std::io;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "dictgen")]
#[command(about = "dictgen: expand the markup macros of dictionary sources")]
#[command(version = dictgen_core::VERSION)]
#[command(
    long_about = "dictgen reads a TeX-flavoured dictionary source, expands the macros in every entry\n\
and writes renderer-agnostic output trees.\n\
\n\
Examples:\n  \
dictgen expand words.dict               # Expand and print entries\n  \
dictgen expand words.dict -f json -o out.json\n  \
dictgen expand - --target json < words.dict\n  \
dictgen macros --detailed               # List registered macros\n  \
dictgen config init                     # Create a configuration file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (dictgen.toml/dictgen.yaml/dictgen.json)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel expansion
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,

    /// Generate shell completion script
    #[arg(
        long,
        value_enum,
        help = "Generate completion script for specified shell"
    )]
    generate_completion: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand every entry of a dictionary source
    Expand {
        /// Dictionary source, or '-' for stdin
        #[arg(help = "Dictionary source file ('-' reads stdin)")]
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "human", help = "Output format for entries")]
        format: OutputFormat,

        /// Write output to a file instead of stdout
        #[arg(short, long, help = "Output file (default: stdout)")]
        output: Option<PathBuf>,

        /// Backend whose `$backend` sections are kept
        #[arg(long, help = "Backend name overriding engine.target")]
        target: Option<String>,

        /// Maximum macro nesting depth
        #[arg(long, help = "Maximum nesting depth overriding engine.maxDepth")]
        max_depth: Option<usize>,

        /// Policy for macros without a handler
        #[arg(long, help = "Fallback policy overriding fallback.policy")]
        fallback: Option<FallbackArg>,

        /// Treat source diagnostics as failures
        #[arg(long, help = "Exit with non-zero code on source diagnostics too")]
        strict: bool,
    },

    /// List the macros available to dictionary sources
    Macros {
        /// Show where each macro comes from
        #[arg(long, help = "Show the origin and definition of each macro")]
        detailed: bool,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version {
        /// Show detailed version information
        #[arg(long, help = "Show detailed version and build information")]
        detailed: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize a new configuration file
    Init {
        /// Configuration file format
        #[arg(long, default_value = "toml", help = "Configuration file format")]
        format: ConfigFileFormat,

        /// Overwrite existing configuration file
        #[arg(long, help = "Overwrite existing configuration file")]
        force: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(help = "Path to configuration file (default: search for dictgen.*)")]
        path: Option<PathBuf>,
    },

    /// Show the effective configuration
    Show,

    /// Print the JSON Schema of the configuration
    Schema {
        /// Write the schema to a file instead of stdout
        #[arg(short, long, help = "Output file (default: stdout)")]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable entries with colors
    Human,
    /// JSON report with the full output trees
    Json,
    /// One flattened line per entry
    Compact,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FallbackArg {
    /// Wrap unknown macros in configured markup
    Wrap,
    /// Echo unknown macros back as source text
    Echo,
    /// Fail the entry
    Reject,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Wrap => FallbackPolicy::Wrap,
            FallbackArg::Echo => FallbackPolicy::Echo,
            FallbackArg::Reject => FallbackPolicy::Reject,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConfigFileFormat {
    /// dictgen.toml
    Toml,
    /// dictgen.yaml
    Yaml,
    /// dictgen.json
    Json,
}

fn main() {
    let cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.generate_completion {
        generate_completion_script(shell);
        return;
    }

    let use_colors = !cli.no_color && std::env::var("NO_COLOR").is_err();
    colored::control::set_override(use_colors);

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "dictgen=error",
        1 => "dictgen=warn",
        2 => "dictgen=info",
        3 => "dictgen=debug",
        _ => "dictgen=trace",
    };
    // SAFETY: no other threads exist yet
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    init_tracing();

    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        error!("Failed to set thread pool size: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run_command(cli) {
        error!("dictgen failed: {:#}", e);
        std::process::exit(1);
    }
}

fn generate_completion_script(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Expand {
            input,
            format,
            output,
            target,
            max_depth,
            fallback,
            strict,
        }) => commands::expand::expand_command(
            commands::expand::ExpandArgs {
                input,
                format,
                output,
                target,
                max_depth,
                fallback: fallback.map(FallbackPolicy::from),
                strict,
            },
            cli.config,
        ),

        Some(Commands::Macros { detailed }) => commands::macros_command(detailed, cli.config),

        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { format, force } => commands::config::init_command(format, force),
            ConfigAction::Validate { path } => commands::config::validate_command(path),
            ConfigAction::Show => commands::config::show_command(cli.config),
            ConfigAction::Schema { output } => commands::config::schema_command(output),
        },

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("dictgen {}", dictgen_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
                println!("  Default max depth: {}", dictgen_core::expand::DEFAULT_MAX_DEPTH);
            } else {
                println!("{}", dictgen_core::VERSION);
            }
            Ok(())
        }

        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
