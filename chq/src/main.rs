//! chq: command line front end for building and inspecting check queries.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "chq")]
#[command(about = "Check Query - parse, build and pretty-print threshold check queries")]
#[command(version)]
struct Cli {
    /// Config file (default: $CHECKQ_CONFIG or the platform config dir)
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a check query and print its fields
    #[command(visible_alias = "p")]
    Parse {
        /// Query string (e.g., /check?metric=a&from=1h&until=0s&limit=avg<5)
        query: String,

        /// Output format: table, json
        #[arg(short = 'f', long = "format", default_value = "table")]
        format: String,
    },

    /// Encode a JSON query record into the canonical query string
    #[command(visible_alias = "s")]
    Serialize {
        /// File containing the JSON record (reads stdin if not provided)
        file: Option<String>,

        /// Prefix the check service address from config
        #[arg(short = 'a', long = "absolute")]
        absolute: bool,
    },

    /// Re-encode a query in canonical field order and encoding
    #[command(visible_alias = "n")]
    Normalize {
        /// Query string
        query: String,
    },

    /// Pretty-print a flat metric expression
    Indent {
        /// Metric expression (reads stdin if not provided)
        expr: Option<String>,

        /// Reject expressions with unbalanced parentheses
        #[arg(long = "strict")]
        strict: bool,
    },

    /// Flatten a pretty-printed metric expression
    Dedent {
        /// Metric expression (reads stdin if not provided)
        expr: Option<String>,
    },

    /// Print the Graphite render URL for a query
    RenderUrl {
        /// Query string
        query: String,

        /// Print a PNG chart URL instead of the JSON data URL
        #[arg(long = "chart")]
        chart: bool,
    },

    /// Evaluate a query against a saved Graphite JSON response
    Eval {
        /// Query string
        query: String,

        /// File containing the render response ("-" for stdin)
        data: String,

        /// Output format: text, json
        #[arg(short = 'f', long = "format", default_value = "text")]
        format: String,
    },
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Parse { query, format } => commands::parse(&query, &format),
        Commands::Serialize { file, absolute } => {
            commands::serialize(file.as_deref(), absolute, config)
        }
        Commands::Normalize { query } => commands::normalize(&query),
        Commands::Indent { expr, strict } => commands::indent(expr.as_deref(), strict),
        Commands::Dedent { expr } => commands::dedent(expr.as_deref()),
        Commands::RenderUrl { query, chart } => commands::render_url(&query, chart, config),
        Commands::Eval { query, data, format } => {
            match commands::eval(&query, &data, &format, config) {
                // Failing check, not an error
                Ok(false) => std::process::exit(2),
                other => other.map(|_| ()),
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
