use std::path::PathBuf;

use catalog_tools::{OutputFormat, Preset, StrategyArg, commands, parse_assignment, utils};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Query XML catalogs by attribute", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the catalog shape comes from
#[derive(Args)]
struct SchemaArgs {
    /// TOML schema file describing root, record and field elements
    #[arg(long, value_hint = clap::ValueHint::FilePath, conflicts_with = "preset")]
    schema: Option<PathBuf>,

    /// Built-in schema
    #[arg(long, default_value = "books")]
    preset: Preset,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter records and print the numbered listing
    Query {
        /// Catalog XML file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        schema: SchemaArgs,

        /// Loading strategy
        #[arg(short, long, default_value = "declarative")]
        strategy: StrategyArg,

        /// Filter criterion, e.g. author=corets or priceTo=10 (repeatable)
        #[arg(short = 'w', long = "where", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        criteria: Vec<(String, String)>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Also print the distinct values of browsable fields
        #[arg(long)]
        suggestions: bool,
    },

    /// Show schema and record counts
    Info {
        /// Catalog XML file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        schema: SchemaArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Run every strategy with the same filter and check they agree
    Compare {
        /// Catalog XML file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        schema: SchemaArgs,

        /// Filter criterion (repeatable)
        #[arg(short = 'w', long = "where", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        criteria: Vec<(String, String)>,
    },

    /// Render the catalog as an HTML page
    Html {
        /// Catalog XML file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        schema: SchemaArgs,

        /// Output file (defaults to the input with an .html extension)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize color handling (respects NO_COLOR)
    utils::color::init_color();

    // Initialize logger with default level (overridden by RUST_LOG)
    let env = Env::default().default_filter_or("warn");
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Query {
            file,
            schema,
            strategy,
            criteria,
            format,
            suggestions,
        } => {
            let schema = utils::file::load_schema(schema.schema.as_deref(), schema.preset)?;
            commands::query::execute(
                &file,
                schema,
                strategy.into(),
                &criteria,
                format,
                suggestions,
            )
        }

        Commands::Info {
            file,
            schema,
            format,
        } => {
            let schema = utils::file::load_schema(schema.schema.as_deref(), schema.preset)?;
            commands::info::execute(&file, schema, format)
        }

        Commands::Compare {
            file,
            schema,
            criteria,
        } => {
            let schema = utils::file::load_schema(schema.schema.as_deref(), schema.preset)?;
            commands::compare::execute(&file, schema, &criteria)
        }

        Commands::Html {
            file,
            schema,
            output,
        } => {
            let schema = utils::file::load_schema(schema.schema.as_deref(), schema.preset)?;
            commands::html_export::execute(&file, output.as_deref(), schema)
        }
    }
}
