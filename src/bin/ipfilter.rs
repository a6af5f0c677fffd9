//! ipfilter: select rows of a CSV, TSV or JSON-lines file by IP subnet.

use clap::{Args, Parser, Subcommand};
use ipfilter::{
    check_addresses, select_rows, FilterConfig, Format, LogTracer, NoopTracer, Result,
    SelectOptions, SubnetFilter, Tracer,
};
use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ipfilter")]
#[command(author = "Arjan Filius")]
#[command(version)]
#[command(about = "Select rows whose IP address lies in a set of subnets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rows whose column holds an address in one of the subnets
    Select {
        #[command(flatten)]
        filter: FilterArgs,

        /// Column holding the IP addresses
        #[arg(short, long)]
        column: Option<String>,

        /// Input format
        #[arg(short, long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        /// Print the rows that do not match instead
        #[arg(long)]
        invert: bool,

        /// Print only the number of selected rows
        #[arg(long)]
        count: bool,

        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// Report whether each address lies in one of the subnets
    Check {
        #[command(flatten)]
        filter: FilterArgs,

        /// Addresses to check
        #[arg(required = true)]
        addresses: Vec<String>,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Subnet in CIDR notation (repeatable)
    #[arg(short, long = "subnet")]
    subnets: Vec<String>,

    /// YAML filter config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject subnets with host bits set
    #[arg(long)]
    strict: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Select { filter, .. } | Commands::Check { filter, .. } => filter.verbose,
    };
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    log::debug!("ipfilter version {} loaded", ipfilter::VERSION);

    let result = match cli.command {
        Commands::Select {
            filter,
            column,
            format,
            invert,
            count,
            input,
        } => run_select(&filter, column, format, invert, count, input),
        Commands::Check { filter, addresses } => run_check(&filter, &addresses),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &FilterArgs) -> Result<FilterConfig> {
    FilterConfig::load(args.config.as_deref(), &args.subnets, args.strict)
}

fn build_filter(args: &FilterArgs, config: &FilterConfig) -> Result<SubnetFilter> {
    let tracer: Arc<dyn Tracer> = if args.verbose {
        Arc::new(LogTracer)
    } else {
        Arc::new(NoopTracer)
    };
    config.build_filter(tracer)
}

fn open_input(input: Option<PathBuf>) -> Result<Box<dyn Read>> {
    match input {
        Some(path) => {
            log::debug!("Reading rows from {:?}", path);
            Ok(Box::new(File::open(path)?))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn run_select(
    args: &FilterArgs,
    column: Option<String>,
    format: Format,
    invert: bool,
    count: bool,
    input: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(args)?;
    let options = SelectOptions {
        column: config.resolve_column(column)?,
        format,
        invert,
        count,
    };

    // Subnets are validated before any input is opened
    let filter = build_filter(args, &config)?;
    let reader = open_input(input)?;

    let stdout = io::stdout();
    select_rows(&filter, &options, reader, BufWriter::new(stdout.lock()))?;
    Ok(())
}

fn run_check(args: &FilterArgs, addresses: &[String]) -> Result<()> {
    let config = load_config(args)?;
    let filter = build_filter(args, &config)?;

    let stdout = io::stdout();
    check_addresses(&filter, addresses, stdout.lock())
}
