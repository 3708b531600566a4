use clap::{Parser as ClapParser, Subcommand};
use sift_lang::cli::{self, CheckOptions, CliError, FilterOptions};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "sift")]
#[command(about = "Sift - compile boolean queries and filter JSON documents with them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a query against the type of the JSON input
    Check {
        /// The query to compile
        query: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Print the elements of a JSON array that match a query
    Filter {
        /// The query to evaluate
        query: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { query, input } => run_check(query, input),
        Commands::Filter {
            query,
            input,
            pretty,
        } => run_filter(query, input, pretty),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    Ok(match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    })
}

fn run_check(query: String, input: Option<String>) -> Result<(), CliError> {
    let options = CheckOptions {
        query,
        input: read_input(input)?,
    };
    let input_type = cli::execute_check(&options)?;
    println!("Query is valid for {}", input_type);
    Ok(())
}

fn run_filter(query: String, input: Option<String>, pretty: bool) -> Result<(), CliError> {
    let options = FilterOptions {
        query,
        input: read_input(input)?,
    };
    let output = cli::execute_filter(&options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }?;
    println!("{}", json);
    Ok(())
}
