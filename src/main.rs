/*!
Main binary for jpslice.
*/

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;

use jpslice::commands::{self, repl::Repl};
use jpslice::query::{JsonPath, QueryEngine, ScanQueryEngine};
use jpslice::utils::{self, Document};

/// Query a JSON document with a JSONPath expression and print the matched
/// values exactly as they appear in the input.
#[derive(Parser)]
#[command(name = "jps", version, about, arg_required_else_help = true, long_about = None, disable_help_subcommand = true)]
struct Args {
    /// Optional subcommands
    #[command(subcommand)]
    command: Option<Commands>,
    /// JSONPath query (e.g., "$.store.book[*].title")
    query: Option<String>,
    #[arg(value_name = "FILE")]
    /// Optional path to JSON file. If omitted, reads from STDIN
    input: Option<PathBuf>,
    /// Display count of number of matches
    #[arg(long, action = ArgAction::SetTrue)]
    count: bool,
    /// Print the byte spans of the matches instead of their values
    #[arg(long, action = ArgAction::SetTrue)]
    spans: bool,
    /// Do not display matched JSON values
    #[arg(short, long, action = ArgAction::SetTrue)]
    no_display: bool,
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

/// Available subcommands for `jps`
#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    /// Generate additional documentation and/or completions
    Generate(GenerateCommand),
    /// Evaluate queries read line by line from STDIN against FILE
    Repl {
        /// Path to the JSON document to query
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Generate shell completions and man page
#[derive(Subcommand)]
enum GenerateCommand {
    /// Generate shell completions for the given shell to stdout.
    Shell { shell: clap_complete::Shell },
    /// Generate a man page for jps to output directory if specified, else
    /// the current directory.
    Man {
        /// The output directory to write the man pages.
        #[clap(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Entry point for main binary.
///
/// This parses the command line arguments and executes the query. If no file
/// is given, the document is read from STDIN. Matches are printed to STDOUT:
/// a single match verbatim, several as a JSON array.
fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .parse_default_env()
        .init();

    match args.command {
        Some(Commands::Generate(cmd)) => match cmd {
            GenerateCommand::Shell { shell } => {
                let mut cmd = Args::command();
                commands::generate::write_completions(
                    shell,
                    &mut cmd,
                    &mut io::stdout().lock(),
                );
            }
            GenerateCommand::Man { output_dir } => {
                for path in commands::generate::generate_man_pages(
                    &Args::command(),
                    output_dir,
                )? {
                    println!("Generated: {}", path.display());
                }
            }
        },
        Some(Commands::Repl { file }) => {
            let document = Document::open(&file)?;
            let stdin = io::stdin();
            let prompt = stdin.is_terminal();
            Repl::new(&document)
                .with_prompt(prompt)
                .run(stdin.lock(), &mut io::stdout().lock())?;
        }
        None => {
            // Parse query
            let path: JsonPath = args
                .query
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "Query string required unless using subcommand"
                    )
                })?
                .parse()
                .with_context(|| "Failed to parse query")?;

            // Load document
            let document = if let Some(file) = args.input {
                Document::open(&file)?
            } else {
                if io::stdin().is_terminal() {
                    // No piped input and no file specified
                    let mut cmd = Args::command();
                    return Ok(cmd.print_help()?);
                }
                Document::from_reader(io::stdin().lock())?
            };

            // Execute query
            let matches = ScanQueryEngine
                .find(&document, &path)
                .with_context(|| "Failed to evaluate query")?;

            let stdout = io::stdout();
            let color = stdout.is_terminal();
            let mut out = BufWriter::new(stdout.lock());

            if args.count {
                utils::tolerate_broken_pipe(|| {
                    writeln!(out, "Found matches: {}", matches.len())
                })?;
            }

            if args.spans {
                utils::write_spans(&mut out, &matches)?;
            } else if !args.no_display {
                utils::write_result(&mut out, &document, &matches, color)?;
            }

            utils::tolerate_broken_pipe(|| out.flush())?;
        }
    }

    Ok(())
}
