//! tablecodec - Inspect, convert and validate typed table sheets

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use termcolor::ColorChoice;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use tablecodec::address::{CellAddress, CellRange};
use tablecodec::config::{CodecConfig, OutputFormat};
use tablecodec::output::{render_to_stdout, write_status, OutputFormatter, TerminalOutput};
use tablecodec::registry::Registry;
use tablecodec::schema::{validate, Schema};
use tablecodec::{CodecError, TableCodec};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Typed tables stored in spreadsheet grids (CSV, TSV, Excel, ODS)
#[derive(Parser, Debug)]
#[command(name = "tablecodec")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// For workbook files: which sheet to read
    #[arg(long, global = true)]
    sheet: Option<String>,

    /// Decode columns one at a time instead of on the thread pool
    #[arg(long, global = true)]
    sequential: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a file and print its table
    Inspect {
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: CliOutputFormat,

        /// Show at most this many rows (terminal output only)
        #[arg(long)]
        max_rows: Option<usize>,
    },

    /// Decode a file and re-encode it into another
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Datetime pattern for the written file
        #[arg(long)]
        datetime_format: Option<String>,

        /// Duration sub-format for the written file
        #[arg(long)]
        duration_format: Option<String>,
    },

    /// Check a file against a JSON schema
    Validate {
        file: PathBuf,

        /// Schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// Print the validated table
        #[arg(short, long, value_enum)]
        format: Option<CliOutputFormat>,
    },

    /// Print the A1 address of a cell, or of a block starting there
    Address {
        /// 1-based row
        row: usize,
        /// 1-based column
        column: usize,

        /// Block height
        #[arg(long, default_value_t = 1)]
        rows: usize,

        /// Block width
        #[arg(long, default_value_t = 1)]
        columns: usize,
    },

    /// List the recognized format tokens
    Tokens,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1), // Validation failed
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn base_config(cli: &Cli) -> CodecConfig {
    let mut config = CodecConfig::new().with_parallel(!cli.sequential);
    if let Some(ref sheet) = cli.sheet {
        config = config.with_sheet_name(sheet.clone());
    }
    config
}

fn run(cli: Cli) -> Result<bool> {
    let config = base_config(&cli);

    match cli.command {
        Command::Inspect {
            file,
            format,
            max_rows,
        } => {
            let codec = TableCodec::new(config)?;
            let table = codec
                .read_table(&file)
                .with_context(|| format!("Failed to decode {}", file.display()))?;

            match (format, max_rows) {
                (CliOutputFormat::Terminal, Some(max)) => {
                    let mut stdout = std::io::stdout().lock();
                    TerminalOutput::with_max_rows(max).render(&table, &file, &mut stdout)?;
                }
                _ => render_to_stdout(&table, &file, format.into())?,
            }
            Ok(true)
        }

        Command::Convert {
            input,
            output,
            datetime_format,
            duration_format,
        } => {
            let mut config = config;
            if let Some(pattern) = datetime_format {
                config = config.with_datetime_format(pattern);
            }
            if let Some(format) = duration_format {
                config = config.with_duration_format(format);
            }
            let codec = TableCodec::new(config).context("Invalid output format options")?;

            let table = codec
                .read_table(&input)
                .with_context(|| format!("Failed to decode {}", input.display()))?;
            codec
                .write_table(&table, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            println!(
                "Wrote {} columns, {} rows to {}",
                table.column_count(),
                table.row_count(),
                output.display()
            );
            Ok(true)
        }

        Command::Validate {
            file,
            schema,
            format,
        } => {
            let schema = Schema::load(&schema)
                .with_context(|| format!("Failed to load schema {}", schema.display()))?;
            let codec = TableCodec::new(config)?;
            let table = codec
                .read_table(&file)
                .with_context(|| format!("Failed to decode {}", file.display()))?;

            let color = if std::io::stdout().is_terminal() {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            };

            match validate(&table, &schema) {
                Ok(validated) => {
                    write_status(
                        true,
                        &format!("{} matches schema", file.display()),
                        color,
                    )?;
                    if let Some(format) = format {
                        render_to_stdout(&validated, &file, format.into())?;
                    }
                    Ok(true)
                }
                Err(e @ (CodecError::MissingVariableNames(_) | CodecError::InvalidDataType { .. })) => {
                    write_status(false, &e.to_string(), color)?;
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        }

        Command::Address {
            row,
            column,
            rows,
            columns,
        } => {
            let Some(start) = CellAddress::new(row, column) else {
                bail!("Row and column are 1-based");
            };
            if rows == 1 && columns == 1 {
                println!("{}", start);
            } else {
                let range = CellRange::for_block(row, column, rows, columns)
                    .context("Block must have at least one row and column")?;
                println!("{}", range);
            }
            Ok(true)
        }

        Command::Tokens => {
            for tag in Registry::global().all() {
                let codes: Vec<String> = tag.codes().iter().map(|c| format!("%{}", c)).collect();
                let sub = if tag.takes_subformat() {
                    format!("  (sub-format: %{{...}}{})", tag.codes()[0])
                } else {
                    String::new()
                };
                println!("{:<12} {}{}", tag.name(), codes.join(" "), sub);
            }
            Ok(true)
        }
    }
}
