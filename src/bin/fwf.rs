//! CLI tool to inspect and normalize fixed-width files of the built-in layouts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fixed_width_rs::models::{EmployeeRecord, InvoiceRecord, TransactionRecord};
use fixed_width_rs::{
    CodecOptions, FixedRecord, PadSide, RecordReader, StreamOptions, TextEncoding, resolve_schema,
    stream,
};
use std::fmt::Debug;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

/// Inspect and normalize fixed-width record files.
#[derive(Parser)]
#[command(name = "fwf")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Show paths, options, and record counts on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the column layout of a record type
    Layout {
        layout: Layout,
    },
    /// Decode a file and print every record
    Dump {
        layout: Layout,

        /// Input data file (or /dev/stdin)
        input: String,

        #[command(flatten)]
        read: ReadArgs,
    },
    /// Decode a file and re-encode every line with canonical padding
    Reformat {
        layout: Layout,

        /// Input data file (or /dev/stdin)
        input: String,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        read: ReadArgs,
    },
}

#[derive(clap::Args)]
struct ReadArgs {
    /// Text encoding of the file (utf-8, latin-1)
    #[arg(long, default_value = "utf-8")]
    encoding: TextEncoding,

    /// Fail on short lines, overlong values, and unparseable fields
    #[arg(long)]
    strict: bool,
}

impl ReadArgs {
    fn options(&self) -> StreamOptions {
        let codec = if self.strict {
            CodecOptions::strict()
        } else {
            CodecOptions::default()
        };
        StreamOptions::default()
            .encoding(self.encoding)
            .codec(codec)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    Employee,
    Transaction,
    Invoice,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Command::Layout { layout } => match layout {
            Layout::Employee => print_layout::<EmployeeRecord>(),
            Layout::Transaction => print_layout::<TransactionRecord>(),
            Layout::Invoice => print_layout::<InvoiceRecord>(),
        },
        Command::Dump {
            layout,
            input,
            read,
        } => {
            let options = read.options();
            if cli.verbose {
                eprintln!("Input:    {input}");
                eprintln!("Encoding: {}", options.encoding);
                eprintln!("Strict:   {}", read.strict);
            }
            match layout {
                Layout::Employee => dump::<EmployeeRecord>(&input, &options),
                Layout::Transaction => dump::<TransactionRecord>(&input, &options),
                Layout::Invoice => dump::<InvoiceRecord>(&input, &options),
            }
        }
        Command::Reformat {
            layout,
            input,
            output,
            read,
        } => {
            let options = read.options();
            if cli.verbose {
                eprintln!("Input:    {input}");
                eprintln!("Output:   {}", output.as_deref().unwrap_or("(stdout)"));
                eprintln!("Encoding: {}", options.encoding);
            }
            let output = output.as_deref();
            match layout {
                Layout::Employee => reformat::<EmployeeRecord>(&input, output, &options),
                Layout::Transaction => reformat::<TransactionRecord>(&input, output, &options),
                Layout::Invoice => reformat::<InvoiceRecord>(&input, output, &options),
            }
        }
    };

    match result {
        Ok(count) => {
            if cli.verbose {
                eprintln!("Records:  {count}");
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn print_layout<R: FixedRecord>() -> Result<usize> {
    let schema = resolve_schema::<R>()?;
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{:>5}  {:<20} {:>6} {:>5}  {:<8} FORMAT",
        "ORDER", "FIELD", "OFFSET", "WIDTH", "PAD"
    )?;
    for (offset, column) in schema.offsets() {
        let desc = &column.descriptor;
        let side = match desc.pad_side {
            PadSide::Left => "left",
            PadSide::Right => "right",
        };
        writeln!(
            out,
            "{:>5}  {:<20} {:>6} {:>5}  {:<8} {}",
            desc.order,
            column.name,
            offset,
            desc.width,
            format!("{side} {:?}", desc.pad_char),
            desc.format.as_deref().unwrap_or("-"),
        )?;
    }
    writeln!(out, "line width: {}", schema.line_width())?;
    Ok(schema.len())
}

fn dump<R: FixedRecord + Debug>(input: &str, options: &StreamOptions) -> Result<usize> {
    let file = File::open(input).with_context(|| format!("reading input file '{input}'"))?;
    let reader = RecordReader::<R, _>::new(BufReader::new(file), options)?;
    let mut out = io::stdout().lock();
    let mut count = 0;
    for (index, record) in reader.enumerate() {
        let record = record.with_context(|| format!("{input}: line {}", index + 1))?;
        writeln!(out, "{record:?}")?;
        count += 1;
    }
    Ok(count)
}

fn reformat<R: FixedRecord>(
    input: &str,
    output: Option<&str>,
    options: &StreamOptions,
) -> Result<usize> {
    let file = File::open(input).with_context(|| format!("reading input file '{input}'"))?;
    let source = BufReader::new(file);
    let Some(out_path) = output else {
        return Ok(stream::reformat::<R, _, _>(source, io::stdout().lock(), options)?);
    };
    if let Some(parent) = Path::new(out_path).parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory for '{out_path}'"))?;
    }
    let sink = File::create(out_path).with_context(|| format!("writing output file '{out_path}'"))?;
    stream::reformat::<R, _, _>(source, BufWriter::new(sink), options)
        .with_context(|| format!("reformatting '{input}'"))
}
