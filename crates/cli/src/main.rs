//! # tradedoc-cli
//!
//! Command-line interface for header-driven trade document processing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tradedoc_core::{
    presets, BoundDocument, DocumentTypeBinder, DocumentTypeRegistry, HeaderSet, JsonFileSink,
    OutputTable, ProcessedTable, ReferenceLibrary, RenderedTable, TransformPipeline, Warning,
};
use tradedoc_sheet::{read_headers, CsvOptions, TableFormat, TableModel, XlsxWriteOptions};

/// tradedoc - Header-driven spreadsheet processing for trade documents
#[derive(Parser)]
#[command(name = "tradedoc")]
#[command(author, version, about = "Header-driven spreadsheet processing for trade documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format (json, csv, table)
    #[arg(short = 'f', long = "format", default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the header row of a spreadsheet
    Headers {
        /// Spreadsheet file (csv, tsv, json, xlsx, xls, ods)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Process a spreadsheet with a header configuration
    Process {
        /// Spreadsheet file (csv, tsv, json, xlsx, xls, ods)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Header configuration (json or yaml)
        #[arg(short = 'H', long = "headers", value_name = "CFG")]
        headers: PathBuf,

        /// Reference sheet for menu-list columns
        #[arg(short = 'r', long = "reference", value_name = "NAME=PATH")]
        references: Vec<String>,

        /// Bind the result to a document type
        #[arg(short = 'd', long = "document-type", value_name = "ID")]
        document_type: Option<String>,

        /// Document type definitions replacing the built-in ones
        #[arg(long = "registry", value_name = "FILE")]
        registry: Option<PathBuf>,

        /// Write the rendered table (xlsx, csv or json)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,

        /// Save the bound document as JSON (requires --document-type)
        #[arg(long = "save", value_name = "FILE", requires = "document_type")]
        save: Option<PathBuf>,
    },
    /// List available document types
    DocumentTypes {
        /// Document type definitions replacing the built-in ones
        #[arg(long = "registry", value_name = "FILE")]
        registry: Option<PathBuf>,
    },
    /// Run the packing-list preset over built-in sample data
    Sample,
}

/// Output format for results.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Pretty table output (default)
    #[default]
    Table,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    match cli.command {
        Command::Headers { file } => run_headers(&file, cli.format),
        Command::Process {
            file,
            headers,
            references,
            document_type,
            registry,
            output,
            save,
        } => {
            let options = ProcessOptions {
                references,
                document_type,
                registry,
                output,
                save,
            };
            run_process(&file, &headers, &options, cli.format)
        }
        Command::DocumentTypes { registry } => run_document_types(registry.as_deref(), cli.format),
        Command::Sample => {
            let headers = presets::packing_list();
            let processed = TransformPipeline::new(&headers, ReferenceLibrary::new().snapshot())
                .process(presets::sample_table())?;
            print_processed(&processed, cli.format)
        }
    }
}

struct ProcessOptions {
    references: Vec<String>,
    document_type: Option<String>,
    registry: Option<PathBuf>,
    output: Option<PathBuf>,
    save: Option<PathBuf>,
}

/// Print the header row of a spreadsheet.
fn run_headers(file: &Path, format: OutputFormat) -> Result<()> {
    let headers = match TableFormat::from_path(file)? {
        TableFormat::Workbook => read_headers(file),
        _ => TableModel::from_path(file).map(|t| t.columns().to_vec()),
    }
    .with_context(|| format!("Failed to read headers from {}", file.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&headers)?),
        OutputFormat::Csv => println!("{}", headers.iter().map(|h| csv_escape(h)).collect::<Vec<_>>().join(",")),
        OutputFormat::Table => {
            for (idx, header) in headers.iter().enumerate() {
                println!("{:>3}  {}", (idx + 1).to_string().dimmed(), header);
            }
        }
    }
    Ok(())
}

/// Process a spreadsheet and optionally bind, export and save it.
fn run_process(file: &Path, headers: &Path, options: &ProcessOptions, format: OutputFormat) -> Result<()> {
    let table = TableModel::from_path(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let header_set = HeaderSet::from_path(headers)
        .with_context(|| format!("Failed to load header configuration {}", headers.display()))?;

    let library = ReferenceLibrary::new();
    for spec in &options.references {
        let (name, path) = parse_reference(spec)?;
        let sheet = TableModel::from_path(&path)
            .with_context(|| format!("Failed to load reference sheet {}", path.display()))?;
        library.insert(&name, sheet);
    }

    let pipeline = TransformPipeline::new(&header_set, library.snapshot());

    match &options.document_type {
        Some(id) => {
            let registry = load_registry(options.registry.as_deref())?;
            let binder = DocumentTypeBinder::new(registry);
            let processed = pipeline.process(table)?;
            let bound = match &options.save {
                Some(path) => binder.bind_and_persist(processed, id, &mut JsonFileSink::new(path))?,
                None => binder.bind(processed, id)?,
            };
            if let Some(path) = &options.output {
                write_output(path, &bound.output, &serde_json::to_string_pretty(&bound)?)?;
            }
            print_bound(&bound, format)
        }
        None => {
            let processed = pipeline.process(table)?;
            if let Some(path) = &options.output {
                write_output(path, &processed.output, &serde_json::to_string_pretty(&processed)?)?;
            }
            print_processed(&processed, format)
        }
    }
}

/// List document types.
fn run_document_types(registry: Option<&Path>, format: OutputFormat) -> Result<()> {
    let registry = load_registry(registry)?;
    let types: Vec<_> = registry.iter().collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&types)?),
        OutputFormat::Csv => {
            println!("id,name,active,fields");
            for schema in types {
                println!(
                    "{},{},{},{}",
                    csv_escape(&schema.id),
                    csv_escape(&schema.name),
                    schema.active,
                    csv_escape(&schema.required_fields.join(", "))
                );
            }
        }
        OutputFormat::Table => {
            for schema in types {
                let status = if schema.active {
                    "active".green()
                } else {
                    "inactive".red()
                };
                println!("{} {} ({status})", schema.id.cyan().bold(), schema.name);
                if !schema.description.is_empty() {
                    println!("    {}", schema.description.dimmed());
                }
                println!("    fields: {}", schema.required_fields.join(", "));
            }
        }
    }
    Ok(())
}

fn load_registry(path: Option<&Path>) -> Result<DocumentTypeRegistry> {
    match path {
        Some(path) => DocumentTypeRegistry::from_path(path)
            .with_context(|| format!("Failed to load document types from {}", path.display())),
        None => Ok(DocumentTypeRegistry::builtin()),
    }
}

/// Parse a `NAME=PATH` reference argument.
fn parse_reference(spec: &str) -> Result<(String, PathBuf)> {
    let (name, path) = spec
        .split_once('=')
        .with_context(|| format!("Invalid reference '{spec}'. Expected NAME=PATH format"))?;
    let name = name.trim();
    if name.is_empty() || path.trim().is_empty() {
        anyhow::bail!("Invalid reference '{spec}'. Expected NAME=PATH format");
    }
    Ok((name.to_string(), PathBuf::from(path.trim())))
}

/// Write the rendered table, picking the format from the extension.
fn write_output(path: &Path, output: &OutputTable, json: &str) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "json" => std::fs::write(path, json)?,
        "xlsx" => {
            let rendered = output.render()?;
            let options = XlsxWriteOptions::default()
                .with_sheet_name("Processed")
                .with_emphasized_rows(rendered.summary_positions.clone());
            rendered.table.save_as_xlsx_with_options(path, &options)?;
        }
        "csv" | "tsv" => {
            let rendered = output.render()?;
            let options = if ext == "tsv" {
                CsvOptions::tsv()
            } else {
                CsvOptions::default()
            };
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            rendered.table.write_csv(file, &options)?;
        }
        other => anyhow::bail!("Unsupported output extension '{other}'. Use xlsx, csv, tsv or json"),
    }

    tracing::info!("Wrote {}", path.display());
    Ok(())
}

fn print_processed(processed: &ProcessedTable, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(processed)?),
        OutputFormat::Csv => print!("{}", processed.output.render()?.table.to_csv_string()?),
        OutputFormat::Table => print_table(&processed.output.render()?),
    }
    print_warnings(&processed.warnings);
    Ok(())
}

fn print_bound(bound: &BoundDocument, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(bound)?),
        OutputFormat::Csv => print!("{}", bound.output.render()?.table.to_csv_string()?),
        OutputFormat::Table => {
            println!(
                "{} {} ({})\n",
                "Document:".cyan().bold(),
                bound.document_type_name,
                bound.document_type_id
            );
            print_table(&bound.output.render()?);
        }
    }
    print_warnings(&bound.warnings);
    Ok(())
}

/// Print a rendered table with aligned columns and highlighted summary rows.
fn print_table(rendered: &RenderedTable) {
    let table = &rendered.table;
    let cells: Vec<Vec<String>> = table
        .rows()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();
    let widths: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            cells
                .iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header = pad_row(table.columns(), &widths);
    println!("{}", header.bold());
    println!("{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));

    let last = cells.len().saturating_sub(1);
    for (idx, row) in cells.iter().enumerate() {
        let line = pad_row(row, &widths);
        if !rendered.is_summary(idx) {
            println!("{line}");
        } else if idx == last {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line.yellow().bold());
        }
    }
}

fn pad_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    eprintln!("\n{} {}", warnings.len().to_string().yellow().bold(), "warning(s):".yellow());
    for warning in warnings {
        eprintln!("  {} {warning}", "-".yellow());
    }
}

/// Quote a CSV field if it contains a delimiter, quote or newline.
fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
