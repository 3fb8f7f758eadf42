//! Annotation binary entry point.
//!
//! This binary annotates biomedical text with UMLS concepts. It reads a text
//! file (one input per line) or a TSV/CSV table, runs every input through the
//! annotation pipeline and writes the linked entities as a TSV file, a table or
//! JSON. An interactive mode annotates lines typed at a prompt.
//!
//! # Examples
//!
//! Annotate a table of clinical notes:
//! ```bash
//! annotate --input notes.tsv --col text --id note_id --kb umls_kb.jsonl
//! ```
//!
//! Interactive mode:
//! ```bash
//! annotate --interactive --model resources/demo/lexicon.json --kb resources/demo/kb.jsonl
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use umls_ner::{
    linker::{KnowledgeBase, KnowledgeBaseLinker, LinkerConfig},
    models::{EntityTable, LinkedEntity},
    normalizer::TrueCaser,
    output::{output_path, write_tsv},
    pipeline::AnnotationPipeline,
    recognizer::{EntityRecognizer, GazetteerRecognizer},
    semantic_types::SemanticTypeTable,
    source::{DelimitedTableSource, LineFileSource, TextSource},
    DEFAULT_MODEL,
};

type Pipeline = AnnotationPipeline<TrueCaser, GazetteerRecognizer, KnowledgeBaseLinker>;

/// Output format for annotation results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// TSV file under the output directory
    Tsv,
    /// Human-friendly table on stdout
    Table,
    /// Machine-readable JSON on stdout
    Json,
}

/// Annotation CLI for extracting and linking biomedical entities
#[derive(Parser, Debug)]
#[command(
    name = "annotate",
    version,
    about = "Extract biomedical entities and link them to UMLS concepts",
    long_about = "Find biomedical entity mentions in text and link them to UMLS concepts. \
                  Inputs are read from a text file (one input per line) or a TSV/CSV table.

EXAMPLES:
  Annotate a text file:
    annotate --input abstracts.txt --kb umls_kb.jsonl

  Annotate a table, keeping ids and unlinked entities:
    annotate --input notes.tsv --col text --id note_id --include-unlinked

  Print JSON instead of writing a TSV file:
    annotate --input notes.csv --col body --format json

  Interactive mode:
    annotate --interactive --model resources/demo/lexicon.json --kb resources/demo/kb.jsonl"
)]
struct Args {
    /// Input file (.tsv, .csv, or plain text with one input per line)
    #[arg(short, long, value_name = "FILE", required_unless_present = "interactive")]
    input: Option<PathBuf>,

    /// Text column of a TSV/CSV input
    #[arg(short, long, value_name = "COLUMN", default_value = "text")]
    col: String,

    /// Id column of a TSV/CSV input
    #[arg(short = 'd', long, value_name = "COLUMN")]
    id: Option<String>,

    /// Recognizer model: a lexicon file, or a model name under the data directory
    #[arg(short, long, value_name = "MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Knowledge base file (JSON lines, one concept per line)
    #[arg(long, value_name = "FILE")]
    kb: Option<PathBuf>,

    /// Linker options file (JSON), defaults apply to missing keys
    #[arg(long, value_name = "FILE")]
    linker_config: Option<PathBuf>,

    /// Semantic type table file, instead of the bundled release
    #[arg(long, value_name = "FILE", conflicts_with = "semantic_types_url")]
    semantic_types: Option<PathBuf>,

    /// Download the semantic type table from this URL
    #[arg(long, value_name = "URL")]
    semantic_types_url: Option<String>,

    /// Casing dictionary for the truecaser (JSON object)
    #[arg(long, value_name = "FILE")]
    truecase_model: Option<PathBuf>,

    /// Root directory for TSV results
    #[arg(long, value_name = "DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Also emit records for entities without a UMLS concept
    #[arg(long)]
    include_unlinked: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "tsv")]
    format: OutputFormat,

    /// Enable interactive REPL mode
    #[arg(long, conflicts_with = "input")]
    interactive: bool,

    /// Logging verbosity level
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging subsystem with the specified level
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Directory holding installed models and knowledge bases
fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("umls-ner"))
        .context("Could not determine the user data directory")
}

/// Resolve a model argument to a lexicon file
fn resolve_model_path(model: &str) -> Result<PathBuf> {
    let path = Path::new(model);
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    let resolved = data_dir()?.join("models").join(format!("{}.json", model));
    debug!("Resolved model '{}' to {}", model, resolved.display());
    Ok(resolved)
}

/// Load the semantic type table from the bundled release, a file or a URL
async fn load_semantic_types(args: &Args) -> Result<SemanticTypeTable> {
    let table = if let Some(url) = &args.semantic_types_url {
        info!("Downloading semantic type table from {}", url);
        SemanticTypeTable::fetch(url)
            .await
            .with_context(|| format!("Failed to download semantic type table from {}", url))?
    } else if let Some(path) = &args.semantic_types {
        SemanticTypeTable::from_path(path)
            .with_context(|| format!("Failed to load semantic type table from {:?}", path))?
    } else {
        SemanticTypeTable::bundled().context("Failed to load bundled semantic type table")?
    };

    info!("Loaded {} semantic types", table.len());
    Ok(table)
}

/// Create the annotation pipeline from CLI arguments
async fn create_pipeline(args: &Args) -> Result<Pipeline> {
    let truecaser = match &args.truecase_model {
        Some(path) => TrueCaser::from_path(path)
            .with_context(|| format!("Failed to load casing dictionary from {:?}", path))?,
        None => TrueCaser::default(),
    };

    let model_path = resolve_model_path(&args.model)?;
    let recognizer = GazetteerRecognizer::from_path(&model_path).with_context(|| {
        format!(
            "Failed to load recognizer model '{}' from {:?}",
            args.model, model_path
        )
    })?;

    let kb_path = match &args.kb {
        Some(path) => path.clone(),
        None => data_dir()?.join("kb").join("umls_kb.jsonl"),
    };
    let kb = KnowledgeBase::from_path(&kb_path)
        .with_context(|| format!("Failed to load knowledge base from {:?}", kb_path))?;

    let config = match &args.linker_config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read linker options from {:?}", path))?;
            serde_json::from_str::<LinkerConfig>(&content)
                .with_context(|| format!("Invalid linker options in {:?}", path))?
        }
        None => LinkerConfig::default(),
    };
    debug!("Linker options: {:?}", config);
    let linker = KnowledgeBaseLinker::new(kb, config);

    let semantic_types = load_semantic_types(args).await?;

    Ok(AnnotationPipeline::new(truecaser, recognizer, linker, semantic_types))
}

/// Pick a source for the input file based on its extension
fn create_source(input: &Path, args: &Args) -> Box<dyn TextSource> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("tsv") | Some("csv") => {
            let mut source = DelimitedTableSource::new(input, args.col.clone());
            if let Some(id_column) = &args.id {
                source = source.with_id_column(id_column.clone());
            }
            Box::new(source)
        }
        _ => {
            if args.id.is_some() {
                warn!("--id is ignored for plain text input");
            }
            Box::new(LineFileSource::new(input))
        }
    }
}

/// Create a progress bar for tracking annotation
fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} texts")
            .expect("Invalid progress bar template")
            .progress_chars("##-"),
    );
    pb
}

/// Truncate a cell for table display
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let kept: String = text.chars().take(max_chars - 3).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

/// Format records as a pretty table
fn format_records_table(records: &[LinkedEntity]) -> String {
    if records.is_empty() {
        return "No entities found.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Id").add_attribute(Attribute::Bold),
        Cell::new("Entity").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("CUI").add_attribute(Attribute::Bold),
        Cell::new("Label").add_attribute(Attribute::Bold),
        Cell::new("Semantic Types").add_attribute(Attribute::Bold),
        Cell::new("Score").add_attribute(Attribute::Bold),
    ]);

    for record in records {
        let score = match record.umls_mapping_score {
            Some(score) if score >= 0.9 => Cell::new(record.score_text()).fg(Color::Green),
            Some(_) => Cell::new(record.score_text()).fg(Color::Yellow),
            None => Cell::new("-").fg(Color::DarkGrey),
        };

        table.add_row(vec![
            Cell::new(&record.input_id),
            Cell::new(&record.entity),
            Cell::new(&record.entity_type),
            Cell::new(&record.umls_cui),
            Cell::new(truncate(&record.umls_label, 40)),
            Cell::new(truncate(&record.umls_semantic_type_labels, 40)),
            score,
        ]);
    }

    table.to_string()
}

/// Format records as JSON
fn format_records_json(records: &[LinkedEntity]) -> Result<String> {
    serde_json::to_string_pretty(records).with_context(|| "Failed to serialize records to JSON")
}

/// Annotate every input of a file and emit the results
async fn run_batch(pipeline: &Pipeline, args: &Args, input: &Path) -> Result<()> {
    let start_time = Instant::now();

    if !input.exists() {
        error!("Input file does not exist: {:?}", input);
        anyhow::bail!("Input file not found: {:?}", input);
    }

    let source = create_source(input, args);
    let inputs = source
        .fetch_inputs()
        .await
        .with_context(|| format!("Failed to read inputs from {:?}", input))?;
    info!("Found {} inputs in {}", inputs.len(), source.name());

    if inputs.is_empty() {
        warn!("No inputs found in input file");
        return Ok(());
    }

    let progress = create_progress_bar(inputs.len());
    let (records, stats) = pipeline
        .extract_inputs(&inputs, args.include_unlinked, Some(&progress))
        .await
        .context("Failed to annotate inputs")?;
    progress.finish();

    match args.format {
        OutputFormat::Tsv => {
            let path = output_path(&args.output_dir, pipeline.recognizer().model_name(), input);
            write_tsv(&path, &EntityTable::from(records))
                .with_context(|| format!("Failed to write results to {:?}", path))?;
            println!("Results written to {}", path.display());
        }
        OutputFormat::Table => println!("{}", format_records_table(&records)),
        OutputFormat::Json => println!("{}", format_records_json(&records)?),
    }

    let elapsed = start_time.elapsed();
    eprintln!("\n╔════════════════════════════════════════╗");
    eprintln!("║      Annotation Completed              ║");
    eprintln!("╠════════════════════════════════════════╣");
    eprintln!("║ Inputs processed:     {:>16} ║", stats.inputs);
    eprintln!("║ Inputs with entities: {:>16} ║", stats.with_entities);
    eprintln!("║ Records:              {:>16} ║", stats.records);
    eprintln!("║ Elapsed time:         {:>13.2?} ║", elapsed);
    eprintln!("╚════════════════════════════════════════╝");

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  <text>            - Annotate the text");
    println!("  /unlinked on|off  - Include entities without a UMLS concept");
    println!("  /format table     - Use table output format");
    println!("  /format json      - Use JSON output format");
    println!("  /help             - Show this help");
    println!("  Ctrl+D or Ctrl+C  - Exit");
}

/// Run interactive REPL mode
async fn run_interactive(
    pipeline: &Pipeline,
    mut include_unlinked: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut format = match format {
        OutputFormat::Json => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    println!("Interactive UMLS Annotation");
    print_help();
    println!();

    let mut rl = DefaultEditor::new().with_context(|| "Failed to create readline editor")?;

    loop {
        let readline = rl.readline("Text> ");
        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line).ok();

                if line.starts_with('/') {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    match (parts[0], parts.get(1).copied()) {
                        ("/help", _) => print_help(),
                        ("/unlinked", Some("on")) => {
                            include_unlinked = true;
                            println!("Including unlinked entities");
                        }
                        ("/unlinked", Some("off")) => {
                            include_unlinked = false;
                            println!("Omitting unlinked entities");
                        }
                        ("/unlinked", _) => eprintln!("Usage: /unlinked on|off"),
                        ("/format", Some("table")) => {
                            format = OutputFormat::Table;
                            println!("Set output format to table");
                        }
                        ("/format", Some("json")) => {
                            format = OutputFormat::Json;
                            println!("Set output format to JSON");
                        }
                        ("/format", _) => eprintln!("Usage: /format [table|json]"),
                        (command, _) => eprintln!(
                            "Unknown command: {}. Type /help for available commands.",
                            command
                        ),
                    }
                    continue;
                }

                let start = Instant::now();
                match pipeline.extract(line, None, include_unlinked).await {
                    Ok(records) => match format {
                        OutputFormat::Json => match format_records_json(&records) {
                            Ok(json) => println!("{}", json),
                            Err(e) => eprintln!("Error formatting JSON: {}", e),
                        },
                        _ => {
                            println!("{}", format_records_table(&records));
                            println!(
                                "\nFound {} records in {:.2}s",
                                records.len(),
                                start.elapsed().as_secs_f64()
                            );
                        }
                    },
                    Err(e) => eprintln!("Annotation failed: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                error!("Error reading input: {}", err);
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level).context("Failed to initialize logging")?;
    debug!("CLI arguments: {:?}", args);

    let pipeline = create_pipeline(&args)
        .await
        .context("Failed to create annotation pipeline")?;

    match &args.input {
        Some(input) if !args.interactive => run_batch(&pipeline, &args, input).await?,
        _ => run_interactive(&pipeline, args.include_unlinked, args.format).await?,
    }

    Ok(())
}
