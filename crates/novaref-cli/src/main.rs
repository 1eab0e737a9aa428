use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use novaref_core::bibliography::{parse_bib_file, select_target};
use novaref_core::{
    AppConfig, BibTarget, DocumentContext, ExitCode, build_candidates, extract_labels,
    locate_bibliographies,
};
use novaref_metadata::formats::format_record;
use novaref_metadata::{InsertOutcome, MetadataError, MetadataService};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "novaref",
    about = "Labels, bibliography entries and DOI lookups for typeset documents",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for editors and scripts).
    /// Also enabled by setting NOVAREF_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Use this config file instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List label declarations in a document.
    Labels { document: PathBuf },

    /// List the bibliography files a document includes and their entries.
    Bibs { document: PathBuf },

    /// Ranked completion candidates for a document.
    Complete {
        document: PathBuf,
        /// Read the document text from stdin (unsaved editor buffer).
        #[arg(long)]
        stdin: bool,
    },

    /// Search CrossRef for works.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Fetch the BibTeX record for a DOI.
    Fetch { doi: String },

    /// Show which bibliography file an insert for this document would use.
    Target { document: PathBuf },

    /// Fetch a DOI's record and append it to the document's bibliography.
    Insert {
        doi: String,
        #[arg(long)]
        document: PathBuf,
        /// Bibliography file to write to (needed when there are several).
        #[arg(long)]
        bib: Option<PathBuf>,
        /// Allow creating the bibliography file.
        #[arg(long)]
        create: bool,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Print the config file path.
    Path,
}

// ─── Output ─────────────────────────────────────────────────────────────────

struct Output {
    json: bool,
    start: Instant,
}

impl Output {
    fn ok<T: Serialize>(&self, data: &T) -> Result<()> {
        print_json(&serde_json::json!({
            "status": "ok",
            "data": data,
            "meta": { "duration_ms": self.start.elapsed().as_millis() }
        }))
    }

    /// Report a failure and exit with `code`.
    fn fail(&self, code: ExitCode, error: &str, message: &str) -> ! {
        if self.json {
            let _ = print_json(&serde_json::json!({
                "status": "error",
                "error": error,
                "message": message,
                "meta": { "duration_ms": self.start.elapsed().as_millis() }
            }));
        } else {
            eprintln!("{message}");
        }
        std::process::exit(code as i32);
    }

    fn fail_metadata(&self, err: &MetadataError) -> ! {
        let (code, kind) = if err.is_validation() {
            (ExitCode::InvalidArgs, "validation")
        } else if err.is_network() {
            (ExitCode::NetworkError, "network")
        } else {
            (ExitCode::GeneralError, "io")
        };
        self.fail(code, kind, &err.to_string())
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let out = Output {
        json: cli.json || std::env::var("NOVAREF_JSON").as_deref() == Ok("1"),
        start: Instant::now(),
    };
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    tracing::debug!(
        crossref = %config.crossref.base_url,
        resolver = %config.doi.resolver_url,
        "config loaded"
    );

    match cli.command {
        Commands::Labels { document } => {
            let doc = DocumentContext::from_file(&document)?;
            let labels = extract_labels(&doc.text);
            if out.json {
                out.ok(&serde_json::json!({ "items": labels, "total": labels.len() }))?;
            } else if labels.is_empty() {
                println!("No labels in {}", document.display());
            } else {
                for label in &labels {
                    println!("{:>5}  {:<8} {}", label.line + 1, label.label_type, label.name);
                }
            }
        }

        Commands::Bibs { document } => {
            let doc = DocumentContext::from_file(&document)?;
            let files: Vec<_> = locate_bibliographies(&doc.text, &doc.base_dir)
                .into_iter()
                .map(|path| {
                    let entries = parse_bib_file(&path);
                    (path, entries)
                })
                .collect();
            if out.json {
                let items: Vec<_> = files
                    .iter()
                    .map(|(path, entries)| serde_json::json!({ "path": path, "entries": entries }))
                    .collect();
                out.ok(&serde_json::json!({ "items": items, "total": items.len() }))?;
            } else if files.is_empty() {
                println!("No bibliography files found for {}", document.display());
            } else {
                for (path, entries) in &files {
                    println!("{} ({} entries)", path.display(), entries.len());
                    for entry in entries {
                        println!(
                            "  {:<24} [{}] {}",
                            entry.key,
                            entry.entry_type,
                            entry.title.as_deref().unwrap_or("")
                        );
                    }
                }
            }
        }

        Commands::Complete { document, stdin } => {
            let doc = if stdin {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                DocumentContext::with_text(&document, text)
            } else {
                DocumentContext::from_file(&document)?
            };
            let items = build_candidates(&doc);
            if out.json {
                out.ok(&serde_json::json!({ "items": items, "total": items.len() }))?;
            } else {
                for item in &items {
                    println!("{:<32} {}", item.label, item.detail);
                }
            }
        }

        Commands::Search { query } => {
            let query = query.join(" ");
            let service = MetadataService::new(&config)?;
            let works = match service.search(&query).await {
                Ok(works) => works,
                Err(e) => out.fail_metadata(&e),
            };
            if out.json {
                out.ok(&serde_json::json!({ "items": works, "total": works.len(), "query": query }))?;
            } else if works.is_empty() {
                println!("No results for: {query}");
            } else {
                for (i, work) in works.iter().enumerate() {
                    println!("{:>2}. {}", i + 1, work.display_title());
                    let description = work.description();
                    if !description.is_empty() {
                        println!("    {description}");
                    }
                    println!("    doi: {}", work.doi);
                }
            }
        }

        Commands::Fetch { doi } => {
            let service = MetadataService::new(&config)?;
            let (doi, record) = match service.fetch_bibtex(&doi).await {
                Ok(fetched) => fetched,
                Err(e) => out.fail_metadata(&e),
            };
            if out.json {
                out.ok(&serde_json::json!({ "doi": doi.normalized, "bibtex": format_record(&record) }))?;
            } else {
                print!("{}", format_record(&record));
            }
        }

        Commands::Target { document } => {
            let doc = DocumentContext::from_file(&document)?;
            let target = select_target(&doc)?;
            if out.json {
                out.ok(&target)?;
            } else {
                match &target {
                    BibTarget::Existing { path } => println!("{}", path.display()),
                    BibTarget::Create { path } => {
                        println!("No bibliography yet; would create {}", path.display())
                    }
                    BibTarget::Choose { candidates } => {
                        println!("Several bibliography files; choose one with --bib:");
                        for path in candidates {
                            println!("  {}", path.display());
                        }
                    }
                }
            }
        }

        Commands::Insert {
            doi,
            document,
            bib,
            create,
        } => {
            let doc = DocumentContext::from_file(&document)?;
            let target = resolve_insert_target(&out, &doc, bib, create)?;
            let service = MetadataService::new(&config)?;
            let outcome = match service.insert(&doi, &target).await {
                Ok(outcome) => outcome,
                Err(e) => out.fail_metadata(&e),
            };
            if out.json {
                out.ok(&outcome)?;
            } else {
                match &outcome {
                    InsertOutcome::Inserted { path, key } => println!(
                        "Added {} to {}",
                        key.as_deref().unwrap_or("record"),
                        path.display()
                    ),
                    InsertOutcome::AlreadyPresent { path } => {
                        println!("Already exists in {}", path.display())
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::List => {
                if out.json {
                    out.ok(&config)?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Path => {
                let path = cli.config.unwrap_or_else(AppConfig::config_path);
                if out.json {
                    out.ok(&serde_json::json!({ "path": path }))?;
                } else {
                    println!("{}", path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Pick the bibliography an insert writes to. Creating a file or picking
/// one of several needs an explicit flag.
fn resolve_insert_target(
    out: &Output,
    doc: &DocumentContext,
    bib: Option<PathBuf>,
    create: bool,
) -> Result<PathBuf> {
    if let Some(path) = bib {
        if !path.exists() && !create {
            out.fail(
                ExitCode::ConfirmRequired,
                "create_required",
                &format!("{} does not exist; pass --create to create it", path.display()),
            );
        }
        return Ok(path);
    }

    match select_target(doc)? {
        BibTarget::Existing { path } => Ok(path),
        BibTarget::Create { path } if create => Ok(path),
        BibTarget::Create { path } => out.fail(
            ExitCode::ConfirmRequired,
            "create_required",
            &format!(
                "No .bib file next to the document; pass --create to create {}",
                path.display()
            ),
        ),
        BibTarget::Choose { candidates } => out.fail(
            ExitCode::ConfirmRequired,
            "choice_required",
            &format!(
                "Several .bib files found, pick one with --bib: {}",
                display_paths(&candidates)
            ),
        ),
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.file_name().map(Path::new).unwrap_or(p).display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("NOVAREF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
