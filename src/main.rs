mod output;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use qrs::config::QueryConfig;
use qrs::index::MemoryIndex;
use qrs::query::{Operator, ParseOptions, QueryExecutor, parse_with};
use qrs::records::{RecordKey, SortDirection};
use qrs::session::{Context, CtxFlags, Session};

#[derive(Parser)]
#[command(name = "qrs")]
#[command(about = "Boolean full-text queries over scored record sets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print its expression tree
    Parse {
        /// Query text
        #[arg(trailing_var_arg = true, required = true)]
        query: Vec<String>,
    },
    /// Run a query against a documents file
    Query {
        /// Documents file: JSON array of {"key": ..., "sections": [...]}
        #[arg(short, long)]
        docs: PathBuf,

        /// Operator between terms that carry none
        #[arg(long, value_enum)]
        default_op: Option<OpArg>,

        /// Expression budget
        #[arg(long)]
        max_exprs: Option<u32>,

        /// Order of printed records
        #[arg(long, value_enum, default_value_t = SortArg::Desc)]
        sort: SortArg,

        /// Maximum number of records to print (0 = all)
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Fold section or position records into one record per document
        #[arg(long)]
        group: bool,

        /// Query text
        #[arg(trailing_var_arg = true, required = true)]
        query: Vec<String>,
    },
    /// Read statements from stdin and run them in one session
    Shell {
        /// Documents file: JSON array of {"key": ..., "sections": [...]}
        #[arg(short, long)]
        docs: PathBuf,
    },
    /// Serve sessions on a Unix socket
    #[cfg(unix)]
    Serve {
        /// Documents file: JSON array of {"key": ..., "sections": [...]}
        #[arg(short, long)]
        docs: PathBuf,

        /// Socket path
        #[arg(short, long)]
        socket: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OpArg {
    Or,
    And,
    But,
    Adjust,
}

impl From<OpArg> for Operator {
    fn from(op: OpArg) -> Self {
        match op {
            OpArg::Or => Operator::Or,
            OpArg::And => Operator::And,
            OpArg::But => Operator::But,
            OpArg::Adjust => Operator::Adjust,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

/// One entry of a documents file
#[derive(Deserialize)]
struct Document {
    key: RecordKey,
    sections: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let color = !cli.no_color;
    output::StderrLogger::init(cli.verbose, color)?;

    let config = match &cli.config {
        Some(path) => QueryConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => QueryConfig::load_default()?,
    };

    match cli.command {
        Commands::Parse { query } => {
            let text = query.join(" ");
            let (query, _) = parse_with(&text, &ParseOptions::from(&config))?;
            output::print_query(&query, color)?;
        }
        Commands::Query {
            docs,
            default_op,
            max_exprs,
            sort,
            limit,
            group,
            query,
        } => {
            let mut config = config;
            if let Some(op) = default_op {
                config.default_op = op.into();
            }
            if let Some(max_exprs) = max_exprs {
                config.max_exprs = max_exprs;
            }
            config.validate()?;

            let index = load_documents(&docs)?;
            let text = query.join(" ");
            let (query, rest) = parse_with(&text, &ParseOptions::from(&config))?;
            if !rest.is_empty() {
                log::warn!("expression budget exhausted, ignoring {:?}", rest);
            }

            let mut records = QueryExecutor::with_config(&index, &config).execute(&query)?;
            if group {
                records.group(config.records.max_n_subrecs as usize)?;
            }
            let nhits = records.nhits();
            let direction = match sort {
                SortArg::Asc => SortDirection::Ascending,
                SortArg::Desc => SortDirection::Descending,
            };
            records.sort(limit, direction);
            output::print_records(records.records(), records.config().record_unit, color)?;
            output::print_summary(nhits, records.nhits(), color)?;
        }
        Commands::Shell { docs } => {
            let index = load_documents(&docs)?;
            let mut session = Context::new(index, config)?;
            run_shell(&mut session)?;
        }
        #[cfg(unix)]
        Commands::Serve { docs, socket } => {
            let index = load_documents(&docs)?;
            serve_socket(index, config, &socket)?;
        }
    }

    Ok(())
}

/// Load a documents file. Sections are numbered from 1.
fn load_documents(path: &Path) -> Result<MemoryIndex> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read documents from {}", path.display()))?;
    let documents: Vec<Document> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse documents in {}", path.display()))?;

    let mut index = MemoryIndex::new();
    for doc in &documents {
        index.add_document(doc.key.clone(), &doc.sections);
    }
    log::info!(
        "loaded {} documents ({} sections) from {}",
        documents.len(),
        index.len(),
        path.display()
    );
    Ok(index)
}

/// One statement per input line; a trailing `\` continues it on the next line.
fn run_shell<S: Session>(session: &mut S) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let (text, more) = match line.strip_suffix('\\') {
            Some(text) => (text, true),
            None => (line.as_str(), false),
        };
        let flags = if more {
            CtxFlags::new().with(CtxFlags::MORE)
        } else {
            CtxFlags::new()
        };
        match session.send(text, flags) {
            Ok(true) => {}
            // Continued line or placeholders still open
            Ok(false) => continue,
            Err(e) => {
                writeln!(stdout, "error: {}", e)?;
                continue;
            }
        }

        loop {
            match session.recv() {
                Ok(response) => {
                    if !response.body.is_empty() {
                        writeln!(stdout, "{}", response.body)?;
                    }
                    if response.flags.is_quit() {
                        return Ok(());
                    }
                    if !response.flags.is_more() {
                        break;
                    }
                }
                Err(e) => {
                    writeln!(stdout, "error: {}", e)?;
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
fn serve_socket(index: MemoryIndex, config: QueryConfig, socket: &Path) -> Result<()> {
    use std::os::unix::net::UnixListener;
    use std::sync::Arc;

    if socket.exists() {
        fs::remove_file(socket)?;
    }
    let listener = UnixListener::bind(socket)
        .with_context(|| format!("failed to bind {}", socket.display()))?;
    log::info!("listening on {}", socket.display());

    let index = Arc::new(index);
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("accept failed: {}", e);
                continue;
            }
        };
        let index = Arc::clone(&index);
        let config = config.clone();
        std::thread::spawn(move || {
            let result = Context::new(index, config).and_then(|mut session| {
                let reader = stream.try_clone()?;
                qrs::session::serve(&mut session, reader, stream)
            });
            if let Err(e) = result {
                log::warn!("connection error: {}", e);
            }
        });
    }

    Ok(())
}
