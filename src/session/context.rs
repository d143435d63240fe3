//! Local session running statements against an index.

use lru::LruCache;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

use super::{CtxFlags, QueryResult, Response, Session};
use crate::config::QueryConfig;
use crate::error::{Error, Result};
use crate::index::Index;
use crate::query::{ParseOptions, Query, QueryExecutor, parse_with};

/// Marks a value to be supplied by the next `send`.
pub const PLACEHOLDER: char = '?';

/// Text of a statement that ends the session.
const QUIT_STATEMENT: &str = "quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Hole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// The last send carried MORE.
    Assembling,
    /// Placeholders wait for values.
    AwaitingValue,
}

pub struct Context<I: Index> {
    index: I,
    config: QueryConfig,
    state: State,
    pieces: Vec<Piece>,
    holes: usize,
    in_quote: bool,
    quiet: bool,
    /// Completed statements not yet run, with their QUIET flag.
    statements: VecDeque<(String, bool)>,
    queue: VecDeque<Response>,
    cache: LruCache<String, Query>,
    closed: bool,
}

impl<I: Index> Context<I> {
    pub fn new(index: I, config: QueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(index, config))
    }

    pub fn with_defaults(index: I) -> Self {
        Self::with_config(index, QueryConfig::default())
    }

    fn with_config(index: I, config: QueryConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            index,
            config,
            state: State::Idle,
            pieces: Vec::new(),
            holes: 0,
            in_quote: false,
            quiet: false,
            statements: VecDeque::new(),
            queue: VecDeque::new(),
            cache: LruCache::new(capacity),
            closed: false,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::protocol("session is closed"));
        }
        Ok(())
    }

    fn start_statement(&mut self) {
        self.pieces.clear();
        self.holes = 0;
        self.in_quote = false;
        self.quiet = false;
    }

    /// Append statement text, splitting out unescaped placeholders outside
    /// quotes.
    fn append(&mut self, fragment: &str) {
        let mut text = String::with_capacity(fragment.len());
        let mut chars = fragment.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some(PLACEHOLDER) if !self.in_quote => text.push(PLACEHOLDER),
                    Some(next) => {
                        text.push('\\');
                        text.push(next);
                    }
                    None => text.push('\\'),
                },
                '"' => {
                    self.in_quote = !self.in_quote;
                    text.push(ch);
                }
                PLACEHOLDER if !self.in_quote => {
                    self.pieces.push(Piece::Text(std::mem::take(&mut text)));
                    self.pieces.push(Piece::Hole);
                    self.holes += 1;
                }
                _ => text.push(ch),
            }
        }
        self.pieces.push(Piece::Text(text));
    }

    fn fill(&mut self, value: &str) {
        if let Some(slot) = self.pieces.iter_mut().find(|p| **p == Piece::Hole) {
            *slot = Piece::Text(quote(value));
            self.holes -= 1;
        }
    }

    fn assemble(&mut self) -> String {
        let mut out = String::new();
        for piece in self.pieces.drain(..) {
            if let Piece::Text(text) = piece {
                out.push_str(&text);
            }
        }
        out
    }

    fn parse_cached(&mut self, text: &str) -> Result<Query> {
        if let Some(query) = self.cache.get(text) {
            return Ok(query.clone());
        }
        let options = ParseOptions::from(&self.config);
        let (query, _) = parse_with(text, &options)?;
        self.cache.put(text.to_string(), query.clone());
        Ok(query)
    }

    /// Run one query, following its remainder until the input is used up.
    fn run_query(&mut self, text: &str, bodies: &mut Vec<String>) -> Result<()> {
        let mut text = text.to_string();
        loop {
            let query = self.parse_cached(&text)?;
            let executor = QueryExecutor::with_config(&self.index, &self.config);
            let records = executor.execute(&query)?;
            let result = QueryResult {
                nhits: records.nhits(),
                records: records.records().to_vec(),
            };
            bodies.push(serde_json::to_string(&result)?);

            let rest = query.rest;
            if rest.trim().is_empty() {
                return Ok(());
            }
            if rest.len() >= text.len() {
                return Err(Error::invalid_argument(format!(
                    "query makes no progress at {:?}",
                    rest
                )));
            }
            log::debug!("continuing with remainder {:?}", rest);
            text = rest;
        }
    }

    fn run_statement(&mut self, statement: &str, quiet: bool) -> Result<VecDeque<Response>> {
        let mut bodies = Vec::new();
        let mut quit = false;
        for query in split_statement(statement) {
            if query == QUIT_STATEMENT {
                quit = true;
                break;
            }
            self.run_query(query, &mut bodies)?;
        }

        if quit {
            self.closed = true;
            if bodies.is_empty() || quiet {
                bodies = vec![String::new()];
            }
        } else if quiet || bodies.is_empty() {
            bodies = vec![String::new()];
        }

        let last = bodies.len() - 1;
        Ok(bodies
            .into_iter()
            .enumerate()
            .map(|(i, body)| {
                let mut flags = CtxFlags::new();
                if i == 0 {
                    flags = flags.with(CtxFlags::HEAD);
                }
                if i == last {
                    flags = flags.with(CtxFlags::TAIL);
                    if quit {
                        flags = flags.with(CtxFlags::QUIT);
                    }
                } else {
                    flags = flags.with(CtxFlags::MORE);
                }
                Response { body, flags }
            })
            .collect())
    }
}

impl<I: Index> Session for Context<I> {
    fn send(&mut self, fragment: &str, flags: CtxFlags) -> Result<bool> {
        self.ensure_open()?;
        match self.state {
            State::AwaitingValue => self.fill(fragment),
            State::Idle => {
                self.start_statement();
                self.append(fragment);
            }
            State::Assembling => self.append(fragment),
        }
        self.quiet |= flags.is_quiet();

        self.state = if self.holes > 0 {
            State::AwaitingValue
        } else if flags.is_more() {
            State::Assembling
        } else {
            let statement = self.assemble();
            log::debug!("statement complete: {:?}", statement);
            self.statements.push_back((statement, self.quiet));
            State::Idle
        };
        Ok(self.state == State::Idle)
    }

    fn recv(&mut self) -> Result<Response> {
        self.ensure_open()?;
        if self.queue.is_empty()
            && let Some((statement, quiet)) = self.statements.pop_front()
        {
            self.queue = self.run_statement(&statement, quiet)?;
        }
        self.queue
            .pop_front()
            .ok_or_else(|| Error::protocol("recv with no pending statement"))
    }
}

/// Quote `value` as a phrase so it is never read as query syntax.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Split a statement on `;` outside quotes, dropping blank parts.
fn split_statement(statement: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quote = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, ch) in statement.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_quote = !in_quote,
            ';' if !in_quote => {
                parts.push(&statement[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&statement[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}
