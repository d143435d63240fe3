//! In-memory reference index.
//!
//! Holds documents as sections of plain text and answers every match mode by
//! scanning them in parallel. Good enough to drive the executor end to end;
//! it keeps no postings lists.

use ahash::AHashSet;
use memchr::memmem;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::types::{DEFAULT_MAX_INTERVAL, Encoding, LookupRequest, MatchMode, Posting, Postings};
use super::Index;
use crate::error::Result;
use crate::records::RecordKey;
use crate::utils::{normalize, tokenize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Section {
    key: RecordKey,
    section: u32,
    text: String,
    tokens: Vec<String>,
    starts: Vec<usize>,
}

/// A match inside one section: occurrence count and first token position.
type SectionHit = (usize, usize);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryIndex {
    sections: Vec<Section>,
    encoding: Encoding,
    normalize: bool,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
            encoding: Encoding::Utf8,
            normalize: true,
        }
    }

    /// Encoding used to tokenize added documents.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Case-fold documents and terms (on by default).
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Index `text` as section `section` of document `key`.
    pub fn add(&mut self, key: impl Into<RecordKey>, section: u32, text: &str) {
        let text = self.fold(text);
        let (tokens, starts): (Vec<String>, Vec<usize>) = tokenize(&text, self.encoding)
            .into_iter()
            .map(|t| (t.text.to_string(), t.start))
            .unzip();
        self.sections.push(Section {
            key: key.into(),
            section,
            text,
            tokens,
            starts,
        });
    }

    /// Index a document whose sections are numbered from 1.
    pub fn add_document<S: AsRef<str>>(&mut self, key: impl Into<RecordKey>, sections: &[S]) {
        let key = key.into();
        for (i, text) in sections.iter().enumerate() {
            self.add(key.clone(), i as u32 + 1, text.as_ref());
        }
    }

    /// Number of indexed sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn fold(&self, text: &str) -> String {
        if self.normalize {
            normalize(text)
        } else {
            text.to_string()
        }
    }
}

impl Index for MemoryIndex {
    fn lookup(&self, req: &LookupRequest<'_>) -> Result<Postings<'_>> {
        let term = self.fold(req.term);
        let terms: Vec<&str> = tokenize(&term, req.encoding).into_iter().map(|t| t.text).collect();
        if terms.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }

        let hits: Vec<Posting> = self
            .sections
            .par_iter()
            .filter_map(|s| {
                match_section(s, &term, &terms, req).map(|(count, position)| Posting {
                    key: s.key.clone(),
                    section: s.section,
                    position: position as u32,
                    score: i32::try_from(count).unwrap_or(i32::MAX),
                })
            })
            .collect();

        Ok(Box::new(hits.into_iter()))
    }
}

fn match_section(s: &Section, term: &str, terms: &[&str], req: &LookupRequest<'_>) -> Option<SectionHit> {
    match req.mode {
        MatchMode::Exact => windows(&s.tokens, terms, |doc, t| doc == t),
        MatchMode::Partial => windows(&s.tokens, terms, |doc, t| doc.contains(t)),
        MatchMode::Prefix => {
            let last = terms.len() - 1;
            windows_at(&s.tokens, terms, |i, doc, t| {
                if i == last { doc.starts_with(t) } else { doc == t }
            })
        }
        MatchMode::Suffix => windows_at(&s.tokens, terms, |i, doc, t| {
            if i == 0 { doc.ends_with(t) } else { doc == t }
        }),
        MatchMode::Unsplit => unsplit(s, term),
        MatchMode::Near => near(&s.tokens, terms, window(req.option), true),
        MatchMode::Near2 => near(&s.tokens, terms, window(req.option), false),
        MatchMode::Similar => similar(&s.tokens, terms, req.option),
        MatchMode::TermExtract => term_extract(&s.tokens, term),
    }
}

fn window(option: i32) -> usize {
    if option > 0 {
        option as usize
    } else {
        DEFAULT_MAX_INTERVAL as usize
    }
}

fn windows<F>(tokens: &[String], terms: &[&str], eq: F) -> Option<SectionHit>
where
    F: Fn(&str, &str) -> bool,
{
    windows_at(tokens, terms, |_, doc, t| eq(doc, t))
}

/// Count runs of consecutive tokens matching `terms` pairwise.
fn windows_at<F>(tokens: &[String], terms: &[&str], eq: F) -> Option<SectionHit>
where
    F: Fn(usize, &str, &str) -> bool,
{
    let mut hit: Option<SectionHit> = None;
    for (pos, w) in tokens.windows(terms.len()).enumerate() {
        if w.iter().zip(terms).enumerate().all(|(i, (doc, t))| eq(i, doc.as_str(), *t)) {
            let (count, first) = hit.unwrap_or((0, pos));
            hit = Some((count + 1, first));
        }
    }
    hit
}

fn unsplit(s: &Section, term: &str) -> Option<SectionHit> {
    let mut offsets = memmem::find_iter(s.text.as_bytes(), term.as_bytes());
    let first = offsets.next()?;
    let count = 1 + offsets.count();
    let position = s.starts.partition_point(|&start| start <= first).saturating_sub(1);
    Some((count, position))
}

fn near(tokens: &[String], terms: &[&str], window: usize, ordered: bool) -> Option<SectionHit> {
    let wanted: AHashSet<&str> = terms.iter().copied().collect();
    let mut hit: Option<SectionHit> = None;
    for (pos, tok) in tokens.iter().enumerate() {
        let starts_run = if ordered { tok == terms[0] } else { wanted.contains(tok.as_str()) };
        if !starts_run {
            continue;
        }
        let end = (pos + window).min(tokens.len());
        let span = &tokens[pos..end];
        let found = if ordered {
            in_order(span, terms)
        } else {
            wanted.iter().all(|t| span.iter().any(|doc| doc == t))
        };
        if found {
            let (count, first) = hit.unwrap_or((0, pos));
            hit = Some((count + 1, first));
        }
    }
    hit
}

fn in_order(span: &[String], terms: &[&str]) -> bool {
    let mut rest = terms.iter();
    let mut want = rest.next();
    for doc in span {
        match want {
            Some(t) if doc == t => want = rest.next(),
            Some(_) => {}
            None => break,
        }
    }
    want.is_none()
}

/// Shared distinct tokens. A positive `threshold` caps how many query
/// tokens take part.
fn similar(tokens: &[String], terms: &[&str], threshold: i32) -> Option<SectionHit> {
    let mut seen = AHashSet::new();
    let mut query: Vec<&str> = terms.iter().copied().filter(|t| seen.insert(*t)).collect();
    if threshold > 0 {
        query.truncate(threshold as usize);
    }
    let mut shared = 0;
    let mut first = None;
    for t in query {
        if let Some(pos) = tokens.iter().position(|doc| doc == t) {
            shared += 1;
            first = Some(first.map_or(pos, |f: usize| f.min(pos)));
        }
    }
    first.map(|f| (shared, f))
}

/// Distinct document tokens that occur inside the term text.
fn term_extract(tokens: &[String], term: &str) -> Option<SectionHit> {
    let mut seen = AHashSet::new();
    let mut hit: Option<SectionHit> = None;
    for (pos, doc) in tokens.iter().enumerate() {
        if seen.insert(doc.as_str()) && memmem::find(term.as_bytes(), doc.as_bytes()).is_some() {
            let (count, first) = hit.unwrap_or((0, pos));
            hit = Some((count + 1, first));
        }
    }
    hit
}
