//! The delimiter scanner.

use crate::config::{DelimiterConfig, Delimiters};
use crate::{ExtractError, OffsetMap};
use graphql_types::OffsetRange;
use std::iter::FusedIterator;

/// Name prefix of the fragment stand-in substituted for `${...}`.
pub const INTERPOLATION_PREFIX: &str = "__Interpolation";
/// Name prefix given to `fragment on Type` when unnamed fragments are allowed.
pub const ANONYMOUS_FRAGMENT_PREFIX: &str = "__AnonymousFragment";

const FRAGMENT_KEYWORD: &str = "fragment";

/// Where a placeholder sits in the GraphQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterpolationKind {
    /// Between top-level definitions
    Document,
    /// Inside a selection set, where only a fragment spread is meaningful
    Fragment,
}

/// A `${...}` placeholder found inside a region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interpolation {
    pub kind: InterpolationKind,
    /// Placeholder span in the parent file, `${` through `}`
    pub parent: OffsetRange,
    /// Stand-in span in the extracted text
    pub graphql: OffsetRange,
    /// Fragment name used as the stand-in (fragment position only)
    pub stand_in: Option<String>,
}

/// One delimited region of the parent text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmbeddedCandidate {
    /// Span of the GraphQL body in the parent file (delimiters excluded)
    pub range: OffsetRange,
    /// The GraphQL text, with stand-ins substituted
    pub text: String,
    pub offset_map: OffsetMap,
    pub interpolations: Vec<Interpolation>,
    /// Extraction problems. A candidate with errors is not parsed.
    pub errors: Vec<ExtractError>,
}

impl EmbeddedCandidate {
    /// A candidate spanning a whole `.graphql` file.
    #[must_use]
    pub fn whole_file(text: &str) -> Self {
        Self {
            range: OffsetRange::new(0, text.len()),
            text: text.to_string(),
            offset_map: OffsetMap::identity(0, text.len()),
            interpolations: Vec::new(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_parseable(&self) -> bool {
        self.errors.is_empty()
    }

    /// Stand-in fragment names, in placeholder order.
    pub fn stand_in_names(&self) -> impl Iterator<Item = &str> {
        self.interpolations
            .iter()
            .filter_map(|interpolation| interpolation.stand_in.as_deref())
    }
}

/// Scan `source` for regions delimited by `delimiters`.
///
/// The returned iterator is lazy and fused: once it yields `None` it never
/// yields again.
#[must_use]
pub fn extract<'a>(source: &'a str, delimiters: &'a Delimiters) -> Extractor<'a> {
    Extractor {
        source,
        delimiters,
        cursor: 0,
        finished: false,
    }
}

/// Lazy iterator over [`EmbeddedCandidate`]s. See [`extract`].
#[derive(Debug)]
pub struct Extractor<'a> {
    source: &'a str,
    delimiters: &'a Delimiters,
    cursor: usize,
    finished: bool,
}

enum Region {
    Closed {
        body_end: usize,
        resume: usize,
        placeholders: Vec<OffsetRange>,
    },
    Open(ExtractError),
}

impl Extractor<'_> {
    /// Find the end of the region opened at `open_start`, whose body starts at
    /// `body_start`. Start matches inside the body are not boundaries.
    fn scan_region(&self, open_start: usize, body_start: usize) -> Region {
        let mut pos = body_start;
        let mut placeholders = Vec::new();
        let mut close = self.delimiters.end.find_at(self.source, pos);
        loop {
            // an end match swallowed by a placeholder is no longer a candidate
            if close.is_some_and(|m| m.start() < pos) {
                close = self.delimiters.end.find_at(self.source, pos);
            }
            let limit = close.map_or(self.source.len(), |m| m.start());
            let placeholder = self.source[pos..limit].find("${").map(|i| pos + i);
            match (placeholder, close) {
                (Some(at), _) => {
                    let Some(brace) = matching_brace(self.source.as_bytes(), at + 1) else {
                        return Region::Open(ExtractError::UnbalancedInterpolation { offset: at });
                    };
                    placeholders.push(OffsetRange::new(at, brace + 1));
                    pos = brace + 1;
                }
                (_, Some(m)) => {
                    return Region::Closed {
                        body_end: m.start(),
                        resume: m.end(),
                        placeholders,
                    };
                }
                (_, None) => {
                    return Region::Open(ExtractError::Unterminated { offset: open_start });
                }
            }
        }
    }
}

impl Iterator for Extractor<'_> {
    type Item = EmbeddedCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let Some(open) = self.delimiters.start.find_at(self.source, self.cursor) else {
            self.finished = true;
            return None;
        };
        let body_start = open.end();

        match self.scan_region(open.start(), body_start) {
            Region::Closed {
                body_end,
                resume,
                placeholders,
            } => {
                self.cursor = resume;
                let mut assembler = Assembler::new(self.delimiters.config());
                let mut pos = body_start;
                for (index, placeholder) in placeholders.iter().enumerate() {
                    assembler.verbatim(&self.source[pos..placeholder.start], pos);
                    assembler.placeholder(index, *placeholder);
                    pos = placeholder.end;
                }
                assembler.verbatim(&self.source[pos..body_end], pos);
                let candidate = assembler.finish(OffsetRange::new(body_start, body_end));
                tracing::trace!(
                    range = %candidate.range,
                    interpolations = candidate.interpolations.len(),
                    errors = candidate.errors.len(),
                    "extracted region"
                );
                Some(candidate)
            }
            Region::Open(error) => {
                self.finished = true;
                let rest = &self.source[body_start..];
                Some(EmbeddedCandidate {
                    range: OffsetRange::new(body_start, self.source.len()),
                    text: rest.to_string(),
                    offset_map: OffsetMap::identity(body_start, rest.len()),
                    interpolations: Vec::new(),
                    errors: vec![error],
                })
            }
        }
    }
}

impl FusedIterator for Extractor<'_> {}

/// Index of the `}` closing the `{` at `open`, counting nested braces.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, byte) in bytes.iter().enumerate().skip(open) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Code,
    String,
    BlockString,
    Comment,
}

/// Just enough of a GraphQL lexer to know the selection-set depth and to
/// spot top-level `fragment on`. State carries across placeholders.
#[derive(Debug, Default)]
struct Lexer {
    depth: usize,
    mode: Mode,
}

impl Lexer {
    /// Scan one verbatim chunk. Returns chunk offsets right after each
    /// top-level `fragment` keyword that is directly followed by `on`.
    fn scan(&mut self, chunk: &[u8]) -> Vec<usize> {
        let mut unnamed = Vec::new();
        let mut i = 0;
        while i < chunk.len() {
            match self.mode {
                Mode::Comment => {
                    if chunk[i] == b'\n' {
                        self.mode = Mode::Code;
                    }
                    i += 1;
                }
                Mode::String => match chunk[i] {
                    b'\\' => i += 2,
                    b'"' | b'\n' => {
                        self.mode = Mode::Code;
                        i += 1;
                    }
                    _ => i += 1,
                },
                Mode::BlockString => {
                    if chunk[i..].starts_with(b"\\\"\"\"") {
                        i += 4;
                    } else if chunk[i..].starts_with(b"\"\"\"") {
                        self.mode = Mode::Code;
                        i += 3;
                    } else {
                        i += 1;
                    }
                }
                Mode::Code => match chunk[i] {
                    b'#' => {
                        self.mode = Mode::Comment;
                        i += 1;
                    }
                    b'"' if chunk[i..].starts_with(b"\"\"\"") => {
                        self.mode = Mode::BlockString;
                        i += 3;
                    }
                    b'"' => {
                        self.mode = Mode::String;
                        i += 1;
                    }
                    b'{' => {
                        self.depth += 1;
                        i += 1;
                    }
                    b'}' => {
                        self.depth = self.depth.saturating_sub(1);
                        i += 1;
                    }
                    byte if is_name_start(byte) => {
                        let end = name_end(chunk, i);
                        if self.depth == 0
                            && &chunk[i..end] == FRAGMENT_KEYWORD.as_bytes()
                            && followed_by_on(&chunk[end..])
                        {
                            unnamed.push(end);
                        }
                        i = end;
                    }
                    _ => i += 1,
                },
            }
        }
        unnamed
    }
}

const fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

const fn is_name_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn name_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_name_continue(bytes[end]) {
        end += 1;
    }
    end
}

fn followed_by_on(rest: &[u8]) -> bool {
    let skipped = rest
        .iter()
        .take_while(|b| b.is_ascii_whitespace() || **b == b',')
        .count();
    if skipped == 0 {
        return false;
    }
    let rest = &rest[skipped..];
    rest.starts_with(b"on") && rest.get(2).is_none_or(|b| !is_name_continue(*b))
}

/// Builds the extracted text and its offset map.
struct Assembler<'c> {
    config: &'c DelimiterConfig,
    text: String,
    map: OffsetMap,
    lexer: Lexer,
    interpolations: Vec<Interpolation>,
    errors: Vec<ExtractError>,
}

impl<'c> Assembler<'c> {
    fn new(config: &'c DelimiterConfig) -> Self {
        Self {
            config,
            text: String::new(),
            map: OffsetMap::default(),
            lexer: Lexer::default(),
            interpolations: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn copy(&mut self, chunk: &str, parent: usize) {
        self.map.push_verbatim(self.text.len(), parent, chunk.len());
        self.text.push_str(chunk);
    }

    fn verbatim(&mut self, chunk: &str, parent_start: usize) {
        let unnamed = self.lexer.scan(chunk.as_bytes());
        let mut from = 0;
        for at in unnamed {
            self.copy(&chunk[from..at], parent_start + from);
            let keyword_offset = parent_start + at - FRAGMENT_KEYWORD.len();
            if self.config.allow_fragment_without_name {
                let name = format!(" {ANONYMOUS_FRAGMENT_PREFIX}{keyword_offset}");
                self.map
                    .push_synthetic(self.text.len(), name.len(), parent_start + at, 0);
                self.text.push_str(&name);
            } else {
                self.errors.push(ExtractError::UnnamedFragment {
                    offset: keyword_offset,
                });
            }
            from = at;
        }
        self.copy(&chunk[from..], parent_start + from);
    }

    fn placeholder(&mut self, index: usize, span: OffsetRange) {
        let graphql_start = self.text.len();

        // Commented-out placeholders carry no meaning
        if self.lexer.mode == Mode::Comment {
            self.text.push_str(&" ".repeat(span.len()));
            self.map
                .push_synthetic(graphql_start, span.len(), span.start, span.len());
            return;
        }

        let kind = if self.lexer.depth == 0 {
            InterpolationKind::Document
        } else {
            InterpolationKind::Fragment
        };
        let allowed = match kind {
            InterpolationKind::Document => self.config.allow_document_interpolation,
            InterpolationKind::Fragment => self.config.allow_fragment_interpolation,
        };

        let stand_in = if allowed && kind == InterpolationKind::Fragment {
            let name = format!("{INTERPOLATION_PREFIX}{index}");
            if !self.text.trim_end().ends_with("...") {
                self.text.push_str("...");
            }
            self.text.push_str(&name);
            Some(name)
        } else {
            // Whitespace keeps the columns of the surrounding text intact
            self.text.push_str(&" ".repeat(span.len()));
            if !allowed {
                self.errors.push(match kind {
                    InterpolationKind::Document => {
                        ExtractError::DocumentInterpolation { offset: span.start }
                    }
                    InterpolationKind::Fragment => {
                        ExtractError::FragmentInterpolation { offset: span.start }
                    }
                });
            }
            None
        };

        let graphql = OffsetRange::new(graphql_start, self.text.len());
        self.map
            .push_synthetic(graphql_start, graphql.len(), span.start, span.len());
        self.interpolations.push(Interpolation {
            kind,
            parent: span,
            graphql,
            stand_in,
        });
    }

    fn finish(self, range: OffsetRange) -> EmbeddedCandidate {
        EmbeddedCandidate {
            range,
            text: self.text,
            offset_map: self.map,
            interpolations: self.interpolations,
            errors: self.errors,
        }
    }
}
