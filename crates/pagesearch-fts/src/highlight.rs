//! Best-fragment highlighting.
//!
//! A [`Highlighter`] is built once per field for a result set and then asked
//! for the best fragment of each hit's stored text. Providers with native
//! highlighting return their own implementation; everything else falls back
//! to [`TermHighlighter`].
//!
//! `TermHighlighter` splits the text into fragments of roughly
//! `fragment_size` characters (always on word boundaries), scores each
//! fragment by the summed weight of the distinct query terms it contains,
//! and returns the best one with every matching word wrapped in the pre/post
//! tags.

use std::collections::HashSet;

/// Markup and size settings for highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightOptions {
    /// Inserted before each match.
    pub pre_tag: String,
    /// Inserted after each match.
    pub post_tag: String,
    /// Target fragment length in characters; zero means the whole text.
    pub fragment_size: usize,
}

impl HighlightOptions {
    /// Create highlight options.
    pub fn new(pre_tag: impl Into<String>, post_tag: impl Into<String>, fragment_size: usize) -> Self {
        Self {
            pre_tag: pre_tag.into(),
            post_tag: post_tag.into(),
            fragment_size,
        }
    }
}

/// Finds and marks up the best fragment of a stored value.
pub trait Highlighter: Send {
    /// Best-scoring highlighted fragment, or `None` when no query term occurs
    /// in `text`.
    fn best_fragment(&self, text: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq)]
enum Term {
    Word { text: String, prefix: bool, weight: f32 },
    Phrase { words: Vec<String>, weight: f32 },
}

impl Term {
    fn weight(&self) -> f32 {
        match self {
            Term::Word { weight, .. } | Term::Phrase { weight, .. } => *weight,
        }
    }
}

#[derive(Debug)]
struct Token {
    start: usize,
    end: usize,
    char_start: usize,
    char_end: usize,
    lower: String,
}

#[derive(Debug)]
struct Fragment {
    start: usize,
    end: usize,
    first_token: usize,
    end_token: usize,
}

/// Query-term highlighter that needs no index access.
#[derive(Debug, Clone)]
pub struct TermHighlighter {
    terms: Vec<Term>,
    options: HighlightOptions,
}

impl TermHighlighter {
    /// Build from a field-less query string such as `cat~0.8 dog*^0.5 "big dog" `.
    ///
    /// Fuzzy suffixes are ignored (the term itself is matched), a trailing `*`
    /// makes a prefix match and `^boost` sets the term's weight.
    pub fn from_query(query: &str, options: HighlightOptions) -> Self {
        let terms = query_tokens(query)
            .into_iter()
            .filter_map(parse_term)
            .collect();
        Self { terms, options }
    }

    /// Returns whether the query produced no usable terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Highlighter for TermHighlighter {
    fn best_fragment(&self, text: &str) -> Option<String> {
        if self.terms.is_empty() || text.trim().is_empty() {
            return None;
        }

        let tokens = tokenize(text);
        let matches = self.match_tokens(&tokens);
        if matches.iter().all(Option::is_none) {
            return None;
        }

        let fragments = fragments(text, &tokens, self.options.fragment_size);
        let mut best: Option<(&Fragment, f32)> = None;
        for fragment in &fragments {
            let distinct: HashSet<usize> = matches[fragment.first_token..fragment.end_token]
                .iter()
                .flatten()
                .copied()
                .collect();
            let score: f32 = distinct.iter().map(|&t| self.terms[t].weight()).sum();
            if score > 0.0 && best.is_none_or(|(_, s)| score > s) {
                best = Some((fragment, score));
            }
        }

        let (fragment, _) = best?;
        let end = capped_end(text, fragment, self.options.fragment_size);
        let mut out = String::with_capacity(end - fragment.start + 32);
        let mut cursor = fragment.start;
        for (token, matched) in tokens[fragment.first_token..fragment.end_token]
            .iter()
            .zip(&matches[fragment.first_token..fragment.end_token])
        {
            if token.start >= end {
                break;
            }
            if matched.is_some() {
                let token_end = token.end.min(end);
                out.push_str(&text[cursor..token.start]);
                out.push_str(&self.options.pre_tag);
                out.push_str(&text[token.start..token_end]);
                out.push_str(&self.options.post_tag);
                cursor = token_end;
            }
        }
        out.push_str(&text[cursor..end]);
        Some(out.trim().to_string())
    }
}

impl TermHighlighter {
    /// For each token, the index of the heaviest term matching it.
    fn match_tokens(&self, tokens: &[Token]) -> Vec<Option<usize>> {
        let mut matches: Vec<Option<usize>> = vec![None; tokens.len()];
        let mark = |matches: &mut Vec<Option<usize>>, at: usize, term: usize| {
            let heavier = matches[at].is_none_or(|cur| self.terms[term].weight() > self.terms[cur].weight());
            if heavier {
                matches[at] = Some(term);
            }
        };

        for (ti, term) in self.terms.iter().enumerate() {
            match term {
                Term::Word { text, prefix, .. } => {
                    for (j, token) in tokens.iter().enumerate() {
                        let hit = if *prefix {
                            token.lower.starts_with(text.as_str())
                        } else {
                            token.lower == *text
                        };
                        if hit {
                            mark(&mut matches, j, ti);
                        }
                    }
                }
                Term::Phrase { words, .. } => {
                    if words.len() > tokens.len() {
                        continue;
                    }
                    for j in 0..=(tokens.len() - words.len()) {
                        let hit = words
                            .iter()
                            .zip(&tokens[j..j + words.len()])
                            .all(|(w, t)| t.lower == *w);
                        if hit {
                            for k in j..j + words.len() {
                                mark(&mut matches, k, ti);
                            }
                        }
                    }
                }
            }
        }
        matches
    }
}

/// One whitespace-separated piece of a highlight query.
#[derive(Debug, PartialEq)]
enum RawToken {
    /// `"phrase"` plus whatever was glued after the closing quote.
    Quoted { phrase: String, suffix: String },
    /// Anything else, escapes still in place.
    Bare(String),
}

/// Split a query string into raw tokens, keeping quoted spans together.
fn query_tokens(query: &str) -> Vec<RawToken> {
    let mut out = Vec::new();
    let mut chars = query.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' {
            chars.next();
            let mut phrase = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(next) = chars.next() {
                            phrase.push(next);
                        }
                    }
                    '"' => break,
                    _ => phrase.push(c),
                }
            }
            let mut suffix = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                suffix.push(c);
                chars.next();
            }
            out.push(RawToken::Quoted { phrase, suffix });
        } else {
            let mut raw = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                chars.next();
                raw.push(c);
                if c == '\\'
                    && let Some(next) = chars.next()
                {
                    raw.push(next);
                }
            }
            out.push(RawToken::Bare(raw));
        }
    }
    out
}

/// Turn a raw query token into a highlight term.
fn parse_term(token: RawToken) -> Option<Term> {
    let raw = match token {
        RawToken::Quoted { phrase, suffix } => {
            return term_from_words(words_of(&phrase), false, boost_of(&suffix));
        }
        RawToken::Bare(raw) => raw,
    };

    // Walk the token once, separating escaped characters from operators.
    let mut text = String::new();
    let mut prefix = false;
    let mut suffix = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    text.push(next);
                }
            }
            '*' => prefix = true,
            '~' | '^' => {
                suffix.push(c);
                suffix.extend(chars.by_ref());
            }
            ':' => text.clear(),
            _ => text.push(c),
        }
    }
    term_from_words(words_of(&text), prefix, boost_of(&suffix))
}

fn term_from_words(words: Vec<String>, prefix: bool, weight: f32) -> Option<Term> {
    match words.len() {
        0 => None,
        1 => words.into_iter().next().map(|text| Term::Word {
            text,
            prefix,
            weight,
        }),
        _ => Some(Term::Phrase { words, weight }),
    }
}

/// Weight from a `~x^y` style suffix; 1.0 when there is no boost.
fn boost_of(suffix: &str) -> f32 {
    suffix
        .split_once('^')
        .and_then(|(_, b)| b.split('~').next())
        .and_then(|b| b.parse::<f32>().ok())
        .filter(|b| *b > 0.0)
        .unwrap_or(1.0)
}

fn words_of(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut char_pos = 0;

    for (byte_pos, c) in text.char_indices() {
        if c.is_alphanumeric() {
            if current.is_none() {
                current = Some((byte_pos, char_pos));
            }
        } else if let Some((start, char_start)) = current.take() {
            tokens.push(Token {
                start,
                end: byte_pos,
                char_start,
                char_end: char_pos,
                lower: text[start..byte_pos].to_lowercase(),
            });
        }
        char_pos += 1;
    }
    if let Some((start, char_start)) = current {
        tokens.push(Token {
            start,
            end: text.len(),
            char_start,
            char_end: char_pos,
            lower: text[start..].to_lowercase(),
        });
    }
    tokens
}

/// Consecutive fragments of about `size` characters, each starting on a token.
fn fragments(text: &str, tokens: &[Token], size: usize) -> Vec<Fragment> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut start_char = 0;
    let mut first_token = 0;

    if size > 0 {
        for (j, token) in tokens.iter().enumerate() {
            if j > first_token && token.char_end - start_char > size {
                out.push(Fragment {
                    start,
                    end: token.start,
                    first_token,
                    end_token: j,
                });
                start = token.start;
                start_char = token.char_start;
                first_token = j;
            }
        }
    }
    out.push(Fragment {
        start,
        end: text.len(),
        first_token,
        end_token: tokens.len(),
    });
    out
}

/// Byte offset where a fragment stops once cut to `size` characters.
///
/// Fragments start on a token, so only a single word longer than `size`
/// is ever cut.
fn capped_end(text: &str, fragment: &Fragment, size: usize) -> usize {
    if size == 0 {
        return fragment.end;
    }
    text[fragment.start..fragment.end]
        .char_indices()
        .nth(size)
        .map_or(fragment.end, |(offset, _)| fragment.start + offset)
}

// ============================================================================
// Tests
// ============================================================================
