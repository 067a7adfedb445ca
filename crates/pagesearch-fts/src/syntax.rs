//! Query string syntax shared by the search providers.
//!
//! Parses the subset [`QueryBuilder`](crate::QueryBuilder) emits into a small
//! clause tree:
//!
//! - `field:word`, `field:"a phrase"`, backslash escapes
//! - suffixes `*` (prefix), `~0.8` (fuzzy), `^10` (boost)
//! - `( ... )` groups, `+` required groups, `AND`, `OR`, implicit OR
//!
//! Fuzzy clauses use similarity semantics: `~0.8` on a six letter word
//! tolerates one edit. Providers turn the tree into their own matchers.

use pagesearch_core::{Error, Result};

/// Maximum edit distance a fuzzy clause tolerates.
pub(crate) const MAX_EDITS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Clause(Clause),
    /// Children joined by OR; required children must all match.
    Group(Vec<Occur>),
    /// Children that must all match.
    And(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Occur {
    pub(crate) node: Node,
    pub(crate) required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Clause {
    pub(crate) field: Option<String>,
    /// Unescaped value as written, before tokenizing.
    pub(crate) value: String,
    pub(crate) matcher: Matcher,
    pub(crate) boost: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Matcher {
    Word {
        text: String,
        fuzzy: Option<f64>,
        prefix: bool,
    },
    Phrase(Vec<String>),
}

/// Edits a fuzzy word of this length tolerates at the given similarity.
pub(crate) fn allowed_edits(text: &str, similarity: f64) -> usize {
    let len = text.chars().count() as f64;
    (((1.0 - similarity) * len).floor() as usize).min(MAX_EDITS)
}

/// Lower-cased alphanumeric runs.
pub(crate) fn tokenize(value: &str) -> Vec<String> {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Plus,
    And,
    Or,
    Term(String),
}

fn lex(query: &str) -> Vec<Token> {
    let chars: Vec<char> = query.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            _ => {
                let start = i;
                let mut in_quotes = false;
                while i < chars.len() {
                    let c = chars[i];
                    if c == '\\' {
                        i += 2;
                        continue;
                    }
                    if c == '"' {
                        in_quotes = !in_quotes;
                    } else if !in_quotes && (c.is_whitespace() || c == ')' || c == '(') {
                        break;
                    }
                    i += 1;
                }
                let raw: String = chars[start..i.min(chars.len())].iter().collect();
                tokens.push(match raw.as_str() {
                    "AND" | "&&" => Token::And,
                    "OR" | "||" => Token::Or,
                    _ => Token::Term(raw),
                });
            }
        }
    }
    tokens
}

/// Parse a query string into a clause tree.
pub(crate) fn parse_query(query: &str) -> Result<Node> {
    let tokens = lex(query);
    let mut parser = Parser { tokens, pos: 0 };
    let node = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(Error::operation(format!(
            "unexpected token at position {} in query '{query}'",
            parser.pos
        )));
    }
    Ok(node)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_or(&mut self) -> Result<Node> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::Close) => break,
                Some(Token::Or) => {
                    self.pos += 1;
                    continue;
                }
                _ => items.push(self.parse_and()?),
            }
        }
        if items.len() == 1 && !items[0].required {
            if let Some(only) = items.pop() {
                return Ok(only.node);
            }
        }
        Ok(Node::Group(items))
    }

    fn parse_and(&mut self) -> Result<Occur> {
        let first = self.parse_unary()?;
        if self.peek() != Some(&Token::And) {
            return Ok(first);
        }
        let mut required = first.required;
        let mut nodes = vec![first.node];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let next = self.parse_unary()?;
            required |= next.required;
            nodes.push(next.node);
        }
        Ok(Occur {
            node: Node::And(nodes),
            required,
        })
    }

    fn parse_unary(&mut self) -> Result<Occur> {
        let required = self.peek() == Some(&Token::Plus);
        if required {
            self.pos += 1;
        }
        let node = match self.tokens.get(self.pos).cloned() {
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if self.peek() != Some(&Token::Close) {
                    return Err(Error::operation("unbalanced parenthesis in query"));
                }
                self.pos += 1;
                inner
            }
            Some(Token::Term(raw)) => {
                self.pos += 1;
                Node::Clause(parse_clause(&raw))
            }
            other => {
                return Err(Error::operation(format!(
                    "expected a term or group, found {other:?}"
                )));
            }
        };
        Ok(Occur { node, required })
    }
}

/// Parse `field:value[*][~fuzzy][^boost]`.
fn parse_clause(raw: &str) -> Clause {
    let chars: Vec<char> = raw.chars().collect();
    let mut field = None;
    let mut i = 0;

    // Field prefix ends at the first unescaped ':' outside quotes.
    let mut j = 0;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            '"' => break,
            ':' => {
                field = Some(unescape(&chars[..j]));
                i = j + 1;
                break;
            }
            _ => j += 1,
        }
    }

    let mut value = String::new();
    let quoted = chars.get(i) == Some(&'"');
    if quoted {
        i += 1;
        while i < chars.len() && chars[i] != '"' {
            if chars[i] == '\\' {
                i += 1;
            }
            if let Some(&c) = chars.get(i) {
                value.push(c);
            }
            i += 1;
        }
        i += 1;
    } else {
        while i < chars.len() && !matches!(chars[i], '*' | '~' | '^') {
            if chars[i] == '\\' {
                i += 1;
            }
            if let Some(&c) = chars.get(i) {
                value.push(c);
            }
            i += 1;
        }
    }

    let mut prefix = false;
    let mut fuzzy = None;
    let mut boost = 1.0_f32;
    while i < chars.len() {
        let sigil = chars[i];
        i += 1;
        let start = i;
        while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
            i += 1;
        }
        let number: String = chars[start..i].iter().collect();
        match sigil {
            '*' => prefix = true,
            '~' => fuzzy = Some(number.parse::<f64>().unwrap_or(0.5)),
            '^' => boost = number.parse::<f32>().unwrap_or(1.0),
            _ => {}
        }
    }

    let words = tokenize(&value);
    let matcher = if quoted || words.len() > 1 {
        Matcher::Phrase(words)
    } else {
        Matcher::Word {
            text: words.into_iter().next().unwrap_or_default(),
            fuzzy: fuzzy.filter(|f| *f > 0.0 && *f < 1.0),
            prefix,
        }
    };

    Clause {
        field,
        value,
        matcher,
        boost,
    }
}

fn unescape(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut escaped = false;
    for &c in chars {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        escaped = false;
        out.push(c);
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
