/*!
 * Tokenizer and reader shared by the Praat text dialects.
 *
 * Both TextGrid text forms (and the KlattGrid text form) are a sequence of
 * numbers, quoted strings and `<exists>`/`<absent>` flags. The long form
 * prefixes each value with a field name (`xmin = 0`), the short form writes
 * bare values one per line. The tokenizer records the field name in front of a
 * value, if any, so a reader can check it in the long form and ignore it in
 * the short form. Bracketed indices (`item [1]:`) and `!` comments are skipped.
 */

use super::{RawEntry, RawTextgrid, RawTier};
use crate::errors::{Result, TextgridError};
use crate::textgrid::TierKind;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Number(f64),
    Text(String),
    Flag(bool),
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    /// Field name written before the value on the same line
    pub key: Option<String>,
    pub value: Value,
    pub line: usize,
}

/// Whether values carry field names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    Keyed,
    Positional,
}

pub(crate) fn tokenize(data: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = data.chars().peekable();
    let mut line = 1;
    let mut key_words: Vec<String> = Vec::new();

    fn push(tokens: &mut Vec<Token>, key_words: &mut Vec<String>, value: Value, line: usize) {
        let key = if key_words.is_empty() { None } else { Some(key_words.join(" ")) };
        key_words.clear();
        tokens.push(Token { key, value, line });
    }

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                chars.next();
                line += 1;
                key_words.clear();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '!' => {
                while chars.peek().is_some_and(|&ch| ch != '\n') {
                    chars.next();
                }
            }
            '=' | ':' => {
                chars.next();
            }
            '[' => {
                while let Some(ch) = chars.next() {
                    if ch == ']' {
                        break;
                    }
                }
            }
            '"' => {
                chars.next();
                let start_line = line;
                let mut text = String::new();
                loop {
                    match chars.next() {
                        None => {
                            return Err(TextgridError::Parse(format!(
                                "unterminated string starting on line {}",
                                start_line
                            )));
                        }
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            text.push('"');
                        }
                        Some('"') => break,
                        Some(ch) => {
                            if ch == '\n' {
                                line += 1;
                            }
                            text.push(ch);
                        }
                    }
                }
                push(&mut tokens, &mut key_words, Value::Text(text), start_line);
            }
            '<' => {
                chars.next();
                let mut word = String::new();
                while let Some(ch) = chars.next() {
                    if ch == '>' {
                        break;
                    }
                    word.push(ch);
                }
                let flag = match word.as_str() {
                    "exists" => true,
                    "absent" => false,
                    other => {
                        return Err(TextgridError::Parse(format!("line {}: unknown flag <{}>", line, other)));
                    }
                };
                push(&mut tokens, &mut key_words, Value::Flag(flag), line);
            }
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || ch == '!' {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                let number = word.parse::<f64>().map_err(|_| {
                    TextgridError::Parse(format!("line {}: '{}' is not a number", line, word))
                })?;
                push(&mut tokens, &mut key_words, Value::Number(number), line);
            }
            _ => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '=' | '[' | '"' | '<' | '!') {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                let word = word.trim_end_matches(['?', ':']);
                if !word.is_empty() {
                    key_words.push(word.to_string());
                }
            }
        }
    }

    Ok(tokens)
}

/// Cursor over tokens with typed accessors
pub(crate) struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
    layout: Layout,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, layout: Layout) -> Self {
        Self { tokens, position: 0, layout }
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    pub fn peek_key(&self) -> Option<&str> {
        self.peek().and_then(|t| t.key.as_deref())
    }

    fn take(&mut self, keys: &[&str], what: &str) -> Result<&Token> {
        let token = self.tokens.get(self.position).ok_or_else(|| {
            TextgridError::Parse(format!("unexpected end of input, expected {}", what))
        })?;
        if self.layout == Layout::Keyed {
            let matches = token.key.as_deref().is_some_and(|k| keys.contains(&k));
            if !matches {
                return Err(TextgridError::Parse(format!(
                    "line {}: expected field '{}' ({}), found {}",
                    token.line,
                    keys.first().copied().unwrap_or_default(),
                    what,
                    token.key.as_deref().unwrap_or("a bare value")
                )));
            }
        }
        self.position += 1;
        Ok(token)
    }

    pub fn number(&mut self, keys: &[&str], what: &str) -> Result<f64> {
        let token = self.take(keys, what)?;
        match &token.value {
            Value::Number(n) => Ok(*n),
            other => Err(TextgridError::Parse(format!("line {}: expected a number for {}, found {:?}", token.line, what, other))),
        }
    }

    pub fn text(&mut self, keys: &[&str], what: &str) -> Result<String> {
        let token = self.take(keys, what)?;
        match &token.value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(TextgridError::Parse(format!("line {}: expected a string for {}, found {:?}", token.line, what, other))),
        }
    }

    pub fn flag(&mut self, keys: &[&str], what: &str) -> Result<bool> {
        let token = self.take(keys, what)?;
        match &token.value {
            Value::Flag(b) => Ok(*b),
            other => Err(TextgridError::Parse(format!("line {}: expected <exists> for {}, found {:?}", token.line, what, other))),
        }
    }

    /// A non-negative integer count
    pub fn count(&mut self, keys: &[&str], what: &str) -> Result<usize> {
        let value = self.number(keys, what)?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(TextgridError::Parse(format!("{} must be a whole number, found {}", what, value)));
        }
        Ok(value as usize)
    }

    pub fn is_done(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn expect_end(&self, context: &str) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(TextgridError::Parse(format!(
                "line {}: unexpected content after {}",
                token.line, context
            ))),
        }
    }
}

/// Reads `File type` and `Object class`, which are keyed in every text form
pub(crate) fn read_header(stream: &mut TokenStream, object_class: &str) -> Result<()> {
    let file_type = stream.text(&["File type"], "file type")?;
    if !file_type.starts_with("ooTextFile") {
        return Err(TextgridError::Parse(format!("unsupported file type '{}'", file_type)));
    }
    let class = stream.text(&["Object class"], "object class")?;
    if class != object_class {
        return Err(TextgridError::Parse(format!("expected a {} but found a {}", object_class, class)));
    }
    Ok(())
}

/// The form of a TextGrid text file: keyed when the first value after the
/// header has a field name, positional otherwise
pub(crate) fn detect_layout(data: &str) -> Result<Layout> {
    let mut stream = TokenStream::new(tokenize(data)?, Layout::Keyed);
    read_header(&mut stream, "TextGrid")?;
    Ok(body_layout(&stream))
}

fn body_layout(stream: &TokenStream) -> Layout {
    if stream.peek_key().is_some() { Layout::Keyed } else { Layout::Positional }
}

/// Parses a TextGrid in either text form. With `layout` unset the form is
/// inferred as in `detect_layout`.
pub(crate) fn read_textgrid(data: &str, layout: Option<Layout>) -> Result<(RawTextgrid, Layout)> {
    let mut stream = TokenStream::new(tokenize(data)?, Layout::Keyed);
    read_header(&mut stream, "TextGrid")?;

    let layout = layout.unwrap_or_else(|| body_layout(&stream));
    stream.set_layout(layout);

    let xmin = stream.number(&["xmin"], "textgrid start")?;
    let xmax = stream.number(&["xmax"], "textgrid end")?;
    let has_tiers = stream.flag(&["tiers"], "tier flag")?;
    let tier_count = if has_tiers { stream.count(&["size"], "tier count")? } else { 0 };

    // grown as tiers are read; the declared count is untrusted
    let mut tiers = Vec::new();
    for index in 1..=tier_count {
        if stream.is_done() {
            return Err(TextgridError::Parse(format!(
                "file declares {} tiers but ends after {}",
                tier_count,
                index - 1
            )));
        }
        tiers.push(read_tier(&mut stream, index)?);
    }
    stream.expect_end(&format!("the {} declared tiers", tier_count))?;

    Ok((RawTextgrid { xmin, xmax, tiers }, layout))
}

fn read_tier(stream: &mut TokenStream, index: usize) -> Result<RawTier> {
    let class = stream.text(&["class"], "tier class")?;
    let kind = TierKind::from_class_name(&class)
        .ok_or_else(|| TextgridError::Parse(format!("tier {} has unknown class '{}'", index, class)))?;
    let name = stream.text(&["name"], "tier name")?;
    let xmin = stream.number(&["xmin"], "tier start")?;
    let xmax = stream.number(&["xmax"], "tier end")?;

    let mut entries = Vec::new();
    match kind {
        TierKind::Interval => {
            let count = stream.count(&["intervals size"], "interval count")?;
            for _ in 0..count {
                let start = stream.number(&["xmin"], "interval start")?;
                let end = stream.number(&["xmax"], "interval end")?;
                let label = stream.text(&["text"], "interval text")?;
                entries.push(RawEntry { start, end, label });
            }
        }
        TierKind::Point => {
            let count = stream.count(&["points size"], "point count")?;
            for _ in 0..count {
                let time = stream.number(&["number", "time"], "point time")?;
                let label = stream.text(&["mark"], "point mark")?;
                entries.push(RawEntry { start: time, end: time, label });
            }
        }
    }

    Ok(RawTier { kind, name, xmin: Some(xmin), xmax: Some(xmax), entries })
}

/// Quotes a label for the text forms, doubling embedded quotes
pub(crate) fn quote(label: &str) -> String {
    format!("\"{}\"", label.replace('"', "\"\""))
}
