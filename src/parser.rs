//! Logo reader: turns tokens into instruction lines.
//!
//! Logo code is data: an instruction line is just a `List` of words and
//! nested lists, and the evaluator consumes it directly. The reader only
//! checks bracket structure and paren balance, and classifies numbers.

use crate::error::{LogoDiagnostic, LogoError};
use crate::lexer::{Lexer, Token, is_infix_char};
use crate::value::{List, Number, Value, Word};

/// Read a program: one `List` per logical instruction line.
pub fn parse_program(source: &str) -> Result<Vec<List>, LogoDiagnostic> {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(tokens).lines()
}

/// Read text as the contents of one data list, as READLIST does.
pub fn parse_list(source: &str) -> Result<List, LogoDiagnostic> {
    let tokens = Lexer::data(source).tokenize();
    let mut parser = Parser::new(tokens);
    let items = parser.items()?;
    match parser.next() {
        None => Ok(items),
        Some(_) => Err(LogoDiagnostic::new(LogoError::UnexpectedBracket)),
    }
}

/// Re-split a list for running: unquoted words that contain infix
/// operators are broken apart and numeric words become numbers.
pub fn runparse(list: &List) -> List {
    let mut out = Vec::new();
    for item in list {
        match item {
            Value::Word(Word::Text(text)) if needs_runparse(text) => {
                for token in Lexer::new(text).tokenize() {
                    match token {
                        Token::Word(word) => out.push(classify(word)),
                        Token::LeftParen => out.push(Value::word("(")),
                        Token::RightParen => out.push(Value::word(")")),
                        _ => {}
                    }
                }
            }
            other => out.push(other.clone()),
        }
    }
    out.into_iter().collect()
}

fn needs_runparse(text: &str) -> bool {
    !text.starts_with('"') && (text.contains(is_infix_char) || Number::parse(text).is_some())
}

/// Whether the REPL should keep reading before running `source`: a list
/// is still open, the last line ends in `~`, or a TO has no END yet.
pub fn is_incomplete(source: &str) -> bool {
    if source.trim_end().ends_with('~') && !source.trim_end().ends_with("\\~") {
        return true;
    }
    let mut depth = 0usize;
    let mut line_start = true;
    let mut defining = false;
    for token in Lexer::new(source).tokenize() {
        match token {
            Token::OpenBracket => depth += 1,
            Token::CloseBracket => depth = depth.saturating_sub(1),
            Token::Newline if depth == 0 => {
                line_start = true;
                continue;
            }
            Token::Word(ref w) if line_start && depth == 0 => {
                if w.eq_ignore_ascii_case("to") {
                    defining = true;
                } else if w.eq_ignore_ascii_case("end") {
                    defining = false;
                }
            }
            _ => {}
        }
        line_start = false;
    }
    depth > 0 || defining
}

/// Numbers outside brackets are read as numbers; everything else is text.
fn classify(text: String) -> Value {
    match Number::parse(&text) {
        Some(n) => Value::number(n),
        None => Value::Word(Word::from(text)),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }

    fn lines(&mut self) -> Result<Vec<List>, LogoDiagnostic> {
        let mut lines = Vec::new();
        let mut current = Vec::new();
        let mut parens = 0usize;
        while let Some(token) = self.next() {
            match token {
                Token::Newline => {
                    Self::finish_line(&mut lines, &mut current, parens)?;
                    parens = 0;
                }
                Token::OpenBracket => {
                    let list = self.items()?;
                    if self.next() != Some(Token::CloseBracket) {
                        return Err(LogoDiagnostic::new(LogoError::UnmatchedBracket));
                    }
                    current.push(Value::List(list));
                }
                Token::CloseBracket => {
                    return Err(LogoDiagnostic::new(LogoError::UnexpectedBracket));
                }
                Token::LeftParen => {
                    parens += 1;
                    current.push(Value::word("("));
                }
                Token::RightParen => {
                    if parens == 0 {
                        return Err(LogoDiagnostic::new(LogoError::UnexpectedParen));
                    }
                    parens -= 1;
                    current.push(Value::word(")"));
                }
                Token::Word(text) => current.push(classify(text)),
            }
        }
        Self::finish_line(&mut lines, &mut current, parens)?;
        Ok(lines)
    }

    fn finish_line(
        lines: &mut Vec<List>,
        current: &mut Vec<Value>,
        parens: usize,
    ) -> Result<(), LogoDiagnostic> {
        if parens > 0 {
            return Err(LogoDiagnostic::new(LogoError::UnmatchedParen));
        }
        if !current.is_empty() {
            lines.push(std::mem::take(current).into_iter().collect());
        }
        Ok(())
    }

    /// Items up to (not including) the `]` that closes the current list,
    /// or to end of input.
    fn items(&mut self) -> Result<List, LogoDiagnostic> {
        let mut items = Vec::new();
        while let Some(token) = self.tokens.get(self.pos).cloned() {
            match token {
                Token::CloseBracket => break,
                Token::OpenBracket => {
                    self.pos += 1;
                    let list = self.items()?;
                    if self.next() != Some(Token::CloseBracket) {
                        return Err(LogoDiagnostic::new(LogoError::UnmatchedBracket));
                    }
                    items.push(Value::List(list));
                    continue;
                }
                Token::Newline => {}
                Token::LeftParen => items.push(Value::word("(")),
                Token::RightParen => items.push(Value::word(")")),
                Token::Word(text) => items.push(Value::Word(Word::from(text))),
            }
            self.pos += 1;
        }
        Ok(items.into_iter().collect())
    }
}
