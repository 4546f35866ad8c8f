//! Logo lexer: splits source text into words, brackets and line breaks.
//!
//! Logo has almost no syntax: words are whitespace-delimited, brackets build
//! lists, and parentheses group. Outside brackets the infix operators are
//! split out of the words around them; inside brackets they are not, and a
//! list is only re-split when it is run (see `parser::runparse`).

use crate::value::Number;

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A word, with any leading `"` or `:` kept.
    Word(String),
    OpenBracket,
    CloseBracket,
    LeftParen,
    RightParen,
    /// End of a physical line (continuations excluded).
    Newline,
}

/// Characters that form infix operators outside brackets.
pub fn is_infix_char(ch: char) -> bool {
    matches!(ch, '+' | '-' | '*' | '/' | '=' | '<' | '>')
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    /// Bracket nesting; infix splitting only happens at depth 0.
    depth: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    /// A lexer that treats the whole input as the inside of a list.
    pub fn data(source: &str) -> Self {
        Self {
            depth: 1,
            ..Self::new(source)
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => {
                    self.advance();
                    tokens.push(Token::Newline);
                }
                ';' => self.skip_comment(),
                '~' if self.continuation_follows() => self.skip_continuation(),
                c if c.is_whitespace() => {
                    self.advance();
                }
                '[' => {
                    self.advance();
                    self.depth += 1;
                    tokens.push(Token::OpenBracket);
                }
                ']' => {
                    self.advance();
                    self.depth = self.depth.saturating_sub(1);
                    tokens.push(Token::CloseBracket);
                }
                '(' => {
                    self.advance();
                    tokens.push(Token::LeftParen);
                }
                ')' => {
                    self.advance();
                    tokens.push(Token::RightParen);
                }
                c if self.depth == 0 && is_infix_char(c) => tokens.push(self.lex_operator(c)),
                _ => tokens.push(Token::Word(self.lex_word())),
            }
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.source.get(self.pos + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// A `~` followed only by blanks up to the end of the line joins the
    /// next line onto this one.
    fn continuation_follows(&self) -> bool {
        let mut i = self.pos + 1;
        while let Some(&ch) = self.source.get(i) {
            match ch {
                ' ' | '\t' | '\r' => i += 1,
                '\n' => return true,
                _ => return false,
            }
        }
        true
    }

    fn skip_continuation(&mut self) {
        while let Some(ch) = self.advance() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// A `-` is a sign rather than an operator when it starts an operand:
    /// after a blank, a bracket, a paren or another operator.
    fn at_operand_start(&self) -> bool {
        if self.pos == 0 {
            return true;
        }
        let prev = self.source[self.pos - 1];
        prev.is_whitespace() || matches!(prev, '[' | '(') || is_infix_char(prev)
    }

    fn lex_operator(&mut self, ch: char) -> Token {
        if ch == '-' && self.at_operand_start() {
            let digit_follows = match self.peek_ahead(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('.') => self.peek_ahead(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if digit_follows {
                self.advance();
                return Token::Word(format!("-{}", self.lex_word()));
            }
        }
        self.advance();
        let two = match (ch, self.peek()) {
            ('<', Some('=')) => Some("<="),
            ('>', Some('=')) => Some(">="),
            ('<', Some('>')) => Some("<>"),
            _ => None,
        };
        if let Some(op) = two {
            self.advance();
            return Token::Word(op.to_string());
        }
        Token::Word(ch.to_string())
    }

    fn lex_word(&mut self) -> String {
        let quoted = self.peek() == Some('"');
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                self.advance();
                if let Some(escaped) = self.advance() {
                    text.push(escaped);
                }
                continue;
            }
            if ch.is_whitespace() || matches!(ch, '[' | ']' | '(' | ')' | ';') {
                break;
            }
            if ch == '~' && self.continuation_follows() {
                break;
            }
            if self.depth == 0 && !quoted && is_infix_char(ch) && !self.exponent_sign(&text) {
                break;
            }
            text.push(ch);
            self.advance();
        }
        text
    }

    /// `1e-5`: the sign belongs to the exponent of a number.
    fn exponent_sign(&self, text: &str) -> bool {
        matches!(self.peek(), Some('+' | '-'))
            && text.ends_with(['e', 'E'])
            && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
            && Number::parse(&format!("{text}0")).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(source: &str) -> Vec<String> {
        Lexer::new(source)
            .tokenize()
            .into_iter()
            .map(|t| match t {
                Token::Word(w) => w,
                Token::OpenBracket => "[".into(),
                Token::CloseBracket => "]".into(),
                Token::LeftParen => "(".into(),
                Token::RightParen => ")".into(),
                Token::Newline => "\\n".into(),
            })
            .collect()
    }

    #[test]
    fn simple_print() {
        assert_eq!(words("print \"hello"), ["print", "\"hello"]);
    }

    #[test]
    fn infix_is_split_outside_brackets() {
        assert_eq!(words("print 3+4*2"), ["print", "3", "+", "4", "*", "2"]);
        assert_eq!(words(":x<=:y"), [":x", "<=", ":y"]);
        assert_eq!(words("1<>2"), ["1", "<>", "2"]);
    }

    #[test]
    fn infix_is_kept_inside_brackets() {
        assert_eq!(words("[a+b c]"), ["[", "a+b", "c", "]"]);
    }

    #[test]
    fn minus_sign_versus_operator() {
        assert_eq!(words("print -5"), ["print", "-5"]);
        assert_eq!(words("3-5"), ["3", "-", "5"]);
        assert_eq!(words("3 - 5"), ["3", "-", "5"]);
        assert_eq!(words("3*-5"), ["3", "*", "-5"]);
        assert_eq!(words("(-5)"), ["(", "-5", ")"]);
        assert_eq!(words("- :x"), ["-", ":x"]);
    }

    #[test]
    fn exponent_stays_in_number() {
        assert_eq!(words("1e-5+1"), ["1e-5", "+", "1"]);
    }

    #[test]
    fn quoted_words_keep_operators() {
        assert_eq!(words("print \"a+b"), ["print", "\"a+b"]);
        assert_eq!(words("(print \"a)"), ["(", "print", "\"a", ")"]);
    }

    #[test]
    fn comments_and_continuation() {
        assert_eq!(words("fd 10 ; move\nrt 90"), ["fd", "10", "\\n", "rt", "90"]);
        assert_eq!(words("fd ~\n10"), ["fd", "10"]);
    }

    #[test]
    fn backslash_escapes() {
        assert_eq!(words("print \"a\\ b"), ["print", "\"a b"]);
        assert_eq!(words("\"semi\\;colon"), ["\"semi;colon"]);
    }

    #[test]
    fn data_lexer_does_not_split() {
        let tokens = Lexer::data("a+b -3").tokenize();
        assert_eq!(
            tokens,
            [Token::Word("a+b".into()), Token::Word("-3".into())]
        );
    }
}
