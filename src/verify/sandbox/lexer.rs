//! Lexer for the restricted CodeAct evaluation language.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    None,
    If,
    Else,
    For,
    In,
    And,
    Or,
    Not,
    Equals,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Comma,
    Newline,
    Indent,
    Dedent,
    Eof,
}

/// Tokenize `source` into a flat token stream. Indentation is converted
/// into explicit `Indent`/`Dedent` tokens (Python-style block structure),
/// so the parser never looks at raw whitespace.
pub fn lex(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut indent_stack = vec![0usize];

    for raw_line in source.lines() {
        let line = strip_comment(raw_line);
        if line.trim().is_empty() {
            continue;
        }

        let indent = line.chars().take_while(|c| *c == ' ').count();
        if line.trim_start().is_empty() {
            continue;
        }

        if indent > *indent_stack.last().unwrap() {
            indent_stack.push(indent);
            tokens.push(Token::Indent);
        } else {
            while indent < *indent_stack.last().unwrap() {
                indent_stack.pop();
                tokens.push(Token::Dedent);
            }
            if indent != *indent_stack.last().unwrap() {
                return Err(Error::sandbox("inconsistent indentation"));
            }
        }

        lex_line(line.trim(), &mut tokens)?;
        tokens.push(Token::Newline);
    }

    while indent_stack.len() > 1 {
        indent_stack.pop();
        tokens.push(Token::Dedent);
    }
    tokens.push(Token::Eof);
    Ok(tokens)
}

fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut quote = ' ';
    for (i, c) in line.char_indices() {
        if in_string {
            if c == quote {
                in_string = false;
            }
        } else if c == '"' || c == '\'' {
            in_string = true;
            quote = c;
        } else if c == '#' {
            return &line[..i];
        }
    }
    line
}

fn lex_line(line: &str, tokens: &mut Vec<Token>) -> Result<()> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == ' ' || c == '\t' {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value: f64 = text
                .parse()
                .map_err(|_| Error::sandbox(format!("invalid number literal: {text}")))?;
            tokens.push(Token::Number(value));
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            if i >= chars.len() {
                return Err(Error::sandbox("unterminated string literal"));
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::Str(text));
            i += 1;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(match text.as_str() {
                "True" => Token::True,
                "False" => Token::False,
                "None" => Token::None,
                "if" => Token::If,
                "else" | "elif" => Token::Else,
                "for" => Token::For,
                "in" => Token::In,
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                _ => Token::Ident(text),
            });
            continue;
        }

        macro_rules! two_char {
            ($next:expr, $two:expr, $one:expr) => {{
                if i + 1 < chars.len() && chars[i + 1] == $next {
                    i += 2;
                    $two
                } else {
                    i += 1;
                    $one
                }
            }};
        }

        let token = match c {
            '=' => two_char!('=', Token::EqEq, Token::Equals),
            '!' => {
                if i + 1 < chars.len() && chars[i + 1] == '=' {
                    i += 2;
                    Token::NotEq
                } else {
                    return Err(Error::sandbox("unexpected '!' (did you mean 'not'?)"));
                }
            }
            '<' => two_char!('=', Token::LtEq, Token::Lt),
            '>' => two_char!('=', Token::GtEq, Token::Gt),
            '+' => {
                i += 1;
                Token::Plus
            }
            '-' => {
                i += 1;
                Token::Minus
            }
            '*' => {
                i += 1;
                Token::Star
            }
            '/' => {
                i += 1;
                Token::Slash
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '[' => {
                i += 1;
                Token::LBracket
            }
            ']' => {
                i += 1;
                Token::RBracket
            }
            '{' => {
                i += 1;
                Token::LBrace
            }
            '}' => {
                i += 1;
                Token::RBrace
            }
            ':' => {
                i += 1;
                Token::Colon
            }
            ',' => {
                i += 1;
                Token::Comma
            }
            other => return Err(Error::sandbox(format!("unexpected character: {other:?}"))),
        };
        tokens.push(token);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_assignment_and_number() {
        let tokens = lex("found = True\nconfidence = 0.9\n").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("found".to_string()),
                Token::Equals,
                Token::True,
                Token::Newline,
                Token::Ident("confidence".to_string()),
                Token::Equals,
                Token::Number(0.9),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_indented_block() {
        let tokens = lex("if x:\n    found = True\nreasoning = \"done\"\n").unwrap();
        assert!(tokens.contains(&Token::Indent));
        assert!(tokens.contains(&Token::Dedent));
    }

    #[test]
    fn strips_comments() {
        let tokens = lex("x = 1 # a comment\n").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("x".to_string()),
                Token::Equals,
                Token::Number(1.0),
                Token::Newline,
                Token::Eof,
            ]
        );
    }
}
