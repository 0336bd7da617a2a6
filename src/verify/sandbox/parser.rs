//! Recursive-descent parser for the restricted CodeAct evaluation language.

use crate::error::{Error, Result};

use super::ast::{BinOp, Expr, Stmt};
use super::lexer::Token;

pub fn parse(tokens: &[Token]) -> Result<Vec<Stmt>> {
    let mut parser = Parser { tokens, pos: 0 };
    let stmts = parser.block()?;
    parser.expect(&Token::Eof)?;
    Ok(stmts)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(Error::sandbox(format!(
                "expected {expected:?}, found {:?}",
                self.peek()
            )))
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline) {
            self.advance();
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !matches!(self.peek(), Token::Eof | Token::Dedent) {
            stmts.push(self.statement()?);
            self.skip_newlines();
        }
        Ok(stmts)
    }

    fn indented_block(&mut self) -> Result<Vec<Stmt>> {
        self.expect(&Token::Colon)?;
        self.expect(&Token::Newline)?;
        self.skip_newlines();
        self.expect(&Token::Indent)?;
        let stmts = self.block()?;
        self.expect(&Token::Dedent)?;
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Stmt> {
        match self.peek().clone() {
            Token::If => {
                self.advance();
                let cond = self.expr()?;
                let then_branch = self.indented_block()?;
                self.skip_newlines();
                let else_branch = if matches!(self.peek(), Token::Else) {
                    self.advance();
                    self.indented_block()?
                } else {
                    Vec::new()
                };
                Ok(Stmt::If(cond, then_branch, else_branch))
            }
            Token::For => {
                self.advance();
                let var = match self.advance() {
                    Token::Ident(name) => name,
                    other => return Err(Error::sandbox(format!("expected loop variable, found {other:?}"))),
                };
                self.expect(&Token::In)?;
                let iterable = self.expr()?;
                let body = self.indented_block()?;
                Ok(Stmt::For(var, iterable, body))
            }
            Token::Ident(name) if self.tokens.get(self.pos + 1) == Some(&Token::Equals) => {
                self.advance();
                self.advance();
                let value = self.expr()?;
                Ok(Stmt::Assign(name, value))
            }
            _ => Ok(Stmt::Expr(self.expr()?)),
        }
    }

    fn expr(&mut self) -> Result<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut left = self.and_expr()?;
        while matches!(self.peek(), Token::Or) {
            self.advance();
            let right = self.and_expr()?;
            left = Expr::Binary(Box::new(left), BinOp::Or, Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut left = self.not_expr()?;
        while matches!(self.peek(), Token::And) {
            self.advance();
            let right = self.not_expr()?;
            left = Expr::Binary(Box::new(left), BinOp::And, Box::new(right));
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr> {
        if matches!(self.peek(), Token::Not) {
            self.advance();
            return Ok(Expr::Not(Box::new(self.not_expr()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let left = self.additive()?;
        let op = match self.peek() {
            Token::EqEq => BinOp::Eq,
            Token::NotEq => BinOp::NotEq,
            Token::Lt => BinOp::Lt,
            Token::LtEq => BinOp::LtEq,
            Token::Gt => BinOp::Gt,
            Token::GtEq => BinOp::GtEq,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.additive()?;
        Ok(Expr::Binary(Box::new(left), op, Box::new(right)))
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        if matches!(self.peek(), Token::Minus) {
            self.advance();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        loop {
            if matches!(self.peek(), Token::LBracket) {
                self.advance();
                let index = self.expr()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::None => Ok(Expr::NoneLit),
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !matches!(self.peek(), Token::RBracket) {
                    items.push(self.expr()?);
                    while matches!(self.peek(), Token::Comma) {
                        self.advance();
                        if matches!(self.peek(), Token::RBracket) {
                            break;
                        }
                        items.push(self.expr()?);
                    }
                }
                self.expect(&Token::RBracket)?;
                Ok(Expr::List(items))
            }
            Token::LBrace => {
                let mut pairs = Vec::new();
                if !matches!(self.peek(), Token::RBrace) {
                    pairs.push(self.dict_pair()?);
                    while matches!(self.peek(), Token::Comma) {
                        self.advance();
                        if matches!(self.peek(), Token::RBrace) {
                            break;
                        }
                        pairs.push(self.dict_pair()?);
                    }
                }
                self.expect(&Token::RBrace)?;
                Ok(Expr::Dict(pairs))
            }
            Token::Ident(name) => {
                if matches!(self.peek(), Token::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Token::RParen) {
                        args.push(self.expr()?);
                        while matches!(self.peek(), Token::Comma) {
                            self.advance();
                            args.push(self.expr()?);
                        }
                    }
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            other => Err(Error::sandbox(format!("unexpected token in expression: {other:?}"))),
        }
    }

    fn dict_pair(&mut self) -> Result<(Expr, Expr)> {
        let key = self.expr()?;
        self.expect(&Token::Colon)?;
        let value = self.expr()?;
        Ok((key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::lex;
    use super::*;

    #[test]
    fn parses_assignment() {
        let tokens = lex("found = True\n").unwrap();
        let stmts = parse(&tokens).unwrap();
        assert_eq!(stmts, vec![Stmt::Assign("found".to_string(), Expr::Bool(true))]);
    }

    #[test]
    fn parses_if_else() {
        let tokens = lex("if contains(text, \"x\"):\n    found = True\nelse:\n    found = False\n").unwrap();
        let stmts = parse(&tokens).unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::If(_, _, _)));
    }

    #[test]
    fn parses_for_loop_and_index() {
        let tokens = lex("for line in lines:\n    x = line[0]\n").unwrap();
        let stmts = parse(&tokens).unwrap();
        assert!(matches!(stmts[0], Stmt::For(_, _, _)));
    }

    #[test]
    fn parses_boolean_and_comparison_precedence() {
        let tokens = lex("found = confidence > 0.5 and not skipped\n").unwrap();
        let stmts = parse(&tokens).unwrap();
        assert!(matches!(&stmts[0], Stmt::Assign(name, Expr::Binary(_, BinOp::And, _)) if name == "found"));
    }
}
