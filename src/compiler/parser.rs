//! # Parser
//!
//! Recursive-descent parser over the token stream produced by
//! [`super::lexer`]. Precedence is expressed directly as a chain of
//! mutually-calling methods, one per level of the table in SPEC_FULL.md
//! §4.2, from `parse_assignment` (lowest) down to `parse_primary` (highest).
//! There is no error recovery: the first unexpected token is fatal.

use super::error::CompileError;
use super::lexer::{Token, TokenKind};
use crate::ast::nodes::*;
use crate::debug;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parses a complete token stream (as produced by `lexer::tokenize`, which
/// always ends with an `Eof` token) into a [`Program`].
pub fn parse(tokens: Vec<Token>) -> Result<Program, CompileError> {
    debug::log_parser(&format!("parsing {} tokens", tokens.len()));
    let mut parser = Parser { tokens, pos: 0 };
    let program = parser.parse_program()?;
    debug::log_parser(&format!("{} top-level declarations", program.declarations.len()));
    Ok(program)
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if !self.at_end() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, CompileError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(CompileError::syntax(tok.line, tok.col, format!("expected {}", what)))
        }
    }

    fn expect_identifier(&mut self, context: &str) -> Result<(String, usize, usize), CompileError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok((name, tok.line, tok.col))
            }
            _ => Err(CompileError::syntax(tok.line, tok.col, format!("expected identifier {}", context))),
        }
    }

    fn expect_number(&mut self, what: &str) -> Result<i64, CompileError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(n)
            }
            _ => Err(CompileError::syntax(tok.line, tok.col, format!("expected {}", what))),
        }
    }

    // --- Top level -----------------------------------------------------

    fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut declarations = Vec::new();
        while !self.at_end() {
            declarations.push(self.parse_top_level()?);
        }
        Ok(Program { declarations })
    }

    /// Consumes the leading type keyword and identifier once, then branches
    /// on the next token: `(` means a function, anything else means a
    /// variable declaration. This is the linear/authoritative form; see
    /// SPEC_FULL.md §11.
    fn parse_top_level(&mut self) -> Result<TopLevel, CompileError> {
        let is_void = match self.peek().kind {
            TokenKind::Int => {
                self.advance();
                false
            }
            TokenKind::Void => {
                self.advance();
                true
            }
            _ => {
                let tok = self.peek();
                return Err(CompileError::syntax(tok.line, tok.col, "expected 'int' or 'void' at top level"));
            }
        };

        let (name, line, col) = self.expect_identifier("after type keyword")?;

        if self.check(&TokenKind::LParen) {
            self.advance();
            let params = self.parse_params()?;
            self.expect(TokenKind::RParen, "')' after parameter list")?;
            let body = self.parse_block()?;
            return Ok(TopLevel::Function(FunctionDecl { name, params, body, is_void }));
        }

        if is_void {
            return Err(CompileError::syntax(line, col, "'void' is only valid as a function return type"));
        }

        let (is_array, array_size) = if self.eat(&TokenKind::LBracket) {
            let size = self.expect_number("array size")?;
            self.expect(TokenKind::RBracket, "']' after array size")?;
            (true, size as usize)
        } else {
            (false, 0)
        };

        let initializer = if self.eat(&TokenKind::Assign) { Some(self.parse_expression()?) } else { None };
        self.expect(TokenKind::Semicolon, "';' after variable declaration")?;

        Ok(TopLevel::Variable(VarDecl { name, is_array, array_size, initializer }))
    }

    fn parse_params(&mut self) -> Result<Vec<String>, CompileError> {
        let mut params = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            // A redundant `int` before each parameter name is accepted and ignored.
            self.eat(&TokenKind::Int);
            let (name, _, _) = self.expect_identifier("in parameter list")?;
            params.push(name);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    // --- Statements ------------------------------------------------------

    fn parse_block(&mut self) -> Result<Vec<Statement>, CompileError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, CompileError> {
        match self.peek().kind {
            TokenKind::Int => self.parse_var_decl_statement(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block()?)),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon, "';' after expression")?;
                Ok(Statement::Expr(expr))
            }
        }
    }

    fn parse_var_decl_statement(&mut self) -> Result<Statement, CompileError> {
        self.expect(TokenKind::Int, "'int'")?;
        let (name, _, _) = self.expect_identifier("in variable declaration")?;
        let (is_array, array_size) = if self.eat(&TokenKind::LBracket) {
            let size = self.expect_number("array size")?;
            self.expect(TokenKind::RBracket, "']' after array size")?;
            (true, size as usize)
        } else {
            (false, 0)
        };
        let initializer = if self.eat(&TokenKind::Assign) { Some(self.parse_expression()?) } else { None };
        self.expect(TokenKind::Semicolon, "';' after variable declaration")?;
        Ok(Statement::VarDecl(VarDecl { name, is_array, array_size, initializer }))
    }

    fn parse_if(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // 'if'
        self.expect(TokenKind::LParen, "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')' after if condition")?;
        let then_branch = self.parse_statement()?;
        let else_branch = if self.eat(&TokenKind::Else) { Some(self.parse_statement()?) } else { None };
        Ok(Statement::if_stmt(condition, then_branch, else_branch))
    }

    fn parse_while(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // 'while'
        self.expect(TokenKind::LParen, "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')' after while condition")?;
        let body = self.parse_statement()?;
        Ok(Statement::While { condition, body: Box::new(body) })
    }

    fn parse_for(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // 'for'
        self.expect(TokenKind::LParen, "'(' after 'for'")?;

        let init = if self.eat(&TokenKind::Semicolon) {
            None
        } else if self.check(&TokenKind::Int) {
            self.advance();
            let (name, _, _) = self.expect_identifier("in for-loop initializer")?;
            let initializer = if self.eat(&TokenKind::Assign) { Some(self.parse_expression()?) } else { None };
            self.expect(TokenKind::Semicolon, "';' after for-loop initializer")?;
            Some(Box::new(Statement::VarDecl(VarDecl { name, is_array: false, array_size: 0, initializer })))
        } else {
            let expr = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "';' after for-loop initializer")?;
            Some(Box::new(Statement::Expr(expr)))
        };

        let condition = if self.check(&TokenKind::Semicolon) { None } else { Some(self.parse_expression()?) };
        self.expect(TokenKind::Semicolon, "';' after for-loop condition")?;

        let update = if self.check(&TokenKind::RParen) { None } else { Some(self.parse_expression()?) };
        self.expect(TokenKind::RParen, "')' after for-loop update")?;

        let body = self.parse_statement()?;
        Ok(Statement::For { init, condition, update, body: Box::new(body) })
    }

    fn parse_return(&mut self) -> Result<Statement, CompileError> {
        self.advance(); // 'return'
        let value = if self.check(&TokenKind::Semicolon) { None } else { Some(self.parse_expression()?) };
        self.expect(TokenKind::Semicolon, "';' after return value")?;
        Ok(Statement::Return(value))
    }

    // --- Expressions -----------------------------------------------------

    fn parse_expression(&mut self) -> Result<Expression, CompileError> {
        self.parse_assignment()
    }

    /// Right-associative: `a = b = c` parses as `a = (b = c)`.
    fn parse_assignment(&mut self) -> Result<Expression, CompileError> {
        let left = self.parse_logical_or()?;
        let op = match self.peek().kind {
            TokenKind::Assign => AssignOp::Plain,
            TokenKind::PlusEq => AssignOp::Plus,
            TokenKind::MinusEq => AssignOp::Minus,
            _ => return Ok(left),
        };
        let tok = self.advance();
        match &left {
            Expression::Variable { .. } | Expression::ArrayAccess { .. } => {}
            _ => return Err(CompileError::syntax(tok.line, tok.col, "invalid assignment target")),
        }
        let value = self.parse_assignment()?;
        Ok(Expression::Assignment { target: Box::new(left), op, value: Box::new(value) })
    }

    fn parse_logical_or(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.parse_logical_and()?;
        while self.check(&TokenKind::OrOr) {
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expression::Binary { op: BinaryOp::Or, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::AndAnd) {
            self.advance();
            let right = self.parse_equality()?;
            left = Expression::Binary { op: BinaryOp::And, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::Ne => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expression::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expression::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    /// Prefix `++`/`--` are rewritten here into a compound-marked assignment
    /// node (`x += 1` / `x -= 1` in spirit) rather than a dedicated AST node
    /// — see SPEC_FULL.md §9, "Prefix `++`/`--` as desugaring".
    fn parse_unary(&mut self) -> Result<Expression, CompileError> {
        match self.peek().kind {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expression::Unary { op: UnaryOp::Neg, operand: Box::new(operand) })
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expression::Unary { op: UnaryOp::Not, operand: Box::new(operand) })
            }
            TokenKind::PlusPlus => {
                self.advance();
                let (name, line, col) = self.expect_identifier("after '++'")?;
                Ok(Expression::Assignment {
                    target: Box::new(Expression::Variable { name, line, col }),
                    op: AssignOp::Plus,
                    value: Box::new(Expression::Number(1)),
                })
            }
            TokenKind::MinusMinus => {
                self.advance();
                let (name, line, col) = self.expect_identifier("after '--'")?;
                Ok(Expression::Assignment {
                    target: Box::new(Expression::Variable { name, line, col }),
                    op: AssignOp::Minus,
                    value: Box::new(Expression::Number(1)),
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, CompileError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expression::Number(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expression::Str(s))
            }
            TokenKind::Amp => {
                self.advance();
                let (name, line, col) = self.expect_identifier("after '&'")?;
                Ok(Expression::AddressOf { name, line, col })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.eat(&TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    self.expect(TokenKind::RParen, "')' after call arguments")?;
                    Ok(Expression::Call { callee: name, args })
                } else if self.eat(&TokenKind::LBracket) {
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket, "']' after array index")?;
                    Ok(Expression::ArrayAccess { array: name, index: Box::new(index), line: tok.line, col: tok.col })
                } else {
                    Ok(Expression::Variable { name, line: tok.line, col: tok.col })
                }
            }
            _ => Err(CompileError::syntax(tok.line, tok.col, "expected expression")),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expression>, CompileError> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_assignment()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }
}
