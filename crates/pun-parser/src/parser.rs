//! Parser for the pun Python subset
//!
//! Recursive descent over the token stream. Errors are reported as
//! diagnostics and the parser resynchronises at the next statement, so one
//! run reports every syntax error in a file.

use crate::ast::*;
use pun_error::{Diagnostic, Diagnostics, ErrorCode, Span, Spanned};
use pun_lexer::{Token, TokenKind};

pub struct Parser {
    /// Tokens to be parsed, always terminated by `Eof`
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Diagnostics,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, span));
        }

        Self {
            tokens,
            pos: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    // =========================================
    // Helpers
    // =========================================

    fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_next(&self) -> &Token {
        self.peek_nth(1)
    }

    /// Checks the current token's variant
    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().is(kind)
    }

    fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<&Token, ()> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error_at_current(message);
            Err(())
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn error_at_current(&mut self, message: &str) {
        self.error_with_code(ErrorCode::UNEXPECTED_TOKEN, message);
    }

    fn error_with_code(&mut self, code: ErrorCode, message: &str) {
        let token = self.peek();
        let diagnostic = Diagnostic::error(message)
            .with_code(code)
            .with_label(token.span, format!("found: {}", token.kind));
        self.diagnostics.push(diagnostic);
    }

    fn error_at(&mut self, code: ErrorCode, span: Span, message: &str, label: &str) {
        self.diagnostics
            .push(Diagnostic::error(message).with_code(code).with_label(span, label));
    }

    /// Skips to the start of the next statement at the current nesting level.
    /// A block opened by the failed line is skipped along with it.
    fn synchronize(&mut self) {
        let mut depth = 0u32;

        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Newline if depth == 0 => {
                    self.advance();
                    if !self.check(&TokenKind::Indent) {
                        return;
                    }
                }
                TokenKind::Indent => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::Dedent => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn recover(&mut self, started_at: usize) {
        self.synchronize();
        if self.pos == started_at && !self.is_at_end() {
            self.advance();
        }
    }

    fn expect_newline(&mut self) -> Result<(), ()> {
        if self.check(&TokenKind::Newline)
            || self.check(&TokenKind::Eof)
            || self.check(&TokenKind::Dedent)
        {
            self.match_token(&TokenKind::Newline);
            Ok(())
        } else {
            self.error_at_current("expected end of line");
            Err(())
        }
    }

    fn parse_identifier(&mut self, what: &str) -> Result<String, ()> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => {
                self.error_at_current(&format!("expected {}", what));
                Err(())
            }
        }
    }

    // =========================================
    // Statements
    // =========================================

    pub fn parse(&mut self) -> Module {
        let mut body = Vec::new();

        self.skip_newlines();

        while !self.is_at_end() {
            let started_at = self.pos;
            match self.parse_statement() {
                Ok(stmt) => body.push(stmt),
                Err(()) => self.recover(started_at),
            }
            self.skip_newlines();
        }

        Module { body }
    }

    fn parse_statement(&mut self) -> Result<Stmt, ()> {
        self.skip_newlines();

        match &self.peek().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Def => self.parse_def(),
            TokenKind::Class => self.parse_class(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Pass => self.parse_keyword_stmt(Stmt::Pass),
            TokenKind::Break => self.parse_keyword_stmt(Stmt::Break),
            TokenKind::Continue => self.parse_keyword_stmt(Stmt::Continue),
            TokenKind::Import => self.parse_import(),
            TokenKind::From => self.parse_from_import(),
            TokenKind::Indent => {
                self.error_at_current("unexpected indent");
                Err(())
            }
            _ if self.is_match_header() => self.parse_match(),
            _ => self.parse_simple_statement(),
        }
    }

    /// `match` is a statement keyword only when the line reads as a match
    /// header: a subject followed by a final `:`.
    fn is_match_header(&self) -> bool {
        if !self.peek().is_ident("match") {
            return false;
        }

        let next = &self.peek_next().kind;
        if matches!(
            next,
            TokenKind::Eq
                | TokenKind::ColonEq
                | TokenKind::Dot
                | TokenKind::Colon
                | TokenKind::Comma
                | TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::RParen
        ) || next.is_aug_assign()
        {
            return false;
        }

        let mut n = 1;
        loop {
            match &self.peek_nth(n).kind {
                TokenKind::Newline | TokenKind::Eof => {
                    return matches!(self.peek_nth(n - 1).kind, TokenKind::Colon);
                }
                _ => n += 1,
            }
        }
    }

    /// Either an indented block after a newline or a single simple
    /// statement on the same line (`if x: pass`)
    fn parse_suite(&mut self) -> Result<Vec<Stmt>, ()> {
        if !self.match_token(&TokenKind::Newline) {
            return Ok(vec![self.parse_simple_statement()?]);
        }

        self.skip_newlines();
        self.expect(&TokenKind::Indent, "expected an indented block")?;

        let mut statements = Vec::new();

        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            self.skip_newlines();
            if self.check(&TokenKind::Dedent) || self.is_at_end() {
                break;
            }

            let started_at = self.pos;
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.recover(started_at),
            }
        }

        self.match_token(&TokenKind::Dedent);

        Ok(statements)
    }

    fn parse_keyword_stmt(&mut self, make: fn(Span) -> Stmt) -> Result<Stmt, ()> {
        let span = self.advance().span;
        self.expect_newline()?;
        Ok(make(span))
    }

    fn parse_if(&mut self) -> Result<Stmt, ()> {
        let start_span = self.advance().span; // `if` or `elif`

        let test = self.parse_named_expression()?;
        self.expect(&TokenKind::Colon, "expected ':' after condition")?;
        let body = self.parse_suite()?;

        let orelse = if self.check(&TokenKind::Elif) {
            vec![self.parse_if()?]
        } else if self.match_token(&TokenKind::Else) {
            self.expect(&TokenKind::Colon, "expected ':' after 'else'")?;
            self.parse_suite()?
        } else {
            Vec::new()
        };

        Ok(Stmt::If {
            test,
            body,
            orelse,
            span: start_span.merge(self.previous().span),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ()> {
        let start_span = self.advance().span;

        let test = self.parse_named_expression()?;
        self.expect(&TokenKind::Colon, "expected ':' after condition")?;
        let body = self.parse_suite()?;

        Ok(Stmt::While {
            test,
            body,
            span: start_span.merge(self.previous().span),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ()> {
        let start_span = self.advance().span;

        let target = self.parse_target_list()?;
        self.expect(&TokenKind::In, "expected 'in' in for loop")?;
        let iter = self.parse_expression_list()?;
        self.expect(&TokenKind::Colon, "expected ':' after for clause")?;
        let body = self.parse_suite()?;

        Ok(Stmt::For {
            target,
            iter,
            body,
            span: start_span.merge(self.previous().span),
        })
    }

    /// Loop targets stop before `in`, so they are parsed below comparisons
    fn parse_target_list(&mut self) -> Result<Expr, ()> {
        let first = self.parse_arith()?;
        if !self.check(&TokenKind::Comma) {
            return self.validate_target(first);
        }

        let start_span = first.span();
        let mut elements = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::In) {
                break;
            }
            elements.push(self.parse_arith()?);
        }

        let span = start_span.merge(self.previous().span);
        self.validate_target(Expr::Tuple(elements, span))
    }

    /// Parse: `def name(params) -> annotation:`
    fn parse_def(&mut self) -> Result<Stmt, ()> {
        let start_span = self.advance().span;

        let name = self.parse_identifier("function name")?;
        self.expect(&TokenKind::LParen, "expected '(' after function name")?;

        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            let param_name = self.parse_identifier("parameter name")?;
            let annotation = if self.match_token(&TokenKind::Colon) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            let default = if self.match_token(&TokenKind::Eq) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            params.push(Param {
                name: param_name,
                annotation,
                default,
            });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "expected ')' after parameters")?;

        let returns = if self.match_token(&TokenKind::Arrow) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(&TokenKind::Colon, "expected ':' after function signature")?;
        let body = self.parse_suite()?;

        Ok(Stmt::FunctionDef(FunctionDef {
            name,
            params,
            returns,
            body,
            span: start_span.merge(self.previous().span),
        }))
    }

    fn parse_class(&mut self) -> Result<Stmt, ()> {
        let start_span = self.advance().span;

        let name = self.parse_identifier("class name")?;

        let mut bases = Vec::new();
        if self.match_token(&TokenKind::LParen) {
            while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                bases.push(self.parse_expression()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen, "expected ')' after base classes")?;
        }

        self.expect(&TokenKind::Colon, "expected ':' after class header")?;
        let body = self.parse_suite()?;

        Ok(Stmt::ClassDef(ClassDef {
            name,
            bases,
            body,
            span: start_span.merge(self.previous().span),
        }))
    }

    fn parse_return(&mut self) -> Result<Stmt, ()> {
        let start_span = self.advance().span;

        let value = if self.check(&TokenKind::Newline)
            || self.check(&TokenKind::Eof)
            || self.check(&TokenKind::Dedent)
        {
            None
        } else {
            Some(self.parse_expression_list()?)
        };

        let span = start_span.merge(self.previous().span);
        self.expect_newline()?;

        Ok(Stmt::Return { value, span })
    }

    fn parse_dotted_name(&mut self) -> Result<String, ()> {
        let mut path = self.parse_identifier("module name")?;
        while self.match_token(&TokenKind::Dot) {
            path.push('.');
            path.push_str(&self.parse_identifier("module name")?);
        }
        Ok(path)
    }

    fn parse_alias(&mut self, dotted: bool) -> Result<Alias, ()> {
        let name = if dotted {
            self.parse_dotted_name()?
        } else {
            self.parse_identifier("imported name")?
        };
        let asname = if self.match_token(&TokenKind::As) {
            Some(self.parse_identifier("alias")?)
        } else {
            None
        };
        Ok(Alias { name, asname })
    }

    /// Parse: `import a.b as c, d`
    fn parse_import(&mut self) -> Result<Stmt, ()> {
        let start_span = self.advance().span;

        let mut names = vec![self.parse_alias(true)?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.parse_alias(true)?);
        }

        let span = start_span.merge(self.previous().span);
        self.expect_newline()?;

        Ok(Stmt::Import { names, span })
    }

    /// Parse: `from ..pkg.mod import a as b, c` or `from pkg import *`
    fn parse_from_import(&mut self) -> Result<Stmt, ()> {
        let start_span = self.advance().span;

        let mut level = 0;
        while self.match_token(&TokenKind::Dot) {
            level += 1;
        }

        let module = if level > 0 && self.check(&TokenKind::Import) {
            String::new()
        } else {
            self.parse_dotted_name()?
        };

        self.expect(&TokenKind::Import, "expected 'import'")?;

        let mut names = Vec::new();
        if !self.match_token(&TokenKind::Star) {
            let parenthesized = self.match_token(&TokenKind::LParen);
            loop {
                names.push(self.parse_alias(false)?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
                if parenthesized && self.check(&TokenKind::RParen) {
                    break;
                }
            }
            if parenthesized {
                self.expect(&TokenKind::RParen, "expected ')' after imported names")?;
            }
        }

        let span = start_span.merge(self.previous().span);
        self.expect_newline()?;

        Ok(Stmt::ImportFrom {
            module,
            level,
            names,
            span,
        })
    }

    /// Assignment, augmented/annotated assignment or expression statement
    fn parse_simple_statement(&mut self) -> Result<Stmt, ()> {
        let first = self.parse_expression_list()?;
        let start_span = first.span();

        let stmt = if self.check(&TokenKind::Eq) {
            let mut targets = vec![self.validate_target(first)?];
            let mut value = Err(());
            while self.match_token(&TokenKind::Eq) {
                let next = self.parse_expression_list()?;
                if self.check(&TokenKind::Eq) {
                    targets.push(self.validate_target(next)?);
                } else {
                    value = Ok(next);
                }
            }
            Stmt::Assign {
                targets,
                value: value?,
                span: start_span.merge(self.previous().span),
            }
        } else if self.peek().kind.is_aug_assign() {
            let op = match self.advance().kind {
                TokenKind::PlusEq => BinOp::Add,
                TokenKind::MinusEq => BinOp::Sub,
                TokenKind::StarEq => BinOp::Mul,
                _ => BinOp::Div,
            };
            let target = self.validate_single_target(first)?;
            let value = self.parse_expression_list()?;
            Stmt::AugAssign {
                target,
                op,
                value,
                span: start_span.merge(self.previous().span),
            }
        } else if self.match_token(&TokenKind::Colon) {
            let target = self.validate_single_target(first)?;
            let annotation = self.parse_expression()?;
            let value = if self.match_token(&TokenKind::Eq) {
                Some(self.parse_expression_list()?)
            } else {
                None
            };
            Stmt::AnnAssign {
                target,
                annotation,
                value,
                span: start_span.merge(self.previous().span),
            }
        } else {
            Stmt::Expr(first)
        };

        self.expect_newline()?;
        Ok(stmt)
    }

    fn validate_target(&mut self, target: Expr) -> Result<Expr, ()> {
        if let Expr::Tuple(elements, _) | Expr::List(elements, _) = &target {
            for element in elements {
                if !is_single_target(element) {
                    self.error_at(
                        ErrorCode::INVALID_TARGET,
                        element.span(),
                        "cannot assign to expression",
                        "not an assignable target",
                    );
                    return Err(());
                }
            }
            return Ok(target);
        }
        self.validate_single_target(target)
    }

    fn validate_single_target(&mut self, target: Expr) -> Result<Expr, ()> {
        if is_single_target(&target) {
            Ok(target)
        } else {
            self.error_at(
                ErrorCode::INVALID_TARGET,
                target.span(),
                "cannot assign to expression",
                "not an assignable target",
            );
            Err(())
        }
    }

    // =========================================
    // Match statement and patterns
    // =========================================

    /// Parse: `match subject:` followed by an indented block of cases
    fn parse_match(&mut self) -> Result<Stmt, ()> {
        let start_span = self.advance().span; // soft keyword `match`

        let subject = self.parse_expression_list()?;
        self.expect(&TokenKind::Colon, "expected ':' after match subject")?;
        self.expect(&TokenKind::Newline, "expected newline after match header")?;
        self.skip_newlines();
        self.expect(&TokenKind::Indent, "expected an indented block of cases")?;

        let mut cases = Vec::new();

        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            self.skip_newlines();
            if self.check(&TokenKind::Dedent) || self.is_at_end() {
                break;
            }

            let started_at = self.pos;
            match self.parse_case() {
                Ok(case) => cases.push(case),
                Err(()) => self.recover(started_at),
            }
        }

        self.match_token(&TokenKind::Dedent);

        let span = start_span.merge(self.previous().span);
        if cases.is_empty() {
            self.error_at(
                ErrorCode::EXPECTED_PATTERN,
                span,
                "match statement has no cases",
                "expected at least one `case` block",
            );
            return Err(());
        }

        Ok(Stmt::Match(MatchStmt {
            subject,
            cases,
            span,
        }))
    }

    /// Parse: `case pattern [if guard]: body`
    fn parse_case(&mut self) -> Result<MatchCase, ()> {
        if !self.peek().is_ident("case") {
            self.error_at_current("expected 'case'");
            return Err(());
        }
        let start_span = self.advance().span;

        let pattern = self.parse_patterns()?;

        let guard = if self.match_token(&TokenKind::If) {
            Some(self.parse_named_expression()?)
        } else {
            None
        };

        self.expect(&TokenKind::Colon, "expected ':' after case pattern")?;
        let body = self.parse_suite()?;

        Ok(MatchCase {
            pattern,
            guard,
            body,
            span: start_span.merge(self.previous().span),
        })
    }

    /// Top-level case pattern; `case a, b:` is an open sequence
    fn parse_patterns(&mut self) -> Result<Pattern, ()> {
        let first = self.parse_maybe_star_pattern()?;
        if !self.check(&TokenKind::Comma) {
            if let Pattern::Star { span, .. } = first {
                self.error_at(
                    ErrorCode::EXPECTED_PATTERN,
                    span,
                    "star pattern outside of a sequence",
                    "only allowed inside a sequence pattern",
                );
                return Err(());
            }
            return Ok(first);
        }

        let start_span = first.span();
        let mut elements = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::If) || self.check(&TokenKind::Colon) {
                break;
            }
            elements.push(self.parse_maybe_star_pattern()?);
        }

        Ok(Pattern::Sequence(elements, start_span.merge(self.previous().span)))
    }

    fn parse_maybe_star_pattern(&mut self) -> Result<Pattern, ()> {
        if self.match_token(&TokenKind::Star) {
            let start_span = self.previous().span;
            let name = self.parse_identifier("name after '*'")?;
            let span = start_span.merge(self.previous().span);
            let name = if name == "_" { None } else { Some(name) };
            return Ok(Pattern::Star { name, span });
        }
        self.parse_as_pattern()
    }

    /// Parse: `or_pattern [as name]`
    fn parse_as_pattern(&mut self) -> Result<Pattern, ()> {
        let pattern = self.parse_or_pattern()?;

        if !self.match_token(&TokenKind::As) {
            return Ok(pattern);
        }

        let name = self.parse_identifier("name after 'as'")?;
        if name == "_" {
            let span = self.previous().span;
            self.error_at(
                ErrorCode::EXPECTED_PATTERN,
                span,
                "cannot use '_' as a target",
                "use a real name here",
            );
            return Err(());
        }

        let span = pattern.span().merge(self.previous().span);
        Ok(Pattern::As {
            pattern: Box::new(pattern),
            name,
            span,
        })
    }

    /// Parse: `A | B | C`
    fn parse_or_pattern(&mut self) -> Result<Pattern, ()> {
        let first = self.parse_closed_pattern()?;

        if !self.check(&TokenKind::Pipe) {
            return Ok(first);
        }

        let start_span = first.span();
        let mut alternatives = vec![first];
        while self.match_token(&TokenKind::Pipe) {
            alternatives.push(self.parse_closed_pattern()?);
        }

        let span = start_span.merge(self.previous().span);
        Ok(Pattern::Or(alternatives, span))
    }

    fn parse_closed_pattern(&mut self) -> Result<Pattern, ()> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Minus => {
                self.advance();
                let value = match self.peek().kind {
                    TokenKind::IntLit(n) => Expr::Int(-n, token.span.merge(self.peek().span)),
                    TokenKind::FloatLit(n) => Expr::Float(-n, token.span.merge(self.peek().span)),
                    _ => {
                        self.error_with_code(
                            ErrorCode::EXPECTED_PATTERN,
                            "expected a number after '-'",
                        );
                        return Err(());
                    }
                };
                self.advance();
                Ok(Pattern::Literal(value))
            }
            TokenKind::IntLit(n) => {
                self.advance();
                Ok(Pattern::Literal(Expr::Int(n, token.span)))
            }
            TokenKind::FloatLit(n) => {
                self.advance();
                Ok(Pattern::Literal(Expr::Float(n, token.span)))
            }
            TokenKind::StringLit(_) => Ok(Pattern::Literal(self.parse_strings())),
            TokenKind::True => {
                self.advance();
                Ok(Pattern::Singleton(Singleton::True, token.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Pattern::Singleton(Singleton::False, token.span))
            }
            TokenKind::None => {
                self.advance();
                Ok(Pattern::Singleton(Singleton::None, token.span))
            }
            TokenKind::Ident(name) => {
                self.advance();

                let mut value = Expr::Name(name.clone(), token.span);
                while self.match_token(&TokenKind::Dot) {
                    let attr = self.parse_identifier("attribute name")?;
                    let span = value.span().merge(self.previous().span);
                    value = Expr::Attribute {
                        value: Box::new(value),
                        attr,
                        span,
                    };
                }

                if self.check(&TokenKind::LParen) {
                    return self.parse_class_pattern(value);
                }

                match value {
                    Expr::Name(name, span) if name == "_" => Ok(Pattern::Wildcard(span)),
                    Expr::Name(name, span) => Ok(Pattern::Capture { name, span }),
                    dotted => Ok(Pattern::Literal(dotted)),
                }
            }
            TokenKind::LParen => {
                self.advance();
                if self.match_token(&TokenKind::RParen) {
                    let span = token.span.merge(self.previous().span);
                    return Ok(Pattern::Sequence(Vec::new(), span));
                }

                let first = self.parse_maybe_star_pattern()?;
                if self.match_token(&TokenKind::RParen) {
                    if matches!(first, Pattern::Star { .. }) {
                        self.error_at(
                            ErrorCode::EXPECTED_PATTERN,
                            first.span(),
                            "star pattern outside of a sequence",
                            "add a trailing comma to make this a sequence",
                        );
                        return Err(());
                    }
                    // Grouping parentheses
                    return Ok(first);
                }

                let mut elements = vec![first];
                while self.match_token(&TokenKind::Comma) {
                    if self.check(&TokenKind::RParen) {
                        break;
                    }
                    elements.push(self.parse_maybe_star_pattern()?);
                }
                self.expect(&TokenKind::RParen, "expected ')' to close the pattern")?;

                let span = token.span.merge(self.previous().span);
                Ok(Pattern::Sequence(elements, span))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(&TokenKind::RBracket) && !self.is_at_end() {
                    elements.push(self.parse_maybe_star_pattern()?);
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket, "expected ']' to close the pattern")?;

                let span = token.span.merge(self.previous().span);
                Ok(Pattern::Sequence(elements, span))
            }
            TokenKind::LBrace => self.parse_mapping_pattern(),
            _ => {
                self.error_with_code(ErrorCode::EXPECTED_PATTERN, "expected a pattern");
                Err(())
            }
        }
    }

    /// Parse the argument list of `Cls(p1, p2, key=p3)`
    fn parse_class_pattern(&mut self, cls: Expr) -> Result<Pattern, ()> {
        self.expect(&TokenKind::LParen, "expected '('")?;

        let mut patterns = Vec::new();
        let mut kwd_patterns = Vec::new();

        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            let is_keyword = matches!(self.peek().kind, TokenKind::Ident(_))
                && matches!(self.peek_next().kind, TokenKind::Eq);

            if is_keyword {
                let key = self.parse_identifier("attribute name")?;
                self.advance(); // `=`
                let pattern = self.parse_as_pattern()?;
                kwd_patterns.push(KeywordPattern { key, pattern });
            } else {
                let pattern = self.parse_as_pattern()?;
                if let Some(first) = kwd_patterns.first() {
                    let diagnostic =
                        Diagnostic::error("positional patterns follow keyword patterns")
                            .with_code(ErrorCode::EXPECTED_PATTERN)
                            .with_label(pattern.span(), "move this before the keyword patterns")
                            .with_secondary_label(first.pattern.span(), "first keyword pattern");
                    self.diagnostics.push(diagnostic);
                    return Err(());
                }
                patterns.push(pattern);
            }

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RParen, "expected ')' to close the class pattern")?;

        let span = cls.span().merge(self.previous().span);
        Ok(Pattern::Class {
            cls,
            patterns,
            kwd_patterns,
            span,
        })
    }

    /// Parse: `{key: pattern, ..., **rest}`
    fn parse_mapping_pattern(&mut self) -> Result<Pattern, ()> {
        let start_span = self.advance().span;

        let mut keys = Vec::new();
        let mut patterns = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.match_token(&TokenKind::DoubleStar) {
                rest = Some(self.parse_identifier("name after '**'")?);
            } else {
                let key = match self.parse_closed_pattern()? {
                    Pattern::Literal(value) => value,
                    Pattern::Singleton(Singleton::True, span) => Expr::Bool(true, span),
                    Pattern::Singleton(Singleton::False, span) => Expr::Bool(false, span),
                    Pattern::Singleton(Singleton::None, span) => Expr::None(span),
                    other => {
                        self.error_at(
                            ErrorCode::EXPECTED_PATTERN,
                            other.span(),
                            "mapping keys must be literals or dotted names",
                            "invalid key",
                        );
                        return Err(());
                    }
                };
                self.expect(&TokenKind::Colon, "expected ':' after mapping key")?;
                keys.push(key);
                patterns.push(self.parse_as_pattern()?);
            }

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RBrace, "expected '}' to close the pattern")?;

        Ok(Pattern::Mapping {
            keys,
            patterns,
            rest,
            span: start_span.merge(self.previous().span),
        })
    }

    // =========================================
    // Expressions
    // =========================================

    /// Comma-separated expressions; more than one becomes a tuple
    fn parse_expression_list(&mut self) -> Result<Expr, ()> {
        let first = self.parse_expression()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let start_span = first.span();
        let mut elements = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if !self.can_start_expression() {
                break;
            }
            elements.push(self.parse_expression()?);
        }

        Ok(Expr::Tuple(elements, start_span.merge(self.previous().span)))
    }

    fn can_start_expression(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Ident(_)
                | TokenKind::IntLit(_)
                | TokenKind::FloatLit(_)
                | TokenKind::StringLit(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::None
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Not
        )
    }

    /// Expression that may be an assignment expression `name := value`
    fn parse_named_expression(&mut self) -> Result<Expr, ()> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            if self.peek_next().is(&TokenKind::ColonEq) {
                let target = name.clone();
                let start_span = self.advance().span;
                self.advance(); // `:=`
                let value = self.parse_expression()?;
                let span = start_span.merge(value.span());
                return Ok(Expr::NamedExpr {
                    target,
                    value: Box::new(value),
                    span,
                });
            }
        }

        self.parse_expression()
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ()> {
        self.parse_or()
    }

    fn parse_bool_chain(
        &mut self,
        op_token: &TokenKind,
        op: BoolOp,
        operand: fn(&mut Self) -> Result<Expr, ()>,
    ) -> Result<Expr, ()> {
        let first = operand(self)?;
        if !self.check(op_token) {
            return Ok(first);
        }

        let start_span = first.span();
        let mut values = vec![first];
        while self.match_token(op_token) {
            values.push(operand(self)?);
        }

        Ok(Expr::BoolOp {
            op,
            values,
            span: start_span.merge(self.previous().span),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ()> {
        self.parse_bool_chain(&TokenKind::Or, BoolOp::Or, Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, ()> {
        self.parse_bool_chain(&TokenKind::And, BoolOp::And, Self::parse_not)
    }

    fn parse_not(&mut self) -> Result<Expr, ()> {
        if self.match_token(&TokenKind::Not) {
            let start_span = self.previous().span;
            let operand = self.parse_not()?;
            let span = start_span.merge(operand.span());
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                span,
            });
        }

        self.parse_comparison()
    }

    fn comparison_operator(&mut self) -> Option<CmpOp> {
        let op = match self.peek().kind {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::Ne => CmpOp::NotEq,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::LtE,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::GtE,
            TokenKind::In => CmpOp::In,
            TokenKind::Is => {
                if self.peek_next().is(&TokenKind::Not) {
                    self.advance();
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            }
            TokenKind::Not if self.peek_next().is(&TokenKind::In) => {
                self.advance();
                CmpOp::NotIn
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Parse a comparison chain `a < b <= c`
    fn parse_comparison(&mut self) -> Result<Expr, ()> {
        let left = self.parse_arith()?;

        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.comparison_operator() {
            ops.push(op);
            comparators.push(self.parse_arith()?);
        }

        if ops.is_empty() {
            return Ok(left);
        }

        let span = left.span().merge(self.previous().span);
        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
            comparators,
            span,
        })
    }

    fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
        let span = left.span().merge(right.span());
        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
            span,
        }
    }

    /// Parse addition/subtraction
    fn parse_arith(&mut self) -> Result<Expr, ()> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Self::binary(left, op, right);
        }

        Ok(left)
    }

    /// Parse multiplication/division
    fn parse_term(&mut self) -> Result<Expr, ()> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DoubleSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ()> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_power(),
        };

        let start_span = self.advance().span;
        let operand = self.parse_unary()?;
        let span = start_span.merge(operand.span());
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    /// `**` binds tighter than unary minus on its left and is right-associative
    fn parse_power(&mut self) -> Result<Expr, ()> {
        let base = self.parse_postfix()?;
        if self.match_token(&TokenKind::DoubleStar) {
            let exponent = self.parse_unary()?;
            return Ok(Self::binary(base, BinOp::Pow, exponent));
        }
        Ok(base)
    }

    /// Parse postfix (call, attribute access, subscript)
    fn parse_postfix(&mut self) -> Result<Expr, ()> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_token(&TokenKind::Dot) {
                let attr = self.parse_identifier("attribute name")?;
                let span = expr.span().merge(self.previous().span);
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    attr,
                    span,
                };
            } else if self.match_token(&TokenKind::LParen) {
                let (args, keywords) = self.parse_call_arguments()?;
                self.expect(&TokenKind::RParen, "expected ')' after arguments")?;

                let span = expr.span().merge(self.previous().span);
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                    keywords,
                    span,
                };
            } else if self.match_token(&TokenKind::LBracket) {
                let index = self.parse_expression_list()?;
                self.expect(&TokenKind::RBracket, "expected ']' after index")?;

                let span = expr.span().merge(self.previous().span);
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_call_arguments(&mut self) -> Result<(Vec<Expr>, Vec<Keyword>), ()> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            let is_keyword = matches!(self.peek().kind, TokenKind::Ident(_))
                && self.peek_next().is(&TokenKind::Eq);

            if is_keyword {
                let name = self.parse_identifier("keyword name")?;
                self.advance(); // `=`
                let value = self.parse_expression()?;
                keywords.push(Keyword { name, value });
            } else {
                let arg = self.parse_named_expression()?;
                if !keywords.is_empty() {
                    self.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        arg.span(),
                        "positional argument follows keyword argument",
                        "move this before the keyword arguments",
                    );
                    return Err(());
                }
                args.push(arg);
            }

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok((args, keywords))
    }

    /// Adjacent string literals concatenate
    fn parse_strings(&mut self) -> Expr {
        let start_span = self.peek().span;
        let mut value = String::new();
        while let TokenKind::StringLit(part) = &self.peek().kind {
            value.push_str(part);
            self.advance();
        }
        Expr::Str(value, start_span.merge(self.previous().span))
    }

    fn parse_primary(&mut self) -> Result<Expr, ()> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Name(name, token.span))
            }
            TokenKind::IntLit(n) => {
                self.advance();
                Ok(Expr::Int(n, token.span))
            }
            TokenKind::FloatLit(n) => {
                self.advance();
                Ok(Expr::Float(n, token.span))
            }
            TokenKind::StringLit(_) => Ok(self.parse_strings()),
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true, token.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false, token.span))
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::None(token.span))
            }
            TokenKind::LParen => {
                self.advance();
                if self.match_token(&TokenKind::RParen) {
                    return Ok(Expr::Tuple(Vec::new(), token.span.merge(self.previous().span)));
                }

                let first = self.parse_named_expression()?;
                if self.match_token(&TokenKind::RParen) {
                    return Ok(first);
                }

                let mut elements = vec![first];
                while self.match_token(&TokenKind::Comma) {
                    if self.check(&TokenKind::RParen) {
                        break;
                    }
                    elements.push(self.parse_named_expression()?);
                }
                self.expect(&TokenKind::RParen, "expected ')' to close the tuple")?;

                Ok(Expr::Tuple(elements, token.span.merge(self.previous().span)))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(&TokenKind::RBracket) && !self.is_at_end() {
                    elements.push(self.parse_named_expression()?);
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket, "expected ']' to close the list")?;

                Ok(Expr::List(elements, token.span.merge(self.previous().span)))
            }
            _ => {
                self.error_with_code(ErrorCode::EXPECTED_EXPRESSION, "expected an expression");
                Err(())
            }
        }
    }
}

fn is_single_target(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Name(..) | Expr::Attribute { .. } | Expr::Subscript { .. }
    )
}

// =========================================
// Spans of syntax nodes
// =========================================

impl Spanned for Expr {
    fn span(&self) -> Span {
        match self {
            Expr::Name(_, span)
            | Expr::Int(_, span)
            | Expr::Float(_, span)
            | Expr::Str(_, span)
            | Expr::Bool(_, span)
            | Expr::None(span)
            | Expr::Tuple(_, span)
            | Expr::List(_, span) => *span,
            Expr::Attribute { span, .. }
            | Expr::Subscript { span, .. }
            | Expr::Call { span, .. }
            | Expr::BinOp { span, .. }
            | Expr::UnaryOp { span, .. }
            | Expr::BoolOp { span, .. }
            | Expr::Compare { span, .. }
            | Expr::NamedExpr { span, .. } => *span,
        }
    }
}

impl Spanned for Pattern {
    fn span(&self) -> Span {
        match self {
            Pattern::Wildcard(span) | Pattern::Singleton(_, span) | Pattern::Or(_, span) => *span,
            Pattern::Sequence(_, span) => *span,
            Pattern::Literal(expr) => expr.span(),
            Pattern::Capture { span, .. }
            | Pattern::As { span, .. }
            | Pattern::Class { span, .. }
            | Pattern::Mapping { span, .. }
            | Pattern::Star { span, .. } => *span,
        }
    }
}

impl Spanned for Stmt {
    fn span(&self) -> Span {
        match self {
            Stmt::Expr(expr) => expr.span(),
            Stmt::Assign { span, .. }
            | Stmt::AugAssign { span, .. }
            | Stmt::AnnAssign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Import { span, .. }
            | Stmt::ImportFrom { span, .. } => *span,
            Stmt::Pass(span) | Stmt::Break(span) | Stmt::Continue(span) => *span,
            Stmt::FunctionDef(def) => def.span,
            Stmt::ClassDef(def) => def.span,
            Stmt::Match(stmt) => stmt.span,
        }
    }
}

/// Parses a token stream into a module
pub fn parse(tokens: Vec<Token>) -> (Module, Diagnostics) {
    let mut parser = Parser::new(tokens);
    let module = parser.parse();
    (module, parser.take_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pun_lexer::Lexer;

    fn parse_source(source: &str) -> (Module, Diagnostics) {
        let mut lexer = Lexer::new(source, 0);
        let tokens = lexer.tokenize();
        parse(tokens)
    }

    fn parse_ok(source: &str) -> Module {
        let (module, diags) = parse_source(source);
        assert!(!diags.has_errors(), "unexpected diagnostics: {:?}", diags);
        module
    }

    fn single_match(source: &str) -> MatchStmt {
        let module = parse_ok(source);
        assert_eq!(module.body.len(), 1);
        match module.body.into_iter().next() {
            Some(Stmt::Match(stmt)) => stmt,
            other => panic!("expected match statement, got {:?}", other),
        }
    }

    fn case_pattern(pattern_src: &str) -> Pattern {
        let source = format!("match s:\n    case {}:\n        pass\n", pattern_src);
        let mut stmt = single_match(&source);
        stmt.cases.remove(0).pattern
    }

    #[test]
    fn test_parse_assignment_and_call() {
        let module = parse_ok("x = f(1, key=2)\n");
        match &module.body[0] {
            Stmt::Assign { targets, value, .. } => {
                assert!(matches!(&targets[0], Expr::Name(name, _) if name == "x"));
                match value {
                    Expr::Call { args, keywords, .. } => {
                        assert_eq!(args.len(), 1);
                        assert_eq!(keywords[0].name, "key");
                    }
                    other => panic!("expected call, got {:?}", other),
                }
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_elif_else() {
        let module = parse_ok("if a:\n    pass\nelif b:\n    pass\nelse:\n    pass\n");
        match &module.body[0] {
            Stmt::If { orelse, .. } => match &orelse[0] {
                Stmt::If { orelse, .. } => assert!(matches!(orelse[0], Stmt::Pass(_))),
                other => panic!("expected nested if, got {:?}", other),
            },
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_class_and_def() {
        let source = "\
class Point:
    __match_args__ = (\"x\", \"y\")

    def __init__(self, x, y=0):
        self.x = x
        self.y = y
";
        let module = parse_ok(source);
        match &module.body[0] {
            Stmt::ClassDef(class) => {
                assert_eq!(class.name, "Point");
                assert_eq!(class.body.len(), 2);
                match &class.body[1] {
                    Stmt::FunctionDef(def) => {
                        assert_eq!(def.params.len(), 3);
                        assert!(def.params[2].default.is_some());
                    }
                    other => panic!("expected def, got {:?}", other),
                }
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_chain_and_is_not() {
        let module = parse_ok("a is not None and 0 < b <= 10\n");
        match &module.body[0] {
            Stmt::Expr(Expr::BoolOp { op: BoolOp::And, values, .. }) => {
                assert!(matches!(&values[0], Expr::Compare { ops, .. } if ops == &[CmpOp::IsNot]));
                assert!(matches!(
                    &values[1],
                    Expr::Compare { ops, .. } if ops == &[CmpOp::Lt, CmpOp::LtE]
                ));
            }
            other => panic!("expected and-chain, got {:?}", other),
        }
    }

    #[test]
    fn test_walrus_in_condition() {
        let module = parse_ok("if (n := len(items)) > 3:\n    pass\n");
        match &module.body[0] {
            Stmt::If { test: Expr::Compare { left, .. }, .. } => {
                assert!(matches!(left.as_ref(), Expr::NamedExpr { target, .. } if target == "n"));
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_match_with_guard() {
        let stmt = single_match(
            "match command:\n    case x if x > 0:\n        pass\n    case _:\n        pass\n",
        );
        assert_eq!(stmt.cases.len(), 2);
        assert!(stmt.cases[0].guard.is_some());
        assert!(matches!(stmt.cases[0].pattern, Pattern::Capture { ref name, .. } if name == "x"));
        assert!(matches!(stmt.cases[1].pattern, Pattern::Wildcard(_)));
    }

    #[test]
    fn test_match_soft_keyword_as_name() {
        let module = parse_ok("match = 1\nmatch(x)\nmatch.group\ncase = 2\n");
        assert_eq!(module.body.len(), 4);
        assert!(matches!(module.body[0], Stmt::Assign { .. }));
        assert!(matches!(module.body[1], Stmt::Expr(Expr::Call { .. })));
        assert!(matches!(module.body[2], Stmt::Expr(Expr::Attribute { .. })));
    }

    #[test]
    fn test_match_with_parenthesized_subject() {
        let stmt = single_match("match (x):\n    case 1:\n        pass\n");
        assert!(matches!(stmt.subject, Expr::Name(ref name, _) if name == "x"));
    }

    #[test]
    fn test_literal_and_singleton_patterns() {
        assert!(matches!(case_pattern("-1"), Pattern::Literal(Expr::Int(-1, _))));
        assert!(matches!(
            case_pattern("\"a\" \"b\""),
            Pattern::Literal(Expr::Str(ref s, _)) if s == "ab"
        ));
        assert!(matches!(case_pattern("None"), Pattern::Singleton(Singleton::None, _)));
        assert!(matches!(
            case_pattern("Color.RED"),
            Pattern::Literal(Expr::Attribute { ref attr, .. }) if attr == "RED"
        ));
    }

    #[test]
    fn test_or_binds_tighter_than_as() {
        match case_pattern("1 | 2 as n") {
            Pattern::As { pattern, name, .. } => {
                assert_eq!(name, "n");
                assert!(matches!(*pattern, Pattern::Or(ref alts, _) if alts.len() == 2));
            }
            other => panic!("expected as-pattern, got {:?}", other),
        }
    }

    #[test]
    fn test_class_pattern_arguments() {
        match case_pattern("Point(0, y=(1 | 2), z=_)") {
            Pattern::Class { cls, patterns, kwd_patterns, .. } => {
                assert!(matches!(cls, Expr::Name(ref name, _) if name == "Point"));
                assert_eq!(patterns.len(), 1);
                assert_eq!(kwd_patterns.len(), 2);
                assert_eq!(kwd_patterns[0].key, "y");
                assert!(matches!(kwd_patterns[0].pattern, Pattern::Or(..)));
                assert!(matches!(kwd_patterns[1].pattern, Pattern::Wildcard(_)));
            }
            other => panic!("expected class pattern, got {:?}", other),
        }
    }

    #[test]
    fn test_dotted_class_pattern() {
        assert!(matches!(
            case_pattern("shapes.Circle(r)"),
            Pattern::Class { cls: Expr::Attribute { .. }, .. }
        ));
    }

    #[test]
    fn test_sequence_and_mapping_patterns_parse() {
        assert!(matches!(
            case_pattern("[a, *rest]"),
            Pattern::Sequence(ref items, _) if items.len() == 2
        ));
        assert!(matches!(
            case_pattern("a, b"),
            Pattern::Sequence(ref items, _) if items.len() == 2
        ));
        assert!(matches!(
            case_pattern("(a,)"),
            Pattern::Sequence(ref items, _) if items.len() == 1
        ));
        assert!(matches!(case_pattern("(a)"), Pattern::Capture { .. }));
        assert!(matches!(
            case_pattern("{\"k\": v, **rest}"),
            Pattern::Mapping { ref rest, .. } if rest.as_deref() == Some("rest")
        ));
    }

    #[test]
    fn test_positional_after_keyword_is_error() {
        let (_, diags) = parse_source("match s:\n    case C(x=1, 2):\n        pass\n");
        assert!(diags.has_errors());

        let diagnostic = diags.iter().next().unwrap();
        assert_eq!(diagnostic.labels.len(), 2);
        assert!(diagnostic.labels[0].primary);
        assert!(!diagnostic.labels[1].primary);
    }

    #[test]
    fn test_recovers_after_error() {
        let (module, diags) = parse_source("x = = 1\ny = 2\n");
        assert!(diags.has_errors());
        assert!(matches!(module.body.last(), Some(Stmt::Assign { .. })));
    }

    #[test]
    fn test_skips_block_of_broken_header() {
        let (module, diags) = parse_source("if :\n    a = 1\n    b = 2\nc = 3\n");
        assert!(diags.has_errors());
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn test_parse_imports() {
        let module =
            parse_ok("import os.path as p, sys\nfrom ..pkg import (a, b as c,)\nfrom x import *\n");
        match &module.body[1] {
            Stmt::ImportFrom { module, level, names, .. } => {
                assert_eq!(module, "pkg");
                assert_eq!(*level, 2);
                assert_eq!(names[1].asname.as_deref(), Some("c"));
            }
            other => panic!("expected from-import, got {:?}", other),
        }
        assert!(matches!(&module.body[2], Stmt::ImportFrom { names, .. } if names.is_empty()));
    }

    #[test]
    fn test_nested_match_in_case_body() {
        let source = "\
match a:
    case 1:
        match b:
            case 2:
                pass
    case _:
        pass
";
        let stmt = single_match(source);
        assert_eq!(stmt.cases.len(), 2);
        assert!(matches!(stmt.cases[0].body[0], Stmt::Match(_)));
    }
}
