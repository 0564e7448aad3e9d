//! Formula parser
//!
//! Binding-power (Pratt) parser over the token stream produced by the
//! lexer. From loosest to tightest: comparisons, `&`, `+ -`, `* /`, `^`
//! (right associative), prefix `-`, postfix `%`, then `:`. Error offsets
//! are byte positions after the leading `=`.
//!
//! `:` between two cells forms a range. Column letters (`A:C`) and row
//! numbers (`2:5`) around a `:` form whole-column and whole-row references.

use crate::ast::{BinaryOp, Bound, Expr, Literal, RefTarget, Reference, UnaryOp};
use crate::error::{FormulaError, FormulaResult};
use crate::lexer::{parse_error, tokenize, Spanned, Token};
use cellscope_core::{CellAddress, CellRange, MAX_ROWS};

const PREFIX_BP: u8 = 11;
const POSTFIX_BP: u8 = 13;

/// Parse a formula string into an expression tree
///
/// # Example
/// ```rust
/// use cellscope_formula::{parse_formula, Expr};
///
/// let expr = parse_formula("=SUM(A1:A10)").unwrap();
/// assert!(matches!(expr, Expr::Call { ref name, .. } if name == "SUM"));
/// assert!(parse_formula("SUM(A1)").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<Expr> {
    let body = formula
        .trim()
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("formula must start with '='".into()))?;

    let tokens = tokenize(body)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
    };
    let expr = parser.expr(0)?;
    if parser.pos < tokens.len() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).map(|spanned| &spanned.token)
    }

    fn unexpected(&self) -> FormulaError {
        match self.tokens.get(self.pos) {
            Some(spanned) => parse_error(format!("unexpected {}", spanned.token), spanned.offset),
            None => FormulaError::Parse("unexpected end of formula".into()),
        }
    }

    fn expect(&mut self, punct: char) -> FormulaResult<()> {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expr(&mut self, min_bp: u8) -> FormulaResult<Expr> {
        let mut lhs = self.prefix()?;

        while let Some(token) = self.peek() {
            if *token == Token::Punct('%') {
                if POSTFIX_BP < min_bp {
                    break;
                }
                self.pos += 1;
                lhs = Expr::Unary {
                    op: UnaryOp::Percent,
                    operand: Box::new(lhs),
                };
                continue;
            }

            let Some(op) = infix(token) else { break };
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }
            self.pos += 1;

            let rhs = self.expr(r_bp)?;
            lhs = match op {
                BinaryOp::Span => span(lhs, rhs)?,
                op => Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> FormulaResult<Expr> {
        if let Some(lines) = self.whole_lines(None) {
            return Ok(lines);
        }
        let Some(spanned) = self.tokens.get(self.pos) else {
            return Err(self.unexpected());
        };
        self.pos += 1;

        match &spanned.token {
            Token::Number(n) => Ok(Expr::Literal(Literal::Number(*n))),
            Token::Text(s) => Ok(Expr::Literal(Literal::Text(s.clone()))),
            Token::Bool(b) => Ok(Expr::Literal(Literal::Bool(*b))),
            Token::Error(e) => Ok(Expr::Literal(Literal::Error(e.clone()))),
            Token::Punct('-') => Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.expr(PREFIX_BP)?),
            }),
            Token::Punct('+') => self.expr(PREFIX_BP),
            Token::Punct('(') => {
                let inner = self.expr(0)?;
                self.expect(')')?;
                Ok(inner)
            }
            Token::Punct('{') => self.array(),
            Token::Sheet(sheet) => {
                if let Some(lines) = self.whole_lines(Some(sheet.as_str())) {
                    return Ok(lines);
                }
                match self.tokens.get(self.pos) {
                    Some(Spanned {
                        token: Token::Cell(text),
                        offset,
                    }) => {
                        self.pos += 1;
                        cell(Some(sheet.clone()), text, *offset)
                    }
                    _ => Err(self.unexpected()),
                }
            }
            Token::Cell(text) => cell(None, text, spanned.offset),
            Token::Ident(name) => {
                if self.peek() == Some(&Token::Punct('(')) {
                    self.pos += 1;
                    self.call(name)
                } else {
                    Ok(Expr::Name(name.clone()))
                }
            }
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    /// `A:C` or `2:5` at the current position, consumed only when both
    /// sides are on the same axis
    fn whole_lines(&mut self, sheet: Option<&str>) -> Option<Expr> {
        let [first, colon, last] = self.tokens.get(self.pos..self.pos + 3)? else {
            return None;
        };
        if colon.token != Token::Punct(':') {
            return None;
        }
        let target = match (line(&first.token)?, line(&last.token)?) {
            (Line::Column(a), Line::Column(b)) => {
                let (a, b) = ordered(a, b);
                RefTarget::Columns(a, b)
            }
            (Line::Row(a), Line::Row(b)) => {
                let (a, b) = ordered(a, b);
                RefTarget::Rows(a, b)
            }
            _ => return None,
        };
        self.pos += 3;
        Some(Expr::Reference(Reference {
            sheet: sheet.map(str::to_string),
            target,
        }))
    }

    fn call(&mut self, name: &str) -> FormulaResult<Expr> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::Punct(')')) {
            self.pos += 1;
        } else {
            loop {
                args.push(self.expr(0)?);
                match self.peek() {
                    Some(Token::Punct(',')) => self.pos += 1,
                    Some(Token::Punct(')')) => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.unexpected()),
                }
            }
        }
        Ok(Expr::Call {
            name: name.to_ascii_uppercase(),
            args,
        })
    }

    fn array(&mut self) -> FormulaResult<Expr> {
        let mut rows = Vec::new();
        if self.peek() == Some(&Token::Punct('}')) {
            self.pos += 1;
            return Ok(Expr::Array(rows));
        }

        let mut row = Vec::new();
        loop {
            row.push(self.expr(0)?);
            match self.peek() {
                Some(Token::Punct(',')) => self.pos += 1,
                Some(Token::Punct(';')) => {
                    self.pos += 1;
                    rows.push(std::mem::take(&mut row));
                }
                Some(Token::Punct('}')) => {
                    self.pos += 1;
                    rows.push(row);
                    return Ok(Expr::Array(rows));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }
}

fn infix(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::Compare(op) => *op,
        Token::Punct('+') => BinaryOp::Add,
        Token::Punct('-') => BinaryOp::Sub,
        Token::Punct('*') => BinaryOp::Mul,
        Token::Punct('/') => BinaryOp::Div,
        Token::Punct('^') => BinaryOp::Pow,
        Token::Punct('&') => BinaryOp::Concat,
        Token::Punct(':') => BinaryOp::Span,
        _ => return None,
    };
    Some(op)
}

enum Line {
    Column(Bound),
    Row(Bound),
}

/// Column letters or a row number standing alone, `$` allowed
fn line(token: &Token) -> Option<Line> {
    match token {
        Token::Number(n) if n.fract() == 0.0 && (1.0..=f64::from(MAX_ROWS)).contains(n) => {
            Some(Line::Row(Bound {
                index: *n as u32 - 1,
                absolute: false,
            }))
        }
        Token::Ident(text) => {
            let (absolute, rest) = match text.strip_prefix('$') {
                Some(rest) => (true, rest),
                None => (false, text.as_str()),
            };
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                let row: u32 = rest.parse().ok()?;
                (1..=MAX_ROWS).contains(&row).then(|| {
                    Line::Row(Bound {
                        index: row - 1,
                        absolute,
                    })
                })
            } else {
                let col = CellAddress::letters_to_column(rest).ok()?;
                Some(Line::Column(Bound {
                    index: u32::from(col),
                    absolute,
                }))
            }
        }
        _ => None,
    }
}

fn ordered(a: Bound, b: Bound) -> (Bound, Bound) {
    if a.index <= b.index {
        (a, b)
    } else {
        (b, a)
    }
}

fn cell(sheet: Option<String>, text: &str, offset: usize) -> FormulaResult<Expr> {
    let address = CellAddress::parse(text)
        .map_err(|e| FormulaError::InvalidReference(format!("{text} at offset {offset}: {e}")))?;
    Ok(Expr::Reference(Reference {
        sheet,
        target: RefTarget::Cell(address),
    }))
}

/// Join two cell corners into a range; anything else stays a `:` operation
fn span(lhs: Expr, rhs: Expr) -> FormulaResult<Expr> {
    match (lhs, rhs) {
        (
            Expr::Reference(Reference {
                sheet,
                target: RefTarget::Cell(start),
            }),
            Expr::Reference(Reference {
                sheet: end_sheet,
                target: RefTarget::Cell(end),
            }),
        ) => {
            if end_sheet.is_some() && end_sheet != sheet {
                return Err(FormulaError::Parse(
                    "range corners must be on the same sheet".into(),
                ));
            }
            Ok(Expr::Reference(Reference {
                sheet,
                target: RefTarget::Range(CellRange::new(start, end)),
            }))
        }
        (lhs, rhs) => Ok(Expr::Binary {
            op: BinaryOp::Span,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n))
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn neg(operand: Expr) -> Expr {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        }
    }

    fn reference(sheet: Option<&str>, a1: &str) -> Reference {
        match parse_formula(&format!("={a1}")).unwrap() {
            Expr::Reference(r) => Reference {
                sheet: sheet.map(str::to_string),
                ..r
            },
            other => panic!("not a reference: {other:?}"),
        }
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_formula("= 42 ").unwrap(), num(42.0));
        assert_eq!(
            parse_formula("=\"a\"\"b\"").unwrap(),
            Expr::Literal(Literal::Text("a\"b".into()))
        );
        assert_eq!(
            parse_formula("=false").unwrap(),
            Expr::Literal(Literal::Bool(false))
        );
        assert_eq!(
            parse_formula("=#ref!").unwrap(),
            Expr::Literal(Literal::Error("#REF!".into()))
        );
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(
            parse_formula("=1+2*3").unwrap(),
            binary(BinaryOp::Add, num(1.0), binary(BinaryOp::Mul, num(2.0), num(3.0)))
        );
        assert_eq!(
            parse_formula("=1-2-3").unwrap(),
            binary(BinaryOp::Sub, binary(BinaryOp::Sub, num(1.0), num(2.0)), num(3.0))
        );
        assert_eq!(
            parse_formula("=2^3^2").unwrap(),
            binary(BinaryOp::Pow, num(2.0), binary(BinaryOp::Pow, num(3.0), num(2.0)))
        );
        assert_eq!(
            parse_formula("=(1+2)*3").unwrap(),
            binary(BinaryOp::Mul, binary(BinaryOp::Add, num(1.0), num(2.0)), num(3.0))
        );
        // Negation binds tighter than ^
        assert_eq!(
            parse_formula("=-2^2").unwrap(),
            binary(BinaryOp::Pow, neg(num(2.0)), num(2.0))
        );
        assert_eq!(
            parse_formula("=1&2=3").unwrap(),
            binary(BinaryOp::Eq, binary(BinaryOp::Concat, num(1.0), num(2.0)), num(3.0))
        );
    }

    #[test]
    fn test_percent_is_postfix() {
        assert_eq!(
            parse_formula("=1+50%").unwrap(),
            binary(
                BinaryOp::Add,
                num(1.0),
                Expr::Unary {
                    op: UnaryOp::Percent,
                    operand: Box::new(num(50.0)),
                }
            )
        );
        assert_eq!(parse_formula("=+7").unwrap(), num(7.0));
    }

    #[test]
    fn test_references() {
        let Expr::Reference(abs) = parse_formula("=$B$2").unwrap() else {
            panic!("expected a reference");
        };
        assert_eq!(
            abs.target,
            RefTarget::Cell(CellAddress::with_absolute(1, 1, true, true))
        );
        assert_eq!(abs.a1(), "$B$2");

        let Expr::Reference(range) = parse_formula("=Data!B2:B10").unwrap() else {
            panic!("expected a reference");
        };
        assert_eq!(range.sheet.as_deref(), Some("Data"));
        assert_eq!(range.a1(), "B2:B10");

        let quoted = parse_formula("='Q1 Plan'!C3").unwrap();
        assert_eq!(quoted, Expr::Reference(reference(Some("Q1 Plan"), "C3")));

        assert!(parse_formula("=Data!B2:Other!B9").is_err());
    }

    #[test]
    fn test_whole_columns_and_rows() {
        let Expr::Reference(columns) = parse_formula("=Rates!C:$A").unwrap() else {
            panic!("expected a reference");
        };
        assert_eq!(columns.sheet.as_deref(), Some("Rates"));
        assert_eq!(
            columns.target,
            RefTarget::Columns(
                Bound {
                    index: 0,
                    absolute: true
                },
                Bound {
                    index: 2,
                    absolute: false
                }
            )
        );
        assert_eq!(columns.a1(), "$A:C");
        assert!(columns.is_absolute());

        let Expr::Reference(rows) = parse_formula("='Q1 Plan'!$2:$5").unwrap() else {
            panic!("expected a reference");
        };
        assert_eq!(rows.sheet.as_deref(), Some("Q1 Plan"));
        assert_eq!(rows.a1(), "$2:$5");

        assert_eq!(parse_formula("=A:A").unwrap(), Expr::Reference(reference(None, "A:A")));
        let Expr::Call { args, .. } = parse_formula("=SUM(3:4)").unwrap() else {
            panic!("expected a call");
        };
        assert_eq!(args[0], Expr::Reference(reference(None, "3:4")));

        // Mixed axes are not a reference
        assert!(parse_formula("=Rates!A:3").is_err());
    }

    #[test]
    fn test_non_reference_span() {
        let Expr::Binary { op, lhs, rhs } = parse_formula("=INDEX(A1:A9,2):B9").unwrap() else {
            panic!("expected a span");
        };
        assert_eq!(op, BinaryOp::Span);
        assert!(matches!(*lhs, Expr::Call { ref name, .. } if name == "INDEX"));
        assert_eq!(*rhs, Expr::Reference(reference(None, "B9")));
    }

    #[test]
    fn test_calls() {
        assert_eq!(
            parse_formula("=now()").unwrap(),
            Expr::Call {
                name: "NOW".into(),
                args: vec![]
            }
        );

        let Expr::Call { name, args } = parse_formula("=IF(A1>0,SUM(B1:B10),0)").unwrap() else {
            panic!("expected a call");
        };
        assert_eq!(name, "IF");
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[1], Expr::Call { name, .. } if name == "SUM"));
        assert_eq!(args[2], num(0.0));
    }

    #[test]
    fn test_arrays() {
        assert_eq!(
            parse_formula("={1,2;3,4}").unwrap(),
            Expr::Array(vec![vec![num(1.0), num(2.0)], vec![num(3.0), num(4.0)]])
        );
        assert_eq!(parse_formula("={}").unwrap(), Expr::Array(vec![]));
    }

    #[test]
    fn test_failures() {
        assert!(parse_formula("SUM(A1)").is_err());
        assert!(parse_formula("=").is_err());
        assert!(parse_formula("=SUM(A1").is_err());
        assert!(parse_formula("=1 2").is_err());
        assert!(parse_formula("=(1").is_err());
        assert!(parse_formula("=Data!").is_err());
        assert_eq!(
            parse_formula("=1+)").unwrap_err(),
            FormulaError::Parse("unexpected ')' at offset 2".into())
        );
    }
}
