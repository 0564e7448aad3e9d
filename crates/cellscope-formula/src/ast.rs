//! Parsed formula tree

use cellscope_core::{CellAddress, CellRange};

/// A formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Reference(Reference),
    /// Defined name, e.g. `TaxRate`
    Name(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Function call; the name is uppercased
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// Inline array constant, row-major
    Array(Vec<Vec<Expr>>),
}

/// Constant values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Bool(bool),
    /// Error constant such as `#N/A`
    Error(String),
}

/// Cell or range reference, optionally qualified by a sheet
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub sheet: Option<String>,
    pub target: RefTarget,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefTarget {
    Cell(CellAddress),
    Range(CellRange),
    /// Whole columns, e.g. `A:B`
    Columns(Bound, Bound),
    /// Whole rows, e.g. `$2:$5`
    Rows(Bound, Bound),
}

/// One side of a whole-column or whole-row reference, 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub index: u32,
    pub absolute: bool,
}

impl Bound {
    fn marker(self) -> &'static str {
        if self.absolute {
            "$"
        } else {
            ""
        }
    }
}

impl Reference {
    /// A1 text of the target, without the sheet
    pub fn a1(&self) -> String {
        match &self.target {
            RefTarget::Cell(addr) => addr.to_a1_string(),
            RefTarget::Range(range) => range.to_a1_string(),
            RefTarget::Columns(first, last) => {
                let letters = |b: &Bound| CellAddress::column_to_letters(b.index as u16);
                format!(
                    "{}{}:{}{}",
                    first.marker(),
                    letters(first),
                    last.marker(),
                    letters(last)
                )
            }
            RefTarget::Rows(first, last) => format!(
                "{}{}:{}{}",
                first.marker(),
                first.index + 1,
                last.marker(),
                last.index + 1
            ),
        }
    }

    /// Whether any `$` marker is present
    pub fn is_absolute(&self) -> bool {
        match &self.target {
            RefTarget::Cell(addr) => addr.is_absolute(),
            RefTarget::Range(range) => range.is_absolute(),
            RefTarget::Columns(first, last) | RefTarget::Rows(first, last) => {
                first.absolute || last.absolute
            }
        }
    }
}

/// Infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `:` between operands that are not both references, e.g. `INDEX(...):B9`
    Span,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Concat => "&",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Span => ":",
        }
    }

    /// Left and right binding power; `^` binds to the right
    pub(crate) fn binding_power(self) -> (u8, u8) {
        match self {
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => (1, 2),
            BinaryOp::Concat => (3, 4),
            BinaryOp::Add | BinaryOp::Sub => (5, 6),
            BinaryOp::Mul | BinaryOp::Div => (7, 8),
            BinaryOp::Pow => (10, 9),
            BinaryOp::Span => (15, 16),
        }
    }
}

/// Prefix `-` and postfix `%`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Percent,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Percent => "%",
        }
    }
}
