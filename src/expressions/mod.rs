//! The function engine: small interpreted expression trees evaluated to a
//! scalar, used by the aerodynamic and propulsion models to assemble
//! coefficients from properties, constants and lookup tables.
//!
//! A tree is built once at load time (arity is validated there, see
//! [`FunctionDef`]) and evaluated every step. All arithmetic is plain IEEE
//! double arithmetic: out-of-domain inputs produce NaN/Inf instead of
//! errors, and the driving loop is responsible for noticing non-finite
//! results.

mod def;
mod property;
mod table;

pub use def::{FunctionDef, TableDef};
pub use property::{Parameter, Property, PropertyBus};
pub use table::{Table, Table1, Table2};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FunctionError {
    #[error("operator `{op}` expects {expected} argument(s), got {got}")]
    WrongArity {
        op: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("function `{0}` has no body")]
    Empty(String),
    #[error("table breakpoints must be strictly increasing")]
    NonMonotonicTable,
    #[error("table data does not match its breakpoints: {0}")]
    TableShape(String),
}

/// Operators folding an ordered sequence of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaryOp {
    Sum,
    /// First child minus each of the rest, left to right.
    Difference,
    Product,
    Min,
    Max,
    Avg,
    /// Sum of the absolute values of all children.
    Abs,
}

/// Operators over exactly two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Quotient,
    Pow,
    Exp,
    Atan2,
    Mod,
}

/// Operators over exactly one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Log2,
    Ln,
    Log10,
    /// Fractional part, sign following the argument.
    Fraction,
    /// Truncation toward zero.
    Integer,
}

/// One node of an expression tree. Each node owns its children; evaluation
/// recurses depth-first.
#[derive(Debug)]
pub enum Expr {
    Value(f64),
    Property(Property),
    Table(Table),
    /// Opaque leaf evaluator supplied by a collaborator.
    Opaque(Rc<dyn Parameter>),
    Nary(NaryOp, Vec<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    /// Standard Gaussian draw, independent of any children.
    Random(RefCell<ChaCha8Rng>),
}

impl Expr {
    pub fn evaluate(&self) -> f64 {
        match self {
            Expr::Value(v) => *v,
            Expr::Property(p) => p.get(),
            Expr::Table(t) => t.value(),
            Expr::Opaque(p) => p.value(),
            Expr::Nary(op, children) => evaluate_nary(*op, children),
            Expr::Binary(op, a, b) => evaluate_binary(*op, a.evaluate(), b.evaluate()),
            Expr::Unary(op, a) => evaluate_unary(*op, a.evaluate()),
            Expr::Random(rng) => gaussian(&mut rng.borrow_mut()),
        }
    }
}

fn evaluate_nary(op: NaryOp, children: &[Expr]) -> f64 {
    let mut values = children.iter().map(Expr::evaluate);
    // Arity >= 1 is enforced at construction.
    let first = values.next().unwrap_or(0.0);
    match op {
        NaryOp::Sum => values.fold(first, |acc, v| acc + v),
        NaryOp::Difference => values.fold(first, |acc, v| acc - v),
        NaryOp::Product => values.fold(first, |acc, v| acc * v),
        NaryOp::Min => values.fold(first, f64::min),
        NaryOp::Max => values.fold(first, f64::max),
        NaryOp::Avg => {
            let sum = values.fold(first, |acc, v| acc + v);
            sum / children.len() as f64
        }
        NaryOp::Abs => values.fold(first.abs(), |acc, v| acc + v.abs()),
    }
}

fn evaluate_binary(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Quotient => a / b,
        BinaryOp::Pow | BinaryOp::Exp => a.powf(b),
        BinaryOp::Atan2 => a.atan2(b),
        BinaryOp::Mod => a % b,
    }
}

fn evaluate_unary(op: UnaryOp, a: f64) -> f64 {
    match op {
        UnaryOp::Sin => a.sin(),
        UnaryOp::Cos => a.cos(),
        UnaryOp::Tan => a.tan(),
        UnaryOp::Asin => a.asin(),
        UnaryOp::Acos => a.acos(),
        UnaryOp::Atan => a.atan(),
        UnaryOp::Log2 => a.log2(),
        UnaryOp::Ln => a.ln(),
        UnaryOp::Log10 => a.log10(),
        UnaryOp::Fraction => a.fract(),
        UnaryOp::Integer => a.trunc(),
    }
}

/// Box-Muller transform over two uniform draws.
fn gaussian(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// A named expression tree with optional once-per-step caching.
///
/// When caching is enabled the first `value()` call of a step computes and
/// stores the result; later calls in the same step return the stored value
/// without recursing. The step driver clears the cache at the top of each
/// step; the function never invalidates itself.
#[derive(Debug)]
pub struct Function {
    name: String,
    root: Expr,
    caching: Cell<bool>,
    cached: Cell<Option<f64>>,
}

impl Function {
    pub fn new(name: impl Into<String>, root: Expr) -> Self {
        Self {
            name: name.into(),
            root,
            caching: Cell::new(false),
            cached: Cell::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        if self.caching.get() {
            if let Some(v) = self.cached.get() {
                return v;
            }
            let v = self.root.evaluate();
            self.cached.set(Some(v));
            v
        } else {
            self.root.evaluate()
        }
    }

    /// Enable or disable caching. Disabling also drops any stored value.
    pub fn set_caching(&self, enabled: bool) {
        self.caching.set(enabled);
        if !enabled {
            self.cached.set(None);
        }
    }

    /// Drop the stored value so the next `value()` call recomputes.
    pub fn clear_cache(&self) {
        self.cached.set(None);
    }
}

impl Parameter for Function {
    fn value(&self) -> f64 {
        Function::value(self)
    }
}
