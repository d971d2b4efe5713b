use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use super::property::PropertyBus;
use super::table::{Table, Table1, Table2};
use super::{BinaryOp, Expr, Function, FunctionError, NaryOp, UnaryOp};
use crate::utils::RngManager;

/// Declarative form of an expression tree, as it appears in a vehicle
/// definition file. `build` turns it into an evaluatable [`Expr`] and is
/// where operator arity is enforced: a mismatch is a fatal load error, the
/// resulting function cannot be evaluated at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionDef {
    Value(f64),
    Property(String),
    Table(TableDef),
    Sum(Vec<FunctionDef>),
    Difference(Vec<FunctionDef>),
    Product(Vec<FunctionDef>),
    Min(Vec<FunctionDef>),
    Max(Vec<FunctionDef>),
    Avg(Vec<FunctionDef>),
    Abs(Vec<FunctionDef>),
    Quotient(Vec<FunctionDef>),
    Pow(Vec<FunctionDef>),
    Exp(Vec<FunctionDef>),
    Atan2(Vec<FunctionDef>),
    #[serde(rename = "mod")]
    Mod(Vec<FunctionDef>),
    Sin(Vec<FunctionDef>),
    Cos(Vec<FunctionDef>),
    Tan(Vec<FunctionDef>),
    Asin(Vec<FunctionDef>),
    Acos(Vec<FunctionDef>),
    Atan(Vec<FunctionDef>),
    Log2(Vec<FunctionDef>),
    Ln(Vec<FunctionDef>),
    Log10(Vec<FunctionDef>),
    Fraction(Vec<FunctionDef>),
    Integer(Vec<FunctionDef>),
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableDef {
    OneD {
        independent_var: String,
        data: Vec<(f64, f64)>,
    },
    TwoD {
        row_var: String,
        col_var: String,
        rows: Vec<f64>,
        cols: Vec<f64>,
        data: Vec<Vec<f64>>,
    },
}

impl FunctionDef {
    /// Build the tree, resolving property names against `bus` and seeding
    /// any Gaussian nodes from `rng` (salted by `name` and node order so
    /// every node gets its own reproducible stream).
    pub fn build(
        &self,
        name: &str,
        bus: &mut PropertyBus,
        rng: &RngManager,
    ) -> Result<Expr, FunctionError> {
        let mut random_index = 0usize;
        build_node(self, name, bus, rng, &mut random_index)
    }

    /// Convenience: build and wrap in a named [`Function`].
    pub fn build_function(
        &self,
        name: &str,
        bus: &mut PropertyBus,
        rng: &RngManager,
    ) -> Result<Function, FunctionError> {
        Ok(Function::new(name, self.build(name, bus, rng)?))
    }
}

fn build_node(
    def: &FunctionDef,
    name: &str,
    bus: &mut PropertyBus,
    rng: &RngManager,
    random_index: &mut usize,
) -> Result<Expr, FunctionError> {
    use FunctionDef as F;
    match def {
        F::Value(v) => Ok(Expr::Value(*v)),
        F::Property(p) => Ok(Expr::Property(bus.node(p))),
        F::Table(t) => Ok(Expr::Table(build_table(t, bus)?)),
        F::Sum(c) => nary(NaryOp::Sum, "sum", c, name, bus, rng, random_index),
        F::Difference(c) => nary(NaryOp::Difference, "difference", c, name, bus, rng, random_index),
        F::Product(c) => nary(NaryOp::Product, "product", c, name, bus, rng, random_index),
        F::Min(c) => nary(NaryOp::Min, "min", c, name, bus, rng, random_index),
        F::Max(c) => nary(NaryOp::Max, "max", c, name, bus, rng, random_index),
        F::Avg(c) => nary(NaryOp::Avg, "avg", c, name, bus, rng, random_index),
        F::Abs(c) => nary(NaryOp::Abs, "abs", c, name, bus, rng, random_index),
        F::Quotient(c) => binary(BinaryOp::Quotient, "quotient", c, name, bus, rng, random_index),
        F::Pow(c) => binary(BinaryOp::Pow, "pow", c, name, bus, rng, random_index),
        F::Exp(c) => binary(BinaryOp::Exp, "exp", c, name, bus, rng, random_index),
        F::Atan2(c) => binary(BinaryOp::Atan2, "atan2", c, name, bus, rng, random_index),
        F::Mod(c) => binary(BinaryOp::Mod, "mod", c, name, bus, rng, random_index),
        F::Sin(c) => unary(UnaryOp::Sin, "sin", c, name, bus, rng, random_index),
        F::Cos(c) => unary(UnaryOp::Cos, "cos", c, name, bus, rng, random_index),
        F::Tan(c) => unary(UnaryOp::Tan, "tan", c, name, bus, rng, random_index),
        F::Asin(c) => unary(UnaryOp::Asin, "asin", c, name, bus, rng, random_index),
        F::Acos(c) => unary(UnaryOp::Acos, "acos", c, name, bus, rng, random_index),
        F::Atan(c) => unary(UnaryOp::Atan, "atan", c, name, bus, rng, random_index),
        F::Log2(c) => unary(UnaryOp::Log2, "log2", c, name, bus, rng, random_index),
        F::Ln(c) => unary(UnaryOp::Ln, "ln", c, name, bus, rng, random_index),
        F::Log10(c) => unary(UnaryOp::Log10, "log10", c, name, bus, rng, random_index),
        F::Fraction(c) => unary(UnaryOp::Fraction, "fraction", c, name, bus, rng, random_index),
        F::Integer(c) => unary(UnaryOp::Integer, "integer", c, name, bus, rng, random_index),
        F::Random => {
            let stream = rng.stream(&format!("{}/random/{}", name, random_index));
            *random_index += 1;
            Ok(Expr::Random(RefCell::new(stream)))
        }
    }
}

fn build_table(def: &TableDef, bus: &mut PropertyBus) -> Result<Table, FunctionError> {
    match def {
        TableDef::OneD {
            independent_var,
            data,
        } => {
            let input = Rc::new(bus.node(independent_var));
            Ok(Table::OneD(Table1::new(input, data.clone())?))
        }
        TableDef::TwoD {
            row_var,
            col_var,
            rows,
            cols,
            data,
        } => {
            let row_input = Rc::new(bus.node(row_var));
            let col_input = Rc::new(bus.node(col_var));
            Ok(Table::TwoD(Table2::new(
                row_input,
                col_input,
                rows.clone(),
                cols.clone(),
                data.clone(),
            )?))
        }
    }
}

fn children(
    defs: &[FunctionDef],
    name: &str,
    bus: &mut PropertyBus,
    rng: &RngManager,
    random_index: &mut usize,
) -> Result<Vec<Expr>, FunctionError> {
    defs.iter()
        .map(|d| build_node(d, name, bus, rng, random_index))
        .collect()
}

fn nary(
    op: NaryOp,
    op_name: &'static str,
    defs: &[FunctionDef],
    name: &str,
    bus: &mut PropertyBus,
    rng: &RngManager,
    random_index: &mut usize,
) -> Result<Expr, FunctionError> {
    if defs.is_empty() {
        return Err(FunctionError::WrongArity {
            op: op_name,
            expected: "at least 1",
            got: 0,
        });
    }
    Ok(Expr::Nary(op, children(defs, name, bus, rng, random_index)?))
}

fn binary(
    op: BinaryOp,
    op_name: &'static str,
    defs: &[FunctionDef],
    name: &str,
    bus: &mut PropertyBus,
    rng: &RngManager,
    random_index: &mut usize,
) -> Result<Expr, FunctionError> {
    if defs.len() != 2 {
        return Err(FunctionError::WrongArity {
            op: op_name,
            expected: "exactly 2",
            got: defs.len(),
        });
    }
    let mut built = children(defs, name, bus, rng, random_index)?;
    let b = built.pop().unwrap();
    let a = built.pop().unwrap();
    Ok(Expr::Binary(op, Box::new(a), Box::new(b)))
}

fn unary(
    op: UnaryOp,
    op_name: &'static str,
    defs: &[FunctionDef],
    name: &str,
    bus: &mut PropertyBus,
    rng: &RngManager,
    random_index: &mut usize,
) -> Result<Expr, FunctionError> {
    if defs.len() != 1 {
        return Err(FunctionError::WrongArity {
            op: op_name,
            expected: "exactly 1",
            got: defs.len(),
        });
    }
    let mut built = children(defs, name, bus, rng, random_index)?;
    Ok(Expr::Unary(op, Box::new(built.pop().unwrap())))
}
