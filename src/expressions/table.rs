use std::rc::Rc;

use super::property::Parameter;
use super::FunctionError;

/// 1-D breakpoint table with linear interpolation, clamped at both ends.
#[derive(Debug, Clone)]
pub struct Table1 {
    input: Rc<dyn Parameter>,
    breakpoints: Vec<f64>,
    values: Vec<f64>,
}

impl Table1 {
    pub fn new(
        input: Rc<dyn Parameter>,
        rows: Vec<(f64, f64)>,
    ) -> Result<Self, FunctionError> {
        if rows.is_empty() {
            return Err(FunctionError::TableShape("table has no rows".into()));
        }
        let breakpoints: Vec<f64> = rows.iter().map(|r| r.0).collect();
        if !strictly_increasing(&breakpoints) {
            return Err(FunctionError::NonMonotonicTable);
        }
        let values = rows.into_iter().map(|r| r.1).collect();
        Ok(Self {
            input,
            breakpoints,
            values,
        })
    }

    fn lookup(&self) -> f64 {
        interpolate(&self.breakpoints, &self.values, self.input.value())
    }
}

/// 2-D table: rows and columns each keyed by their own input parameter,
/// bilinear interpolation clamped at the table edges.
#[derive(Debug, Clone)]
pub struct Table2 {
    row_input: Rc<dyn Parameter>,
    col_input: Rc<dyn Parameter>,
    rows: Vec<f64>,
    cols: Vec<f64>,
    data: Vec<Vec<f64>>,
}

impl Table2 {
    pub fn new(
        row_input: Rc<dyn Parameter>,
        col_input: Rc<dyn Parameter>,
        rows: Vec<f64>,
        cols: Vec<f64>,
        data: Vec<Vec<f64>>,
    ) -> Result<Self, FunctionError> {
        if rows.is_empty() || cols.is_empty() {
            return Err(FunctionError::TableShape("table has no breakpoints".into()));
        }
        if !strictly_increasing(&rows) || !strictly_increasing(&cols) {
            return Err(FunctionError::NonMonotonicTable);
        }
        if data.len() != rows.len() || data.iter().any(|r| r.len() != cols.len()) {
            return Err(FunctionError::TableShape(format!(
                "expected {}x{} data",
                rows.len(),
                cols.len()
            )));
        }
        Ok(Self {
            row_input,
            col_input,
            rows,
            cols,
            data,
        })
    }

    fn lookup(&self) -> f64 {
        let r = self.row_input.value();
        let c = self.col_input.value();

        // Interpolate along columns for each row, then along rows.
        let by_row: Vec<f64> = self
            .data
            .iter()
            .map(|row| interpolate(&self.cols, row, c))
            .collect();
        interpolate(&self.rows, &by_row, r)
    }
}

#[derive(Debug, Clone)]
pub enum Table {
    OneD(Table1),
    TwoD(Table2),
}

impl Parameter for Table {
    fn value(&self) -> f64 {
        match self {
            Table::OneD(t) => t.lookup(),
            Table::TwoD(t) => t.lookup(),
        }
    }
}

fn strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

fn interpolate(breakpoints: &[f64], values: &[f64], key: f64) -> f64 {
    if key <= breakpoints[0] {
        return values[0];
    }
    let last = breakpoints.len() - 1;
    if key >= breakpoints[last] {
        return values[last];
    }
    let hi = breakpoints.partition_point(|&b| b < key);
    let lo = hi - 1;
    let span = breakpoints[hi] - breakpoints[lo];
    let factor = (key - breakpoints[lo]) / span;
    values[lo] + (values[hi] - values[lo]) * factor
}
