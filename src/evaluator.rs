use crate::algebra::{self, AlgebraError, ScalarSide};
use crate::ast::{Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::error::{BandmathError, BandmathResult, ErrorKind, Span};
use crate::grid::Grid;
use crate::source::RasterSource;
use crate::value::Object;
use std::collections::HashMap;
use std::sync::Arc;

/// Evaluation context. It holds no bindings, only the raster source that
/// band identifiers resolve through.
pub struct Environment {
    source: Box<dyn RasterSource>,
}

impl Environment {
    pub fn new(source: impl RasterSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    pub fn resolve(&self, band: &str) -> Result<Grid, crate::source::SourceError> {
        self.source.resolve(band)
    }
}

/// Evaluates `program` and folds any failure into [`Object::Error`].
pub fn evaluate(program: &Program, env: &Environment) -> Object {
    Evaluator::new(env).evaluate(program)
}

/// Tree-walking evaluator. Each distinct band is resolved once per
/// evaluator and shared afterwards.
pub struct Evaluator<'env> {
    env: &'env Environment,
    bands: HashMap<String, Arc<Grid>>,
}

impl<'env> Evaluator<'env> {
    pub fn new(env: &'env Environment) -> Self {
        Self {
            env,
            bands: HashMap::new(),
        }
    }

    pub fn evaluate(&mut self, program: &Program) -> Object {
        match self.evaluate_program(program) {
            Ok(object) => object,
            Err(error) => Object::Error(error),
        }
    }

    /// Value of the last statement; an empty program is `Null`.
    pub fn evaluate_program(&mut self, program: &Program) -> BandmathResult<Object> {
        let mut result = Object::Null;

        for statement in &program.statements {
            result = self.evaluate_statement(statement)?;
            if let Object::ReturnValue(value) = result {
                return Ok(*value);
            }
        }

        Ok(result)
    }

    pub fn evaluate_statement(&mut self, stmt: &Stmt) -> BandmathResult<Object> {
        match stmt {
            Stmt::Expression { expr, .. } => self.evaluate_expression(expr),
            Stmt::Block { statements, .. } => self.evaluate_block(statements),
        }
    }

    // A ReturnValue leaves the block still wrapped, for the program to unwrap.
    fn evaluate_block(&mut self, statements: &[Stmt]) -> BandmathResult<Object> {
        let mut result = Object::Null;

        for statement in statements {
            result = self.evaluate_statement(statement)?;
            if matches!(result, Object::ReturnValue(_)) {
                return Ok(result);
            }
        }

        Ok(result)
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> BandmathResult<Object> {
        match expr {
            Expr::Number { value, .. } => Ok(Object::Number(*value)),
            Expr::Boolean { value, .. } => Ok(Object::Boolean(*value)),
            Expr::Identifier { name, span } => self.resolve_band(name, span),
            Expr::Prefix {
                operator, operand, span
            } => {
                let operand_val = self.evaluate_expression(operand)?;
                evaluate_prefix(*operator, operand_val, span)
            }
            Expr::Infix {
                left,
                operator,
                right,
                span,
            } => {
                let left_val = self.evaluate_expression(left)?;
                let right_val = self.evaluate_expression(right)?;
                evaluate_infix(*operator, left_val, right_val, span)
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self, span))]
    fn resolve_band(&mut self, name: &str, span: &Span) -> BandmathResult<Object> {
        if let Some(grid) = self.bands.get(name) {
            return Ok(Object::Raster(Arc::clone(grid)));
        }

        let grid = self.env.resolve(name).map_err(|error| {
            tracing::warn!(band = name, %error, "band resolution failed");
            BandmathError::new(
                ErrorKind::DataSource,
                span.clone(),
                format!("raster reading operation failed: {}", error),
            )
            .with_help("Check that the band exists in the configured raster source.")
        })?;

        tracing::debug!(
            band = name,
            width = grid.width(),
            height = grid.height(),
            cell_type = %grid.cell_type(),
            "resolved band"
        );

        let grid = Arc::new(grid);
        self.bands.insert(name.to_string(), Arc::clone(&grid));
        Ok(Object::Raster(grid))
    }
}

fn evaluate_prefix(operator: PrefixOp, operand: Object, span: &Span) -> BandmathResult<Object> {
    match operator {
        PrefixOp::Not => Ok(Object::Boolean(!operand.is_truthy())),
        PrefixOp::Negate => match operand {
            Object::Number(n) => Ok(Object::Number(-n)),
            other => Err(BandmathError::new(
                ErrorKind::UnknownOperator,
                span.clone(),
                format!("unknown operator: -{}", other.type_name()),
            )),
        },
    }
}

fn evaluate_infix(operator: InfixOp, left: Object, right: Object, span: &Span) -> BandmathResult<Object> {
    match (&left, &right) {
        (Object::Number(l), Object::Number(r)) => evaluate_number_infix(operator, *l, *r)
            .ok_or_else(|| unknown_operator(operator, &left, &right, span)),
        (Object::Raster(grid), Object::Number(n)) => {
            algebra::apply_scalar(operator, grid, *n, ScalarSide::Right)
                .map(Object::raster)
                .map_err(|e| algebra_error(e, operator, &left, &right, span))
        }
        (Object::Number(n), Object::Raster(grid)) => {
            algebra::apply_scalar(operator, grid, *n, ScalarSide::Left)
                .map(Object::raster)
                .map_err(|e| algebra_error(e, operator, &left, &right, span))
        }
        (Object::Raster(a), Object::Raster(b)) => algebra::combine(operator, a, b)
            .map(Object::raster)
            .map_err(|e| algebra_error(e, operator, &left, &right, span)),
        _ if left.type_name() != right.type_name() => Err(BandmathError::new(
            ErrorKind::TypeMismatch,
            span.clone(),
            format!(
                "type mismatch: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            ),
        )),
        _ => match operator {
            InfixOp::Equal => Ok(Object::Boolean(left == right)),
            InfixOp::NotEqual => Ok(Object::Boolean(left != right)),
            _ => Err(unknown_operator(operator, &left, &right, span)),
        },
    }
}

fn evaluate_number_infix(operator: InfixOp, left: f64, right: f64) -> Option<Object> {
    match operator {
        InfixOp::Less => Some(Object::Boolean(left < right)),
        InfixOp::Greater => Some(Object::Boolean(left > right)),
        InfixOp::Equal => Some(Object::Boolean(left == right)),
        InfixOp::NotEqual => Some(Object::Boolean(left != right)),
        _ => operator.apply(left, right).map(Object::Number),
    }
}

fn unknown_operator(operator: InfixOp, left: &Object, right: &Object, span: &Span) -> BandmathError {
    BandmathError::new(
        ErrorKind::UnknownOperator,
        span.clone(),
        format!(
            "unknown operator: {} {} {}",
            left.type_name(),
            operator,
            right.type_name()
        ),
    )
}

fn algebra_error(error: AlgebraError, operator: InfixOp, left: &Object, right: &Object, span: &Span) -> BandmathError {
    let kind = match &error {
        AlgebraError::UnsupportedOperator(_) => return unknown_operator(operator, left, right, span),
        AlgebraError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
        AlgebraError::CellTypeMismatch { .. } => ErrorKind::CellTypeMismatch,
        AlgebraError::NoDataMismatch { .. } => ErrorKind::NoDataMismatch,
        AlgebraError::MaskNotBoolean(_) | AlgebraError::BitmaskUnsupported(_) => ErrorKind::Masking,
    };

    let error_with_span = BandmathError::new(kind, span.clone(), error.to_string());
    match kind {
        ErrorKind::Masking => error_with_span.with_help(
            "'#' needs a Boolean raster on its right, e.g. B5 # (BQA == 4); bit tests need a UInt16 or Int16 band.",
        ),
        ErrorKind::CellTypeMismatch | ErrorKind::NoDataMismatch => error_with_span
            .with_help("Raster arithmetic combines bands of the same cell type and NoData value."),
        _ => error_with_span,
    }
}
