use crate::error::BandmathError;
use crate::grid::Grid;
use std::fmt;
use std::sync::Arc;

/// Runtime value produced by evaluation.
///
/// Rasters are reference-counted: a band used twice in a formula, or a result
/// handed to another thread, shares one immutable allocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Number(f64),
    Boolean(bool),
    Raster(Arc<Grid>),
    Null,
    Error(BandmathError),
    ReturnValue(Box<Object>),
}

impl Object {
    pub fn raster(grid: Grid) -> Self {
        Object::Raster(Arc::new(grid))
    }

    /// `false` and `Null` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Number(_) => "NUMBER",
            Object::Boolean(_) => "BOOLEAN",
            Object::Raster(_) => "RASTER",
            Object::Null => "NULL",
            Object::Error(_) => "ERROR",
            Object::ReturnValue(_) => "RETURN_VALUE",
        }
    }

    pub fn as_grid(&self) -> Option<&Grid> {
        match self {
            Object::Raster(grid) => Some(grid.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Object::Number(n) => write!(f, "{}", n),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::Raster(grid) => write!(f, "{}", grid),
            Object::Null => write!(f, "null"),
            Object::Error(error) => write!(f, "ERROR: {}", error),
            Object::ReturnValue(value) => write!(f, "{}", value),
        }
    }
}
