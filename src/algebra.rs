//! Raster algebra: every grid-producing operator lives here so that both
//! operand orders share one implementation.

use crate::ast::InfixOp;
use crate::grid::{CellType, Grid};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlgebraError {
    #[error("operator {0} is not defined for rasters")]
    UnsupportedOperator(InfixOp),

    #[error("raster dimensions differ: {left_width}x{left_height} vs {right_width}x{right_height}")]
    DimensionMismatch {
        left_width: usize,
        left_height: usize,
        right_width: usize,
        right_height: usize,
    },

    #[error("raster cell types differ: {left} vs {right}")]
    CellTypeMismatch { left: CellType, right: CellType },

    #[error("raster NoData values differ: {left} vs {right}")]
    NoDataMismatch { left: f64, right: f64 },

    #[error("mask operand must be a Boolean raster, got {0}")]
    MaskNotBoolean(CellType),

    #[error("masking not implemented for {0} rasters")]
    BitmaskUnsupported(CellType),
}

/// Which side of the operator the scalar appeared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarSide {
    Left,
    Right,
}

/// Broadcasts `scalar` over `grid`. Operand order is preserved, so
/// `10 - B5` computes `10 - cell`. The result keeps the grid's cell type.
pub fn apply_scalar(op: InfixOp, grid: &Grid, scalar: f64, side: ScalarSide) -> Result<Grid, AlgebraError> {
    if op == InfixOp::Equal {
        return bitmask(grid, scalar);
    }
    if !op.is_arithmetic() {
        return Err(AlgebraError::UnsupportedOperator(op));
    }

    let data = grid
        .data()
        .iter()
        .map(|&cell| {
            let (left, right) = match side {
                ScalarSide::Left => (scalar, cell),
                ScalarSide::Right => (cell, scalar),
            };
            op.apply(left, right).unwrap_or(f64::NAN)
        })
        .collect();

    Ok(grid.derive(grid.cell_type(), data))
}

/// Element-wise combination of two grids of the same shape and units.
/// A quotient of two grids is `Float32`; other operators keep the cell type.
pub fn combine(op: InfixOp, left: &Grid, right: &Grid) -> Result<Grid, AlgebraError> {
    if op == InfixOp::Mask {
        return mask(left, right);
    }
    if !op.is_arithmetic() {
        return Err(AlgebraError::UnsupportedOperator(op));
    }

    check_dimensions(left, right)?;
    if left.cell_type() != right.cell_type() {
        return Err(AlgebraError::CellTypeMismatch {
            left: left.cell_type(),
            right: right.cell_type(),
        });
    }
    if !left.same_nodata(right) {
        return Err(AlgebraError::NoDataMismatch {
            left: left.nodata(),
            right: right.nodata(),
        });
    }

    let data = left
        .data()
        .iter()
        .zip(right.data())
        .map(|(&a, &b)| op.apply(a, b).unwrap_or(f64::NAN))
        .collect();

    let cell_type = if op == InfixOp::Divide {
        CellType::Float32
    } else {
        left.cell_type()
    };
    Ok(left.derive(cell_type, data))
}

/// `left # condition`: NoData wherever the Boolean condition is set.
/// Only the shapes must agree; the condition carries no units.
pub fn mask(left: &Grid, condition: &Grid) -> Result<Grid, AlgebraError> {
    check_dimensions(left, condition)?;
    if condition.cell_type() != CellType::Boolean {
        return Err(AlgebraError::MaskNotBoolean(condition.cell_type()));
    }

    let nodata = left.nodata();
    let data = left
        .data()
        .iter()
        .zip(condition.data())
        .map(|(&value, &flag)| if flag == 1.0 { nodata } else { value })
        .collect();

    Ok(left.derive(left.cell_type(), data))
}

/// Quality-band bit test: each cell and the scalar are reinterpreted as
/// integers of the grid's width (two's complement, wrapping) and AND-ed. Result cells are 1.0 where any
/// bit overlaps, else 0.0.
pub fn bitmask(grid: &Grid, scalar: f64) -> Result<Grid, AlgebraError> {
    let test: fn(f64, f64) -> bool = match grid.cell_type() {
        CellType::UInt16 => |cell, bits| (cell as i64 as u16) & (bits as i64 as u16) != 0,
        CellType::Int16 => |cell, bits| (cell as i64 as i16) & (bits as i64 as i16) != 0,
        other => return Err(AlgebraError::BitmaskUnsupported(other)),
    };

    let data = grid
        .data()
        .iter()
        .map(|&cell| if test(cell, scalar) { 1.0 } else { 0.0 })
        .collect();

    Ok(grid.derive(CellType::Boolean, data))
}

fn check_dimensions(left: &Grid, right: &Grid) -> Result<(), AlgebraError> {
    if left.same_dimensions(right) {
        return Ok(());
    }
    Err(AlgebraError::DimensionMismatch {
        left_width: left.width(),
        left_height: left.height(),
        right_width: right.width(),
        right_height: right.height(),
    })
}
