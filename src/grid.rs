use std::fmt;

/// Declared sample type of a raster. Storage is always `f64`; the cell type
/// only matters where bits are reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Boolean,
    UInt8,
    Int16,
    UInt16,
    Float32,
}

impl CellType {
    pub fn name(&self) -> &'static str {
        match self {
            CellType::Boolean => "Boolean",
            CellType::UInt8 => "UInt8",
            CellType::Int16 => "Int16",
            CellType::UInt16 => "UInt16",
            CellType::Float32 => "Float32",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("raster dimensions must be positive, got {width}x{height}")]
    EmptyDimensions { width: usize, height: usize },

    #[error("raster of {width}x{height} needs {expected} samples, got {actual}")]
    LengthMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}

/// An immutable 2-D raster: row-major samples plus a shared NoData sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cell_type: CellType,
    width: usize,
    height: usize,
    data: Vec<f64>,
    nodata: f64,
}

impl Grid {
    pub fn new(
        cell_type: CellType,
        width: usize,
        height: usize,
        data: Vec<f64>,
        nodata: f64,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyDimensions { width, height });
        }
        let expected = width * height;
        if data.len() != expected {
            return Err(GridError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            cell_type,
            width,
            height,
            data,
            nodata,
        })
    }

    pub fn filled(
        cell_type: CellType,
        width: usize,
        height: usize,
        value: f64,
        nodata: f64,
    ) -> Result<Self, GridError> {
        Self::new(cell_type, width, height, vec![value; width * height], nodata)
    }

    /// A new grid with this grid's shape and NoData. `data` must come from a
    /// same-shaped source, which every caller in the crate guarantees.
    pub(crate) fn derive(&self, cell_type: CellType, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            cell_type,
            width: self.width,
            height: self.height,
            data,
            nodata: self.nodata,
        }
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    pub fn is_nodata(&self, value: f64) -> bool {
        same_sample(value, self.nodata)
    }

    pub fn same_dimensions(&self, other: &Grid) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn same_nodata(&self, other: &Grid) -> bool {
        same_sample(self.nodata, other.nodata)
    }
}

/// Sample equality that treats two NaN sentinels as the same value.
fn same_sample(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "RASTER<{} {}x{}, nodata={}>",
            self.cell_type, self.width, self.height, self.nodata
        )
    }
}
