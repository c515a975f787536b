use crate::grid::{CellType, Grid};
use anyhow::Context;
use image::{GrayImage, ImageBuffer, Luma};
use std::path::Path;

type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Writes a result raster as a grayscale PNG. NoData and non-finite cells
/// become 0; floating rasters are stretched over their valid range.
pub fn write_png(grid: &Grid, path: &Path) -> anyhow::Result<()> {
    let width = grid.width() as u32;
    let height = grid.height() as u32;

    match grid.cell_type() {
        CellType::Boolean | CellType::UInt8 => {
            let pixels = encode_u8(grid);
            let image = GrayImage::from_raw(width, height, pixels).context("raster buffer size")?;
            image
                .save(path)
                .with_context(|| format!("write {}", path.display()))?;
        }
        CellType::UInt16 | CellType::Int16 | CellType::Float32 => {
            let pixels = encode_u16(grid);
            let image = Gray16Image::from_raw(width, height, pixels).context("raster buffer size")?;
            image
                .save(path)
                .with_context(|| format!("write {}", path.display()))?;
        }
    }

    tracing::info!(path = %path.display(), %grid, "wrote raster");
    Ok(())
}

fn valid(grid: &Grid, value: f64) -> bool {
    value.is_finite() && !grid.is_nodata(value)
}

fn encode_u8(grid: &Grid) -> Vec<u8> {
    let boolean = grid.cell_type() == CellType::Boolean;
    grid.data()
        .iter()
        .map(|&v| match (valid(grid, v), boolean) {
            (false, _) => 0,
            (true, true) if v == 1.0 => u8::MAX,
            (true, true) => 0,
            (true, false) => v.clamp(0.0, 255.0) as u8,
        })
        .collect()
}

fn encode_u16(grid: &Grid) -> Vec<u16> {
    if grid.cell_type() != CellType::Float32 {
        return grid
            .data()
            .iter()
            .map(|&v| if valid(grid, v) { v.clamp(0.0, 65535.0) as u16 } else { 0 })
            .collect();
    }

    let (min, max) = grid
        .data()
        .iter()
        .filter(|&&v| valid(grid, v))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;

    grid.data()
        .iter()
        .map(|&v| {
            if !valid(grid, v) || !(range > 0.0) {
                0
            } else {
                ((v - min) / range * 65535.0).round() as u16
            }
        })
        .collect()
}
