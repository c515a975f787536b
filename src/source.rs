//! Band resolution: the collaborator that turns `B5` into pixels.

use crate::grid::{CellType, Grid, GridError};
use image::DynamicImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("band '{0}' not found")]
    NotFound(String),

    #[error("invalid band name '{0}'")]
    InvalidBand(String),

    #[error("band '{band}' has unsupported pixel format {format}")]
    UnsupportedPixelFormat { band: String, format: String },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Grid(#[from] GridError),
}

pub trait RasterSource {
    fn resolve(&self, band: &str) -> Result<Grid, SourceError>;
}

impl<F> RasterSource for F
where
    F: Fn(&str) -> Result<Grid, SourceError>,
{
    fn resolve(&self, band: &str) -> Result<Grid, SourceError> {
        self(band)
    }
}

/// Bands held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bands: HashMap<String, Grid>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, band: impl Into<String>, grid: Grid) {
        self.bands.insert(band.into(), grid);
    }

    pub fn with_band(mut self, band: impl Into<String>, grid: Grid) -> Self {
        self.insert(band, grid);
        self
    }
}

impl RasterSource for MemorySource {
    fn resolve(&self, band: &str) -> Result<Grid, SourceError> {
        self.bands
            .get(band)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(band.to_string()))
    }
}

/// Reads single-band images from a directory, one file per band.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
    pattern: String,
    nodata: f64,
}

impl FileSource {
    pub const DEFAULT_PATTERN: &'static str = "{band}.TIF";

    /// `pattern` names the file for a band, with `{band}` substituted.
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>, nodata: f64) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
            nodata,
        }
    }

    pub fn path_for(&self, band: &str) -> Result<PathBuf, SourceError> {
        let valid = !band.is_empty() && band.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(SourceError::InvalidBand(band.to_string()));
        }
        Ok(self.dir.join(self.pattern.replace("{band}", band)))
    }

    fn decode(&self, band: &str, path: &Path) -> Result<Grid, SourceError> {
        let image = image::open(path).map_err(|source| SourceError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let width = image.width() as usize;
        let height = image.height() as usize;

        let (cell_type, data): (CellType, Vec<f64>) = match image {
            DynamicImage::ImageLuma8(buf) => (CellType::UInt8, buf.into_raw().into_iter().map(f64::from).collect()),
            DynamicImage::ImageLuma16(buf) => (CellType::UInt16, buf.into_raw().into_iter().map(f64::from).collect()),
            DynamicImage::ImageRgb32F(buf) => (
                CellType::Float32,
                buf.pixels().map(|p| f64::from(p.0[0])).collect(),
            ),
            DynamicImage::ImageRgba32F(buf) => (
                CellType::Float32,
                buf.pixels().map(|p| f64::from(p.0[0])).collect(),
            ),
            other => {
                return Err(SourceError::UnsupportedPixelFormat {
                    band: band.to_string(),
                    format: format!("{:?}", other.color()),
                })
            }
        };

        Ok(Grid::new(cell_type, width, height, data, self.nodata)?)
    }
}

impl RasterSource for FileSource {
    fn resolve(&self, band: &str) -> Result<Grid, SourceError> {
        let path = self.path_for(band)?;
        if !path.is_file() {
            return Err(SourceError::NotFound(band.to_string()));
        }
        tracing::debug!(band, path = %path.display(), "decoding band");
        self.decode(band, &path)
    }
}
