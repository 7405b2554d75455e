// error.rs

use std::fmt::Display;
use std::io;

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Which input a column name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Geometries,
    Data,
    Merged,
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Side::Geometries => "geometries file",
            Side::Data => "data file",
            Side::Merged => "merged table",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    GeoJson(#[from] geojson::Error),

    #[error("unknown geometry level '{0}', expected 'state' or 'county'")]
    InvalidGeometryLevel(String),

    #[error("geometries and data files have no columns in common to merge on")]
    NoCommonColumns,

    #[error("column '{column}' does not exist in the {side}")]
    UnknownColumn { column: String, side: Side },

    #[error("column '{column}' holds a non-numeric value '{value}'")]
    NonNumeric { column: String, value: String },

    #[error("column '{0}' has no numeric values to color on")]
    NoNumericValues(String),

    #[error("projection '{crs}' failed: {message}")]
    Projection { crs: String, message: String },

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("no more input available for interactive prompt")]
    PromptClosed,
}

impl MapError {
    pub fn render(err: impl Display) -> Self {
        MapError::Render(err.to_string())
    }

    /// Fatal configuration errors end the process with a dedicated message.
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(
            self,
            MapError::NoCommonColumns | MapError::InvalidGeometryLevel(_)
        )
    }
}
