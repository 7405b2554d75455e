// config.rs

use std::path::PathBuf;

use crate::colormap::ColorMap;
use crate::geometry::{DEFAULT_GEOMETRY_DIR, GeometryLevel};
use crate::join::JoinConfig;
use crate::output::{DEFAULT_OUTPUT_DIR, ExportFormat};

/// Run settings, fixed before the pipeline starts. Unset options are
/// resolved interactively or fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub data_file: PathBuf,
    pub geometry_level: Option<GeometryLevel>,
    pub merge_on: Option<String>,
    pub merge_on_geometries: Option<String>,
    pub merge_on_data: Option<String>,
    pub color_on: Option<String>,
    pub color_map: ColorMap,
    pub colorbar_label: Option<String>,
    pub projection: Option<String>,
    pub title: Option<String>,
    pub title_source: Option<String>,
    pub extension: ExportFormat,
    pub filename: Option<String>,
    pub open_with: bool,
    pub geometry_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl MapConfig {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            geometry_level: None,
            merge_on: None,
            merge_on_geometries: None,
            merge_on_data: None,
            color_on: None,
            color_map: ColorMap::default(),
            colorbar_label: None,
            projection: None,
            title: None,
            title_source: None,
            extension: ExportFormat::default(),
            filename: None,
            open_with: false,
            geometry_dir: PathBuf::from(DEFAULT_GEOMETRY_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn join_config(&self) -> JoinConfig<'_> {
        JoinConfig {
            merge_on: self.merge_on.as_deref(),
            merge_on_geometries: self.merge_on_geometries.as_deref(),
            merge_on_data: self.merge_on_data.as_deref(),
        }
    }
}
