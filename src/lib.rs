//! Choropleth maps of U.S. states and counties from GeoJSON boundaries and
//! delimited data files.

pub mod colormap;
pub mod config;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod join;
pub mod output;
pub mod pdf;
pub mod pipeline;
pub mod projection;
pub mod prompt;
pub mod render;
pub mod resolve;
pub mod tabular;

pub use colormap::ColorMap;
pub use config::MapConfig;
pub use error::{MapError, MapResult};
pub use geometry::GeometryLevel;
pub use output::ExportFormat;
pub use pipeline::{MapOutcome, run};
pub use projection::{ProjReprojector, Reprojector};
pub use prompt::{Prompt, ScriptedPrompt, TerminalPrompt};
