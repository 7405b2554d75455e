// pipeline.rs
//
// load -> join -> project -> encode -> render -> write

use tracing::info;

use crate::config::MapConfig;
use crate::encode::{ColorEncoding, resolve_colorbar_label, select_color_column};
use crate::error::MapResult;
use crate::geometry::{load_geometries, resolve_level};
use crate::join::{merge, resolve_join_spec};
use crate::output::{OutputArtifact, data_base_name, open_with_default, output_path, write_artifact};
use crate::projection::{Reprojector, normalize_projection};
use crate::prompt::Prompt;
use crate::render::{Figure, render_svg};
use crate::tabular::read_data;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct MapOutcome {
    pub artifact: OutputArtifact,
    pub encoding: ColorEncoding,
}

/// Builds one choropleth map from `config`, asking `prompt` for anything
/// missing or invalid.
pub fn run(
    config: &MapConfig,
    prompt: &mut dyn Prompt,
    reprojector: &dyn Reprojector,
) -> MapResult<MapOutcome> {
    let level = resolve_level(config.geometry_level, prompt)?;
    info!(?level, dir = %config.geometry_dir.display(), "Loading geometries");
    let geometries = load_geometries(&config.geometry_dir, level)?;

    info!(path = %config.data_file.display(), "Loading data");
    let data = read_data(&config.data_file)?;

    let spec = resolve_join_spec(
        config.join_config(),
        geometries.columns(),
        &data.columns,
        prompt,
    )?;
    info!(?spec, "Merging geometries and data");
    let merged = merge(&geometries, &data, &spec)?;

    let projected = normalize_projection(merged, config.projection.as_deref(), reprojector, prompt)?;

    let column = select_color_column(config.color_on.as_deref(), projected.columns(), prompt)?;
    let label = resolve_colorbar_label(config.colorbar_label.as_deref(), prompt)?;
    info!(column = %column, colormap = %config.color_map, "Plotting data");
    let encoding = ColorEncoding::from_table(&projected, &column, config.color_map, &label)?;

    let data_name = data_base_name(&config.data_file);
    let figure = Figure::compose(
        &projected,
        &encoding,
        &data_name,
        config.title.as_deref(),
        config.title_source.as_deref(),
    )?;
    let markup = render_svg(&figure)?;

    let path = output_path(
        &config.output_dir,
        &config.data_file,
        config.filename.as_deref(),
        config.extension,
    );
    let artifact = write_artifact(&markup, &path, config.extension)?;
    info!(path = %artifact.path.display(), "Success");

    if config.open_with {
        open_with_default(&artifact.path)?;
    }

    Ok(MapOutcome { artifact, encoding })
}
