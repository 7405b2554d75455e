// main.rs for us-choropleth
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use crossterm::style::Stylize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use us_choropleth::geometry::DEFAULT_GEOMETRY_DIR;
use us_choropleth::output::DEFAULT_OUTPUT_DIR;
use us_choropleth::{
    ColorMap, ExportFormat, GeometryLevel, MapConfig, MapError, ProjReprojector, TerminalPrompt,
};

const MERGE_KEYS: [&str; 7] = ["AP", "FIPS", "GPO", "ISO_3166", "USCG", "USPS", "fullname"];

#[derive(Parser, Debug)]
#[command(name = "us-choropleth", version, about = "Plot U.S. state or county data as a choropleth map")]
struct Args {
    /// CSV or TSV file with the data to plot
    data_file: PathBuf,

    /// Boundaries to plot
    #[arg(short = 'g', long = "geometries", value_enum)]
    geometries: Option<GeometryLevel>,

    /// Column present in both the geometries and the data file
    #[arg(short = 'm', long)]
    merge_on: Option<String>,

    /// Geometries column to merge on, used with --merge-on-data
    #[arg(long, value_parser = MERGE_KEYS)]
    merge_on_geometries: Option<String>,

    /// Data file column to merge on, used with --merge-on-geometries
    #[arg(long)]
    merge_on_data: Option<String>,

    /// Column to color the map by
    #[arg(short = 'c', long)]
    color_on: Option<String>,

    /// Sequential color map
    #[arg(long, default_value_t = ColorMap::Reds)]
    color_map: ColorMap,

    /// Label for the colorbar, '%' is appended without a space
    #[arg(long)]
    colorbar_label: Option<String>,

    /// Target projection, e.g. ESRI:102003 or EPSG:5070
    #[arg(short = 'p', long)]
    projection: Option<String>,

    /// Map title, defaults to '<data file>-<column>'
    #[arg(short = 't', long)]
    title: Option<String>,

    /// Citation shown under the map
    #[arg(long)]
    title_source: Option<String>,

    /// Output format
    #[arg(short = 'e', long, value_enum, default_value_t = ExportFormat::Png)]
    extension: ExportFormat,

    /// Output file name without extension, defaults to the data file name
    #[arg(short = 'f', long)]
    filename: Option<String>,

    /// Open the map with the default program once saved
    #[arg(short = 'o', long)]
    open_with: bool,

    /// Directory holding us_states.geojson and us_counties.geojson
    #[arg(long, default_value = DEFAULT_GEOMETRY_DIR)]
    geometry_dir: PathBuf,

    /// Directory the map is written to
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<Args> for MapConfig {
    fn from(args: Args) -> Self {
        MapConfig {
            data_file: args.data_file,
            geometry_level: args.geometries,
            merge_on: args.merge_on,
            merge_on_geometries: args.merge_on_geometries,
            merge_on_data: args.merge_on_data,
            color_on: args.color_on,
            color_map: args.color_map,
            colorbar_label: args.colorbar_label,
            projection: args.projection,
            title: args.title,
            title_source: args.title_source,
            extension: args.extension,
            filename: args.filename,
            open_with: args.open_with,
            geometry_dir: args.geometry_dir,
            output_dir: args.output_dir,
        }
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let config = MapConfig::from(args);
    let mut prompt = TerminalPrompt::stdio();

    match us_choropleth::run(&config, &mut prompt, &ProjReprojector) {
        Ok(_) => Ok(()),
        Err(MapError::NoCommonColumns) => {
            eprintln!(
                "{}",
                "ERROR: Your geometries and data files have no columns in common to merge on. Please revise your data file. Exiting..."
                    .red()
            );
            process::exit(1);
        }
        Err(e) if e.is_fatal_configuration() => {
            eprintln!("{}", format!("ERROR: {e}. Exiting...").red());
            process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_config() {
        let args = Args::parse_from([
            "us-choropleth",
            "data/rates.csv",
            "-g",
            "county",
            "--merge-on-geometries",
            "FIPS",
            "--merge-on-data",
            "fips",
            "-c",
            "Rate",
            "--color-map",
            "YlGnBu",
            "-e",
            "svg",
            "-o",
        ]);
        let config = MapConfig::from(args);
        assert_eq!(config.geometry_level, Some(GeometryLevel::County));
        assert_eq!(config.merge_on_geometries.as_deref(), Some("FIPS"));
        assert_eq!(config.color_map, ColorMap::YlGnBu);
        assert_eq!(config.extension, ExportFormat::Svg);
        assert!(config.open_with);
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
    }

    #[test]
    fn defaults_need_only_the_data_file() {
        let config = MapConfig::from(Args::parse_from(["us-choropleth", "data.csv"]));
        assert_eq!(config, MapConfig::new("data.csv"));
    }

    #[test]
    fn unknown_merge_key_and_color_map_are_rejected() {
        assert!(Args::try_parse_from(["us-choropleth", "d.csv", "--merge-on-geometries", "ZIP"]).is_err());
        assert!(Args::try_parse_from(["us-choropleth", "d.csv", "--color-map", "viridis"]).is_err());
    }
}
