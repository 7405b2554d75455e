// geometry.rs

use std::fs;
use std::io;
use std::path::Path;

use geojson::{Feature, GeoJson, Value};
use tracing::{debug, warn};

use crate::error::{MapError, MapResult};
use crate::prompt::Prompt;
use crate::resolve::Resolution;
use crate::tabular::{Cell, DataTable};

pub const DEFAULT_GEOMETRY_DIR: &str = "geometries";

pub type Ring = Vec<(f64, f64)>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

/// Polygonal outline of one state or county.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub polygons: Vec<Polygon>,
}

impl Shape {
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.polygons
            .iter()
            .flat_map(|p| std::iter::once(&p.exterior).chain(p.holes.iter()))
            .flatten()
    }

    /// Builds a new shape with every vertex passed through `f`.
    pub fn try_map<E>(
        &self,
        mut f: impl FnMut((f64, f64)) -> Result<(f64, f64), E>,
    ) -> Result<Shape, E> {
        let mut map_ring = |ring: &Ring| ring.iter().map(|p| f(*p)).collect::<Result<Ring, E>>();
        let mut polygons = Vec::with_capacity(self.polygons.len());
        for polygon in &self.polygons {
            let exterior = map_ring(&polygon.exterior)?;
            let holes = polygon
                .holes
                .iter()
                .map(&mut map_ring)
                .collect::<Result<Vec<_>, E>>()?;
            polygons.push(Polygon { exterior, holes });
        }
        Ok(Shape { polygons })
    }

    /// Bounding box as `[min_x, min_y, max_x, max_y]`.
    pub fn bbox(&self) -> Option<[f64; 4]> {
        self.points().fold(None, |acc, &(x, y)| match acc {
            None => Some([x, y, x, y]),
            Some([x0, y0, x1, y1]) => Some([x0.min(x), y0.min(y), x1.max(x), y1.max(y)]),
        })
    }
}

/// Attribute table with one shape per row. Used both for the boundary
/// collection and for the joined result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoTable {
    pub attributes: DataTable,
    pub shapes: Vec<Shape>,
}

impl GeoTable {
    pub fn columns(&self) -> &[String] {
        &self.attributes.columns
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn bbox(&self) -> Option<[f64; 4]> {
        self.shapes
            .iter()
            .filter_map(Shape::bbox)
            .reduce(|a, b| [a[0].min(b[0]), a[1].min(b[1]), a[2].max(b[2]), a[3].max(b[3])])
    }
}

/// Administrative level of the pre-supplied boundary sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GeometryLevel {
    State,
    County,
}

impl GeometryLevel {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "state" => Some(GeometryLevel::State),
            "county" => Some(GeometryLevel::County),
            _ => None,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            GeometryLevel::State => "us_states.geojson",
            GeometryLevel::County => "us_counties.geojson",
        }
    }
}

/// Uses the configured level or asks for one. An unknown answer is fatal.
pub fn resolve_level(
    configured: Option<GeometryLevel>,
    prompt: &mut dyn Prompt,
) -> MapResult<GeometryLevel> {
    Resolution::classify(configured, |_| true).resolve(
        prompt,
        |_, level| Ok(level),
        |prompt| -> MapResult<GeometryLevel> {
            prompt.warn(
                "You haven't specified the geometries you want to plot. You can pick between 'state' and 'county'.",
            );
            let answer = prompt.ask("Enter the geometries you want to plot: ")?;
            GeometryLevel::parse(&answer).ok_or(MapError::InvalidGeometryLevel(answer))
        },
    )
}

pub fn read_geojson(path: &Path) -> MapResult<GeoJson> {
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let geojson = GeoJson::from_reader(reader).map_err(geojson::Error::from)?;
    Ok(geojson)
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect()
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Option<Polygon> {
    let (exterior, holes) = rings.split_first()?;
    Some(Polygon {
        exterior: ring_from_positions(exterior),
        holes: holes.iter().map(|r| ring_from_positions(r)).collect(),
    })
}

fn collect_polygons(value: &Value, out: &mut Vec<Polygon>) {
    match value {
        Value::Polygon(rings) => out.extend(polygon_from_rings(rings)),
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().filter_map(|rings| polygon_from_rings(rings)))
        }
        Value::GeometryCollection(members) => {
            for member in members {
                collect_polygons(&member.value, out);
            }
        }
        _ => {}
    }
}

fn shape_of(feature: &Feature) -> Shape {
    let mut polygons = Vec::new();
    if let Some(geometry) = &feature.geometry {
        collect_polygons(&geometry.value, &mut polygons);
    }
    Shape { polygons }
}

/// Flattens GeoJSON features into a `GeoTable`. Property names become columns.
pub fn geo_table_from_geojson(geojson: GeoJson) -> GeoTable {
    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
    };

    let mut columns: Vec<String> = Vec::new();
    for feature in &features {
        for key in feature.properties.iter().flat_map(|p| p.keys()) {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = GeoTable {
        attributes: DataTable::new(columns),
        shapes: Vec::with_capacity(features.len()),
    };
    let mut skipped = 0usize;
    for feature in &features {
        let shape = shape_of(feature);
        if shape.is_empty() {
            skipped += 1;
            continue;
        }
        let row = table
            .attributes
            .columns
            .iter()
            .map(|c| {
                feature
                    .properties
                    .as_ref()
                    .and_then(|p| p.get(c))
                    .map(Cell::from_json)
                    .unwrap_or(Cell::Missing)
            })
            .collect();
        table.attributes.rows.push(row);
        table.shapes.push(shape);
    }
    if skipped > 0 {
        warn!(skipped, "Skipped features without polygon geometry");
    }
    table
}

/// Loads the boundary collection for `level` from `dir`.
pub fn load_geometries(dir: &Path, level: GeometryLevel) -> MapResult<GeoTable> {
    let path = dir.join(level.file_name());
    let table = geo_table_from_geojson(read_geojson(&path)?);
    debug!(path = %path.display(), features = table.len(), "Loaded geometries");
    Ok(table)
}
