// render.rs
//
// Draws the choropleth figure as SVG with plotters. Raster and PDF output
// rasterize that markup with resvg.

use std::ops::Range;
use std::sync::Arc;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tiny_skia::{Pixmap, Transform};
use tracing::debug;

use crate::encode::{ColorEncoding, numeric_values};
use crate::error::{MapError, MapResult};
use crate::geometry::{GeoTable, Polygon, Shape};

pub const FIGURE_WIDTH: u32 = 1600;
pub const FIGURE_HEIGHT: u32 = 1200;

/// Figure fractions `[left, bottom, width, height]`.
const AXES_BOX: [f64; 4] = [0.125, 0.11, 0.775, 0.77];
const COLORBAR_BOX: [f64; 4] = [0.5, 0.1, 0.3, 0.01];

const COLORBAR_ALPHA: f64 = 0.8;
const COLORBAR_STEPS: usize = 256;
const TICK_LENGTH: i32 = 6;

const FONT: &str = "sans-serif";
const TITLE_SIZE: i32 = 32;
const CITATION_SIZE: i32 = 20;
const TICK_LABEL_SIZE: i32 = 18;

const EPSILON: f64 = 0.001;

type Canvas<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Everything drawn on the map.
#[derive(Debug, Clone)]
pub struct Figure<'a> {
    pub title: String,
    pub citation: String,
    pub table: &'a GeoTable,
    /// One entry per table row; `None` leaves the region unfilled.
    pub fills: Vec<Option<RGBColor>>,
    pub encoding: &'a ColorEncoding,
}

impl<'a> Figure<'a> {
    /// Shades every row of `table` and derives the title and citation texts.
    pub fn compose(
        table: &'a GeoTable,
        encoding: &'a ColorEncoding,
        data_name: &str,
        title: Option<&str>,
        source: Option<&str>,
    ) -> MapResult<Self> {
        let fills = numeric_values(table, &encoding.column)?
            .into_iter()
            .map(|value| value.map(|v| encoding.color_for(v)))
            .collect();
        let title = match title {
            Some(title) => title.to_string(),
            None => format!("{data_name}-{}", encoding.column),
        };
        let citation = match source {
            Some(source) => format!("Source: {source}"),
            None => "Source:".to_string(),
        };
        Ok(Self {
            title,
            citation,
            table,
            fills,
            encoding,
        })
    }
}

/// Pixel rectangle of a figure-fraction box, as `(left, top, width, height)`.
fn pixel_box(fractions: [f64; 4]) -> (i32, i32, u32, u32) {
    let [left, bottom, width, height] = fractions;
    let (w, h) = (f64::from(FIGURE_WIDTH), f64::from(FIGURE_HEIGHT));
    (
        (left * w).round() as i32,
        ((1.0 - bottom - height) * h).round() as i32,
        (width * w).round() as u32,
        (height * h).round() as u32,
    )
}

/// Widens the shorter side of `bbox` so one map unit spans the same number of
/// pixels on both axes.
pub fn equal_aspect_ranges(bbox: [f64; 4], width: u32, height: u32) -> (Range<f64>, Range<f64>) {
    let [min_x, min_y, max_x, max_y] = bbox;
    let x_span = (max_x - min_x).max(EPSILON);
    let y_span = (max_y - min_y).max(EPSILON);
    let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);

    let aspect = f64::from(width) / f64::from(height.max(1));
    let (x_span, y_span) = if x_span / y_span < aspect {
        (y_span * aspect, y_span)
    } else {
        (x_span, x_span / aspect)
    };
    (
        cx - x_span / 2.0..cx + x_span / 2.0,
        cy - y_span / 2.0..cy + y_span / 2.0,
    )
}

/// Filled polygons ordered largest extent first, so enclaves sitting in the
/// hole of a surrounding region are painted over it.
fn fill_order<'a>(shapes: &'a [Shape], fills: &[Option<RGBColor>]) -> Vec<(&'a Polygon, RGBColor)> {
    let mut order: Vec<(f64, &Polygon, RGBColor)> = shapes
        .iter()
        .zip(fills)
        .filter_map(|(shape, fill)| fill.map(|color| (shape, color)))
        .flat_map(|(shape, color)| {
            shape.polygons.iter().map(move |p| (extent(&p.exterior), p, color))
        })
        .collect();
    order.sort_by(|a, b| b.0.total_cmp(&a.0));
    order.into_iter().map(|(_, p, color)| (p, color)).collect()
}

/// Bounding-box area of a ring.
fn extent(ring: &[(f64, f64)]) -> f64 {
    let Some(&(x, y)) = ring.first() else {
        return 0.0;
    };
    let [x0, y0, x1, y1] = ring.iter().fold([x, y, x, y], |[x0, y0, x1, y1], &(x, y)| {
        [x0.min(x), y0.min(y), x1.max(x), y1.max(y)]
    });
    (x1 - x0) * (y1 - y0)
}

fn draw_regions(root: &Canvas<'_>, figure: &Figure<'_>) -> MapResult<()> {
    let Some(bbox) = figure.table.bbox() else {
        return Ok(());
    };
    let (left, top, width, height) = pixel_box(AXES_BOX);
    let axes = root.clone().shrink((left, top), (width, height));
    let (x_range, y_range) = equal_aspect_ranges(bbox, width, height);

    let mut chart = ChartBuilder::on(&axes)
        .build_cartesian_2d(x_range, y_range)
        .map_err(MapError::render)?;

    let fills = fill_order(&figure.table.shapes, &figure.fills)
        .into_iter()
        .map(|(p, color)| plotters::element::Polygon::new(p.exterior.clone(), color.filled()));
    chart.draw_series(fills).map_err(MapError::render)?;

    let borders = figure
        .table
        .shapes
        .iter()
        .flat_map(|shape| &shape.polygons)
        .flat_map(|p| std::iter::once(&p.exterior).chain(&p.holes))
        .map(|ring| PathElement::new(ring.clone(), WHITE.stroke_width(1)));
    chart.draw_series(borders).map_err(MapError::render)?;
    Ok(())
}

fn draw_colorbar(root: &Canvas<'_>, encoding: &ColorEncoding) -> MapResult<()> {
    let (left, top, width, height) = pixel_box(COLORBAR_BOX);
    let area = root.clone().shrink((left, top), (width, height));
    let span = (encoding.max - encoding.min).max(EPSILON);
    let mut chart = ChartBuilder::on(&area)
        .build_cartesian_2d(encoding.min..encoding.min + span, 0.0..1.0)
        .map_err(MapError::render)?;

    let step = span / COLORBAR_STEPS as f64;
    let cells = (0..COLORBAR_STEPS).map(|i| {
        let x0 = encoding.min + step * i as f64;
        let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        let color = encoding.colormap.sample(t).mix(COLORBAR_ALPHA);
        Rectangle::new([(x0, 0.0), (x0 + step, 1.0)], color.filled())
    });
    chart.draw_series(cells).map_err(MapError::render)?;

    let label_style = TextStyle::from((FONT, TICK_LABEL_SIZE).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    let mut drawn: Vec<i32> = Vec::with_capacity(encoding.ticks.len());
    for (tick, label) in encoding.ticks.iter().zip(&encoding.labels) {
        let (x, y) = chart.backend_coord(&(*tick, 0.0));
        // Clamped ticks repeat the maximum.
        if drawn.contains(&x) {
            continue;
        }
        drawn.push(x);
        root.draw(&PathElement::new(
            vec![(x, y), (x, y + TICK_LENGTH)],
            BLACK.stroke_width(1),
        ))
        .map_err(MapError::render)?;
        root.draw(&Text::new(
            label.as_str(),
            (x, y + TICK_LENGTH + 4),
            label_style.clone(),
        ))
        .map_err(MapError::render)?;
    }
    Ok(())
}

fn draw_captions(root: &Canvas<'_>, figure: &Figure<'_>) -> MapResult<()> {
    let (left, top, _, height) = pixel_box(AXES_BOX);

    let title_style = TextStyle::from((FONT, TITLE_SIZE).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Bottom));
    root.draw(&Text::new(figure.title.as_str(), (left, top - 12), title_style))
        .map_err(MapError::render)?;

    let citation_style = TextStyle::from((FONT, CITATION_SIZE).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Top));
    root.draw(&Text::new(
        figure.citation.as_str(),
        (left, top + height as i32 + 40),
        citation_style,
    ))
    .map_err(MapError::render)?;
    Ok(())
}

/// Renders `figure` to SVG markup on a white 1600x1200 canvas.
pub fn render_svg(figure: &Figure<'_>) -> MapResult<String> {
    let mut markup = String::new();
    {
        let root = SVGBackend::with_string(&mut markup, (FIGURE_WIDTH, FIGURE_HEIGHT))
            .into_drawing_area();
        root.fill(&WHITE).map_err(MapError::render)?;

        draw_regions(&root, figure)?;
        draw_colorbar(&root, figure.encoding)?;
        draw_captions(&root, figure)?;

        root.present().map_err(MapError::render)?;
    }
    debug!(bytes = markup.len(), regions = figure.table.len(), "Rendered SVG");
    Ok(markup)
}

/// Rasterizes SVG markup at figure size using the system fonts.
pub fn rasterize(markup: &str) -> MapResult<Pixmap> {
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    let mut options = usvg::Options::default();
    options.fontdb = Arc::new(fontdb);

    let tree = usvg::Tree::from_str(markup, &options).map_err(MapError::render)?;
    let mut pixmap = Pixmap::new(FIGURE_WIDTH, FIGURE_HEIGHT)
        .ok_or_else(|| MapError::Render("cannot allocate raster canvas".to_string()))?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::ColorMap;
    use crate::geometry::Polygon;
    use crate::tabular::{Cell, DataTable};
    use approx::assert_relative_eq;

    fn square(x: f64, y: f64) -> Shape {
        Shape {
            polygons: vec![Polygon {
                exterior: vec![(x, y), (x + 1.0, y), (x + 1.0, y + 1.0), (x, y + 1.0), (x, y)],
                holes: vec![],
            }],
        }
    }

    fn table() -> GeoTable {
        let mut attributes = DataTable::new(vec!["FIPS".into(), "Value".into()]);
        attributes.rows = vec![
            vec![Cell::Text("01001".into()), Cell::Number(2.0)],
            vec![Cell::Text("01003".into()), Cell::Missing],
            vec![Cell::Text("01005".into()), Cell::Number(10.0)],
        ];
        GeoTable {
            attributes,
            shapes: vec![square(0.0, 0.0), square(1.0, 0.0), square(2.0, 0.0)],
        }
    }

    fn encoding() -> ColorEncoding {
        ColorEncoding::from_table(&table(), "Value", ColorMap::Reds, "%").unwrap()
    }

    #[test]
    fn compose_defaults_title_and_citation() {
        let table = table();
        let encoding = encoding();
        let figure = Figure::compose(&table, &encoding, "rates", None, None).unwrap();
        assert_eq!(figure.title, "rates-Value");
        assert_eq!(figure.citation, "Source:");
        assert_eq!(figure.fills.len(), 3);
        assert!(figure.fills[1].is_none());
        assert_eq!(figure.fills[2], Some(ColorMap::Reds.sample(1.0)));
    }

    #[test]
    fn compose_uses_configured_texts() {
        let table = table();
        let encoding = encoding();
        let figure =
            Figure::compose(&table, &encoding, "rates", Some("Unemployment"), Some("BLS")).unwrap();
        assert_eq!(figure.title, "Unemployment");
        assert_eq!(figure.citation, "Source: BLS");
    }

    fn ring(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<(f64, f64)> {
        vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]
    }

    /// A city occupying the hole of the county around it, listed first.
    fn enclave_table() -> GeoTable {
        let mut attributes = DataTable::new(vec!["FIPS".into(), "Value".into()]);
        attributes.rows = vec![
            vec![Cell::Text("51540".into()), Cell::Number(100.0)],
            vec![Cell::Text("51003".into()), Cell::Number(0.0)],
        ];
        let city = Shape {
            polygons: vec![Polygon {
                exterior: ring(1.0, 1.0, 2.0, 2.0),
                holes: vec![],
            }],
        };
        let county = Shape {
            polygons: vec![Polygon {
                exterior: ring(0.0, 0.0, 3.0, 3.0),
                holes: vec![ring(1.0, 1.0, 2.0, 2.0)],
            }],
        };
        GeoTable {
            attributes,
            shapes: vec![city, county],
        }
    }

    #[test]
    fn larger_regions_are_filled_first() {
        let table = enclave_table();
        let fills = vec![Some(RED), Some(BLUE)];
        let order = fill_order(&table.shapes, &fills);
        assert_eq!(order.len(), 2);
        assert_eq!(order[0].1, BLUE);
        assert_eq!(order[1].1, RED);
    }

    #[test]
    fn enclave_keeps_its_own_colour() {
        let table = enclave_table();
        let encoding = ColorEncoding::from_table(&table, "Value", ColorMap::Reds, "%").unwrap();
        let figure = Figure::compose(&table, &encoding, "va", None, None).unwrap();
        let pixmap = rasterize(&render_svg(&figure).unwrap()).unwrap();

        let rgb = |x: u32, y: u32| {
            let c = pixmap.pixel(x, y).unwrap().demultiply();
            RGBColor(c.red(), c.green(), c.blue())
        };
        // Map centre (1.5, 1.5) lands on the axes centre; one unit is ~308 px.
        assert_eq!(rgb(820, 606), ColorMap::Reds.sample(1.0));
        assert_eq!(rgb(512, 606), ColorMap::Reds.sample(0.0));
    }

    #[test]
    fn repeated_ticks_are_labelled_once() {
        let mut attributes = DataTable::new(vec!["Value".into()]);
        attributes.rows = vec![vec![Cell::Number(40.0)], vec![Cell::Number(60.0)]];
        let table = GeoTable {
            attributes,
            shapes: vec![square(0.0, 0.0), square(1.0, 0.0)],
        };
        let encoding = ColorEncoding::from_table(&table, "Value", ColorMap::Reds, "%").unwrap();
        let figure = Figure::compose(&table, &encoding, "d", None, None).unwrap();
        let markup = render_svg(&figure).unwrap();
        assert_eq!(markup.matches("60.00%").count(), 1);
        assert_eq!(markup.matches("52.00").count(), 1);
    }

    #[test]
    fn equal_aspect_widens_the_short_side() {
        let (x, y) = equal_aspect_ranges([0.0, 0.0, 10.0, 10.0], 200, 100);
        assert_relative_eq!(x.end - x.start, 20.0);
        assert_relative_eq!(y.end - y.start, 10.0);
        assert_relative_eq!(x.start, -5.0);

        let (x, y) = equal_aspect_ranges([0.0, 0.0, 40.0, 10.0], 200, 100);
        assert_relative_eq!(x.end - x.start, 40.0);
        assert_relative_eq!(y.end - y.start, 20.0);
    }

    #[test]
    fn degenerate_extent_gets_a_minimum_span() {
        let (x, y) = equal_aspect_ranges([5.0, 5.0, 5.0, 5.0], 100, 100);
        assert!(x.end > x.start);
        assert!(y.end > y.start);
    }

    #[test]
    fn colorbar_box_sits_under_the_map() {
        assert_eq!(pixel_box(COLORBAR_BOX), (800, 1068, 480, 12));
        assert_eq!(pixel_box(AXES_BOX), (200, 144, 1240, 924));
    }

    #[test]
    fn svg_carries_texts_and_background() {
        let table = table();
        let encoding = encoding();
        let figure = Figure::compose(&table, &encoding, "rates", None, Some("BLS")).unwrap();
        let markup = render_svg(&figure).unwrap();
        assert!(markup.contains("<svg"));
        assert!(markup.contains("rates-Value"));
        assert!(markup.contains("Source: BLS"));
        assert!(markup.contains("10.00%"));
        assert!(markup.contains(r#"<rect x="0" y="0""#));
    }

    #[test]
    fn rasterized_figure_has_figure_size() {
        let table = table();
        let encoding = encoding();
        let figure = Figure::compose(&table, &encoding, "rates", None, None).unwrap();
        let pixmap = rasterize(&render_svg(&figure).unwrap()).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (FIGURE_WIDTH, FIGURE_HEIGHT));
        // Top-left corner is background.
        let corner = pixmap.pixel(0, 0).unwrap().demultiply();
        assert_eq!((corner.red(), corner.green(), corner.blue()), (255, 255, 255));
    }
}
