// projection.rs

use proj::Proj;
use tracing::{info, warn};

use crate::error::{MapError, MapResult};
use crate::geometry::{GeoTable, Shape};
use crate::prompt::Prompt;
use crate::resolve::Resolution;

/// Boundary files are plain GeoJSON longitude/latitude.
pub const SOURCE_CRS: &str = "EPSG:4326";

/// USA Contiguous Albers Equal Area Conic.
pub const DEFAULT_TARGET_CRS: &str = "ESRI:102003";

/// Coordinate transformation collaborator.
pub trait Reprojector {
    /// Checks that `crs` can be projected into.
    fn validate(&self, crs: &str) -> MapResult<()>;

    /// Returns reprojected copies of `shapes`; the input is left untouched.
    fn reproject(&self, shapes: &[Shape], crs: &str) -> MapResult<Vec<Shape>>;
}

/// `Reprojector` backed by PROJ.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjReprojector;

impl ProjReprojector {
    fn transform(crs: &str) -> MapResult<Proj> {
        Proj::new_known_crs(SOURCE_CRS, crs, None).map_err(|e| MapError::Projection {
            crs: crs.to_string(),
            message: e.to_string(),
        })
    }
}

impl Reprojector for ProjReprojector {
    fn validate(&self, crs: &str) -> MapResult<()> {
        Self::transform(crs).map(|_| ())
    }

    fn reproject(&self, shapes: &[Shape], crs: &str) -> MapResult<Vec<Shape>> {
        let transform = Self::transform(crs)?;
        shapes
            .iter()
            .map(|shape| {
                shape.try_map(|point| {
                    transform.convert(point).map_err(|e| MapError::Projection {
                        crs: crs.to_string(),
                        message: e.to_string(),
                    })
                })
            })
            .collect()
    }
}

/// Picks the target CRS: the configured one if the reprojector accepts it,
/// one operator replacement if not, the contiguous-US default if none is set.
pub fn resolve_target_crs(
    configured: Option<&str>,
    reprojector: &dyn Reprojector,
    prompt: &mut dyn Prompt,
) -> MapResult<String> {
    Resolution::classify(configured.map(str::to_string), |crs| {
        match reprojector.validate(crs) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Requested projection rejected");
                false
            }
        }
    })
    .resolve(
        prompt,
        |prompt, _| {
            prompt.warn("The requested projection doesn't exist. Try a different one or see all possible projections at: http://spatialreference.org/ref/epsg and at: http://spatialreference.org/ref/esri.");
            prompt.ask("Enter new projection: ")
        },
        |_| Ok(DEFAULT_TARGET_CRS.to_string()),
    )
}

/// Reprojects the joined table into the resolved target CRS.
pub fn normalize_projection(
    table: GeoTable,
    configured: Option<&str>,
    reprojector: &dyn Reprojector,
    prompt: &mut dyn Prompt,
) -> MapResult<GeoTable> {
    let crs = resolve_target_crs(configured, reprojector, prompt)?;
    info!(crs = %crs, "Setting projection");
    let shapes = reprojector.reproject(&table.shapes, &crs)?;
    Ok(GeoTable { shapes, ..table })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use crate::prompt::ScriptedPrompt;
    use crate::tabular::DataTable;
    use std::cell::RefCell;

    /// Scales coordinates by a factor chosen per CRS name.
    struct ScaleReprojector {
        known: Vec<(&'static str, f64)>,
        used: RefCell<Vec<String>>,
    }

    impl ScaleReprojector {
        fn new() -> Self {
            Self {
                known: vec![(DEFAULT_TARGET_CRS, 10.0), ("EPSG:5070", 100.0)],
                used: RefCell::new(Vec::new()),
            }
        }

        fn factor(&self, crs: &str) -> MapResult<f64> {
            self.known
                .iter()
                .find(|(name, _)| *name == crs)
                .map(|(_, f)| *f)
                .ok_or_else(|| MapError::Projection {
                    crs: crs.to_string(),
                    message: "unknown".to_string(),
                })
        }
    }

    impl Reprojector for ScaleReprojector {
        fn validate(&self, crs: &str) -> MapResult<()> {
            self.factor(crs).map(|_| ())
        }

        fn reproject(&self, shapes: &[Shape], crs: &str) -> MapResult<Vec<Shape>> {
            let factor = self.factor(crs)?;
            self.used.borrow_mut().push(crs.to_string());
            shapes
                .iter()
                .map(|s| s.try_map(|(x, y)| Ok((x * factor, y * factor))))
                .collect()
        }
    }

    fn table() -> GeoTable {
        GeoTable {
            attributes: DataTable::new(vec!["FIPS".into()]),
            shapes: vec![Shape {
                polygons: vec![Polygon {
                    exterior: vec![(1.0, 2.0), (3.0, 2.0), (3.0, 4.0), (1.0, 2.0)],
                    holes: vec![],
                }],
            }],
        }
    }

    #[test]
    fn default_crs_is_used_when_nothing_is_configured() {
        let reprojector = ScaleReprojector::new();
        let mut prompt = ScriptedPrompt::default();
        let projected = normalize_projection(table(), None, &reprojector, &mut prompt).unwrap();
        assert_eq!(projected.shapes[0].polygons[0].exterior[0], (10.0, 20.0));
        assert_eq!(*reprojector.used.borrow(), vec![DEFAULT_TARGET_CRS]);
    }

    #[test]
    fn configured_crs_is_used_directly() {
        let reprojector = ScaleReprojector::new();
        let mut prompt = ScriptedPrompt::default();
        let projected =
            normalize_projection(table(), Some("EPSG:5070"), &reprojector, &mut prompt).unwrap();
        assert_eq!(projected.shapes[0].polygons[0].exterior[1], (300.0, 200.0));
        assert!(prompt.questions.is_empty());
    }

    #[test]
    fn rejected_crs_is_replaced_once() {
        let reprojector = ScaleReprojector::new();
        let mut prompt = ScriptedPrompt::new(["EPSG:5070"]);
        normalize_projection(table(), Some("EPSG:0"), &reprojector, &mut prompt).unwrap();
        assert_eq!(*reprojector.used.borrow(), vec!["EPSG:5070"]);
        assert_eq!(prompt.warnings.len(), 1);
    }

    #[test]
    fn replacement_crs_is_trusted() {
        let reprojector = ScaleReprojector::new();
        let mut prompt = ScriptedPrompt::new(["EPSG:1"]);
        let err = normalize_projection(table(), Some("EPSG:0"), &reprojector, &mut prompt)
            .unwrap_err();
        assert!(matches!(err, MapError::Projection { ref crs, .. } if crs == "EPSG:1"));
        assert_eq!(prompt.questions.len(), 1);
    }

    #[test]
    fn proj_projects_lon_lat_into_contiguous_albers() {
        let shape = Shape {
            polygons: vec![Polygon {
                exterior: vec![(-96.0, 37.5), (-86.0, 37.5)],
                holes: vec![],
            }],
        };
        let projected = ProjReprojector.reproject(&[shape], DEFAULT_TARGET_CRS).unwrap();
        let ring = &projected[0].polygons[0].exterior;

        // Projection origin.
        assert!(ring[0].0.abs() < 1.0 && ring[0].1.abs() < 1.0, "{:?}", ring[0]);
        // Ten degrees east along the origin parallel.
        assert!((700_000.0..1_000_000.0).contains(&ring[1].0), "{:?}", ring[1]);
        assert!(ring[1].1.abs() < 200_000.0, "{:?}", ring[1]);
    }

    #[test]
    fn proj_rejects_unknown_identifiers() {
        assert!(ProjReprojector.validate("NOT:A-CRS").is_err());
    }
}
