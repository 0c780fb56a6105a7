//! Declarative layout templates loaded from JSON.
//!
//! A template file declares an image count, an aspect ratio, a set of named
//! parameters with initial values and ranges, and one entry per cell whose
//! position and size are [`expr`](crate::expr) expressions over those
//! parameters:
//!
//! ```json
//! {
//!   "name": "2-H-Adjustable",
//!   "imageCount": 2,
//!   "aspectRatio": 1.3333,
//!   "parameters": { "h_split1": { "initial": 0.5, "range": [0.1, 0.9] } },
//!   "frameDefinitions": [
//!     { "x": "0", "y": "0", "width": "params.h_split1", "height": "1" },
//!     { "x": "params.h_split1", "y": "0",
//!       "width": "1 - params.h_split1", "height": "1" }
//!   ]
//! }
//! ```
//!
//! Loading is best-effort per file: a malformed template is skipped with a
//! logged warning and never prevents the rest of a directory from loading.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::geometry::{ShapeKind, Vec2};

/// A parsed layout template.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutTemplate {
    /// Unique template name.
    pub name: String,
    /// Number of images this layout arranges.
    #[serde(rename = "imageCount")]
    pub image_count: usize,
    /// Width-over-height ratio of the layout container.
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: f64,
    /// Named adjustable parameters, if any.
    #[serde(default)]
    pub parameters: BTreeMap<String, TemplateParameter>,
    /// One entry per cell, in image order.
    #[serde(rename = "frameDefinitions")]
    pub cells: Vec<CellTemplate>,
}

/// Initial value and valid range for a named template parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateParameter {
    /// Starting value.
    pub initial: f64,
    /// Two-element `[lower, upper]` range. Other lengths fall back to
    /// `[0, 1]`.
    pub range: Vec<f64>,
}

impl TemplateParameter {
    /// The declared range as a pair, defaulting to `(0, 1)` when the file
    /// does not carry exactly two bounds.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        if self.range.len() == 2 {
            (self.range[0], self.range[1])
        } else {
            (0.0, 1.0)
        }
    }
}

/// Position, size, and shape of one template cell, all as expression
/// strings.
#[derive(Debug, Clone, Deserialize)]
pub struct CellTemplate {
    /// Left edge expression.
    pub x: String,
    /// Top edge expression.
    pub y: String,
    /// Width expression.
    pub width: String,
    /// Height expression.
    pub height: String,
    /// Rotation expression in degrees, if any.
    #[serde(default)]
    pub rotation: Option<String>,
    /// Cell shape, defaulting to a plain rectangle.
    #[serde(default)]
    pub shape: Option<TemplateShape>,
}

/// Shape declaration for one cell.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateShape {
    /// Shape type name: `rectangle`, `circle`, `ellipse`, or `polygon`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Shape-specific string parameters, e.g. `cornerRadius` or `points`.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl CellTemplate {
    /// Resolve this cell's shape declaration into a [`ShapeKind`].
    ///
    /// Unknown shape types and malformed parameters fall back to a plain
    /// rectangle with a logged warning; template authoring mistakes never
    /// fail the layout.
    #[must_use]
    pub fn shape_kind(&self) -> ShapeKind {
        let Some(shape) = &self.shape else {
            return ShapeKind::default();
        };
        match shape.kind.as_str() {
            "rectangle" => {
                let corner_radius = shape
                    .parameters
                    .get("cornerRadius")
                    .and_then(|raw| raw.trim().parse::<f64>().ok())
                    .unwrap_or(0.0);
                ShapeKind::Rectangle { corner_radius }
            }
            "circle" => ShapeKind::Circle,
            "ellipse" => ShapeKind::Ellipse,
            "polygon" => {
                let points = shape
                    .parameters
                    .get("points")
                    .map(|raw| parse_points(raw))
                    .unwrap_or_default();
                if points.len() >= 3 {
                    ShapeKind::Polygon(points)
                } else {
                    log::warn!("polygon cell without valid `points`, using rectangle");
                    ShapeKind::default()
                }
            }
            other => {
                log::warn!("unknown shape type `{other}`, using rectangle");
                ShapeKind::default()
            }
        }
    }
}

/// Parse a polygon point list of the form `[x,y; x,y; ...]`.
///
/// Malformed entries are dropped individually.
fn parse_points(raw: &str) -> Vec<Vec2> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(';')
        .filter_map(|pair| {
            let mut coords = pair.split(',');
            let x = coords.next()?.trim().parse::<f64>().ok()?;
            let y = coords.next()?.trim().parse::<f64>().ok()?;
            Some(Vec2::new(x, y))
        })
        .collect()
}

/// Load a single template file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Template`]
/// if it is not valid template JSON.
pub fn load_template(path: &Path) -> Result<LayoutTemplate> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|source| Error::Template {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every `*.json` template in a directory, sorted by file name.
///
/// Malformed files are skipped individually with a logged warning. When
/// `image_count` is given, only templates declaring that count are
/// returned.
///
/// # Errors
///
/// Returns [`Error::Io`] only if the directory itself cannot be read.
pub fn load_templates(dir: &Path, image_count: Option<usize>) -> Result<Vec<LayoutTemplate>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .collect();
    paths.sort();

    let mut templates = Vec::new();
    for path in paths {
        match load_template(&path) {
            Ok(template) => {
                if image_count.is_none_or(|count| template.image_count == count) {
                    templates.push(template);
                }
            }
            Err(err) => log::warn!("skipping template {}: {err}", path.display()),
        }
    }
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SPLIT: &str = r#"{
        "name": "2-H-Adjustable",
        "imageCount": 2,
        "aspectRatio": 1.3333,
        "parameters": { "h_split1": { "initial": 0.5, "range": [0.1, 0.9] } },
        "frameDefinitions": [
            { "x": "0", "y": "0", "width": "params.h_split1", "height": "1" },
            { "x": "params.h_split1", "y": "0",
              "width": "1 - params.h_split1", "height": "1" }
        ]
    }"#;

    #[test]
    fn parses_a_minimal_template() {
        let template: LayoutTemplate = serde_json::from_str(TWO_SPLIT).unwrap();
        assert_eq!(template.name, "2-H-Adjustable");
        assert_eq!(template.image_count, 2);
        assert_eq!(template.cells.len(), 2);
        let (lo, hi) = template.parameters["h_split1"].bounds();
        assert!((lo - 0.1).abs() < 1e-12);
        assert!((hi - 0.9).abs() < 1e-12);
    }

    #[test]
    fn shape_kinds_resolve() {
        let json = r#"{
            "name": "shapes", "imageCount": 4, "aspectRatio": 1.0,
            "frameDefinitions": [
                { "x": "0", "y": "0", "width": "0.5", "height": "0.5",
                  "shape": { "type": "rectangle",
                             "parameters": { "cornerRadius": "0.25" } } },
                { "x": "0.5", "y": "0", "width": "0.5", "height": "0.5",
                  "shape": { "type": "circle" } },
                { "x": "0", "y": "0.5", "width": "0.5", "height": "0.5",
                  "shape": { "type": "polygon",
                             "parameters": { "points": "[0.3,0; 1,0; 0.7,1; 0,1]" } } },
                { "x": "0.5", "y": "0.5", "width": "0.5", "height": "0.5",
                  "shape": { "type": "starburst" } }
            ]
        }"#;
        let template: LayoutTemplate = serde_json::from_str(json).unwrap();

        assert_eq!(
            template.cells[0].shape_kind(),
            ShapeKind::Rectangle {
                corner_radius: 0.25
            }
        );
        assert_eq!(template.cells[1].shape_kind(), ShapeKind::Circle);
        match template.cells[2].shape_kind() {
            ShapeKind::Polygon(points) => assert_eq!(points.len(), 4),
            other => panic!("expected polygon, got {other:?}"),
        }
        // Unknown types degrade to a rectangle rather than erroring.
        assert_eq!(template.cells[3].shape_kind(), ShapeKind::default());
    }

    #[test]
    fn missing_range_defaults_to_unit() {
        let parameter = TemplateParameter {
            initial: 0.5,
            range: vec![0.3],
        };
        assert_eq!(parameter.bounds(), (0.0, 1.0));
    }

    #[test]
    fn loader_skips_malformed_files() {
        let dir = std::env::temp_dir().join(format!("gridpop-templates-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("good.json"), TWO_SPLIT).unwrap();
        std::fs::write(dir.join("bad.json"), "{ not json").unwrap();
        std::fs::write(dir.join("ignored.txt"), "not a template").unwrap();

        let templates = load_templates(&dir, None).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "2-H-Adjustable");

        let filtered = load_templates(&dir, Some(3)).unwrap();
        assert!(filtered.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }
}
