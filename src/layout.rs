//! Adjustable collage layout engine.
//!
//! A [`Layout`] maps a set of named scalar parameters (split fractions in
//! `[0, 1]`) to concrete cell geometry in the normalized unit square.
//! Frames are derived data: [`Layout::cells`] recomputes them from the
//! current parameter set on every call and two calls with the same
//! parameters produce identical results.
//!
//! Parameters mutate only through [`Layout::update`], which clamps the
//! proposed value against same-axis neighbours (`h_split1` cannot cross
//! `h_split2`) and against the parameter's own declared range. Dragging a
//! divider therefore always lands on *some* valid position; updates are
//! never rejected.
//!
//! Three generator kinds cover the built-in registry:
//!
//! - **splits**: the generic path. Ordered `h_split*` / `v_split*` values
//!   with `0` prepended and `1` appended form monotonic sequences whose
//!   consecutive differences are column/row extents; their cross product
//!   (row-major) is the cell list.
//! - **fixed**: an explicit per-name generator for non-grid topologies
//!   (hero cells, L-shapes) that the split cross product cannot express.
//! - **template**: data-driven layouts whose cells are
//!   [`expr`](crate::expr) expressions, loaded from JSON
//!   ([`crate::template`]). Preferred for new layouts.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::expr::{self, ParamValues};
use crate::geometry::{CellGeometry, Rect};
use crate::template::LayoutTemplate;
use crate::throttle::Throttle;

/// Minimum fraction kept between two adjacent same-axis split values.
pub const MIN_SPACING: f64 = 0.05;

/// Default valid range for a split parameter: every cell keeps at least
/// 10% of the container along its axis.
pub const DEFAULT_SPLIT_RANGE: RangeInclusive<f64> = 0.1..=0.9;

/// One named, range-limited layout parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Current value in `[0, 1]`.
    pub value: f64,
    /// Declared valid range.
    pub range: RangeInclusive<f64>,
}

impl Parameter {
    /// Create a parameter with an explicit range.
    #[must_use]
    pub fn new(value: f64, range: RangeInclusive<f64>) -> Self {
        Self { value, range }
    }

    /// Create a split parameter with the default `[0.1, 0.9]` range.
    #[must_use]
    pub fn split(value: f64) -> Self {
        Self::new(value, DEFAULT_SPLIT_RANGE)
    }
}

/// The named parameter set of a layout.
pub type ParameterSet = BTreeMap<String, Parameter>;

/// Frame generator for a fixed (non-grid) topology.
pub type FrameGenerator = fn(&ParameterSet) -> Vec<CellGeometry>;

#[derive(Debug, Clone)]
enum Generator {
    Splits,
    Fixed(FrameGenerator),
    Template(LayoutTemplate),
}

/// A single collage layout: name, container aspect ratio, parameters, and
/// the frame generator deriving cell geometry from them.
#[derive(Debug, Clone)]
pub struct Layout {
    name: String,
    aspect_ratio: f64,
    parameters: ParameterSet,
    generator: Generator,
}

impl Layout {
    /// A layout using the generic split cross-product generator.
    #[must_use]
    pub fn splits(name: &str, aspect_ratio: f64, parameters: ParameterSet) -> Self {
        Self {
            name: name.to_string(),
            aspect_ratio,
            parameters,
            generator: Generator::Splits,
        }
    }

    /// A layout with an explicit frame generator.
    #[must_use]
    pub fn fixed(
        name: &str,
        aspect_ratio: f64,
        parameters: ParameterSet,
        generator: FrameGenerator,
    ) -> Self {
        Self {
            name: name.to_string(),
            aspect_ratio,
            parameters,
            generator: Generator::Fixed(generator),
        }
    }

    /// Build a layout from a parsed JSON template.
    #[must_use]
    pub fn from_template(template: LayoutTemplate) -> Self {
        let parameters = template
            .parameters
            .iter()
            .map(|(name, parameter)| {
                let (lower, upper) = parameter.bounds();
                (
                    name.clone(),
                    Parameter::new(parameter.initial.clamp(lower, upper), lower..=upper),
                )
            })
            .collect();
        Self {
            name: template.name.clone(),
            aspect_ratio: template.aspect_ratio,
            parameters,
            generator: Generator::Template(template),
        }
    }

    /// Layout name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width-over-height ratio of the layout container.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// The current parameter set.
    #[must_use]
    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Current value of a named parameter, if it exists.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).map(|p| p.value)
    }

    /// Derive the cell list from the current parameter set.
    ///
    /// Pure: identical parameters produce identical cells.
    #[must_use]
    pub fn cells(&self) -> Vec<CellGeometry> {
        match &self.generator {
            Generator::Splits => self.split_cells(),
            Generator::Fixed(generator) => generator(&self.parameters),
            Generator::Template(template) => self.template_cells(template),
        }
    }

    /// Number of cells this layout produces at its current parameters.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells().len()
    }

    /// Apply a constrained parameter update.
    ///
    /// The proposed value is clamped between the same-axis neighbours
    /// (`<axis>_split(N-1)` and `<axis>_split(N+1)`, where present) with
    /// [`MIN_SPACING`] slack, then clamped to the parameter's own range.
    /// Returns `true` only when the stored value actually changed; updates
    /// naming an unknown parameter are a no-op.
    pub fn update(&mut self, name: &str, proposed: f64) -> bool {
        let Some(parameter) = self.parameters.get(name) else {
            return false;
        };
        let current = parameter.value;
        let (lower, upper) = (*parameter.range.start(), *parameter.range.end());

        let mut value = proposed;
        if let Some((prefix, index)) = split_key(name) {
            if index > 0 {
                if let Some(prev) = self.parameters.get(&format!("{prefix}{}", index - 1)) {
                    value = value.max(prev.value + MIN_SPACING);
                }
            }
            if let Some(next) = self.parameters.get(&format!("{prefix}{}", index + 1)) {
                value = value.min(next.value - MIN_SPACING);
            }
        }

        let clamped = value.clamp(lower, upper);
        if (clamped - current).abs() < f64::EPSILON {
            return false;
        }
        if let Some(parameter) = self.parameters.get_mut(name) {
            parameter.value = clamped;
        }
        true
    }

    fn split_cells(&self) -> Vec<CellGeometry> {
        let xs = self.axis_stops("h_split");
        let ys = self.axis_stops("v_split");

        let mut cells = Vec::with_capacity((xs.len() - 1) * (ys.len() - 1));
        for row in ys.windows(2) {
            for col in xs.windows(2) {
                cells.push(CellGeometry::rect(Rect::new(
                    col[0],
                    row[0],
                    col[1] - col[0],
                    row[1] - row[0],
                )));
            }
        }
        cells
    }

    /// Ordered stop positions along one axis: 0, the indexed split values
    /// in index order, then 1.
    fn axis_stops(&self, prefix: &str) -> Vec<f64> {
        let mut splits: Vec<(usize, f64)> = self
            .parameters
            .iter()
            .filter_map(|(name, parameter)| {
                let (key_prefix, index) = split_key(name)?;
                (key_prefix == prefix).then_some((index, parameter.value))
            })
            .collect();
        splits.sort_by_key(|(index, _)| *index);

        let mut stops = Vec::with_capacity(splits.len() + 2);
        stops.push(0.0);
        stops.extend(splits.into_iter().map(|(_, value)| value));
        stops.push(1.0);
        stops
    }

    fn template_cells(&self, template: &LayoutTemplate) -> Vec<CellGeometry> {
        let values: ParamValues = self
            .parameters
            .iter()
            .map(|(name, parameter)| (name.clone(), parameter.value))
            .collect();

        template
            .cells
            .iter()
            .map(|cell| CellGeometry {
                frame: Rect::new(
                    expr::evaluate(&cell.x, &values),
                    expr::evaluate(&cell.y, &values),
                    expr::evaluate(&cell.width, &values),
                    expr::evaluate(&cell.height, &values),
                ),
                rotation: cell
                    .rotation
                    .as_deref()
                    .map_or(0.0, |rotation| expr::evaluate(rotation, &values)),
                shape: cell.shape_kind(),
            })
            .collect()
    }
}

/// Parse an indexed split name (`h_split3` / `v_split12`) into its axis
/// prefix and index. Unindexed names like `h_split` do not match and thus
/// carry no neighbour constraints.
fn split_key(name: &str) -> Option<(&'static str, usize)> {
    for prefix in ["h_split", "v_split"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                return Some((prefix, rest.parse().ok()?));
            }
        }
    }
    None
}

/// Interactive editing session: a layout plus a throttled change stream.
///
/// Replaces ad-hoc observation of the parameter set with an explicit
/// callback invoked with the regenerated cell list after each effective
/// update, rate-limited to roughly 30 notifications per second. The final
/// state of a drag is always delivered (trailing edge, flushed on drop).
pub struct LayoutController {
    layout: Layout,
    notifier: Throttle<Vec<CellGeometry>>,
}

impl LayoutController {
    /// Wrap a layout, sending throttled cell updates to `on_change`.
    #[must_use]
    pub fn new<F>(layout: Layout, on_change: F) -> Self
    where
        F: Fn(Vec<CellGeometry>) + Send + 'static,
    {
        Self {
            layout,
            notifier: Throttle::with_default_interval(on_change),
        }
    }

    /// The wrapped layout.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Apply a constrained update and, if it changed anything, queue a
    /// change notification.
    pub fn update(&mut self, name: &str, proposed: f64) -> bool {
        let changed = self.layout.update(name, proposed);
        if changed {
            self.notifier.submit(self.layout.cells());
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// Built-in registry
// ---------------------------------------------------------------------------

/// Built-in layouts for a given image count.
///
/// Counts 2 through 9 carry curated sets (adjustable two-way splits, hero
/// cells, strips, grids); larger counts fall back to an adjustable
/// vertical strip.
#[must_use]
pub fn layouts_for(image_count: usize) -> Vec<Layout> {
    match image_count {
        2 => vec![
            Layout::fixed(
                "2-H-Adjustable",
                4.0 / 3.0,
                params(&[("h_split", 0.5, 0.2..=0.8)]),
                cells_2_h,
            ),
            Layout::fixed(
                "2-V-Adjustable",
                3.0 / 4.0,
                params(&[("v_split", 0.5, 0.2..=0.8)]),
                cells_2_v,
            ),
        ],
        3 => vec![
            Layout::fixed("3-V", 3.0 / 4.0, ParameterSet::new(), cells_3_v),
            Layout::fixed("3-H", 4.0 / 3.0, ParameterSet::new(), cells_3_h),
            Layout::fixed("3-T-Big", 1.0, ParameterSet::new(), cells_3_t_big),
            Layout::fixed("3-B-Big", 1.0, ParameterSet::new(), cells_3_b_big),
            Layout::fixed("3-L-Big", 1.0, ParameterSet::new(), cells_3_l_big),
            Layout::fixed("3-R-Big", 1.0, ParameterSet::new(), cells_3_r_big),
        ],
        4 => vec![
            Layout::splits(
                "4-Grid-Adjustable",
                1.0,
                params(&[
                    ("h_split1", 0.5, DEFAULT_SPLIT_RANGE),
                    ("v_split1", 0.5, DEFAULT_SPLIT_RANGE),
                ]),
            ),
            Layout::fixed("4-V-Strip", 9.0 / 16.0, ParameterSet::new(), cells_4_v_strip),
            Layout::fixed("4-H-Strip", 16.0 / 9.0, ParameterSet::new(), cells_4_h_strip),
            Layout::fixed("4-T-Big", 4.0 / 3.0, ParameterSet::new(), cells_4_t_big),
            Layout::fixed("4-L-Big", 3.0 / 4.0, ParameterSet::new(), cells_4_l_big),
        ],
        5 => vec![
            Layout::fixed(
                "5-L-Big-Grid-Adjustable",
                1.0,
                params(&[
                    ("h_split", 2.0 / 3.0, 0.2..=0.8),
                    ("v_split1", 0.25, DEFAULT_SPLIT_RANGE),
                    ("v_split2", 0.5, DEFAULT_SPLIT_RANGE),
                    ("v_split3", 0.75, DEFAULT_SPLIT_RANGE),
                ]),
                cells_5_l_big_grid,
            ),
            Layout::fixed("5-T-Big-Grid", 1.0, ParameterSet::new(), cells_5_t_big_grid),
            Layout::fixed("5-Center-Hero", 4.0 / 3.0, ParameterSet::new(), cells_5_center_hero),
            Layout::fixed("5-V-Stripe-Grid", 3.0 / 4.0, ParameterSet::new(), cells_5_v_stripe),
            Layout::fixed("5-H-Stripe-Grid", 4.0 / 3.0, ParameterSet::new(), cells_5_h_stripe),
        ],
        6 => vec![
            Layout::fixed("6-Grid-2x3", 2.0 / 3.0, ParameterSet::new(), cells_6_grid_2x3),
            Layout::fixed("6-Grid-3x2", 3.0 / 2.0, ParameterSet::new(), cells_6_grid_3x2),
            Layout::fixed("6-T-Hero", 4.0 / 3.0, ParameterSet::new(), cells_6_t_hero),
            Layout::fixed("6-L-Hero", 3.0 / 4.0, ParameterSet::new(), cells_6_l_hero),
        ],
        7 => vec![
            Layout::fixed("7-Center-Hero", 1.0, ParameterSet::new(), cells_7_center_hero),
            Layout::fixed("7-T-Grid", 4.0 / 5.0, ParameterSet::new(), cells_7_t_grid),
            Layout::fixed("7-H-Stripes", 16.0 / 9.0, ParameterSet::new(), cells_7_h_stripes),
        ],
        8 => vec![
            Layout::fixed("8-Grid-4x2", 2.0, ParameterSet::new(), cells_8_grid_4x2),
            Layout::fixed("8-Grid-2x4", 0.5, ParameterSet::new(), cells_8_grid_2x4),
            Layout::fixed("8-L-Hero", 1.0, ParameterSet::new(), cells_8_l_hero),
        ],
        9 => vec![
            Layout::splits(
                "9-Grid-Adjustable",
                1.0,
                params(&[
                    ("h_split1", 1.0 / 3.0, DEFAULT_SPLIT_RANGE),
                    ("h_split2", 2.0 / 3.0, DEFAULT_SPLIT_RANGE),
                    ("v_split1", 1.0 / 3.0, DEFAULT_SPLIT_RANGE),
                    ("v_split2", 2.0 / 3.0, DEFAULT_SPLIT_RANGE),
                ]),
            ),
            Layout::fixed("9-H-Stripes", 16.0 / 9.0, ParameterSet::new(), cells_9_h_stripes),
            Layout::fixed("9-V-Stripes", 9.0 / 16.0, ParameterSet::new(), cells_9_v_stripes),
        ],
        0 => Vec::new(),
        count => vec![fallback_strip(count)],
    }
}

/// Adjustable vertical strip for image counts without a curated set.
fn fallback_strip(count: usize) -> Layout {
    #[allow(clippy::cast_precision_loss)]
    let step = 1.0 / count as f64;
    let parameters = (1..count)
        .map(|index| {
            #[allow(clippy::cast_precision_loss)]
            let value = index as f64 * step;
            (format!("v_split{index}"), Parameter::split(value))
        })
        .collect();
    Layout::splits(&format!("{count}-V-Fallback"), 3.0 / 4.0, parameters)
}

fn params(entries: &[(&str, f64, RangeInclusive<f64>)]) -> ParameterSet {
    entries
        .iter()
        .map(|(name, value, range)| ((*name).to_string(), Parameter::new(*value, range.clone())))
        .collect()
}

fn value(parameters: &ParameterSet, name: &str, default: f64) -> f64 {
    parameters.get(name).map_or(default, |p| p.value)
}

// Split helpers, all in the normalized unit square (or a sub-rect of it).

/// `index`-th of `total` equal columns of `rect`.
fn h_slice(index: usize, total: usize, rect: Rect) -> Rect {
    #[allow(clippy::cast_precision_loss)]
    let width = rect.width / total as f64;
    #[allow(clippy::cast_precision_loss)]
    let x = rect.x + index as f64 * width;
    Rect::new(x, rect.y, width, rect.height)
}

/// `index`-th of `total` equal rows of `rect`.
fn v_slice(index: usize, total: usize, rect: Rect) -> Rect {
    #[allow(clippy::cast_precision_loss)]
    let height = rect.height / total as f64;
    #[allow(clippy::cast_precision_loss)]
    let y = rect.y + index as f64 * height;
    Rect::new(rect.x, y, rect.width, height)
}

/// Vertical band of `rect`: fraction `frac` of its width starting at
/// fraction `from`.
fn h_band(frac: f64, from: f64, rect: Rect) -> Rect {
    Rect::new(
        rect.x + from * rect.width,
        rect.y,
        frac * rect.width,
        rect.height,
    )
}

/// Horizontal band of `rect`: fraction `frac` of its height starting at
/// fraction `from`.
fn v_band(frac: f64, from: f64, rect: Rect) -> Rect {
    Rect::new(
        rect.x,
        rect.y + from * rect.height,
        rect.width,
        frac * rect.height,
    )
}

/// `index`-th cell (row-major) of a `cols x rows` grid over `rect`.
fn grid_cell(index: usize, cols: usize, rows: usize, rect: Rect) -> Rect {
    #[allow(clippy::cast_precision_loss)]
    let width = rect.width / cols as f64;
    #[allow(clippy::cast_precision_loss)]
    let height = rect.height / rows as f64;
    let row = index / cols;
    let col = index % cols;
    #[allow(clippy::cast_precision_loss)]
    let x = rect.x + col as f64 * width;
    #[allow(clippy::cast_precision_loss)]
    let y = rect.y + row as f64 * height;
    Rect::new(x, y, width, height)
}

fn rects(frames: Vec<Rect>) -> Vec<CellGeometry> {
    frames.into_iter().map(CellGeometry::rect).collect()
}

fn cells_2_h(parameters: &ParameterSet) -> Vec<CellGeometry> {
    let split = value(parameters, "h_split", 0.5);
    rects(vec![
        h_band(split, 0.0, Rect::UNIT),
        h_band(1.0 - split, split, Rect::UNIT),
    ])
}

fn cells_2_v(parameters: &ParameterSet) -> Vec<CellGeometry> {
    let split = value(parameters, "v_split", 0.5);
    rects(vec![
        v_band(split, 0.0, Rect::UNIT),
        v_band(1.0 - split, split, Rect::UNIT),
    ])
}

fn cells_3_v(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..3).map(|i| v_slice(i, 3, Rect::UNIT)).collect())
}

fn cells_3_h(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..3).map(|i| h_slice(i, 3, Rect::UNIT)).collect())
}

fn cells_3_t_big(_: &ParameterSet) -> Vec<CellGeometry> {
    let bottom = v_band(1.0 / 3.0, 2.0 / 3.0, Rect::UNIT);
    rects(vec![
        v_band(2.0 / 3.0, 0.0, Rect::UNIT),
        h_slice(0, 2, bottom),
        h_slice(1, 2, bottom),
    ])
}

fn cells_3_b_big(_: &ParameterSet) -> Vec<CellGeometry> {
    let top = v_band(1.0 / 3.0, 0.0, Rect::UNIT);
    rects(vec![
        h_slice(0, 2, top),
        h_slice(1, 2, top),
        v_band(2.0 / 3.0, 1.0 / 3.0, Rect::UNIT),
    ])
}

fn cells_3_l_big(_: &ParameterSet) -> Vec<CellGeometry> {
    let right = h_band(1.0 / 3.0, 2.0 / 3.0, Rect::UNIT);
    rects(vec![
        h_band(2.0 / 3.0, 0.0, Rect::UNIT),
        v_slice(0, 2, right),
        v_slice(1, 2, right),
    ])
}

fn cells_3_r_big(_: &ParameterSet) -> Vec<CellGeometry> {
    let left = h_band(1.0 / 3.0, 0.0, Rect::UNIT);
    rects(vec![
        v_slice(0, 2, left),
        v_slice(1, 2, left),
        h_band(2.0 / 3.0, 1.0 / 3.0, Rect::UNIT),
    ])
}

fn cells_4_v_strip(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..4).map(|i| v_slice(i, 4, Rect::UNIT)).collect())
}

fn cells_4_h_strip(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..4).map(|i| h_slice(i, 4, Rect::UNIT)).collect())
}

fn cells_4_t_big(_: &ParameterSet) -> Vec<CellGeometry> {
    let bottom = v_band(1.0 / 3.0, 2.0 / 3.0, Rect::UNIT);
    let mut frames = vec![v_band(2.0 / 3.0, 0.0, Rect::UNIT)];
    frames.extend((0..3).map(|i| h_slice(i, 3, bottom)));
    rects(frames)
}

fn cells_4_l_big(_: &ParameterSet) -> Vec<CellGeometry> {
    let right = h_band(1.0 / 3.0, 2.0 / 3.0, Rect::UNIT);
    let mut frames = vec![h_band(2.0 / 3.0, 0.0, Rect::UNIT)];
    frames.extend((0..3).map(|i| v_slice(i, 3, right)));
    rects(frames)
}

/// One wide left cell plus four stacked right cells, the right stack split
/// at three adjustable positions.
fn cells_5_l_big_grid(parameters: &ParameterSet) -> Vec<CellGeometry> {
    let h_split = value(parameters, "h_split", 2.0 / 3.0);
    let v1 = value(parameters, "v_split1", 0.25);
    let v2 = value(parameters, "v_split2", 0.5);
    let v3 = value(parameters, "v_split3", 0.75);

    let right = h_band(1.0 - h_split, h_split, Rect::UNIT);
    rects(vec![
        h_band(h_split, 0.0, Rect::UNIT),
        v_band(v1, 0.0, right),
        v_band(v2 - v1, v1, right),
        v_band(v3 - v2, v2, right),
        v_band(1.0 - v3, v3, right),
    ])
}

fn cells_5_t_big_grid(_: &ParameterSet) -> Vec<CellGeometry> {
    let bottom = v_band(1.0 / 3.0, 2.0 / 3.0, Rect::UNIT);
    let mut frames = vec![v_band(2.0 / 3.0, 0.0, Rect::UNIT)];
    frames.extend((0..4).map(|i| grid_cell(i, 4, 1, bottom)));
    rects(frames)
}

fn cells_5_center_hero(_: &ParameterSet) -> Vec<CellGeometry> {
    let left = h_band(0.25, 0.0, Rect::UNIT);
    let right = h_band(0.25, 0.75, Rect::UNIT);
    rects(vec![
        v_slice(0, 2, left),
        v_slice(1, 2, left),
        h_band(0.5, 0.25, Rect::UNIT),
        v_slice(0, 2, right),
        v_slice(1, 2, right),
    ])
}

fn cells_5_v_stripe(_: &ParameterSet) -> Vec<CellGeometry> {
    let bottom = v_band(0.5, 0.5, Rect::UNIT);
    let mut frames = vec![v_band(0.5, 0.0, Rect::UNIT)];
    frames.extend((0..4).map(|i| grid_cell(i, 2, 2, bottom)));
    rects(frames)
}

fn cells_5_h_stripe(_: &ParameterSet) -> Vec<CellGeometry> {
    let right = h_band(0.5, 0.5, Rect::UNIT);
    let mut frames = vec![h_band(0.5, 0.0, Rect::UNIT)];
    frames.extend((0..4).map(|i| grid_cell(i, 2, 2, right)));
    rects(frames)
}

fn cells_6_grid_2x3(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..6).map(|i| grid_cell(i, 2, 3, Rect::UNIT)).collect())
}

fn cells_6_grid_3x2(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..6).map(|i| grid_cell(i, 3, 2, Rect::UNIT)).collect())
}

fn cells_6_t_hero(_: &ParameterSet) -> Vec<CellGeometry> {
    let bottom = v_band(1.0 / 3.0, 2.0 / 3.0, Rect::UNIT);
    let mut frames = vec![v_band(2.0 / 3.0, 0.0, Rect::UNIT)];
    frames.extend((0..5).map(|i| h_slice(i, 5, bottom)));
    rects(frames)
}

fn cells_6_l_hero(_: &ParameterSet) -> Vec<CellGeometry> {
    let right = h_band(1.0 / 3.0, 2.0 / 3.0, Rect::UNIT);
    let mut frames = vec![h_band(2.0 / 3.0, 0.0, Rect::UNIT)];
    frames.extend((0..5).map(|i| v_slice(i, 5, right)));
    rects(frames)
}

/// Three small cells on top, a full-width hero band, three small cells
/// below.
fn cells_7_center_hero(_: &ParameterSet) -> Vec<CellGeometry> {
    let top = v_band(0.25, 0.0, Rect::UNIT);
    let bottom = v_band(0.25, 0.75, Rect::UNIT);
    let mut frames: Vec<Rect> = (0..3).map(|i| h_slice(i, 3, top)).collect();
    frames.push(v_band(0.5, 0.25, Rect::UNIT));
    frames.extend((0..3).map(|i| h_slice(i, 3, bottom)));
    rects(frames)
}

fn cells_7_t_grid(_: &ParameterSet) -> Vec<CellGeometry> {
    let bottom = v_band(2.0 / 3.0, 1.0 / 3.0, Rect::UNIT);
    let mut frames = vec![v_band(1.0 / 3.0, 0.0, Rect::UNIT)];
    frames.extend((0..6).map(|i| grid_cell(i, 3, 2, bottom)));
    rects(frames)
}

fn cells_7_h_stripes(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..7).map(|i| h_slice(i, 7, Rect::UNIT)).collect())
}

fn cells_8_grid_4x2(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..8).map(|i| grid_cell(i, 4, 2, Rect::UNIT)).collect())
}

fn cells_8_grid_2x4(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..8).map(|i| grid_cell(i, 2, 4, Rect::UNIT)).collect())
}

fn cells_8_l_hero(_: &ParameterSet) -> Vec<CellGeometry> {
    let right = h_band(0.25, 0.75, Rect::UNIT);
    let mut frames = vec![h_band(0.75, 0.0, Rect::UNIT)];
    frames.extend((0..7).map(|i| v_slice(i, 7, right)));
    rects(frames)
}

fn cells_9_h_stripes(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..9).map(|i| h_slice(i, 9, Rect::UNIT)).collect())
}

fn cells_9_v_stripes(_: &ParameterSet) -> Vec<CellGeometry> {
    rects((0..9).map(|i| v_slice(i, 9, Rect::UNIT)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_way_horizontal() -> Layout {
        Layout::splits(
            "3-H-Adjustable",
            4.0 / 3.0,
            params(&[
                ("h_split1", 0.33, DEFAULT_SPLIT_RANGE),
                ("h_split2", 0.66, DEFAULT_SPLIT_RANGE),
            ]),
        )
    }

    #[test]
    fn two_by_two_grid_produces_the_four_quadrants() {
        let layout = &layouts_for(4)[0];
        let cells = layout.cells();
        assert_eq!(cells.len(), 4);
        let expected = [
            Rect::new(0.0, 0.0, 0.5, 0.5),
            Rect::new(0.5, 0.0, 0.5, 0.5),
            Rect::new(0.0, 0.5, 0.5, 0.5),
            Rect::new(0.5, 0.5, 0.5, 0.5),
        ];
        for (cell, expected) in cells.iter().zip(expected) {
            assert!((cell.frame.x - expected.x).abs() < 1e-12);
            assert!((cell.frame.y - expected.y).abs() < 1e-12);
            assert!((cell.frame.width - expected.width).abs() < 1e-12);
            assert!((cell.frame.height - expected.height).abs() < 1e-12);
        }
    }

    #[test]
    fn drag_clamps_against_the_next_split() {
        let mut layout = three_way_horizontal();
        let changed = layout.update("h_split1", 0.70);
        assert!(changed);
        let v = layout.parameter("h_split1").unwrap();
        assert!((v - 0.61).abs() < 1e-12, "expected 0.61, got {v}");
    }

    #[test]
    fn drag_clamps_against_the_previous_split() {
        let mut layout = three_way_horizontal();
        let changed = layout.update("h_split2", 0.10);
        assert!(changed);
        let v = layout.parameter("h_split2").unwrap();
        assert!((v - 0.38).abs() < 1e-12, "expected 0.33 + 0.05, got {v}");
    }

    #[test]
    fn constraint_invariant_holds_under_arbitrary_updates() {
        let mut layout = three_way_horizontal();
        let drags = [
            ("h_split1", 0.9),
            ("h_split2", 0.05),
            ("h_split1", -3.0),
            ("h_split2", 7.0),
            ("h_split1", 0.64),
            ("h_split2", 0.12),
        ];
        for (name, proposed) in drags {
            layout.update(name, proposed);
            let v1 = layout.parameter("h_split1").unwrap();
            let v2 = layout.parameter("h_split2").unwrap();
            assert!(
                v1 + MIN_SPACING <= v2 + 1e-12,
                "ordering violated: {v1} vs {v2}"
            );
            for parameter in layout.parameters().values() {
                assert!(parameter.range.contains(&parameter.value));
            }
        }
    }

    #[test]
    fn update_unknown_parameter_is_a_noop() {
        let mut layout = three_way_horizontal();
        assert!(!layout.update("h_split9", 0.5));
        assert!(!layout.update("border_width", 0.5));
    }

    #[test]
    fn update_to_current_value_reports_no_change() {
        let mut layout = three_way_horizontal();
        assert!(!layout.update("h_split1", 0.33));
    }

    #[test]
    fn cells_is_pure_and_deterministic() {
        let layout = &layouts_for(9)[0];
        assert_eq!(layout.cells(), layout.cells());
    }

    #[test]
    fn segment_extents_sum_to_one() {
        let layout = &layouts_for(9)[0];
        let cells = layout.cells();
        assert_eq!(cells.len(), 9);
        // First row's widths span the full axis.
        let row_width: f64 = cells[..3].iter().map(|c| c.frame.width).sum();
        assert!((row_width - 1.0).abs() < 1e-12);
        let col_height: f64 = cells
            .iter()
            .step_by(3)
            .map(|c| c.frame.height)
            .sum();
        assert!((col_height - 1.0).abs() < 1e-12);
    }

    #[test]
    fn registry_cell_counts_match_image_counts() {
        for count in 2..=9 {
            for layout in layouts_for(count) {
                assert_eq!(
                    layout.cell_count(),
                    count,
                    "layout {} for {count} images",
                    layout.name()
                );
            }
        }
        assert_eq!(layouts_for(12)[0].cell_count(), 12);
        assert!(layouts_for(0).is_empty());
    }

    #[test]
    fn five_way_adjustable_keeps_divider_order() {
        let mut layout = layouts_for(5)
            .into_iter()
            .find(|l| l.name() == "5-L-Big-Grid-Adjustable")
            .unwrap();
        layout.update("v_split2", 0.9);
        let v2 = layout.parameter("v_split2").unwrap();
        let v3 = layout.parameter("v_split3").unwrap();
        assert!(v2 + MIN_SPACING <= v3 + 1e-12);
        layout.update("v_split2", 0.0);
        let v1 = layout.parameter("v_split1").unwrap();
        let v2 = layout.parameter("v_split2").unwrap();
        assert!(v1 + MIN_SPACING <= v2 + 1e-12);
    }

    #[test]
    fn unindexed_split_has_no_neighbour_constraints() {
        let mut layout = layouts_for(2).into_iter().next().unwrap();
        layout.update("h_split", 0.95);
        // Clamped by its own range only.
        let v = layout.parameter("h_split").unwrap();
        assert!((v - 0.8).abs() < 1e-12);
    }

    #[test]
    fn template_layout_round_trip() {
        let json = r#"{
            "name": "2-H-Template", "imageCount": 2, "aspectRatio": 1.0,
            "parameters": { "h_split1": { "initial": 0.3, "range": [0.1, 0.9] } },
            "frameDefinitions": [
                { "x": "0", "y": "0", "width": "params.h_split1", "height": "1" },
                { "x": "params.h_split1", "y": "0",
                  "width": "1 - params.h_split1", "height": "1" }
            ]
        }"#;
        let template: crate::template::LayoutTemplate = serde_json::from_str(json).unwrap();
        let layout = Layout::from_template(template);
        let cells = layout.cells();
        assert_eq!(cells.len(), 2);
        assert!((cells[0].frame.width - 0.3).abs() < 1e-12);
        assert!((cells[1].frame.width - 0.7).abs() < 1e-12);
        let total: f64 = cells.iter().map(|c| c.frame.width).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn controller_delivers_the_final_drag_position() {
        use std::sync::{Arc, Mutex};
        let seen: Arc<Mutex<Vec<Vec<CellGeometry>>>> = Arc::new(Mutex::new(Vec::new()));
        let final_cells;
        {
            let sink = Arc::clone(&seen);
            let mut controller = LayoutController::new(three_way_horizontal(), move |cells| {
                sink.lock().unwrap().push(cells);
            });
            for step in 0..20 {
                controller.update("h_split1", 0.2 + f64::from(step) * 0.01);
            }
            final_cells = controller.layout().cells();
        }
        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert_eq!(*seen.last().unwrap(), final_cells);
        assert!(seen.len() < 20, "20 rapid updates must collapse");
    }
}
