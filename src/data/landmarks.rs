use crate::algorithms::geometry::{rotate, Point, Shape};
use crate::error::AlignError;
use serde::{Deserialize, Serialize};

/// Chip-grid cell whose cross points take part in rough-offset estimation.
///
/// Every FOV repeats the same track pattern, so a single cell is kept to
/// avoid matching a point against the wrong period.
pub const CANONICAL_TAG: (i32, i32) = (4, 4);

/// Fraction of one chip period used as the landmark matching distance.
pub const DEFAULT_DIST_THRESH_RATIO: f64 = 2.0 / 3.0;

/// A track-cross point tagged with the chip-grid cell it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub idx_x: i32,
    pub idx_y: i32,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, idx_x: i32, idx_y: i32) -> Self {
        Self { x, y, idx_x, idx_y }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn tag(&self) -> (i32, i32) {
        (self.idx_x, self.idx_y)
    }
}

/// Period lengths of the chip's track grid along each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipTemplate {
    pub x_template: Vec<f64>,
    pub y_template: Vec<f64>,
}

impl ChipTemplate {
    pub fn new(x_template: Vec<f64>, y_template: Vec<f64>) -> Result<Self, AlignError> {
        let template = Self {
            x_template,
            y_template,
        };
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<(), AlignError> {
        if self.x_template.is_empty() || self.y_template.is_empty() {
            return Err(AlignError::InvalidChipTemplate(
                "both axes need at least one period".to_string(),
            ));
        }
        if self.x_template.iter().chain(&self.y_template).any(|v| !v.is_finite()) {
            return Err(AlignError::InvalidChipTemplate(
                "periods must be finite".to_string(),
            ));
        }
        if self.fov_size() <= 0.0 {
            return Err(AlignError::InvalidChipTemplate(format!(
                "x periods must sum to a positive length, got {}",
                self.fov_size()
            )));
        }
        Ok(())
    }

    /// Length of one full period (one FOV) along x.
    pub fn fov_size(&self) -> f64 {
        self.x_template.iter().sum()
    }
}

/// Coordinates of the landmarks carrying `tag`, grid indices dropped.
pub fn get_pts_based_on_ids(landmarks: &[Landmark], tag: (i32, i32)) -> Vec<Point> {
    landmarks
        .iter()
        .filter(|l| l.tag() == tag)
        .map(Landmark::point)
        .collect()
}

/// Maps stitched-mosaic cross points into the pixel frame of the
/// transformed image.
///
/// Points are scaled by `scale = (scale_x, scale_y)`, rotated by `rotation`
/// degrees about the centre of the scaled mosaic and re-centred in
/// `new_shape`. With `flip` the x coordinate is mirrored inside `new_shape`
/// and the x grid index is mirrored inside the chip template.
pub fn adjust_cross(
    stitch_template: &[Landmark],
    scale: (f64, f64),
    fov_stitched_shape: Shape,
    new_shape: Shape,
    chip_template: &ChipTemplate,
    rotation: f64,
    flip: bool,
) -> Vec<Landmark> {
    let (scale_x, scale_y) = scale;
    let scaled_shape = Shape::new(
        fov_stitched_shape.height * scale_y,
        fov_stitched_shape.width * scale_x,
    );
    let x_cells = chip_template.x_template.len() as i32;

    stitch_template
        .iter()
        .map(|l| {
            let scaled = Point::new(l.x * scale_x, l.y * scale_y);
            let p = rotate(scaled, rotation, scaled_shape, new_shape);
            if flip {
                Landmark::new(new_shape.width - 1.0 - p.x, p.y, x_cells - 1 - l.idx_x, l.idx_y)
            } else {
                Landmark::new(p.x, p.y, l.idx_x, l.idx_y)
            }
        })
        .collect()
}
