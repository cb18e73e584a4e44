use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A pixel coordinate, `x` along columns and `y` along rows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Extent of an image grid as `(height, width)`.
///
/// Kept in floating point because scaled mosaic shapes are not integral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub height: f64,
    pub width: f64,
}

impl Shape {
    pub const fn new(height: f64, width: f64) -> Self {
        Self { height, width }
    }

    pub fn from_dim((height, width): (usize, usize)) -> Self {
        Self::new(height as f64, width as f64)
    }
}

/// Sine and cosine of an angle in degrees, exact on quarter turns.
fn sin_cos_deg(angle: f64) -> (f64, f64) {
    let normalized = angle.rem_euclid(360.0);
    if normalized == 0.0 {
        (0.0, 1.0)
    } else if normalized == 90.0 {
        (1.0, 0.0)
    } else if normalized == 180.0 {
        (0.0, -1.0)
    } else if normalized == 270.0 {
        (-1.0, 0.0)
    } else {
        angle.to_radians().sin_cos()
    }
}

/// Rotates `point` by `angle` degrees about the centre of `original_shape`
/// and re-centres it in the frame of `new_shape`.
///
/// Rows grow downwards, so the y component uses the negated sine. A point
/// at `(x, y)` in a `(h, w)` image rotated by 90 lands at `(y, w - x)` in the
/// `(w, h)` frame.
pub fn rotate(point: Point, angle: f64, original_shape: Shape, new_shape: Shape) -> Point {
    let (sin, cos) = sin_cos_deg(angle);
    let cx = original_shape.width / 2.0;
    let cy = original_shape.height / 2.0;
    let dx = point.x - cx;
    let dy = point.y - cy;

    let x = cx + dx * cos + dy * sin;
    let y = cy - dx * sin + dy * cos;

    Point::new(
        x + (new_shape.width - original_shape.width) / 2.0,
        y + (new_shape.height - original_shape.height) / 2.0,
    )
}

/// Applies [`rotate`] to every point of a set.
pub fn rotate_points(
    points: &[Point],
    angle: f64,
    original_shape: Shape,
    new_shape: Shape,
) -> Vec<Point> {
    points
        .iter()
        .map(|&p| rotate(p, angle, original_shape, new_shape))
        .collect()
}

/// Bounding `(height, width)` of `old_shape` rotated by `angle` degrees.
pub fn get_new_shape(old_shape: Shape, angle: f64) -> Shape {
    let (sin, cos) = sin_cos_deg(angle);
    let (sin, cos) = (sin.abs(), cos.abs());
    let Shape { height: h, width: w } = old_shape;

    let new_w = (h * sin + w * cos).round_ties_even();
    let new_h = (w * sin + h * cos).round_ties_even();
    Shape::new(new_h, new_w)
}
