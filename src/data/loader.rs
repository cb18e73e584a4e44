use crate::data::landmarks::{ChipTemplate, Landmark};
use crate::error::AlignError;
use ndarray::{Array2, ArrayView2};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Decodes an image file into a `(height, width)` intensity grid.
///
/// Colour images are reduced to luma; 8 and 16 bit inputs both end up in
/// `[0, 1]`, which is fine because scoring renormalizes anyway.
pub fn load_image<P: AsRef<Path>>(path: P) -> crate::Result<Array2<f32>> {
    let img = image::open(path)?.to_luma32f();
    let (width, height) = (img.width() as usize, img.height() as usize);
    Array2::from_shape_vec((height, width), img.into_raw())
        .map_err(|_| AlignError::EmptyImage("decoded"))
}

pub fn validate_image_size(img: ArrayView2<'_, f32>, min_size: usize) -> crate::Result<()> {
    let (h, w) = img.dim();
    if h < min_size || w < min_size {
        return Err(AlignError::ImageTooSmall {
            width: w,
            height: h,
            min: min_size,
        });
    }
    Ok(())
}

/// Numeric fields of a data line; `#` starts a comment.
fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split('#')
        .next()
        .unwrap_or_default()
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty())
}

fn parse_numbers(path: &Path, line_no: usize, line: &str) -> crate::Result<Vec<f64>> {
    fields(line)
        .map(|f| {
            f.parse::<f64>().map_err(|e| AlignError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("'{f}': {e}"),
            })
        })
        .collect()
}

fn grid_index(path: &Path, line_no: usize, value: f64) -> crate::Result<i32> {
    if value.fract() != 0.0 || value.abs() > i32::MAX as f64 {
        return Err(AlignError::Parse {
            path: path.to_path_buf(),
            line: line_no,
            message: format!("grid index {value} is not an integer"),
        });
    }
    Ok(value as i32)
}

/// Reads cross points stored one per line as `x y idx_x idx_y`.
pub fn load_landmarks<P: AsRef<Path>>(path: P) -> crate::Result<Vec<Landmark>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut landmarks = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        let values = parse_numbers(path, line_no, line)?;
        match values.as_slice() {
            [] => continue,
            [x, y, ix, iy] => landmarks.push(Landmark::new(
                *x,
                *y,
                grid_index(path, line_no, *ix)?,
                grid_index(path, line_no, *iy)?,
            )),
            other => {
                return Err(AlignError::Parse {
                    path: path.to_path_buf(),
                    line: line_no,
                    message: format!("expected 4 columns, found {}", other.len()),
                })
            }
        }
    }

    tracing::debug!(path = %path.display(), count = landmarks.len(), "loaded landmarks");
    Ok(landmarks)
}

pub fn save_landmarks<P: AsRef<Path>>(landmarks: &[Landmark], path: P) -> crate::Result<()> {
    let mut out = String::from("# x y idx_x idx_y\n");
    for l in landmarks {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{} {} {} {}", l.x, l.y, l.idx_x, l.idx_y);
    }
    fs::write(path, out)?;
    Ok(())
}

/// Reads a chip template: x periods on the first data line, y periods on
/// the second.
pub fn load_chip_template<P: AsRef<Path>>(path: P) -> crate::Result<ChipTemplate> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut rows = Vec::with_capacity(2);

    for (i, line) in content.lines().enumerate() {
        let values = parse_numbers(path, i + 1, line)?;
        if !values.is_empty() {
            rows.push(values);
        }
    }

    match <[Vec<f64>; 2]>::try_from(rows) {
        Ok([x_template, y_template]) => ChipTemplate::new(x_template, y_template),
        Err(rows) => Err(AlignError::InvalidChipTemplate(format!(
            "expected 2 period lines, found {}",
            rows.len()
        ))),
    }
}
