use ndarray::Array2;
use track_align::analysis::rotation_index_shift;
use track_align::config::{RoughOffsetGate, SearchConfig};
use track_align::*;

fn chip_template() -> ChipTemplate {
    ChipTemplate::new(vec![10.0, 10.0, 10.0], vec![10.0, 10.0, 10.0]).unwrap()
}

fn aligner(config: SearchConfig) -> AlignByTrack {
    AlignByTrack::new(config)
        .unwrap()
        .with_chip_template(chip_template())
        .unwrap()
}

/// 100 x 100 frame with a bright square at rows/cols 40..50.
fn square_image() -> Array2<f32> {
    Array2::from_shape_fn((100, 100), |(r, c)| {
        if (40..50).contains(&r) && (40..50).contains(&c) {
            100.0
        } else {
            0.0
        }
    })
}

/// Bright square at rows/cols 20..30 plus a dimmer bar at rows 60..70,
/// cols 30..50, so no quarter turn maps the pattern onto itself.
fn asymmetric_image() -> Array2<f32> {
    Array2::from_shape_fn((100, 100), |(r, c)| {
        if (20..30).contains(&r) && (20..30).contains(&c) {
            100.0
        } else if (60..70).contains(&r) && (30..50).contains(&c) {
            50.0
        } else {
            0.0
        }
    })
}

/// Quarter turn counter-clockwise: `[i, j] = src[j, w - 1 - i]`.
fn turned(src: &Array2<f32>) -> Array2<f32> {
    let (h, w) = src.dim();
    Array2::from_shape_fn((w, h), |(i, j)| src[[j, w - 1 - i]])
}

fn cross(x: f64, y: f64) -> Landmark {
    Landmark::new(x, y, 4, 4)
}

#[test]
fn test_identical_images_align_at_origin() {
    let image = square_image();
    // Corner cells are filtered out; only the canonical cell takes part.
    let points = [
        Landmark::new(5.0, 5.0, 0, 0),
        Landmark::new(95.0, 5.0, 8, 0),
        Landmark::new(5.0, 95.0, 0, 8),
        Landmark::new(95.0, 95.0, 8, 8),
        cross(45.0, 45.0),
    ];

    let result = aligner(SearchConfig::default())
        .run(image.view(), image.view(), &points, &points, false)
        .unwrap();

    assert_eq!(result.rotation_index, 0);
    assert_eq!(result.rotation_degrees, 0);
    assert_eq!(result.offset, Some(Point::new(0.0, 0.0)));
    assert_eq!(result.score, 40000.0);
    assert_eq!(result.hypotheses.len(), 4);
    assert!(result.hypotheses.iter().all(|h| h.refined));
}

#[test]
fn test_symmetric_pattern_tie_keeps_first_angle() {
    let image = square_image();
    let points = [cross(45.0, 45.0)];

    let result = aligner(SearchConfig::default())
        .run(image.view(), image.view(), &points, &points, false)
        .unwrap();

    // The square looks the same after a quarter turn; the earlier angle wins.
    let quarter = &result.hypotheses[1];
    assert_eq!(quarter.rough.offset, Point::new(0.0, -10.0));
    assert_eq!(quarter.offset, Some(Point::new(0.0, -10.0)));
    assert_eq!(quarter.score, result.score);
    assert_eq!(result.rotation_index, 0);
}

#[test]
fn test_recovers_quarter_turn() {
    let transformed = asymmetric_image();
    let vision = turned(&transformed);

    let result = aligner(SearchConfig::default())
        .run(
            transformed.view(),
            vision.view(),
            &[cross(25.0, 74.0)],
            &[cross(25.0, 25.0)],
            false,
        )
        .unwrap();

    assert_eq!(result.rotation_index, 1);
    assert_eq!(rotation_index_shift(0, result.rotation_index), 1);
    assert_eq!(result.rotation_degrees, 90);
    assert_eq!(result.offset, Some(Point::new(0.0, -1.0)));
    assert_eq!(result.score, 60000.0);

    // The other angles put the cross too far from its counterpart.
    for (i, h) in result.hypotheses.iter().enumerate() {
        if i != 1 {
            assert!(!h.refined, "angle {} should not be refined", h.angle);
            assert_eq!(h.score, 0.0);
            assert!(h.offset.is_none());
        }
    }
}

#[test]
fn test_identical_asymmetric_images_prefer_no_rotation() {
    let image = asymmetric_image();
    let points = [cross(25.0, 25.0)];

    let result = aligner(SearchConfig::default())
        .run(image.view(), image.view(), &points, &points, false)
        .unwrap();

    assert_eq!(result.rotation_index, 0);
    assert_eq!(result.offset, Some(Point::new(0.0, 0.0)));
    assert_eq!(result.score, 60000.0);
}

#[test]
fn test_recovers_one_period_translation() {
    let transformed = asymmetric_image();
    let vision = Array2::from_shape_fn((100, 100), |(r, c)| {
        if c >= 30 {
            transformed[[r, c - 30]]
        } else {
            0.0
        }
    });

    let result = aligner(SearchConfig::default())
        .run(
            transformed.view(),
            vision.view(),
            &[cross(55.0, 25.0)],
            &[cross(25.0, 25.0)],
            false,
        )
        .unwrap();

    assert_eq!(result.rotation_index, 0);
    assert_eq!(result.offset, Some(Point::new(30.0, 0.0)));
    assert_eq!(result.score, 60000.0);
}

#[test]
fn test_score_ignores_intensity_scale() {
    let transformed = asymmetric_image();
    let vision = turned(&transformed);
    let brighter = vision.mapv(|v| v * 3.0);
    let vision_cp = [cross(25.0, 74.0)];
    let stitch_tc = [cross(25.0, 25.0)];
    let aligner = aligner(SearchConfig::default());

    let base = aligner
        .run(transformed.view(), vision.view(), &vision_cp, &stitch_tc, false)
        .unwrap();
    let scaled = aligner
        .run(transformed.view(), brighter.view(), &vision_cp, &stitch_tc, false)
        .unwrap();

    assert_eq!(base.rotation_index, scaled.rotation_index);
    assert_eq!(base.offset, scaled.offset);
    assert_eq!(base.score, scaled.score);

    // Same constant on both inputs.
    let brighter_transformed = transformed.mapv(|v| v * 3.0);
    let both = aligner
        .run(brighter_transformed.view(), brighter.view(), &vision_cp, &stitch_tc, false)
        .unwrap();

    assert_eq!(both.rotation_index, base.rotation_index);
    assert_eq!(both.offset, base.offset);
    assert_eq!(both.score, base.score);
}

#[test]
fn test_flip_restores_mirrored_input() {
    let vision = asymmetric_image();
    let mirrored = Array2::from_shape_fn((100, 100), |(r, c)| vision[[r, 99 - c]]);
    // Transformed crosses are given in the frame after the flip.
    let points = [cross(25.0, 25.0)];

    let result = aligner(SearchConfig::default())
        .run(mirrored.view(), vision.view(), &points, &points, true)
        .unwrap();

    assert_eq!(result.rotation_index, 0);
    assert_eq!(result.offset, Some(Point::new(0.0, 0.0)));
    assert_eq!(result.score, 60000.0);
}

#[test]
fn test_legacy_gate_skips_axis_aligned_offsets() {
    let image = square_image();
    let points = [cross(45.0, 45.0)];
    let config = SearchConfig {
        rough_offset_gate: RoughOffsetGate::NonZeroAxes,
        ..SearchConfig::default()
    };

    let result = aligner(config)
        .run(image.view(), image.view(), &points, &points, false)
        .unwrap();

    let refined: Vec<bool> = result.hypotheses.iter().map(|h| h.refined).collect();
    assert_eq!(refined, vec![false, false, true, false]);
    assert_eq!(result.rotation_index, 2);
    assert_eq!(result.rotation_degrees, 180);
    assert_eq!(result.offset, Some(Point::new(-10.0, -10.0)));
    assert_eq!(result.score, 40000.0);
}

#[test]
fn test_restricted_angles_index_into_configured_list() {
    let transformed = asymmetric_image();
    let vision = turned(&transformed);
    let config = SearchConfig {
        search_angles: vec![180, 90],
        ..SearchConfig::default()
    };

    let result = aligner(config)
        .run(
            transformed.view(),
            vision.view(),
            &[cross(25.0, 74.0)],
            &[cross(25.0, 25.0)],
            false,
        )
        .unwrap();

    assert_eq!(result.hypotheses.len(), 2);
    assert_eq!(result.rotation_index, 1);
    assert_eq!(result.rotation_degrees, 90);
}

#[test]
fn test_run_clears_correlation_id() {
    let image = square_image();
    let points = [cross(45.0, 45.0)];
    let aligner = aligner(SearchConfig::default());

    let first = aligner.run(image.view(), image.view(), &points, &points, false).unwrap();
    let second = aligner.run(image.view(), image.view(), &points, &points, false).unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert!(logging::get_correlation_id().is_none());
}

#[test]
fn test_result_serializes_to_json() {
    let image = square_image();
    let points = [cross(45.0, 45.0)];

    let result = aligner(SearchConfig::default())
        .run(image.view(), image.view(), &points, &points, false)
        .unwrap();

    let json = serde_json::to_string(&result).unwrap();
    let back: AlignmentResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.offset, result.offset);
    assert_eq!(back.rotation_index, result.rotation_index);
    assert_eq!(back.hypotheses, result.hypotheses);
    assert_eq!(back.run_id, result.run_id);
}
