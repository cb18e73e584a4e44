use crate::algorithms::geometry::{get_new_shape, rotate, Point, Shape};
use crate::algorithms::rough_offset::{get_rough_offset, RoughOffset};
use crate::algorithms::search::{FovMatch, FovSearch};
use crate::config::{RoughOffsetGate, SearchConfig};
use crate::data::image_ops::{down_sample_normalize, fliplr, get_mass};
use crate::data::landmarks::{get_pts_based_on_ids, ChipTemplate, Landmark};
use crate::error::AlignError;
use crate::{correlation_span, logging, AlignmentResult};
use instant::Instant;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Outcome of one rotation hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisRecord {
    pub angle: u32,
    pub rough: RoughOffset,
    /// Whether the FOV grid search ran for this hypothesis.
    pub refined: bool,
    pub offset: Option<Point>,
    pub score: f64,
}

/// Inputs shared by every hypothesis of a single `run`.
struct WorkingContext<'a> {
    transformed_shape: Shape,
    transformed_mass: Point,
    vision_mass: Point,
    transformed_small: Array2<f32>,
    vision_small: Array2<f32>,
    transformed_cfov: Vec<Point>,
    vision_cfov: Vec<Point>,
    search: FovSearch<'a>,
    dist_thresh: f64,
}

/// Recovers the quarter-turn rotation and translation between a transformed
/// mosaic and a vision image using the chip's track crosses.
///
/// The aligner holds configuration only; each [`AlignByTrack::run`] builds its
/// own working state, so one aligner can serve several threads.
#[derive(Debug, Clone, Default)]
pub struct AlignByTrack {
    config: SearchConfig,
    chip_template: Option<ChipTemplate>,
}

impl AlignByTrack {
    pub fn new(config: SearchConfig) -> crate::Result<Self> {
        config.validate().map_err(AlignError::InvalidConfig)?;
        Ok(Self {
            config,
            chip_template: None,
        })
    }

    pub fn with_chip_template(mut self, chip_template: ChipTemplate) -> crate::Result<Self> {
        self.set_chip_template(chip_template)?;
        Ok(self)
    }

    /// Sets the chip template the FOV size and matching distance derive from.
    pub fn set_chip_template(&mut self, chip_template: ChipTemplate) -> crate::Result<()> {
        chip_template.validate()?;
        tracing::debug!(
            fov_size = chip_template.fov_size(),
            x_periods = chip_template.x_template.len(),
            y_periods = chip_template.y_template.len(),
            "chip template set"
        );
        self.chip_template = Some(chip_template);
        Ok(())
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn chip_template(&self) -> Option<&ChipTemplate> {
        self.chip_template.as_ref()
    }

    pub fn fov_size(&self) -> Option<f64> {
        self.chip_template.as_ref().map(ChipTemplate::fov_size)
    }

    pub fn dist_thresh(&self) -> Option<f64> {
        self.fov_size().map(|fov| fov * self.config.dist_thresh_ratio)
    }

    /// Aligns `transformed_image` onto `vision_image`.
    ///
    /// `flip` mirrors the transformed image left to right first; the
    /// transformed landmarks are expected to be in the flipped frame already
    /// (see [`crate::data::adjust_cross`]). The returned offset is in
    /// full-resolution pixels and maps the rotated transformed image into the
    /// vision frame.
    pub fn run(
        &self,
        transformed_image: ArrayView2<'_, f32>,
        vision_image: ArrayView2<'_, f32>,
        vision_cp: &[Landmark],
        stitch_tc: &[Landmark],
        flip: bool,
    ) -> crate::Result<AlignmentResult> {
        let outer_id = logging::get_correlation_id();
        let run_id = logging::new_correlation_id();
        let result = self.run_inner(transformed_image, vision_image, vision_cp, stitch_tc, flip, run_id);
        match outer_id {
            Some(id) => logging::set_correlation_id(id),
            None => logging::clear_correlation_id(),
        }
        result
    }

    fn run_inner(
        &self,
        transformed_image: ArrayView2<'_, f32>,
        vision_image: ArrayView2<'_, f32>,
        vision_cp: &[Landmark],
        stitch_tc: &[Landmark],
        flip: bool,
        run_id: uuid::Uuid,
    ) -> crate::Result<AlignmentResult> {
        let span = correlation_span!(Level::INFO, "align_by_track", flip = flip);
        let _enter = span.enter();
        let start = Instant::now();

        let chip_template = self
            .chip_template
            .as_ref()
            .ok_or(AlignError::ChipTemplateNotSet)?;
        if transformed_image.is_empty() {
            return Err(AlignError::EmptyImage("transformed"));
        }
        if vision_image.is_empty() {
            return Err(AlignError::EmptyImage("vision"));
        }

        let ctx = self.prepare(transformed_image, vision_image, vision_cp, stitch_tc, flip, chip_template);
        tracing::debug!(
            transformed_cfov = ctx.transformed_cfov.len(),
            vision_cfov = ctx.vision_cfov.len(),
            fov_size = ctx.search.fov_size,
            dist_thresh = ctx.dist_thresh,
            "working context ready"
        );

        let hypotheses: Vec<HypothesisRecord> = self
            .config
            .search_angles
            .iter()
            .map(|&angle| self.evaluate_hypothesis(&ctx, angle))
            .collect();

        // Strictly greater keeps the earliest hypothesis on ties.
        let mut rotation_index = 0;
        for (i, record) in hypotheses.iter().enumerate() {
            if record.score > hypotheses[rotation_index].score {
                rotation_index = i;
            }
        }
        let best = &hypotheses[rotation_index];
        let (offset, rotation_degrees, score) = (best.offset, best.angle, best.score);

        let result = AlignmentResult {
            offset,
            rotation_index,
            rotation_degrees,
            score,
            hypotheses,
            processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            run_id,
        };

        tracing::info!(
            rotation_index,
            rotation_degrees = result.rotation_degrees,
            offset_x = result.offset.map(|o| o.x),
            offset_y = result.offset.map(|o| o.y),
            score = result.score,
            elapsed_ms = result.processing_time_ms,
            "alignment selected"
        );
        Ok(result)
    }

    fn prepare<'s>(
        &'s self,
        transformed_image: ArrayView2<'_, f32>,
        vision_image: ArrayView2<'_, f32>,
        vision_cp: &[Landmark],
        stitch_tc: &[Landmark],
        flip: bool,
        chip_template: &ChipTemplate,
    ) -> WorkingContext<'s> {
        let transformed = if flip {
            fliplr(transformed_image)
        } else {
            transformed_image
        };

        let factor = self.config.downsample_factor;
        let fov_size = chip_template.fov_size();

        WorkingContext {
            transformed_shape: Shape::from_dim(transformed.dim()),
            transformed_mass: get_mass(transformed),
            vision_mass: get_mass(vision_image),
            transformed_small: down_sample_normalize(transformed, factor, self.config.normalize_max),
            vision_small: down_sample_normalize(vision_image, factor, self.config.normalize_max),
            transformed_cfov: get_pts_based_on_ids(stitch_tc, self.config.canonical_tag),
            vision_cfov: get_pts_based_on_ids(vision_cp, self.config.canonical_tag),
            search: FovSearch {
                range_x: &self.config.search_range_x,
                range_y: &self.config.search_range_y,
                fov_size,
                downsample_factor: factor as f64,
            },
            dist_thresh: fov_size * self.config.dist_thresh_ratio,
        }
    }

    fn evaluate_hypothesis(&self, ctx: &WorkingContext<'_>, angle: u32) -> HypothesisRecord {
        let degrees = f64::from(angle);
        let old_shape = ctx.transformed_shape;
        let new_shape = get_new_shape(old_shape, degrees);

        let rotated_mass = rotate(ctx.transformed_mass, degrees, old_shape, new_shape);
        let offset_guess = ctx.vision_mass - rotated_mass;

        let rough = get_rough_offset(
            offset_guess,
            degrees,
            old_shape,
            new_shape,
            &ctx.transformed_cfov,
            &ctx.vision_cfov,
            ctx.dist_thresh,
        );

        let refine = match self.config.rough_offset_gate {
            RoughOffsetGate::Matched => rough.is_matched(),
            RoughOffsetGate::NonZeroAxes => rough.is_nonzero_on_both_axes(),
        };

        let found = if refine {
            ctx.search.search(
                ctx.transformed_small.view(),
                ctx.vision_small.view(),
                rough.offset,
                angle,
            )
        } else {
            tracing::debug!(angle, matched = rough.matched, "rough offset rejected, hypothesis skipped");
            FovMatch::default()
        };

        tracing::debug!(
            angle,
            guess_x = offset_guess.x,
            guess_y = offset_guess.y,
            rough_x = rough.offset.x,
            rough_y = rough.offset.y,
            matched = rough.matched,
            score = found.score,
            "hypothesis evaluated"
        );

        HypothesisRecord {
            angle,
            rough,
            refined: refine,
            offset: found.offset,
            score: found.score,
        }
    }
}
