//! Pure calculation functions for output geometry.
//!
//! All functions here are pure and testable without any I/O or images. The
//! backend asks [`plan_resize`] what to do and then only executes the plan.
//!
//! A plan crops the source first and scales second, so no intermediate image
//! is ever larger than the source or the requested box.

use super::params::{Fit, MAX_DIMENSION, TargetSize};

/// A crop rectangle in source pixels, applied before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// What the backend must do to a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    /// Optional crop of the source, applied first.
    pub crop: Option<Crop>,
    /// Size to scale the (cropped) image to. This is the output size.
    pub scale_to: (u32, u32),
}

impl ResizePlan {
    pub fn output_dimensions(&self) -> (u32, u32) {
        self.scale_to
    }
}

fn clamp_axis(value: u32) -> u32 {
    value.clamp(1, MAX_DIMENSION)
}

fn round_axis(value: f64) -> u32 {
    clamp_axis(value.round() as u32)
}

/// Scale proportionally so the width matches `width`.
pub fn scale_to_width(source: (u32, u32), width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let width = clamp_axis(width);
    let h = src_h as f64 * width as f64 / src_w.max(1) as f64;
    (width, round_axis(h))
}

/// Scale proportionally so the height matches `height`.
pub fn scale_to_height(source: (u32, u32), height: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let height = clamp_axis(height);
    let w = src_w as f64 * height as f64 / src_h.max(1) as f64;
    (round_axis(w), height)
}

/// Calculate dimensions that fit inside a target box.
///
/// The limiting axis matches the box exactly; the other is scaled to keep the
/// source aspect ratio and never exceeds the box.
pub fn calculate_contain_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (source.0.max(1) as u64, source.1.max(1) as u64);
    let (tgt_w, tgt_h) = (target.0 as u64, target.1 as u64);

    // Compare aspect ratios without floating point: src_w/src_h >= tgt_w/tgt_h
    if src_w * tgt_h >= src_h * tgt_w {
        // Source is wider: width is the limiting axis
        let (w, h) = scale_to_width(source, target.0);
        (w, h.min(target.1))
    } else {
        let (w, h) = scale_to_height(source, target.1);
        (w.min(target.0), h)
    }
}

/// Largest region of the source with the target's aspect ratio.
///
/// One axis keeps the full source extent, the other is trimmed. The result
/// never exceeds the source on either axis.
pub fn calculate_cover_region(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (source.0.max(1) as u64, source.1.max(1) as u64);
    let (tgt_w, tgt_h) = (target.0.max(1) as u64, target.1.max(1) as u64);

    if src_w * tgt_h > src_h * tgt_w {
        // Source is wider: keep full height, trim width
        let w = (src_h * tgt_w + tgt_h / 2) / tgt_h;
        (w.clamp(1, src_w) as u32, src_h as u32)
    } else {
        // Source is taller (or equal): keep full width, trim height
        let h = (src_w * tgt_h + tgt_w / 2) / tgt_w;
        (src_w as u32, h.clamp(1, src_h) as u32)
    }
}

/// Centre a `window`-sized rectangle inside `outer`.
pub fn center_crop(outer: (u32, u32), window: (u32, u32)) -> Crop {
    let width = window.0.min(outer.0);
    let height = window.1.min(outer.1);
    Crop {
        x: (outer.0 - width) / 2,
        y: (outer.1 - height) / 2,
        width,
        height,
    }
}

/// Work out the scale and crop for a request.
///
/// Returns `None` for an empty target; the caller serves the original then.
pub fn plan_resize(source: (u32, u32), target: TargetSize, fit: Fit) -> Option<ResizePlan> {
    let plan = match (target.width, target.height) {
        (None, None) => return None,
        (Some(w), None) => ResizePlan {
            scale_to: scale_to_width(source, w),
            crop: None,
        },
        (None, Some(h)) => ResizePlan {
            scale_to: scale_to_height(source, h),
            crop: None,
        },
        (Some(w), Some(h)) => {
            let boxed = (clamp_axis(w), clamp_axis(h));
            match fit {
                Fit::Fill => ResizePlan {
                    scale_to: boxed,
                    crop: None,
                },
                Fit::Contain => ResizePlan {
                    scale_to: calculate_contain_dimensions(source, boxed),
                    crop: None,
                },
                Fit::Cover => {
                    let source = (source.0.max(1), source.1.max(1));
                    let region = calculate_cover_region(source, boxed);
                    ResizePlan {
                        crop: (region != source).then(|| center_crop(source, region)),
                        scale_to: boxed,
                    }
                }
            }
        }
    };
    Some(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(w: u32, h: u32) -> TargetSize {
        TargetSize::new(Some(w), Some(h))
    }

    // =========================================================================
    // single-axis scaling
    // =========================================================================

    #[test]
    fn width_only_keeps_aspect() {
        assert_eq!(scale_to_width((1200, 800), 300), (300, 200));
    }

    #[test]
    fn height_only_keeps_aspect() {
        assert_eq!(scale_to_height((1200, 800), 200), (300, 200));
    }

    #[test]
    fn single_axis_never_collapses_to_zero() {
        // 5000x1 scaled to width 10 → height rounds to 0, clamped to 1
        assert_eq!(scale_to_width((5000, 1), 10), (10, 1));
        assert_eq!(scale_to_height((1, 5000), 10), (1, 10));
    }

    #[test]
    fn single_axis_derived_side_is_clamped() {
        // Extreme portrait upscaled by width: height would be 100_000
        assert_eq!(scale_to_width((10, 200), 5000), (5000, MAX_DIMENSION));
    }

    // =========================================================================
    // contain
    // =========================================================================

    #[test]
    fn contain_wider_source() {
        // 1200x800 into 300x300: width limits → 300x200
        assert_eq!(calculate_contain_dimensions((1200, 800), (300, 300)), (300, 200));
    }

    #[test]
    fn contain_taller_source() {
        // 800x1200 into 300x300: height limits → 200x300
        assert_eq!(calculate_contain_dimensions((800, 1200), (300, 300)), (200, 300));
    }

    #[test]
    fn contain_same_aspect_matches_box() {
        assert_eq!(calculate_contain_dimensions((1200, 800), (300, 200)), (300, 200));
    }

    #[test]
    fn contain_upscales_small_source() {
        assert_eq!(calculate_contain_dimensions((30, 20), (300, 300)), (300, 200));
    }

    #[test]
    fn contain_1x1_box() {
        assert_eq!(calculate_contain_dimensions((1200, 800), (1, 1)), (1, 1));
    }

    // =========================================================================
    // cover
    // =========================================================================

    #[test]
    fn cover_region_wider_source_to_portrait_target() {
        // 800x600 → 400x500 (4:5): full height, width = 600 * 4/5 = 480
        assert_eq!(calculate_cover_region((800, 600), (400, 500)), (480, 600));
    }

    #[test]
    fn cover_region_taller_source_to_landscape_target() {
        // 600x800 → 500x400 (5:4): full width, height = 600 * 4/5 = 480
        assert_eq!(calculate_cover_region((600, 800), (500, 400)), (600, 480));
    }

    #[test]
    fn cover_crops_source_then_scales_to_box() {
        let plan = plan_resize((1200, 800), target(300, 300), Fit::Cover).unwrap();
        assert_eq!(
            plan.crop,
            Some(Crop {
                x: 200,
                y: 0,
                width: 800,
                height: 800
            })
        );
        assert_eq!(plan.scale_to, (300, 300));
        assert_eq!(plan.output_dimensions(), (300, 300));
    }

    #[test]
    fn cover_thin_sources_stay_bounded() {
        let cases = [
            ((5000, 1), (5000, 5000)),
            ((1, 5000), (5000, 5000)),
            ((2000, 4), (2000, 2000)),
            ((400, 2), (800, 800)),
            ((1, 1), (5000, 1)),
        ];
        for (src, (w, h)) in cases {
            let plan = plan_resize(src, target(w, h), Fit::Cover).unwrap();
            assert_eq!(plan.output_dimensions(), (w, h), "{src:?} into {w}x{h}");
            if let Some(c) = plan.crop {
                assert!(c.x + c.width <= src.0 && c.y + c.height <= src.1, "{src:?}: {c:?}");
                assert!(c.width >= 1 && c.height >= 1);
            }
        }
    }

    #[test]
    fn every_plan_is_within_max_dimension() {
        let sources = [(5000, 1), (1, 5000), (10, 200), (1200, 800), (1, 1)];
        let targets = [
            TargetSize::new(Some(5000), Some(5000)),
            TargetSize::new(Some(5000), None),
            TargetSize::new(None, Some(5000)),
            TargetSize::new(Some(1), Some(5000)),
            TargetSize::new(Some(9000), Some(9000)),
        ];
        for src in sources {
            for t in targets {
                for fit in [Fit::Contain, Fit::Cover, Fit::Fill] {
                    let plan = plan_resize(src, t, fit).unwrap();
                    let (w, h) = plan.scale_to;
                    assert!(
                        w <= MAX_DIMENSION && h <= MAX_DIMENSION,
                        "{src:?} {t:?} {fit:?} planned {w}x{h}"
                    );
                    if let Some(c) = plan.crop {
                        assert!(c.width <= src.0 && c.height <= src.1);
                    }
                }
            }
        }
    }

    #[test]
    fn cover_same_aspect_skips_crop() {
        let plan = plan_resize((1200, 800), target(300, 200), Fit::Cover).unwrap();
        assert_eq!(plan.scale_to, (300, 200));
        assert_eq!(plan.crop, None);
    }

    #[test]
    fn center_crop_of_taller_image() {
        assert_eq!(
            center_crop((400, 600), (400, 400)),
            Crop {
                x: 0,
                y: 100,
                width: 400,
                height: 400
            }
        );
    }

    // =========================================================================
    // plan_resize
    // =========================================================================

    #[test]
    fn plan_empty_target_is_none() {
        assert_eq!(plan_resize((100, 100), TargetSize::default(), Fit::Cover), None);
    }

    #[test]
    fn plan_fill_ignores_aspect() {
        let plan = plan_resize((1200, 800), target(100, 400), Fit::Fill).unwrap();
        assert_eq!(plan.output_dimensions(), (100, 400));
    }

    #[test]
    fn plan_single_axis_ignores_fit() {
        for fit in [Fit::Contain, Fit::Cover, Fit::Fill] {
            let plan = plan_resize((1200, 800), TargetSize::new(Some(600), None), fit).unwrap();
            assert_eq!(plan.output_dimensions(), (600, 400));
        }
    }

    #[test]
    fn plan_clamps_oversized_box() {
        let plan = plan_resize((100, 100), target(9000, 9000), Fit::Fill).unwrap();
        assert_eq!(plan.output_dimensions(), (MAX_DIMENSION, MAX_DIMENSION));
    }

    #[test]
    fn contain_output_fits_box_with_one_axis_exact() {
        let sources = [(1200, 800), (800, 1200), (333, 777), (5000, 7), (1, 1)];
        let boxes = [(300, 200), (1, 1), (640, 480), (17, 4999), (100, 100)];
        for &src in &sources {
            for &(w, h) in &boxes {
                let (ow, oh) = plan_resize(src, target(w, h), Fit::Contain)
                    .unwrap()
                    .output_dimensions();
                assert!(ow <= w && oh <= h, "{src:?} into {w}x{h} gave {ow}x{oh}");
                assert!(ow == w || oh == h, "{src:?} into {w}x{h} gave {ow}x{oh}");
            }
        }
    }
}
