//! Integration tests for the detection pipeline.
//!
//! Tests cover:
//! - The three-panel synthetic page end to end
//! - Page-border rejection and nested-box elimination on real pipeline output
//! - The minimum-area noise gate
//! - Set determinism across repeated calls
//! - Agreement between the composable pipeline and the direct detector
//! - The error taxonomy for bad images and bad parameters

mod common;

use common::*;
use image::DynamicImage;
use panelize::detection::build_standard_pipeline;
use panelize::{DetectionError, DetectionParams, PanelDetector, Rect};

#[test]
fn test_three_panel_page() -> anyhow::Result<()> {
    let (page, drawn) = three_panel_page();
    let detector = PanelDetector::new();

    let detected = detector.detect(&page)?;

    assert_eq!(detected.len(), 3, "expected exactly 3 panels, got {:?}", detected);

    // Each drawn border matches exactly one detected rect, within a few
    // pixels of dilation growth; the page's own border never shows up.
    for panel in &drawn {
        let hit = detected
            .iter()
            .find(|r| r.x.abs_diff(panel.x) <= 4 && r.y.abs_diff(panel.y) <= 4)
            .copied()
            .unwrap_or_else(|| panic!("no detection near {:?} in {:?}", panel, detected));
        assert_rect_close(hit, *panel, 4);
    }

    // No output rect is contained in a distinct other output rect.
    for (i, a) in detected.iter().enumerate() {
        for (j, b) in detected.iter().enumerate() {
            if i != j {
                assert!(!b.contains(a), "{:?} is nested inside {:?}", a, b);
            }
        }
    }

    Ok(())
}

#[test]
fn test_nested_blob_is_absorbed() -> anyhow::Result<()> {
    // A solid blob inside a panel border produces its own connected
    // component, but its box lies inside the panel's box and must not
    // survive de-nesting.
    let (page, drawn) = three_panel_page();
    let mut img = page.to_rgb8();
    draw_blob(&mut img, Rect::new(60, 60, 60, 40));

    let detector = PanelDetector::new();
    let detected = detector.detect(&DynamicImage::ImageRgb8(img))?;

    assert_eq!(detected.len(), 3);
    let first = detected
        .iter()
        .find(|r| r.x.abs_diff(drawn[0].x) <= 4)
        .expect("first panel detected");
    assert_rect_close(*first, drawn[0], 4);

    Ok(())
}

#[test]
fn test_empty_page_yields_no_panels() -> anyhow::Result<()> {
    let page = DynamicImage::ImageRgb8(white_page(300, 300));
    let detected = PanelDetector::new().detect(&page)?;
    assert!(detected.is_empty());
    Ok(())
}

#[test]
fn test_min_area_gate() -> anyhow::Result<()> {
    // A 2x2 speck on an otherwise blank page.
    let mut img = white_page(100, 100);
    draw_blob(&mut img, Rect::new(40, 40, 2, 2));
    let page = DynamicImage::ImageRgb8(img);

    let strict = PanelDetector::with_params(DetectionParams {
        min_contour_area: 100,
        ..DetectionParams::default()
    })?;
    assert!(strict.detect(&page)?.is_empty());

    let permissive = PanelDetector::with_params(DetectionParams {
        min_contour_area: 1,
        ..DetectionParams::default()
    })?;
    let detected = permissive.detect(&page)?;
    assert_eq!(detected.len(), 1);
    // Dilation with the default kernel grows the speck by 2px per side.
    assert_rect_close(detected[0], Rect::new(38, 38, 6, 6), 1);

    Ok(())
}

#[test]
fn test_detection_is_deterministic() -> anyhow::Result<()> {
    let (page, _) = three_panel_page();
    let detector = PanelDetector::new();

    let first = sorted_rects(detector.detect(&page)?);
    let second = sorted_rects(detector.detect(&page)?);

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_pipeline_matches_detector() -> anyhow::Result<()> {
    let (page, _) = three_panel_page();
    let params = DetectionParams::default();

    let direct = PanelDetector::with_params(params.clone())?.detect(&page)?;

    let items = build_standard_pipeline(&params, false).run(page)?;
    let staged: Vec<Rect> = items.into_iter().filter_map(|item| item.bbox).collect();

    assert_eq!(sorted_rects(direct), sorted_rects(staged));
    Ok(())
}

#[test]
fn test_small_page_uses_global_threshold() -> anyhow::Result<()> {
    // An 8x8 page is smaller than the adaptive block, so binarization
    // falls back to the global cutoff.
    let mut img = white_page(8, 8);
    draw_blob(&mut img, Rect::new(2, 2, 3, 3));
    let page = DynamicImage::ImageRgb8(img);

    let detector = PanelDetector::with_params(DetectionParams {
        min_contour_area: 1,
        dilation_kernel_size: 1,
        ..DetectionParams::default()
    })?;

    let detected = detector.detect(&page)?;
    assert_eq!(detected, vec![Rect::new(2, 2, 3, 3)]);

    // A blob brighter than the cutoff is background.
    let mut img = white_page(8, 8);
    let gray = image::Rgb([200u8, 200, 200]);
    let r = imageproc::rect::Rect::at(2, 2).of_size(3, 3);
    imageproc::drawing::draw_filled_rect_mut(&mut img, r, gray);
    let detected = detector.detect(&DynamicImage::ImageRgb8(img))?;
    assert!(detected.is_empty());

    Ok(())
}

#[test]
fn test_candidates_expose_pre_denest_stage() -> anyhow::Result<()> {
    // The nested blob is still present among the raw candidates and only
    // disappears in the de-nesting stage.
    let (page, _) = three_panel_page();
    let mut img = page.to_rgb8();
    draw_blob(&mut img, Rect::new(60, 60, 60, 40));
    let page = DynamicImage::ImageRgb8(img);

    let detector = PanelDetector::new();
    assert_eq!(detector.get_candidates(&page)?.len(), 4);
    assert_eq!(detector.detect(&page)?.len(), 3);
    Ok(())
}

#[test]
fn test_run_partial_stops_mid_pipeline() -> anyhow::Result<()> {
    let (page, _) = three_panel_page();
    let pipeline = build_standard_pipeline(&DetectionParams::default(), false);

    // After three steps the page is still one binarized image.
    let binarized = pipeline.run_partial(page.clone(), 3)?;
    assert_eq!(binarized.len(), 1);
    assert!(binarized[0].bbox.is_none());

    // The fourth step splits it into per-region candidates carrying their
    // pixel counts.
    let split = pipeline.run_partial(page, 4)?;
    assert_eq!(split.len(), 4);
    for item in &split {
        assert!(item.bbox.is_some());
        assert!(item.get_int("pixel_count").unwrap() > 0);
    }
    Ok(())
}

#[test]
fn test_zero_dimension_image_is_rejected() {
    let page = DynamicImage::new_rgb8(0, 0);
    let result = PanelDetector::new().detect(&page);
    assert!(matches!(result, Err(DetectionError::InvalidImage(_))));
}

#[test]
fn test_out_of_range_params_are_rejected() {
    let bad = [
        DetectionParams {
            dilation_kernel_size: 0,
            ..DetectionParams::default()
        },
        DetectionParams {
            min_contour_area: 0,
            ..DetectionParams::default()
        },
        DetectionParams {
            block_size: 10,
            ..DetectionParams::default()
        },
        DetectionParams {
            max_span_frac: 1.5,
            ..DetectionParams::default()
        },
        DetectionParams {
            max_span_frac: 0.0,
            ..DetectionParams::default()
        },
    ];

    for params in bad {
        let result = PanelDetector::with_params(params);
        assert!(matches!(result, Err(DetectionError::InvalidParameter(_))));
    }
}

#[test]
fn test_param_edits_after_construction_still_validate() {
    let (page, _) = three_panel_page();
    let mut detector = PanelDetector::new();
    detector.params.min_contour_area = 0;

    let result = detector.detect(&page);
    assert!(matches!(result, Err(DetectionError::InvalidParameter(_))));
}

#[test]
fn test_batch_isolates_page_failures() -> anyhow::Result<()> {
    let (good, _) = three_panel_page();
    let bad = DynamicImage::new_rgb8(0, 0);
    let detector = PanelDetector::new();

    let results = panelize::batch::detect_pages(&[good, bad], &detector);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().expect("good page succeeds").len(), 3);
    assert!(matches!(results[1], Err(DetectionError::InvalidImage(_))));
    Ok(())
}

#[test]
fn test_debug_dump_refuses_non_empty_dir() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;

    let result =
        build_standard_pipeline(&DetectionParams::default(), false).with_debug(dir.path().into());
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_debug_dump_writes_stage_images() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let out = dir.path().join("stages");
    let (page, _) = three_panel_page();

    let pipeline =
        build_standard_pipeline(&DetectionParams::default(), false).with_debug(out.clone())?;
    let items = pipeline.run(page)?;
    assert_eq!(items.len(), 3);

    assert!(out.join("00_input").join("01.png").exists());
    assert!(out.join("01_grayscale_conversion").join("01.png").exists());
    assert!(out.join("03_dilation").join("01.png").exists());
    Ok(())
}
