use clap::Parser;
use image::ImageReader;
use serde::Serialize;
use std::path::PathBuf;

use panelize::detection::{DetectionParams, PanelDetector, build_standard_pipeline};
use panelize::page::{Page, Panel};

#[derive(Parser)]
#[command(name = "panelize")]
#[command(about = "Split scanned comic-book pages into individual panel images")]
struct Cli {
    /// Rasterized page images, in page order
    #[arg(value_name = "PAGE", required = true)]
    pages: Vec<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Global cutoff used when a page is smaller than the adaptive block
    #[arg(long, default_value_t = 127)]
    threshold: u8,

    /// Adaptive threshold neighborhood side (odd, >= 3)
    #[arg(long, default_value_t = 11)]
    block_size: u32,

    /// Offset subtracted from the local mean before binarizing
    #[arg(long, default_value_t = 5)]
    block_offset: u8,

    /// Dilation structuring element side
    #[arg(long, default_value_t = 5)]
    kernel_size: u32,

    /// Minimum foreground pixels for a region to count as a panel
    #[arg(long, default_value_t = 1000)]
    min_area: u32,

    /// Reject candidates spanning at least this fraction of the page
    #[arg(long, default_value_t = 0.95)]
    max_span: f32,

    /// Padding for the overlap-merge stage, in pixels
    #[arg(long, default_value_t = 10)]
    merge_margin: u32,

    /// Skip the overlap-merge stage
    #[arg(long)]
    no_merge: bool,

    /// Save per-stage debug images for the first page to directory
    /// (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Write cropped panel images in reading order to directory
    #[arg(long, value_name = "DIR")]
    crop_out: Option<PathBuf>,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn params(&self) -> DetectionParams {
        DetectionParams {
            threshold: self.threshold,
            block_size: self.block_size,
            block_offset: self.block_offset,
            dilation_kernel_size: self.kernel_size,
            min_contour_area: self.min_area,
            max_span_frac: self.max_span,
            merge_margin: if self.no_merge { None } else { Some(self.merge_margin) },
        }
    }
}

#[derive(Serialize)]
struct PageReport {
    page_number: u32,
    width: u32,
    height: u32,
    panels: Vec<Panel>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let params = args.params();
    let detector = PanelDetector::with_params(params.clone())?.with_verbose(args.verbose);

    // Load pages up front; a page that fails to load is reported and
    // skipped so the rest of the document still gets processed.
    let mut loaded: Vec<(u32, image::DynamicImage)> = Vec::new();
    for (index, path) in args.pages.iter().enumerate() {
        let page_number = index as u32 + 1;
        match ImageReader::open(path).map_err(anyhow::Error::from).and_then(|r| {
            r.decode()
                .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))
        }) {
            Ok(img) => {
                if args.verbose {
                    println!(
                        "Loaded page {}: {:?} ({}x{})",
                        page_number,
                        path,
                        img.width(),
                        img.height()
                    );
                }
                loaded.push((page_number, img));
            }
            Err(e) => {
                eprintln!("Page {} ({:?}): {}", page_number, path, e);
            }
        }
    }

    let mut pages: Vec<Page> = Vec::new();

    if let Some(debug_dir) = &args.debug_out {
        // Debug mode runs the composable pipeline one page at a time so
        // every intermediate stage gets dumped; only the first page writes
        // debug images.
        for (i, (page_number, img)) in loaded.into_iter().enumerate() {
            let rects = if i == 0 {
                let pipeline = build_standard_pipeline(&params, args.verbose)
                    .with_debug(debug_dir.clone())?;
                let items = pipeline.run(img.clone())?;
                items.into_iter().filter_map(|item| item.bbox).collect()
            } else {
                detect_or_empty(&detector, page_number, &img)
            };
            pages.push(Page::from_detection(page_number, img, rects));
        }
    } else {
        let (numbers, images): (Vec<u32>, Vec<image::DynamicImage>) = loaded.into_iter().unzip();
        let results = panelize::batch::detect_pages(&images, &detector);
        for ((page_number, img), result) in numbers.into_iter().zip(images).zip(results) {
            let rects = match result {
                Ok(rects) => rects,
                Err(e) => {
                    eprintln!("Page {}: detection failed: {}", page_number, e);
                    Vec::new()
                }
            };
            pages.push(Page::from_detection(page_number, img, rects));
        }
    }

    if let Some(crop_dir) = &args.crop_out {
        std::fs::create_dir_all(crop_dir)?;
        for page in &pages {
            for (i, panel) in page.panels_in_reading_order().iter().enumerate() {
                match page.export_panel(panel, crop_dir, i) {
                    Ok(path) => {
                        if args.verbose {
                            println!("Wrote {:?}", path);
                        }
                    }
                    Err(e) => {
                        eprintln!("Page {}: skipping panel {}: {}", page.page_number, panel.id, e);
                    }
                }
            }
        }
    }

    if args.json {
        let report: Vec<PageReport> = pages
            .iter()
            .map(|page| PageReport {
                page_number: page.page_number,
                width: page.image.width(),
                height: page.image.height(),
                panels: page
                    .panels_in_reading_order()
                    .into_iter()
                    .cloned()
                    .collect(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n=== Panel Detection Results ===");
        for page in &pages {
            println!("Page {}: {} panels", page.page_number, page.panels.len());
            for (i, panel) in page.panels_in_reading_order().iter().enumerate() {
                let r = panel.rect;
                println!(
                    "  {:>2}: ({}, {}) {}x{}  id={}",
                    i + 1,
                    r.x,
                    r.y,
                    r.width,
                    r.height,
                    panel.id
                );
            }
        }
    }

    Ok(())
}

fn detect_or_empty(
    detector: &PanelDetector,
    page_number: u32,
    img: &image::DynamicImage,
) -> Vec<panelize::Rect> {
    match detector.detect(img) {
        Ok(rects) => rects,
        Err(e) => {
            eprintln!("Page {}: detection failed: {}", page_number, e);
            Vec::new()
        }
    }
}
