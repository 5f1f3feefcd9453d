use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::DetectionError;
use crate::models::Rect;

/// A panel on a page: a rectangle plus a stable identifier. Ids are unique
/// within their page; update and delete target panels by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    pub id: String,
    pub rect: Rect,
}

/// One rasterized page and its editable panel set. Panels keep insertion
/// order (detection/creation order); reading order is computed on demand.
pub struct Page {
    pub page_number: u32,
    pub image: DynamicImage,
    pub panels: Vec<Panel>,
}

impl Page {
    /// Wrap detector output as a page, assigning each rect a fresh id.
    pub fn from_detection(page_number: u32, image: DynamicImage, rects: Vec<Rect>) -> Self {
        let panels = rects
            .into_iter()
            .map(|rect| Panel {
                id: new_panel_id(page_number),
                rect,
            })
            .collect();
        Self {
            page_number,
            image,
            panels,
        }
    }

    pub fn without_panels(page_number: u32, image: DynamicImage) -> Self {
        Self {
            page_number,
            image,
            panels: Vec::new(),
        }
    }

    /// Add a manually drawn panel; returns the assigned panel.
    pub fn add_panel(&mut self, rect: Rect) -> &Panel {
        self.panels.push(Panel {
            id: new_panel_id(self.page_number),
            rect,
        });
        self.panels.last().expect("panel just pushed")
    }

    /// Replace the rect of the panel with this id. Returns false if no
    /// panel matches.
    pub fn update_panel(&mut self, id: &str, rect: Rect) -> bool {
        match self.panels.iter_mut().find(|p| p.id == id) {
            Some(panel) => {
                panel.rect = rect;
                true
            }
            None => false,
        }
    }

    /// Delete the panel with this id. Returns false if no panel matches.
    pub fn remove_panel(&mut self, id: &str) -> bool {
        let before = self.panels.len();
        self.panels.retain(|p| p.id != id);
        self.panels.len() != before
    }

    pub fn panel(&self, id: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }

    /// Panels in conventional reading order: ascending top coordinate,
    /// ties broken by ascending left coordinate.
    pub fn panels_in_reading_order(&self) -> Vec<&Panel> {
        let mut ordered: Vec<&Panel> = self.panels.iter().collect();
        ordered.sort_by_key(|p| (p.rect.y, p.rect.x));
        ordered
    }

    /// Crop a panel's region from the page image, clamped to the image
    /// bounds. A rect lying entirely outside the page is an error.
    pub fn crop_panel(&self, panel: &Panel) -> Result<DynamicImage, DetectionError> {
        let (img_w, img_h) = (self.image.width(), self.image.height());
        let rect = panel.rect;

        let x = rect.x.min(img_w);
        let y = rect.y.min(img_h);
        let width = rect.width.min(img_w - x);
        let height = rect.height.min(img_h - y);

        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidParameter(format!(
                "panel {} has no area inside the page",
                panel.id
            )));
        }

        Ok(self.image.crop_imm(x, y, width, height))
    }

    /// Output file name for the panel at `index` in reading order,
    /// e.g. "p003_02.png".
    pub fn export_file_name(&self, index: usize) -> String {
        format!("p{:03}_{:02}.png", self.page_number, index + 1)
    }

    /// Crop a panel and write it under `dir` using the export naming.
    /// `index` is the panel's position in reading order.
    pub fn export_panel(
        &self,
        panel: &Panel,
        dir: &Path,
        index: usize,
    ) -> Result<PathBuf, DetectionError> {
        let crop = self.crop_panel(panel)?;
        let path = dir.join(self.export_file_name(index));
        crop.save(&path)?;
        Ok(path)
    }
}

fn new_panel_id(page_number: u32) -> String {
    format!("{}-{}", page_number, Uuid::new_v4().simple())
}
