//! On-frame annotation.

use std::fmt::Display;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};

use crate::counter::{Counts, CrossingEvent};
use crate::error::{FootfallError, Result};

const LINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CROSSING_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const ENTRY_TEXT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const EXIT_TEXT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const THICKNESS: i32 = 2;

/// Draws counting state onto frames. Called by the pipeline in the order
/// `begin_frame`, `draw_track` per confirmed track, `end_frame`.
pub trait FrameRenderer {
    fn begin_frame(&mut self, image: &mut RgbImage, line_y: f32);

    fn draw_track(
        &mut self,
        image: &mut RgbImage,
        track_id: &dyn Display,
        tlbr: [f32; 4],
        event: CrossingEvent,
    );

    fn end_frame(&mut self, image: &mut RgbImage, counts: Counts);
}

/// Default renderer: reference line, track boxes, and, when a font is
/// loaded, track ids plus running totals.
#[derive(Default)]
pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TrueType/OpenType font used for labels.
    pub fn with_font_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| {
            FootfallError::config(format!("invalid font {}: {e}", path.display()))
        })?;
        Ok(Self { font: Some(font) })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn label(
        &self,
        image: &mut RgbImage,
        text: &str,
        x: i32,
        y: i32,
        scale: f32,
        color: Rgb<u8>,
    ) {
        if let Some(font) = &self.font {
            draw_text_mut(image, color, x, y, PxScale::from(scale), font, text);
        }
    }
}

impl FrameRenderer for Annotator {
    fn begin_frame(&mut self, image: &mut RgbImage, line_y: f32) {
        let width = image.width() as f32;
        for offset in 0..THICKNESS {
            let y = line_y + offset as f32;
            draw_line_segment_mut(image, (0.0, y), (width, y), LINE_COLOR);
        }
    }

    fn draw_track(
        &mut self,
        image: &mut RgbImage,
        track_id: &dyn Display,
        tlbr: [f32; 4],
        event: CrossingEvent,
    ) {
        // Clamp to just outside the image so the box maths stays in i32 range.
        let (max_x, max_y) = (image.width() as f32, image.height() as f32);
        let margin = THICKNESS as f32;
        let [x1, y1, x2, y2] = [
            tlbr[0].clamp(-margin, max_x + margin),
            tlbr[1].clamp(-margin, max_y + margin),
            tlbr[2].clamp(-margin, max_x + margin),
            tlbr[3].clamp(-margin, max_y + margin),
        ]
        .map(|v| v as i32);
        let color = if event.is_crossing() {
            CROSSING_COLOR
        } else {
            BOX_COLOR
        };

        if x2 > x1 && y2 > y1 {
            for offset in 0..THICKNESS {
                let w = (x2 - x1 + 2 * offset) as u32;
                let h = (y2 - y1 + 2 * offset) as u32;
                let rect = imageproc::rect::Rect::at(x1 - offset, y1 - offset).of_size(w, h);
                draw_hollow_rect_mut(image, rect, color);
            }
        }

        self.label(image, &format!("ID: {track_id}"), x1, y1 - 18, 16.0, color);
    }

    fn end_frame(&mut self, image: &mut RgbImage, counts: Counts) {
        let entries = format!("Entries: {}", counts.entries);
        let exits = format!("Exits: {}", counts.exits);
        self.label(image, &entries, 10, 10, 28.0, ENTRY_TEXT_COLOR);
        self.label(image, &exits, 10, 50, 28.0, EXIT_TEXT_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_line_and_box_without_font() {
        let mut image = RgbImage::new(100, 100);
        let mut annotator = Annotator::new();
        assert!(!annotator.has_font());

        annotator.begin_frame(&mut image, 50.0);
        let tlbr = [10.0, 10.0, 40.0, 40.0];
        annotator.draw_track(&mut image, &3u64, tlbr, CrossingEvent::None);
        annotator.end_frame(&mut image, Counts::default());

        assert_eq!(*image.get_pixel(70, 50), LINE_COLOR);
        assert_eq!(*image.get_pixel(10, 20), BOX_COLOR);
        assert_eq!(*image.get_pixel(25, 25), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_crossing_box_uses_highlight() {
        let mut image = RgbImage::new(60, 60);
        let mut annotator = Annotator::new();
        annotator.draw_track(&mut image, &1u64, [5.0, 5.0, 30.0, 30.0], CrossingEvent::Exit);
        assert_eq!(*image.get_pixel(5, 15), CROSSING_COLOR);
    }

    #[test]
    fn test_degenerate_box_is_skipped() {
        let mut image = RgbImage::new(20, 20);
        let mut annotator = Annotator::new();
        annotator.draw_track(&mut image, &1u64, [5.0, 5.0, 5.0, 9.0], CrossingEvent::None);
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_huge_box_is_clipped_to_the_frame() {
        let mut image = RgbImage::new(20, 20);
        let mut annotator = Annotator::new();
        annotator.draw_track(&mut image, &1u64, [-3.0e9, 0.0, 3.0e9, 10.0], CrossingEvent::None);
        let everywhere = [f32::MIN, f32::MIN, f32::MAX, f32::MAX];
        annotator.draw_track(&mut image, &2u64, everywhere, CrossingEvent::Exit);
        assert_eq!(*image.get_pixel(5, 0), BOX_COLOR);
        assert_eq!(*image.get_pixel(10, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_bad_font_file_is_config_error() {
        let path = std::env::temp_dir().join(format!("footfall-font-{}.ttf", std::process::id()));
        std::fs::write(&path, b"not a font").unwrap();
        let err = Annotator::with_font_file(&path).err().unwrap();
        assert!(matches!(err, FootfallError::Config(_)));
    }
}
