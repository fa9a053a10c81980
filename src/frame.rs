//! Frames and the reference frame source/sink.
//!
//! A frame source is any `Iterator<Item = Result<Frame>>`: lazy, finite and
//! consumed once. The stream ends when the iterator is exhausted.

use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::debug;

use crate::error::{FootfallError, Result};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// One decoded video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based position in the stream
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Receives every frame, annotated or not, in stream order.
pub trait FrameSink {
    fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Flush anything buffered. Called once after the last frame.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Where the output ends up, for the run summary.
    fn output_path(&self) -> Option<&Path> {
        None
    }
}

/// Frames read from a directory of still images, ordered by file name with
/// digit runs compared numerically (`2.png` before `10.png`).
pub struct ImageSequenceSource {
    paths: std::iter::Enumerate<std::vec::IntoIter<PathBuf>>,
    len: usize,
}

impl ImageSequenceSource {
    /// List the directory up front so a missing or empty input fails before
    /// any frame is processed. Decoding is deferred to iteration.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries =
            std::fs::read_dir(dir).map_err(|e| FootfallError::source_unavailable(dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| FootfallError::source_unavailable(dir, e))?
                .path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(FootfallError::source_unavailable(dir, "no image frames found"));
        }
        paths.sort_by_cached_key(|p| frame_order_key(p));

        debug!(frames = paths.len(), dir = %dir.display(), "opened image sequence");
        Ok(Self {
            len: paths.len(),
            paths: paths.into_iter().enumerate(),
        })
    }

    /// Number of frames listed at open time.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NameChunk {
    /// Significant digit count, then the digits without leading zeros.
    Number(usize, String),
    Text(String),
}

fn name_chunks(name: &str) -> Vec<NameChunk> {
    let mut chunks = Vec::new();
    let mut rest = name;
    while let Some(first) = rest.chars().next() {
        let is_digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != is_digit)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        chunks.push(if is_digit {
            let digits = run.trim_start_matches('0');
            NameChunk::Number(digits.len(), digits.to_string())
        } else {
            NameChunk::Text(run.to_string())
        });
        rest = tail;
    }
    chunks
}

/// Natural order on the file stem, ties broken by the full file name.
fn frame_order_key(path: &Path) -> (Vec<NameChunk>, PathBuf) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (name_chunks(&stem), path.to_path_buf())
}

impl Iterator for ImageSequenceSource {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, path) = self.paths.next()?;
        let index = index as u64;
        let frame = image::open(&path)
            .map(|img| Frame::new(index, img.to_rgb8()))
            .map_err(|e| FootfallError::Frame {
                frame: index,
                reason: format!("{}: {e}", path.display()),
            });
        Some(frame)
    }
}

/// Writes each frame as `frame_NNNNNN.png` into an output directory.
pub struct ImageSequenceSink {
    dir: PathBuf,
    written: u64,
}

impl ImageSequenceSink {
    /// Create the output directory, failing before processing starts if it
    /// cannot be used.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| FootfallError::sink_unavailable(&dir, e))?;
        let meta = std::fs::metadata(&dir).map_err(|e| FootfallError::sink_unavailable(&dir, e))?;
        if meta.permissions().readonly() {
            return Err(FootfallError::sink_unavailable(&dir, "directory is read-only"));
        }
        Ok(Self { dir, written: 0 })
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }

    fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl FrameSink for ImageSequenceSink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        frame.image.save(self.frame_path(frame.index))?;
        self.written += 1;
        Ok(())
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("footfall-frame-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_source_is_unavailable() {
        let err = ImageSequenceSource::open("/definitely/not/here").err().unwrap();
        assert!(matches!(err, FootfallError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_empty_source_is_unavailable() {
        let dir = scratch_dir("empty");
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();
        let err = ImageSequenceSource::open(&dir).err().unwrap();
        assert!(matches!(err, FootfallError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_frames_come_in_name_order_then_end() {
        let dir = scratch_dir("order");
        for (name, shade) in [("b.png", 20u8), ("a.png", 10u8)] {
            RgbImage::from_pixel(4, 3, image::Rgb([shade, 0, 0]))
                .save(dir.join(name))
                .unwrap();
        }

        let mut source = ImageSequenceSource::open(&dir).unwrap();
        assert_eq!(source.len(), 2);
        let first = source.next().unwrap().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.image.get_pixel(0, 0)[0], 10);
        let second = source.next().unwrap().unwrap();
        assert_eq!((second.width(), second.height()), (4, 3));
        assert!(source.next().is_none());
        assert!(source.next().is_none());
    }

    #[test]
    fn test_unpadded_frame_numbers_sort_numerically() {
        let dir = scratch_dir("natural");
        for (name, shade) in [("10.png", 10u8), ("2.png", 2u8), ("1.png", 1u8), ("02.bmp", 3u8)] {
            RgbImage::from_pixel(2, 2, image::Rgb([shade, 0, 0]))
                .save(dir.join(name))
                .unwrap();
        }

        let shades: Vec<u8> = ImageSequenceSource::open(&dir)
            .unwrap()
            .map(|f| f.unwrap().image.get_pixel(0, 0)[0])
            .collect();
        // "02" and "2" are the same number; the full name decides.
        assert_eq!(shades, vec![1, 3, 2, 10]);
    }

    #[test]
    fn test_name_chunks_compare_digit_runs_as_numbers() {
        assert!(name_chunks("frame_9") < name_chunks("frame_10"));
        assert!(name_chunks("cam1_frame_2") < name_chunks("cam2_frame_1"));
        assert_eq!(name_chunks("007"), name_chunks("7"));
    }

    #[test]
    fn test_sink_writes_numbered_frames() {
        let dir = scratch_dir("sink").join("out");
        let mut sink = ImageSequenceSink::create(&dir).unwrap();
        sink.write(&Frame::new(7, RgbImage::new(2, 2))).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.frames_written(), 1);
        assert!(dir.join("frame_000007.png").exists());
        assert_eq!(sink.output_path(), Some(dir.as_path()));
    }

    #[test]
    fn test_sink_over_a_file_is_unavailable() {
        let dir = scratch_dir("sinkfile");
        let file = dir.join("taken");
        std::fs::write(&file, "x").unwrap();
        let err = ImageSequenceSink::create(&file).err().unwrap();
        assert!(matches!(err, FootfallError::SinkUnavailable { .. }));
    }
}
