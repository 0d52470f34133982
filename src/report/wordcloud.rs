//! Word cloud rendering
//!
//! Words are weighted by frequency, sized between a minimum and maximum font
//! size, and placed largest first along an Archimedean spiral from the canvas
//! centre. A coarse occupancy grid keeps words from overlapping. Glyphs are
//! rasterized with fontdue and composited onto an `image` canvas.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use image::{Rgb, RgbImage};
use tracing::{debug, info};

use super::error::RenderError;

/// Capability to turn corpus text into an image on disk
pub trait Renderer {
    /// Render `text` (whitespace-separated tokens) into `output`
    fn render(&self, text: &str, output: &Path) -> Result<(), RenderError>;
}

/// Fonts tried, in order, when no font is configured
pub const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/wenquanyi/wqy-microhei/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\simhei.ttf",
    "C:\\Windows\\Fonts\\msyh.ttc",
];

const PALETTE: &[[u8; 3]] = &[
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [23, 190, 207],
];

/// Size of one occupancy cell in pixels
const CELL: u32 = 4;

/// Word cloud renderer backed by fontdue and image
#[derive(Debug, Clone)]
pub struct WordCloudRenderer {
    pub width: u32,
    pub height: u32,
    pub max_words: usize,
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub background: [u8; 3],
    fonts: Vec<PathBuf>,
}

impl Default for WordCloudRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            max_words: 300,
            min_font_size: 10.0,
            max_font_size: 110.0,
            background: [255, 255, 255],
            fonts: DEFAULT_FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
        }
    }
}

impl WordCloudRenderer {
    /// Use `font` when given, otherwise the well-known system fonts
    pub fn new(font: Option<PathBuf>) -> Self {
        let mut renderer = Self::default();
        if let Some(font) = font {
            renderer.fonts = vec![font];
        }
        renderer
    }

    fn load_font(&self) -> Result<Font, RenderError> {
        let path = self
            .fonts
            .iter()
            .find(|p| p.is_file())
            .ok_or_else(|| RenderError::FontNotFound(self.fonts.clone()))?;
        debug!("Loading font {}", path.display());

        let bytes = std::fs::read(path)?;
        Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| {
            RenderError::FontLoad {
                path: path.clone(),
                reason: reason.to_string(),
            }
        })
    }

    fn font_size(&self, weight: f32) -> f32 {
        self.min_font_size + (self.max_font_size - self.min_font_size) * weight
    }
}

/// Most frequent tokens of `text` with weights relative to the top token
///
/// Ties keep first-seen order. The most frequent token has weight 1.0.
pub fn word_weights(text: &str, max_words: usize) -> Vec<(String, f32)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for token in text.split_whitespace() {
        match positions.get(token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                positions.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(max_words);

    let top = counts.first().map(|(_, c)| *c as f32).unwrap_or(1.0);
    counts
        .into_iter()
        .map(|(token, count)| (token.to_string(), count as f32 / top))
        .collect()
}

/// Coarse grid of occupied canvas cells
#[derive(Debug, Clone)]
pub struct Occupancy {
    cols: u32,
    rows: u32,
    cells: Vec<bool>,
}

impl Occupancy {
    pub fn new(width: u32, height: u32) -> Self {
        let cols = width / CELL;
        let rows = height / CELL;
        Self {
            cols,
            rows,
            cells: vec![false; (cols * rows) as usize],
        }
    }

    fn cell_span(x: u32, y: u32, w: u32, h: u32) -> (u32, u32, u32, u32) {
        (x / CELL, y / CELL, (x + w).div_ceil(CELL), (y + h).div_ceil(CELL))
    }

    /// Whether a `w`×`h` box at (`x`, `y`) is inside the canvas and free
    pub fn fits(&self, x: u32, y: u32, w: u32, h: u32) -> bool {
        let (c0, r0, c1, r1) = Self::cell_span(x, y, w, h);
        if c1 > self.cols || r1 > self.rows {
            return false;
        }
        (r0..r1).all(|r| (c0..c1).all(|c| !self.cells[(r * self.cols + c) as usize]))
    }

    pub fn occupy(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let (c0, r0, c1, r1) = Self::cell_span(x, y, w, h);
        for r in r0..r1.min(self.rows) {
            for c in c0..c1.min(self.cols) {
                self.cells[(r * self.cols + c) as usize] = true;
            }
        }
    }

    /// First free spot for a `w`×`h` box along a spiral from the centre
    pub fn find_spot(&self, w: u32, h: u32) -> Option<(u32, u32)> {
        let width = self.cols * CELL;
        let height = self.rows * CELL;
        if w > width || h > height {
            return None;
        }

        let cx = (width / 2) as f32;
        let cy = (height / 2) as f32;
        let max_radius = (cx * cx + cy * cy).sqrt();
        let mut t = 0.0f32;
        loop {
            let radius = 1.5 * t;
            if radius > max_radius {
                return None;
            }
            let x = cx + radius * t.cos() - w as f32 / 2.0;
            let y = cy + radius * t.sin() - h as f32 / 2.0;
            if x >= 0.0 && y >= 0.0 {
                let (x, y) = (x as u32, y as u32);
                if self.fits(x, y, w, h) {
                    return Some((x, y));
                }
            }
            t += 0.1;
        }
    }
}

/// Pixel width and line height of `word` at `size`
fn measure(font: &Font, word: &str, size: f32) -> (u32, u32, f32) {
    let width: f32 = word.chars().map(|c| font.metrics(c, size).advance_width).sum();
    let (height, ascent) = match font.horizontal_line_metrics(size) {
        Some(lines) => (lines.ascent - lines.descent, lines.ascent),
        None => (size * 1.2, size),
    };
    (width.ceil() as u32, height.ceil() as u32, ascent)
}

fn draw_word(
    canvas: &mut RgbImage,
    font: &Font,
    word: &str,
    size: f32,
    origin: (u32, u32),
    ascent: f32,
    color: [u8; 3],
) {
    let baseline = origin.1 as f32 + ascent;
    let mut pen_x = origin.0 as f32;

    for c in word.chars() {
        let (metrics, coverage) = font.rasterize(c, size);
        let left = pen_x.round() as i64 + metrics.xmin as i64;
        let top = baseline.round() as i64 - metrics.height as i64 - metrics.ymin as i64;

        for row in 0..metrics.height {
            for col in 0..metrics.width {
                let alpha = coverage[row * metrics.width + col];
                if alpha == 0 {
                    continue;
                }
                let px = left + col as i64;
                let py = top + row as i64;
                if px < 0 || py < 0 || px >= canvas.width() as i64 || py >= canvas.height() as i64 {
                    continue;
                }
                let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                let a = alpha as u16;
                for channel in 0..3 {
                    let under = pixel.0[channel] as u16;
                    pixel.0[channel] =
                        ((color[channel] as u16 * a + under * (255 - a)) / 255) as u8;
                }
            }
        }
        pen_x += metrics.advance_width;
    }
}

impl Renderer for WordCloudRenderer {
    fn render(&self, text: &str, output: &Path) -> Result<(), RenderError> {
        let weights = word_weights(text, self.max_words);
        if weights.is_empty() {
            return Err(RenderError::NoWords);
        }
        let font = self.load_font()?;

        let mut canvas = RgbImage::from_pixel(self.width, self.height, Rgb(self.background));
        let mut occupancy = Occupancy::new(self.width, self.height);
        let mut placed = 0usize;

        for (rank, (word, weight)) in weights.iter().enumerate() {
            let mut size = self.font_size(*weight);
            while size >= self.min_font_size {
                let (w, h, ascent) = measure(&font, word, size);
                if let Some((x, y)) = occupancy.find_spot(w, h) {
                    occupancy.occupy(x, y, w, h);
                    let color = PALETTE[rank % PALETTE.len()];
                    draw_word(&mut canvas, &font, word, size, (x, y), ascent, color);
                    placed += 1;
                    break;
                }
                size -= 2.0;
            }
        }

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        canvas.save(output)?;
        info!(
            "Rendered {} of {} words into {}",
            placed,
            weights.len(),
            output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_weights() {
        let weights = word_weights("hello hello world foo hello world", 300);
        assert_eq!(
            weights,
            vec![
                ("hello".to_string(), 1.0),
                ("world".to_string(), 2.0 / 3.0),
                ("foo".to_string(), 1.0 / 3.0),
            ]
        );
    }

    #[test]
    fn test_word_weights_limit_and_empty() {
        let text = (0..10).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        assert_eq!(word_weights(&text, 4).len(), 4);
        assert!(word_weights("   ", 300).is_empty());
    }

    #[test]
    fn test_occupancy_prevents_overlap() {
        let mut grid = Occupancy::new(100, 100);
        let (x, y) = grid.find_spot(40, 20).unwrap();
        assert!(grid.fits(x, y, 40, 20));
        grid.occupy(x, y, 40, 20);
        assert!(!grid.fits(x, y, 40, 20));

        let (x2, y2) = grid.find_spot(40, 20).unwrap();
        assert!((x2, y2) != (x, y));
        assert!(grid.fits(x2, y2, 40, 20));
    }

    #[test]
    fn test_occupancy_rejects_oversized() {
        let grid = Occupancy::new(100, 100);
        assert_eq!(grid.find_spot(200, 10), None);
        assert!(!grid.fits(90, 90, 20, 20));
    }

    #[test]
    fn test_missing_font() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = WordCloudRenderer::new(Some(dir.path().join("missing.ttf")));
        let result = renderer.render("hello world", &dir.path().join("cloud.png"));
        assert!(matches!(result, Err(RenderError::FontNotFound(_))));
    }

    #[test]
    fn test_nothing_to_render() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = WordCloudRenderer::new(None);
        let result = renderer.render("", &dir.path().join("cloud.png"));
        assert!(matches!(result, Err(RenderError::NoWords)));
    }
}
