use image::{Rgb as Pixel, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::surface::Surface;

pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];
pub const CHANNEL_MAX: f64 = 255.0;

/// Frames flatter than this (std-dev, in [0,1] units) count as blank and are
/// never smoothed.
pub const BLANK_STD_DEV: f32 = 10.0 / 255.0;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct NormalizerConfig {
    pub target_size: u32,
    pub invert_colors: bool,
    pub smoothing: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            target_size: 28,
            invert_colors: false,
            smoothing: false,
        }
    }
}

/// Row-major grayscale frame in [0,1], `size * size` values.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedFrame {
    size: u32,
    values: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std_dev: f32,
}

impl NormalizedFrame {
    pub fn from_values(size: u32, values: Vec<f32>) -> Option<Self> {
        if values.len() != (size as usize) * (size as usize) {
            return None;
        }
        Some(Self { size, values })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    pub fn get(&self, row: u32, col: u32) -> Option<f32> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.values.get((row * self.size + col) as usize).copied()
    }

    pub fn stats(&self) -> FrameStats {
        if self.values.is_empty() {
            return FrameStats { min: 0.0, max: 0.0, mean: 0.0, std_dev: 0.0 };
        }
        let count = self.values.len() as f64;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0_f64;
        for &value in &self.values {
            min = min.min(value);
            max = max.max(value);
            sum += value as f64;
        }
        let mean = sum / count;
        let variance = self
            .values
            .iter()
            .map(|&value| (value as f64 - mean).powi(2))
            .sum::<f64>()
            / count;
        FrameStats {
            min,
            max,
            mean: mean as f32,
            std_dev: variance.sqrt() as f32,
        }
    }

    /// Text rendering of the top-left `rows x cols` cells, one line per row,
    /// each followed by the row's value range.
    pub fn preview(&self, rows: u32, cols: u32) -> String {
        let rows = rows.min(self.size);
        let cols = cols.min(self.size);
        let mut out = String::new();
        for row in 0..rows {
            let start = (row * self.size) as usize;
            let cells = &self.values[start..start + cols as usize];
            for &value in cells {
                out.push(match value {
                    v if v < 0.2 => '█',
                    v if v < 0.5 => '▓',
                    v if v < 0.8 => '░',
                    _ => ' ',
                });
            }
            let lo = cells.iter().copied().fold(f32::INFINITY, f32::min);
            let hi = cells.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            out.push_str(&format!("  [{lo:.2}-{hi:.2}]\n"));
        }
        out
    }
}

struct AxisWeights {
    taps: Vec<Vec<(usize, f64)>>,
}

impl AxisWeights {
    fn new(src: u32, dst: u32) -> Self {
        let scale = src as f64 / dst as f64;
        let taps = (0..dst)
            .map(|index| {
                let start = index as f64 * scale;
                let end = start + scale;
                let first = start.floor() as u32;
                let last = (end.ceil() as u32).min(src);
                (first..last)
                    .filter_map(|pixel| {
                        let lo = start.max(pixel as f64);
                        let hi = end.min(pixel as f64 + 1.0);
                        (hi > lo).then(|| (pixel as usize, hi - lo))
                    })
                    .collect()
            })
            .collect();
        Self { taps }
    }
}

/// Coverage-weighted RGB mean of every destination cell, row-major.
pub fn area_average(src: &RgbImage, width: u32, height: u32) -> Vec<[f64; 3]> {
    let width = width.max(1);
    let height = height.max(1);
    if src.width() == 0 || src.height() == 0 {
        return vec![[0.0; 3]; (width as usize) * (height as usize)];
    }
    let xs = AxisWeights::new(src.width(), width);
    let ys = AxisWeights::new(src.height(), height);
    let mut out = Vec::with_capacity((width as usize) * (height as usize));
    for y_taps in &ys.taps {
        for x_taps in &xs.taps {
            let mut acc = [0.0_f64; 3];
            let mut total = 0.0_f64;
            for &(sy, wy) in y_taps {
                for &(sx, wx) in x_taps {
                    let weight = wy * wx;
                    let Pixel(rgb) = *src.get_pixel(sx as u32, sy as u32);
                    for (sum, channel) in acc.iter_mut().zip(rgb) {
                        *sum += weight * channel as f64;
                    }
                    total += weight;
                }
            }
            if total > 0.0 {
                for sum in &mut acc {
                    *sum /= total;
                }
            }
            out.push(acc);
        }
    }
    out
}

pub fn area_resize(src: &RgbImage, width: u32, height: u32) -> RgbImage {
    let width = width.max(1);
    let height = height.max(1);
    let cells = area_average(src, width, height);
    let raw = cells
        .iter()
        .flat_map(|cell| cell.map(|channel| channel.round().clamp(0.0, CHANNEL_MAX) as u8))
        .collect();
    RgbImage::from_raw(width, height, raw).unwrap_or_else(|| RgbImage::new(width, height))
}

pub fn luminance(rgb: [f64; 3]) -> f64 {
    LUMA_WEIGHTS[0] * rgb[0] + LUMA_WEIGHTS[1] * rgb[1] + LUMA_WEIGHTS[2] * rgb[2]
}

/// Downsample, convert to luminance, scale into [0,1], optionally invert.
pub fn normalize(pixels: &RgbImage, target_size: u32, invert_colors: bool) -> NormalizedFrame {
    FrameNormalizer::new(NormalizerConfig {
        target_size,
        invert_colors,
        smoothing: false,
    })
    .normalize_pixels(pixels)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameNormalizer {
    config: NormalizerConfig,
}

impl FrameNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn normalize_surface<S: Surface + ?Sized>(&self, surface: &S) -> NormalizedFrame {
        self.normalize_pixels(&surface.read_pixels())
    }

    pub fn normalize_pixels(&self, pixels: &RgbImage) -> NormalizedFrame {
        let size = self.config.target_size.max(1);
        let mut values: Vec<f32> = area_average(pixels, size, size)
            .into_iter()
            .map(|cell| (luminance(cell) / CHANNEL_MAX).clamp(0.0, 1.0) as f32)
            .collect();
        if self.config.smoothing {
            values = smooth(&values, size as usize);
        }
        if self.config.invert_colors {
            for value in &mut values {
                *value = 1.0 - *value;
            }
        }
        NormalizedFrame { size, values }
    }
}

const GAUSS_SIGMA: f64 = 0.5;

fn gauss_kernel() -> [f64; 3] {
    let side = (-1.0 / (2.0 * GAUSS_SIGMA * GAUSS_SIGMA)).exp();
    let total = 1.0 + 2.0 * side;
    [side / total, 1.0 / total, side / total]
}

// Mirror without repeating the edge pixel: -1 -> 1, n -> n - 2.
fn reflect(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let folded = if index < 0 {
        -index
    } else if index > last {
        2 * last - index
    } else {
        index
    };
    folded.clamp(0, last) as usize
}

fn smooth(values: &[f32], size: usize) -> Vec<f32> {
    let frame = NormalizedFrame {
        size: size as u32,
        values: values.to_vec(),
    };
    let stats = frame.stats();
    if stats.std_dev < BLANK_STD_DEV {
        trace!(std_dev = stats.std_dev, "frame is blank, skipping smoothing");
        return frame.values;
    }
    let kernel = gauss_kernel();
    let mut horizontal = vec![0.0_f64; values.len()];
    for row in 0..size {
        for col in 0..size {
            horizontal[row * size + col] = (-1..=1)
                .map(|k: isize| {
                    let c = reflect(col as isize + k, size);
                    kernel[(k + 1) as usize] * values[row * size + c] as f64
                })
                .sum();
        }
    }
    let mut out = vec![0.0_f32; values.len()];
    for row in 0..size {
        for col in 0..size {
            let v: f64 = (-1..=1)
                .map(|k: isize| {
                    let r = reflect(row as isize + k, size);
                    kernel[(k + 1) as usize] * horizontal[r * size + col]
                })
                .sum();
            out[row * size + col] = v.clamp(0.0, 1.0) as f32;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn checker(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Pixel([0, 0, 0])
            } else {
                Pixel([255, 255, 255])
            }
        })
    }

    #[test]
    fn luminance_uses_perceptual_weights() {
        let red = RgbImage::from_pixel(4, 4, Pixel([255, 0, 0]));
        let frame = normalize(&red, 2, false);
        for &value in frame.values() {
            assert!((value - 0.299).abs() < 1e-6);
        }
        let green = RgbImage::from_pixel(4, 4, Pixel([0, 255, 0]));
        assert!((normalize(&green, 1, false).values()[0] - 0.587).abs() < 1e-6);
    }

    #[test]
    fn white_is_exactly_one() {
        let white = RgbImage::from_pixel(400, 400, Pixel([255, 255, 255]));
        let frame = normalize(&white, 28, false);
        assert_eq!(frame.values().len(), 28 * 28);
        assert!(frame.values().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn area_filter_blends_instead_of_picking() {
        let frame = normalize(&checker(8, 8), 4, false);
        for &value in frame.values() {
            assert!((value - 0.5).abs() < 1e-6, "value {value}");
        }
    }

    #[test]
    fn fractional_cells_are_weighted() {
        // 3 source columns into 2 cells: each cell takes one full pixel and half of the middle one.
        let mut src = RgbImage::from_pixel(3, 1, Pixel([255, 255, 255]));
        src.put_pixel(0, 0, Pixel([0, 0, 0]));
        let cells = area_average(&src, 2, 1);
        assert!((cells[0][0] - 85.0).abs() < 1e-9);
        assert!((cells[1][0] - 255.0).abs() < 1e-9);
    }

    #[test]
    fn upscaling_still_covers_every_cell() {
        let src = RgbImage::from_pixel(2, 2, Pixel([255, 255, 255]));
        let frame = normalize(&src, 5, true);
        assert_eq!(frame.values().len(), 25);
        assert!(frame.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn output_is_row_major() {
        let mut src = RgbImage::from_pixel(2, 2, Pixel([255, 255, 255]));
        src.put_pixel(1, 0, Pixel([0, 0, 0]));
        let frame = normalize(&src, 2, false);
        assert_eq!(frame.get(0, 1), Some(0.0));
        assert_eq!(frame.values()[1], 0.0);
        assert_eq!(frame.get(1, 0), Some(1.0));
    }

    #[test]
    fn inversion_is_a_complement() {
        let src = checker(10, 7);
        let plain = normalize(&src, 3, false);
        let inverted = normalize(&src, 3, true);
        let complement: Vec<f32> = plain.values().iter().map(|v| 1.0 - v).collect();
        assert_eq!(inverted.values(), complement.as_slice());
    }

    #[test]
    fn zero_target_is_treated_as_one() {
        let src = RgbImage::from_pixel(3, 3, Pixel([255, 255, 255]));
        let frame = normalize(&src, 0, false);
        assert_eq!(frame.size(), 1);
    }

    #[test]
    fn blank_frames_skip_smoothing() {
        let src = RgbImage::from_pixel(28, 28, Pixel([255, 255, 255]));
        let normalizer = FrameNormalizer::new(NormalizerConfig {
            target_size: 28,
            invert_colors: false,
            smoothing: true,
        });
        assert_eq!(normalizer.normalize_pixels(&src), normalize(&src, 28, false));
    }

    #[test]
    fn smoothing_runs_before_inversion() {
        let mut src = RgbImage::from_pixel(6, 6, Pixel([255, 255, 255]));
        src.put_pixel(1, 1, Pixel([0, 0, 0]));
        src.put_pixel(4, 3, Pixel([90, 90, 90]));
        let config = NormalizerConfig {
            target_size: 6,
            invert_colors: false,
            smoothing: true,
        };
        let smoothed = FrameNormalizer::new(config).normalize_pixels(&src);
        let inverted = FrameNormalizer::new(NormalizerConfig {
            invert_colors: true,
            ..config
        })
        .normalize_pixels(&src);
        assert!(smoothed.stats().std_dev >= BLANK_STD_DEV);
        assert!(smoothed.get(1, 2).unwrap() < 1.0);
        let complement: Vec<f32> = smoothed.values().iter().map(|v| 1.0 - v).collect();
        assert_eq!(inverted.values(), complement.as_slice());
    }

    #[test]
    fn smoothing_softens_a_single_dark_cell() {
        let mut src = RgbImage::from_pixel(5, 5, Pixel([255, 255, 255]));
        src.put_pixel(2, 2, Pixel([0, 0, 0]));
        let normalizer = FrameNormalizer::new(NormalizerConfig {
            target_size: 5,
            invert_colors: false,
            smoothing: true,
        });
        let frame = normalizer.normalize_pixels(&src);
        let center = frame.get(2, 2).unwrap();
        let neighbour = frame.get(2, 1).unwrap();
        assert!(center > 0.0 && center < 0.7, "center {center}");
        assert!(neighbour < 1.0 && neighbour > 0.8, "neighbour {neighbour}");
        assert_eq!(frame.get(0, 0), Some(1.0));
    }

    #[test]
    fn stats_and_preview() {
        let frame = NormalizedFrame::from_values(2, vec![0.0, 0.3, 0.6, 1.0]).unwrap();
        let stats = frame.stats();
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 1.0);
        assert!((stats.mean - 0.475).abs() < 1e-6);
        assert_eq!(frame.preview(2, 2), "█▓  [0.00-0.30]\n░   [0.60-1.00]\n");
        assert!(NormalizedFrame::from_values(2, vec![0.0]).is_none());
    }
}
