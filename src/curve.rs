//! Curve sampler: turns a freehand stroke into one target value per slot.
//!
//! The drawing surface is split into as many equal-width columns as there
//! are tracks. Each column is probed at its center from the top down; the
//! first inked pixel gives the target, measured from the bottom edge as a
//! percentage of the height. Columns the stroke never crossed inherit the
//! value to their left, so a quick or partial drawing still yields a full
//! target sequence.

use log::{debug, trace};

/// Default opacity a pixel must exceed to count as ink.
pub const DEFAULT_INK_THRESHOLD: u8 = 0;

/// Target used when the first slot has no ink.
pub const DEFAULT_CURVE_VALUE: f64 = 50.0;

/// A raster the user drew on, addressed by pixel.
pub trait StrokeSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Ink opacity at `(x, y)`, origin top-left. Out-of-bounds reads are 0.
    fn opacity(&self, x: u32, y: u32) -> u8;
}

/// Sampling parameters
#[derive(Debug, Clone, Copy)]
pub struct CurveSampler {
    pub ink_threshold: u8,
    pub default_value: f64,
}

impl Default for CurveSampler {
    fn default() -> Self {
        Self {
            ink_threshold: DEFAULT_INK_THRESHOLD,
            default_value: DEFAULT_CURVE_VALUE,
        }
    }
}

impl CurveSampler {
    /// Exactly `slots` targets in `[0, 100]`, whatever the surface holds.
    #[must_use]
    pub fn sample<S: StrokeSurface + ?Sized>(&self, surface: &S, slots: usize) -> Vec<f64> {
        let (width, height) = (surface.width(), surface.height());
        let fallback = self.default_value.clamp(0.0, 100.0);

        let targets = (0..slots)
            .scan(fallback, |previous, slot| {
                let value = slot_column(slot, slots, width)
                    .and_then(|x| self.first_ink_row(surface, x, height))
                    .map_or(*previous, |y| row_to_value(y, height));
                *previous = value;
                Some(value)
            })
            .collect::<Vec<_>>();

        debug!("Sampled {slots} targets from {width}x{height} surface");
        targets
    }

    fn first_ink_row<S: StrokeSurface + ?Sized>(&self, surface: &S, x: u32, height: u32) -> Option<u32> {
        let row = (0..height).find(|&y| surface.opacity(x, y) > self.ink_threshold);
        if row.is_none() {
            trace!("No ink in column {x}");
        }
        row
    }
}

/// Center column of a slot, `floor((2i + 1) * width / 2n)`.
fn slot_column(slot: usize, slots: usize, width: u32) -> Option<u32> {
    if width == 0 || slots == 0 {
        return None;
    }
    let x = ((2 * slot as u64 + 1) * u64::from(width)) / (2 * slots as u64);
    Some(x.min(u64::from(width - 1)) as u32)
}

fn row_to_value(y: u32, height: u32) -> f64 {
    let height = f64::from(height);
    (100.0 * (height - f64::from(y)) / height).clamp(0.0, 100.0)
}

/// In-memory alpha raster, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaCanvas {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl AlphaCanvas {
    /// Blank canvas.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0; width as usize * height as usize],
        }
    }

    /// Wrap an existing alpha buffer. Returns `None` if the length does not
    /// match the dimensions.
    #[must_use]
    pub fn from_alpha(width: u32, height: u32, alpha: Vec<u8>) -> Option<Self> {
        (alpha.len() == width as usize * height as usize).then_some(Self { width, height, alpha })
    }

    pub fn set(&mut self, x: u32, y: u32, opacity: u8) {
        if x < self.width && y < self.height {
            self.alpha[y as usize * self.width as usize + x as usize] = opacity;
        }
    }

    /// Stamp an opaque round brush along the segment `from` → `to`, in
    /// pixel coordinates.
    pub fn stroke(&mut self, from: (f64, f64), to: (f64, f64), radius: f64) {
        let length = (to.0 - from.0).hypot(to.1 - from.1);
        let steps = length.ceil().max(1.0) as usize;

        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let cx = from.0 + (to.0 - from.0) * t;
            let cy = from.1 + (to.1 - from.1) * t;
            self.stamp(cx, cy, radius);
        }
    }

    /// Draw a polyline through `(x_percent, value)` points, where `x_percent`
    /// runs left to right over `[0, 100]` and `value` is the target scale.
    pub fn stroke_values(&mut self, points: &[(f64, f64)], radius: f64) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let to_pixel = |&(x, value): &(f64, f64)| {
            let px = x.clamp(0.0, 100.0) / 100.0 * f64::from(self.width - 1);
            let py = f64::from(self.height) * (1.0 - value.clamp(0.0, 100.0) / 100.0);
            (px, py.min(f64::from(self.height - 1)))
        };
        let pixels: Vec<(f64, f64)> = points.iter().map(to_pixel).collect();

        match pixels.as_slice() {
            [] => {}
            [only] => self.stamp(only.0, only.1, radius),
            _ => {
                for pair in pixels.windows(2) {
                    self.stroke(pair[0], pair[1], radius);
                }
            }
        }
    }

    fn stamp(&mut self, cx: f64, cy: f64, radius: f64) {
        let r = radius.max(0.0);
        let (x0, x1) = ((cx - r).floor().max(0.0) as u32, (cx + r).ceil().max(0.0) as u32);
        let (y0, y1) = ((cy - r).floor().max(0.0) as u32, (cy + r).ceil().max(0.0) as u32);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (f64::from(x) - cx, f64::from(y) - cy);
                if dx * dx + dy * dy <= r * r + 0.25 {
                    self.set(x, y, u8::MAX);
                }
            }
        }
    }
}

impl StrokeSurface for AlphaCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn opacity(&self, x: u32, y: u32) -> u8 {
        if x < self.width && y < self.height {
            self.alpha[y as usize * self.width as usize + x as usize]
        } else {
            0
        }
    }
}
