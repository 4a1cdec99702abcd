//! Pure geometry and colour helpers shared by the PDF and OCR paths.
//!
//! Nothing here touches pdfium or tesseract: boxes and pixels come in as plain
//! numbers so the same thresholds are exercised by both extractors and by
//! unit tests. All cutoffs are fixed constants; identical input gives
//! identical classification.

/// Fraction of a word's area a single red glyph box must cover to tag the word red.
pub const RED_OVERLAP_RATIO: f32 = 0.35;

/// Fraction of reddish pixels that makes an OCR word crop count as red.
pub const REDDISH_PIXEL_RATIO: f32 = 0.20;

/// Hue window around 0°/360° on the 0–255 hue scale (12/255 ≈ 17°).
pub const REDDISH_HUE_LOW: u8 = 12;
pub const REDDISH_HUE_HIGH: u8 = 245;
/// Minimum saturation and value (0–255) for a pixel to count as reddish.
pub const REDDISH_MIN_SATURATION: u8 = 70;
pub const REDDISH_MIN_VALUE: u8 = 70;

/// Axis-aligned rectangle `(x0, top, x1, bottom)` with `y` growing downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BoundingBox {
    /// Build a box, swapping coordinates given in the wrong order.
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        let (x0, x1) = if x1 < x0 { (x1, x0) } else { (x0, x1) };
        let (top, bottom) = if bottom < top { (bottom, top) } else { (top, bottom) };
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Box from an OCR-style `(left, top, width, height)` quadruple.
    pub fn from_ltwh(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self::new(
            left as f32,
            top as f32,
            (left + width) as f32,
            (top + height) as f32,
        )
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Overlapping region, or `None` when the boxes only touch or are disjoint.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let x0 = self.x0.max(other.x0);
        let top = self.top.max(other.top);
        let x1 = self.x1.min(other.x1);
        let bottom = self.bottom.min(other.bottom);
        if x1 <= x0 || bottom <= top {
            None
        } else {
            Some(BoundingBox {
                x0,
                top,
                x1,
                bottom,
            })
        }
    }

    /// Intersection area over this box's area. Degenerate boxes count as area 1.
    pub fn overlap_ratio(&self, other: &BoundingBox) -> f32 {
        let area = self.area().max(1.0);
        self.intersection(other)
            .map(|i| i.area() / area)
            .unwrap_or(0.0)
    }
}

/// True when any single box in `boxes` covers at least `min_ratio` of `word`.
pub fn overlaps_any(word: &BoundingBox, boxes: &[BoundingBox], min_ratio: f32) -> bool {
    boxes.iter().any(|b| word.overlap_ratio(b) >= min_ratio)
}

/// Red fill test on 0–255 RGB.
pub fn is_red_rgb(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    r >= 140 && g <= 120 && b <= 120 && r >= g + 35 && r >= b + 35
}

/// Hue, saturation and value, each on a 0–255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// RGB → HSV with every channel scaled to 0–255 and truncated.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == min {
        return Hsv { h: 0, s: 0, v: max };
    }

    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let maxf = max as f32;
    let chroma = maxf - min as f32;
    let s = chroma / maxf;
    let rc = (maxf - rf) / chroma;
    let gc = (maxf - gf) / chroma;
    let bc = (maxf - bf) / chroma;
    let h = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    let h = (h / 6.0 + 1.0).rem_euclid(1.0);

    Hsv {
        h: (h * 255.0).clamp(0.0, 255.0) as u8,
        s: (s * 255.0).clamp(0.0, 255.0) as u8,
        v: max,
    }
}

/// Whether a single pixel sits in the red hue window with enough colour.
pub fn is_reddish_hsv(hsv: Hsv) -> bool {
    (hsv.h <= REDDISH_HUE_LOW || hsv.h >= REDDISH_HUE_HIGH)
        && hsv.s >= REDDISH_MIN_SATURATION
        && hsv.v >= REDDISH_MIN_VALUE
}

/// Classify a crop: reddish when at least [`REDDISH_PIXEL_RATIO`] of its
/// pixels are reddish. An empty crop is never reddish.
pub fn is_reddish<I>(pixels: I) -> bool
where
    I: IntoIterator<Item = [u8; 3]>,
{
    let mut total = 0usize;
    let mut red = 0usize;
    for [r, g, b] in pixels {
        total += 1;
        if is_reddish_hsv(rgb_to_hsv(r, g, b)) {
            red += 1;
        }
    }
    total > 0 && (red as f32 / total as f32) >= REDDISH_PIXEL_RATIO
}
