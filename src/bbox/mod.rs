//! Axis-aligned bounding boxes in normalized image coordinates.
//!
//! Boxes use the `(x_min, y_min, x_max, y_max)` convention with coordinates
//! relative to image width and height. Nothing here enforces validity: raw
//! model slots routinely carry inverted or out-of-range boxes, and the
//! pipeline only rejects them at the very end (see [`BBox::is_valid_normalized`]).

/// Epsilon added to the IoU denominator so zero-area unions never divide by zero.
pub const IOU_EPSILON: f32 = 1e-8;

/// Axis-aligned box `(x_min, y_min, x_max, y_max)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBox {
    /// Left edge.
    pub x_min: f32,
    /// Top edge.
    pub y_min: f32,
    /// Right edge.
    pub x_max: f32,
    /// Bottom edge.
    pub y_max: f32,
}

impl BBox {
    /// Creates a box from its corner coordinates.
    pub const fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Creates a box from `[x_min, y_min, x_max, y_max]`.
    pub fn from_array(coords: [f32; 4]) -> Self {
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }

    /// Creates a box from a 4-element slice.
    ///
    /// Returns `None` when the slice does not hold exactly four values.
    pub fn from_slice(coords: &[f32]) -> Option<Self> {
        match coords {
            &[x_min, y_min, x_max, y_max] => Some(Self::new(x_min, y_min, x_max, y_max)),
            _ => None,
        }
    }

    /// Creates a box from center, width and height.
    pub fn from_cxcywh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        let half_w = w / 2.0;
        let half_h = h / 2.0;
        Self::new(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// Returns `[x_min, y_min, x_max, y_max]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }

    /// Box width; negative for inverted boxes.
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    /// Box height; negative for inverted boxes.
    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Signed area `width * height`.
    ///
    /// Not clamped: this is the area term used in the IoU denominator.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Overlap area with `other`, zero when disjoint.
    pub fn intersection(&self, other: &BBox) -> f32 {
        let inter_w = (self.x_max.min(other.x_max) - self.x_min.max(other.x_min)).max(0.0);
        let inter_h = (self.y_max.min(other.y_max) - self.y_min.max(other.y_min)).max(0.0);
        inter_w * inter_h
    }

    /// Intersection-over-union with `other`.
    ///
    /// Computed as `inter / (area_a + area_b - inter + IOU_EPSILON)`.
    pub fn iou(&self, other: &BBox) -> f32 {
        let inter = self.intersection(other);
        inter / (self.area() + other.area() - inter + IOU_EPSILON)
    }

    /// True when the box has positive extent and lies inside `[0, 1]^2`.
    pub fn is_valid_normalized(&self) -> bool {
        self.x_max > self.x_min
            && self.y_max > self.y_min
            && self.x_min >= 0.0
            && self.y_min >= 0.0
            && self.x_max <= 1.0
            && self.y_max <= 1.0
    }

    /// Clamps every coordinate into `[0, 1]`.
    pub fn clamp_unit(self) -> Self {
        Self::new(
            self.x_min.clamp(0.0, 1.0),
            self.y_min.clamp(0.0, 1.0),
            self.x_max.clamp(0.0, 1.0),
            self.y_max.clamp(0.0, 1.0),
        )
    }

    /// Scales normalized coordinates to pixel coordinates of a `width x height` image.
    pub fn to_pixels(self, width: u32, height: u32) -> [f32; 4] {
        let w = width as f32;
        let h = height as f32;
        [
            self.x_min * w,
            self.y_min * h,
            self.x_max * w,
            self.y_max * h,
        ]
    }
}

impl From<[f32; 4]> for BBox {
    fn from(coords: [f32; 4]) -> Self {
        Self::from_array(coords)
    }
}

impl From<BBox> for [f32; 4] {
    fn from(bbox: BBox) -> Self {
        bbox.to_array()
    }
}
