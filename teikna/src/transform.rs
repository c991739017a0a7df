//! Affine transforms, bounding rectangles and glyph extents.

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

/// A 2×3 affine transformation matrix.
///
/// Transforms points as `(xx·x + xy·y + dx, yx·x + yy·y + dy)`. The
/// mutating builders post-multiply, so `t.translate(..).rotate(..)` applies
/// the rotation first when the result is applied to a point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    pub xx: f32,
    pub yx: f32,
    pub xy: f32,
    pub yy: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        xx: 1.0,
        yx: 0.0,
        xy: 0.0,
        yy: 1.0,
        dx: 0.0,
        dy: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Right-multiplies: the combined transform applies `other` first.
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform {
            xx: self.xx * other.xx + self.xy * other.yx,
            yx: self.yx * other.xx + self.yy * other.yx,
            xy: self.xx * other.xy + self.xy * other.yy,
            yy: self.yx * other.xy + self.yy * other.yy,
            dx: self.xx * other.dx + self.xy * other.dy + self.dx,
            dy: self.yx * other.dx + self.yy * other.dy + self.dy,
        }
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Transform {
        self.compose(&Transform {
            dx,
            dy,
            ..Self::IDENTITY
        })
    }

    /// Post-multiplies a counter-clockwise rotation, in radians.
    pub fn rotate(&self, radians: f32) -> Transform {
        let (s, c) = radians.sin_cos();
        self.compose(&Transform {
            xx: c,
            yx: s,
            xy: -s,
            yy: c,
            dx: 0.0,
            dy: 0.0,
        })
    }

    pub fn scale(&self, sx: f32, sy: f32) -> Transform {
        self.compose(&Transform {
            xx: sx,
            yy: sy,
            ..Self::IDENTITY
        })
    }

    /// Post-multiplies a skew; the angles are in radians.
    pub fn skew(&self, x_angle: f32, y_angle: f32) -> Transform {
        self.compose(&Transform {
            xx: 1.0,
            yx: y_angle.tan(),
            xy: x_angle.tan(),
            yy: 1.0,
            dx: 0.0,
            dy: 0.0,
        })
    }

    /// Assembles a transform from its decomposed parts:
    /// `translate(cx, cy) · skew · rotate · scale · translate(-cx, -cy) ·
    /// translate(tx, ty)`.
    ///
    /// Rotation and skew are fractions of π and are scaled up before the
    /// trigonometry; the x skew angle applies negated. A source with no
    /// independent y scale passes `None`, which copies `scale_x`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_decomposed(
        translate_x: f32,
        translate_y: f32,
        rotation: f32,
        scale_x: f32,
        scale_y: Option<f32>,
        skew_x: f32,
        skew_y: f32,
        center_x: f32,
        center_y: f32,
    ) -> Transform {
        use core::f32::consts::PI;
        let scale_y = scale_y.unwrap_or(scale_x);
        let mut m = Self::IDENTITY.translate(center_x, center_y);
        let skew_x = skew_x * PI;
        let skew_y = skew_y * PI;
        if skew_x != 0.0 || skew_y != 0.0 {
            m = m.skew(-skew_x, skew_y);
        }
        let rotation = rotation * PI;
        if rotation != 0.0 {
            m = m.rotate(rotation);
        }
        if scale_x != 1.0 || scale_y != 1.0 {
            m = m.scale(scale_x, scale_y);
        }
        m.translate(translate_x - center_x, translate_y - center_y)
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.xx * x + self.xy * y + self.dx,
            self.yx * x + self.yy * y + self.dy,
        )
    }

    /// Returns the axis-aligned bounding box of the transformed rectangle.
    pub fn transform_bounds(&self, bounds: BoundsRect) -> BoundsRect {
        if bounds.is_empty() {
            return bounds;
        }
        let mut result = BoundsRect::EMPTY;
        for (x, y) in [
            (bounds.x_min, bounds.y_min),
            (bounds.x_min, bounds.y_max),
            (bounds.x_max, bounds.y_min),
            (bounds.x_max, bounds.y_max),
        ] {
            let (x, y) = self.transform_point(x, y);
            result.extend(x, y);
        }
        result
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An axis-aligned rectangle accumulated point by point.
///
/// Starts out empty (inverted bounds); [`extend`](Self::extend) and
/// [`union`](Self::union) grow it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundsRect {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundsRect {
    pub const EMPTY: Self = Self {
        x_min: f32::INFINITY,
        y_min: f32::INFINITY,
        x_max: f32::NEG_INFINITY,
        y_max: f32::NEG_INFINITY,
    };

    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max
    }

    pub fn extend(&mut self, x: f32, y: f32) {
        self.x_min = self.x_min.min(x);
        self.y_min = self.y_min.min(y);
        self.x_max = self.x_max.max(x);
        self.y_max = self.y_max.max(y);
    }

    pub fn union(&mut self, other: BoundsRect) {
        if !other.is_empty() {
            self.extend(other.x_min, other.y_min);
            self.extend(other.x_max, other.y_max);
        }
    }
}

impl Default for BoundsRect {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Glyph extents in font units.
///
/// `y_bearing` is the top of the glyph and `height` grows downward, so a
/// non-empty glyph has a negative height. This matches the usual
/// text-rendering convention for horizontal layout.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GlyphExtents {
    pub x_bearing: f32,
    pub y_bearing: f32,
    pub width: f32,
    pub height: f32,
}

impl From<BoundsRect> for GlyphExtents {
    fn from(bounds: BoundsRect) -> Self {
        if bounds.is_empty() {
            return Self::default();
        }
        Self {
            x_bearing: bounds.x_min,
            y_bearing: bounds.y_max,
            width: bounds.x_max - bounds.x_min,
            height: bounds.y_min - bounds.y_max,
        }
    }
}

impl From<GlyphExtents> for BoundsRect {
    fn from(extents: GlyphExtents) -> Self {
        let mut bounds = BoundsRect::EMPTY;
        bounds.extend(extents.x_bearing, extents.y_bearing);
        bounds.extend(
            extents.x_bearing + extents.width,
            extents.y_bearing + extents.height,
        );
        bounds
    }
}
