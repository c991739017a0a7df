//! Drawing variable composite glyphs.

pub mod hvgl;
pub mod pen;
pub mod varc;

pub use pen::OutlinePen;

use raw::types::{F2Dot14, GlyphId};

use crate::transform::{GlyphExtents, Transform};

/// Provider of leaf (non composite) glyph outlines.
///
/// The composite engines never interpret outline data themselves; any
/// component that is not covered by the composite table is handed to one of
/// these. Coordinates are passed in their integer (F2DOT14) form; providers
/// without variation support receive an empty slice.
pub trait LeafGlyphProvider {
    /// Draws the glyph into the pen, returning false when this provider
    /// has no outline for it.
    fn get_path_at(&self, glyph_id: GlyphId, coords: &[F2Dot14], pen: &mut dyn OutlinePen)
        -> bool;

    /// Computes untransformed extents for the glyph.
    fn get_extents_at(&self, glyph_id: GlyphId, coords: &[F2Dot14]) -> Option<GlyphExtents>;
}

/// Routes leaf glyphs to the first provider that accepts them.
///
/// The quadratic outline provider is consulted first, then CFF2, then CFF1.
/// CFF1 outlines carry no variations so that provider sees empty
/// coordinates.
#[derive(Default)]
pub struct BaseGlyphs<'a> {
    pub glyf: Option<&'a dyn LeafGlyphProvider>,
    pub cff2: Option<&'a dyn LeafGlyphProvider>,
    pub cff1: Option<&'a dyn LeafGlyphProvider>,
}

impl BaseGlyphs<'_> {
    pub(crate) fn draw(
        &self,
        glyph_id: GlyphId,
        coords: &[F2Dot14],
        pen: &mut dyn OutlinePen,
    ) -> bool {
        for provider in [self.glyf, self.cff2].into_iter().flatten() {
            if provider.get_path_at(glyph_id, coords, pen) {
                return true;
            }
        }
        if let Some(cff1) = self.cff1 {
            if cff1.get_path_at(glyph_id, &[], pen) {
                return true;
            }
        }
        false
    }

    pub(crate) fn extents(&self, glyph_id: GlyphId, coords: &[F2Dot14]) -> Option<GlyphExtents> {
        for provider in [self.glyf, self.cff2].into_iter().flatten() {
            if let Some(extents) = provider.get_extents_at(glyph_id, coords) {
                return Some(extents);
            }
        }
        self.cff1?.get_extents_at(glyph_id, &[])
    }
}

/// The composite engines, one per supported table.
pub enum Outlines<'a> {
    Varc(varc::Outlines<'a>),
    Hvgl(hvgl::Outlines<'a>),
}

impl Outlines<'_> {
    /// Draws a glyph under the given outer transform.
    ///
    /// Returns false only when no engine or leaf provider could produce an
    /// outline for the glyph; a malformed composite record yields the valid
    /// prefix of its components and still succeeds.
    pub fn draw(
        &self,
        glyph_id: GlyphId,
        coords: &[F2Dot14],
        transform: Transform,
        pen: &mut impl OutlinePen,
    ) -> bool {
        match self {
            Self::Varc(outlines) => outlines.draw(glyph_id, coords, transform, pen),
            Self::Hvgl(outlines) => outlines.draw(glyph_id, coords, transform, pen),
        }
    }

    /// Computes extents for a glyph under the given outer transform.
    pub fn extents(
        &self,
        glyph_id: GlyphId,
        coords: &[F2Dot14],
        transform: Transform,
    ) -> Option<GlyphExtents> {
        match self {
            Self::Varc(outlines) => outlines.extents(glyph_id, coords, transform),
            Self::Hvgl(outlines) => outlines.extents(glyph_id, coords, transform),
        }
    }
}
