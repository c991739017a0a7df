//! Support for rendering variable composite glyphs from the VARC table.

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

use raw::{
    tables::{
        layout::Condition,
        varc::{DecomposedTransform, Varc, VarcComponent, VarcFlags},
        variations::{DeltaSetIndex, ItemVariationStore, NO_VARIATION_INDEX},
    },
    types::{F2Dot14, GlyphId},
};

use crate::{
    collections::SmallVec,
    decycler::{RecursionGuard, Visit},
    outline::{pen::TransformPen, BaseGlyphs, OutlinePen},
    transform::{BoundsRect, GlyphExtents, Transform},
    COMPOSITE_RECURSION_LIMIT,
};

type CoordVec = SmallVec<F2Dot14, 64>;
type AxisIndexVec = SmallVec<u16, 64>;
type AxisValueVec = SmallVec<f32, 64>;
type DeltaVec = SmallVec<f32, 64>;
type ScalarCacheVec = SmallVec<f32, 128>;

/// Copying coordinates is expensive, so inherited vectors beyond this
/// length are rebuilt from the font's configured position instead of being
/// borrowed down the recursion.
const MAX_INHERITED_COORDS: usize = 64;

struct Scratchpad {
    deltas: DeltaVec,
    axis_indices: AxisIndexVec,
    axis_values: AxisValueVec,
}

impl Scratchpad {
    fn new() -> Self {
        Self {
            deltas: DeltaVec::new(),
            axis_indices: AxisIndexVec::new(),
            axis_values: AxisValueVec::new(),
        }
    }
}

enum DrawTarget<'p> {
    Path(&'p mut dyn OutlinePen),
    Extents(&'p mut BoundsRect),
}

/// The VARC evaluation engine.
pub struct Outlines<'a> {
    varc: Varc<'a>,
    base: BaseGlyphs<'a>,
    axis_count: usize,
    region_count: usize,
}

impl<'a> Outlines<'a> {
    /// Creates an engine over a parsed table.
    ///
    /// `axis_count` is the number of design axes of the font; incoming
    /// coordinate vectors are padded or truncated to it.
    pub fn new(varc: Varc<'a>, base: BaseGlyphs<'a>, axis_count: usize) -> Self {
        let region_count = varc
            .var_store()
            .and_then(|store| store.region_list().ok())
            .map(|regions| regions.region_count())
            .unwrap_or_default();
        Self {
            varc,
            base,
            axis_count,
            region_count,
        }
    }

    /// Draws a glyph under the given outer transform.
    ///
    /// Returns true when the glyph was covered by the table or handled by a
    /// leaf provider. Malformed records are drawn up to their first broken
    /// component.
    pub fn draw(
        &self,
        glyph_id: GlyphId,
        coords: &[F2Dot14],
        transform: Transform,
        pen: &mut impl OutlinePen,
    ) -> bool {
        let pen: &mut dyn OutlinePen = pen;
        self.evaluate(glyph_id, coords, transform, &mut DrawTarget::Path(pen))
    }

    /// Computes extents for a glyph under the given outer transform.
    pub fn extents(
        &self,
        glyph_id: GlyphId,
        coords: &[F2Dot14],
        transform: Transform,
    ) -> Option<GlyphExtents> {
        let mut bounds = BoundsRect::EMPTY;
        let mut target = DrawTarget::Extents(&mut bounds);
        let covered = self.evaluate(glyph_id, coords, transform, &mut target);
        covered.then(|| bounds.into())
    }

    fn evaluate(
        &self,
        glyph_id: GlyphId,
        coords: &[F2Dot14],
        transform: Transform,
        target: &mut DrawTarget,
    ) -> bool {
        let mut font_coords = CoordVec::new();
        expand_coords(&mut font_coords, self.axis_count, coords);
        let mut guard = RecursionGuard::new();
        let mut cache = ScalarCache::new(self.region_count);
        let mut scratch = Scratchpad::new();
        self.draw_glyph(
            glyph_id,
            None,
            font_coords.as_slice(),
            font_coords.as_slice(),
            transform,
            target,
            &mut guard,
            &mut cache,
            &mut scratch,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_glyph(
        &self,
        glyph_id: GlyphId,
        parent: Option<GlyphId>,
        font_coords: &[F2Dot14],
        coords: &[F2Dot14],
        transform: Transform,
        target: &mut DrawTarget,
        guard: &mut RecursionGuard,
        cache: &mut ScalarCache,
        scratch: &mut Scratchpad,
    ) -> bool {
        // A component naming its own parent is treated as uncovered, which
        // lets a composite layer further components over its leaf outline.
        let coverage_index = if parent == Some(glyph_id) {
            None
        } else {
            self.varc.coverage().get(glyph_id)
        };
        let Some(coverage_index) = coverage_index else {
            return self.draw_base_glyph(glyph_id, coords, transform, target);
        };
        match guard.enter(glyph_id.to_u32()) {
            Visit::Entered => {}
            // Cycles and exhausted budgets end this branch, not the call.
            Visit::Revisit | Visit::Exhausted => return true,
        }
        self.draw_components(
            glyph_id,
            coverage_index,
            font_coords,
            coords,
            transform,
            target,
            guard,
            cache,
            scratch,
        );
        guard.leave();
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_components(
        &self,
        glyph_id: GlyphId,
        coverage_index: u16,
        font_coords: &[F2Dot14],
        coords: &[F2Dot14],
        transform: Transform,
        target: &mut DrawTarget,
        guard: &mut RecursionGuard,
        cache: &mut ScalarCache,
        scratch: &mut Scratchpad,
    ) {
        let Ok(glyph) = self.varc.glyph(coverage_index as usize) else {
            return;
        };
        let mut component_coords_buf = CoordVec::new();
        let mut child_cache: Option<ScalarCache> = None;
        for component in glyph.components() {
            // A truncated component drops itself and everything after it;
            // the valid prefix has already been drawn.
            let Ok(component) = component else {
                break;
            };
            if !self.component_visible(&component, coords, cache) {
                continue;
            }
            let flags = component.flags();
            let coords_unchanged = !flags
                .intersects(VarcFlags::HAVE_AXES | VarcFlags::RESET_UNSPECIFIED_AXES)
                && coords.len() <= MAX_INHERITED_COORDS;
            let component_coords: &[F2Dot14] = if coords_unchanged {
                coords
            } else {
                if !self.component_coords(
                    &component,
                    font_coords,
                    coords,
                    cache,
                    &mut component_coords_buf,
                    scratch,
                ) {
                    continue;
                }
                component_coords_buf.as_slice()
            };
            let mut parts = *component.transform();
            self.apply_transform_deltas(&component, coords, &mut parts, cache, &mut scratch.deltas);
            let local = Transform::from_decomposed(
                parts.translate_x,
                parts.translate_y,
                parts.rotation,
                parts.scale_x,
                flags.contains(VarcFlags::HAVE_SCALE_Y).then_some(parts.scale_y),
                parts.skew_x,
                parts.skew_y,
                parts.center_x,
                parts.center_y,
            );
            let matrix = transform.compose(&local);
            if coords_unchanged {
                // Coordinates are untouched, so the region scalars stay
                // valid and the child can share this cache.
                self.draw_glyph(
                    component.gid(),
                    Some(glyph_id),
                    font_coords,
                    coords,
                    matrix,
                    target,
                    guard,
                    cache,
                    scratch,
                );
            } else {
                let component_cache = match &mut child_cache {
                    Some(existing) => {
                        existing.invalidate();
                        existing
                    }
                    slot => slot.insert(ScalarCache::new(self.region_count)),
                };
                self.draw_glyph(
                    component.gid(),
                    Some(glyph_id),
                    font_coords,
                    component_coords,
                    matrix,
                    target,
                    guard,
                    component_cache,
                    scratch,
                );
            }
        }
    }

    fn draw_base_glyph(
        &self,
        glyph_id: GlyphId,
        coords: &[F2Dot14],
        transform: Transform,
        target: &mut DrawTarget,
    ) -> bool {
        match target {
            DrawTarget::Path(pen) => {
                if transform.is_identity() {
                    self.base.draw(glyph_id, coords, &mut **pen)
                } else {
                    let mut transform_pen = TransformPen::new(&mut **pen, transform);
                    self.base.draw(glyph_id, coords, &mut transform_pen)
                }
            }
            DrawTarget::Extents(bounds) => {
                let Some(extents) = self.base.extents(glyph_id, coords) else {
                    return false;
                };
                bounds.union(transform.transform_bounds(extents.into()));
                true
            }
        }
    }

    fn component_visible(
        &self,
        component: &VarcComponent,
        coords: &[F2Dot14],
        cache: &mut ScalarCache,
    ) -> bool {
        let Some(condition_index) = component.condition_index() else {
            return true;
        };
        self.eval_condition(condition_index, coords, cache, COMPOSITE_RECURSION_LIMIT)
    }

    /// Evaluates a condition by its slot in the table's condition list.
    ///
    /// A missing list, a nonexistent slot and an exhausted depth budget all
    /// evaluate to false; conditions can reference each other by index, so
    /// the budget is what bounds cyclic expressions.
    fn eval_condition(
        &self,
        condition_index: u32,
        coords: &[F2Dot14],
        cache: &mut ScalarCache,
        depth_left: usize,
    ) -> bool {
        if depth_left == 0 {
            return false;
        }
        let Some(list) = self.varc.condition_list() else {
            return false;
        };
        let Ok(condition) = list.get(condition_index as usize) else {
            return false;
        };
        match condition {
            Condition::AxisRange(range) => {
                let coord = coords
                    .get(range.axis_index as usize)
                    .copied()
                    .unwrap_or(F2Dot14::ZERO);
                // the range test sees the coordinate rounded to the
                // nearest integer
                let coord = F2Dot14::from_f32(coord.to_f32().round());
                coord >= range.filter_range_min && coord <= range.filter_range_max
            }
            Condition::Value(value) => {
                let mut delta = [0.0f32];
                self.add_deltas(value.var_index, coords, cache, &mut delta);
                value.default_value as f32 + delta[0] > 0.0
            }
            Condition::And(set) => set
                .iter()
                .all(|ix| self.eval_condition(ix, coords, cache, depth_left - 1)),
            Condition::Or(set) => set
                .iter()
                .any(|ix| self.eval_condition(ix, coords, cache, depth_left - 1)),
            Condition::Negate(negate) => {
                !self.eval_condition(negate.condition_index, coords, cache, depth_left - 1)
            }
        }
    }

    /// Builds the coordinate vector a component hands to its child glyph.
    ///
    /// Returns false when the component is malformed and should be dropped.
    #[allow(clippy::too_many_arguments)]
    fn component_coords(
        &self,
        component: &VarcComponent,
        font_coords: &[F2Dot14],
        coords: &[F2Dot14],
        cache: &mut ScalarCache,
        out: &mut CoordVec,
        scratch: &mut Scratchpad,
    ) -> bool {
        let flags = component.flags();
        if flags.contains(VarcFlags::RESET_UNSPECIFIED_AXES)
            || coords.len() > MAX_INHERITED_COORDS
        {
            expand_coords(out, font_coords.len(), font_coords);
        } else {
            expand_coords(out, coords.len(), coords);
        }
        if !flags.contains(VarcFlags::HAVE_AXES) {
            return true;
        }
        let Some(axis_indices_index) = component.axis_indices_index() else {
            return false;
        };
        let Ok(packed_indices) = self.varc.axis_indices(axis_indices_index as usize) else {
            return false;
        };
        scratch.axis_indices.clear();
        for value in packed_indices.iter() {
            scratch.axis_indices.push(value as u16);
        }
        // Axis values and their deltas are in F2DOT14 bit scale.
        scratch
            .axis_values
            .resize_and_fill(scratch.axis_indices.len(), 0.0);
        if let Some(values) = component.axis_values() {
            for (slot, value) in scratch.axis_values.iter_mut().zip(values.iter()) {
                *slot = value as f32;
            }
        }
        if let Some(var_index) = component.axis_values_var_index() {
            if !coords.is_empty() {
                self.add_deltas(var_index, coords, cache, scratch.axis_values.as_mut_slice());
            }
        }
        for (axis, value) in scratch
            .axis_indices
            .iter()
            .zip(scratch.axis_values.iter().copied())
        {
            // Overrides of nonexistent axes are dropped, not failed.
            let Some(slot) = out.as_mut_slice().get_mut(*axis as usize) else {
                continue;
            };
            let raw = value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            *slot = F2Dot14::from_bits(raw);
        }
        true
    }

    /// Applies variation deltas to the component's transform.
    ///
    /// Present fields are packed in record order, adjusted in their raw
    /// fixed-point scale, then unpacked. `scale_y` mirrors `scale_x` again
    /// afterwards when it was not independently present.
    fn apply_transform_deltas(
        &self,
        component: &VarcComponent,
        coords: &[F2Dot14],
        transform: &mut DecomposedTransform,
        cache: &mut ScalarCache,
        deltas: &mut DeltaVec,
    ) {
        let Some(var_index) = component.transform_var_index() else {
            return;
        };
        if coords.is_empty() {
            return;
        }
        let flags = component.flags();
        if flags.bits() & VarcFlags::TRANSFORM_FIELDS.bits() == 0 {
            return;
        }
        const ANGLE_SCALE: f32 = 4096.0;
        const SCALE_SCALE: f32 = 1024.0;
        deltas.clear();
        if flags.contains(VarcFlags::HAVE_TRANSLATE_X) {
            deltas.push(transform.translate_x);
        }
        if flags.contains(VarcFlags::HAVE_TRANSLATE_Y) {
            deltas.push(transform.translate_y);
        }
        if flags.contains(VarcFlags::HAVE_ROTATION) {
            deltas.push(transform.rotation * ANGLE_SCALE);
        }
        if flags.contains(VarcFlags::HAVE_SCALE_X) {
            deltas.push(transform.scale_x * SCALE_SCALE);
        }
        if flags.contains(VarcFlags::HAVE_SCALE_Y) {
            deltas.push(transform.scale_y * SCALE_SCALE);
        }
        if flags.contains(VarcFlags::HAVE_SKEW_X) {
            deltas.push(transform.skew_x * ANGLE_SCALE);
        }
        if flags.contains(VarcFlags::HAVE_SKEW_Y) {
            deltas.push(transform.skew_y * ANGLE_SCALE);
        }
        if flags.contains(VarcFlags::HAVE_TCENTER_X) {
            deltas.push(transform.center_x);
        }
        if flags.contains(VarcFlags::HAVE_TCENTER_Y) {
            deltas.push(transform.center_y);
        }
        self.add_deltas(var_index, coords, cache, deltas.as_mut_slice());
        let mut values = deltas.as_slice().iter().copied();
        if flags.contains(VarcFlags::HAVE_TRANSLATE_X) {
            transform.translate_x = values.next().unwrap_or(transform.translate_x);
        }
        if flags.contains(VarcFlags::HAVE_TRANSLATE_Y) {
            transform.translate_y = values.next().unwrap_or(transform.translate_y);
        }
        if flags.contains(VarcFlags::HAVE_ROTATION) {
            if let Some(value) = values.next() {
                transform.rotation = value / ANGLE_SCALE;
            }
        }
        if flags.contains(VarcFlags::HAVE_SCALE_X) {
            if let Some(value) = values.next() {
                transform.scale_x = value / SCALE_SCALE;
            }
        }
        if flags.contains(VarcFlags::HAVE_SCALE_Y) {
            if let Some(value) = values.next() {
                transform.scale_y = value / SCALE_SCALE;
            }
        }
        if flags.contains(VarcFlags::HAVE_SKEW_X) {
            if let Some(value) = values.next() {
                transform.skew_x = value / ANGLE_SCALE;
            }
        }
        if flags.contains(VarcFlags::HAVE_SKEW_Y) {
            if let Some(value) = values.next() {
                transform.skew_y = value / ANGLE_SCALE;
            }
        }
        if flags.contains(VarcFlags::HAVE_TCENTER_X) {
            transform.center_x = values.next().unwrap_or(transform.center_x);
        }
        if flags.contains(VarcFlags::HAVE_TCENTER_Y) {
            transform.center_y = values.next().unwrap_or(transform.center_y);
        }
        if !flags.contains(VarcFlags::HAVE_SCALE_Y) {
            transform.scale_y = transform.scale_x;
        }
    }

    fn add_deltas(
        &self,
        var_index: u32,
        coords: &[F2Dot14],
        cache: &mut ScalarCache,
        out: &mut [f32],
    ) {
        if let Some(store) = self.varc.var_store() {
            add_tuple_deltas(store, var_index, coords, cache, out);
        }
    }
}

/// Memoizes region scalar evaluations for one coordinate vector.
///
/// Scalars live in [0, 1], so a single sentinel above that range marks a
/// slot as not yet computed; invalidation just refills the sentinel.
pub(crate) struct ScalarCache {
    values: ScalarCacheVec,
}

impl ScalarCache {
    const INVALID: f32 = 2.0;

    fn new(region_count: usize) -> Self {
        Self {
            values: ScalarCacheVec::with_len(region_count, Self::INVALID),
        }
    }

    fn get(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or(Self::INVALID)
    }

    fn set(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.values.as_mut_slice().get_mut(index) {
            *slot = value;
        }
    }

    fn invalidate(&mut self) {
        self.values.as_mut_slice().fill(Self::INVALID);
    }
}

fn expand_coords(out: &mut CoordVec, axis_count: usize, coords: &[F2Dot14]) {
    out.resize_and_fill(axis_count, F2Dot14::ZERO);
    for (slot, value) in out.as_mut_slice().iter_mut().zip(coords.iter().copied()) {
        *slot = value;
    }
}

/// Adds the delta vector for `var_index` to `out`, weighting each region's
/// contribution by its (cached) scalar.
///
/// The sentinel index and out-of-range indices contribute nothing; the
/// vector form reads consecutive rows starting at the inner index, and rows
/// past the subtable's item count are silently zero.
fn add_tuple_deltas(
    store: &ItemVariationStore,
    var_index: u32,
    coords: &[F2Dot14],
    cache: &mut ScalarCache,
    out: &mut [f32],
) {
    if out.is_empty() || var_index == NO_VARIATION_INDEX {
        return;
    }
    let index = DeltaSetIndex::from_u32(var_index);
    let Ok(Some(data)) = store.item_variation_data(index.outer as usize) else {
        return;
    };
    let Ok(regions) = store.region_list() else {
        return;
    };
    let region_indexes = data.region_indexes();
    for (slot_ix, slot) in out.iter_mut().enumerate() {
        let row = index.inner as usize + slot_ix;
        if row >= data.item_count() {
            break;
        }
        for (region_index, delta) in region_indexes.iter().zip(data.delta_set(row)) {
            let region_ix = region_index.get() as usize;
            let mut scalar = cache.get(region_ix);
            if scalar >= ScalarCache::INVALID {
                scalar = regions.compute_scalar(region_ix, coords);
                cache.set(region_ix, scalar);
            }
            if scalar == 0.0 {
                continue;
            }
            *slot += scalar * delta as f32;
        }
    }
}
