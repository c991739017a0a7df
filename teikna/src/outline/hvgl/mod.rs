//! Support for rendering part glyphs from the hvgl table.
//!
//! Glyphs are parts: either shapes, which carry explicit quadratic contours
//! blended across the design space, or composites, which place sub-parts
//! through sparse per-axis translation and rotation deltas.

use raw::{
    tables::hvgl::{CompositePart, CoordBlendType, F64Le, Hvgl, Part, ShapePart},
    types::{F2Dot14, GlyphId},
};

#[cfg(feature = "libm")]
#[allow(unused_imports)]
use core_maths::CoreFloat;

use crate::{
    collections::SmallVec,
    decycler::{RecursionGuard, Visit},
    outline::{pen::BoundsPen, OutlinePen},
    transform::{GlyphExtents, Transform},
};

type CoordVec = SmallVec<f32, 64>;
type TransformVec = SmallVec<Transform, 16>;
type SegmentVec = SmallVec<Segment, 64>;

/// A single curve segment in a contour: one on-curve and one off-curve
/// point. For curve-type segments the stored on-curve x slot is actually
/// the interpolation factor between the neighboring off-curve points.
#[derive(Clone, Copy, Default, Debug)]
struct Segment {
    on_curve_x: f64,
    on_curve_y: f64,
    off_curve_x: f64,
    off_curve_y: f64,
}

impl Segment {
    fn from_coords(values: &[F64Le]) -> Self {
        Self {
            on_curve_x: values[0].get(),
            on_curve_y: values[1].get(),
            off_curve_x: values[2].get(),
            off_curve_y: values[3].get(),
        }
    }

    /// Projects the on-curve point onto the line between the off-curve
    /// points of `first` and `second`.
    fn projected_onto(mut self, first: &Segment, second: &Segment) -> Self {
        let x1 = first.off_curve_x;
        let y1 = first.off_curve_y;
        let dx = second.off_curve_x - x1;
        let dy = second.off_curve_y - y1;
        let len2 = dx * dx + dy * dy;
        let t = if len2 != 0.0 {
            ((dx * (self.on_curve_x - x1) + dy * (self.on_curve_y - y1)) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.on_curve_x = x1 + dx * t;
        self.on_curve_y = y1 + dy * t;
        self
    }
}

/// The hvgl evaluation engine.
pub struct Outlines<'a> {
    hvgl: Hvgl<'a>,
}

impl<'a> Outlines<'a> {
    pub fn new(hvgl: Hvgl<'a>) -> Self {
        Self { hvgl }
    }

    pub fn glyph_count(&self) -> u32 {
        self.hvgl.num_glyphs()
    }

    /// Draws a glyph under the given outer transform.
    ///
    /// Returns false when the glyph is not addressable through the table.
    pub fn draw(
        &self,
        glyph_id: GlyphId,
        coords: &[F2Dot14],
        transform: Transform,
        pen: &mut impl OutlinePen,
    ) -> bool {
        let pen: &mut dyn OutlinePen = pen;
        let Ok(Some(part)) = self.hvgl.glyph_part(glyph_id) else {
            return false;
        };
        // Buffers are sized from the root part's header: every descendant
        // works on a slice of them.
        let (axis_len, transform_len) = match &part {
            Part::Shape(shape) => (shape.num_axes() as usize, 1),
            Part::Composite(composite) => (
                composite.num_total_axes() as usize,
                (composite.num_total_parts() as usize).max(1),
            ),
        };
        let mut part_coords = CoordVec::new();
        part_coords.resize_and_fill(axis_len, 0.0);
        for (slot, value) in part_coords.as_mut_slice().iter_mut().zip(coords.iter()) {
            *slot = value.to_f32();
        }
        let mut transforms = TransformVec::new();
        transforms.resize_and_fill(transform_len, Transform::IDENTITY);
        transforms[0] = transform;
        let mut segments = SegmentVec::new();
        let mut guard = RecursionGuard::new();
        self.draw_part(
            &part,
            glyph_id.to_u32(),
            part_coords.as_mut_slice(),
            transforms.as_mut_slice(),
            &mut segments,
            &mut guard,
            pen,
        );
        true
    }

    /// Computes extents for a glyph by folding its outline into a bounding
    /// rectangle.
    pub fn extents(
        &self,
        glyph_id: GlyphId,
        coords: &[F2Dot14],
        transform: Transform,
    ) -> Option<GlyphExtents> {
        let mut pen = BoundsPen::new();
        self.draw(glyph_id, coords, transform, &mut pen)
            .then(|| pen.bounds().into())
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_part(
        &self,
        part: &Part<'a>,
        part_index: u32,
        coords: &mut [f32],
        transforms: &mut [Transform],
        segments: &mut SegmentVec,
        guard: &mut RecursionGuard,
        pen: &mut dyn OutlinePen,
    ) {
        match guard.enter(part_index) {
            Visit::Entered => {}
            Visit::Revisit | Visit::Exhausted => return,
        }
        match part {
            Part::Shape(shape) => self.draw_shape_part(shape, coords, transforms, segments, pen),
            Part::Composite(composite) => {
                self.draw_composite_part(composite, coords, transforms, segments, guard, pen)
            }
        }
        guard.leave();
    }

    /// Draws a shape part: loads the master coordinates, accumulates the
    /// active delta columns, resolves blend types one path at a time, then
    /// emits each path as a quadratic contour.
    fn draw_shape_part(
        &self,
        shape: &ShapePart<'a>,
        coords: &mut [f32],
        transforms: &mut [Transform],
        segments: &mut SegmentVec,
        pen: &mut dyn OutlinePen,
    ) {
        let total = shape.num_segments() as usize;
        if total == 0 {
            return;
        }
        let Some(transform) = transforms.first().copied() else {
            return;
        };
        let Some(shape_coords) = coords.get(..shape.num_axes() as usize) else {
            return;
        };
        segments.resize_and_fill(total, Segment::default());
        for (segment, values) in segments
            .as_mut_slice()
            .iter_mut()
            .zip(shape.master_coords().chunks_exact(4))
        {
            *segment = Segment::from_coords(values);
        }
        for (axis, coord) in shape_coords.iter().copied().enumerate() {
            if coord == 0.0 {
                continue;
            }
            let column_ix = axis * 2 + (coord > 0.0) as usize;
            let Some(column) = shape.delta_column(column_ix) else {
                continue;
            };
            let scalar = coord.abs() as f64;
            for (segment, delta) in segments
                .as_mut_slice()
                .iter_mut()
                .zip(column.chunks_exact(4))
            {
                segment.on_curve_x += delta[0].get() * scalar;
                segment.on_curve_y += delta[1].get() * scalar;
                segment.off_curve_x += delta[2].get() * scalar;
                segment.off_curve_y += delta[3].get() * scalar;
            }
        }

        let blend_types = shape.blend_types();
        let mut start = 0usize;
        for path_size in shape.path_sizes() {
            let end = start + path_size.get() as usize;
            if end > total {
                break;
            }
            if end - start < 2 {
                start = end;
                continue;
            }
            // Resolve blend types in place; off-curve points never move, so
            // earlier resolutions feed later ones only through the on-curve
            // slots the tangent pair writes.
            for i in start..end {
                let Some(blend) = CoordBlendType::new(blend_types[i]) else {
                    return;
                };
                let prev_ix = if i == start { end - 1 } else { i - 1 };
                let next_ix = if i == end - 1 { start } else { i + 1 };
                match blend {
                    CoordBlendType::Corner | CoordBlendType::TangentPairSecond => {}
                    CoordBlendType::Curve => {
                        let prev = segments[prev_ix];
                        let segment = &mut segments.as_mut_slice()[i];
                        let t = segment.on_curve_x.clamp(0.0, 1.0);
                        segment.on_curve_x =
                            prev.off_curve_x + (segment.off_curve_x - prev.off_curve_x) * t;
                        segment.on_curve_y =
                            prev.off_curve_y + (segment.off_curve_y - prev.off_curve_y) * t;
                    }
                    CoordBlendType::Tangent => {
                        let prev = segments[prev_ix];
                        let segment = segments[i];
                        segments.as_mut_slice()[i] = segment.projected_onto(&prev, &segment);
                    }
                    CoordBlendType::TangentPairFirst => {
                        let prev = segments[prev_ix];
                        let next = segments[next_ix];
                        let current = segments[i];
                        segments.as_mut_slice()[i] = current.projected_onto(&prev, &next);
                        segments.as_mut_slice()[next_ix] = next.projected_onto(&prev, &next);
                    }
                }
            }
            let first = segments[start];
            let (x, y) =
                transform.transform_point(first.on_curve_x as f32, first.on_curve_y as f32);
            pen.move_to(x, y);
            for i in start..end {
                let segment = segments[i];
                let next = segments[if i == end - 1 { start } else { i + 1 }];
                let (cx, cy) = transform
                    .transform_point(segment.off_curve_x as f32, segment.off_curve_y as f32);
                let (x, y) =
                    transform.transform_point(next.on_curve_x as f32, next.on_curve_y as f32);
                pen.quad_to(cx, cy, x, y);
            }
            pen.close();
            start = end;
        }
    }

    /// Draws a composite part: derives the child-axis coordinates, applies
    /// the sparse transform deltas to the child slots, then recurses into
    /// each sub-part with the coordinate and transform tail slices.
    #[allow(clippy::too_many_arguments)]
    fn draw_composite_part(
        &self,
        composite: &CompositePart<'a>,
        coords: &mut [f32],
        transforms: &mut [Transform],
        segments: &mut SegmentVec,
        guard: &mut RecursionGuard,
        pen: &mut dyn OutlinePen,
    ) {
        let total_axes = (composite.num_total_axes() as usize).min(coords.len());
        let coords = &mut coords[..total_axes];
        let Some((own_coords, child_coords)) =
            coords.split_at_mut_checked(composite.num_direct_axes() as usize)
        else {
            return;
        };
        apply_axis_value_deltas(composite, child_coords, own_coords);

        let total_parts = (composite.num_total_parts() as usize).min(transforms.len());
        let transforms = &mut transforms[..total_parts];
        let Some((enclosing, child_transforms)) = transforms.split_first_mut() else {
            return;
        };
        apply_sub_transforms(composite, child_transforms, own_coords);

        for sub_part in composite.sub_parts() {
            let Ok(Some(part)) = self.hvgl.part(sub_part.part_index) else {
                continue;
            };
            let Some(sub_coords) = child_coords.get_mut(sub_part.tree_axis_index as usize..)
            else {
                continue;
            };
            let Some(slot) = child_transforms.get_mut(sub_part.tree_transform_index as usize)
            else {
                continue;
            };
            *slot = enclosing.compose(slot);
            let Some(sub_transforms) =
                child_transforms.get_mut(sub_part.tree_transform_index as usize..)
            else {
                continue;
            };
            self.draw_part(
                &part,
                sub_part.part_index,
                sub_coords,
                sub_transforms,
                segments,
                guard,
                pen,
            );
        }
    }
}

/// Adds the composite's sparse master and extremum axis-value deltas to the
/// child-axis coordinates.
fn apply_axis_value_deltas(part: &CompositePart, out_coords: &mut [f32], coords: &[f32]) {
    for (row, delta) in part
        .master_value_rows()
        .iter()
        .zip(part.master_axis_value_deltas())
    {
        let Some(slot) = out_coords.get_mut(row.get() as usize) else {
            continue;
        };
        *slot += delta.get();
    }
    let starts = part.column_starts();
    let rows = part.extremum_value_rows();
    let deltas = part.extremum_axis_value_deltas();
    for (axis, coord) in coords.iter().copied().enumerate() {
        if coord == 0.0 {
            continue;
        }
        let column = axis * 2 + (coord > 0.0) as usize;
        let (Some(start), Some(end)) = (starts.get(column), starts.get(column + 1)) else {
            break;
        };
        let scalar = coord.abs();
        let end = (end.get() as usize).min(rows.len()).min(deltas.len());
        for ix in start.get() as usize..end {
            let Some(slot) = out_coords.get_mut(rows[ix].get() as usize) else {
                continue;
            };
            *slot += deltas[ix].get() * scalar;
        }
    }
}

/// Applies the composite's sparse transform deltas to the child transform
/// slots.
///
/// Each row accumulates `translate(masterΔ) · rotate(masterΔrot)` followed
/// by the scaled extremum transforms in column order; translation and
/// rotation entries for the same cell are merged before scaling.
fn apply_sub_transforms(part: &CompositePart, transforms: &mut [Transform], coords: &[f32]) {
    let master_t_rows = part.master_translation_rows();
    let master_t_deltas = part.master_translation_deltas();
    let master_r_rows = part.master_rotation_rows();
    let master_r_deltas = part.master_rotation_deltas();
    let extremum_t_indices = part.extremum_translation_indices();
    let extremum_t_deltas = part.extremum_translation_deltas();
    let extremum_r_indices = part.extremum_rotation_indices();
    let extremum_r_deltas = part.extremum_rotation_deltas();
    let column_limit = coords.len() * 2;

    let (mut mt, mut mr, mut et, mut er) = (0usize, 0usize, 0usize, 0usize);
    for (row, slot) in transforms.iter_mut().enumerate() {
        let mut transform = Transform::IDENTITY;
        if master_t_rows.get(mt).map(|r| r.get() as usize) == Some(row) {
            if let Some(delta) = master_t_deltas.get(mt) {
                transform = transform.translate(delta.x(), delta.y());
            }
            mt += 1;
        }
        if master_r_rows.get(mr).map(|r| r.get() as usize) == Some(row) {
            if let Some(delta) = master_r_deltas.get(mr) {
                if delta.get() != 0.0 {
                    transform = transform.rotate(delta.get());
                }
            }
            mr += 1;
        }

        let et_end = run_end(extremum_t_indices, et, row);
        let er_end = run_end(extremum_r_indices, er, row);
        let (mut ti, mut ri) = (et, er);
        while ti < et_end || ri < er_end {
            let mut column = column_limit;
            if ti < et_end {
                column = column.min(extremum_t_indices[ti].column() as usize);
            }
            if ri < er_end {
                column = column.min(extremum_r_indices[ri].column() as usize);
            }
            if column >= column_limit {
                break;
            }
            let mut translation = (0.0f32, 0.0f32);
            let mut rotation = 0.0f32;
            if ti < et_end && extremum_t_indices[ti].column() as usize == column {
                if let Some(delta) = extremum_t_deltas.get(ti) {
                    translation = (delta.x(), delta.y());
                }
                ti += 1;
            }
            if ri < er_end && extremum_r_indices[ri].column() as usize == column {
                if let Some(delta) = extremum_r_deltas.get(ri) {
                    rotation = delta.get();
                }
                ri += 1;
            }
            let coord = coords[column / 2];
            if coord == 0.0 {
                continue;
            }
            let positive = column & 1 == 1;
            if positive != (coord > 0.0) {
                continue;
            }
            let scalar = coord.abs();
            transform = transform.compose(&scaled_extremum_transform(translation, rotation, scalar));
        }
        et = et_end;
        er = er_end;

        *slot = slot.compose(&transform);
    }
}

fn run_end(indices: &[raw::tables::hvgl::ExtremumIndex], start: usize, row: usize) -> usize {
    let mut end = start;
    while indices.get(end).map(|ix| ix.row() as usize) == Some(row) {
        end += 1;
    }
    end
}

/// The extremum transform scaled by the axis coordinate.
///
/// A rotating delta is rescaled around its complex fixed point
/// `t / (1 - e^{iφ})` so that partial coordinates interpolate the rotation
/// rather than the matrix; a pure translation just scales.
fn scaled_extremum_transform(translation: (f32, f32), rotation: f32, scalar: f32) -> Transform {
    let (s, c) = rotation.sin_cos();
    let re = 1.0 - c;
    let im = -s;
    let denom = re * re + im * im;
    if denom != 0.0 {
        let eigen_x = (translation.0 * re + translation.1 * im) / denom;
        let eigen_y = (translation.1 * re - translation.0 * im) / denom;
        // a rotation around the fixed point; the decomposed form carries
        // its angle as a fraction of pi
        Transform::from_decomposed(
            0.0,
            0.0,
            rotation * scalar / core::f32::consts::PI,
            1.0,
            None,
            0.0,
            0.0,
            eigen_x,
            eigen_y,
        )
    } else {
        Transform::IDENTITY.translate(translation.0 * scalar, translation.1 * scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::pen::PathElement;
    use raw::test_helpers::BeBuffer;
    use raw::FontRead;

    fn coord(value: f32) -> F2Dot14 {
        F2Dot14::from_f32(value)
    }

    fn shape_part_bytes(
        num_axes: u16,
        path_sizes: &[u16],
        blend_types: &[u8],
        coords: &[f64],
        deltas: &[f64],
    ) -> Vec<u8> {
        let num_segments: u16 = path_sizes.iter().sum();
        let mut buf = BeBuffer::new()
            .push(0u16)
            .push(num_axes)
            .push(path_sizes.len() as u16)
            .push(num_segments)
            .extend(path_sizes.iter().copied())
            .push_bytes(blend_types)
            .pad_to(8);
        for value in coords.iter().chain(deltas) {
            buf = buf.push_bytes(&value.to_le_bytes());
        }
        buf.pad_to(8).as_slice().to_vec()
    }

    #[derive(Default)]
    struct CompositeParams {
        num_direct_axes: u16,
        num_total_axes: u16,
        num_total_parts: u16,
        sub_parts: Vec<(u32, u16, u16)>,
        master_translations: Vec<(u16, f32, f32)>,
        extremum_translations: Vec<(u16, u16, f32, f32)>,
        master_rotations: Vec<(u16, f32)>,
        extremum_rotations: Vec<(u16, u16, f32)>,
        master_axis_values: Vec<(u16, f32)>,
        // per column, the (row, delta) entries
        extremum_axis_values: Vec<Vec<(u16, f32)>>,
    }

    fn composite_part_bytes(params: &CompositeParams) -> Vec<u8> {
        let column_count = params.num_direct_axes as usize * 2;
        let extremum_axis_values: Vec<(u16, f32)> = params
            .extremum_axis_values
            .iter()
            .flatten()
            .copied()
            .collect();
        let mut column_starts = Vec::with_capacity(column_count + 1);
        let mut next = 0u16;
        for column in 0..column_count {
            column_starts.push(next);
            next += params
                .extremum_axis_values
                .get(column)
                .map(|entries| entries.len() as u16)
                .unwrap_or_default();
        }
        column_starts.push(next);

        let align8 = |n: usize| (n + 7) & !7;
        let sub_parts_start = align8(30);
        let ecs_start = align8(sub_parts_start + params.sub_parts.len() * 8);
        let mut ecs_len = column_starts.len() * 2
            + extremum_axis_values.len() * 2
            + params.master_axis_values.len() * 2;
        ecs_len = ((ecs_start + ecs_len + 3) & !3) - ecs_start;
        ecs_len += params.master_axis_values.len() * 4 + extremum_axis_values.len() * 4;
        let translations_start = align8(ecs_start + ecs_len);
        let translations_len = params.master_translations.len() * 8
            + params.extremum_translations.len() * 8
            + params.extremum_translations.len() * 4
            + params.master_translations.len() * 2;
        let rotations_start = align8(translations_start + translations_len);

        let mut buf = BeBuffer::new()
            .push(1u16) // composite flag
            .push(params.num_direct_axes)
            .push(params.num_total_axes)
            .push(params.num_total_parts)
            .push(params.sub_parts.len() as u16)
            .push(params.master_translations.len() as u16)
            .push(params.extremum_translations.len() as u16)
            .push(params.master_rotations.len() as u16)
            .push(params.extremum_rotations.len() as u16)
            .push(params.master_axis_values.len() as u16)
            .push(extremum_axis_values.len() as u16)
            .push((sub_parts_start / 8) as u16)
            .push((ecs_start / 8) as u16)
            .push((translations_start / 8) as u16)
            .push((rotations_start / 8) as u16)
            .pad_to(8);
        for (part_index, transform_ix, axis_ix) in &params.sub_parts {
            buf = buf.push(*part_index).push(*transform_ix).push(*axis_ix);
        }
        buf = buf.pad_to(8);
        assert_eq!(buf.len(), ecs_start);
        buf = buf.extend(column_starts.iter().copied());
        buf = buf.extend(extremum_axis_values.iter().map(|(row, _)| *row));
        buf = buf.extend(params.master_axis_values.iter().map(|(row, _)| *row));
        buf = buf.pad_to(4);
        for (_, delta) in &params.master_axis_values {
            buf = buf.push_bytes(&delta.to_le_bytes());
        }
        for (_, delta) in &extremum_axis_values {
            buf = buf.push_bytes(&delta.to_le_bytes());
        }
        buf = buf.pad_to(8);
        assert_eq!(buf.len(), translations_start);
        for (_, x, y) in &params.master_translations {
            buf = buf.push_bytes(&x.to_le_bytes()).push_bytes(&y.to_le_bytes());
        }
        for (_, _, x, y) in &params.extremum_translations {
            buf = buf.push_bytes(&x.to_le_bytes()).push_bytes(&y.to_le_bytes());
        }
        for (row, column, _, _) in &params.extremum_translations {
            buf = buf.push(*row).push(*column);
        }
        buf = buf.extend(params.master_translations.iter().map(|(row, _, _)| *row));
        buf = buf.pad_to(8);
        assert_eq!(buf.len(), rotations_start);
        for (_, delta) in &params.master_rotations {
            buf = buf.push_bytes(&delta.to_le_bytes());
        }
        for (_, _, delta) in &params.extremum_rotations {
            buf = buf.push_bytes(&delta.to_le_bytes());
        }
        for (row, column, _) in &params.extremum_rotations {
            buf = buf.push(*row).push(*column);
        }
        buf = buf.extend(params.master_rotations.iter().map(|(row, _)| *row));
        buf.pad_to(8).as_slice().to_vec()
    }

    fn hvgl_table(num_glyphs: u32, parts: &[Vec<u8>]) -> Vec<u8> {
        let align8 = |n: usize| (n + 7) & !7;
        let mut offset = align8(12 + (parts.len() + 1) * 4);
        let mut offsets = Vec::new();
        for part in parts {
            offsets.push(offset as u32);
            offset += part.len();
        }
        offsets.push(offset as u32);
        let mut buf = BeBuffer::new()
            .push(1u16)
            .push(0u16)
            .push(num_glyphs)
            .push(parts.len() as u32)
            .extend(offsets)
            .pad_to(8);
        for part in parts {
            buf = buf.push_bytes(part);
        }
        buf.as_slice().to_vec()
    }

    /// A 100-unit square: on-curve points at the corners, off-curve points
    /// at the edge midpoints.
    fn square_coords() -> Vec<f64> {
        vec![
            0.0, 0.0, 50.0, 0.0, // segment 0
            100.0, 0.0, 100.0, 50.0, // segment 1
            100.0, 100.0, 50.0, 100.0, // segment 2
            0.0, 100.0, 0.0, 50.0, // segment 3
        ]
    }

    fn draw(table: &[u8], gid: u32, coords: &[F2Dot14]) -> Vec<PathElement> {
        let hvgl = Hvgl::read(raw::FontData::new(table)).unwrap();
        let outlines = Outlines::new(hvgl);
        let mut elements: Vec<PathElement> = Vec::new();
        assert!(outlines.draw(
            GlyphId::new(gid),
            coords,
            crate::transform::Transform::IDENTITY,
            &mut elements
        ));
        elements
    }

    fn on_curve_points(elements: &[PathElement]) -> Vec<(f32, f32)> {
        let mut points = Vec::new();
        for element in elements {
            match element {
                PathElement::MoveTo { x, y } => points.push((*x, *y)),
                PathElement::QuadTo { x, y, .. } => points.push((*x, *y)),
                _ => {}
            }
        }
        points
    }

    fn assert_points_close(actual: &[(f32, f32)], expected: &[(f32, f32)]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!(
                (a.0 - e.0).abs() < 1e-3 && (a.1 - e.1).abs() < 1e-3,
                "{a:?} != {e:?} in {actual:?}"
            );
        }
    }

    #[test]
    fn corner_square_draws_one_contour() {
        let part = shape_part_bytes(0, &[4], &[1; 4], &square_coords(), &[]);
        let table = hvgl_table(1, &[part]);
        let elements = draw(&table, 0, &[]);
        assert_eq!(elements.len(), 6); // move, four quads, close
        assert!(matches!(elements[0], PathElement::MoveTo { x, y } if x == 0.0 && y == 0.0));
        assert!(matches!(elements[5], PathElement::Close));
        assert_points_close(
            &on_curve_points(&elements),
            &[
                (0.0, 0.0),
                (100.0, 0.0),
                (100.0, 100.0),
                (0.0, 100.0),
                (0.0, 0.0),
            ],
        );
    }

    #[test]
    fn positive_axis_selects_positive_delta_column() {
        // one axis: 16 values per column, negative column first. The
        // positive column doubles every x; the negative column is zero.
        let mut deltas = vec![0.0; 32];
        let coords = square_coords();
        for (i, chunk) in coords.chunks_exact(4).enumerate() {
            deltas[16 + i * 4] = chunk[0]; // on-curve x
            deltas[16 + i * 4 + 2] = chunk[2]; // off-curve x
        }
        let part = shape_part_bytes(1, &[4], &[1; 4], &coords, &deltas);
        let table = hvgl_table(1, &[part]);
        let elements = draw(&table, 0, &[coord(1.0)]);
        assert_points_close(
            &on_curve_points(&elements),
            &[
                (0.0, 0.0),
                (200.0, 0.0),
                (200.0, 100.0),
                (0.0, 100.0),
                (0.0, 0.0),
            ],
        );
        // a negative coordinate reads the (zero) negative column
        let elements = draw(&table, 0, &[coord(-1.0)]);
        assert_points_close(
            &on_curve_points(&elements),
            &[
                (0.0, 0.0),
                (100.0, 0.0),
                (100.0, 100.0),
                (0.0, 100.0),
                (0.0, 0.0),
            ],
        );
        // half-way, half the delta
        let elements = draw(&table, 0, &[coord(0.5)]);
        assert_points_close(
            &on_curve_points(&elements),
            &[
                (0.0, 0.0),
                (150.0, 0.0),
                (150.0, 100.0),
                (0.0, 100.0),
                (0.0, 0.0),
            ],
        );
    }

    #[test]
    fn curve_blend_interpolates_between_off_curves() {
        // a triangle of three curve segments; each stored on-curve x is the
        // interpolation factor
        let coords = vec![
            0.5, 0.0, 100.0, 0.0, // segment 0: midpoint of prev/this off-curves
            0.0, 0.0, 100.0, 100.0, // segment 1: at prev off-curve
            1.0, 0.0, 0.0, 100.0, // segment 2: at this off-curve
        ];
        let part = shape_part_bytes(0, &[3], &[0; 3], &coords, &[]);
        let table = hvgl_table(1, &[part]);
        let elements = draw(&table, 0, &[]);
        // segment 0 blends between segment 2's off-curve (0, 100) and its
        // own (100, 0); factor 0.5 gives (50, 50)
        assert_points_close(
            &on_curve_points(&elements),
            &[
                (50.0, 50.0),
                (100.0, 0.0), // factor 0: prev off-curve
                (0.0, 100.0), // factor 1: own off-curve
                (50.0, 50.0),
            ],
        );
    }

    #[test]
    fn tangent_blend_projects_onto_off_curve_line() {
        let coords = vec![
            0.0, 0.0, 0.0, 100.0, // segment 0, corner
            // segment 1's on-curve projects onto the line from (0, 100) to
            // (200, 100)
            70.0, 0.0, 200.0, 100.0,
            0.0, -50.0, 100.0, -50.0, // segment 2, corner
        ];
        let part = shape_part_bytes(0, &[3], &[1, 2, 1], &coords, &[]);
        let table = hvgl_table(1, &[part]);
        let elements = draw(&table, 0, &[]);
        assert_points_close(
            &on_curve_points(&elements),
            &[
                (0.0, 0.0),
                (70.0, 100.0),
                (0.0, -50.0),
                (0.0, 0.0),
            ],
        );
    }

    #[test]
    fn unknown_blend_type_aborts_part() {
        let part = shape_part_bytes(0, &[4], &[1, 1, 9, 1], &square_coords(), &[]);
        let table = hvgl_table(1, &[part]);
        assert!(draw(&table, 0, &[]).is_empty());
    }

    #[test]
    fn short_paths_are_skipped() {
        let mut coords = square_coords();
        coords.extend([7.0, 7.0, 9.0, 9.0]);
        let part = shape_part_bytes(0, &[4, 1], &[1, 1, 1, 1, 1], &coords, &[]);
        let table = hvgl_table(1, &[part]);
        let elements = draw(&table, 0, &[]);
        // only the square is drawn; the one-segment path contributes nothing
        assert_eq!(elements.len(), 6);
    }

    #[test]
    fn composite_places_two_sub_parts() {
        let square = shape_part_bytes(0, &[4], &[1; 4], &square_coords(), &[]);
        let params = CompositeParams {
            num_direct_axes: 0,
            num_total_axes: 0,
            num_total_parts: 3,
            sub_parts: vec![(1, 0, 0), (1, 1, 0)],
            master_translations: vec![(0, 200.0, 0.0), (1, -200.0, 0.0)],
            ..Default::default()
        };
        let composite = composite_part_bytes(&params);
        let table = hvgl_table(1, &[composite, square]);
        let elements = draw(&table, 0, &[]);
        assert_eq!(elements.len(), 12);
        let points = on_curve_points(&elements);
        assert_points_close(&points[..2], &[(200.0, 0.0), (300.0, 0.0)]);
        assert_points_close(&points[5..7], &[(-200.0, 0.0), (-100.0, 0.0)]);
    }

    #[test]
    fn composite_extremum_translation_scales_with_coord() {
        let square = shape_part_bytes(0, &[4], &[1; 4], &square_coords(), &[]);
        let params = CompositeParams {
            num_direct_axes: 1,
            num_total_axes: 1,
            num_total_parts: 2,
            sub_parts: vec![(1, 0, 0)],
            // positive column of axis 0 moves the slot by (50, 0)
            extremum_translations: vec![(0, 1, 50.0, 0.0)],
            extremum_axis_values: vec![Vec::new(), Vec::new()],
            ..Default::default()
        };
        let composite = composite_part_bytes(&params);
        let table = hvgl_table(1, &[composite, square]);
        let at = |c: f32| on_curve_points(&draw(&table, 0, &[coord(c)]))[0];
        assert_points_close(&[at(0.0)], &[(0.0, 0.0)]);
        assert_points_close(&[at(1.0)], &[(50.0, 0.0)]);
        assert_points_close(&[at(0.5)], &[(25.0, 0.0)]);
        // the negative direction has no entries
        assert_points_close(&[at(-1.0)], &[(0.0, 0.0)]);
    }

    #[test]
    fn composite_extremum_rotation_spins_sub_part() {
        let square = shape_part_bytes(0, &[4], &[1; 4], &square_coords(), &[]);
        let params = CompositeParams {
            num_direct_axes: 1,
            num_total_axes: 1,
            num_total_parts: 2,
            sub_parts: vec![(1, 0, 0)],
            extremum_rotations: vec![(0, 1, core::f32::consts::FRAC_PI_2)],
            extremum_axis_values: vec![Vec::new(), Vec::new()],
            ..Default::default()
        };
        let composite = composite_part_bytes(&params);
        let table = hvgl_table(1, &[composite, square]);
        // a quarter turn about the origin maps (100, 0) to (0, 100)
        let points = on_curve_points(&draw(&table, 0, &[coord(1.0)]));
        assert_points_close(&points[..3], &[(0.0, 0.0), (0.0, 100.0), (-100.0, 100.0)]);
        // at half coordinate the rotation interpolates to an eighth turn
        let points = on_curve_points(&draw(&table, 0, &[coord(0.5)]));
        let expected = (100.0f32 / 2.0f32.sqrt(), 100.0 / 2.0f32.sqrt());
        assert_points_close(&points[1..2], &[expected]);
    }

    #[test]
    fn composite_axis_values_feed_child_axes() {
        // the child square doubles its x extent on its own axis; the
        // composite's extremum axis values drive that axis from its own
        let coords = square_coords();
        let mut deltas = vec![0.0; 32];
        for (i, chunk) in coords.chunks_exact(4).enumerate() {
            deltas[16 + i * 4] = chunk[0];
            deltas[16 + i * 4 + 2] = chunk[2];
        }
        let square = shape_part_bytes(1, &[4], &[1; 4], &coords, &deltas);
        let params = CompositeParams {
            num_direct_axes: 1,
            num_total_axes: 2,
            num_total_parts: 2,
            sub_parts: vec![(1, 0, 0)],
            // positive column of the composite axis drives child axis 0
            extremum_axis_values: vec![Vec::new(), vec![(0, 1.0)]],
            ..Default::default()
        };
        let composite = composite_part_bytes(&params);
        let table = hvgl_table(1, &[composite, square]);
        let points = on_curve_points(&draw(&table, 0, &[coord(1.0)]));
        assert_points_close(&points[1..2], &[(200.0, 0.0)]);
        let points = on_curve_points(&draw(&table, 0, &[coord(0.0)]));
        assert_points_close(&points[1..2], &[(100.0, 0.0)]);
    }

    #[test]
    fn part_cycle_terminates() {
        // a composite whose sub-part is itself
        let params = CompositeParams {
            num_direct_axes: 0,
            num_total_axes: 0,
            num_total_parts: 2,
            sub_parts: vec![(0, 0, 0)],
            ..Default::default()
        };
        let composite = composite_part_bytes(&params);
        let table = hvgl_table(1, &[composite]);
        assert!(draw(&table, 0, &[]).is_empty());
    }
}
