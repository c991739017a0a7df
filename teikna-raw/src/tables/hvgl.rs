//! The `hvgl` part table: shape parts holding quadratic contours and
//! composite parts assembling transformed sub-parts.
//!
//! Integer fields are big-endian like the rest of the font; the coordinate
//! and delta blocks are little-endian floats and are read through the
//! [`F64Le`]/[`F32Le`] wrappers.

use font_types::{BigEndian, GlyphId};

use crate::{FontData, FontRead, ReadError};

/// A 64-bit little-endian float, as stored in shape coordinate blocks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(transparent)]
pub struct F64Le([u8; 8]);

impl F64Le {
    pub fn new(value: f64) -> Self {
        Self(value.to_le_bytes())
    }

    pub fn get(self) -> f64 {
        f64::from_le_bytes(self.0)
    }
}

// SAFETY: a transparent wrapper over a byte array; any bit pattern is a
// valid value and there is no padding.
unsafe impl bytemuck::Zeroable for F64Le {}
unsafe impl bytemuck::AnyBitPattern for F64Le {}

/// A 32-bit little-endian float, as stored in composite delta blocks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(transparent)]
pub struct F32Le([u8; 4]);

impl F32Le {
    pub fn new(value: f32) -> Self {
        Self(value.to_le_bytes())
    }

    pub fn get(self) -> f32 {
        f32::from_le_bytes(self.0)
    }
}

// SAFETY: as for F64Le.
unsafe impl bytemuck::Zeroable for F32Le {}
unsafe impl bytemuck::AnyBitPattern for F32Le {}

/// A sparse translation delta for one child transform slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct TranslationDelta {
    x: F32Le,
    y: F32Le,
}

impl TranslationDelta {
    pub fn x(&self) -> f32 {
        self.x.get()
    }

    pub fn y(&self) -> f32 {
        self.y.get()
    }
}

// SAFETY: two transparent four-byte wrappers with no padding.
unsafe impl bytemuck::Zeroable for TranslationDelta {}
unsafe impl bytemuck::AnyBitPattern for TranslationDelta {}

/// Addresses one cell of a sparse delta matrix: a child transform slot row
/// and an axis-sign column.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct ExtremumIndex {
    row: BigEndian<u16>,
    column: BigEndian<u16>,
}

impl ExtremumIndex {
    pub fn row(&self) -> u16 {
        self.row.get()
    }

    pub fn column(&self) -> u16 {
        self.column.get()
    }
}

// SAFETY: two transparent two-byte wrappers with no padding.
unsafe impl bytemuck::Zeroable for ExtremumIndex {}
unsafe impl bytemuck::AnyBitPattern for ExtremumIndex {}

/// How a segment's on-curve point is derived from its stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordBlendType {
    Curve,
    Corner,
    Tangent,
    TangentPairFirst,
    TangentPairSecond,
}

impl CoordBlendType {
    pub fn new(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Curve),
            1 => Some(Self::Corner),
            2 => Some(Self::Tangent),
            3 => Some(Self::TangentPairFirst),
            4 => Some(Self::TangentPairSecond),
            _ => None,
        }
    }
}

/// The `hvgl` table.
#[derive(Clone)]
pub struct Hvgl<'a> {
    data: FontData<'a>,
    num_glyphs: u32,
    offsets: &'a [BigEndian<u32>],
}

impl<'a> FontRead<'a> for Hvgl<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let major_version: u16 = data.read_at(0)?;
        if major_version != 1 {
            return Err(ReadError::InvalidFormat(major_version as _));
        }
        let num_glyphs: u32 = data.read_at(4)?;
        let num_parts: u32 = data.read_at(8)?;
        if num_glyphs > num_parts {
            return Err(ReadError::MalformedData("more glyphs than parts"));
        }
        let offsets = data.read_array(12..12 + (num_parts as usize + 1) * 4)?;
        Ok(Self {
            data,
            num_glyphs,
            offsets,
        })
    }
}

impl<'a> Hvgl<'a> {
    /// The number of glyph-addressable parts.
    pub fn num_glyphs(&self) -> u32 {
        self.num_glyphs
    }

    /// The total number of parts, including interior sub-parts.
    pub fn num_parts(&self) -> u32 {
        self.offsets.len().saturating_sub(1) as u32
    }

    /// Fetch the part at the given part index. This does not necessarily
    /// have to be a glyph id. An out of range index yields `None`.
    pub fn part(&self, index: u32) -> Result<Option<Part<'a>>, ReadError> {
        let index = index as usize;
        let (Some(start), Some(end)) = (self.offsets.get(index), self.offsets.get(index + 1))
        else {
            return Ok(None);
        };
        let data = self
            .data
            .slice(start.get() as usize..end.get() as usize)
            .ok_or(ReadError::OutOfBounds)?;
        Part::read(data).map(Some)
    }

    /// Fetch a part for a given glyph id. Returns `None` when the glyph is
    /// outside the range of glyph-addressable parts.
    pub fn glyph_part(&self, glyph_id: GlyphId) -> Result<Option<Part<'a>>, ReadError> {
        if glyph_id.to_u32() >= self.num_glyphs {
            return Ok(None);
        }
        self.part(glyph_id.to_u32())
    }
}

/// Flag bit distinguishing composite parts from shape parts.
const PART_IS_COMPOSITE: u16 = 0x0001;

#[derive(Clone)]
pub enum Part<'a> {
    Shape(ShapePart<'a>),
    Composite(CompositePart<'a>),
}

impl<'a> FontRead<'a> for Part<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let flags: u16 = data.read_at(0)?;
        if flags & PART_IS_COMPOSITE != 0 {
            CompositePart::read(data).map(Self::Composite)
        } else {
            ShapePart::read(data).map(Self::Shape)
        }
    }
}

fn align8(offset: usize) -> usize {
    (offset + 7) & !7
}

/// A leaf part: explicit quadratic contours plus a per-axis delta matrix.
#[derive(Clone)]
pub struct ShapePart<'a> {
    num_axes: u16,
    num_segments: u16,
    path_sizes: &'a [BigEndian<u16>],
    blend_types: &'a [u8],
    coords: &'a [F64Le],
    deltas: &'a [F64Le],
}

impl<'a> FontRead<'a> for ShapePart<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let num_axes: u16 = data.read_at(2)?;
        let num_paths: u16 = data.read_at(4)?;
        let num_segments: u16 = data.read_at(6)?;
        let paths_start = 8;
        let blend_start = paths_start + num_paths as usize * 2;
        let coords_start = align8(blend_start + num_segments as usize);
        let coords_len = num_segments as usize * 4;
        let deltas_start = coords_start + coords_len * 8;
        let deltas_len = num_axes as usize * 2 * coords_len;
        let path_sizes = data.read_array(paths_start..blend_start)?;
        let blend_types = data.read_array(blend_start..blend_start + num_segments as usize)?;
        let coords = data.read_array(coords_start..deltas_start)?;
        let deltas = data.read_array(deltas_start..deltas_start + deltas_len * 8)?;
        Ok(Self {
            num_axes,
            num_segments,
            path_sizes,
            blend_types,
            coords,
            deltas,
        })
    }
}

impl<'a> ShapePart<'a> {
    pub fn num_axes(&self) -> u16 {
        self.num_axes
    }

    pub fn num_segments(&self) -> u16 {
        self.num_segments
    }

    /// Segment counts per path, in drawing order.
    pub fn path_sizes(&self) -> &'a [BigEndian<u16>] {
        self.path_sizes
    }

    pub fn blend_types(&self) -> &'a [u8] {
        self.blend_types
    }

    /// The master coordinate vector: four values per segment
    /// `(on_x, on_y, off_x, off_y)`.
    pub fn master_coords(&self) -> &'a [F64Le] {
        self.coords
    }

    /// One column of the delta matrix: a full coordinate delta vector.
    ///
    /// Column `2 * axis` holds the negative direction, `2 * axis + 1` the
    /// positive one.
    pub fn delta_column(&self, column: usize) -> Option<&'a [F64Le]> {
        let rows = self.num_segments as usize * 4;
        self.deltas.get(column * rows..(column + 1) * rows)
    }
}

/// An interior part: sub-part references plus sparse per-axis translation,
/// rotation and axis-value deltas.
#[derive(Clone)]
pub struct CompositePart<'a> {
    num_direct_axes: u16,
    num_total_axes: u16,
    num_total_parts: u16,
    sub_parts: &'a [u8],
    column_starts: &'a [BigEndian<u16>],
    extremum_value_rows: &'a [BigEndian<u16>],
    master_value_rows: &'a [BigEndian<u16>],
    master_axis_value_deltas: &'a [F32Le],
    extremum_axis_value_deltas: &'a [F32Le],
    master_translation_deltas: &'a [TranslationDelta],
    extremum_translation_deltas: &'a [TranslationDelta],
    extremum_translation_indices: &'a [ExtremumIndex],
    master_translation_rows: &'a [BigEndian<u16>],
    master_rotation_deltas: &'a [F32Le],
    extremum_rotation_deltas: &'a [F32Le],
    extremum_rotation_indices: &'a [ExtremumIndex],
    master_rotation_rows: &'a [BigEndian<u16>],
}

/// Byte size of one serialized sub-part record.
const SUB_PART_LEN: usize = 8;

impl<'a> FontRead<'a> for CompositePart<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let num_direct_axes: u16 = data.read_at(2)?;
        let num_total_axes: u16 = data.read_at(4)?;
        let num_total_parts: u16 = data.read_at(6)?;
        let sub_part_count: u16 = data.read_at(8)?;
        let master_translation_count: u16 = data.read_at(10)?;
        let extremum_translation_count: u16 = data.read_at(12)?;
        let master_rotation_count: u16 = data.read_at(14)?;
        let extremum_rotation_count: u16 = data.read_at(16)?;
        let master_value_count: u16 = data.read_at(18)?;
        let extremum_value_count: u16 = data.read_at(20)?;
        // Four offsets in 8-byte units from the start of the part.
        let sub_parts_start = data.read_at::<u16>(22)? as usize * 8;
        let column_starts_start = data.read_at::<u16>(24)? as usize * 8;
        let translations_start = data.read_at::<u16>(26)? as usize * 8;
        let rotations_start = data.read_at::<u16>(28)? as usize * 8;

        let sub_parts = data.read_array(
            sub_parts_start..sub_parts_start + sub_part_count as usize * SUB_PART_LEN,
        )?;

        let mut pos = column_starts_start;
        let column_starts_len = num_direct_axes as usize * 2 + 1;
        let column_starts = data.read_array(pos..pos + column_starts_len * 2)?;
        pos += column_starts_len * 2;
        let extremum_value_rows = data.read_array(pos..pos + extremum_value_count as usize * 2)?;
        pos += extremum_value_count as usize * 2;
        let master_value_rows = data.read_array(pos..pos + master_value_count as usize * 2)?;
        pos += master_value_count as usize * 2;
        pos = (pos + 3) & !3;
        let master_axis_value_deltas = data.read_array(pos..pos + master_value_count as usize * 4)?;
        pos += master_value_count as usize * 4;
        let extremum_axis_value_deltas =
            data.read_array(pos..pos + extremum_value_count as usize * 4)?;

        let mut pos = translations_start;
        let master_translation_deltas =
            data.read_array(pos..pos + master_translation_count as usize * 8)?;
        pos += master_translation_count as usize * 8;
        let extremum_translation_deltas =
            data.read_array(pos..pos + extremum_translation_count as usize * 8)?;
        pos += extremum_translation_count as usize * 8;
        let extremum_translation_indices =
            data.read_array(pos..pos + extremum_translation_count as usize * 4)?;
        pos += extremum_translation_count as usize * 4;
        let master_translation_rows =
            data.read_array(pos..pos + master_translation_count as usize * 2)?;

        let mut pos = rotations_start;
        let master_rotation_deltas = data.read_array(pos..pos + master_rotation_count as usize * 4)?;
        pos += master_rotation_count as usize * 4;
        let extremum_rotation_deltas =
            data.read_array(pos..pos + extremum_rotation_count as usize * 4)?;
        pos += extremum_rotation_count as usize * 4;
        let extremum_rotation_indices =
            data.read_array(pos..pos + extremum_rotation_count as usize * 4)?;
        pos += extremum_rotation_count as usize * 4;
        let master_rotation_rows = data.read_array(pos..pos + master_rotation_count as usize * 2)?;

        Ok(Self {
            num_direct_axes,
            num_total_axes,
            num_total_parts,
            sub_parts,
            column_starts,
            extremum_value_rows,
            master_value_rows,
            master_axis_value_deltas,
            extremum_axis_value_deltas,
            master_translation_deltas,
            extremum_translation_deltas,
            extremum_translation_indices,
            master_translation_rows,
            master_rotation_deltas,
            extremum_rotation_deltas,
            extremum_rotation_indices,
            master_rotation_rows,
        })
    }
}

impl<'a> CompositePart<'a> {
    /// The number of axes this part consumes itself.
    pub fn num_direct_axes(&self) -> u16 {
        self.num_direct_axes
    }

    /// The number of axes including all descendant parts.
    pub fn num_total_axes(&self) -> u16 {
        self.num_total_axes
    }

    /// The number of transform slots including this part's own.
    pub fn num_total_parts(&self) -> u16 {
        self.num_total_parts
    }

    pub fn sub_parts(&self) -> impl Iterator<Item = SubPart> + 'a {
        self.sub_parts.chunks_exact(SUB_PART_LEN).map(|chunk| {
            let data = FontData::new(chunk);
            SubPart {
                part_index: data.read_at(0).unwrap_or_default(),
                tree_transform_index: data.read_at(4).unwrap_or_default(),
                tree_axis_index: data.read_at(6).unwrap_or_default(),
            }
        })
    }

    /// Per axis-sign column, the starting slot in the extremum axis-value
    /// rows; one trailing entry closes the last column.
    pub fn column_starts(&self) -> &'a [BigEndian<u16>] {
        self.column_starts
    }

    pub fn extremum_value_rows(&self) -> &'a [BigEndian<u16>] {
        self.extremum_value_rows
    }

    pub fn master_value_rows(&self) -> &'a [BigEndian<u16>] {
        self.master_value_rows
    }

    pub fn master_axis_value_deltas(&self) -> &'a [F32Le] {
        self.master_axis_value_deltas
    }

    pub fn extremum_axis_value_deltas(&self) -> &'a [F32Le] {
        self.extremum_axis_value_deltas
    }

    pub fn master_translation_deltas(&self) -> &'a [TranslationDelta] {
        self.master_translation_deltas
    }

    pub fn extremum_translation_deltas(&self) -> &'a [TranslationDelta] {
        self.extremum_translation_deltas
    }

    pub fn extremum_translation_indices(&self) -> &'a [ExtremumIndex] {
        self.extremum_translation_indices
    }

    pub fn master_translation_rows(&self) -> &'a [BigEndian<u16>] {
        self.master_translation_rows
    }

    pub fn master_rotation_deltas(&self) -> &'a [F32Le] {
        self.master_rotation_deltas
    }

    pub fn extremum_rotation_deltas(&self) -> &'a [F32Le] {
        self.extremum_rotation_deltas
    }

    pub fn extremum_rotation_indices(&self) -> &'a [ExtremumIndex] {
        self.extremum_rotation_indices
    }

    pub fn master_rotation_rows(&self) -> &'a [BigEndian<u16>] {
        self.master_rotation_rows
    }
}

/// A reference from a composite part to one of its children.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubPart {
    pub part_index: u32,
    pub tree_transform_index: u16,
    pub tree_axis_index: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    fn shape_part(
        num_axes: u16,
        path_sizes: &[u16],
        blend_types: &[u8],
        coords: &[f64],
        deltas: &[f64],
    ) -> BeBuffer {
        let num_segments: u16 = path_sizes.iter().sum();
        assert_eq!(blend_types.len(), num_segments as usize);
        assert_eq!(coords.len(), num_segments as usize * 4);
        assert_eq!(deltas.len(), num_axes as usize * 2 * coords.len());
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
        buf
    }

    #[test]
    fn read_shape_part() {
        let coords: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let deltas: Vec<f64> = (0..32).map(|i| -(i as f64)).collect();
        let buf = shape_part(1, &[4], &[1, 1, 1, 1], &coords, &deltas);
        let part = Part::read(buf.font_data()).unwrap();
        let Part::Shape(shape) = part else {
            panic!("expected shape");
        };
        assert_eq!(shape.num_axes(), 1);
        assert_eq!(shape.num_segments(), 4);
        assert_eq!(shape.path_sizes()[0].get(), 4);
        assert_eq!(shape.master_coords()[5].get(), 5.0);
        assert_eq!(shape.delta_column(0).unwrap()[0].get(), 0.0);
        assert_eq!(shape.delta_column(1).unwrap()[0].get(), -16.0);
        assert!(shape.delta_column(2).is_none());
    }

    #[test]
    fn truncated_shape_part_is_an_error() {
        let coords: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let buf = shape_part(0, &[4], &[1, 1, 1, 1], &coords, &[]);
        let truncated = &buf.as_slice()[..buf.len() - 8];
        assert!(Part::read(FontData::new(truncated)).is_err());
    }

    #[test]
    fn hvgl_part_lookup() {
        let part = shape_part(0, &[2], &[1, 1], &[0.0; 8], &[]);
        let header_len = 12 + 2 * 4; // one part: two offsets
        let part_start = align8(header_len) as u32;
        let buf = BeBuffer::new()
            .push(1u16)
            .push(0u16)
            .push(1u32) // num glyphs
            .push(1u32) // num parts
            .push(part_start)
            .push(part_start + part.len() as u32)
            .pad_to(8)
            .push_bytes(part.as_slice());
        let hvgl = Hvgl::read(buf.font_data()).unwrap();
        assert_eq!(hvgl.num_glyphs(), 1);
        assert!(hvgl.part(0).unwrap().is_some());
        assert!(hvgl.part(1).unwrap().is_none());
        assert!(hvgl.glyph_part(GlyphId::new(0)).unwrap().is_some());
        assert!(hvgl.glyph_part(GlyphId::new(1)).unwrap().is_none());
    }
}
