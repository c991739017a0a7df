//! The item variation store and the packed value encodings that feed it.

use font_types::{BigEndian, F2Dot14};

use crate::{FontData, FontRead, ReadError};

/// Sentinel variation index meaning "no variation data for this item".
pub const NO_VARIATION_INDEX: u32 = 0xFFFF_FFFF;

/// Outer and inner indices for reading from an [`ItemVariationStore`].
#[derive(Copy, Clone, Debug)]
pub struct DeltaSetIndex {
    /// Outer delta set index.
    pub outer: u16,
    /// Inner delta set index.
    pub inner: u16,
}

impl DeltaSetIndex {
    /// Splits a packed 32-bit variation index into its outer and inner parts.
    pub fn from_u32(raw: u32) -> Self {
        Self {
            outer: (raw >> 16) as u16,
            inner: raw as u16,
        }
    }
}

/// An [item variation store](https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#item-variation-store)
/// holding per-item delta rows weighted by variation region scalars.
#[derive(Clone)]
pub struct ItemVariationStore<'a> {
    data: FontData<'a>,
    region_list_offset: u32,
    data_offsets: &'a [BigEndian<u32>],
}

impl<'a> FontRead<'a> for ItemVariationStore<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        if format != 1 {
            return Err(ReadError::InvalidFormat(format as _));
        }
        let region_list_offset: u32 = data.read_at(2)?;
        let count: u16 = data.read_at(6)?;
        let data_offsets = data.read_array(8..8 + count as usize * 4)?;
        Ok(Self {
            data,
            region_list_offset,
            data_offsets,
        })
    }
}

impl<'a> ItemVariationStore<'a> {
    pub fn region_list(&self) -> Result<VariationRegionList<'a>, ReadError> {
        let data = self
            .data
            .split_off(self.region_list_offset as usize)
            .ok_or(ReadError::OutOfBounds)?;
        VariationRegionList::read(data)
    }

    /// The number of variation data subtables.
    pub fn data_count(&self) -> usize {
        self.data_offsets.len()
    }

    /// Returns the variation data subtable for the given outer index.
    ///
    /// An out of range index yields `None` rather than an error; the store
    /// contributes zero deltas for indices it does not hold.
    pub fn item_variation_data(
        &self,
        outer: usize,
    ) -> Result<Option<ItemVariationData<'a>>, ReadError> {
        let Some(offset) = self.data_offsets.get(outer) else {
            return Ok(None);
        };
        let data = self
            .data
            .split_off(offset.get() as usize)
            .ok_or(ReadError::OutOfBounds)?;
        ItemVariationData::read(data).map(Some)
    }
}

/// The variation regions shared by a store's subtables.
///
/// Each region is one `(start, peak, end)` F2DOT14 triple per design axis.
#[derive(Clone)]
pub struct VariationRegionList<'a> {
    axis_count: u16,
    values: &'a [BigEndian<F2Dot14>],
}

impl<'a> FontRead<'a> for VariationRegionList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let axis_count: u16 = data.read_at(0)?;
        let region_count: u16 = data.read_at(2)?;
        let len = axis_count as usize * region_count as usize * 3;
        let values = data.read_array(4..4 + len * 2)?;
        Ok(Self { axis_count, values })
    }
}

impl VariationRegionList<'_> {
    pub fn axis_count(&self) -> u16 {
        self.axis_count
    }

    pub fn region_count(&self) -> usize {
        if self.axis_count == 0 {
            0
        } else {
            self.values.len() / (self.axis_count as usize * 3)
        }
    }

    /// Computes the scalar weight of a region at the given coordinates.
    ///
    /// The scalar is the product of per-axis tent functions; an axis whose
    /// peak is zero contributes a factor of one, and a coordinate outside a
    /// region's support yields zero. A nonexistent region also yields zero.
    pub fn compute_scalar(&self, region_index: usize, coords: &[F2Dot14]) -> f32 {
        let axis_count = self.axis_count as usize;
        let start_ix = region_index * axis_count * 3;
        let Some(axes) = self.values.get(start_ix..start_ix + axis_count * 3) else {
            return 0.0;
        };
        let mut scalar = 1.0f32;
        for (i, triple) in axes.chunks_exact(3).enumerate() {
            let start = triple[0].get();
            let peak = triple[1].get();
            let end = triple[2].get();
            if peak == F2Dot14::ZERO {
                continue;
            }
            let coord = coords.get(i).copied().unwrap_or(F2Dot14::ZERO);
            if coord == peak {
                continue;
            }
            if start > peak || peak > end || (start < F2Dot14::ZERO && end > F2Dot14::ZERO) {
                continue;
            }
            if coord < start || coord > end {
                return 0.0;
            }
            // Raw bit values; the scale factors cancel in the ratio.
            if coord < peak {
                let numer = coord.to_bits() as i32 - start.to_bits() as i32;
                if numer == 0 {
                    return 0.0;
                }
                let denom = peak.to_bits() as i32 - start.to_bits() as i32;
                scalar *= numer as f32 / denom as f32;
            } else {
                let numer = end.to_bits() as i32 - coord.to_bits() as i32;
                if numer == 0 {
                    return 0.0;
                }
                let denom = end.to_bits() as i32 - peak.to_bits() as i32;
                scalar *= numer as f32 / denom as f32;
            }
        }
        scalar
    }
}

/// One variation data subtable: a row per item, a column per referenced
/// region.
#[derive(Clone)]
pub struct ItemVariationData<'a> {
    item_count: u16,
    word_delta_count: u16,
    region_indexes: &'a [BigEndian<u16>],
    delta_sets: FontData<'a>,
}

impl<'a> FontRead<'a> for ItemVariationData<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let item_count: u16 = data.read_at(0)?;
        let word_delta_count: u16 = data.read_at(2)?;
        let region_index_count: u16 = data.read_at(4)?;
        let region_indexes = data.read_array(6..6 + region_index_count as usize * 2)?;
        let delta_sets = data
            .split_off(6 + region_index_count as usize * 2)
            .ok_or(ReadError::OutOfBounds)?;
        Ok(Self {
            item_count,
            word_delta_count,
            region_indexes,
            delta_sets,
        })
    }
}

impl<'a> ItemVariationData<'a> {
    /// Flag on the word delta count indicating 32/16 rather than 16/8 bit
    /// deltas.
    const LONG_WORDS: u16 = 0x8000;

    pub fn item_count(&self) -> usize {
        self.item_count as usize
    }

    pub fn region_indexes(&self) -> &'a [BigEndian<u16>] {
        self.region_indexes
    }

    fn row_size(&self) -> usize {
        let long_words = self.word_delta_count & Self::LONG_WORDS != 0;
        let (word_size, small_size) = if long_words { (4, 2) } else { (2, 1) };
        let word_count = (self.word_delta_count & !Self::LONG_WORDS) as usize;
        let region_count = self.region_indexes.len();
        word_count * word_size + region_count.saturating_sub(word_count) * small_size
    }

    /// Returns an iterator over the per-region delta values for the row at
    /// the given inner index.
    pub fn delta_set(&self, inner: usize) -> ItemDeltas<'a> {
        let offset = self.row_size() * inner;
        ItemDeltas {
            cursor: self
                .delta_sets
                .slice(offset..)
                .unwrap_or_default()
                .cursor(),
            word_delta_count: self.word_delta_count & !Self::LONG_WORDS,
            long_words: self.word_delta_count & Self::LONG_WORDS != 0,
            len: self.region_indexes.len() as u16,
            pos: 0,
        }
    }
}

#[derive(Clone)]
pub struct ItemDeltas<'a> {
    cursor: crate::Cursor<'a>,
    word_delta_count: u16,
    long_words: bool,
    len: u16,
    pos: u16,
}

impl Iterator for ItemDeltas<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.len {
            return None;
        }
        let pos = self.pos;
        self.pos += 1;
        let value = match (pos >= self.word_delta_count, self.long_words) {
            (true, true) | (false, false) => self.cursor.read::<i16>().ok()? as i32,
            (true, false) => self.cursor.read::<i8>().ok()? as i32,
            (false, true) => self.cursor.read::<i32>().ok()?,
        };
        Some(value)
    }
}

/// A run-length encoded sequence of signed integers.
///
/// This is the encoding used for axis-indices lists and component axis
/// values: a control byte whose top two bits select the value width (`00`
/// bytes, `01` words, `10` zeroes with no payload, `11` 32-bit longs) and
/// whose low six bits hold the run length minus one.
#[derive(Clone, Debug, Default)]
pub struct PackedValues<'a> {
    data: FontData<'a>,
}

impl<'a> PackedValues<'a> {
    pub fn new(data: FontData<'a>) -> Self {
        Self { data }
    }

    pub fn iter(&self) -> PackedValueIter<'a> {
        PackedValueIter::new(self.data.cursor())
    }

    /// The number of values encoded in the underlying data.
    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// Implements the logic for iterating over the individual runs.
#[derive(Clone, Debug)]
pub struct PackedValueIter<'a> {
    remaining: u8,
    width: RunWidth,
    cursor: crate::Cursor<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum RunWidth {
    Bytes,
    Words,
    Zeroes,
    Longs,
}

impl<'a> PackedValueIter<'a> {
    const WIDTH_MASK: u8 = 0xC0;
    const RUN_COUNT_MASK: u8 = 0x3F;

    fn new(cursor: crate::Cursor<'a>) -> Self {
        Self {
            remaining: 0,
            width: RunWidth::Zeroes,
            cursor,
        }
    }

    /// The number of bytes consumed so far, including control bytes.
    pub fn bytes_consumed(&self) -> usize {
        self.cursor.position()
    }
}

impl Iterator for PackedValueIter<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining == 0 {
            let control = self.cursor.read_u8().ok()?;
            self.width = match control & Self::WIDTH_MASK {
                0x00 => RunWidth::Bytes,
                0x40 => RunWidth::Words,
                0x80 => RunWidth::Zeroes,
                _ => RunWidth::Longs,
            };
            self.remaining = (control & Self::RUN_COUNT_MASK) + 1;
        }
        self.remaining -= 1;
        match self.width {
            RunWidth::Zeroes => Some(0),
            RunWidth::Bytes => self.cursor.read::<i8>().ok().map(|v| v as i32),
            RunWidth::Words => self.cursor.read::<i16>().ok().map(|v| v as i32),
            RunWidth::Longs => self.cursor.read::<i32>().ok(),
        }
    }
}
