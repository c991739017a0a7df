//! Glyph coverage and the condition expression tables.

use font_types::{BigEndian, F2Dot14, GlyphId, GlyphId16};

use crate::{FontData, FontRead, ReadError};

/// A [coverage table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-table-formats)
/// mapping glyph ids to slots in a parallel record array.
#[derive(Clone)]
pub enum CoverageTable<'a> {
    Format1(CoverageFormat1<'a>),
    Format2(CoverageFormat2<'a>),
}

impl<'a> FontRead<'a> for CoverageTable<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => CoverageFormat1::read(data).map(Self::Format1),
            2 => CoverageFormat2::read(data).map(Self::Format2),
            other => Err(ReadError::InvalidFormat(other as _)),
        }
    }
}

impl CoverageTable<'_> {
    /// Returns the coverage index for the given glyph, if covered.
    pub fn get(&self, glyph_id: GlyphId) -> Option<u16> {
        match self {
            Self::Format1(table) => table.get(glyph_id),
            Self::Format2(table) => table.get(glyph_id),
        }
    }
}

/// Coverage as a sorted list of glyph ids.
#[derive(Clone)]
pub struct CoverageFormat1<'a> {
    glyphs: &'a [BigEndian<GlyphId16>],
}

impl<'a> FontRead<'a> for CoverageFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let count: u16 = data.read_at(2)?;
        let glyphs = data.read_array(4..4 + count as usize * 2)?;
        Ok(Self { glyphs })
    }
}

impl CoverageFormat1<'_> {
    fn get(&self, glyph_id: GlyphId) -> Option<u16> {
        let gid = small_glyph_id(glyph_id)?;
        self.glyphs
            .binary_search_by(|probe| probe.get().cmp(&gid))
            .ok()
            .map(|ix| ix as u16)
    }
}

/// Coverage holds 16-bit glyph ids; anything larger is never covered.
fn small_glyph_id(glyph_id: GlyphId) -> Option<GlyphId16> {
    let gid = glyph_id.to_u32();
    (gid <= u16::MAX as u32).then(|| GlyphId16::new(gid as u16))
}

/// Coverage as a sorted list of glyph ranges.
#[derive(Clone)]
pub struct CoverageFormat2<'a> {
    ranges: &'a [RangeRecord],
}

impl<'a> FontRead<'a> for CoverageFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let count: u16 = data.read_at(2)?;
        let ranges = data.read_array(4..4 + count as usize * 6)?;
        Ok(Self { ranges })
    }
}

impl CoverageFormat2<'_> {
    fn get(&self, glyph_id: GlyphId) -> Option<u16> {
        let gid = small_glyph_id(glyph_id)?;
        let ix = self
            .ranges
            .binary_search_by(|rec| {
                if rec.end_glyph_id.get() < gid {
                    core::cmp::Ordering::Less
                } else if rec.start_glyph_id.get() > gid {
                    core::cmp::Ordering::Greater
                } else {
                    core::cmp::Ordering::Equal
                }
            })
            .ok()?;
        let record = &self.ranges[ix];
        Some(
            record.start_coverage_index.get()
                + (gid.to_u16() - record.start_glyph_id.get().to_u16()),
        )
    }
}

/// A contiguous range of covered glyph ids.
#[derive(Clone, Copy, Debug)]
#[repr(C)]
pub struct RangeRecord {
    pub start_glyph_id: BigEndian<GlyphId16>,
    pub end_glyph_id: BigEndian<GlyphId16>,
    pub start_coverage_index: BigEndian<u16>,
}

// SAFETY: RangeRecord is three transparent two-byte wrappers with no padding;
// any bit pattern is a valid value.
unsafe impl bytemuck::Zeroable for RangeRecord {}
unsafe impl bytemuck::AnyBitPattern for RangeRecord {}

/// An indexed list of [`Condition`]s.
///
/// Conditions reference each other by slot in this list, so the list (rather
/// than any single condition) is the unit an evaluator works against.
#[derive(Clone)]
pub struct ConditionList<'a> {
    data: FontData<'a>,
    offsets: &'a [BigEndian<u32>],
}

impl<'a> FontRead<'a> for ConditionList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let count: u32 = data.read_at(0)?;
        let offsets = data.read_array(4..4 + count as usize * 4)?;
        Ok(Self { data, offsets })
    }
}

impl<'a> ConditionList<'a> {
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns the condition at the given slot.
    pub fn get(&self, index: usize) -> Result<Condition<'a>, ReadError> {
        let offset = self
            .offsets
            .get(index)
            .ok_or(ReadError::InvalidCollectionIndex(index as u32))?
            .get() as usize;
        let data = self.data.split_off(offset).ok_or(ReadError::OutOfBounds)?;
        Condition::read(data)
    }
}

/// A single node of a condition expression.
#[derive(Clone, Debug)]
pub enum Condition<'a> {
    /// Format 1: true iff an axis coordinate lies within a closed range.
    AxisRange(ConditionAxisRange),
    /// Format 2: true iff a (possibly variable) value is positive.
    Value(ConditionValue),
    /// Format 3: true iff all referenced conditions hold.
    And(ConditionSet<'a>),
    /// Format 4: true iff any referenced condition holds.
    Or(ConditionSet<'a>),
    /// Format 5: true iff the referenced condition does not hold.
    Negate(ConditionNegate),
}

impl<'a> FontRead<'a> for Condition<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => Ok(Self::AxisRange(ConditionAxisRange {
                axis_index: data.read_at(2)?,
                filter_range_min: data.read_at(4)?,
                filter_range_max: data.read_at(6)?,
            })),
            2 => Ok(Self::Value(ConditionValue {
                default_value: data.read_at(2)?,
                var_index: data.read_at(4)?,
            })),
            3 | 4 => {
                let count: u16 = data.read_at(2)?;
                let indices = data.read_array(4..4 + count as usize * 4)?;
                let set = ConditionSet { indices };
                Ok(if format == 3 {
                    Self::And(set)
                } else {
                    Self::Or(set)
                })
            }
            5 => Ok(Self::Negate(ConditionNegate {
                condition_index: data.read_at(2)?,
            })),
            other => Err(ReadError::InvalidFormat(other as _)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ConditionAxisRange {
    pub axis_index: u16,
    pub filter_range_min: F2Dot14,
    pub filter_range_max: F2Dot14,
}

#[derive(Clone, Copy, Debug)]
pub struct ConditionValue {
    pub default_value: i16,
    pub var_index: u32,
}

/// The child slots of an and/or condition.
#[derive(Clone, Debug)]
pub struct ConditionSet<'a> {
    indices: &'a [BigEndian<u32>],
}

impl ConditionSet<'_> {
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().map(|ix| ix.get())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ConditionNegate {
    pub condition_index: u32,
}
