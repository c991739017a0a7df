//! The [VARC (Variable Composite/Component)](https://github.com/harfbuzz/boring-expansion-spec/blob/main/VARC.md) table.

use font_types::{GlyphId, Uint24};

use super::{
    index::Index2,
    layout::ConditionList,
    variations::{ItemVariationStore, PackedValues},
};
use crate::{Cursor, FontData, FontRead, ReadError};

pub use super::layout::CoverageTable;

/// The flags word at the front of each component record.
///
/// One variable-length integer per set reserved bit follows the known
/// fields and is discarded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VarcFlags(u32);

impl VarcFlags {
    pub const RESET_UNSPECIFIED_AXES: Self = Self(0x0000_0001);
    pub const HAVE_AXES: Self = Self(0x0000_0002);
    pub const AXIS_VALUES_HAVE_VARIATION: Self = Self(0x0000_0004);
    pub const TRANSFORM_HAS_VARIATION: Self = Self(0x0000_0008);
    pub const HAVE_TRANSLATE_X: Self = Self(0x0000_0010);
    pub const HAVE_TRANSLATE_Y: Self = Self(0x0000_0020);
    pub const HAVE_ROTATION: Self = Self(0x0000_0040);
    pub const HAVE_CONDITION: Self = Self(0x0000_0080);
    pub const HAVE_SCALE_X: Self = Self(0x0000_0100);
    pub const HAVE_SCALE_Y: Self = Self(0x0000_0200);
    pub const HAVE_TCENTER_X: Self = Self(0x0000_0400);
    pub const HAVE_TCENTER_Y: Self = Self(0x0000_0800);
    pub const GID_IS_24BIT: Self = Self(0x0000_1000);
    pub const HAVE_SKEW_X: Self = Self(0x0000_2000);
    pub const HAVE_SKEW_Y: Self = Self(0x0000_4000);

    pub const RESERVED_MASK: u32 = 0xFFFF_8000;

    /// All flags that signal the presence of a transform component, in
    /// record order.
    pub const TRANSFORM_FIELDS: Self = Self(0x0000_6FF0);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl core::ops::BitOr for VarcFlags {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Reads a variable-length unsigned integer.
///
/// The high bits of the first byte select the width: values below 0x80 take
/// one byte, values below 0x4000 two bytes, anything else (up to 30 bits)
/// four bytes.
pub fn read_var_u32(cursor: &mut Cursor) -> Result<u32, ReadError> {
    let first = cursor.read_u8()?;
    if first < 0x80 {
        Ok(first as u32)
    } else if first < 0xC0 {
        let second = cursor.read_u8()?;
        Ok(((first & 0x3F) as u32) << 8 | second as u32)
    } else {
        let mut value = (first & 0x3F) as u32;
        for _ in 0..3 {
            value = value << 8 | cursor.read_u8()? as u32;
        }
        Ok(value)
    }
}

/// The decomposed transform parts of a component record.
///
/// This is plain data: rotation and skew are stored as fractions of π and
/// the pivot `(center_x, center_y)` applies around the skew/rotate/scale
/// core when a consumer assembles the affine matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecomposedTransform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub skew_x: f32,
    pub skew_y: f32,
    pub center_x: f32,
    pub center_y: f32,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            center_x: 0.0,
            center_y: 0.0,
        }
    }
}

/// The VARC table.
#[derive(Clone)]
pub struct Varc<'a> {
    coverage: CoverageTable<'a>,
    var_store: Option<ItemVariationStore<'a>>,
    condition_list: Option<ConditionList<'a>>,
    axis_indices_list: Option<Index2<'a>>,
    glyph_records: Index2<'a>,
}

impl<'a> FontRead<'a> for Varc<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let major_version: u16 = data.read_at(0)?;
        if major_version != 1 {
            return Err(ReadError::InvalidFormat(major_version as _));
        }
        let subtable = |offset: u32| {
            if offset == 0 {
                Err(ReadError::NullOffset)
            } else {
                data.split_off(offset as usize).ok_or(ReadError::OutOfBounds)
            }
        };
        let coverage = CoverageTable::read(subtable(data.read_at(4)?)?)?;
        let var_store = match data.read_at::<u32>(8)? {
            0 => None,
            offset => Some(ItemVariationStore::read(subtable(offset)?)?),
        };
        let condition_list = match data.read_at::<u32>(12)? {
            0 => None,
            offset => Some(ConditionList::read(subtable(offset)?)?),
        };
        let axis_indices_list = match data.read_at::<u32>(16)? {
            0 => None,
            offset => Some(Index2::read(subtable(offset)?)?),
        };
        let glyph_records = Index2::read(subtable(data.read_at(20)?)?)?;
        Ok(Self {
            coverage,
            var_store,
            condition_list,
            axis_indices_list,
            glyph_records,
        })
    }
}

impl<'a> Varc<'a> {
    pub fn coverage(&self) -> &CoverageTable<'a> {
        &self.coverage
    }

    pub fn var_store(&self) -> Option<&ItemVariationStore<'a>> {
        self.var_store.as_ref()
    }

    pub fn condition_list(&self) -> Option<&ConditionList<'a>> {
        self.condition_list.as_ref()
    }

    /// Returns the nth axis-indices list as packed values.
    pub fn axis_indices(&self, nth: usize) -> Result<PackedValues<'a>, ReadError> {
        let list = self.axis_indices_list.as_ref().ok_or(ReadError::NullOffset)?;
        Ok(PackedValues::new(FontData::new(list.get(nth)?)))
    }

    /// Returns the composite glyph record for the given coverage index.
    pub fn glyph(&self, coverage_index: usize) -> Result<VarcGlyph<'_, 'a>, ReadError> {
        let data = FontData::new(self.glyph_records.get(coverage_index)?);
        Ok(VarcGlyph { table: self, data })
    }
}

/// One glyph's composite record: a sequence of components parsed
/// back-to-back.
#[derive(Clone)]
pub struct VarcGlyph<'t, 'a> {
    table: &'t Varc<'a>,
    data: FontData<'a>,
}

impl<'t, 'a> VarcGlyph<'t, 'a> {
    pub fn components(&self) -> VarcComponents<'t, 'a> {
        VarcComponents {
            table: self.table,
            data: self.data,
            failed: false,
        }
    }
}

/// An iterator over the components of a [`VarcGlyph`].
///
/// A component whose parse would over-run the record terminates the
/// iteration: the error is yielded once and the remaining bytes are
/// abandoned.
#[derive(Clone)]
pub struct VarcComponents<'t, 'a> {
    table: &'t Varc<'a>,
    data: FontData<'a>,
    failed: bool,
}

impl<'a> Iterator for VarcComponents<'_, 'a> {
    type Item = Result<VarcComponent<'a>, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.data.is_empty() {
            return None;
        }
        match VarcComponent::parse(self.table, self.data) {
            Ok((component, remainder)) => {
                self.data = remainder;
                Some(Ok(component))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// A single parsed component record.
#[derive(Clone, Debug)]
pub struct VarcComponent<'a> {
    flags: VarcFlags,
    gid: GlyphId,
    condition_index: Option<u32>,
    axis_indices_index: Option<u32>,
    axis_values: Option<PackedValues<'a>>,
    axis_count: usize,
    axis_values_var_index: Option<u32>,
    transform_var_index: Option<u32>,
    transform: DecomposedTransform,
}

impl<'a> VarcComponent<'a> {
    fn parse(table: &Varc<'a>, data: FontData<'a>) -> Result<(Self, FontData<'a>), ReadError> {
        let mut cursor = data.cursor();
        let flags = VarcFlags::from_bits(read_var_u32(&mut cursor)?);

        let gid = if flags.contains(VarcFlags::GID_IS_24BIT) {
            GlyphId::new(cursor.read::<Uint24>()?.to_u32())
        } else {
            GlyphId::new(cursor.read::<u16>()? as u32)
        };

        let condition_index = flags
            .contains(VarcFlags::HAVE_CONDITION)
            .then(|| read_var_u32(&mut cursor))
            .transpose()?;

        let mut axis_indices_index = None;
        let mut axis_values = None;
        let mut axis_count = 0;
        if flags.contains(VarcFlags::HAVE_AXES) {
            let index = read_var_u32(&mut cursor)?;
            axis_indices_index = Some(index);
            axis_count = table.axis_indices(index as usize)?.count();
            // The packed value block is not self-delimiting: decode as many
            // values as the axis-indices list holds to find its extent. A
            // block that ends early decodes as zeroes for the remainder.
            let block = cursor.remaining_data().ok_or(ReadError::OutOfBounds)?;
            let mut iter = PackedValues::new(block).iter();
            for _ in 0..axis_count {
                if iter.next().is_none() {
                    break;
                }
            }
            let consumed = iter.bytes_consumed();
            axis_values = Some(PackedValues::new(
                block.slice(..consumed).ok_or(ReadError::OutOfBounds)?,
            ));
            cursor.advance_by(consumed);
        }

        let axis_values_var_index = flags
            .contains(VarcFlags::AXIS_VALUES_HAVE_VARIATION)
            .then(|| read_var_u32(&mut cursor))
            .transpose()?;

        let transform_var_index = flags
            .contains(VarcFlags::TRANSFORM_HAS_VARIATION)
            .then(|| read_var_u32(&mut cursor))
            .transpose()?;

        let mut transform = DecomposedTransform::default();
        let mut read_field = |flag, scale: f32| -> Result<Option<f32>, ReadError> {
            if flags.contains(flag) {
                Ok(Some(cursor.read::<i16>()? as f32 / scale))
            } else {
                Ok(None)
            }
        };
        if let Some(v) = read_field(VarcFlags::HAVE_TRANSLATE_X, 1.0)? {
            transform.translate_x = v;
        }
        if let Some(v) = read_field(VarcFlags::HAVE_TRANSLATE_Y, 1.0)? {
            transform.translate_y = v;
        }
        if let Some(v) = read_field(VarcFlags::HAVE_ROTATION, 4096.0)? {
            transform.rotation = v;
        }
        if let Some(v) = read_field(VarcFlags::HAVE_SCALE_X, 1024.0)? {
            transform.scale_x = v;
        }
        match read_field(VarcFlags::HAVE_SCALE_Y, 1024.0)? {
            Some(v) => transform.scale_y = v,
            None => transform.scale_y = transform.scale_x,
        }
        if let Some(v) = read_field(VarcFlags::HAVE_SKEW_X, 4096.0)? {
            transform.skew_x = v;
        }
        if let Some(v) = read_field(VarcFlags::HAVE_SKEW_Y, 4096.0)? {
            transform.skew_y = v;
        }
        if let Some(v) = read_field(VarcFlags::HAVE_TCENTER_X, 1.0)? {
            transform.center_x = v;
        }
        if let Some(v) = read_field(VarcFlags::HAVE_TCENTER_Y, 1.0)? {
            transform.center_y = v;
        }

        // One discarded variable-length integer per set reserved bit.
        let mut reserved = flags.bits() & VarcFlags::RESERVED_MASK;
        while reserved != 0 {
            let _ = read_var_u32(&mut cursor)?;
            reserved &= reserved - 1;
        }

        let remainder = cursor.remaining_data().ok_or(ReadError::OutOfBounds)?;
        Ok((
            Self {
                flags,
                gid,
                condition_index,
                axis_indices_index,
                axis_values,
                axis_count,
                axis_values_var_index,
                transform_var_index,
                transform,
            },
            remainder,
        ))
    }

    pub fn flags(&self) -> VarcFlags {
        self.flags
    }

    pub fn gid(&self) -> GlyphId {
        self.gid
    }

    pub fn condition_index(&self) -> Option<u32> {
        self.condition_index
    }

    pub fn axis_indices_index(&self) -> Option<u32> {
        self.axis_indices_index
    }

    /// The packed axis value overrides, when `HAVE_AXES` is set.
    pub fn axis_values(&self) -> Option<&PackedValues<'a>> {
        self.axis_values.as_ref()
    }

    /// The length of the referenced axis-indices list.
    pub fn axis_count(&self) -> usize {
        self.axis_count
    }

    pub fn axis_values_var_index(&self) -> Option<u32> {
        self.axis_values_var_index
    }

    pub fn transform_var_index(&self) -> Option<u32> {
        self.transform_var_index
    }

    pub fn transform(&self) -> &DecomposedTransform {
        &self.transform
    }
}
