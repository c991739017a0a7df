//! Parsing for CFF2-style INDEX objects.
//!
//! The VARC table stores both its per-glyph records and its axis-indices
//! lists in this format: a 32-bit object count, an offset size, `count + 1`
//! one-based offsets and then the object data.

use font_types::Uint24;

use crate::{FontData, FontRead, ReadError};

#[derive(Clone, Default)]
pub struct Index2<'a> {
    count: u32,
    off_size: u8,
    offsets: FontData<'a>,
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for Index2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let count: u32 = data.read_at(0)?;
        if count == 0 {
            // An empty index contains only the count field.
            return Ok(Self::default());
        }
        let off_size: u8 = data.read_at(4)?;
        if !(1..=4).contains(&off_size) {
            return Err(ReadError::MalformedData("invalid INDEX offset size"));
        }
        let offsets_len = (count as usize + 1) * off_size as usize;
        let offsets = data.slice(5..5 + offsets_len).ok_or(ReadError::OutOfBounds)?;
        let data = data
            .split_off(5 + offsets_len)
            .ok_or(ReadError::OutOfBounds)?;
        Ok(Self {
            count,
            off_size,
            offsets,
            data,
        })
    }
}

impl<'a> Index2<'a> {
    /// Returns the number of objects in the index.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns the offset of the object at the given index.
    pub fn get_offset(&self, index: usize) -> Result<usize, ReadError> {
        // There are count + 1 entries in the offset array, and offsets are
        // relative to the byte preceding the object data, so the first
        // entry is always 1.
        if index > self.count as usize {
            return Err(ReadError::OutOfBounds);
        }
        let pos = index * self.off_size as usize;
        let raw = match self.off_size {
            1 => self.offsets.read_at::<u8>(pos)? as usize,
            2 => self.offsets.read_at::<u16>(pos)? as usize,
            3 => self.offsets.read_at::<Uint24>(pos)?.to_u32() as usize,
            _ => self.offsets.read_at::<u32>(pos)? as usize,
        };
        raw.checked_sub(1)
            .ok_or(ReadError::MalformedData("zero offset in INDEX"))
    }

    /// Returns the data for the object at the given index.
    pub fn get(&self, index: usize) -> Result<&'a [u8], ReadError> {
        self.data
            .slice(self.get_offset(index)?..self.get_offset(index + 1)?)
            .map(|data| data.as_bytes())
            .ok_or(ReadError::OutOfBounds)
    }
}
