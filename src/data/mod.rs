use crate::{blob::Block, error::Result};

pub use crate::proto::osmformat::{
    PrimitiveBlock as PbfPrimitiveBlock, PrimitiveGroup as PbfPrimitiveGroup,
};

pub mod changeset;
pub mod coords;
pub mod info;
pub mod node;
pub mod relation;
pub mod strings;
pub mod tags;
pub mod way;

use self::{coords::Offset, strings::StringTable};

/// A parsed data block: the string table, the coordinate grid and the raw
/// primitive groups. Entities are decoded on demand by the per-kind codecs,
/// so kinds nobody asks for are never materialized.
#[derive(Clone, Debug)]
pub struct PrimitiveBlock {
    strings: StringTable,
    offset: Offset,
    date_granularity: i32,
    primitive_groups: Vec<PbfPrimitiveGroup>,
}

impl Block for PrimitiveBlock {
    type Message = PbfPrimitiveBlock;

    #[inline]
    fn from_message(pbf: PbfPrimitiveBlock) -> Result<Self> {
        let offset = Offset {
            lat: pbf.lat_offset(),
            lon: pbf.lon_offset(),
            granularity: pbf.granularity(),
        };
        let date_granularity = pbf.date_granularity();
        Ok(Self {
            strings: StringTable::from_pbf(pbf.stringtable),
            offset,
            date_granularity,
            primitive_groups: pbf.primitivegroup,
        })
    }
}

impl PrimitiveBlock {
    #[inline]
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    #[inline]
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Milliseconds per timestamp unit.
    #[inline]
    pub fn date_granularity(&self) -> i32 {
        self.date_granularity
    }

    #[inline]
    pub fn primitive_groups(&self) -> &[PbfPrimitiveGroup] {
        &self.primitive_groups
    }

    /// Number of primitive groups.
    #[inline]
    pub fn len(&self) -> usize {
        self.primitive_groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.primitive_groups.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn for_tests(strings: StringTable, offset: Offset) -> Self {
        Self {
            strings,
            offset,
            date_granularity: coords::DEFAULT_DATE_GRANULARITY,
            primitive_groups: Vec::new(),
        }
    }
}

pub type OSMDataBlob = crate::blob::Blob<PrimitiveBlock>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::osmformat::StringTable as PbfStringTable;
    use prost::Message;

    #[test]
    fn envelope_defaults() {
        let pbf = PbfPrimitiveBlock {
            stringtable: PbfStringTable { s: vec![] },
            primitivegroup: vec![PbfPrimitiveGroup::default()],
            granularity: None,
            lat_offset: None,
            lon_offset: None,
            date_granularity: None,
        };
        let block = PrimitiveBlock::decode(pbf.encode_to_vec().as_slice()).unwrap();
        assert_eq!(block.offset(), Offset::default());
        assert_eq!(block.date_granularity(), 1000);
        assert_eq!(block.len(), 1);
        assert!(block.strings().is_empty());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(PrimitiveBlock::decode(&[0xffu8, 0xff, 0xff][..]).is_err());
    }
}
