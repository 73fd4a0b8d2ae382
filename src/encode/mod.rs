//! Block encoders, one per primitive kind.
//!
//! An encoder collects entities into the columns of a single primitive group
//! and, on [`Encoder::write`], serializes them together with the string table
//! into a complete `PrimitiveBlock`. The resulting bytes still need to be
//! framed into a blob (see [`crate::writer`]).
//!
//! Encoders are not thread-safe; run one encoder per output block.

use prost::Message;

use crate::data::{coords::Offset, strings::StringTable, PbfPrimitiveBlock, PbfPrimitiveGroup};
use crate::error::{Error, Result};

pub mod changeset;
pub mod dense;
pub mod relation;
pub mod way;

pub use self::{
    changeset::ChangeSetEncoder, dense::DenseNodesEncoder, relation::RelationEncoder,
    way::WayEncoder,
};

/// Bytes accounted for one key or value slot of a dense tag column.
pub(crate) const TAG_ENTRY_SIZE: usize = 4;
/// Bytes accounted for one key/value pair of a way or relation.
pub(crate) const TAG_PAIR_SIZE: usize = 8;
/// Bytes accounted for the id of a way, relation or changeset.
pub(crate) const ID_ENTRY_SIZE: usize = 8;

pub trait Encoder {
    type Entity;

    /// Appends `entity` to the block.
    ///
    /// Fails with [`Error::InvalidState`] once [`Encoder::write`] was called.
    fn add(&mut self, entity: &Self::Entity) -> Result<()>;

    /// Conservative upper bound of the serialized block size, in bytes.
    fn estimate_size(&self) -> usize;

    /// Number of entities added so far.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes the block. Can be called exactly once.
    fn write(&mut self) -> Result<Vec<u8>>;
}

/// Lifecycle of an encoder.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EncoderState {
    #[default]
    Open,
    Written,
}

impl EncoderState {
    #[inline]
    pub(crate) fn ensure_open(self) -> Result<()> {
        match self {
            Self::Open => Ok(()),
            Self::Written => Err(Error::InvalidState("encoder content is already written")),
        }
    }

    /// Moves to [`EncoderState::Written`], failing when already there.
    #[inline]
    pub(crate) fn finish(&mut self) -> Result<()> {
        self.ensure_open()?;
        *self = Self::Written;
        Ok(())
    }
}

pub(crate) fn encode_block(
    strings: StringTable,
    group: PbfPrimitiveGroup,
    offset: Option<Offset>,
) -> Vec<u8> {
    PbfPrimitiveBlock {
        stringtable: strings.into_pbf(),
        primitivegroup: vec![group],
        granularity: offset.map(|o| o.granularity),
        lat_offset: offset.map(|o| o.lat),
        lon_offset: offset.map(|o| o.lon),
        date_granularity: None,
    }
    .encode_to_vec()
}
