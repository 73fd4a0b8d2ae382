use std::mem;

use tracing::debug;

use super::{encode_block, Encoder, EncoderState, ID_ENTRY_SIZE};
use crate::data::{changeset::ChangeSetId, strings::StringTable, PbfPrimitiveGroup};
use crate::error::Result;
use crate::proto::osmformat::ChangeSet as PbfChangeSet;

/// Encodes bare changeset ids. Changesets use neither delta coding nor the
/// string table.
#[derive(Debug, Default)]
pub struct ChangeSetEncoder {
    changesets: Vec<PbfChangeSet>,
    state: EncoderState,
}

impl ChangeSetEncoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder for ChangeSetEncoder {
    type Entity = ChangeSetId;

    #[inline]
    fn add(&mut self, id: &ChangeSetId) -> Result<()> {
        self.state.ensure_open()?;
        self.changesets.push(PbfChangeSet { id: id.0 });
        Ok(())
    }

    #[inline]
    fn estimate_size(&self) -> usize {
        self.changesets.len() * ID_ENTRY_SIZE
    }

    #[inline]
    fn len(&self) -> usize {
        self.changesets.len()
    }

    fn write(&mut self) -> Result<Vec<u8>> {
        self.state.finish()?;
        let changesets = mem::take(&mut self.changesets);
        debug!(changesets = changesets.len(), "writing changesets block");
        let group = PbfPrimitiveGroup {
            changesets,
            ..Default::default()
        };
        Ok(encode_block(StringTable::new(), group, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::Block;
    use crate::data::PrimitiveBlock;
    use crate::error::Error;

    #[test]
    fn ids_are_stored_verbatim() {
        let mut encoder = ChangeSetEncoder::new();
        encoder.add(&ChangeSetId(42)).unwrap();
        encoder.add(&ChangeSetId(7)).unwrap();
        assert_eq!(encoder.estimate_size(), 16);

        let bytes = encoder.write().unwrap();
        let block = PrimitiveBlock::decode(&bytes[..]).unwrap();
        let ids: Vec<_> = block.primitive_groups()[0]
            .changesets
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, [42, 7]);
        assert!(block.strings().is_empty());
        assert!(matches!(encoder.write(), Err(Error::InvalidState(_))));
    }
}
