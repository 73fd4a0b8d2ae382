use std::mem;

use tracing::debug;

use super::{encode_block, Encoder, EncoderState, ID_ENTRY_SIZE, TAG_PAIR_SIZE};
use crate::data::{
    coords::DeltaEncoder, strings::StringTable, tags::encode_tags, way::Way, PbfPrimitiveGroup,
};
use crate::error::Result;
use crate::proto::osmformat::Way as PbfWay;

/// One delta coded node reference.
const REF_ENTRY_SIZE: usize = 8;

#[derive(Debug, Default)]
pub struct WayEncoder {
    strings: StringTable,
    ways: Vec<PbfWay>,
    refs_size: usize,
    tags_size: usize,
    state: EncoderState,
}

impl WayEncoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> EncoderState {
        self.state
    }
}

impl Encoder for WayEncoder {
    type Entity = Way;

    fn add(&mut self, way: &Way) -> Result<()> {
        self.state.ensure_open()?;
        let mut last = DeltaEncoder::default();
        let refs = way
            .refs()
            .iter()
            .map(|r| last.encode(r.0))
            .collect::<Result<Vec<i64>>>()?;
        let (keys, vals) = encode_tags(&mut self.strings, way.tags());

        self.refs_size += refs.len() * REF_ENTRY_SIZE;
        self.tags_size += keys.len() * TAG_PAIR_SIZE;
        self.ways.push(PbfWay {
            id: way.id().0,
            keys,
            vals,
            info: None,
            refs,
        });
        Ok(())
    }

    #[inline]
    fn estimate_size(&self) -> usize {
        self.strings.estimated_byte_size()
            + self.ways.len() * ID_ENTRY_SIZE
            + self.refs_size
            + self.tags_size
    }

    #[inline]
    fn len(&self) -> usize {
        self.ways.len()
    }

    fn write(&mut self) -> Result<Vec<u8>> {
        self.state.finish()?;
        let strings = mem::take(&mut self.strings);
        let ways = mem::take(&mut self.ways);
        debug!(ways = ways.len(), strings = strings.len(), "writing ways block");
        let group = PbfPrimitiveGroup {
            ways,
            ..Default::default()
        };
        Ok(encode_block(strings, group, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn refs_restart_for_every_way() {
        let mut encoder = WayEncoder::new();
        encoder.add(&Way::new(10, [100, 150, 90])).unwrap();
        encoder.add(&Way::new(11, [95])).unwrap();
        assert_eq!(encoder.ways[0].refs, [100, 50, -60]);
        assert_eq!(encoder.ways[1].refs, [95]);
        assert!(encoder.strings.is_empty());
    }

    #[test]
    fn size_estimate_grows_with_content() {
        let mut encoder = WayEncoder::new();
        encoder
            .add(&Way::new(1, [1, 2]).with_tag("highway", "path"))
            .unwrap();
        assert_eq!(encoder.estimate_size(), 11 + 8 + 2 * 8 + 8);
    }

    #[test]
    fn add_after_write_fails() {
        let mut encoder = WayEncoder::new();
        encoder.write().unwrap();
        assert!(matches!(
            encoder.add(&Way::new(1, [])),
            Err(Error::InvalidState(_))
        ));
    }
}
