use std::mem;

use tracing::debug;

use super::{encode_block, Encoder, EncoderState, TAG_ENTRY_SIZE};
use crate::data::{
    coords::{DeltaEncoder, Offset},
    node::Node,
    strings::StringTable,
    tags::encode_dense_tags,
    PbfPrimitiveGroup,
};
use crate::error::Result;
use crate::proto::osmformat::DenseNodes as PbfDenseNodes;

/// Three delta coded varints per node: id, lat and lon.
const NODE_ENTRY_SIZE: usize = 24;

/// Encodes nodes into a single dense group.
///
/// The delta state for ids and coordinates starts at zero for every encoder,
/// so each produced block decodes on its own.
#[derive(Debug)]
pub struct DenseNodesEncoder {
    strings: StringTable,
    offset: Offset,
    id: DeltaEncoder,
    lat: DeltaEncoder,
    lon: DeltaEncoder,
    nodes: PbfDenseNodes,
    state: EncoderState,
}

impl Default for DenseNodesEncoder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl DenseNodesEncoder {
    #[inline]
    pub fn new() -> Self {
        Self::with_offset(Offset::default())
    }

    pub fn with_offset(offset: Offset) -> Self {
        Self {
            strings: StringTable::new(),
            offset,
            id: DeltaEncoder::default(),
            lat: DeltaEncoder::default(),
            lon: DeltaEncoder::default(),
            nodes: PbfDenseNodes::default(),
            state: EncoderState::Open,
        }
    }

    #[inline]
    pub fn state(&self) -> EncoderState {
        self.state
    }

    #[inline]
    pub fn add_node(&mut self, node: &Node) -> Result<()> {
        self.add(node)
    }
}

impl Encoder for DenseNodesEncoder {
    type Entity = Node;

    fn add(&mut self, node: &Node) -> Result<()> {
        self.state.ensure_open()?;
        let id = node.id().0;
        let lat = self.offset.lat_to_units(node.lat())?;
        let lon = self.offset.lon_to_units(node.lon())?;
        let (d_id, d_lat, d_lon) = (self.id.delta(id)?, self.lat.delta(lat)?, self.lon.delta(lon)?);
        encode_dense_tags(&mut self.strings, node.tags(), &mut self.nodes.keys_vals)?;

        self.nodes.id.push(d_id);
        self.nodes.lat.push(d_lat);
        self.nodes.lon.push(d_lon);
        self.id.advance(id);
        self.lat.advance(lat);
        self.lon.advance(lon);
        Ok(())
    }

    /// String table bytes, 24 bytes per node and 4 bytes per tag slot
    /// (including the closing `0` of every node).
    #[inline]
    fn estimate_size(&self) -> usize {
        self.strings.estimated_byte_size()
            + self.nodes.id.len() * NODE_ENTRY_SIZE
            + self.nodes.keys_vals.len() * TAG_ENTRY_SIZE
    }

    #[inline]
    fn len(&self) -> usize {
        self.nodes.id.len()
    }

    fn write(&mut self) -> Result<Vec<u8>> {
        self.state.finish()?;
        let strings = mem::take(&mut self.strings);
        let nodes = mem::take(&mut self.nodes);
        debug!(
            nodes = nodes.id.len(),
            strings = strings.len(),
            "writing dense nodes block"
        );
        let group = PbfPrimitiveGroup {
            dense: Some(nodes),
            ..Default::default()
        };
        Ok(encode_block(strings, group, Some(self.offset)))
    }
}
