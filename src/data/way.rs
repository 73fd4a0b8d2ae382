use crate::error::Result;
use crate::proto::osmformat::Way as PbfWay;

use super::{
    coords::DeltaDecoder,
    info::Info,
    node::NodeId,
    tags::{decode_tags, Tags},
    PrimitiveBlock,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WayId(pub i64);

/// An ordered list of node references. References are not validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Way {
    id: WayId,
    tags: Tags,
    refs: Vec<NodeId>,
    info: Option<Info>,
}

impl Way {
    #[inline]
    pub fn new(id: i64, refs: impl IntoIterator<Item = i64>) -> Self {
        Self {
            id: WayId(id),
            tags: Tags::new(),
            refs: refs.into_iter().map(NodeId).collect(),
            info: None,
        }
    }

    #[inline]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    #[inline]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    #[inline(always)]
    pub fn id(&self) -> WayId {
        self.id
    }

    #[inline(always)]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    #[inline(always)]
    pub fn refs(&self) -> &[NodeId] {
        &self.refs
    }

    #[inline(always)]
    pub fn info(&self) -> Option<&Info> {
        self.info.as_ref()
    }
}

impl PrimitiveBlock {
    pub(crate) fn decode_way(&self, w: &PbfWay) -> Result<Way> {
        let mut last = DeltaDecoder::default();
        let refs = w
            .refs
            .iter()
            .map(|&delta| last.decode(delta).map(NodeId))
            .collect::<Result<Vec<_>>>()?;
        let info = w
            .info
            .as_ref()
            .map(|i| Info::from_pbf(i, &self.strings, self.date_granularity))
            .transpose()?;
        Ok(Way {
            id: WayId(w.id),
            tags: decode_tags(&self.strings, &w.keys, &w.vals)?,
            refs,
            info,
        })
    }
}
