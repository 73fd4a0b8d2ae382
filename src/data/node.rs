use crate::error::{Error, Result};
use crate::proto::osmformat::{DenseNodes as PbfDenseNodes, Node as PbfNode};

use super::{
    coords::DeltaDecoder,
    info::{DenseInfoState, Info},
    tags::{decode_tags, DenseTags, Tags},
    PrimitiveBlock,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub i64);

/// A point primitive. Coordinates are in degrees.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: NodeId,
    lat: f64,
    lon: f64,
    tags: Tags,
    info: Option<Info>,
}

impl Node {
    #[inline]
    pub fn new(id: i64, lat: f64, lon: f64) -> Self {
        Self {
            id: NodeId(id),
            lat,
            lon,
            tags: Tags::new(),
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
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Latitude in degrees.
    #[inline(always)]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[inline(always)]
    pub fn lon(&self) -> f64 {
        self.lon
    }

    #[inline(always)]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    #[inline(always)]
    pub fn info(&self) -> Option<&Info> {
        self.info.as_ref()
    }
}

impl PrimitiveBlock {
    pub(crate) fn decode_node(&self, n: &PbfNode) -> Result<Node> {
        let info = n
            .info
            .as_ref()
            .map(|i| Info::from_pbf(i, &self.strings, self.date_granularity))
            .transpose()?;
        Ok(Node {
            id: NodeId(n.id),
            lat: self.offset.lat_to_degrees(n.lat)?,
            lon: self.offset.lon_to_degrees(n.lon)?,
            tags: decode_tags(&self.strings, &n.keys, &n.vals)?,
            info,
        })
    }

    /// Decodes a dense group, handing every node to `f` in column order.
    ///
    /// Returns the number of decoded nodes.
    pub(crate) fn decode_dense(
        &self,
        dense: &PbfDenseNodes,
        mut f: impl FnMut(Node),
    ) -> Result<usize> {
        let len = dense.id.len();
        if dense.lat.len() != len || dense.lon.len() != len {
            return Err(Error::MalformedBlock("dense node columns differ in length"));
        }
        let mut id = DeltaDecoder::default();
        let mut lat = DeltaDecoder::default();
        let mut lon = DeltaDecoder::default();
        let mut tags = DenseTags::new(&self.strings, &dense.keys_vals);
        let mut info_state = DenseInfoState::default();

        for pos in 0..len {
            let info = match &dense.denseinfo {
                Some(info) => Some(info_state.next(
                    info,
                    pos,
                    &self.strings,
                    self.date_granularity,
                )?),
                None => None,
            };
            let node = Node {
                id: NodeId(id.decode(dense.id[pos])?),
                lat: self.offset.lat_to_degrees(lat.decode(dense.lat[pos])?)?,
                lon: self.offset.lon_to_degrees(lon.decode(dense.lon[pos])?)?,
                tags: tags.next_node()?,
                info,
            };
            f(node);
        }
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{coords::Offset, strings::StringTable};
    use crate::proto::osmformat::DenseInfo as PbfDenseInfo;

    fn block(words: &[&str]) -> PrimitiveBlock {
        let mut strings = StringTable::new();
        for w in words {
            strings.intern(w);
        }
        PrimitiveBlock::for_tests(strings, Offset::default())
    }

    #[test]
    fn plain_node() {
        let block = block(&["name", "Spree"]);
        let pbf = PbfNode {
            id: 7,
            keys: vec![1],
            vals: vec![2],
            info: None,
            lat: 525_000_000,
            lon: 134_000_000,
        };
        let node = block.decode_node(&pbf).unwrap();
        assert_eq!(node.id(), NodeId(7));
        assert!((node.lat() - 52.5).abs() < 1e-9);
        assert!((node.lon() - 13.4).abs() < 1e-9);
        assert_eq!(node.tags()["name"], "Spree");
        assert!(node.info().is_none());
    }

    #[test]
    fn dense_nodes_accumulate_deltas() {
        let block = block(&["amenity", "bench"]);
        let dense = PbfDenseNodes {
            id: vec![10, 1, 5],
            denseinfo: Some(PbfDenseInfo {
                version: vec![1, 2, 1],
                ..Default::default()
            }),
            lat: vec![100, -50, 0],
            lon: vec![200, 0, 25],
            keys_vals: vec![0, 1, 2, 0, 0],
        };
        let mut nodes = Vec::new();
        let count = block.decode_dense(&dense, |n| nodes.push(n)).unwrap();
        assert_eq!(count, 3);
        let ids: Vec<i64> = nodes.iter().map(|n| n.id().0).collect();
        assert_eq!(ids, [10, 11, 16]);
        assert!((nodes[1].lat() - 5e-6).abs() < 1e-12);
        assert!((nodes[2].lon() - 2.25e-5).abs() < 1e-12);
        assert!(nodes[0].tags().is_empty());
        assert_eq!(nodes[1].tags()["amenity"], "bench");
        assert_eq!(nodes[1].info().map(|i| i.version), Some(2));
    }

    #[test]
    fn ragged_dense_columns_are_malformed() {
        let block = block(&[]);
        let dense = PbfDenseNodes {
            id: vec![1, 2],
            lat: vec![0],
            lon: vec![0, 0],
            ..Default::default()
        };
        assert!(matches!(
            block.decode_dense(&dense, |_| {}),
            Err(Error::MalformedBlock(_))
        ));
    }
}
