use std::ops::Deref;

use bitflags::bitflags;

pub use crate::proto::osmformat::{HeaderBBox as PbfHeaderBBox, HeaderBlock as PbfHeaderBlock};
use crate::{
    blob::Block,
    error::{Error, Result},
};

// REQUIRED FEATURES
pub const OSM_SCHEMA_V06: &str = "OsmSchema-V0.6";
pub const DENSE_NODES: &str = "DenseNodes";
pub const HISTORICAL_INFORMATION: &str = "HistoricalInformation";

// OPTIONAL FEATURES
pub const HAS_METADATA: &str = "Has_Metadata";
pub const SORT_TYPE_THEN_ID: &str = "Sort.Type_then_ID";
pub const SORT_GEOGRAPHIC: &str = "Sort.Geographic";
pub const LOCATIONS_ON_WAYS: &str = "LocationsOnWays";

bitflags! {
    /// Required features this crate knows how to honour.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RequiredFeatures: u32 {
        const OSM_SCHEMA_V06 = 1;
        const DENSE_NODES = 2;
        const HISTORICAL_INFORMATION = 4;
    }
}

impl RequiredFeatures {
    fn from_feature_name(name: &str) -> Option<Self> {
        Some(match name {
            OSM_SCHEMA_V06 => Self::OSM_SCHEMA_V06,
            DENSE_NODES => Self::DENSE_NODES,
            HISTORICAL_INFORMATION => Self::HISTORICAL_INFORMATION,
            _ => return None,
        })
    }
}

/// Bounding box of the file contents, in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl BoundBox {
    fn from_pbf(b: &PbfHeaderBBox) -> Self {
        Self {
            left: b.left as f64 * 1e-9,
            right: b.right as f64 * 1e-9,
            top: b.top as f64 * 1e-9,
            bottom: b.bottom as f64 * 1e-9,
        }
    }

    fn to_pbf(self) -> PbfHeaderBBox {
        PbfHeaderBBox {
            left: (self.left * 1e9).round() as i64,
            right: (self.right * 1e9).round() as i64,
            top: (self.top * 1e9).round() as i64,
            bottom: (self.bottom * 1e9).round() as i64,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HeaderBlock {
    pbf: PbfHeaderBlock,
}

impl Deref for HeaderBlock {
    type Target = PbfHeaderBlock;
    #[inline]
    fn deref(&self) -> &PbfHeaderBlock {
        &self.pbf
    }
}

impl Block for HeaderBlock {
    type Message = PbfHeaderBlock;

    #[inline]
    fn from_message(pbf: PbfHeaderBlock) -> Result<Self> {
        Ok(Self { pbf })
    }
}

impl Default for HeaderBlock {
    /// A header for files written by this crate.
    fn default() -> Self {
        Self {
            pbf: PbfHeaderBlock {
                required_features: vec![OSM_SCHEMA_V06.to_owned(), DENSE_NODES.to_owned()],
                writingprogram: Some(concat!("osm-pbf-parallel/", env!("CARGO_PKG_VERSION")).to_owned()),
                ..Default::default()
            },
        }
    }
}

impl HeaderBlock {
    #[inline]
    pub fn bbox(&self) -> Option<BoundBox> {
        self.pbf.bbox.as_ref().map(BoundBox::from_pbf)
    }

    #[inline]
    pub fn with_bbox(mut self, bbox: BoundBox) -> Self {
        self.pbf.bbox = Some(bbox.to_pbf());
        self
    }

    #[inline]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.pbf.source = Some(source.into());
        self
    }

    #[inline]
    pub fn with_optional_feature(mut self, feature: impl Into<String>) -> Self {
        self.pbf.optional_features.push(feature.into());
        self
    }

    #[inline]
    pub fn writing_program(&self) -> Option<&str> {
        self.pbf.writingprogram.as_deref()
    }

    #[inline]
    pub fn has_optional_feature(&self, feature: &str) -> bool {
        self.pbf.optional_features.iter().any(|f| f == feature)
    }

    /// The required features, failing on the first one this crate can not
    /// honour.
    pub fn required_features(&self) -> Result<RequiredFeatures> {
        self.pbf
            .required_features
            .iter()
            .try_fold(RequiredFeatures::empty(), |acc, name| {
                RequiredFeatures::from_feature_name(name)
                    .map(|f| acc | f)
                    .ok_or_else(|| Error::UnsupportedFeature(name.clone()))
            })
    }

    #[inline]
    pub(crate) fn to_pbf(&self) -> &PbfHeaderBlock {
        &self.pbf
    }
}

pub type OSMHeaderBlob = crate::blob::Blob<HeaderBlock>;
