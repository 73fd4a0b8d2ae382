//! Message definitions of `fileformat.proto` and `osmformat.proto`.
//!
//! https://wiki.openstreetmap.org/wiki/PBF_Format

pub mod fileformat {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Blob {
        #[prost(int32, optional, tag = "2")]
        pub raw_size: Option<i32>,
        #[prost(oneof = "blob::Data", tags = "1, 3, 4, 5, 6, 7")]
        pub data: Option<blob::Data>,
    }

    pub mod blob {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Data {
            #[prost(bytes, tag = "1")]
            Raw(Vec<u8>),
            #[prost(bytes, tag = "3")]
            ZlibData(Vec<u8>),
            #[prost(bytes, tag = "4")]
            LzmaData(Vec<u8>),
            #[prost(bytes, tag = "5")]
            ObsoleteBzip2Data(Vec<u8>),
            #[prost(bytes, tag = "6")]
            Lz4Data(Vec<u8>),
            #[prost(bytes, tag = "7")]
            ZstdData(Vec<u8>),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct BlobHeader {
        #[prost(string, required, tag = "1")]
        pub r#type: String,
        #[prost(bytes = "vec", optional, tag = "2")]
        pub indexdata: Option<Vec<u8>>,
        #[prost(int32, required, tag = "3")]
        pub datasize: i32,
    }
}

pub mod osmformat {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HeaderBlock {
        #[prost(message, optional, tag = "1")]
        pub bbox: Option<HeaderBBox>,
        #[prost(string, repeated, tag = "4")]
        pub required_features: Vec<String>,
        #[prost(string, repeated, tag = "5")]
        pub optional_features: Vec<String>,
        #[prost(string, optional, tag = "16")]
        pub writingprogram: Option<String>,
        #[prost(string, optional, tag = "17")]
        pub source: Option<String>,
        #[prost(int64, optional, tag = "32")]
        pub osmosis_replication_timestamp: Option<i64>,
        #[prost(int64, optional, tag = "33")]
        pub osmosis_replication_sequence_number: Option<i64>,
        #[prost(string, optional, tag = "34")]
        pub osmosis_replication_base_url: Option<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HeaderBBox {
        #[prost(sint64, required, tag = "1")]
        pub left: i64,
        #[prost(sint64, required, tag = "2")]
        pub right: i64,
        #[prost(sint64, required, tag = "3")]
        pub top: i64,
        #[prost(sint64, required, tag = "4")]
        pub bottom: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PrimitiveBlock {
        #[prost(message, required, tag = "1")]
        pub stringtable: StringTable,
        #[prost(message, repeated, tag = "2")]
        pub primitivegroup: Vec<PrimitiveGroup>,
        #[prost(int32, optional, tag = "17", default = "100")]
        pub granularity: Option<i32>,
        #[prost(int64, optional, tag = "19", default = "0")]
        pub lat_offset: Option<i64>,
        #[prost(int64, optional, tag = "20", default = "0")]
        pub lon_offset: Option<i64>,
        #[prost(int32, optional, tag = "18", default = "1000")]
        pub date_granularity: Option<i32>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PrimitiveGroup {
        #[prost(message, repeated, tag = "1")]
        pub nodes: Vec<Node>,
        #[prost(message, optional, tag = "2")]
        pub dense: Option<DenseNodes>,
        #[prost(message, repeated, tag = "3")]
        pub ways: Vec<Way>,
        #[prost(message, repeated, tag = "4")]
        pub relations: Vec<Relation>,
        #[prost(message, repeated, tag = "5")]
        pub changesets: Vec<ChangeSet>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StringTable {
        #[prost(bytes = "vec", repeated, tag = "1")]
        pub s: Vec<Vec<u8>>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Info {
        #[prost(int32, optional, tag = "1", default = "-1")]
        pub version: Option<i32>,
        #[prost(int64, optional, tag = "2")]
        pub timestamp: Option<i64>,
        #[prost(int64, optional, tag = "3")]
        pub changeset: Option<i64>,
        #[prost(int32, optional, tag = "4")]
        pub uid: Option<i32>,
        #[prost(uint32, optional, tag = "5")]
        pub user_sid: Option<u32>,
        #[prost(bool, optional, tag = "6")]
        pub visible: Option<bool>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DenseInfo {
        #[prost(int32, repeated, packed = "true", tag = "1")]
        pub version: Vec<i32>,
        #[prost(sint64, repeated, packed = "true", tag = "2")]
        pub timestamp: Vec<i64>,
        #[prost(sint64, repeated, packed = "true", tag = "3")]
        pub changeset: Vec<i64>,
        #[prost(sint32, repeated, packed = "true", tag = "4")]
        pub uid: Vec<i32>,
        #[prost(sint32, repeated, packed = "true", tag = "5")]
        pub user_sid: Vec<i32>,
        #[prost(bool, repeated, packed = "true", tag = "6")]
        pub visible: Vec<bool>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ChangeSet {
        #[prost(int64, required, tag = "1")]
        pub id: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Node {
        #[prost(sint64, required, tag = "1")]
        pub id: i64,
        #[prost(uint32, repeated, packed = "true", tag = "2")]
        pub keys: Vec<u32>,
        #[prost(uint32, repeated, packed = "true", tag = "3")]
        pub vals: Vec<u32>,
        #[prost(message, optional, tag = "4")]
        pub info: Option<Info>,
        #[prost(sint64, required, tag = "8")]
        pub lat: i64,
        #[prost(sint64, required, tag = "9")]
        pub lon: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DenseNodes {
        #[prost(sint64, repeated, packed = "true", tag = "1")]
        pub id: Vec<i64>,
        #[prost(message, optional, tag = "5")]
        pub denseinfo: Option<DenseInfo>,
        #[prost(sint64, repeated, packed = "true", tag = "8")]
        pub lat: Vec<i64>,
        #[prost(sint64, repeated, packed = "true", tag = "9")]
        pub lon: Vec<i64>,
        #[prost(int32, repeated, packed = "true", tag = "10")]
        pub keys_vals: Vec<i32>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Way {
        #[prost(int64, required, tag = "1")]
        pub id: i64,
        #[prost(uint32, repeated, packed = "true", tag = "2")]
        pub keys: Vec<u32>,
        #[prost(uint32, repeated, packed = "true", tag = "3")]
        pub vals: Vec<u32>,
        #[prost(message, optional, tag = "4")]
        pub info: Option<Info>,
        #[prost(sint64, repeated, packed = "true", tag = "8")]
        pub refs: Vec<i64>,
    }

    /// Member types are carried as raw `int32` codes; see
    /// [`crate::data::relation::MemberType`] for the fixed mapping.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Relation {
        #[prost(int64, required, tag = "1")]
        pub id: i64,
        #[prost(uint32, repeated, packed = "true", tag = "2")]
        pub keys: Vec<u32>,
        #[prost(uint32, repeated, packed = "true", tag = "3")]
        pub vals: Vec<u32>,
        #[prost(message, optional, tag = "4")]
        pub info: Option<Info>,
        #[prost(int32, repeated, packed = "true", tag = "8")]
        pub roles_sid: Vec<i32>,
        #[prost(sint64, repeated, packed = "true", tag = "9")]
        pub memids: Vec<i64>,
        #[prost(int32, repeated, packed = "true", tag = "10")]
        pub types: Vec<i32>,
    }
}
