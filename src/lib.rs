//! Reading and writing OpenStreetMap PBF files in parallel.
//!
//! A PBF file is a sequence of independently compressed blobs. Every data
//! blob holds one block of primitives (nodes, ways, relations, changesets)
//! that refer to a per-block string table and coordinate grid, so blocks can
//! be decoded and encoded independently of each other.
//!
//! - [`ParallelReader`] decodes the blocks of a stream on a thread pool and
//!   hands the decoded entities to the registered [`Callbacks`].
//! - [`ParallelWriter`] collects entities into per-kind encoders and encodes
//!   full blocks on a thread pool, writing them in order.
//! - [`Pipeline`] is the bounded executor both of them run on: at most
//!   `max_in_flight` blocks are being worked on at any time.
//!
//! The building blocks ([`decode_block`], the [`encode`] module and
//! [`Blobs`]) are public for callers that want to drive the stream
//! themselves.

pub mod blob;
pub mod config;
pub mod data;
pub mod encode;
pub mod error;
pub mod header;
pub mod pipeline;
pub mod proto;
pub mod reader;
pub mod writer;

pub use self::{
    blob::{BlobType, Blobs},
    config::{Compression, ReaderOptions, WriterOptions},
    data::{
        changeset::ChangeSetId,
        coords::Offset,
        info::Info,
        node::{Node, NodeId},
        relation::{MemberType, Relation, RelationId, RelationMember},
        strings::StringTable,
        tags::Tags,
        way::{Way, WayId},
        PrimitiveBlock,
    },
    encode::Encoder,
    error::{Error, Result},
    header::{BoundBox, HeaderBlock, RequiredFeatures},
    pipeline::{Executor, Permit, Permits, Pipeline, TaskHandle},
    reader::{decode_block, BlockStats, Callbacks, ParallelReader, PrimitiveType},
    writer::{BlobWriter, ParallelWriter},
};
