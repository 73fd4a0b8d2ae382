//! Writing PBF streams.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::mem;

use byteorder::{BigEndian, WriteBytesExt};
use prost::Message;
use tracing::{debug, info};

use crate::blob::{BlobType, PbfBlob, PbfBlobHeader, MAX_HEADER_SIZE, MAX_UNCOMPRESSED_DATA_SIZE};
use crate::config::{Compression, WriterOptions};
use crate::data::{
    changeset::ChangeSetId, coords::Offset, node::Node, relation::Relation, way::Way,
};
use crate::encode::{
    ChangeSetEncoder, DenseNodesEncoder, Encoder, RelationEncoder, WayEncoder,
};
use crate::error::{Error, Result};
use crate::header::HeaderBlock;
use crate::pipeline::{Executor, Pipeline, TaskHandle};
use crate::proto::fileformat::blob::Data;

/// Wraps an uncompressed block into a blob.
pub fn encode_blob(block: Vec<u8>, compression: Compression) -> Result<PbfBlob> {
    if block.len() > MAX_UNCOMPRESSED_DATA_SIZE {
        return Err(Error::BlobDataToLarge);
    }
    let raw_size = Some(block.len() as i32);
    let data = match compression {
        Compression::None => Data::Raw(block),
        #[cfg(feature = "zlib")]
        Compression::Zlib(level) => {
            let mut encoder = flate2::write::ZlibEncoder::new(
                Vec::with_capacity(block.len() / 2),
                flate2::Compression::new(level.min(9)),
            );
            encoder.write_all(&block)?;
            Data::ZlibData(encoder.finish()?)
        }
        #[cfg(not(feature = "zlib"))]
        Compression::Zlib(_) => return Err(Error::UnsupportedEncoding),
    };
    Ok(PbfBlob {
        raw_size,
        data: Some(data),
    })
}

/// Sequential writer of framed blobs.
#[derive(Debug)]
pub struct BlobWriter<W> {
    write: W,
    blobs: usize,
}

impl<W: Write> BlobWriter<W> {
    #[inline]
    pub fn new(write: W) -> Self {
        Self { write, blobs: 0 }
    }

    pub fn write_header(&mut self, header: &HeaderBlock, compression: Compression) -> Result<()> {
        let blob = encode_blob(header.to_pbf().encode_to_vec(), compression)?;
        self.write_blob(BlobType::OSMHeader, &blob)
    }

    /// Writes an uncompressed data block.
    pub fn write_data(&mut self, block: Vec<u8>, compression: Compression) -> Result<()> {
        let blob = encode_blob(block, compression)?;
        self.write_blob(BlobType::OSMData, &blob)
    }

    pub fn write_blob(&mut self, blob_type: BlobType, blob: &PbfBlob) -> Result<()> {
        let data = blob.encode_to_vec();
        let header = PbfBlobHeader {
            r#type: blob_type.as_str().to_owned(),
            indexdata: None,
            datasize: i32::try_from(data.len()).map_err(|_| Error::BlobDataToLarge)?,
        }
        .encode_to_vec();
        if header.len() > MAX_HEADER_SIZE as usize {
            return Err(Error::BlobHeaderToLarge);
        }

        self.write.write_u32::<BigEndian>(header.len() as u32)?;
        self.write.write_all(&header)?;
        self.write.write_all(&data)?;
        self.blobs += 1;
        Ok(())
    }

    /// Number of blobs written so far.
    #[inline]
    pub fn blobs_written(&self) -> usize {
        self.blobs
    }

    #[inline]
    pub fn flush(&mut self) -> io::Result<()> {
        self.write.flush()
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.write
    }
}

/// Encodes entities into blocks in parallel and writes them in order.
///
/// One encoder per primitive kind collects the added entities. Once the size
/// estimate of an encoder reaches [`WriterOptions::max_block_size`] the
/// encoder is handed to the pipeline, where the block is serialized and
/// compressed. Finished blobs are written in the order their encoders were
/// handed off.
///
/// The header has to be written before any entity.
pub struct ParallelWriter<W: Write, E: Executor = rayon::ThreadPool> {
    blobs: BlobWriter<W>,
    pipeline: Pipeline<E>,
    options: WriterOptions,
    offset: Offset,
    nodes: DenseNodesEncoder,
    ways: WayEncoder,
    relations: RelationEncoder,
    changesets: ChangeSetEncoder,
    pending: VecDeque<TaskHandle<PbfBlob>>,
    header_written: bool,
}

impl<W: Write> ParallelWriter<W> {
    pub fn new(write: W, options: WriterOptions) -> Result<Self> {
        let pipeline = Pipeline::new(options.threads, options.max_in_flight)?;
        Ok(Self::with_pipeline(write, options, pipeline))
    }
}

impl<W: Write, E: Executor> ParallelWriter<W, E> {
    pub fn with_pipeline(write: W, options: WriterOptions, pipeline: Pipeline<E>) -> Self {
        let offset = Offset::with_granularity(options.granularity);
        Self {
            blobs: BlobWriter::new(write),
            pipeline,
            offset,
            nodes: DenseNodesEncoder::with_offset(offset),
            ways: WayEncoder::new(),
            relations: RelationEncoder::new(),
            changesets: ChangeSetEncoder::new(),
            pending: VecDeque::new(),
            header_written: false,
            options,
        }
    }

    pub fn write_header(&mut self, header: &HeaderBlock) -> Result<()> {
        if self.header_written {
            return Err(Error::InvalidState("header is already written"));
        }
        self.blobs.write_header(header, self.options.compression)?;
        self.header_written = true;
        Ok(())
    }

    pub fn write_node(&mut self, node: &Node) -> Result<()> {
        self.ensure_header()?;
        self.nodes.add(node)?;
        if self.nodes.estimate_size() >= self.options.max_block_size {
            self.flush_nodes()?;
        }
        Ok(())
    }

    pub fn write_way(&mut self, way: &Way) -> Result<()> {
        self.ensure_header()?;
        self.ways.add(way)?;
        if self.ways.estimate_size() >= self.options.max_block_size {
            self.flush_ways()?;
        }
        Ok(())
    }

    pub fn write_relation(&mut self, relation: &Relation) -> Result<()> {
        self.ensure_header()?;
        self.relations.add(relation)?;
        if self.relations.estimate_size() >= self.options.max_block_size {
            self.flush_relations()?;
        }
        Ok(())
    }

    pub fn write_changeset(&mut self, changeset: ChangeSetId) -> Result<()> {
        self.ensure_header()?;
        self.changesets.add(&changeset)?;
        if self.changesets.estimate_size() >= self.options.max_block_size {
            self.flush_changesets()?;
        }
        Ok(())
    }

    /// Hands every non-empty encoder to the pipeline and writes all blobs.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_nodes()?;
        self.flush_ways()?;
        self.flush_relations()?;
        self.flush_changesets()?;
        while !self.pending.is_empty() {
            self.write_front()?;
        }
        self.blobs.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn close(mut self) -> Result<W> {
        self.flush()?;
        info!(blobs = self.blobs.blobs_written(), "closed writer");
        Ok(self.blobs.into_inner())
    }

    fn ensure_header(&self) -> Result<()> {
        if self.header_written {
            Ok(())
        } else {
            Err(Error::InvalidState("header must be written before any data"))
        }
    }

    fn flush_nodes(&mut self) -> Result<()> {
        let encoder = mem::replace(&mut self.nodes, DenseNodesEncoder::with_offset(self.offset));
        self.submit(encoder)
    }

    fn flush_ways(&mut self) -> Result<()> {
        let encoder = mem::take(&mut self.ways);
        self.submit(encoder)
    }

    fn flush_relations(&mut self) -> Result<()> {
        let encoder = mem::take(&mut self.relations);
        self.submit(encoder)
    }

    fn flush_changesets(&mut self) -> Result<()> {
        let encoder = mem::take(&mut self.changesets);
        self.submit(encoder)
    }

    fn submit<C>(&mut self, mut encoder: C) -> Result<()>
    where
        C: Encoder + Send + 'static,
    {
        if encoder.is_empty() {
            return Ok(());
        }
        while self.pending.len() >= self.options.max_in_flight.max(1) {
            self.write_front()?;
        }
        debug!(
            entities = encoder.len(),
            estimate = encoder.estimate_size(),
            "submitting block"
        );
        let compression = self.options.compression;
        let handle = self
            .pipeline
            .submit(move || encode_blob(encoder.write()?, compression))?;
        self.pending.push_back(handle);
        self.write_finished()
    }

    /// Writes the leading blobs that are already encoded.
    fn write_finished(&mut self) -> Result<()> {
        while let Some(front) = self.pending.front_mut() {
            match front.try_join() {
                Some(blob) => {
                    self.pending.pop_front();
                    self.blobs.write_blob(BlobType::OSMData, &blob?)?;
                }
                None => break,
            }
        }
        Ok(())
    }

    fn write_front(&mut self) -> Result<()> {
        if let Some(handle) = self.pending.pop_front() {
            let blob = handle.join()?;
            self.blobs.write_blob(BlobType::OSMData, &blob)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::Blobs;
    use crate::data::PrimitiveBlock;

    #[test]
    fn blobs_are_framed() {
        let mut writer = BlobWriter::new(Vec::new());
        writer
            .write_header(&HeaderBlock::default(), Compression::None)
            .unwrap();
        writer.write_data(Vec::new(), Compression::None).unwrap();
        assert_eq!(writer.blobs_written(), 2);

        let mut blobs = Blobs::from_bytes(writer.into_inner());
        let header: HeaderBlock = blobs.header().unwrap().decode().unwrap();
        assert!(header.writing_program().unwrap().starts_with("osm-pbf-parallel/"));
        let data: Vec<_> = blobs.collect::<Result<_>>().unwrap();
        assert_eq!(data.len(), 1);
        let block: PrimitiveBlock = data[0].decode().unwrap();
        assert!(block.is_empty());
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn zlib_blobs_decompress() {
        let block = vec![7u8; 4096];
        let blob = encode_blob(block.clone(), Compression::Zlib(9)).unwrap();
        assert_eq!(blob.raw_size, Some(4096));
        match &blob.data {
            Some(Data::ZlibData(bytes)) => assert!(bytes.len() < block.len()),
            other => panic!("unexpected {other:?}"),
        }
        let blob: crate::data::OSMDataBlob =
            crate::blob::Blob::new(PbfBlobHeader::default(), blob);
        assert_eq!(&*blob.decompress().unwrap(), &block[..]);
    }

    #[test]
    fn oversized_block_is_rejected() {
        let block = vec![0u8; MAX_UNCOMPRESSED_DATA_SIZE + 1];
        assert!(matches!(
            encode_blob(block, Compression::None),
            Err(Error::BlobDataToLarge)
        ));
    }

    #[test]
    fn data_before_header_fails() {
        let options = WriterOptions::default().with_threads(1);
        let mut writer = ParallelWriter::new(Vec::new(), options).unwrap();
        assert!(matches!(
            writer.write_changeset(ChangeSetId(1)),
            Err(Error::InvalidState(_))
        ));
        writer.write_header(&HeaderBlock::default()).unwrap();
        assert!(matches!(
            writer.write_header(&HeaderBlock::default()),
            Err(Error::InvalidState(_))
        ));
        writer.write_changeset(ChangeSetId(1)).unwrap();
    }
}
