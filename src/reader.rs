//! Callback driven decoding of data blocks.
//!
//! [`decode_block`] decodes one block on the calling thread. The
//! [`ParallelReader`] reads a whole stream and decodes its blocks on a
//! [`Pipeline`], so callbacks are invoked from several worker threads at the
//! same time and must be safe to call concurrently. Within one block the
//! entities of one kind are delivered in the order they are stored; there is
//! no ordering between blocks.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::ops::AddAssign;
use std::sync::Arc;

use bitflags::bitflags;
use tracing::{debug, info, trace};

use crate::blob::{Block, Blobs};
use crate::config::ReaderOptions;
use crate::data::{
    changeset::ChangeSetId, node::Node, relation::Relation, way::Way, OSMDataBlob,
    PrimitiveBlock,
};
use crate::error::Result;
use crate::header::HeaderBlock;
use crate::pipeline::{Executor, Pipeline, TaskHandle};

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PrimitiveType: u32 {
        const NODE = 1;
        const WAY = 2;
        const RELATION = 4;
        const CHANGE_SET = 8;
    }
}

type Callback<T> = Box<dyn Fn(T) + Send + Sync>;

/// One optional consumer per primitive kind.
///
/// Entities of a kind without a callback are not decoded.
#[derive(Default)]
pub struct Callbacks {
    on_node: Option<Callback<Node>>,
    on_way: Option<Callback<Way>>,
    on_relation: Option<Callback<Relation>>,
    on_changeset: Option<Callback<ChangeSetId>>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callbacks").field(&self.kinds()).finish()
    }
}

impl Callbacks {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_node(mut self, f: impl Fn(Node) + Send + Sync + 'static) -> Self {
        self.on_node = Some(Box::new(f));
        self
    }

    pub fn on_way(mut self, f: impl Fn(Way) + Send + Sync + 'static) -> Self {
        self.on_way = Some(Box::new(f));
        self
    }

    pub fn on_relation(mut self, f: impl Fn(Relation) + Send + Sync + 'static) -> Self {
        self.on_relation = Some(Box::new(f));
        self
    }

    pub fn on_changeset(mut self, f: impl Fn(ChangeSetId) + Send + Sync + 'static) -> Self {
        self.on_changeset = Some(Box::new(f));
        self
    }

    /// The kinds that have a callback.
    pub fn kinds(&self) -> PrimitiveType {
        let mut kinds = PrimitiveType::empty();
        kinds.set(PrimitiveType::NODE, self.on_node.is_some());
        kinds.set(PrimitiveType::WAY, self.on_way.is_some());
        kinds.set(PrimitiveType::RELATION, self.on_relation.is_some());
        kinds.set(PrimitiveType::CHANGE_SET, self.on_changeset.is_some());
        kinds
    }
}

/// Number of entities handed to callbacks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockStats {
    pub nodes: usize,
    pub ways: usize,
    pub relations: usize,
    pub changesets: usize,
}

impl AddAssign for BlockStats {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes += rhs.nodes;
        self.ways += rhs.ways;
        self.relations += rhs.relations;
        self.changesets += rhs.changesets;
    }
}

/// Decodes one uncompressed data block and hands its entities to `callbacks`.
///
/// The block is always parsed, so a malformed block fails as a whole even
/// when no callback is registered. Entities of a kind without a callback are
/// skipped without being decoded.
pub fn decode_block(bytes: &[u8], callbacks: &Callbacks) -> Result<BlockStats> {
    let block = PrimitiveBlock::decode(bytes)?;
    dispatch(&block, callbacks)
}

/// Runs the per-kind decoders over every group of `block`.
pub fn dispatch(block: &PrimitiveBlock, callbacks: &Callbacks) -> Result<BlockStats> {
    let mut stats = BlockStats::default();
    for group in block.primitive_groups() {
        if let Some(on_node) = &callbacks.on_node {
            for n in &group.nodes {
                on_node(block.decode_node(n)?);
                stats.nodes += 1;
            }
            if let Some(dense) = &group.dense {
                stats.nodes += block.decode_dense(dense, on_node)?;
            }
        }
        if let Some(on_way) = &callbacks.on_way {
            for w in &group.ways {
                on_way(block.decode_way(w)?);
                stats.ways += 1;
            }
        }
        if let Some(on_relation) = &callbacks.on_relation {
            for r in &group.relations {
                on_relation(block.decode_relation(r)?);
                stats.relations += 1;
            }
        }
        if let Some(on_changeset) = &callbacks.on_changeset {
            for c in &group.changesets {
                let id = ChangeSetId::from_pbf(c);
                trace!(id = id.0, "changeset");
                on_changeset(id);
                stats.changesets += 1;
            }
        }
    }
    debug!(
        groups = block.len(),
        nodes = stats.nodes,
        ways = stats.ways,
        relations = stats.relations,
        changesets = stats.changesets,
        "decoded block"
    );
    Ok(stats)
}

impl<E: Executor> Pipeline<E> {
    /// Submits the decoding of an uncompressed block.
    pub fn submit_block(
        &self,
        bytes: Vec<u8>,
        callbacks: Arc<Callbacks>,
    ) -> Result<TaskHandle<BlockStats>> {
        self.submit(move || decode_block(&bytes, &callbacks))
    }

    /// Submits the decompression and decoding of a blob.
    pub fn submit_blob(
        &self,
        blob: OSMDataBlob,
        callbacks: Arc<Callbacks>,
    ) -> Result<TaskHandle<BlockStats>> {
        self.submit(move || {
            let bytes = blob.decompress()?;
            decode_block(&bytes, &callbacks)
        })
    }
}

type HeaderCallback = Box<dyn FnOnce(&HeaderBlock)>;
type CompleteCallback = Box<dyn FnOnce(&BlockStats)>;

/// Reads a PBF stream and decodes its data blocks in parallel.
///
/// ```no_run
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use osm_pbf_parallel::{Callbacks, ParallelReader, ReaderOptions};
///
/// let nodes = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&nodes);
/// let file = std::fs::File::open("berlin.osm.pbf")?;
/// ParallelReader::new(file, ReaderOptions::default())
///     .callbacks(Callbacks::new().on_node(move |_| {
///         counter.fetch_add(1, Ordering::Relaxed);
///     }))
///     .run()?;
/// println!("{} nodes", nodes.load(Ordering::Relaxed));
/// # Ok::<(), osm_pbf_parallel::Error>(())
/// ```
pub struct ParallelReader<R> {
    blobs: Blobs<R>,
    options: ReaderOptions,
    callbacks: Callbacks,
    on_header: Option<HeaderCallback>,
    on_complete: Option<CompleteCallback>,
}

impl<R: io::Read> ParallelReader<io::BufReader<R>> {
    #[inline]
    pub fn new(read: R, options: ReaderOptions) -> Self {
        Self::from_blobs(Blobs::from_read(read), options)
    }
}

impl<R: io::BufRead> ParallelReader<R> {
    pub fn from_blobs(blobs: Blobs<R>, options: ReaderOptions) -> Self {
        Self {
            blobs,
            options,
            callbacks: Callbacks::default(),
            on_header: None,
            on_complete: None,
        }
    }

    #[inline]
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Called with the header block before any data block is decoded.
    #[inline]
    pub fn on_header(mut self, f: impl FnOnce(&HeaderBlock) + 'static) -> Self {
        self.on_header = Some(Box::new(f));
        self
    }

    /// Called once every block was decoded successfully.
    #[inline]
    pub fn on_complete(mut self, f: impl FnOnce(&BlockStats) + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Reads the stream to the end on a pipeline of its own.
    pub fn run(self) -> Result<BlockStats> {
        let pipeline = Pipeline::new(self.options.threads, self.options.max_in_flight)?;
        self.run_on(&pipeline)
    }

    /// Reads the stream to the end, decoding on `pipeline`.
    ///
    /// Returns the first failure of reading or decoding. Units already in
    /// flight are awaited before returning, so no callback runs after this
    /// method returned.
    pub fn run_on<E: Executor>(self, pipeline: &Pipeline<E>) -> Result<BlockStats> {
        let Self {
            mut blobs,
            callbacks,
            on_header,
            on_complete,
            ..
        } = self;

        let header: HeaderBlock = blobs.header()?.decode()?;
        let features = header.required_features()?;
        debug!(?features, program = header.writing_program(), "read header");
        if let Some(on_header) = on_header {
            on_header(&header);
        }

        let callbacks = Arc::new(callbacks);
        let mut pending = VecDeque::new();
        let mut stats = BlockStats::default();
        let mut failure = None;
        for blob in blobs.by_ref() {
            let submitted = blob.and_then(|blob| pipeline.submit_blob(blob, Arc::clone(&callbacks)));
            match submitted {
                Ok(handle) => pending.push_back(handle),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
            if let Err(e) = reap_finished(&mut pending, &mut stats) {
                failure = Some(e);
                break;
            }
        }

        for handle in pending {
            match handle.join() {
                Ok(s) => stats += s,
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        info!(
            nodes = stats.nodes,
            ways = stats.ways,
            relations = stats.relations,
            changesets = stats.changesets,
            "finished reading"
        );
        if let Some(on_complete) = on_complete {
            on_complete(&stats);
        }
        Ok(stats)
    }
}

/// Collects the results of the leading units that already finished.
fn reap_finished(
    pending: &mut VecDeque<TaskHandle<BlockStats>>,
    stats: &mut BlockStats,
) -> Result<()> {
    while let Some(front) = pending.front_mut() {
        match front.try_join() {
            Some(result) => {
                pending.pop_front();
                *stats += result?;
            }
            None => break,
        }
    }
    Ok(())
}
