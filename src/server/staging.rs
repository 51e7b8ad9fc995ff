/*!
 * Staging Queue
 * Pending documents keyed by request id, uploaded in chunks before apply
 */

use super::errors::{ServerError, ServerResult};
use crate::storage::StorageError;
use ahash::RandomState;
use bytes::BytesMut;
use dashmap::DashMap;
use log::debug;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use uuid::Uuid;

/// What a staged document replaces or updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedKind {
    Policy,
    Content { id: String },
}

impl StagedKind {
    pub fn name(&self) -> &str {
        match self {
            StagedKind::Policy => "policy",
            StagedKind::Content { id } => id,
        }
    }
}

/// How a staged document is applied, decided by its tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedMode {
    /// Complete document, optionally tagged
    Replace { tag: Option<Uuid> },
    /// Update commands from one tag to another
    Update { from: Uuid, to: Uuid },
}

impl StagedMode {
    /// Derive the mode from the tags given at staging time
    pub fn from_tags(from: Option<Uuid>, to: Option<Uuid>) -> ServerResult<Self> {
        match (from, to) {
            (None, tag) => Ok(StagedMode::Replace { tag }),
            (Some(from), Some(to)) => Ok(StagedMode::Update { from, to }),
            (Some(_), None) => Err(StorageError::MissingUpdateTag("to").into()),
        }
    }
}

/// A document waiting to be applied
#[derive(Debug)]
pub struct StagedItem {
    pub kind: StagedKind,
    pub mode: StagedMode,
    pub data: BytesMut,
    streaming: bool,
}

/// Bounded map of staged items
///
/// Ids are never reused while the process lives, so a late upload for an
/// applied or aborted item reports `UnknownStagedId` instead of landing in
/// an unrelated document.
pub struct StagingQueue {
    items: DashMap<u32, StagedItem, RandomState>,
    next_id: AtomicU32,
    len: AtomicUsize,
    capacity: usize,
    max_bytes: usize,
}

impl StagingQueue {
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        Self {
            items: DashMap::with_hasher(RandomState::new()),
            next_id: AtomicU32::new(1),
            len: AtomicUsize::new(0),
            capacity,
            max_bytes,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve a slot and register an empty item
    pub fn stage(&self, kind: StagedKind, mode: StagedMode) -> ServerResult<u32> {
        self.len
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |len| {
                (len < self.capacity).then_some(len + 1)
            })
            .map_err(|_| ServerError::QueueOverflow {
                capacity: self.capacity,
            })?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.items.insert(
            id,
            StagedItem {
                kind,
                mode,
                data: BytesMut::new(),
                streaming: false,
            },
        );
        Ok(id)
    }

    /// Append a chunk, returning the staged size
    ///
    /// An item that grows past the size limit is discarded.
    pub fn append(&self, id: u32, chunk: &[u8]) -> ServerResult<usize> {
        self.append_inner(id, chunk, false)
    }

    fn append_streamed(&self, id: u32, chunk: &[u8]) -> ServerResult<usize> {
        self.append_inner(id, chunk, true)
    }

    fn append_inner(&self, id: u32, chunk: &[u8], streamed: bool) -> ServerResult<usize> {
        let size = {
            let mut item = self.items.get_mut(&id).ok_or(ServerError::UnknownStagedId(id))?;
            if item.streaming != streamed {
                return Err(ServerError::InvalidState {
                    id,
                    reason: if streamed {
                        "upload stream was not started"
                    } else {
                        "an upload stream is in progress"
                    },
                });
            }
            let size = item.data.len() + chunk.len();
            if size <= self.max_bytes {
                item.data.extend_from_slice(chunk);
                return Ok(size);
            }
            size
        };

        self.discard(id);
        debug!("Staged item {} discarded at {} bytes", id, size);
        Err(ServerError::UploadTooLarge {
            id,
            limit: self.max_bytes,
        })
    }

    /// Mark an item as being fed by a stream
    ///
    /// The item stays staged only if the returned handle is finished; a
    /// handle dropped earlier discards it.
    pub(super) fn begin_stream(&self, id: u32) -> ServerResult<UploadStream<'_>> {
        let mut item = self.items.get_mut(&id).ok_or(ServerError::UnknownStagedId(id))?;
        if item.streaming {
            return Err(ServerError::InvalidState {
                id,
                reason: "an upload stream is in progress",
            });
        }
        item.streaming = true;
        Ok(UploadStream {
            queue: self,
            id,
            open: true,
        })
    }

    fn end_stream(&self, id: u32) -> ServerResult<usize> {
        let mut item = self.items.get_mut(&id).ok_or(ServerError::UnknownStagedId(id))?;
        item.streaming = false;
        Ok(item.data.len())
    }

    /// Remove an item for applying
    pub fn take(&self, id: u32) -> ServerResult<StagedItem> {
        match self.items.remove_if(&id, |_, item| !item.streaming) {
            Some((_, item)) => {
                self.len.fetch_sub(1, Ordering::AcqRel);
                Ok(item)
            }
            None if self.items.contains_key(&id) => Err(ServerError::InvalidState {
                id,
                reason: "an upload stream is in progress",
            }),
            None => Err(ServerError::UnknownStagedId(id)),
        }
    }

    /// Drop an item, whatever its state
    pub fn remove(&self, id: u32) -> ServerResult<StagedItem> {
        let (_, item) = self.items.remove(&id).ok_or(ServerError::UnknownStagedId(id))?;
        self.len.fetch_sub(1, Ordering::AcqRel);
        Ok(item)
    }

    pub(super) fn discard(&self, id: u32) {
        if self.items.remove(&id).is_some() {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Upload stream in progress on one staged item
pub(super) struct UploadStream<'a> {
    queue: &'a StagingQueue,
    id: u32,
    open: bool,
}

impl UploadStream<'_> {
    pub(super) fn append(&self, chunk: &[u8]) -> ServerResult<usize> {
        self.queue.append_streamed(self.id, chunk)
    }

    /// Close the stream and keep the item for apply
    pub(super) fn finish(mut self) -> ServerResult<usize> {
        self.open = false;
        self.queue.end_stream(self.id)
    }
}

impl Drop for UploadStream<'_> {
    fn drop(&mut self) {
        if self.open {
            debug!("Upload stream for staged item {} ended early, discarding", self.id);
            self.queue.discard(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace() -> StagedMode {
        StagedMode::Replace { tag: None }
    }

    #[test]
    fn test_mode_from_tags() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(StagedMode::from_tags(None, None).unwrap(), StagedMode::Replace { tag: None });
        assert_eq!(StagedMode::from_tags(None, Some(b)).unwrap(), StagedMode::Replace { tag: Some(b) });
        assert_eq!(
            StagedMode::from_tags(Some(a), Some(b)).unwrap(),
            StagedMode::Update { from: a, to: b }
        );
        assert!(matches!(
            StagedMode::from_tags(Some(a), None),
            Err(ServerError::Storage(StorageError::MissingUpdateTag("to")))
        ));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let queue = StagingQueue::new(2, 16);
        let first = queue.stage(StagedKind::Policy, replace()).unwrap();
        queue.stage(StagedKind::Policy, replace()).unwrap();
        assert!(matches!(
            queue.stage(StagedKind::Policy, replace()),
            Err(ServerError::QueueOverflow { capacity: 2 })
        ));

        queue.remove(first).unwrap();
        assert_eq!(queue.len(), 1);
        queue.stage(StagedKind::Policy, replace()).unwrap();
    }

    #[test]
    fn test_ids_are_not_reused() {
        let queue = StagingQueue::new(4, 16);
        let first = queue.stage(StagedKind::Policy, replace()).unwrap();
        queue.take(first).unwrap();
        let second = queue.stage(StagedKind::Policy, replace()).unwrap();
        assert_ne!(first, second);
        assert!(matches!(queue.append(first, b"x"), Err(ServerError::UnknownStagedId(id)) if id == first));
    }

    #[test]
    fn test_oversized_upload_discards_item() {
        let queue = StagingQueue::new(4, 8);
        let id = queue.stage(StagedKind::Policy, replace()).unwrap();
        assert_eq!(queue.append(id, b"12345").unwrap(), 5);
        assert!(matches!(
            queue.append(id, b"6789"),
            Err(ServerError::UploadTooLarge { limit: 8, .. })
        ));
        assert!(queue.is_empty());
        assert!(matches!(queue.take(id), Err(ServerError::UnknownStagedId(_))));
    }

    #[test]
    fn test_streaming_item_rejects_take_and_plain_upload() {
        let queue = StagingQueue::new(4, 64);
        let id = queue
            .stage(StagedKind::Content { id: "dns".into() }, replace())
            .unwrap();
        let upload = queue.begin_stream(id).unwrap();

        assert!(matches!(queue.append(id, b"x"), Err(ServerError::InvalidState { .. })));
        assert!(matches!(queue.take(id), Err(ServerError::InvalidState { .. })));
        assert!(matches!(queue.begin_stream(id), Err(ServerError::InvalidState { .. })));

        upload.append(b"{}").unwrap();
        assert_eq!(upload.finish().unwrap(), 2);

        let item = queue.take(id).unwrap();
        assert_eq!(item.kind.name(), "dns");
        assert_eq!(&item.data[..], b"{}");
    }

    #[test]
    fn test_unfinished_stream_discards_item() {
        let queue = StagingQueue::new(1, 64);
        let id = queue.stage(StagedKind::Policy, replace()).unwrap();
        {
            let upload = queue.begin_stream(id).unwrap();
            upload.append(b"{").unwrap();
        }

        assert!(queue.is_empty());
        assert!(matches!(queue.take(id), Err(ServerError::UnknownStagedId(_))));
        assert!(queue.stage(StagedKind::Policy, replace()).is_ok());
    }
}
