/*!
 * Decision Point
 * Live policy and content snapshots, the staging protocol and decisions
 *
 * Decisions load both snapshots without locking and evaluate against them
 * until the response is built. Control-plane work parses and applies
 * documents against a snapshot first; the writer lock is held only to
 * check that nothing moved and to swap the new storage in.
 */

use super::errors::{ServerError, ServerResult};
use super::staging::{StagedItem, StagedKind, StagedMode, StagingQueue};
use crate::config::PdpConfig;
use crate::content::LocalContentStorage;
use crate::core::sync::RcuCell;
use crate::document::{
    load_content_file, load_policy_file, parse_content, parse_content_update, parse_policy,
    parse_policy_update, parse_request,
};
use crate::expr::{AttributeAssignment, Context};
use crate::monitoring::{DecisionSpan, OperationSpan};
use crate::policy::Response;
use crate::storage::{PolicyStorage, StorageError};
use crate::wire::{decode_request, encode_response};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Policy decision point
pub struct Pdp {
    policy: RcuCell<PolicyStorage>,
    content: RcuCell<LocalContentStorage>,
    writer: Mutex<()>,
    staging: StagingQueue,
    config: PdpConfig,
}

impl Pdp {
    /// Decision point with an empty policy and no content
    pub fn new(config: PdpConfig) -> Self {
        Self::with_storage(config, PolicyStorage::empty(), LocalContentStorage::default())
    }

    pub fn with_storage(config: PdpConfig, policy: PolicyStorage, content: LocalContentStorage) -> Self {
        Self {
            policy: RcuCell::new(policy),
            content: RcuCell::new(content),
            writer: Mutex::new(()),
            staging: StagingQueue::new(config.max_staged, config.max_upload_bytes),
            config,
        }
    }

    /// Build from the documents named in `config`
    pub fn load(config: PdpConfig) -> ServerResult<Self> {
        let policy = match &config.policy_path {
            Some(path) => load_policy_file(path)?,
            None => PolicyStorage::empty(),
        };
        let contents = config
            .content_paths
            .iter()
            .map(load_content_file)
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            policy = ?config.policy_path,
            policy_tag = ?policy.tag(),
            contents = contents.len(),
            "Decision point loaded"
        );
        Ok(Self::with_storage(config, policy, LocalContentStorage::new(contents)))
    }

    pub fn config(&self) -> &PdpConfig {
        &self.config
    }

    /// Current policy snapshot
    pub fn policy(&self) -> Arc<PolicyStorage> {
        self.policy.load()
    }

    /// Current content snapshot
    pub fn content(&self) -> Arc<LocalContentStorage> {
        self.content.load()
    }

    pub fn policy_tag(&self) -> Option<Uuid> {
        self.policy.load().tag()
    }

    pub fn content_tag(&self, id: &str) -> Option<Uuid> {
        self.content.load().tag(id)
    }

    pub fn staged_len(&self) -> usize {
        self.staging.len()
    }

    // =========================================================================
    // Decisions
    // =========================================================================

    /// Evaluate a request against the current snapshots
    pub fn decide(&self, attributes: Vec<AttributeAssignment>) -> Response {
        let policy = self.policy.load();
        self.decide_with(&policy, attributes)
    }

    /// Decode a binary request, decide and encode the response
    pub fn decide_wire(&self, request: &[u8]) -> ServerResult<Bytes> {
        let policy = self.policy.load();
        let attributes = decode_request(request, policy.symbols())?;
        let response = self.decide_with(&policy, attributes);
        Ok(encode_response(&response)?)
    }

    /// Decide a JSON request object
    pub fn decide_json(&self, request: &[u8]) -> ServerResult<Response> {
        let policy = self.policy.load();
        let attributes = parse_request(request, policy.symbols())?;
        Ok(self.decide_with(&policy, attributes))
    }

    fn decide_with(&self, policy: &PolicyStorage, attributes: Vec<AttributeAssignment>) -> Response {
        let mut span = DecisionSpan::new(attributes.len(), self.config.slow_decision);
        let ctx = Context::from_attributes(
            attributes.into_iter().map(|a| (a.id, a.value)),
            Some(self.content.load()),
        );

        let response = {
            let _entered = span.enter();
            policy.calculate(&ctx)
        };
        span.record_outcome(response.effect, response.obligations.len());
        response
    }

    // =========================================================================
    // Staging protocol
    // =========================================================================

    /// Stage a policy document
    ///
    /// Without `from` the document replaces the policy and is tagged with
    /// `to`. With both tags it is a list of update commands.
    pub fn stage_policy(&self, from: Option<Uuid>, to: Option<Uuid>) -> ServerResult<u32> {
        self.stage(StagedKind::Policy, from, to)
    }

    /// Stage a content document or content update for content `id`
    pub fn stage_content(&self, id: impl Into<String>, from: Option<Uuid>, to: Option<Uuid>) -> ServerResult<u32> {
        self.stage(StagedKind::Content { id: id.into() }, from, to)
    }

    fn stage(&self, kind: StagedKind, from: Option<Uuid>, to: Option<Uuid>) -> ServerResult<u32> {
        let result = StagedMode::from_tags(from, to).and_then(|mode| self.staging.stage(kind.clone(), mode));
        match &result {
            Ok(id) => info!(
                request_id = id,
                subject = kind.name(),
                from = ?from,
                to = ?to,
                staged = self.staging.len(),
                "Staged document"
            ),
            Err(err) => warn!(subject = kind.name(), error = %err, "Staging rejected"),
        }
        result
    }

    /// Append a chunk to a staged item, returning its size so far
    pub fn upload(&self, id: u32, chunk: &[u8]) -> ServerResult<usize> {
        let result = self.staging.append(id, chunk);
        if let Err(err) = &result {
            warn!(request_id = id, error = %err, "Upload rejected");
        }
        result
    }

    /// Feed a staged item from a chunk stream
    ///
    /// A failing stream or an oversized document discards the item; the
    /// remaining chunks are not read. Dropping the returned future before it
    /// completes discards the item too.
    pub async fn upload_stream<S, E>(&self, id: u32, stream: S) -> ServerResult<usize>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: fmt::Display,
    {
        let span = OperationSpan::new("upload", id);
        span.finish(self.upload_stream_inner(id, stream).await)
    }

    async fn upload_stream_inner<S, E>(&self, id: u32, stream: S) -> ServerResult<usize>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: fmt::Display,
    {
        let upload = self.staging.begin_stream(id)?;
        futures::pin_mut!(stream);

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    upload.append(&chunk)?;
                }
                Err(err) => {
                    return Err(ServerError::UploadAborted {
                        id,
                        reason: err.to_string(),
                    });
                }
            }
        }
        upload.finish()
    }

    /// Discard a staged item
    pub fn abort(&self, id: u32) -> ServerResult<()> {
        let span = OperationSpan::new("abort", id);
        span.finish(self.staging.remove(id).map(drop))
    }

    /// Parse a staged item and make it live
    ///
    /// Returns the new tag of the policy or content. The item leaves the
    /// queue whether or not it applies.
    pub fn apply(&self, id: u32) -> ServerResult<Option<Uuid>> {
        let span = OperationSpan::new("apply", id);
        let result = self.staging.take(id).and_then(|item| {
            span.record_subject(item.kind.name());
            match item.kind {
                StagedKind::Policy => self.apply_policy(&item),
                StagedKind::Content { ref id } => self.apply_content(id, &item),
            }
        });
        span.finish(result)
    }

    fn apply_policy(&self, item: &StagedItem) -> ServerResult<Option<Uuid>> {
        match item.mode {
            StagedMode::Replace { tag } => {
                let storage = Arc::new(parse_policy(&item.data, tag)?);
                let _writer = self.writer.lock();
                self.policy.store(storage);
                info!(tag = ?tag, "Policy replaced");
                Ok(tag)
            }
            StagedMode::Update { from, to } => {
                let snapshot = self.policy.load();
                let update = parse_policy_update(&item.data, from, to, snapshot.symbols())?;
                let mut tx = snapshot.new_transaction(from)?;
                tx.apply(&update)?;
                let storage = Arc::new(tx.commit()?);

                let _writer = self.writer.lock();
                if let Err(current) = self.policy.compare_and_store(&snapshot, storage) {
                    return Err(moved(from, current.tag()).into());
                }
                info!(from = %from, to = %to, commands = update.len(), "Policy updated");
                Ok(Some(to))
            }
        }
    }

    fn apply_content(&self, id: &str, item: &StagedItem) -> ServerResult<Option<Uuid>> {
        match item.mode {
            StagedMode::Replace { tag } => {
                let content = parse_content(&item.data, tag)?;
                if content.id() != id {
                    return Err(ServerError::ContentIdMismatch {
                        staged: id.to_string(),
                        document: content.id().to_string(),
                    });
                }

                let _writer = self.writer.lock();
                let current = self.content.load();
                self.content.store(Arc::new(current.with_content(content)));
                info!(content = id, tag = ?tag, "Content replaced");
                Ok(tag)
            }
            StagedMode::Update { from, to } => {
                let snapshot = self.content.load();
                let local = snapshot
                    .content(id)
                    .cloned()
                    .ok_or_else(|| StorageError::MissingContent(id.to_string()))?;
                let update = parse_content_update(&item.data, from, to, &local)?;
                let mut tx = snapshot.new_transaction(id, from)?;
                tx.apply(&update)?;

                let _writer = self.writer.lock();
                let current = self.content.load();
                match current.content(id) {
                    Some(live) if Arc::ptr_eq(live, &local) => {}
                    Some(live) => return Err(moved(from, live.tag()).into()),
                    None => return Err(StorageError::MissingContent(id.to_string()).into()),
                }
                let storage = tx.commit(&current)?;
                self.content.store(Arc::new(storage));
                info!(content = id, from = %from, to = %to, commands = update.len(), "Content updated");
                Ok(Some(to))
            }
        }
    }
}

impl fmt::Debug for Pdp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pdp")
            .field("policy_tag", &self.policy_tag())
            .field("staged", &self.staging.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Error for storage that changed between snapshot and swap
fn moved(expected: Uuid, actual: Option<Uuid>) -> StorageError {
    match actual {
        Some(actual) => StorageError::TagMismatch { expected, actual },
        None => StorageError::MissingStorageTag,
    }
}
