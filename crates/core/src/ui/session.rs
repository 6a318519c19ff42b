//! The editing session coordinator.
//!
//! A [`Session`] composes the upload set, the prompt and the pipeline. It
//! allows at most one request in flight, keeps exactly one outcome at a time
//! and drops results that arrive for a request it no longer waits on.

use super::state::{Completion, GenerationStatus, RequestId, TriggerRejected};
use crate::error::AppError;
use crate::gemini::GeminiBackend;
use crate::pipeline::{EditPipeline, EditRequest, EditResult, ImageBackend};
use crate::prompt::suggest;
use crate::upload::{SourceFile, UploadSet};
use log::{debug, error, warn};
use std::sync::Arc;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// The request currently running and where its result will arrive.
struct Pending {
    request_id: RequestId,
    rx: oneshot::Receiver<EditResult>,
}

pub struct Session<B: ImageBackend + 'static = GeminiBackend> {
    // Selection state
    uploads: UploadSet,
    prompt: String,

    // Generation state
    pipeline: Arc<EditPipeline<B>>,
    status: GenerationStatus,
    outcome: Option<EditResult>,
    pending: Option<Pending>,
    next_request: u64,

    torn_down: bool,
}

impl<B: ImageBackend + 'static> Session<B> {
    pub fn new(pipeline: EditPipeline<B>) -> Self {
        Self::with_shared_pipeline(Arc::new(pipeline))
    }

    pub fn with_shared_pipeline(pipeline: Arc<EditPipeline<B>>) -> Self {
        Self {
            uploads: UploadSet::new(),
            prompt: String::new(),
            pipeline,
            status: GenerationStatus::Idle,
            outcome: None,
            pending: None,
            next_request: 0,
            torn_down: false,
        }
    }

    /// Replaces the selection and resets the prompt to the matching suggestion.
    ///
    /// Returns the number of photos kept. Does nothing after teardown.
    pub fn select_files(&mut self, files: Vec<SourceFile>) -> usize {
        if self.torn_down {
            return 0;
        }
        let count = self.uploads.replace_selection(files).len();
        self.prompt = suggest(count);
        count
    }

    /// Removes one photo and resets the prompt to the matching suggestion.
    ///
    /// Does nothing after teardown.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remove_file(&mut self, index: usize) -> usize {
        if self.torn_down {
            return 0;
        }
        let count = self.uploads.remove_at(index).len();
        self.prompt = suggest(count);
        count
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        if self.torn_down {
            return;
        }
        self.prompt = prompt.into();
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn suggested_prompt(&self) -> String {
        suggest(self.uploads.len())
    }

    pub fn uploads(&self) -> &UploadSet {
        &self.uploads
    }

    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    /// Outcome of the most recent attempt, if any.
    pub fn outcome(&self) -> Option<&EditResult> {
        self.outcome.as_ref()
    }

    /// Text for the error banner.
    pub fn error_message(&self) -> Option<&str> {
        self.outcome.as_ref().and_then(EditResult::error_message)
    }

    /// Data URI for the result viewer.
    pub fn result_image(&self) -> Option<&str> {
        self.outcome.as_ref().and_then(EditResult::image_data_uri)
    }

    /// Whether the generate trigger is enabled.
    pub fn can_generate(&self) -> bool {
        !self.torn_down
            && self.status != GenerationStatus::InFlight
            && !self.uploads.is_empty()
            && !self.prompt.is_empty()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Starts a generation on the Tokio runtime.
    ///
    /// Clears the previous outcome first. A call while another request is in
    /// flight is rejected, not queued. Must be called from within a Tokio runtime.
    pub fn generate(&mut self) -> Result<RequestId, TriggerRejected> {
        if self.torn_down {
            return Err(TriggerRejected::TornDown);
        }
        if let Some(current) = &self.pending {
            debug!(
                "ignoring generate while request {} is in flight",
                current.request_id
            );
            return Err(TriggerRejected::InFlight);
        }

        let request = match EditRequest::new(self.uploads.files(), self.prompt.clone()) {
            Ok(request) => request,
            Err(err) => {
                self.outcome = Some(EditResult::from_error(&err));
                self.status = GenerationStatus::Failed;
                return Err(TriggerRejected::Invalid);
            }
        };

        let request_id = RequestId(self.next_request);
        self.next_request += 1;
        self.outcome = None;
        self.status = GenerationStatus::InFlight;
        let (tx, rx) = oneshot::channel();
        self.pending = Some(Pending { request_id, rx });

        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            let result = pipeline.generate(&request).await;
            // The session may be gone by now
            let _ = tx.send(result);
        });

        Ok(request_id)
    }

    /// Applies a finished attempt. Returns `false` if it was stale and ignored.
    pub fn apply(&mut self, completion: Completion) -> bool {
        let current = self.pending.as_ref().map(|p| p.request_id);
        if self.torn_down || current != Some(completion.request_id) {
            warn!("discarding stale result for request {}", completion.request_id);
            return false;
        }

        self.pending = None;
        self.status = if completion.result.is_success() {
            GenerationStatus::Succeeded
        } else {
            GenerationStatus::Failed
        };
        self.outcome = Some(completion.result);
        true
    }

    /// Applies the in-flight result if it has arrived, without waiting.
    pub fn poll(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => abandoned(pending.request_id),
        };
        let request_id = pending.request_id;
        self.apply(Completion { request_id, result })
    }

    /// Waits for the in-flight request, if any, and returns the outcome.
    pub async fn wait(&mut self) -> Option<&EditResult> {
        if let Some(pending) = self.pending.as_mut() {
            let request_id = pending.request_id;
            let result = (&mut pending.rx)
                .await
                .unwrap_or_else(|_| abandoned(request_id));
            self.apply(Completion { request_id, result });
        }
        self.outcome.as_ref()
    }

    /// Closes the result viewer.
    pub fn dismiss_result(&mut self) {
        if self.status == GenerationStatus::Succeeded {
            self.outcome = None;
            self.status = GenerationStatus::Idle;
        }
    }

    /// Releases every preview handle and stops accepting results.
    ///
    /// A request still running completes in the background; its result is dropped.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.uploads.teardown();
        self.torn_down = true;
        self.pending = None;
    }
}

/// Result for a request whose task ended without reporting, e.g. after a panic.
fn abandoned(request_id: RequestId) -> EditResult {
    error!("generation task for request {request_id} ended without a result");
    EditResult::from_error(&AppError::gemini("generation task ended without a result"))
}
