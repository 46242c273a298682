//! Representation fetches: rendered previews of displayable media.
//!
//! A store may answer one request with several deliveries, interim
//! low-quality payloads first and a final one last. [`DegradedResultClassifier`]
//! collapses them into exactly one terminal result:
//!
//! | delivery                       | forwarded                      |
//! |--------------------------------|--------------------------------|
//! | error (with or without payload)| failure                        |
//! | degraded, more expected        | nothing, payload kept          |
//! | degraded, final                | success marked degraded        |
//! | full                           | success                        |
//! | final without payload          | last interim payload, degraded |

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::error::{MediaError, Result};
use crate::media::{LivePhoto, Media, Photo, Video};
use crate::store::{
    AssetStore, ContentMode, RepresentationDelivery, RepresentationOptions, RepresentationStream,
    TargetSize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    Full,
    /// Lower quality than requested; the best the store could deliver.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    pub payload: Vec<u8>,
    pub fidelity: Fidelity,
}

impl Representation {
    pub fn is_degraded(&self) -> bool {
        self.fidelity == Fidelity::Degraded
    }
}

/// Media kinds the store can render.
pub trait Displayable: Media {}

impl Displayable for Photo {}
impl Displayable for LivePhoto {}
impl Displayable for Video {}

#[derive(Debug, Default)]
pub struct DegradedResultClassifier {
    finished: bool,
    last_interim: Option<Vec<u8>>,
}

impl DegradedResultClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one delivery. Returns the terminal result the first time one is
    /// determined and `None` for everything else, including any delivery
    /// after the terminal one.
    pub fn offer(&mut self, delivery: RepresentationDelivery) -> Option<Result<Representation>> {
        if self.finished {
            return None;
        }

        if let Some(error) = delivery.error {
            return self.terminate(Err(MediaError::Store(error)));
        }

        match delivery.payload {
            Some(payload) if delivery.is_degraded && !delivery.is_final => {
                self.last_interim = Some(payload);
                None
            }
            Some(payload) => {
                let fidelity = if delivery.is_degraded {
                    Fidelity::Degraded
                } else {
                    Fidelity::Full
                };
                self.terminate(Ok(Representation { payload, fidelity }))
            }
            None if delivery.is_final => self.finish(),
            None => None,
        }
    }

    /// The stream ended. Falls back to the last interim payload.
    pub fn finish(&mut self) -> Option<Result<Representation>> {
        if self.finished {
            return None;
        }
        let result = match self.last_interim.take() {
            Some(payload) => Ok(Representation {
                payload,
                fidelity: Fidelity::Degraded,
            }),
            None => Err(MediaError::NoRepresentation),
        };
        self.terminate(result)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn terminate(&mut self, result: Result<Representation>) -> Option<Result<Representation>> {
        self.finished = true;
        self.last_interim = None;
        Some(result)
    }
}

/// Drain `stream` until a terminal result is known.
pub async fn collect_representation(mut stream: RepresentationStream) -> Result<Representation> {
    let mut classifier = DegradedResultClassifier::new();
    let mut deliveries = 0usize;
    while let Some(delivery) = stream.recv().await {
        deliveries += 1;
        if let Some(result) = classifier.offer(delivery) {
            debug!(deliveries, "Representation complete");
            return result;
        }
    }
    debug!(deliveries, "Representation stream closed");
    classifier
        .finish()
        .unwrap_or(Err(MediaError::NoRepresentation))
}

/// Request a representation of `media` and wait for its terminal result.
#[instrument(skip(store, media), fields(identifier = %media.identifier(), width = size.width, height = size.height))]
pub async fn display_representation<M: Displayable>(
    store: &dyn AssetStore,
    media: &M,
    size: TargetSize,
    mode: ContentMode,
    options: RepresentationOptions,
) -> Result<Representation> {
    let handle = media.asset().snapshot();
    let stream = store.request_representation(&handle, size, mode, options);
    collect_representation(stream).await
}

type Completion = Box<dyn FnOnce(Result<Representation>) + Send>;

/// A running representation fetch with a completion callback.
///
/// The completion runs at most once. Once [`cancel`](Self::cancel) returns, or
/// the request is dropped, it will not start.
#[must_use = "dropping a RepresentationRequest cancels it"]
pub struct RepresentationRequest {
    completion: Arc<Mutex<Option<Completion>>>,
    task: JoinHandle<()>,
}

impl RepresentationRequest {
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(stream: RepresentationStream, completion: F) -> Self
    where
        F: FnOnce(Result<Representation>) + Send + 'static,
    {
        let completion: Arc<Mutex<Option<Completion>>> =
            Arc::new(Mutex::new(Some(Box::new(completion))));
        let pending = Arc::clone(&completion);
        let task = tokio::spawn(async move {
            let result = collect_representation(stream).await;
            let callback = pending.lock().take();
            if let Some(callback) = callback {
                callback(result);
            }
        });
        Self { completion, task }
    }

    pub fn cancel(&self) {
        if self.completion.lock().take().is_some() {
            debug!("Representation request cancelled");
        }
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RepresentationRequest {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for RepresentationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepresentationRequest")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::{mpsc, oneshot};

    use crate::store::StoreError;

    fn run(deliveries: Vec<RepresentationDelivery>) -> Vec<Result<Representation>> {
        let mut classifier = DegradedResultClassifier::new();
        let mut forwarded: Vec<_> = deliveries
            .into_iter()
            .filter_map(|d| classifier.offer(d))
            .collect();
        forwarded.extend(classifier.finish());
        forwarded
    }

    #[test]
    fn test_interims_collapse_into_final() {
        let forwarded = run(vec![
            RepresentationDelivery::interim(vec![1]),
            RepresentationDelivery::interim(vec![2]),
            RepresentationDelivery::complete(vec![3]),
        ]);
        assert_eq!(forwarded.len(), 1);
        let representation = forwarded[0].as_ref().unwrap();
        assert_eq!(representation.payload, [3]);
        assert!(!representation.is_degraded());
    }

    #[test]
    fn test_degraded_final_is_success() {
        let forwarded = run(vec![RepresentationDelivery::degraded_final(vec![9])]);
        assert_eq!(forwarded.len(), 1);
        let representation = forwarded[0].as_ref().unwrap();
        assert!(representation.is_degraded());
        assert_eq!(representation.payload, [9]);
    }

    #[test]
    fn test_error_wins_over_partial_payload() {
        let forwarded = run(vec![RepresentationDelivery::failed(
            StoreError::Network("offline".into()),
            Some(vec![1, 2]),
        )]);
        assert_eq!(forwarded.len(), 1);
        let err = forwarded[0].as_ref().unwrap_err();
        assert_eq!(err.store_error(), Some(&StoreError::Network("offline".into())));
    }

    #[test]
    fn test_nothing_after_terminal() {
        let forwarded = run(vec![
            RepresentationDelivery::complete(vec![1]),
            RepresentationDelivery::failed(StoreError::Other("late".into()), None),
            RepresentationDelivery::complete(vec![2]),
        ]);
        assert_eq!(forwarded.len(), 1);
        assert!(forwarded[0].is_ok());
    }

    #[test]
    fn test_stream_end_falls_back_to_interim() {
        let forwarded = run(vec![RepresentationDelivery::interim(vec![5])]);
        assert_eq!(forwarded.len(), 1);
        assert!(forwarded[0].as_ref().unwrap().is_degraded());

        let forwarded = run(Vec::new());
        assert!(matches!(forwarded.as_slice(), [Err(MediaError::NoRepresentation)]));
    }

    #[tokio::test]
    async fn test_collect_from_stream() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(RepresentationDelivery::interim(vec![1])).unwrap();
        tx.send(RepresentationDelivery::complete(vec![2])).unwrap();
        drop(tx);

        let representation = collect_representation(rx).await.unwrap();
        assert_eq!(representation.payload, [2]);
    }

    #[tokio::test]
    async fn test_completion_runs_once() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        let request = RepresentationRequest::spawn(rx, move |result| {
            let _ = done_tx.send(result);
        });

        tx.send(RepresentationDelivery::interim(vec![1])).unwrap();
        tx.send(RepresentationDelivery::degraded_final(vec![2])).unwrap();

        let result = done_rx.await.unwrap().unwrap();
        assert_eq!(result.payload, [2]);
        assert!(result.is_degraded());
        drop(request);
    }

    #[tokio::test]
    async fn test_cancelled_request_never_completes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, mut done_rx) = oneshot::channel::<Result<Representation>>();
        let request = RepresentationRequest::spawn(rx, move |result| {
            let _ = done_tx.send(result);
        });

        tx.send(RepresentationDelivery::interim(vec![1])).unwrap();
        request.cancel();
        let _ = tx.send(RepresentationDelivery::complete(vec![2]));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(done_rx.try_recv().is_err());
        assert!(request.is_finished());
    }
    #[tokio::test]
    async fn test_dropped_request_never_completes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, mut done_rx) = oneshot::channel::<Result<Representation>>();
        drop(RepresentationRequest::spawn(rx, move |result| {
            let _ = done_tx.send(result);
        }));

        let _ = tx.send(RepresentationDelivery::complete(vec![1]));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(done_rx.try_recv().is_err());
        assert!(tx.is_closed());
    }
}
