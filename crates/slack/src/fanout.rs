//! Concurrent image upload with first-error cancellation.

use std::sync::Arc;

use {
    image::DynamicImage,
    tokio::{sync::Semaphore, task::JoinSet},
    tokio_util::sync::CancellationToken,
    tracing::{debug, instrument::WithSubscriber, warn},
};

use crate::{Error, Result, upload::AssetUploader};

/// Uploads every image of a message concurrently and returns their asset
/// references in the original image order.
#[derive(Clone)]
pub struct FanOut {
    uploader: Arc<dyn AssetUploader>,
    limit: Option<Arc<Semaphore>>,
}

impl FanOut {
    pub fn new(uploader: Arc<dyn AssetUploader>) -> Self {
        Self {
            uploader,
            limit: None,
        }
    }

    /// Run at most `max` uploads at once.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.limit = Some(Arc::new(Semaphore::new(max)));
        self
    }

    /// Upload `images`, one task per image.
    ///
    /// The first failure cancels every task that has not yet reached the
    /// network, including tasks still encoding; tasks already uploading run
    /// to completion and their remote files are left in place. All tasks are
    /// joined before this returns.
    pub async fn run(&self, images: &[Arc<DynamicImage>]) -> Result<Vec<String>> {
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for (index, image) in images.iter().enumerate() {
            let uploader = Arc::clone(&self.uploader);
            let limit = self.limit.clone();
            let image = Arc::clone(image);
            let cancel = cancel.clone();

            tasks.spawn(
                async move {
                    let _permit = match &limit {
                        Some(sem) => match sem.acquire().await {
                            Ok(permit) => Some(permit),
                            Err(_) => return (index, Err(Error::Cancelled)),
                        },
                        None => None,
                    };
                    if cancel.is_cancelled() {
                        return (index, Err(Error::Cancelled));
                    }
                    let result = uploader.upload_image(index, image, &cancel).await;
                    if matches!(&result, Err(e) if !matches!(e, Error::Cancelled)) {
                        // Cancel while still holding the permit so queued
                        // tasks observe it before they start.
                        cancel.cancel();
                    }
                    (index, result)
                }
                .with_current_subscriber(),
            );
        }

        let mut slots: Vec<Option<String>> = vec![None; images.len()];
        let mut first_error: Option<Error> = None;
        let mut skipped = 0usize;

        while let Some(joined) = tasks.join_next().await {
            let (index, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    cancel.cancel();
                    if first_error.is_none() {
                        first_error = Some(Error::Task(e));
                    }
                    continue;
                },
            };
            match result {
                Ok(asset) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(asset);
                    }
                },
                Err(Error::Cancelled) => skipped += 1,
                Err(e) => {
                    cancel.cancel();
                    if first_error.is_none() {
                        warn!(index, error = %e, "image upload failed, cancelling the rest");
                        first_error = Some(e);
                    }
                },
            }
        }

        if let Some(err) = first_error {
            debug!(skipped, "broadcast aborted");
            return Err(Error::broadcast(err));
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::broadcast(Error::Cancelled))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        rand::Rng,
        std::{
            collections::HashSet,
            sync::{
                Mutex,
                atomic::{AtomicUsize, Ordering},
            },
            time::Duration,
        },
    };

    /// Uploader fake: sleeps a random while, then succeeds unless its index
    /// is in `fail`. Indices in `gated` wait until some upload has failed.
    #[derive(Default)]
    struct FakeUploader {
        fail: HashSet<usize>,
        gated: HashSet<usize>,
        gate: CancellationToken,
        max_delay_ms: u64,
        started: AtomicUsize,
        started_after_cancel: AtomicUsize,
        started_indices: Mutex<Vec<usize>>,
        cancelled: Mutex<bool>,
    }

    impl FakeUploader {
        fn with_delay(max_delay_ms: u64) -> Self {
            Self {
                max_delay_ms,
                ..Self::default()
            }
        }

        fn failing(mut self, index: usize) -> Self {
            self.fail.insert(index);
            self
        }

        fn gating(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
            self.gated.extend(indices);
            self
        }
    }

    #[async_trait]
    impl AssetUploader for FakeUploader {
        async fn upload_image(
            &self,
            index: usize,
            _image: Arc<DynamicImage>,
            _cancel: &CancellationToken,
        ) -> Result<String> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.started_indices.lock().unwrap().push(index);
            if *self.cancelled.lock().unwrap() {
                self.started_after_cancel.fetch_add(1, Ordering::SeqCst);
            }
            if self.gated.contains(&index) {
                self.gate.cancelled().await;
            }
            if self.max_delay_ms > 0 {
                let delay = rand::rng().random_range(0..=self.max_delay_ms);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.fail.contains(&index) {
                *self.cancelled.lock().unwrap() = true;
                self.gate.cancel();
                return Err(Error::api(format!("upload_{index}_failed")));
            }
            Ok(format!("https://files.example/{index}.png"))
        }
    }

    fn images(n: usize) -> Vec<Arc<DynamicImage>> {
        (0..n)
            .map(|_| Arc::new(DynamicImage::new_rgb8(1, 1)))
            .collect()
    }

    fn expected(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://files.example/{i}.png")).collect()
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let fanout = FanOut::new(Arc::new(FakeUploader::default()));
        assert!(fanout.run(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_image_goes_through_the_task_path() {
        let uploader = Arc::new(FakeUploader::default());
        let fanout = FanOut::new(uploader.clone());
        assert_eq!(fanout.run(&images(1)).await.unwrap(), expected(1));
        assert_eq!(uploader.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn results_keep_input_order_despite_random_completion() {
        for n in [2, 5, 16] {
            let fanout = FanOut::new(Arc::new(FakeUploader::with_delay(20)));
            assert_eq!(fanout.run(&images(n)).await.unwrap(), expected(n));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn bounded_concurrency_keeps_order() {
        let fanout = FanOut::new(Arc::new(FakeUploader::with_delay(10))).with_max_concurrency(3);
        assert_eq!(fanout.run(&images(9)).await.unwrap(), expected(9));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn first_error_is_returned_wrapped() {
        let uploader = Arc::new(FakeUploader::with_delay(20).failing(3));
        let fanout = FanOut::new(uploader.clone());
        let err = fanout.run(&images(8)).await.unwrap_err();

        assert!(matches!(err, Error::Broadcast { .. }));
        assert_eq!(err.api_code(), Some("upload_3_failed"));
        assert!(err.to_string().starts_with("failed to broadcast message: "));
        assert!(uploader.started_indices.lock().unwrap().contains(&3));
    }

    #[tokio::test]
    async fn unbounded_fanout_stops_tasks_that_have_not_started() {
        // Tasks run in spawn order on the current-thread runtime: 0 and 1
        // block on the gate, 2 fails and opens it, 3..8 must not start.
        let uploader = Arc::new(FakeUploader::default().gating([0, 1]).failing(2));
        let fanout = FanOut::new(uploader.clone());
        let err = fanout.run(&images(8)).await.unwrap_err();

        assert_eq!(err.api_code(), Some("upload_2_failed"));
        assert_eq!(uploader.started.load(Ordering::SeqCst), 3);
        assert_eq!(uploader.started_after_cancel.load(Ordering::SeqCst), 0);
        assert_eq!(*uploader.started_indices.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn uploader_reported_cancellation_does_not_cancel_siblings() {
        struct Skipping;

        #[async_trait]
        impl AssetUploader for Skipping {
            async fn upload_image(
                &self,
                index: usize,
                _image: Arc<DynamicImage>,
                cancel: &CancellationToken,
            ) -> Result<String> {
                if index == 0 {
                    return Err(Error::Cancelled);
                }
                assert!(!cancel.is_cancelled());
                Ok(format!("https://files.example/{index}.png"))
            }
        }

        let err = FanOut::new(Arc::new(Skipping))
            .run(&images(2))
            .await
            .unwrap_err();
        assert!(
            matches!(&err, Error::Broadcast { source } if matches!(**source, Error::Cancelled)),
            "got {err}"
        );
    }
}
