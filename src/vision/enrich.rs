//! Bounded, cancellable batch description of a document's images.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;

use futures::stream::{self, StreamExt};

use super::{VisionConfig, VisionError, VisionService};
use crate::model::{Document, ImageData, ImageKey};
use crate::parser::ImageSource;

/// An image whose description could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    pub key: ImageKey,
    pub error: VisionError,
}

impl fmt::Display for ImageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.error)
    }
}

/// Outcome of a description batch.
///
/// Partial success is the normal case: failed and cancelled images keep no
/// description, everything else in the document is unaffected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Images described in this batch
    pub described: Vec<ImageKey>,
    /// Images that already had a description and were skipped
    pub already_described: usize,
    /// Images whose description failed
    pub failed: Vec<ImageFailure>,
    /// Images abandoned when the batch was cancelled
    pub cancelled: Vec<ImageKey>,
}

impl EnrichmentReport {
    /// Whether every pending image received a description.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }

    /// Keys of images without a description after the batch.
    pub fn undescribed(&self) -> Vec<ImageKey> {
        let mut keys: Vec<ImageKey> = self
            .failed
            .iter()
            .map(|f| f.key)
            .chain(self.cancelled.iter().copied())
            .collect();
        keys.sort();
        keys
    }

    /// Human-readable summary of what went wrong, if anything did.
    pub fn warning(&self) -> Option<String> {
        if self.is_complete() {
            return None;
        }
        let mut parts = Vec::new();
        if !self.failed.is_empty() {
            let list: Vec<String> = self.failed.iter().map(ToString::to_string).collect();
            parts.push(format!(
                "{} image(s) could not be described ({})",
                self.failed.len(),
                list.join("; ")
            ));
        }
        if !self.cancelled.is_empty() {
            parts.push(format!(
                "{} image description(s) cancelled",
                self.cancelled.len()
            ));
        }
        Some(parts.join(", "))
    }

    fn fail(&mut self, key: ImageKey, error: VisionError) {
        log::warn!("Image {} not described: {}", key, error);
        self.failed.push(ImageFailure { key, error });
    }
}

/// Describe every image of `doc` that has no description yet.
///
/// See [`describe_images_until`]; this variant is never cancelled.
pub async fn describe_images<S, I>(
    doc: &mut Document,
    source: &mut I,
    service: &S,
    config: &VisionConfig,
) -> EnrichmentReport
where
    S: VisionService + ?Sized,
    I: ImageSource + ?Sized,
{
    describe_images_until(doc, source, service, config, std::future::pending::<()>()).await
}

/// Describe every image of `doc` that has no description yet, until `cancel` completes.
///
/// Image bytes are loaded from `source` up front. Oversized or unrecognized
/// payloads fail without a call. At most `config.concurrency` calls run at
/// once, each under its own timeout, with one retry (by default) after a
/// transient failure. Descriptions are written into `doc` as they arrive, so
/// cancelling keeps the ones already received and lists the rest as cancelled.
pub async fn describe_images_until<S, I, C>(
    doc: &mut Document,
    source: &mut I,
    service: &S,
    config: &VisionConfig,
    cancel: C,
) -> EnrichmentReport
where
    S: VisionService + ?Sized,
    I: ImageSource + ?Sized,
    C: Future<Output = ()>,
{
    let pending = doc.pending_images();
    let mut report = EnrichmentReport {
        already_described: doc.images().len() - pending.len(),
        ..Default::default()
    };

    let mut jobs = Vec::with_capacity(pending.len());
    for key in pending {
        match source.load(key) {
            Ok(image) if image.size() > config.max_image_bytes => report.fail(
                key,
                VisionError::Permanent(format!(
                    "image is {} bytes, limit is {}",
                    image.size(),
                    config.max_image_bytes
                )),
            ),
            Ok(image) if !image.is_image() => report.fail(
                key,
                VisionError::Permanent(format!("{} is not a recognized image format", image.name)),
            ),
            Ok(image) => jobs.push((key, image)),
            Err(e) => report.fail(key, VisionError::ImageUnavailable(e.to_string())),
        }
    }

    let mut outstanding: BTreeSet<ImageKey> = jobs.iter().map(|(key, _)| *key).collect();
    log::debug!(
        "Describing {} image(s) with concurrency {}",
        outstanding.len(),
        config.concurrency
    );

    let calls = stream::iter(jobs.into_iter().map(|(key, image)| async move {
        let result = describe_one(service, &image, config).await;
        (key, result)
    }))
    .buffer_unordered(config.concurrency.max(1));

    let mut calls = std::pin::pin!(calls);
    let mut cancel = std::pin::pin!(cancel);

    loop {
        tokio::select! {
            biased;

            next = calls.next() => match next {
                Some((key, Ok(description))) => {
                    outstanding.remove(&key);
                    match doc.describe_image(key, description) {
                        Ok(_) => report.described.push(key),
                        Err(e) => report.fail(key, VisionError::ImageUnavailable(e.to_string())),
                    }
                }
                Some((key, Err(error))) => {
                    outstanding.remove(&key);
                    report.fail(key, error);
                }
                None => break,
            },

            _ = &mut cancel => {
                report.cancelled = std::mem::take(&mut outstanding).into_iter().collect();
                log::warn!(
                    "Image description cancelled; {} call(s) abandoned",
                    report.cancelled.len()
                );
                break;
            }
        }
    }

    report.described.sort();
    report.failed.sort_by_key(|f| f.key);
    report
}

/// One image, with per-attempt timeout and retry on transient failure.
async fn describe_one<S>(
    service: &S,
    image: &ImageData,
    config: &VisionConfig,
) -> Result<String, VisionError>
where
    S: VisionService + ?Sized,
{
    let mut attempt: u32 = 0;
    loop {
        let result = match tokio::time::timeout(config.timeout, service.describe(image)).await {
            Ok(result) => result,
            Err(_) => Err(VisionError::Timeout(config.timeout)),
        };

        match result {
            Ok(description) => {
                let description = description.trim();
                if description.is_empty() {
                    return Err(VisionError::Permanent("empty description".to_string()));
                }
                return Ok(description.to_string());
            }
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                let backoff = config.retry_backoff * 2u32.saturating_pow(attempt - 1);
                log::warn!(
                    "{}: retry {}/{} after {:?} ({})",
                    image.name,
                    attempt,
                    config.max_retries,
                    backoff,
                    e
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::{DocumentBuilder, FileType};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const PNG: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    struct MapSource(HashMap<ImageKey, ImageData>);

    impl ImageSource for MapSource {
        fn load(&mut self, key: ImageKey) -> Result<ImageData> {
            self.0.get(&key).cloned().ok_or(Error::ImageNotFound {
                unit_index: key.unit_index,
                image_index: key.image_index,
            })
        }
    }

    /// Describes by name; names containing "flaky" fail transiently once,
    /// "broken" always fails permanently.
    struct NameService {
        calls: AtomicUsize,
        flaky_failures: AtomicUsize,
    }

    impl NameService {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                flaky_failures: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VisionService for NameService {
        async fn describe(&self, image: &ImageData) -> std::result::Result<String, VisionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if image.name.contains("broken") {
                return Err(VisionError::Permanent("unsupported".into()));
            }
            if image.name.contains("flaky") && self.flaky_failures.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(VisionError::Transient("overloaded".into()));
            }
            Ok(format!("picture of {}", image.name))
        }
    }

    fn doc_with_images(names: &[&str]) -> (Document, MapSource) {
        let mut b = DocumentBuilder::new("deck.pptx", FileType::PowerPoint);
        let unit = b.push_unit("Slide 1", "");
        let mut images = HashMap::new();
        for name in names {
            let index = b.push_image(unit);
            images.insert(
                ImageKey::new(1, index),
                ImageData::new(*name, PNG.to_vec()),
            );
        }
        (b.build(), MapSource(images))
    }

    fn fast_config() -> VisionConfig {
        VisionConfig::default().with_retry_backoff(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_partial_failure() {
        let (mut doc, mut source) = doc_with_images(&["a", "broken", "c"]);
        let service = NameService::new();

        let report = describe_images(&mut doc, &mut source, &service, &fast_config()).await;

        assert_eq!(report.described, vec![ImageKey::new(1, 1), ImageKey::new(1, 3)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, ImageKey::new(1, 2));
        assert!(report.warning().unwrap().contains("1 image(s)"));
        assert_eq!(doc.images()[0].description.as_deref(), Some("picture of a"));
        assert!(doc.images()[1].description.is_none());
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let (mut doc, mut source) = doc_with_images(&["flaky"]);
        let service = NameService::new();

        let report = describe_images(&mut doc, &mut source, &service, &fast_config()).await;

        assert!(report.is_complete());
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_already_described_skipped() {
        let (mut doc, mut source) = doc_with_images(&["a", "b"]);
        doc.describe_image(ImageKey::new(1, 1), "kept").unwrap();
        let service = NameService::new();

        let report = describe_images(&mut doc, &mut source, &service, &fast_config()).await;

        assert_eq!(report.already_described, 1);
        assert_eq!(report.described, vec![ImageKey::new(1, 2)]);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(doc.images()[0].description.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_oversize_and_non_image_fail_without_call() {
        let (mut doc, mut source) = doc_with_images(&["big"]);
        source.0.insert(ImageKey::new(1, 1), ImageData::new("big", vec![0xFF; 64]));
        let service = NameService::new();
        let config = fast_config().with_max_image_bytes(16);

        let report = describe_images(&mut doc, &mut source, &service, &config).await;

        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0].error, VisionError::Permanent(_)));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_bytes_reported_unavailable() {
        let (mut doc, _) = doc_with_images(&["a"]);
        let mut empty = MapSource(HashMap::new());
        let service = NameService::new();

        let report = describe_images(&mut doc, &mut empty, &service, &fast_config()).await;

        assert!(matches!(
            report.failed[0].error,
            VisionError::ImageUnavailable(_)
        ));
    }
}
