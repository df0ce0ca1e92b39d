//! Image description through an external vision service.
//!
//! Extraction never calls the network. Descriptions are added afterwards,
//! as an explicit enrichment step over a parsed [`Document`]:
//!
//! ```no_run
//! # async fn run(service: &dyn unfile::vision::VisionService) -> unfile::Result<()> {
//! use unfile::vision::{describe_images, VisionConfig};
//! use unfile::{FileType, Parser, ParseOptions};
//!
//! let data = std::fs::read("deck.pptx")?;
//! let parser = Parser::for_type(FileType::PowerPoint, ParseOptions::default());
//! let (mut doc, mut source) = parser.extract_with_source("deck.pptx", &data)?;
//!
//! let report = describe_images(&mut doc, &mut source, service, &VisionConfig::default()).await;
//! if let Some(warning) = report.warning() {
//!     eprintln!("{}", warning);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`Document`]: crate::model::Document

mod enrich;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::ImageData;

pub use enrich::{describe_images, describe_images_until, EnrichmentReport, ImageFailure};

/// Default maximum image payload sent to the service: 5 MB.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Prompt for general images.
pub const IMAGE_PROMPT: &str = "Describe this image in detail. State what kind of image it is \
(photo, diagram, screenshot, chart), the main subjects, any visible text, and what it conveys.";

/// Prompt for charts and graphs.
pub const CHART_PROMPT: &str = "Describe this chart. State the chart type, its title and axis \
labels, the data series shown, the main trends, and the key takeaways.";

/// Suggested prompt for an image, based on its part name.
pub fn prompt_for(image: &ImageData) -> &'static str {
    if image.looks_like_chart() {
        CHART_PROMPT
    } else {
        IMAGE_PROMPT
    }
}

/// Failure of a single vision call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisionError {
    /// The service may succeed if asked again (rate limit, overload, network).
    #[error("transient vision service failure: {0}")]
    Transient(String),

    /// The service will not describe this image.
    #[error("vision service rejected the image: {0}")]
    Permanent(String),

    /// No response within the per-call timeout.
    #[error("vision call timed out after {0:?}")]
    Timeout(Duration),

    /// The image bytes could not be loaded from the source file.
    #[error("image unavailable: {0}")]
    ImageUnavailable(String),
}

impl VisionError {
    /// Whether one more attempt is worthwhile.
    pub fn is_transient(&self) -> bool {
        matches!(self, VisionError::Transient(_) | VisionError::Timeout(_))
    }
}

/// An external service that describes images in natural language.
#[async_trait]
pub trait VisionService: Send + Sync {
    /// Describe one image.
    async fn describe(&self, image: &ImageData) -> Result<String, VisionError>;
}

/// Settings for a description batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionConfig {
    /// Maximum concurrent calls
    pub concurrency: usize,

    /// Timeout for each call
    pub timeout: Duration,

    /// Retries after a transient failure
    pub max_retries: u32,

    /// Delay before the first retry; doubles for each further retry
    pub retry_backoff: Duration,

    /// Largest payload sent to the service
    pub max_image_bytes: usize,
}

impl VisionConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry count for transient failures.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the largest payload sent to the service.
    pub fn with_max_image_bytes(mut self, bytes: usize) -> Self {
        self.max_image_bytes = bytes;
        self
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout: Duration::from_secs(30),
            max_retries: 1,
            retry_backoff: Duration::from_millis(500),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}
