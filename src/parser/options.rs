//! Parsing options and configuration.

use unicode_normalization::UnicodeNormalization;

/// Options for parsing documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Whether to use parallel processing (PDF page text)
    pub parallel: bool,

    /// Whether to NFC-normalize extracted text
    pub normalize_text: bool,

    /// Whether to record image references
    pub extract_images: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Enable or disable Unicode normalization of text.
    pub fn with_normalize_text(mut self, normalize: bool) -> Self {
        self.normalize_text = normalize;
        self
    }

    /// Enable or disable image reference collection.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Apply the text clean-up shared by all parsers: unify line endings,
    /// drop NUL characters, and optionally normalize to NFC.
    pub(crate) fn clean_text(&self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n").replace('\0', "");
        if self.normalize_text {
            unified.nfc().collect()
        } else {
            unified
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            normalize_text: true,
            extract_images: true,
        }
    }
}
