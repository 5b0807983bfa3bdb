//! Scripted providers for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::{GeneratedText, ImageGenerator, ProviderError, StockPhoto, StockPhotoSearch, TextGenerator};

fn failure(message: &str) -> ProviderError {
    ProviderError::Status {
        status: 503,
        body: message.to_string(),
    }
}

pub struct MockTextGenerator {
    reply: Result<GeneratedText, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn replying(text: impl Into<String>, tokens_used: i32) -> Self {
        Self {
            reply: Ok(GeneratedText {
                text: text.into(),
                tokens_used,
            }),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait::async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedText, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        self.reply.clone().map_err(|message| failure(&message))
    }

    fn model_name(&self) -> &str {
        "mock-text"
    }
}

pub struct MockImageGenerator {
    configured: bool,
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockImageGenerator {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            configured: true,
            reply: Ok(url.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            configured: true,
            reply: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::failing("not configured")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ImageGenerator for MockImageGenerator {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate_image(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(|message| failure(&message))
    }

    fn model_name(&self) -> &str {
        "mock-image"
    }
}

pub struct MockStockPhotos {
    configured: bool,
    reply: Result<Vec<StockPhoto>, String>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl MockStockPhotos {
    pub fn with_photos(photos: Vec<StockPhoto>) -> Self {
        Self {
            configured: true,
            reply: Ok(photos),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_photos(Vec::new())
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            ..Self::empty()
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::empty()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait::async_trait]
impl StockPhotoSearch for MockStockPhotos {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn search(&self, query: &str) -> Result<Vec<StockPhoto>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(query.to_string());
        self.reply.clone().map_err(|message| failure(&message))
    }
}
