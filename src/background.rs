//! Asynchronous background image loading with request superseding.

use std::sync::Arc;
use std::task::{Context, Poll};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use image::RgbaImage;
use log::{debug, info, warn};

use crate::error::LoadError;

/// Monotonically increasing id of a background load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Fetches and decodes an image from a source string
pub trait ImageLoader: Send {
    fn load(&self, source: &str) -> BoxFuture<'static, Result<RgbaImage, LoadError>>;
}

/// Handles `data:` URLs and local file paths
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultImageLoader;

impl ImageLoader for DefaultImageLoader {
    fn load(&self, source: &str) -> BoxFuture<'static, Result<RgbaImage, LoadError>> {
        let source = source.to_owned();
        async move {
            let bytes = read_source(&source)?;
            decode_image(&bytes)
        }
        .boxed()
    }
}

fn read_source(source: &str) -> Result<Vec<u8>, LoadError> {
    if let Some(rest) = source.strip_prefix("data:") {
        return decode_data_url(rest);
    }
    if source.starts_with("http://") || source.starts_with("https://") {
        return Err(LoadError::Unsupported(source.to_owned()));
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        std::fs::read(source).map_err(|err| LoadError::Io {
            source_name: source.to_owned(),
            reason: err.to_string(),
        })
    }

    #[cfg(target_arch = "wasm32")]
    {
        Err(LoadError::Unsupported(source.to_owned()))
    }
}

/// Decodes the part of a data URL after `data:`; only base64 payloads are accepted
fn decode_data_url(rest: &str) -> Result<Vec<u8>, LoadError> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::InvalidDataUrl("missing ','".to_owned()))?;
    if !meta.ends_with(";base64") {
        return Err(LoadError::InvalidDataUrl(format!(
            "expected base64 payload, got `{meta}`"
        )));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|err| LoadError::InvalidDataUrl(err.to_string()))
}

pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, LoadError> {
    let img = image::load_from_memory(bytes)?;
    debug!("Decoded background image: {}x{}", img.width(), img.height());
    Ok(img.to_rgba8())
}

/// The result of a load that is still current
#[derive(Debug, Clone)]
pub enum BackgroundOutcome {
    Loaded { source: String, image: Arc<RgbaImage> },
    Failed { source: String, error: LoadError },
}

struct Completion {
    request: RequestId,
    source: String,
    result: Result<RgbaImage, LoadError>,
}

/// Tracks in-flight loads and discards any whose request was superseded
pub struct BackgroundLoader {
    loader: Box<dyn ImageLoader>,
    next_request: u64,
    current: Option<(RequestId, String)>,
    pending: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl std::fmt::Debug for BackgroundLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundLoader")
            .field("next_request", &self.next_request)
            .field("current", &self.current)
            .field("pending", &format!("<{} loads>", self.pending.len()))
            .finish()
    }
}

impl Default for BackgroundLoader {
    fn default() -> Self {
        Self::new(Box::new(DefaultImageLoader))
    }
}

impl BackgroundLoader {
    pub fn new(loader: Box<dyn ImageLoader>) -> Self {
        Self {
            loader,
            next_request: 0,
            current: None,
            pending: FuturesUnordered::new(),
        }
    }

    /// Start loading `source`; any earlier request becomes stale
    pub fn request(&mut self, source: &str) -> RequestId {
        self.next_request += 1;
        let request = RequestId(self.next_request);
        let owned = source.to_owned();
        self.current = Some((request, owned.clone()));

        info!("Loading background {source} (request {})", request.0);
        let load = self.loader.load(source);
        self.pending.push(
            async move {
                Completion {
                    request,
                    source: owned,
                    result: load.await,
                }
            }
            .boxed(),
        );
        request
    }

    /// Forget the current request so that in-flight loads are discarded
    pub fn cancel_current(&mut self) {
        self.current = None;
    }

    pub fn current_request(&self) -> Option<RequestId> {
        self.current.as_ref().map(|(id, _)| *id)
    }

    pub fn current_source(&self) -> Option<&str> {
        self.current.as_ref().map(|(_, source)| source.as_str())
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Drive in-flight loads without blocking and collect current outcomes
    pub fn poll_completions(&mut self) -> Vec<BackgroundOutcome> {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut outcomes = Vec::new();

        while let Poll::Ready(Some(done)) = self.pending.poll_next_unpin(&mut cx) {
            if self.current_request() != Some(done.request) {
                debug!("Discarding stale background load {}", done.request.0);
                continue;
            }
            self.current = None;
            outcomes.push(match done.result {
                Ok(image) => BackgroundOutcome::Loaded {
                    source: done.source,
                    image: Arc::new(image),
                },
                Err(error) => {
                    warn!("Background {} failed to load: {error}", done.source);
                    BackgroundOutcome::Failed {
                        source: done.source,
                        error,
                    }
                }
            });
        }
        outcomes
    }
}
