//! Asset Cache & Loader
//!
//! [`AssetLoader::request`] resolves a logical id to a fresh [`AssetInstance`]:
//!
//! 1. **Cached**: the template is cloned immediately.
//! 2. **In flight**: the caller joins the existing load; no second decode is
//!    submitted for the same id.
//! 3. **Otherwise**: a load task is spawned. It tries the primary decoding path,
//!    falls back once to the path without compression support, and races both
//!    against a single deadline. Success caches the template; failure or timeout
//!    marks the id `Failed` so the next request starts over.
//!
//! Load tasks run detached from their callers, so an id never stays
//! `InFlight` because every waiter went away. When the deadline wins, the
//! decode future is dropped and its late result can never reach the cache.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::assets::catalog::{AssetCatalog, AssetDescriptor, AssetId};
use crate::assets::decoder::{AssetDecoder, DecodeOptions, LoadProgress, ProgressListener};
use crate::assets::instance::{AssetInstance, AssetTemplate, InstanceOrigin};
use crate::assets::model::ModelDescription;
use crate::errors::{PlacementError, Result};
use crate::resources::GpuResourceRegistry;
use crate::settings::PlacementSettings;

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<AssetTemplate>>>>;

/// Per-descriptor load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotRequested,
    InFlight,
    Cached,
    Failed,
}

/// Loader tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoaderOptions {
    /// Deadline shared by the primary and fallback attempts
    pub timeout: Duration,
    /// Whether a failed primary decode is retried without compression support
    pub fallback: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            fallback: true,
        }
    }
}

impl From<&PlacementSettings> for LoaderOptions {
    fn from(settings: &PlacementSettings) -> Self {
        Self {
            timeout: settings.load_timeout(),
            fallback: settings.fallback_decoding,
        }
    }
}

/// Outcome of [`AssetLoader::preload_all`].
#[derive(Debug, Default)]
pub struct PreloadReport {
    pub requested: usize,
    pub succeeded: usize,
    pub failures: Vec<(AssetId, PlacementError)>,
}

impl PreloadReport {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && self.succeeded == self.requested
    }
}

enum Entry {
    InFlight {
        ticket: u64,
        load: SharedLoad,
        /// Cleared by [`AssetLoader::clear`]: the result goes to waiters only
        retain: bool,
    },
    Cached(Arc<AssetTemplate>),
    Failed(PlacementError),
}

#[derive(Default)]
struct LoaderState {
    entries: FxHashMap<AssetId, Entry>,
    next_ticket: u64,
    loads_started: u64,
}

pub struct AssetLoader {
    catalog: Arc<AssetCatalog>,
    decoder: Arc<dyn AssetDecoder>,
    resources: Arc<GpuResourceRegistry>,
    options: LoaderOptions,
    state: Arc<Mutex<LoaderState>>,
    progress: Mutex<Option<ProgressListener>>,
}

impl AssetLoader {
    #[must_use]
    pub fn new(
        catalog: Arc<AssetCatalog>,
        decoder: Arc<dyn AssetDecoder>,
        resources: Arc<GpuResourceRegistry>,
        options: LoaderOptions,
    ) -> Self {
        Self {
            catalog,
            decoder,
            resources,
            options,
            state: Arc::new(Mutex::new(LoaderState::default())),
            progress: Mutex::new(None),
        }
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Resolves `id` to a new instance owned by the caller.
    pub async fn request(&self, id: AssetId) -> Result<AssetInstance> {
        let (template, launched) = self.acquire(id).await?;
        let origin = if launched {
            InstanceOrigin::Decoded
        } else {
            InstanceOrigin::Cloned
        };
        Ok(template.instantiate(&self.resources, origin))
    }

    /// Resolves `id` to its cached template without instantiating it.
    pub async fn load_template(&self, id: AssetId) -> Result<Arc<AssetTemplate>> {
        self.acquire(id).await.map(|(template, _)| template)
    }

    /// Requests every catalog entry concurrently, tolerating individual failures.
    pub async fn preload_all(&self) -> PreloadReport {
        let ids: Vec<AssetId> = self.catalog.ids().collect();
        let loads = ids
            .iter()
            .map(|&id| async move { (id, self.load_template(id).await) });
        let results = futures::future::join_all(loads).await;

        let mut report = PreloadReport {
            requested: ids.len(),
            ..Default::default()
        };
        for (id, result) in results {
            match result {
                Ok(_) => report.succeeded += 1,
                Err(err) => report.failures.push((id, err)),
            }
        }
        log::info!(
            "Preloaded {}/{} assets",
            report.succeeded,
            report.requested
        );
        report
    }

    /// Returns the template, plus whether this call started the decode.
    async fn acquire(&self, id: AssetId) -> Result<(Arc<AssetTemplate>, bool)> {
        let descriptor = self
            .catalog
            .get(id)
            .cloned()
            .ok_or(PlacementError::UnknownAsset(id))?;

        let (load, launched) = {
            let mut state = self.state.lock();
            match state.entries.get(&id) {
                Some(Entry::Cached(template)) => {
                    log::debug!("Asset {id} served from cache");
                    return Ok((Arc::clone(template), false));
                }
                Some(Entry::InFlight { load, .. }) => {
                    log::debug!("Asset {id} already loading, joining in-flight request");
                    (load.clone(), false)
                }
                Some(Entry::Failed(_)) | None => {
                    state.next_ticket += 1;
                    state.loads_started += 1;
                    let ticket = state.next_ticket;
                    let load = self.launch(descriptor, ticket);
                    state.entries.insert(
                        id,
                        Entry::InFlight {
                            ticket,
                            load: load.clone(),
                            retain: true,
                        },
                    );
                    (load, true)
                }
            }
        };

        let template = load.await?;
        Ok((template, launched))
    }

    fn launch(&self, descriptor: AssetDescriptor, ticket: u64) -> SharedLoad {
        let id = descriptor.id;
        let decoder = Arc::clone(&self.decoder);
        let state = Arc::clone(&self.state);
        let options = self.options;
        let progress = LoadProgress::new(id, self.progress.lock().clone());

        log::info!("Loading asset {id} from {}", descriptor.uri);

        let task = tokio::spawn(async move {
            let decode = decode_with_fallback(decoder, descriptor, options.fallback, progress);
            let outcome = match tokio::time::timeout(options.timeout, decode).await {
                Ok(Ok(model)) => Ok(Arc::new(AssetTemplate::new(id, model))),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(PlacementError::Timeout {
                    id,
                    after: options.timeout,
                }),
            };
            settle(&state, id, ticket, &outcome);
            outcome
        });

        let state = Arc::clone(&self.state);
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    let outcome = Err(PlacementError::DecodeFailure {
                        id,
                        primary: format!("load task aborted: {join_err}"),
                        fallback: "not attempted".to_string(),
                    });
                    settle(&state, id, ticket, &outcome);
                    outcome
                }
            }
        }
        .boxed()
        .shared()
    }

    // ========================================================================
    // State & Cache Management
    // ========================================================================

    #[must_use]
    pub fn load_state(&self, id: AssetId) -> LoadState {
        match self.state.lock().entries.get(&id) {
            None => LoadState::NotRequested,
            Some(Entry::InFlight { .. }) => LoadState::InFlight,
            Some(Entry::Cached(_)) => LoadState::Cached,
            Some(Entry::Failed(_)) => LoadState::Failed,
        }
    }

    /// The error recorded by the last failed load of `id`.
    #[must_use]
    pub fn last_error(&self, id: AssetId) -> Option<PlacementError> {
        match self.state.lock().entries.get(&id) {
            Some(Entry::Failed(err)) => Some(err.clone()),
            _ => None,
        }
    }

    /// Number of load tasks started since creation.
    #[must_use]
    pub fn loads_started(&self) -> u64 {
        self.state.lock().loads_started
    }

    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.state
            .lock()
            .entries
            .values()
            .filter(|e| matches!(e, Entry::Cached(_)))
            .count()
    }

    /// Drops every cached or failed entry.
    ///
    /// In-flight loads stay registered, so a request arriving before they
    /// settle still joins them instead of decoding again, but their results are
    /// handed to the waiters only and never cached.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.retain(|_, entry| match entry {
            Entry::InFlight { retain, .. } => {
                *retain = false;
                true
            }
            Entry::Cached(_) | Entry::Failed(_) => false,
        });
    }

    /// Installs the advisory progress listener used by subsequent loads.
    pub fn set_progress_listener(&self, listener: Option<ProgressListener>) {
        *self.progress.lock() = listener;
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<AssetCatalog> {
        &self.catalog
    }

    #[must_use]
    pub fn resources(&self) -> &Arc<GpuResourceRegistry> {
        &self.resources
    }

    #[must_use]
    pub fn options(&self) -> LoaderOptions {
        self.options
    }
}

/// Stores a finished load, unless the entry was replaced meanwhile.
fn settle(state: &Mutex<LoaderState>, id: AssetId, ticket: u64, outcome: &Result<Arc<AssetTemplate>>) {
    let mut state = state.lock();
    let retain = match state.entries.get(&id) {
        Some(Entry::InFlight { ticket: t, retain, .. }) if *t == ticket => *retain,
        _ => {
            log::warn!("Discarding stale load result for asset {id}");
            return;
        }
    };
    if !retain {
        log::debug!("Asset {id} settled after the cache was cleared, not storing");
        state.entries.remove(&id);
        return;
    }

    match outcome {
        Ok(template) => {
            log::info!("Asset {id} decoded and cached");
            state.entries.insert(id, Entry::Cached(Arc::clone(template)));
        }
        Err(err) => {
            log::error!("Asset {id} failed to load: {err}");
            state.entries.insert(id, Entry::Failed(err.clone()));
        }
    }
}

async fn decode_with_fallback(
    decoder: Arc<dyn AssetDecoder>,
    descriptor: AssetDescriptor,
    fallback: bool,
    progress: LoadProgress,
) -> Result<ModelDescription> {
    let id = descriptor.id;

    let primary = match decoder
        .decode(&descriptor, DecodeOptions::primary(), progress.clone())
        .await
    {
        Ok(model) => return Ok(model),
        Err(err) => err,
    };

    if !fallback {
        return Err(PlacementError::DecodeFailure {
            id,
            primary: primary.0,
            fallback: "disabled".to_string(),
        });
    }

    log::warn!("Primary decode of asset {id} failed ({primary}), retrying without compression");

    match decoder
        .decode(&descriptor, DecodeOptions::fallback(), progress)
        .await
    {
        Ok(model) => {
            log::info!("Asset {id} decoded via fallback path");
            Ok(model)
        }
        Err(err) => Err(PlacementError::DecodeFailure {
            id,
            primary: primary.0,
            fallback: err.0,
        }),
    }
}
