//! Shared test doubles: a scriptable decoder, a simulated XR runtime and a
//! recording shell.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use glam::{Mat4, Quat, Vec3};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use myth_placement::animation::AnimationClip;
use myth_placement::assets::{
    AssetCatalog, AssetDecoder, AssetDescriptor, AssetId, AssetLoader, DecodeError, DecodeOptions,
    LoadProgress, LoaderOptions, MaterialDescription, MeshDescription, ModelDescription,
    NodeDescription, TextureDescription,
};
use myth_placement::resources::{GpuResourceRegistry, MapSlot};
use myth_placement::session::{
    HitTestResult, HitTestSource, SessionId, XrError, XrFrame, XrSession, XrSystem,
};
use myth_placement::shell::{Chrome, Shell};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Lets spawned tasks run and paused time auto-advance a little.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// ============================================================================
// Assets
// ============================================================================

pub fn descriptors(count: u32) -> Vec<AssetDescriptor> {
    (1..=count)
        .map(|i| AssetDescriptor::new(i, format!("Asset {i}"), format!("models/asset_{i}.glb")))
        .collect()
}

/// Two meshes, three materials (one mesh is multi-material), four texture maps,
/// one animation clip.
pub fn sample_model(name: &str) -> ModelDescription {
    let body = MeshDescription {
        geometry: format!("{name}_body"),
        vertex_count: 1200,
        materials: vec![
            MaterialDescription {
                name: format!("{name}_skin"),
                maps: vec![
                    TextureDescription {
                        label: format!("{name}_skin_albedo"),
                        slot: MapSlot::BaseColor,
                    },
                    TextureDescription {
                        label: format!("{name}_skin_normal"),
                        slot: MapSlot::Normal,
                    },
                ],
            },
            MaterialDescription {
                name: format!("{name}_eyes"),
                maps: vec![TextureDescription {
                    label: format!("{name}_eyes_albedo"),
                    slot: MapSlot::BaseColor,
                }],
            },
        ],
    };
    let base = MeshDescription {
        geometry: format!("{name}_base"),
        vertex_count: 64,
        materials: vec![MaterialDescription {
            name: format!("{name}_base"),
            maps: vec![TextureDescription {
                label: format!("{name}_base_orm"),
                slot: MapSlot::MetallicRoughness,
            }],
        }],
    };

    ModelDescription::new(
        NodeDescription::new(name)
            .with_child(NodeDescription::new("body").with_mesh(body))
            .with_child(NodeDescription::new("base").with_mesh(base)),
    )
    .with_clip(AnimationClip::new("idle", 2.0))
}

pub const SAMPLE_GEOMETRIES: usize = 2;
pub const SAMPLE_MATERIALS: usize = 3;
pub const SAMPLE_TEXTURES: usize = 4;

/// Scripted behavior of one asset.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub delay: Duration,
    pub fail_primary: bool,
    pub fail_fallback: bool,
}

/// Decoder that counts calls and follows a per-asset [`Script`].
#[derive(Default)]
pub struct CountingDecoder {
    scripts: Mutex<FxHashMap<AssetId, Script>>,
    calls: Mutex<Vec<(AssetId, DecodeOptions)>>,
}

impl CountingDecoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, id: u32, script: Script) {
        self.scripts.lock().insert(AssetId(id), script);
    }

    pub fn delay(&self, id: u32, delay: Duration) {
        self.scripts.lock().entry(AssetId(id)).or_default().delay = delay;
    }

    pub fn fail(&self, id: u32) {
        self.script(
            id,
            Script {
                fail_primary: true,
                fail_fallback: true,
                ..Default::default()
            },
        );
    }

    pub fn heal(&self, id: u32) {
        self.scripts.lock().remove(&AssetId(id));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_for(&self, id: u32) -> Vec<DecodeOptions> {
        self.calls
            .lock()
            .iter()
            .filter(|(asset, _)| *asset == AssetId(id))
            .map(|(_, options)| *options)
            .collect()
    }
}

impl AssetDecoder for CountingDecoder {
    fn decode(
        &self,
        descriptor: &AssetDescriptor,
        options: DecodeOptions,
        progress: LoadProgress,
    ) -> BoxFuture<'static, Result<ModelDescription, DecodeError>> {
        self.calls.lock().push((descriptor.id, options));
        let script = self
            .scripts
            .lock()
            .get(&descriptor.id)
            .cloned()
            .unwrap_or_default();
        let name = descriptor.name.replace(' ', "_").to_lowercase();

        async move {
            progress.report(0.0);
            if !script.delay.is_zero() {
                tokio::time::sleep(script.delay).await;
            }
            let fails = if options.compression {
                script.fail_primary
            } else {
                script.fail_fallback
            };
            if fails {
                return Err(DecodeError::new(format!("{} decode failed", options.path_name())));
            }
            progress.report(1.0);
            Ok(sample_model(&name))
        }
        .boxed()
    }
}

pub fn loader_with(
    decoder: Arc<CountingDecoder>,
    assets: u32,
    options: LoaderOptions,
) -> (Arc<AssetLoader>, Arc<GpuResourceRegistry>) {
    let catalog = Arc::new(AssetCatalog::new(descriptors(assets)).expect("catalog"));
    let registry = Arc::new(GpuResourceRegistry::new());
    let loader = Arc::new(AssetLoader::new(
        catalog,
        decoder,
        Arc::clone(&registry),
        options,
    ));
    (loader, registry)
}

// ============================================================================
// XR Runtime
// ============================================================================

#[derive(Default)]
pub struct FakeSource {
    pub cancelled: AtomicBool,
}

impl HitTestSource for FakeSource {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

pub struct FakeSession {
    id: SessionId,
    pub source_delay: Duration,
    pub fail_source: AtomicBool,
    pub ended: AtomicBool,
    pub source_requests: AtomicUsize,
    pub sources: Mutex<Vec<Arc<FakeSource>>>,
}

impl FakeSession {
    pub fn new(id: u64) -> Arc<Self> {
        Self::with_source_delay(id, Duration::ZERO)
    }

    pub fn with_source_delay(id: u64, source_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: SessionId(id),
            source_delay,
            fail_source: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            source_requests: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
        })
    }

    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn XrSession> {
        Arc::clone(self) as Arc<dyn XrSession>
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }
}

impl XrSession for FakeSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn request_hit_test_source(&self) -> BoxFuture<'_, Result<Arc<dyn HitTestSource>, XrError>> {
        self.source_requests.fetch_add(1, Ordering::SeqCst);
        async move {
            if !self.source_delay.is_zero() {
                tokio::time::sleep(self.source_delay).await;
            }
            if self.fail_source.load(Ordering::SeqCst) {
                return Err(XrError::new("hit-test unsupported in this space"));
            }
            let source = Arc::new(FakeSource::default());
            self.sources.lock().push(Arc::clone(&source));
            Ok(source as Arc<dyn HitTestSource>)
        }
        .boxed()
    }

    fn end(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }
}

pub struct FakeSystem {
    pub supported: AtomicBool,
    pub support_delay: Duration,
    pub refuse_session: AtomicBool,
    next_id: AtomicU64,
    pub sessions: Mutex<Vec<Arc<FakeSession>>>,
}

impl FakeSystem {
    pub fn new() -> Arc<Self> {
        Self::with_support_delay(Duration::ZERO)
    }

    pub fn unsupported() -> Arc<Self> {
        let system = Self::new();
        system.supported.store(false, Ordering::SeqCst);
        system
    }

    pub fn with_support_delay(support_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            supported: AtomicBool::new(true),
            support_delay,
            refuse_session: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(Vec::new()),
        })
    }

    pub fn last_session(&self) -> Option<Arc<FakeSession>> {
        self.sessions.lock().last().cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

impl XrSystem for FakeSystem {
    fn is_immersive_supported(&self) -> BoxFuture<'_, bool> {
        async move {
            if !self.support_delay.is_zero() {
                tokio::time::sleep(self.support_delay).await;
            }
            self.supported.load(Ordering::SeqCst)
        }
        .boxed()
    }

    fn request_session(&self) -> BoxFuture<'_, Result<Arc<dyn XrSession>, XrError>> {
        async move {
            if self.refuse_session.load(Ordering::SeqCst) {
                return Err(XrError::new("user denied camera access"));
            }
            let session = FakeSession::new(self.next_id.fetch_add(1, Ordering::SeqCst));
            self.sessions.lock().push(Arc::clone(&session));
            Ok(session as Arc<dyn XrSession>)
        }
        .boxed()
    }
}

/// One scripted frame.
pub struct FakeFrame {
    pub session: SessionId,
    pub viewer: Option<Vec3>,
    pub hits: Result<Vec<HitTestResult>, XrError>,
}

impl FakeFrame {
    pub fn empty(session: SessionId) -> Self {
        Self {
            session,
            viewer: Some(Vec3::new(0.0, 1.6, 0.0)),
            hits: Ok(Vec::new()),
        }
    }

    pub fn hit(session: SessionId, viewer: Vec3, at: Vec3) -> Self {
        Self {
            session,
            viewer: Some(viewer),
            hits: Ok(vec![HitTestResult::at(surface_pose(at))]),
        }
    }
}

impl XrFrame for FakeFrame {
    fn session_id(&self) -> SessionId {
        self.session
    }

    fn viewer_position(&self) -> Option<Vec3> {
        self.viewer
    }

    fn hit_test_results(&self, _source: &dyn HitTestSource) -> Result<Vec<HitTestResult>, XrError> {
        self.hits.clone()
    }
}

/// Pose of a horizontal surface hit at `at`, rotated a quarter turn about Y.
pub fn surface_pose(at: Vec3) -> Mat4 {
    Mat4::from_rotation_translation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2), at)
}

// ============================================================================
// Shell
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    Status(String),
    Toast(String),
    Chrome(Chrome, bool),
    Overlay(Option<String>),
}

#[derive(Default)]
pub struct RecordingShell {
    events: Mutex<Vec<ShellEvent>>,
}

impl RecordingShell {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ShellEvent> {
        self.events.lock().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ShellEvent::Status(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn toasts(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ShellEvent::Toast(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every visibility change sent for `chrome`, in order.
    pub fn chrome(&self, chrome: Chrome) -> Vec<bool> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ShellEvent::Chrome(c, visible) if *c == chrome => Some(*visible),
                _ => None,
            })
            .collect()
    }

    pub fn last_overlay(&self) -> Option<Option<String>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            ShellEvent::Overlay(text) => Some(text.clone()),
            _ => None,
        })
    }
}

impl Shell for RecordingShell {
    fn set_status(&self, text: &str) {
        self.events.lock().push(ShellEvent::Status(text.to_string()));
    }

    fn toast(&self, text: &str) {
        self.events.lock().push(ShellEvent::Toast(text.to_string()));
    }

    fn set_chrome_visible(&self, chrome: Chrome, visible: bool) {
        self.events.lock().push(ShellEvent::Chrome(chrome, visible));
    }

    fn set_debug_overlay(&self, text: Option<&str>) {
        self.events
            .lock()
            .push(ShellEvent::Overlay(text.map(str::to_string)));
    }
}
