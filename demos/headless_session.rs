//! Headless placement session.
//!
//! Drives an [`ArApp`] through a scripted simulated device: orbit view,
//! entering AR, placing the model on a detected floor, cycling through the
//! catalog, and leaving AR again.
//!
//! ```bash
//! RUST_LOG=info cargo run --example headless_session
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use glam::{Mat4, Vec3};
use myth_placement::animation::AnimationClip;
use myth_placement::assets::{
    AssetDecoder, AssetDescriptor, DecodeError, DecodeOptions, LoadProgress, MaterialDescription,
    MeshDescription, ModelDescription, NodeDescription, TextureDescription,
};
use myth_placement::resources::MapSlot;
use myth_placement::session::{
    HitTestResult, HitTestSource, SessionId, XrError, XrFrame, XrSession, XrSystem,
};
use myth_placement::{AppConfig, AppEvent, ArApp, Command, LogShell, PlacementSettings};

/// Pretends that compressed meshes need a codec this device lacks: the primary
/// path fails for `.drc` sources and the fallback succeeds after a short delay.
struct SimulatedDecoder;

impl AssetDecoder for SimulatedDecoder {
    fn decode(
        &self,
        descriptor: &AssetDescriptor,
        options: DecodeOptions,
        progress: LoadProgress,
    ) -> BoxFuture<'static, Result<ModelDescription, DecodeError>> {
        let name = descriptor.name.clone();
        let compressed = descriptor.uri.ends_with(".drc");
        async move {
            if compressed && options.compression {
                return Err(DecodeError::new("mesh compression codec not available"));
            }
            for step in 1..=4 {
                tokio::time::sleep(Duration::from_millis(50)).await;
                progress.report(step as f32 / 4.0);
            }
            let mesh = MeshDescription {
                geometry: format!("{name}_mesh"),
                vertex_count: 2048,
                materials: vec![MaterialDescription {
                    name: format!("{name}_pbr"),
                    maps: vec![TextureDescription {
                        label: format!("{name}_albedo"),
                        slot: MapSlot::BaseColor,
                    }],
                }],
            };
            Ok(
                ModelDescription::new(NodeDescription::new(&name).with_mesh(mesh))
                    .with_clip(AnimationClip::new("idle", 1.5)),
            )
        }
        .boxed()
    }
}

struct FloorSource;

impl HitTestSource for FloorSource {}

struct SimulatedSession {
    id: SessionId,
    ended: AtomicBool,
}

impl XrSession for SimulatedSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn request_hit_test_source(&self) -> BoxFuture<'_, Result<Arc<dyn HitTestSource>, XrError>> {
        async { Ok(Arc::new(FloorSource) as Arc<dyn HitTestSource>) }.boxed()
    }

    fn end(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct SimulatedSystem {
    next_id: AtomicU64,
}

impl XrSystem for SimulatedSystem {
    fn is_immersive_supported(&self) -> BoxFuture<'_, bool> {
        async { true }.boxed()
    }

    fn request_session(&self) -> BoxFuture<'_, Result<Arc<dyn XrSession>, XrError>> {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        async move {
            Ok(Arc::new(SimulatedSession {
                id,
                ended: AtomicBool::new(false),
            }) as Arc<dyn XrSession>)
        }
        .boxed()
    }
}

/// The floor is 1.6 m below the viewer; the hit test reaches it once the device
/// points down far enough.
struct SimulatedFrame {
    session: SessionId,
    floor_hit: Option<Vec3>,
}

impl XrFrame for SimulatedFrame {
    fn session_id(&self) -> SessionId {
        self.session
    }

    fn viewer_position(&self) -> Option<Vec3> {
        Some(Vec3::new(0.0, 1.6, 0.0))
    }

    fn hit_test_results(&self, _source: &dyn HitTestSource) -> Result<Vec<HitTestResult>, XrError> {
        Ok(self
            .floor_hit
            .map(|at| vec![HitTestResult::at(Mat4::from_translation(at))])
            .unwrap_or_default())
    }
}

async fn run_frames(app: &ArApp, session: SessionId, floor_hit: Option<Vec3>, count: usize) -> anyhow::Result<()> {
    let frame = SimulatedFrame { session, floor_hit };
    for _ in 0..count {
        app.dispatch(AppEvent::Frame {
            dt: 1.0 / 60.0,
            frame: Some(&frame),
        })
        .await?;
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::new(
        PlacementSettings {
            debug_overlay: true,
            ..Default::default()
        },
        vec![
            AssetDescriptor::new(1, "Fox", "models/fox.glb"),
            AssetDescriptor::new(2, "Lantern", "models/lantern.drc"),
            AssetDescriptor::new(3, "Chair", "models/chair.glb"),
        ],
    );

    let app = ArApp::new(
        config,
        Arc::new(SimulatedDecoder),
        Arc::new(SimulatedSystem::default()),
        Arc::new(LogShell),
    )?;

    if let Some(report) = app.start().await? {
        log::info!("Preload: {}/{} assets ready", report.succeeded, report.requested);
    }

    // Orbit view for a few frames
    for _ in 0..3 {
        app.dispatch(AppEvent::Frame { dt: 1.0 / 60.0, frame: None }).await?;
    }

    app.dispatch(AppEvent::Command(Command::ToggleMode)).await?;
    let session = app
        .mode_view()
        .session
        .ok_or_else(|| anyhow::anyhow!("immersive session did not start"))?;

    // Looking around before the floor is found
    run_frames(&app, session, None, 5).await?;
    app.dispatch(AppEvent::Select { session }).await?;

    // Floor found two meters ahead
    let spot = Vec3::new(0.0, 0.0, -2.0);
    run_frames(&app, session, Some(spot), 5).await?;
    app.dispatch(AppEvent::Select { session }).await?;

    // Too close to the viewer's feet
    run_frames(&app, session, Some(Vec3::new(0.0, 1.5, 0.0)), 2).await?;
    if let Err(err) = app.dispatch(AppEvent::Select { session }).await {
        log::warn!("Placement refused: {err}");
    }

    // Look away from the floor and cycle through the catalog
    for _ in 0..3 {
        run_frames(&app, session, None, 2).await?;
        app.dispatch(AppEvent::Select { session }).await?;
    }

    app.dispatch(AppEvent::Command(Command::ToggleMode)).await?;
    app.dispatch(AppEvent::SessionEnded { session }).await?;

    log::info!("Final state: {}", app.debug_snapshot());
    app.shutdown();
    log::info!("Live GPU resources after shutdown: {}", app.resources().live().total());
    Ok(())
}
