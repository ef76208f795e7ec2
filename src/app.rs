//! Application Context
//!
//! [`ArApp`] owns every subsystem and is the only place external events enter:
//! frames, select triggers, session-ended notifications and UI commands are all
//! delivered through [`ArApp::dispatch`].
//!
//! Interaction failures are surfaced to the [`Shell`] and returned to the
//! caller, but never leave the application in a half-applied state. Frame
//! processing never fails.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::assets::{
    AssetCatalog, AssetDecoder, AssetId, AssetLoader, LoaderOptions, PreloadReport,
};
use crate::coordinator::{AssetSlotCoordinator, AttachOutcome};
use crate::errors::{PlacementError, Result};
use crate::interaction::{InteractionController, PlacementRange, SelectContext, SelectOutcome};
use crate::resources::{GpuResourceRegistry, ResourceCounts};
use crate::scene::Placement;
use crate::session::{
    CursorPose, HitTestProcessor, ModeChange, ModeStateMachine, ModeView, SessionId, SessionMode,
    XrFrame, XrSystem,
};
use crate::settings::{AppConfig, PlacementSettings};
use crate::shell::{Chrome, Shell};

/// User-interface commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SelectAsset(AssetId),
    /// Enter immersive mode from WebView, or end the session from Immersive
    ToggleMode,
    ToggleDebugOverlay,
}

/// External events delivered to [`ArApp::dispatch`].
pub enum AppEvent<'a> {
    /// Per-frame callback. `frame` is present only while a session presents.
    Frame {
        dt: f32,
        frame: Option<&'a dyn XrFrame>,
    },
    /// Discrete select trigger of a session.
    Select { session: SessionId },
    /// The runtime ended a session, whoever asked for it.
    SessionEnded { session: SessionId },
    Command(Command),
}

impl fmt::Debug for AppEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame { dt, frame } => f
                .debug_struct("Frame")
                .field("dt", dt)
                .field("session", &frame.map(|fr| fr.session_id()))
                .finish(),
            Self::Select { session } => f.debug_struct("Select").field("session", session).finish(),
            Self::SessionEnded { session } => f
                .debug_struct("SessionEnded")
                .field("session", session)
                .finish(),
            Self::Command(cmd) => f.debug_tuple("Command").field(cmd).finish(),
        }
    }
}

/// Point-in-time state shown by the debug overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugSnapshot {
    pub mode: SessionMode,
    pub current_asset: Option<AssetId>,
    pub pending: Option<AssetId>,
    pub cursor_visible: bool,
    pub attached: usize,
    pub cached_templates: usize,
    pub live_resources: ResourceCounts,
}

impl fmt::Display for DebugSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let asset = self
            .current_asset
            .map_or_else(|| "none".to_string(), |id| id.to_string());
        write!(
            f,
            "mode={} asset={asset} loading={} cursor={} attached={} cached={} geo={} mat={} tex={}",
            self.mode,
            self.pending.is_some(),
            if self.cursor_visible { "on" } else { "off" },
            self.attached,
            self.cached_templates,
            self.live_resources.geometries,
            self.live_resources.materials,
            self.live_resources.textures,
        )
    }
}

#[derive(Default)]
struct ViewState {
    reticle_visible: bool,
    debug_overlay: bool,
}

pub struct ArApp {
    settings: PlacementSettings,
    catalog: Arc<AssetCatalog>,
    resources: Arc<GpuResourceRegistry>,
    system: Arc<dyn XrSystem>,
    shell: Arc<dyn Shell>,
    mode: ModeStateMachine,
    hit_test: HitTestProcessor,
    interaction: InteractionController,
    slot: AssetSlotCoordinator,
    view: Mutex<ViewState>,
}

impl ArApp {
    pub fn new(
        config: AppConfig,
        decoder: Arc<dyn AssetDecoder>,
        system: Arc<dyn XrSystem>,
        shell: Arc<dyn Shell>,
    ) -> Result<Self> {
        config.validate()?;
        let AppConfig { settings, assets } = config;

        let catalog = Arc::new(AssetCatalog::new(assets)?);
        let resources = Arc::new(GpuResourceRegistry::new());
        let loader = Arc::new(AssetLoader::new(
            Arc::clone(&catalog),
            decoder,
            Arc::clone(&resources),
            LoaderOptions::from(&settings),
        ));

        let progress_shell = Arc::clone(&shell);
        let progress_catalog = Arc::clone(&catalog);
        loader.set_progress_listener(Some(Arc::new(move |id, fraction| {
            progress_shell.set_status(&format!(
                "Loading {} {:.0}%",
                progress_catalog.name(id),
                fraction * 100.0
            ));
        })));

        let interaction =
            InteractionController::new(Arc::clone(&catalog), PlacementRange::from(&settings));
        let slot = AssetSlotCoordinator::new(loader, settings.default_scale);

        log::info!(
            "Placement app created: {} assets, timeout {:?}, fallback {}",
            catalog.len(),
            settings.load_timeout(),
            settings.fallback_decoding
        );

        Ok(Self {
            view: Mutex::new(ViewState {
                reticle_visible: false,
                debug_overlay: settings.debug_overlay,
            }),
            settings,
            catalog,
            resources,
            system,
            shell,
            mode: ModeStateMachine::new(),
            hit_test: HitTestProcessor::new(),
            interaction,
            slot,
        })
    }

    /// Shows the WebView chrome, optionally warms the cache, and attaches the
    /// first catalog entry at the canonical pose.
    pub async fn start(&self) -> Result<Option<PreloadReport>> {
        self.apply_view(self.mode.view());

        let report = if self.settings.preload {
            let report = self.slot.loader().preload_all().await;
            for (id, err) in &report.failures {
                self.shell
                    .toast(&format!("{} unavailable: {err}", self.catalog.name(*id)));
            }
            Some(report)
        } else {
            None
        };

        let first = self.catalog.first();
        match self
            .slot
            .attach(first, Placement::canonical(self.settings.default_scale))
            .await
        {
            Ok(outcome) => {
                self.report_attach(outcome);
                Ok(report)
            }
            Err(err) => {
                self.surface(&err);
                Err(err)
            }
        }
    }

    // ========================================================================
    // Event Dispatch
    // ========================================================================

    pub async fn dispatch(&self, event: AppEvent<'_>) -> Result<()> {
        match event {
            AppEvent::Frame { dt, frame } => {
                self.on_frame(dt, frame);
                Ok(())
            }
            AppEvent::Select { session } => self.on_select(session).await,
            AppEvent::SessionEnded { session } => {
                self.on_session_ended(session);
                Ok(())
            }
            AppEvent::Command(command) => self.on_command(command).await,
        }
    }

    fn on_frame(&self, dt: f32, frame: Option<&dyn XrFrame>) {
        self.slot.update(dt);

        let view = self.mode.view();
        let cursor = match (view.mode, self.mode.session(), frame) {
            (SessionMode::Immersive, Some(session), Some(frame)) => {
                self.hit_test.process_frame(&session, frame)
            }
            _ => CursorPose::hidden(),
        };
        self.set_reticle(cursor.visible && view.cursor_eligible);

        if self.view.lock().debug_overlay {
            self.shell
                .set_debug_overlay(Some(&self.debug_snapshot().to_string()));
        }
    }

    async fn on_select(&self, session: SessionId) -> Result<()> {
        let view = self.mode.view();
        if view.session != Some(session) {
            log::warn!("Ignoring select from inactive {session}");
            return Ok(());
        }

        let ctx = SelectContext {
            mode: view.mode,
            presenting: self.mode.session().is_some(),
            cursor: self.hit_test.cursor(),
            viewer: self.hit_test.viewer_position(),
        };

        match self.interaction.on_select(ctx, &self.slot).await {
            Ok(SelectOutcome::Placed { id, .. }) => {
                self.shell
                    .set_status(&format!("Placed {}", self.catalog.name(id)));
            }
            Ok(SelectOutcome::Cycled { to, .. }) => {
                self.shell
                    .set_status(&format!("Showing {}", self.catalog.name(to)));
            }
            Ok(SelectOutcome::NeedsSurface) => {
                self.shell.toast("Point your device at a surface to place the model");
            }
            Ok(SelectOutcome::Ignored | SelectOutcome::Coalesced | SelectOutcome::Superseded) => {}
            Err(err) => {
                self.surface(&err);
                return Err(err);
            }
        }
        Ok(())
    }

    fn on_session_ended(&self, session: SessionId) {
        if let ModeChange::Exited(view) = self.mode.end_session(session) {
            self.hit_test.reset();
            self.slot.reset_to_canonical();
            self.apply_view(view);
            self.shell.set_status("Left AR view");
        }
    }

    async fn on_command(&self, command: Command) -> Result<()> {
        match command {
            Command::SelectAsset(id) => {
                let result = self.select_asset(id).await;
                if let Err(err) = &result {
                    self.surface(err);
                }
                result
            }
            Command::ToggleMode => self.toggle_mode().await,
            Command::ToggleDebugOverlay => {
                let enabled = {
                    let mut view = self.view.lock();
                    view.debug_overlay = !view.debug_overlay;
                    view.debug_overlay
                };
                if enabled {
                    self.shell
                        .set_debug_overlay(Some(&self.debug_snapshot().to_string()));
                } else {
                    self.shell.set_debug_overlay(None);
                }
                Ok(())
            }
        }
    }

    async fn select_asset(&self, id: AssetId) -> Result<()> {
        self.interaction.select(id)?;
        let placement = self
            .slot
            .current_placement()
            .unwrap_or_else(|| Placement::canonical(self.settings.default_scale));
        let outcome = self.slot.attach(id, placement).await?;
        self.report_attach(outcome);
        Ok(())
    }

    async fn toggle_mode(&self) -> Result<()> {
        if self.mode.mode() == SessionMode::Immersive {
            self.mode.request_exit();
            return Ok(());
        }

        match self.mode.request_immersive(self.system.as_ref()).await {
            Ok(ModeChange::Entered(view)) => {
                self.slot.release_canonical_lock();
                self.apply_view(view);
                self.shell.set_status("Point at a surface and tap to place");
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(err) => {
                self.surface(&err);
                Err(err)
            }
        }
    }

    /// Ends any session and disposes every attached or cached asset.
    pub fn shutdown(&self) {
        self.mode.cancel_start();
        self.mode.request_exit();
        self.hit_test.reset();
        self.slot.shutdown();
        self.set_reticle(false);
    }

    // ========================================================================
    // Shell Helpers
    // ========================================================================

    fn apply_view(&self, view: ModeView) {
        self.shell
            .set_chrome_visible(Chrome::OrbitControls, view.orbit_controls);
        self.shell
            .set_chrome_visible(Chrome::DesktopControls, view.desktop_chrome);
        if !view.cursor_eligible {
            self.set_reticle(false);
        }
    }

    /// Forwards reticle visibility to the shell only when it changes.
    fn set_reticle(&self, visible: bool) {
        let changed = {
            let mut view = self.view.lock();
            let changed = view.reticle_visible != visible;
            view.reticle_visible = visible;
            changed
        };
        if changed {
            self.shell.set_chrome_visible(Chrome::Reticle, visible);
        }
    }

    fn report_attach(&self, outcome: AttachOutcome) {
        if let AttachOutcome::Attached { id, .. } = outcome {
            self.shell
                .set_status(&format!("Showing {}", self.catalog.name(id)));
        }
    }

    fn surface(&self, err: &PlacementError) {
        if err.is_advisory() {
            self.shell.toast(&err.to_string());
        } else {
            self.shell.set_status(&err.to_string());
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn debug_snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            mode: self.mode.mode(),
            current_asset: self.slot.current_asset(),
            pending: self.slot.pending(),
            cursor_visible: self.view.lock().reticle_visible,
            attached: self.slot.attached_count(),
            cached_templates: self.slot.loader().cached_count(),
            live_resources: self.resources.live(),
        }
    }

    #[must_use]
    pub fn mode_view(&self) -> ModeView {
        self.mode.view()
    }

    #[must_use]
    pub fn cursor(&self) -> CursorPose {
        self.hit_test.cursor()
    }

    #[must_use]
    pub fn coordinator(&self) -> &AssetSlotCoordinator {
        &self.slot
    }

    #[must_use]
    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    #[must_use]
    pub fn hit_test(&self) -> &HitTestProcessor {
        &self.hit_test
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
    pub fn settings(&self) -> &PlacementSettings {
        &self.settings
    }
}
