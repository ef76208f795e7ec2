//! Host UI seam.
//!
//! Everything the coordinator wants to show the user goes through [`Shell`].
//! The embedding page or window decides how status lines, toasts and chrome
//! toggles are rendered.

use std::fmt;

/// Independently toggled pieces of UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chrome {
    /// Orbit-style camera controls of the non-immersive view
    OrbitControls,
    /// Desktop-only buttons and panels
    DesktopControls,
    /// The placement cursor
    Reticle,
}

impl fmt::Display for Chrome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrbitControls => f.write_str("orbit-controls"),
            Self::DesktopControls => f.write_str("desktop-controls"),
            Self::Reticle => f.write_str("reticle"),
        }
    }
}

pub trait Shell: Send + Sync {
    /// Replaces the persistent status line.
    fn set_status(&self, text: &str);

    /// Shows a transient notification.
    fn toast(&self, text: &str);

    fn set_chrome_visible(&self, chrome: Chrome, visible: bool);

    /// Shows `Some(text)` in the debug overlay, or hides it with `None`.
    fn set_debug_overlay(&self, text: Option<&str>);
}

/// A shell that only writes to the log. Used by headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogShell;

impl Shell for LogShell {
    fn set_status(&self, text: &str) {
        log::info!("[status] {text}");
    }

    fn toast(&self, text: &str) {
        log::info!("[toast] {text}");
    }

    fn set_chrome_visible(&self, chrome: Chrome, visible: bool) {
        log::debug!("[chrome] {chrome} visible={visible}");
    }

    fn set_debug_overlay(&self, text: Option<&str>) {
        if let Some(text) = text {
            log::trace!("[overlay] {text}");
        }
    }
}
