use std::fmt;

use crate::gpu::GraphicsError;

/// Lifecycle state of a [`RenderSurface`](super::RenderSurface).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// Constructed, not yet mounted.
    Uninitialized,
    /// Acquiring a context and building the program.
    Initializing,
    /// Drawing one frame per host frame callback.
    Running,
    /// The platform took the context away; waiting for restoration.
    ContextLost,
    /// Restoration signalled; rebuild scheduled after a short delay.
    Recovering,
    /// Showing static fallback content for the rest of the session.
    Fallback,
    /// Unmounted. Nothing further happens.
    Disposed,
}

impl SurfaceState {
    /// Whether the surface still owns, or may own again, a GPU context.
    pub const fn is_live(self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::Running | Self::ContextLost | Self::Recovering
        )
    }
}

impl fmt::Display for SurfaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::ContextLost => "context-lost",
            Self::Recovering => "recovering",
            Self::Fallback => "fallback",
            Self::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// Why a surface ended up in [`SurfaceState::Fallback`].
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// No GPU context could be acquired.
    Unsupported,
    /// Program build or init hook failed.
    ShaderFailed(GraphicsError),
    /// The frame-rate monitor latched.
    PerformanceDowngrade {
        /// Window average that triggered, rounded to one decimal.
        avg_fps: f64,
    },
    /// The registry handed this surface's slot to someone else.
    Evicted,
    /// The registry refused a slot at mount.
    Rejected,
    /// Rebuilding after a context restore failed.
    RecoveryFailed(Option<GraphicsError>),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => f.write_str("no GPU context available"),
            Self::ShaderFailed(e) => write!(f, "shader setup failed: {e}"),
            Self::PerformanceDowngrade { avg_fps } => {
                write!(f, "performance downgrade at {avg_fps} fps")
            }
            Self::Evicted => f.write_str("evicted by the resource registry"),
            Self::Rejected => f.write_str("rejected by the resource registry"),
            Self::RecoveryFailed(Some(e)) => {
                write!(f, "context recovery failed: {e}")
            }
            Self::RecoveryFailed(None) => {
                f.write_str("context recovery failed: no context")
            }
        }
    }
}
