use thiserror::Error;

/// Which capacity limit was blown during preprocessing or the build.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Capacity {
    Atoms,
    References,
}

impl std::fmt::Display for Capacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capacity::Atoms => write!(f, "atoms"),
            Capacity::References => write!(f, "references"),
        }
    }
}

/// Errors surfaced to the frame driver. None of these are handled inside the
/// core; the driver drops the frame (and for capacity errors, tells the user
/// to reduce the scene).
#[derive(Error, Debug)]
pub enum RenderError {
    /// Atom count or voxel reference count exceeds the configured cap.
    #[error("capacity exceeded: {0} (limit {1})")]
    CapacityExceeded(Capacity, u64),

    /// No atom intersects the world volume; there is nothing to build.
    #[error("no atoms intersect the world volume")]
    EmptyWorld,

    /// A build stage did not run to completion; the frame's BVH must not be
    /// consumed.
    #[error("BVH incomplete after stage {stage}")]
    BvhIncomplete { stage: &'static str },

    /// Compute backend failure (dispatch setup, buffer allocation, ...).
    #[error("backend error: {0}")]
    Backend(String),

    /// Invalid configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Per-ray traversal fault codes. These are recorded per pixel (the pixel
/// renders a marker color) and never fail the frame.
pub mod fault {
    pub const NONE: u32 = 0;
    pub const FILL_LARGE: u32 = 1;
    pub const OUTER_PRIMARY: u32 = 2;
    pub const INNER_PRIMARY: u32 = 3;
    pub const SMALL_DDA: u32 = 4;
}
