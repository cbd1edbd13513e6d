//! Interactive ray tracing of large sphere collections (atoms) over a
//! per-frame two-level uniform voxel grid.
//!
//! Each frame the driver bins the supplied atoms into a coarse 2 nm grid
//! with a fine 0.25 nm grid inside every occupied cell, then shades one
//! thread per pixel: a batched two-level walk for primary rays and a short
//! fine-grid walk for the ambient-occlusion rays.

pub mod atom;
pub mod camera;
pub mod config;
pub mod device;
pub mod driver;
pub mod element;
pub mod error;
pub mod grid;
pub mod shade;
pub mod trace;

pub use atom::{Atom, ConvertedAtom};
pub use camera::CameraArgs;
pub use config::RenderConfig;
pub use driver::{AtomSource, CameraSource, FrameReport, RenderDriver};
pub use error::{Capacity, RenderError};
pub use shade::RenderTargets;
