pub mod bounds;
pub mod builder;
pub mod layout;

pub use bounds::{prepare_atoms, PreparedAtoms, WorldBounds};
pub use builder::{BuildState, BuildStats, FrameGrid, GridBuilder};
pub use layout::{GridLayout, LargeCellMeta};
