//! Atom preprocessing: world bounding box, capacity verification, and the
//! per-atom conversion kernel.

use glam::Vec3;
use half::f16;
use rayon::prelude::*;

use crate::atom::{Atom, ConvertedAtom};
use crate::config::RenderConfig;
use crate::device::{Device, Kernel};
use crate::error::{Capacity, RenderError};
use crate::grid::layout::GridLayout;

/// Margin added to sphere diameters when estimating small-voxel footprints.
/// Covers the half-precision rounding of stored radii.
const FOOTPRINT_EPSILON: f32 = 1e-3;

/// Host-tier reduction block size.
const REDUCTION_BLOCK: usize = 65_536;

/// World-space bounding box of the frame's atoms, snapped to the large-voxel
/// lattice and clamped to the world cube.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldBounds {
    pub min: Vec3,
    pub max: Vec3,
}

/// Output of the preprocessing stage: packed device records plus the frame's
/// snapped bounds.
#[derive(Debug)]
pub struct PreparedAtoms {
    pub converted: Vec<ConvertedAtom>,
    pub bounds: WorldBounds,
    /// Atoms dropped for lying wholly outside the world volume.
    pub dropped: u32,
}

struct BlockReduction {
    min: Vec3,
    max: Vec3,
    reference_bound: u64,
}

impl BlockReduction {
    fn identity() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
            reference_bound: 0,
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            reference_bound: self.reference_bound + other.reference_bound,
        }
    }
}

/// Upper bound on the small-voxel references one atom can emit.
#[inline]
fn footprint_bound(radius: f32, small_edge: f32) -> u64 {
    let span = ((2.0 * radius + FOOTPRINT_EPSILON) / small_edge).ceil() as u64;
    span * span * span
}

/// Run the preprocessing stage: verify capacities, reduce the bounding box
/// over `position ± radius`, drop atoms wholly outside the world, and run
/// the conversion kernel.
pub fn prepare_atoms(
    device: &mut Device,
    config: &RenderConfig,
    layout: &GridLayout,
    atoms: &[Atom],
) -> Result<PreparedAtoms, RenderError> {
    if atoms.len() as u64 > config.max_atoms as u64 {
        return Err(RenderError::CapacityExceeded(
            Capacity::Atoms,
            config.max_atoms as u64,
        ));
    }

    let reduction = atoms
        .par_chunks(REDUCTION_BLOCK)
        .map(|block| {
            let mut acc = BlockReduction::identity();
            for atom in block {
                let r = atom.effective_radius();
                let p = Vec3::from_array(atom.position);
                acc.min = acc.min.min(p - Vec3::splat(r));
                acc.max = acc.max.max(p + Vec3::splat(r));
                acc.reference_bound += footprint_bound(r, layout.small_edge);
            }
            acc
        })
        .reduce(BlockReduction::identity, BlockReduction::merge);

    if reduction.reference_bound > config.max_references as u64 {
        return Err(RenderError::CapacityExceeded(
            Capacity::References,
            config.max_references as u64,
        ));
    }

    // Drop atoms whose bounding box misses the world cube outright.
    let half = 0.5 * layout.world_edge;
    let kept: Vec<&Atom> = atoms
        .iter()
        .filter(|atom| {
            let r = atom.effective_radius();
            let p = Vec3::from_array(atom.position);
            (p - Vec3::splat(r)).cmple(Vec3::splat(half)).all()
                && (p + Vec3::splat(r)).cmpge(Vec3::splat(-half)).all()
        })
        .collect();
    if kept.is_empty() {
        return Err(RenderError::EmptyWorld);
    }
    let dropped = (atoms.len() - kept.len()) as u32;

    let bounds = snap_bounds(reduction.min, reduction.max, layout);

    let world_min = layout.world_min();
    let converted = device.dispatch_map(Kernel::ConvertAtoms, kept.len() as u32, |i| {
        let atom = kept[i as usize];
        let center = Vec3::from_array(atom.position) - world_min;
        ConvertedAtom {
            center: center.to_array(),
            radius: f16::from_f32(atom.effective_radius()),
            element: atom.element as u16,
        }
    });

    Ok(PreparedAtoms {
        converted,
        bounds,
        dropped,
    })
}

/// Snap to the large-voxel lattice and clamp to the world cube. Guarantees
/// the box is large-voxel aligned so DDA entry points land on cell borders.
pub fn snap_bounds(min: Vec3, max: Vec3, layout: &GridLayout) -> WorldBounds {
    let h = layout.large_edge;
    let half = 0.5 * layout.world_edge;
    let min = ((min / h).floor() * h).clamp(Vec3::splat(-half), Vec3::splat(half));
    let max = ((max / h).ceil() * h).clamp(Vec3::splat(-half), Vec3::splat(half));
    WorldBounds { min, max }
}
