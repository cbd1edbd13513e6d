use glam::Vec3;

use crate::grid::FrameGrid;

/// Sentinel for "no atom".
pub const NO_ATOM: u32 = u32::MAX;

/// Best hit so far. `distance` doubles as the acceptance cap: `test_cell`
/// only records strict improvements.
#[derive(Copy, Clone, Debug)]
pub struct CellHit {
    pub atom_id: u32,
    pub distance: f32,
}

impl CellHit {
    #[inline]
    pub fn capped(distance: f32) -> Self {
        Self {
            atom_id: NO_ATOM,
            distance,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.atom_id != NO_ATOM
    }
}

/// Test one small voxel's reference list against the ray.
///
/// `origin` is world-relative; `corner` is the owning large voxel's lower
/// corner. Both the ray origin and atom centers are rebased onto `corner`
/// before subtracting, so the quadratic runs on small-magnitude coordinates
/// and half-precision radii stay accurate.
///
/// The near root `-b - sqrt(disc)` is the only one considered: a ray that
/// starts inside an atom gets a negative near root and reports a miss, which
/// keeps interior camera positions from flickering on the far wall.
#[inline]
pub fn test_cell(
    grid: &FrameGrid,
    first_ref: u32,
    count: u32,
    origin: Vec3,
    dir: Vec3,
    corner: Vec3,
    result: &mut CellHit,
) {
    let origin_local = origin - corner;
    for k in 0..count {
        let atom_id = grid.small_ref(first_ref + k);
        let atom = &grid.atoms[atom_id as usize];
        let radius = atom.radius();
        let oc = origin_local - (atom.center() - corner);
        let b = oc.dot(dir);
        let c = oc.dot(oc) - radius * radius;
        let disc = b * b - c;
        if disc <= 0.0 {
            continue;
        }
        let t = -b - disc.sqrt();
        if t < 0.0 || t > result.distance {
            continue;
        }
        // Reference-list order is not deterministic, so exact ties resolve
        // to the smaller atom id instead of scan order.
        if t < result.distance || (result.is_hit() && atom_id < result.atom_id) {
            result.atom_id = atom_id;
            result.distance = t;
        }
    }
}
