use glam::{IVec3, Vec3};

use crate::error::fault;
use crate::grid::FrameGrid;
use crate::trace::dda::Dda;
use crate::trace::intersect::{test_cell, CellHit};

/// Occupied large voxels gathered per fill phase before draining.
pub const FILL_BATCH: usize = 16;

/// Outcome of one traced ray.
#[derive(Copy, Clone, Debug)]
pub enum Traced {
    Hit(CellHit),
    Miss,
    /// Fault-counter exhaustion; carries the loop's fault code.
    Fault(u32),
}

/// Axis-wise slab test against `[bmin, bmax]`. Returns the entry and exit
/// parameters, or `None` when the ray misses the box.
fn clip_to_box(origin: Vec3, dir: Vec3, bmin: Vec3, bmax: Vec3) -> Option<(f32, f32)> {
    let mut t_in = f32::NEG_INFINITY;
    let mut t_out = f32::INFINITY;
    for axis in 0..3 {
        let d = dir[axis];
        if d == 0.0 {
            if origin[axis] < bmin[axis] || origin[axis] > bmax[axis] {
                return None;
            }
            continue;
        }
        let a = (bmin[axis] - origin[axis]) / d;
        let b = (bmax[axis] - origin[axis]) / d;
        t_in = t_in.max(a.min(b));
        t_out = t_out.min(a.max(b));
    }
    (t_out >= t_in).then_some((t_in, t_out))
}

/// Trace a primary ray through the two-level grid.
///
/// The walk alternates a fill phase, which collects up to [`FILL_BATCH`]
/// occupied large voxels along the large-voxel walk, with a drain phase
/// that descends into each collected voxel on a small-voxel walk. A hit is
/// accepted only when strictly inside the small voxel where it was found,
/// which keeps accepted hits sorted along the ray even for atoms straddling
/// voxel borders: such atoms are simply retested from later voxels.
///
/// `origin` is world-relative; `dir` must be normalized.
pub fn trace_primary(grid: &FrameGrid, origin: Vec3, dir: Vec3, fault_limit: u32) -> Traced {
    let layout = &grid.layout;
    let world_min = layout.world_min();
    let bmin = grid.bounds.min - world_min;
    let bmax = grid.bounds.max - world_min;
    let Some((t_in, t_out)) = clip_to_box(origin, dir, bmin, bmax) else {
        return Traced::Miss;
    };
    let t_start = t_in.max(0.0);
    if t_out < t_start {
        return Traced::Miss;
    }

    let h = layout.large_edge;
    let cell_min = IVec3::new(
        (bmin.x / h).round() as i32,
        (bmin.y / h).round() as i32,
        (bmin.z / h).round() as i32,
    );
    let cell_max = IVec3::new(
        (bmax.x / h).round() as i32 - 1,
        (bmax.y / h).round() as i32 - 1,
        (bmax.z / h).round() as i32 - 1,
    );

    // Nudge boundary entry points inside the box so the start cell and its
    // exit times agree; a point exactly on the far face would floor into
    // the cell past it.
    let inset = Vec3::splat(1e-4 * h);
    let entry_point = (origin + dir * t_start).clamp(bmin, bmax - inset);
    let mut large = Dda::new(entry_point, dir, h, t_start);
    large.clamp_cell(cell_min, cell_max);

    let small_max = IVec3::splat(layout.small_per_large as i32 - 1);
    let mut entry_t = t_start;
    let mut out_of_bounds = false;

    for _outer in 0..fault_limit {
        // Fill.
        let mut batch = [(0u32, 0.0f32); FILL_BATCH];
        let mut filled = 0;
        let mut fill_iters = 0u32;
        while !out_of_bounds && filled < FILL_BATCH {
            fill_iters += 1;
            if fill_iters > fault_limit {
                return Traced::Fault(fault::FILL_LARGE);
            }
            let cell = large.cell();
            if cell.cmplt(cell_min).any() || cell.cmpgt(cell_max).any() {
                out_of_bounds = true;
                break;
            }
            let meta = grid.meta_at(cell);
            if meta.is_occupied() {
                batch[filled] = (meta.compacted_index - 1, entry_t);
                filled += 1;
            }
            entry_t = large.exit_time();
            large.advance();
        }

        // Drain.
        for &(slot, t_enter) in &batch[..filled] {
            let (cell, meta) = grid.compacted_at(slot);
            let corner = layout.large_corner(cell);
            let local_entry =
                (origin + dir * t_enter - corner).clamp(Vec3::ZERO, Vec3::splat(h) - inset);
            let mut small = Dda::new(local_entry, dir, layout.small_edge, t_enter);
            small.clamp_cell(IVec3::ZERO, small_max);

            let mut inner_iters = 0u32;
            loop {
                let local = small.cell();
                if local.cmplt(IVec3::ZERO).any() || local.cmpgt(small_max).any() {
                    break;
                }
                inner_iters += 1;
                if inner_iters > fault_limit {
                    return Traced::Fault(fault::INNER_PRIMARY);
                }
                let exit = small.exit_time();
                let (offset, count) =
                    grid.small_entry(slot, layout.small_linear_in_large(local));
                if count > 0 {
                    let mut hit = CellHit::capped(exit);
                    test_cell(
                        grid,
                        meta.small_ref_base + offset,
                        count,
                        origin,
                        dir,
                        corner,
                        &mut hit,
                    );
                    if hit.is_hit() {
                        return Traced::Hit(hit);
                    }
                }
                small.advance();
            }
        }

        if out_of_bounds {
            return Traced::Miss;
        }
    }
    Traced::Fault(fault::OUTER_PRIMARY)
}
