use glam::Vec3;

use crate::error::fault;
use crate::grid::FrameGrid;
use crate::trace::dda::Dda;
use crate::trace::intersect::{test_cell, CellHit};
use crate::trace::primary::Traced;

/// Trace a short ambient-occlusion ray.
///
/// AO rays die within `cutoff` of their origin, so the walk skips the
/// large-voxel batching entirely and steps small voxels from the start,
/// looking the enclosing large voxel up per step. `origin` is
/// world-relative; `dir` must be normalized.
pub fn trace_ambient(
    grid: &FrameGrid,
    origin: Vec3,
    dir: Vec3,
    cutoff: f32,
    fault_limit: u32,
) -> Traced {
    let layout = &grid.layout;
    let s = layout.small_per_large as i32;
    let mut dda = Dda::new(origin, dir, layout.small_edge, 0.0);

    for _ in 0..fault_limit {
        let cell = dda.cell();
        if !layout.contains_small(cell) {
            return Traced::Miss;
        }
        let exit = dda.exit_time();
        if exit > cutoff {
            return Traced::Miss;
        }
        let large = cell / s;
        let meta = grid.meta_at(large);
        if meta.is_occupied() {
            let local = cell - large * s;
            let (offset, count) =
                grid.small_entry(meta.compacted_index - 1, layout.small_linear_in_large(local));
            if count > 0 {
                let corner = layout.large_corner(large);
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
        }
        dda.advance();
    }
    Traced::Fault(fault::SMALL_DDA)
}
