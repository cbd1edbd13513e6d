//! Per-frame construction of the two-level voxel grid.
//!
//! Five ordered kernel stages bin atoms into large (2 nm) and small
//! (0.25 nm) voxels and compact the sparse result. All atomics are relaxed;
//! ordering is enforced only at stage boundaries (each dispatch returns
//! before the next is submitted).

use glam::{IVec3, Vec3};

use crate::atom::ConvertedAtom;
use crate::config::RenderConfig;
use crate::device::{AtomicBuffer, Device, Kernel};
use crate::error::{Capacity, RenderError};
use crate::grid::bounds::{PreparedAtoms, WorldBounds};
use crate::grid::layout::{
    self, GridLayout, LargeCellMeta, COMPACT_ATOM_REF_BASE, COMPACT_COORDS,
    COMPACT_COUNTS_PACKED, COMPACT_SMALL_REF_BASE, COMPACT_WORDS, COUNTER_LANES,
    LARGE_REF_COUNT_BITS, LARGE_REF_COUNT_MASK, META_ATOM_REF_BASE, META_COMPACTED_INDEX,
    META_COUNTS_PACKED, META_SMALL_REF_BASE, META_WORDS,
};

// Global allocator / reducer word indices.
const ALLOC_VOXEL: usize = 0;
const ALLOC_LARGE_REF: usize = 1;
const ALLOC_SMALL_REF: usize = 2;
const BBOX_MIN: usize = 3; // three words
const BBOX_MAX: usize = 6; // three words
const GLOBAL_WORDS: usize = 9;

/// Builder progress. A frame's grid may be consumed only once the builder
/// reports `Ready`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuildState {
    Idle,
    Preparing,
    Counting,
    Compacting,
    Referencing,
    Ready,
}

impl BuildState {
    pub fn label(self) -> &'static str {
        match self {
            BuildState::Idle => "idle",
            BuildState::Preparing => "preparing",
            BuildState::Counting => "counting",
            BuildState::Compacting => "compacting",
            BuildState::Referencing => "referencing",
            BuildState::Ready => "ready",
        }
    }
}

/// Build-pass counters reported per frame.
#[derive(Copy, Clone, Debug, Default)]
pub struct BuildStats {
    pub occupied_cells: u32,
    pub large_refs: u32,
    pub small_refs: u32,
    /// Bounding box of occupied large cells, max-exclusive cell coords.
    pub occupied_min: [u32; 3],
    pub occupied_max: [u32; 3],
}

/// The frame's BVH: every table the traversers read. Owned by the frame,
/// written by the builder, read-only during shading.
pub struct FrameGrid {
    pub layout: GridLayout,
    pub bounds: WorldBounds,
    pub atoms: Vec<ConvertedAtom>,
    pub stats: BuildStats,
    meta: AtomicBuffer,
    compacted: AtomicBuffer,
    small_cells: AtomicBuffer,
    large_refs: AtomicBuffer,
    small_refs: AtomicBuffer,
}

impl FrameGrid {
    /// Dense metadata record of a large cell.
    #[inline]
    pub fn meta_at(&self, cell: IVec3) -> LargeCellMeta {
        let base = self.layout.large_linear(cell) * META_WORDS;
        LargeCellMeta {
            compacted_index: self.meta.load(base + META_COMPACTED_INDEX),
            atom_ref_base: self.meta.load(base + META_ATOM_REF_BASE),
            small_ref_base: self.meta.load(base + META_SMALL_REF_BASE),
            counts_packed: self.meta.load(base + META_COUNTS_PACKED),
        }
    }

    /// Compacted record by zero-based compacted slot. Returns the cell
    /// coordinates alongside the shared metadata.
    #[inline]
    pub fn compacted_at(&self, slot: u32) -> (IVec3, LargeCellMeta) {
        let base = slot as usize * COMPACT_WORDS;
        let cell = layout::unpack_cell_coords(self.compacted.load(base + COMPACT_COORDS));
        let meta = LargeCellMeta {
            compacted_index: slot + 1,
            atom_ref_base: self.compacted.load(base + COMPACT_ATOM_REF_BASE),
            small_ref_base: self.compacted.load(base + COMPACT_SMALL_REF_BASE),
            counts_packed: self.compacted.load(base + COMPACT_COUNTS_PACKED),
        };
        (cell, meta)
    }

    /// Small-voxel entry `(offset, count)` for a zero-based compacted slot
    /// and the small voxel's linear index within the block.
    #[inline]
    pub fn small_entry(&self, slot: u32, small_linear: usize) -> (u32, u32) {
        let word = self
            .small_cells
            .load(slot as usize * self.layout.small_block_len() + small_linear);
        (layout::small_entry_offset(word), layout::small_entry_count(word))
    }

    #[inline]
    pub fn large_ref(&self, index: u32) -> u32 {
        self.large_refs.load(index as usize)
    }

    #[inline]
    pub fn small_ref(&self, index: u32) -> u32 {
        self.small_refs.load(index as usize)
    }
}

/// Orchestrates the build stages for one frame.
pub struct GridBuilder {
    state: BuildState,
}

impl GridBuilder {
    pub fn new() -> Self {
        Self {
            state: BuildState::Idle,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Run stages B1..B5 over the prepared atoms. On success the grid is
    /// `Ready` and safe to hand to the traversers; on failure the frame
    /// must be dropped.
    pub fn build(
        &mut self,
        device: &mut Device,
        config: &RenderConfig,
        layout: GridLayout,
        prepared: PreparedAtoms,
    ) -> Result<FrameGrid, RenderError> {
        self.state = BuildState::Preparing;
        let atoms = prepared.converted;
        let atom_count = atoms.len() as u32;
        let cells = layout.large_cell_count();
        let block_len = layout.small_block_len();

        let counters = AtomicBuffer::zeroed(cells * COUNTER_LANES);
        let group_marks = AtomicBuffer::zeroed(layout.group_count());
        let meta = AtomicBuffer::zeroed(cells * META_WORDS);
        let compacted = AtomicBuffer::zeroed(cells * COMPACT_WORDS);
        let globals = AtomicBuffer::zeroed(GLOBAL_WORDS);

        // B1: counters and dense metadata already zeroed at allocation; the
        // reset kernels bring the reusable tables to the same state.
        let n = layout.large_per_axis;
        device.dispatch_3d(Kernel::ResetCounters, glam::UVec3::splat(n), |id| {
            let cell = IVec3::new(id.x as i32, id.y as i32, id.z as i32);
            let i = layout.large_linear(cell);
            let base = i * COUNTER_LANES;
            for lane in 0..COUNTER_LANES {
                counters.store(base + lane, 0);
            }
            let mbase = i * META_WORDS;
            for w in 0..META_WORDS {
                meta.store(mbase + w, 0);
            }
        });
        device.dispatch_1d(Kernel::ResetGroupMarks, group_marks.len() as u32, |i| {
            group_marks.store(i as usize, 0);
        });
        device.dispatch_1d(Kernel::ResetGlobals, 1, |_| {
            globals.store(ALLOC_VOXEL, 1);
            globals.store(ALLOC_LARGE_REF, 1);
            globals.store(ALLOC_SMALL_REF, 1);
            for axis in 0..3 {
                globals.store(BBOX_MIN + axis, u32::MAX);
                globals.store(BBOX_MAX + axis, 0);
            }
        });

        // B2: per-atom large-reference and small-footprint counting. The
        // footprint uses the same cube-sphere enumeration the reference
        // passes run, so the counts packed here equal what B4/B5 emit.
        self.state = BuildState::Counting;
        device.dispatch_1d(Kernel::CountLarge, atom_count, |atom_id| {
            let atom = &atoms[atom_id as usize];
            for_each_touched_large(&layout, atom, |cell, clip_lo, clip_hi| {
                let mut footprint = 0u32;
                for_each_overlapped_small(&layout, atom, cell, clip_lo, clip_hi, |_| {
                    footprint += 1;
                });
                let lane = atom_id as usize % COUNTER_LANES;
                counters.fetch_add(
                    layout.large_linear(cell) * COUNTER_LANES + lane,
                    (footprint << LARGE_REF_COUNT_BITS) + 1,
                );
                group_marks.store(layout.group_linear(cell), 1);
            });
        });

        // B3: compact and allocate. Runs as an ordered scan so compacted
        // indices are dense and monotonic in large-cell linear order.
        self.state = BuildState::Compacting;
        device.dispatch_seq(Kernel::CompactLarge, cells as u32, |i| {
            let cell = IVec3::new(
                (i % n) as i32,
                (i / n % n) as i32,
                (i / (n * n)) as i32,
            );
            if group_marks.load(layout.group_linear(cell)) == 0 {
                return;
            }
            let base = i as usize * COUNTER_LANES;
            let mut packed_sum = 0u64;
            for lane in 0..COUNTER_LANES {
                packed_sum += counters.load(base + lane) as u64;
            }
            let large_refs = (packed_sum & LARGE_REF_COUNT_MASK as u64) as u32;
            let small_refs = (packed_sum >> LARGE_REF_COUNT_BITS) as u32;
            if large_refs == 0 {
                return;
            }
            let compacted_index = globals.fetch_add(ALLOC_VOXEL, 1);
            let atom_ref_base = globals.fetch_add(ALLOC_LARGE_REF, large_refs);
            let small_ref_base =
                globals.fetch_add(ALLOC_SMALL_REF, small_refs + block_len as u32);

            let counts = layout::pack_counts(large_refs, small_refs);
            let mbase = i as usize * META_WORDS;
            meta.store(mbase + META_COMPACTED_INDEX, compacted_index);
            meta.store(mbase + META_ATOM_REF_BASE, atom_ref_base);
            meta.store(mbase + META_SMALL_REF_BASE, small_ref_base);
            meta.store(mbase + META_COUNTS_PACKED, counts);

            let cbase = (compacted_index - 1) as usize * COMPACT_WORDS;
            compacted.store(cbase + COMPACT_COORDS, layout::pack_cell_coords(cell));
            compacted.store(cbase + COMPACT_ATOM_REF_BASE, atom_ref_base);
            compacted.store(cbase + COMPACT_SMALL_REF_BASE, small_ref_base);
            compacted.store(cbase + COMPACT_COUNTS_PACKED, counts);

            // Lane counters become per-lane write cursors for B4.
            let mut offset = 0;
            for lane in 0..COUNTER_LANES {
                let lane_large = counters.load(base + lane) & LARGE_REF_COUNT_MASK;
                counters.store(base + lane, offset);
                offset += lane_large;
            }

            for axis in 0..3 {
                let c = cell[axis] as u32;
                globals.fetch_min(BBOX_MIN + axis, c);
                globals.fetch_max(BBOX_MAX + axis, c + 1);
            }
        });

        let occupied = globals.load(ALLOC_VOXEL) - 1;
        let total_large_refs = globals.load(ALLOC_LARGE_REF) - 1;
        let total_small_slots = globals.load(ALLOC_SMALL_REF) - 1;
        if occupied == 0 {
            return Err(RenderError::EmptyWorld);
        }
        let real_small_refs = total_small_slots - occupied * block_len as u32;
        if real_small_refs as u64 > config.max_references as u64 {
            return Err(RenderError::CapacityExceeded(
                Capacity::References,
                config.max_references as u64,
            ));
        }

        let small_cells = AtomicBuffer::zeroed(occupied as usize * block_len);
        let large_refs = AtomicBuffer::zeroed(total_large_refs as usize + 1);
        let small_refs = AtomicBuffer::zeroed(total_small_slots as usize + 1);

        // B4: populate large references; count small references exactly.
        self.state = BuildState::Referencing;
        device.dispatch_1d(Kernel::ReferenceLargeAndCountSmall, atom_count, |atom_id| {
            let atom = &atoms[atom_id as usize];
            for_each_touched_large(&layout, atom, |cell, clip_lo, clip_hi| {
                let lbase = layout.large_linear(cell);
                let lane = atom_id as usize % COUNTER_LANES;
                let slot = counters.fetch_add(lbase * COUNTER_LANES + lane, 1);
                let atom_ref_base = meta.load(lbase * META_WORDS + META_ATOM_REF_BASE);
                large_refs.store((atom_ref_base + slot) as usize, atom_id);

                let compacted_index = meta.load(lbase * META_WORDS + META_COMPACTED_INDEX);
                let block_base = (compacted_index - 1) as usize * block_len;
                for_each_overlapped_small(&layout, atom, cell, clip_lo, clip_hi, |local| {
                    small_cells.fetch_add(block_base + layout.small_linear_in_large(local), 1);
                });
            });
        });

        // Convert per-small-voxel counts into block-relative write cursors.
        device.dispatch_1d(Kernel::ScanSmallOffsets, occupied, |slot| {
            let base = slot as usize * block_len;
            let mut offset = 0u32;
            for s in 0..block_len {
                let count = small_cells.load(base + s);
                small_cells.store(base + s, offset & 0xFFFF);
                offset += count;
            }
        });

        // B5: emit small references through the cursors.
        device.dispatch_1d(Kernel::EmitSmall, atom_count, |atom_id| {
            let atom = &atoms[atom_id as usize];
            for_each_touched_large(&layout, atom, |cell, clip_lo, clip_hi| {
                let lbase = layout.large_linear(cell);
                let compacted_index = meta.load(lbase * META_WORDS + META_COMPACTED_INDEX);
                let small_ref_base = meta.load(lbase * META_WORDS + META_SMALL_REF_BASE);
                let block_base = (compacted_index - 1) as usize * block_len;
                for_each_overlapped_small(&layout, atom, cell, clip_lo, clip_hi, |local| {
                    let word = small_cells
                        .fetch_add(block_base + layout.small_linear_in_large(local), 1 << 16);
                    let slot = (word & 0xFFFF) + (word >> 16);
                    small_refs.store((small_ref_base + slot) as usize, atom_id);
                });
            });
        });

        let stats = BuildStats {
            occupied_cells: occupied,
            large_refs: total_large_refs,
            small_refs: real_small_refs,
            occupied_min: [
                globals.load(BBOX_MIN),
                globals.load(BBOX_MIN + 1),
                globals.load(BBOX_MIN + 2),
            ],
            occupied_max: [
                globals.load(BBOX_MAX),
                globals.load(BBOX_MAX + 1),
                globals.load(BBOX_MAX + 2),
            ],
        };
        log::debug!(
            "grid built: {} occupied cells, {} large refs, {} small refs",
            stats.occupied_cells,
            stats.large_refs,
            stats.small_refs
        );

        self.state = BuildState::Ready;
        Ok(FrameGrid {
            layout,
            bounds: prepared.bounds,
            atoms,
            stats,
            meta,
            compacted,
            small_cells,
            large_refs,
            small_refs,
        })
    }
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Visit every large voxel the atom's clipped bounding box touches, with
/// the touched range in global small-voxel coordinates.
fn for_each_touched_large<F>(layout: &GridLayout, atom: &ConvertedAtom, mut visit: F)
where
    F: FnMut(IVec3, IVec3, IVec3),
{
    let Some((lo, hi)) = layout.small_voxel_bounds(atom.center(), atom.radius()) else {
        return;
    };
    // Clipped bounds are non-negative, so truncating division floors.
    let s = layout.small_per_large as i32;
    let cell_lo = lo / s;
    let cell_hi = hi / s;
    for cz in cell_lo.z..=cell_hi.z {
        for cy in cell_lo.y..=cell_hi.y {
            for cx in cell_lo.x..=cell_hi.x {
                let cell = IVec3::new(cx, cy, cz);
                let base = cell * s;
                let clip_lo = lo.max(base);
                let clip_hi = hi.min(base + IVec3::splat(s - 1));
                visit(cell, clip_lo, clip_hi);
            }
        }
    }
}

/// Visit every small voxel in `[clip_lo, clip_hi]` that the sphere actually
/// overlaps by the cube-sphere test. The axis with the largest extent runs
/// innermost to keep neighboring atoms' loops in step. Passes coordinates
/// local to the owning large voxel.
fn for_each_overlapped_small<F>(
    layout: &GridLayout,
    atom: &ConvertedAtom,
    cell: IVec3,
    clip_lo: IVec3,
    clip_hi: IVec3,
    mut visit: F,
) where
    F: FnMut(IVec3),
{
    let inv = 1.0 / layout.small_edge;
    let p = atom.center() * inv;
    let r = atom.radius() * inv;
    let span = clip_hi - clip_lo + IVec3::ONE;

    // Largest extent runs innermost.
    let mut axes = [0usize, 1, 2];
    axes.sort_unstable_by_key(|&a| span[a]);

    let cell_base = cell * layout.small_per_large as i32;
    let mut idx = IVec3::ZERO;
    for a in clip_lo[axes[0]]..=clip_hi[axes[0]] {
        idx[axes[0]] = a;
        for b in clip_lo[axes[1]]..=clip_hi[axes[1]] {
            idx[axes[1]] = b;
            for c in clip_lo[axes[2]]..=clip_hi[axes[2]] {
                idx[axes[2]] = c;
                if cube_sphere_overlap(idx.as_vec3(), p, r) {
                    visit(idx - cell_base);
                }
            }
        }
    }
}

/// Exact cube-sphere overlap in small-voxel units: positive squared
/// clearance between the sphere and the unit cube at `corner`.
#[inline]
pub fn cube_sphere_overlap(corner: Vec3, center: Vec3, radius: f32) -> bool {
    let clamped = center.clamp(corner, corner + Vec3::ONE);
    let d = clamped - center;
    radius * radius - d.dot(d) > 0.0
}
