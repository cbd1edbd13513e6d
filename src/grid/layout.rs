use glam::{IVec3, Vec3};

use crate::config::RenderConfig;

/// Bit split of a large cell's packed reference counts: the low 14 bits
/// accumulate large-voxel references, the upper 18 small-voxel references.
pub const LARGE_REF_COUNT_BITS: u32 = 14;
pub const LARGE_REF_COUNT_MASK: u32 = (1 << LARGE_REF_COUNT_BITS) - 1;

/// Contention lanes per large-cell counter block. Atoms pick a lane by
/// `atom_id % COUNTER_LANES`.
pub const COUNTER_LANES: usize = 8;

/// Edge of the cell groups used to skip empty space wholesale in the
/// compaction pass.
pub const GROUP_EDGE: u32 = 8;

/// Words per dense large-cell metadata record.
pub const META_WORDS: usize = 4;
pub const META_COMPACTED_INDEX: usize = 0;
pub const META_ATOM_REF_BASE: usize = 1;
pub const META_SMALL_REF_BASE: usize = 2;
pub const META_COUNTS_PACKED: usize = 3;

/// Words per compacted large-cell record: packed coordinates plus the same
/// base offsets and counts as the dense record.
pub const COMPACT_WORDS: usize = 4;
pub const COMPACT_COORDS: usize = 0;
pub const COMPACT_ATOM_REF_BASE: usize = 1;
pub const COMPACT_SMALL_REF_BASE: usize = 2;
pub const COMPACT_COUNTS_PACKED: usize = 3;

/// Grid geometry shared by the builder and both traversers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridLayout {
    /// World cube edge, nanometers. The cube is centered on the origin.
    pub world_edge: f32,
    pub large_edge: f32,
    pub small_edge: f32,
    /// Large voxels per axis.
    pub large_per_axis: u32,
    /// Small voxels per axis inside one large voxel.
    pub small_per_large: u32,
}

impl GridLayout {
    pub fn from_config(config: &RenderConfig) -> Self {
        let large_per_axis = (config.world_edge_nm / config.large_voxel_nm).round() as u32;
        let small_per_large = (config.large_voxel_nm / config.small_voxel_nm).round() as u32;
        Self {
            world_edge: config.world_edge_nm,
            large_edge: config.large_voxel_nm,
            small_edge: config.small_voxel_nm,
            large_per_axis,
            small_per_large,
        }
    }

    /// World minimum corner. Converted atoms and all grid coordinates are
    /// relative to this point.
    #[inline]
    pub fn world_min(&self) -> Vec3 {
        Vec3::splat(-0.5 * self.world_edge)
    }

    #[inline]
    pub fn large_cell_count(&self) -> usize {
        let n = self.large_per_axis as usize;
        n * n * n
    }

    /// Small voxels in the metadata block of one large voxel (8^3 = 512 at
    /// the default edges).
    #[inline]
    pub fn small_block_len(&self) -> usize {
        let s = self.small_per_large as usize;
        s * s * s
    }

    /// Small voxels per axis across the whole world.
    #[inline]
    pub fn small_per_axis(&self) -> u32 {
        self.large_per_axis * self.small_per_large
    }

    #[inline]
    pub fn groups_per_axis(&self) -> u32 {
        self.large_per_axis.div_ceil(GROUP_EDGE)
    }

    #[inline]
    pub fn group_count(&self) -> usize {
        let g = self.groups_per_axis() as usize;
        g * g * g
    }

    #[inline]
    pub fn contains_large(&self, cell: IVec3) -> bool {
        let n = self.large_per_axis as i32;
        cell.cmpge(IVec3::ZERO).all() && cell.cmplt(IVec3::splat(n)).all()
    }

    #[inline]
    pub fn contains_small(&self, cell: IVec3) -> bool {
        let n = self.small_per_axis() as i32;
        cell.cmpge(IVec3::ZERO).all() && cell.cmplt(IVec3::splat(n)).all()
    }

    #[inline]
    pub fn large_linear(&self, cell: IVec3) -> usize {
        let n = self.large_per_axis as usize;
        cell.x as usize + cell.y as usize * n + cell.z as usize * n * n
    }

    /// Linear index of a small voxel within its large voxel's block.
    #[inline]
    pub fn small_linear_in_large(&self, local: IVec3) -> usize {
        let s = self.small_per_large as usize;
        local.x as usize + local.y as usize * s + local.z as usize * s * s
    }

    /// Group index of a large cell, for the empty-group skip.
    #[inline]
    pub fn group_linear(&self, cell: IVec3) -> usize {
        let g = self.groups_per_axis() as usize;
        let gx = cell.x as usize / GROUP_EDGE as usize;
        let gy = cell.y as usize / GROUP_EDGE as usize;
        let gz = cell.z as usize / GROUP_EDGE as usize;
        gx + gy * g + gz * g * g
    }

    /// Inclusive small-voxel index bounds of the sphere's axis-aligned box,
    /// clipped to the world. Returns `None` when the box misses the world
    /// entirely.
    pub fn small_voxel_bounds(&self, center: Vec3, radius: f32) -> Option<(IVec3, IVec3)> {
        let inv = 1.0 / self.small_edge;
        let limit = self.small_per_axis() as i32 - 1;
        let lo = ((center - Vec3::splat(radius)) * inv).floor();
        let hi = ((center + Vec3::splat(radius)) * inv).floor();
        let lo = IVec3::new(lo.x as i32, lo.y as i32, lo.z as i32);
        let hi = IVec3::new(hi.x as i32, hi.y as i32, hi.z as i32);
        if hi.cmplt(IVec3::ZERO).any() || lo.cmpgt(IVec3::splat(limit)).any() {
            return None;
        }
        Some((lo.max(IVec3::ZERO), hi.min(IVec3::splat(limit))))
    }

    /// Lower corner of a large voxel, world-relative nanometers.
    #[inline]
    pub fn large_corner(&self, cell: IVec3) -> Vec3 {
        cell.as_vec3() * self.large_edge
    }
}

/// Pack the per-cell reference counts into one word.
#[inline]
pub fn pack_counts(large_refs: u32, small_refs: u32) -> u32 {
    (small_refs << LARGE_REF_COUNT_BITS) | (large_refs & LARGE_REF_COUNT_MASK)
}

#[inline]
pub fn unpack_large_refs(counts: u32) -> u32 {
    counts & LARGE_REF_COUNT_MASK
}

#[inline]
pub fn unpack_small_refs(counts: u32) -> u32 {
    counts >> LARGE_REF_COUNT_BITS
}

/// Pack large-cell coordinates into one word, 10 bits per axis.
#[inline]
pub fn pack_cell_coords(cell: IVec3) -> u32 {
    (cell.x as u32 & 0x3FF) | ((cell.y as u32 & 0x3FF) << 10) | ((cell.z as u32 & 0x3FF) << 20)
}

#[inline]
pub fn unpack_cell_coords(word: u32) -> IVec3 {
    IVec3::new(
        (word & 0x3FF) as i32,
        ((word >> 10) & 0x3FF) as i32,
        ((word >> 20) & 0x3FF) as i32,
    )
}

/// Small-voxel table entry: write offset in the low half-word, reference
/// count in the high half-word. The offset is relative to the owning large
/// cell's small-reference base.
#[inline]
pub fn small_entry_offset(word: u32) -> u32 {
    word & 0xFFFF
}

#[inline]
pub fn small_entry_count(word: u32) -> u32 {
    word >> 16
}

/// Metadata view of one dense large-cell record.
#[derive(Copy, Clone, Debug, Default)]
pub struct LargeCellMeta {
    pub compacted_index: u32,
    pub atom_ref_base: u32,
    pub small_ref_base: u32,
    pub counts_packed: u32,
}

impl LargeCellMeta {
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.compacted_index != 0
    }

    #[inline]
    pub fn atom_ref_count(&self) -> u32 {
        unpack_large_refs(self.counts_packed)
    }

    #[inline]
    pub fn small_ref_count(&self) -> u32 {
        unpack_small_refs(self.counts_packed)
    }
}
