use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Recognized render options. Lengths are nanometers unless stated otherwise.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Edge length of the axis-aligned world cube, centered on the origin.
    pub world_edge_nm: f32,
    /// Coarse grid cell edge. Must divide `world_edge_nm` evenly.
    pub large_voxel_nm: f32,
    /// Fine grid cell edge. Must divide `large_voxel_nm` evenly.
    pub small_voxel_nm: f32,
    /// Side of the square intermediate render target, in pixels.
    pub texture_size: u32,
    /// Hard cap on input atoms per frame.
    pub max_atoms: u32,
    /// Hard cap on total small-voxel references per frame.
    pub max_references: u32,
    /// Ambient-occlusion rays per shaded pixel. Zero selects an automatic
    /// count derived from `texture_size`.
    pub ao_samples: u32,
    /// Maximum travel distance of an ambient-occlusion ray.
    pub ao_cutoff_nm: f32,
    /// Per-ray iteration guard for each traversal loop.
    pub fault_limit: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            world_edge_nm: 128.0,
            large_voxel_nm: 2.0,
            small_voxel_nm: 0.25,
            texture_size: 512,
            max_atoms: 4_194_304,
            max_references: 67_108_864,
            ao_samples: 0,
            ao_cutoff_nm: 1.0 + 0.25 * 1.7320508,
            fault_limit: 200,
        }
    }
}

impl RenderConfig {
    /// Resolved ambient-occlusion sample count. An explicit `ao_samples`
    /// wins; otherwise scale with resolution, clamped to 3..=7.
    pub fn resolved_ao_samples(&self) -> u32 {
        if self.ao_samples > 0 {
            return self.ao_samples;
        }
        (3 + self.texture_size / 256).clamp(3, 7)
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if !(self.world_edge_nm > 0.0) || !(self.large_voxel_nm > 0.0) || !(self.small_voxel_nm > 0.0)
        {
            return Err(RenderError::InvalidConfig(
                "world and voxel edges must be positive".into(),
            ));
        }
        let cells = self.world_edge_nm / self.large_voxel_nm;
        if (cells - cells.round()).abs() > 1e-4 || cells < 1.0 {
            return Err(RenderError::InvalidConfig(format!(
                "large voxel edge {} does not tile world edge {}",
                self.large_voxel_nm, self.world_edge_nm
            )));
        }
        let subcells = self.large_voxel_nm / self.small_voxel_nm;
        if (subcells - subcells.round()).abs() > 1e-4 || subcells < 1.0 {
            return Err(RenderError::InvalidConfig(format!(
                "small voxel edge {} does not tile large voxel edge {}",
                self.small_voxel_nm, self.large_voxel_nm
            )));
        }
        if self.texture_size == 0 || self.texture_size % 8 != 0 {
            return Err(RenderError::InvalidConfig(format!(
                "texture size {} must be a positive multiple of the 8x8 tile",
                self.texture_size
            )));
        }
        if self.fault_limit == 0 {
            return Err(RenderError::InvalidConfig(
                "fault limit must be nonzero".into(),
            ));
        }
        Ok(())
    }
}
