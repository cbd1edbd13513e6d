use glam::{Vec2, Vec3};
use half::f16;

use crate::camera::CameraArgs;
use crate::config::RenderConfig;
use crate::device::{Device, Kernel};
use crate::element;
use crate::grid::FrameGrid;
use crate::shade::sampling::{cosine_weighted, PixelRng};
use crate::shade::tile::pixel_for_index;
use crate::trace::{trace_ambient, trace_primary, Traced};

/// Secondary-ray origins are lifted off the surface along the normal to
/// avoid self-intersection.
const AO_ORIGIN_OFFSET: f32 = 1e-3;

/// Marker written wherever a ray tripped its fault counter.
const FAULT_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

/// The three per-frame output planes consumed by the upscaler: color,
/// camera-space depth in nanometers, and pixel-space motion.
#[derive(Debug)]
pub struct RenderTargets {
    pub size: u32,
    pub color: Vec<[f16; 4]>,
    pub depth: Vec<f32>,
    pub motion: Vec<[f16; 2]>,
}

impl RenderTargets {
    pub fn new(size: u32) -> Self {
        let len = (size * size) as usize;
        Self {
            size,
            color: vec![[f16::ZERO; 4]; len],
            depth: vec![f32::INFINITY; len],
            motion: vec![[f16::ZERO; 2]; len],
        }
    }
}

/// Per-frame shading counters.
#[derive(Copy, Clone, Debug, Default)]
pub struct ShadeStats {
    pub primary_hits: u32,
    pub faulted_pixels: u32,
}

struct PixelOutput {
    color: [f16; 4],
    depth: f32,
    motion: [f16; 2],
    hit: bool,
    faulted: bool,
}

/// Primary-ray direction for a pixel: pixel center plus jitter, y flipped,
/// scaled by the FOV multiplier, normalized, then rotated into the world.
fn primary_direction(camera: &CameraArgs, px: u32, py: u32, n: u32) -> Vec3 {
    let half = n as f32 * 0.5;
    let sx = (px as f32 + 0.5 + camera.jitter[0] - half) * camera.fov_multiplier;
    let sy = -(py as f32 + 0.5 + camera.jitter[1] - half) * camera.fov_multiplier;
    camera.basis_matrix() * Vec3::new(sx, sy, -1.0).normalize()
}

/// Project a world point back to pixel coordinates under `camera`. `None`
/// when the point is at or behind the eye plane.
pub(crate) fn project(camera: &CameraArgs, point: Vec3, n: u32) -> Option<Vec2> {
    let v = point - camera.position();
    let m = camera.basis_matrix();
    let x = v.dot(m.col(0));
    let y = v.dot(m.col(1));
    let z = v.dot(m.col(2));
    if z >= -1e-6 {
        return None;
    }
    let half = n as f32 * 0.5;
    let px = (x / -z) / camera.fov_multiplier + half - 0.5 - camera.jitter[0];
    let py = -((y / -z) / camera.fov_multiplier) + half - 0.5 - camera.jitter[1];
    Some(Vec2::new(px, py))
}

/// Shade every pixel of the frame: one task per pixel, 8x8 tiles with
/// Morton-ordered lanes. Returns the frame's shading counters.
#[allow(clippy::too_many_arguments)]
pub fn render_atoms(
    device: &mut Device,
    grid: &FrameGrid,
    camera: &CameraArgs,
    prev_camera: Option<&CameraArgs>,
    config: &RenderConfig,
    frame_seed: u32,
    targets: &mut RenderTargets,
) -> ShadeStats {
    let n = targets.size;
    debug_assert_eq!(n % 8, 0);
    let world_min = grid.layout.world_min();
    let origin = camera.position() - world_min;
    let ao_samples = config.resolved_ao_samples();
    let ao_cutoff = config.ao_cutoff_nm;
    let fault_limit = config.fault_limit;

    let outputs = device.dispatch_map(Kernel::RenderAtoms, n * n, |index| {
        let (px, py) = pixel_for_index(index, n);
        let dir = primary_direction(camera, px, py, n);

        match trace_primary(grid, origin, dir, fault_limit) {
            Traced::Hit(hit) => {
                let atom = &grid.atoms[hit.atom_id as usize];
                let hit_point = origin + dir * hit.distance;
                let normal = ((hit_point - atom.center()) / atom.radius()).normalize();
                let diffuse = normal.dot(-dir).max(0.0);

                let mut rng = PixelRng::new(py * n + px, frame_seed);
                let ao_origin = hit_point + normal * AO_ORIGIN_OFFSET;
                let mut misses = 0u32;
                let mut faulted = false;
                for i in 0..ao_samples {
                    let (u1, u2) = rng.stratified_pair(i, ao_samples);
                    let sample_dir = cosine_weighted(normal, u1, u2);
                    match trace_ambient(grid, ao_origin, sample_dir, ao_cutoff, fault_limit) {
                        Traced::Miss => misses += 1,
                        Traced::Hit(_) => {}
                        Traced::Fault(_) => {
                            faulted = true;
                            break;
                        }
                    }
                }
                if faulted {
                    return PixelOutput {
                        color: FAULT_COLOR.map(f16::from_f32),
                        depth: 0.0,
                        motion: [f16::ZERO; 2],
                        hit: true,
                        faulted: true,
                    };
                }

                let visibility = misses as f32 / ao_samples as f32;
                let tint = element::color(atom.element.min(255) as u8);
                let shade = diffuse * visibility;
                let color = [
                    f16::from_f32(tint[0] * shade),
                    f16::from_f32(tint[1] * shade),
                    f16::from_f32(tint[2] * shade),
                    f16::ONE,
                ];

                let world_point = hit_point + world_min;
                let motion = prev_camera
                    .and_then(|prev| {
                        let now = project(camera, world_point, n)?;
                        let before = project(prev, world_point, n)?;
                        Some(now - before)
                    })
                    .unwrap_or(Vec2::ZERO);

                PixelOutput {
                    color,
                    depth: hit.distance,
                    motion: [f16::from_f32(motion.x), f16::from_f32(motion.y)],
                    hit: true,
                    faulted: false,
                }
            }
            Traced::Miss => PixelOutput {
                color: [f16::ZERO, f16::ZERO, f16::ZERO, f16::ONE],
                depth: f32::INFINITY,
                motion: [f16::ZERO; 2],
                hit: false,
                faulted: false,
            },
            Traced::Fault(_) => PixelOutput {
                color: FAULT_COLOR.map(f16::from_f32),
                depth: 0.0,
                motion: [f16::ZERO; 2],
                hit: false,
                faulted: true,
            },
        }
    });

    let mut stats = ShadeStats::default();
    for (index, out) in outputs.into_iter().enumerate() {
        let (px, py) = pixel_for_index(index as u32, n);
        let slot = (py * n + px) as usize;
        targets.color[slot] = out.color;
        targets.depth[slot] = out.depth;
        targets.motion[slot] = out.motion;
        stats.primary_hits += out.hit as u32;
        stats.faulted_pixels += out.faulted as u32;
    }
    stats
}
