//! Demo renderer: a silicon lattice orbited by the camera, written out as
//! PNG planes.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec3;

use atomray::{Atom, AtomSource, CameraArgs, CameraSource, RenderConfig, RenderDriver};

#[derive(Parser)]
#[command(name = "atomray-cli", about = "Render a demo atom lattice to PNG")]
struct Args {
    /// Output texture side in pixels (multiple of 8).
    #[arg(long, default_value_t = 512)]
    size: u32,

    /// Atoms per lattice axis.
    #[arg(long, default_value_t = 12)]
    lattice: u32,

    /// Lattice spacing in nanometers.
    #[arg(long, default_value_t = 0.4)]
    spacing: f32,

    /// Frames to render (the camera orbits; the last frame is written).
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Ambient-occlusion samples per pixel (0 = automatic).
    #[arg(long, default_value_t = 0)]
    ao_samples: u32,

    /// Color output path.
    #[arg(long, default_value = "color.png")]
    output: PathBuf,

    /// Optional grayscale depth output path.
    #[arg(long)]
    depth_output: Option<PathBuf>,
}

struct LatticeScene(Vec<Atom>);

impl LatticeScene {
    fn new(per_axis: u32, spacing: f32) -> Self {
        let half = (per_axis.saturating_sub(1)) as f32 * spacing * 0.5;
        let mut atoms = Vec::with_capacity((per_axis * per_axis * per_axis) as usize);
        for z in 0..per_axis {
            for y in 0..per_axis {
                for x in 0..per_axis {
                    // Alternate silicon and carbon for visible contrast.
                    let element = if (x + y + z) % 2 == 0 { 14 } else { 6 };
                    atoms.push(Atom::new(
                        [
                            x as f32 * spacing - half,
                            y as f32 * spacing - half,
                            z as f32 * spacing - half,
                        ],
                        element,
                    ));
                }
            }
        }
        Self(atoms)
    }
}

impl AtomSource for LatticeScene {
    fn atoms(&mut self, _frame_id: u64) -> &[Atom] {
        &self.0
    }
}

struct OrbitCamera {
    distance: f32,
    size: u32,
}

impl CameraSource for OrbitCamera {
    fn camera(&mut self, frame_id: u64) -> CameraArgs {
        let angle = frame_id as f32 * 0.05;
        let position = Vec3::new(
            self.distance * angle.cos(),
            self.distance * 0.4,
            self.distance * angle.sin(),
        );
        CameraArgs::look_at(position, Vec3::ZERO, 45.0, self.size)
    }
}

fn linear_to_srgb(v: f32) -> u8 {
    (v.clamp(0.0, 1.0).powf(1.0 / 2.2) * 255.0 + 0.5) as u8
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = RenderConfig {
        texture_size: args.size,
        ao_samples: args.ao_samples,
        ..RenderConfig::default()
    };
    let mut driver = RenderDriver::new(config)?;
    let mut scene = LatticeScene::new(args.lattice, args.spacing);
    let extent = args.lattice as f32 * args.spacing;
    let mut camera = OrbitCamera {
        distance: extent * 2.2,
        size: args.size,
    };

    for _ in 0..args.frames.max(1) {
        driver.render_frame(&mut scene, &mut camera)?;
    }
    let report = driver.last_report().expect("at least one frame rendered");
    log::info!(
        "frame {}: {} occupied cells, {} primary hits, {:.1} ms",
        report.frame_id,
        report.build.occupied_cells,
        report.shade.primary_hits,
        report.total_ms
    );

    let targets = driver.presented_targets().expect("a presented frame");
    let n = targets.size;
    let mut color = image::RgbImage::new(n, n);
    for (i, pixel) in targets.color.iter().enumerate() {
        let x = i as u32 % n;
        let y = i as u32 / n;
        color.put_pixel(
            x,
            y,
            image::Rgb([
                linear_to_srgb(f32::from(pixel[0])),
                linear_to_srgb(f32::from(pixel[1])),
                linear_to_srgb(f32::from(pixel[2])),
            ]),
        );
    }
    color.save(&args.output)?;
    println!("wrote {}", args.output.display());

    if let Some(path) = &args.depth_output {
        let far = targets
            .depth
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(0.0f32, f32::max)
            .max(1e-3);
        let mut depth = image::GrayImage::new(n, n);
        for (i, &d) in targets.depth.iter().enumerate() {
            let x = i as u32 % n;
            let y = i as u32 / n;
            let v = if d.is_finite() {
                255 - (d / far * 255.0) as u8
            } else {
                0
            };
            depth.put_pixel(x, y, image::Luma([v]));
        }
        depth.save(path)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}
