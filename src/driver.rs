//! Frame driver: owns the device, the per-frame build/shade orchestration,
//! the frame counter, and the report ring. Everything mutable lives in this
//! context; kernels only ever see the buffers they are handed.

use std::collections::VecDeque;

use crate::atom::Atom;
use crate::camera::CameraArgs;
use crate::config::RenderConfig;
use crate::device::{Device, DispatchTiming};
use crate::error::RenderError;
use crate::grid::{prepare_atoms, BuildStats, GridBuilder, GridLayout};
use crate::shade::{render_atoms, RenderTargets, ShadeStats};

/// Frames retained in the report ring.
const REPORT_RING: usize = 64;
const PROFILE_REPORT_INTERVAL: u64 = 100;
const SLOW_FRAME_THRESHOLD_MS: f32 = 50.0;
const SLOW_FRAME_REPORT_INTERVAL: u64 = 60;

/// Supplies the frame's atoms. Called by the driver once per frame.
pub trait AtomSource {
    fn atoms(&mut self, frame_id: u64) -> &[Atom];
}

/// Supplies the frame's camera. Called by the driver once per frame.
pub trait CameraSource {
    fn camera(&mut self, frame_id: u64) -> CameraArgs;
}

/// Completion record for one frame, in submission order.
#[derive(Clone, Debug)]
pub struct FrameReport {
    pub frame_id: u64,
    pub build: BuildStats,
    pub shade: ShadeStats,
    pub kernels: Vec<DispatchTiming>,
    pub total_ms: f32,
    pub dropped_atoms: u32,
}

pub struct RenderDriver {
    config: RenderConfig,
    layout: GridLayout,
    device: Device,
    builder: GridBuilder,
    frame_counter: u64,
    /// Host-visible atom staging buffers; the host writes slot `n % 3`
    /// while the device may still hold the two previous frames.
    input_slots: [Vec<Atom>; 3],
    /// Output planes, alternated by frame parity.
    targets: [RenderTargets; 2],
    presented: Option<usize>,
    prev_camera: Option<CameraArgs>,
    reports: VecDeque<FrameReport>,
    on_complete: Option<Box<dyn FnMut(&FrameReport) + Send>>,
    // Rolling kernel-time accumulation for the periodic profile log.
    accum: Vec<(&'static str, f64, usize)>,
    last_slow_report: Option<u64>,
}

impl RenderDriver {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        let layout = GridLayout::from_config(&config);
        let size = config.texture_size;
        Ok(Self {
            config,
            layout,
            device: Device::new(),
            builder: GridBuilder::new(),
            frame_counter: 0,
            input_slots: [Vec::new(), Vec::new(), Vec::new()],
            targets: [RenderTargets::new(size), RenderTargets::new(size)],
            presented: None,
            prev_camera: None,
            reports: VecDeque::with_capacity(REPORT_RING),
            on_complete: None,
            accum: Vec::new(),
            last_slow_report: None,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Output planes of the most recent completed frame, if any. A dropped
    /// frame leaves the previous planes in place.
    pub fn presented_targets(&self) -> Option<&RenderTargets> {
        self.presented.map(|i| &self.targets[i])
    }

    pub fn reports(&self) -> impl Iterator<Item = &FrameReport> {
        self.reports.iter()
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.reports.back()
    }

    /// Install a completion callback invoked after every finished frame
    /// with its timings.
    pub fn on_frame_complete<F>(&mut self, callback: F)
    where
        F: FnMut(&FrameReport) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    /// Run one full frame: preprocess, build, shade. On error the frame is
    /// dropped (the previously presented planes stay valid) and the error
    /// is returned for the caller to log or surface.
    pub fn render_frame(
        &mut self,
        atoms: &mut dyn AtomSource,
        camera: &mut dyn CameraSource,
    ) -> Result<&RenderTargets, RenderError> {
        let frame_id = self.frame_counter;
        self.frame_counter += 1;

        // Stage the frame's inputs.
        let slot = (frame_id % 3) as usize;
        let supplied = atoms.atoms(frame_id);
        self.input_slots[slot].clear();
        self.input_slots[slot].extend_from_slice(supplied);
        let camera_args = camera.camera(frame_id);

        self.device.begin_frame();
        let prepared = match prepare_atoms(
            &mut self.device,
            &self.config,
            &self.layout,
            &self.input_slots[slot],
        ) {
            Ok(prepared) => prepared,
            Err(err) => {
                log::warn!("frame {frame_id} dropped during preprocessing: {err}");
                return Err(err);
            }
        };
        let dropped_atoms = prepared.dropped;

        let grid = match self
            .builder
            .build(&mut self.device, &self.config, self.layout, prepared)
        {
            Ok(grid) => grid,
            Err(err) => {
                log::warn!(
                    "frame {frame_id} dropped while {}: {err}",
                    self.builder.state().label()
                );
                return Err(err);
            }
        };

        let parity = (frame_id % 2) as usize;
        let frame_seed = (frame_id as u32).wrapping_mul(0x9E37_79B9) ^ (frame_id >> 32) as u32;
        let shade = render_atoms(
            &mut self.device,
            &grid,
            &camera_args,
            self.prev_camera.as_ref(),
            &self.config,
            frame_seed,
            &mut self.targets[parity],
        );
        self.prev_camera = Some(camera_args);
        self.presented = Some(parity);

        let report = FrameReport {
            frame_id,
            build: grid.stats,
            shade,
            kernels: self.device.frame_timings().to_vec(),
            total_ms: self.device.frame_elapsed_ms(),
            dropped_atoms,
        };
        self.account(&report);
        if let Some(callback) = self.on_complete.as_mut() {
            callback(&report);
        }
        if self.reports.len() == REPORT_RING {
            self.reports.pop_front();
        }
        self.reports.push_back(report);

        Ok(&self.targets[parity])
    }

    fn account(&mut self, report: &FrameReport) {
        for timing in &report.kernels {
            let name = timing.kernel.name();
            if let Some(entry) = self.accum.iter_mut().find(|(n, _, _)| *n == name) {
                entry.1 += timing.millis as f64;
                entry.2 += 1;
            } else {
                self.accum.push((name, timing.millis as f64, 1));
            }
        }

        if report.total_ms > SLOW_FRAME_THRESHOLD_MS {
            let due = match self.last_slow_report {
                None => true,
                Some(last) => report.frame_id.saturating_sub(last) >= SLOW_FRAME_REPORT_INTERVAL,
            };
            if due {
                log::warn!(
                    "slow frame {} ({:.1} ms): {}",
                    report.frame_id,
                    report.total_ms,
                    report
                        .kernels
                        .iter()
                        .map(|t| format!("{} {:.2}ms", t.kernel.name(), t.millis))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                self.last_slow_report = Some(report.frame_id);
            }
        }

        if (report.frame_id + 1) % PROFILE_REPORT_INTERVAL == 0 {
            let mut rows: Vec<_> = self
                .accum
                .iter()
                .map(|(name, total, count)| (*name, total / *count as f64, *count))
                .collect();
            rows.sort_by(|a, b| b.1.total_cmp(&a.1));
            for (name, avg, count) in rows {
                log::info!("kernel {name}: {avg:.3} ms avg over {count} dispatches");
            }
            self.accum.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    struct FixedScene(Vec<Atom>);

    impl AtomSource for FixedScene {
        fn atoms(&mut self, _frame_id: u64) -> &[Atom] {
            &self.0
        }
    }

    struct OrbitCamera;

    impl CameraSource for OrbitCamera {
        fn camera(&mut self, frame_id: u64) -> CameraArgs {
            let angle = frame_id as f32 * 0.1;
            CameraArgs::look_at(
                Vec3::new(3.0 * angle.cos(), 1.0, 3.0 * angle.sin()),
                Vec3::ZERO,
                60.0,
                32,
            )
        }
    }

    fn test_config() -> RenderConfig {
        RenderConfig {
            world_edge_nm: 8.0,
            texture_size: 32,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn frames_advance_and_reports_accumulate() {
        let mut driver = RenderDriver::new(test_config()).unwrap();
        let mut scene = FixedScene(vec![Atom {
            position: [0.0; 3],
            radius: 0.4,
            element: 6,
        }]);
        let mut camera = OrbitCamera;
        for _ in 0..3 {
            driver.render_frame(&mut scene, &mut camera).unwrap();
        }
        assert_eq!(driver.frame_counter(), 3);
        assert_eq!(driver.reports().count(), 3);
        let report = driver.last_report().unwrap();
        assert_eq!(report.frame_id, 2);
        assert!(report.build.occupied_cells > 0);
        assert!(report.shade.primary_hits > 0);
        assert!(!report.kernels.is_empty());
    }

    #[test]
    fn dropped_frame_keeps_previous_output() {
        let mut driver = RenderDriver::new(test_config()).unwrap();
        let mut camera = OrbitCamera;
        let mut good = FixedScene(vec![Atom {
            position: [0.0; 3],
            radius: 0.4,
            element: 6,
        }]);
        driver.render_frame(&mut good, &mut camera).unwrap();
        assert!(driver.presented_targets().is_some());

        let mut empty = FixedScene(Vec::new());
        let err = driver.render_frame(&mut empty, &mut camera).unwrap_err();
        assert!(matches!(err, RenderError::EmptyWorld));
        // The previous frame's planes are still presented.
        assert!(driver.presented_targets().is_some());
        assert_eq!(driver.reports().count(), 1);
        assert_eq!(driver.frame_counter(), 2);
    }

    #[test]
    fn completion_callback_sees_every_frame() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let mut driver = RenderDriver::new(test_config()).unwrap();
        let seen = Arc::new(AtomicU32::new(0));
        let counter = seen.clone();
        driver.on_frame_complete(move |report| {
            assert!(report.total_ms >= 0.0);
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let mut scene = FixedScene(vec![Atom {
            position: [0.0; 3],
            radius: 0.3,
            element: 7,
        }]);
        let mut camera = OrbitCamera;
        for _ in 0..2 {
            driver.render_frame(&mut scene, &mut camera).unwrap();
        }
        assert_eq!(seen.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn capacity_overload_is_fatal_for_the_frame() {
        let mut config = test_config();
        config.max_atoms = 4;
        let mut driver = RenderDriver::new(config).unwrap();
        let mut scene = FixedScene(vec![
            Atom {
                position: [0.0; 3],
                radius: 0.1,
                element: 6,
            };
            5
        ]);
        let mut camera = OrbitCamera;
        let err = driver.render_frame(&mut scene, &mut camera).unwrap_err();
        assert!(matches!(
            err,
            RenderError::CapacityExceeded(crate::error::Capacity::Atoms, 4)
        ));
    }
}
