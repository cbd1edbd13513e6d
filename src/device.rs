//! CPU compute device.
//!
//! The core's kernels are plain functions dispatched over 1-D or 3-D index
//! ranges. This device runs them data-parallel on the rayon pool and records
//! wall time per named kernel, the same accounting shape the GPU profiler of
//! a windowed renderer keeps per pass. Kernel submissions within a frame are
//! strictly ordered: each dispatch returns only after every task ran, which
//! is the stage barrier the builder relies on.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use glam::UVec3;
use rayon::prelude::*;

/// Named compute kernels. The names are part of the backend contract.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Kernel {
    ConvertAtoms,
    ResetCounters,
    ResetGroupMarks,
    ResetGlobals,
    CountLarge,
    CompactLarge,
    ReferenceLargeAndCountSmall,
    ScanSmallOffsets,
    EmitSmall,
    RenderAtoms,
}

impl Kernel {
    pub fn name(self) -> &'static str {
        match self {
            Kernel::ConvertAtoms => "convert_atoms",
            Kernel::ResetCounters => "reset_counters",
            Kernel::ResetGroupMarks => "reset_group_marks",
            Kernel::ResetGlobals => "reset_globals",
            Kernel::CountLarge => "count_large",
            Kernel::CompactLarge => "compact_large",
            Kernel::ReferenceLargeAndCountSmall => "reference_large_and_count_small",
            Kernel::ScanSmallOffsets => "scan_small_offsets",
            Kernel::EmitSmall => "emit_small",
            Kernel::RenderAtoms => "render_atoms",
        }
    }
}

/// GPU-visible word buffer. All cross-task communication inside a kernel
/// goes through these words with relaxed ordering; slot uniqueness, not
/// memory ordering, is what makes concurrent writes safe.
pub struct AtomicBuffer {
    words: Box<[AtomicU32]>,
}

impl AtomicBuffer {
    pub fn zeroed(len: usize) -> Self {
        let mut words = Vec::with_capacity(len);
        words.resize_with(len, || AtomicU32::new(0));
        Self {
            words: words.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline]
    pub fn load(&self, index: usize) -> u32 {
        self.words[index].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn store(&self, index: usize, value: u32) {
        self.words[index].store(value, Ordering::Relaxed);
    }

    #[inline]
    pub fn fetch_add(&self, index: usize, value: u32) -> u32 {
        self.words[index].fetch_add(value, Ordering::Relaxed)
    }

    #[inline]
    pub fn fetch_min(&self, index: usize, value: u32) -> u32 {
        self.words[index].fetch_min(value, Ordering::Relaxed)
    }

    #[inline]
    pub fn fetch_max(&self, index: usize, value: u32) -> u32 {
        self.words[index].fetch_max(value, Ordering::Relaxed)
    }
}

/// Wall time of one kernel dispatch.
#[derive(Copy, Clone, Debug)]
pub struct DispatchTiming {
    pub kernel: Kernel,
    pub millis: f32,
}

/// Executes kernels and keeps per-frame dispatch timings.
pub struct Device {
    frame_timings: Vec<DispatchTiming>,
    frame_start: Option<Instant>,
}

impl Device {
    pub fn new() -> Self {
        Self {
            frame_timings: Vec::new(),
            frame_start: None,
        }
    }

    pub fn begin_frame(&mut self) {
        self.frame_timings.clear();
        self.frame_start = Some(Instant::now());
    }

    /// Timings recorded since `begin_frame`, in submission order.
    pub fn frame_timings(&self) -> &[DispatchTiming] {
        &self.frame_timings
    }

    /// Milliseconds since `begin_frame`.
    pub fn frame_elapsed_ms(&self) -> f32 {
        self.frame_start
            .map(|t| t.elapsed().as_secs_f32() * 1e3)
            .unwrap_or(0.0)
    }

    /// Run `task` for every index in `0..len`, in parallel. Returns after
    /// the last task finishes, which orders this dispatch before the next.
    pub fn dispatch_1d<F>(&mut self, kernel: Kernel, len: u32, task: F)
    where
        F: Fn(u32) + Sync,
    {
        let start = Instant::now();
        (0..len).into_par_iter().for_each(|i| task(i));
        self.record(kernel, start);
    }

    /// Run `task` for every index in `0..len`, in index order on one lane.
    /// Used by stages whose outputs must be deterministic in index order
    /// (stream compaction); the global allocators are still advanced through
    /// their atomic words so the stage reads like its parallel siblings.
    pub fn dispatch_seq<F>(&mut self, kernel: Kernel, len: u32, mut task: F)
    where
        F: FnMut(u32),
    {
        let start = Instant::now();
        for i in 0..len {
            task(i);
        }
        self.record(kernel, start);
    }

    /// Run `task` for every index in `0..len` and collect the results into
    /// a buffer, one slot per task.
    pub fn dispatch_map<T, F>(&mut self, kernel: Kernel, len: u32, task: F) -> Vec<T>
    where
        T: Send,
        F: Fn(u32) -> T + Sync,
    {
        let start = Instant::now();
        let out = (0..len).into_par_iter().map(|i| task(i)).collect();
        self.record(kernel, start);
        out
    }

    /// Run `task` for every cell of a 3-D grid. Tasks are flattened in
    /// x-major order and executed in parallel.
    pub fn dispatch_3d<F>(&mut self, kernel: Kernel, grid: UVec3, task: F)
    where
        F: Fn(UVec3) + Sync,
    {
        let start = Instant::now();
        let total = grid.x as u64 * grid.y as u64 * grid.z as u64;
        (0..total).into_par_iter().for_each(|flat| {
            let x = (flat % grid.x as u64) as u32;
            let y = (flat / grid.x as u64 % grid.y as u64) as u32;
            let z = (flat / (grid.x as u64 * grid.y as u64)) as u32;
            task(UVec3::new(x, y, z));
        });
        self.record(kernel, start);
    }

    fn record(&mut self, kernel: Kernel, start: Instant) {
        self.frame_timings.push(DispatchTiming {
            kernel,
            millis: start.elapsed().as_secs_f32() * 1e3,
        });
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}
