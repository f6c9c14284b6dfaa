//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rdv_core::render::StagedImage;
use rdv_core::{DrawTarget, Engine, EngineError, Rect, RenderError};

/// Byte the fake engine writes into every fetched frame.
pub const FILL: u8 = 0x42;

// ── FakeEngine ───────────────────────────────────────────────────

/// Engine with scripted `(size, width, height)` responses.
///
/// Each `frame_size` call consumes the next script entry; once the
/// script runs out the last entry repeats.
#[derive(Default)]
pub struct FakeEngine {
    script: Mutex<VecDeque<(i32, i32, i32)>>,
    current: Mutex<(i32, i32, i32)>,
    start_error: Mutex<Option<EngineError>>,
    fetch_delay: Mutex<Option<Duration>>,
    link_lost: AtomicBool,

    pub inits: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub queries: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engine that always reports a `width`×`height` RGBA frame.
    pub fn steady(width: i32, height: i32) -> Arc<Self> {
        Self::scripted(vec![(width * height * 4, width, height)])
    }

    pub fn scripted(frames: Vec<(i32, i32, i32)>) -> Arc<Self> {
        let engine = Self::default();
        *engine.script.lock().unwrap() = frames.into();
        Arc::new(engine)
    }

    pub fn fail_start_with(&self, err: EngineError) {
        *self.start_error.lock().unwrap() = Some(err);
    }

    pub fn delay_fetch(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    /// Every call after this reports a missing binding.
    pub fn lose_link(&self) {
        self.link_lost.store(true, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Total number of boundary calls of any kind.
    pub fn total_calls(&self) -> usize {
        [
            &self.inits,
            &self.starts,
            &self.stops,
            &self.queries,
            &self.fetches,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    fn check_link(&self, symbol: &'static str) -> Result<(), EngineError> {
        if self.link_lost.load(Ordering::SeqCst) {
            Err(EngineError::LinkMissing(symbol))
        } else {
            Ok(())
        }
    }
}

impl Engine for FakeEngine {
    fn init(&self) -> Result<(), EngineError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        self.check_link("init")
    }

    fn start_session(&self, _id: &str, _password: &str) -> Result<(), EngineError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.check_link("start_session")?;
        match self.start_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn stop_session(&self, _id: &str) -> Result<(), EngineError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn frame_size(&self, _id: &str) -> Result<i32, EngineError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.check_link("frame_size")?;
        let mut current = self.current.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *current = next;
        }
        Ok(current.0)
    }

    fn width(&self, _id: &str) -> Result<i32, EngineError> {
        self.check_link("width")?;
        Ok(self.current.lock().unwrap().1)
    }

    fn height(&self, _id: &str) -> Result<i32, EngineError> {
        self.check_link("height")?;
        Ok(self.current.lock().unwrap().2)
    }

    fn fetch_frame(&self, _id: &str, _display: u32, dest: &mut [u8]) -> Result<(), EngineError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_link("fetch_frame")?;
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        dest.fill(FILL);
        Ok(())
    }
}

// ── RecordingTarget ──────────────────────────────────────────────

/// Draw target that counts transactions.
#[derive(Default)]
pub struct Recorded {
    pub begins: AtomicUsize,
    pub commits: AtomicUsize,
    pub last_dst: Mutex<Option<Rect>>,
}

pub struct RecordingTarget {
    pub recorded: Arc<Recorded>,
    pub canvas: (u32, u32),
}

impl RecordingTarget {
    pub fn boxed(recorded: &Arc<Recorded>) -> Box<dyn DrawTarget> {
        Box::new(Self {
            recorded: Arc::clone(recorded),
            canvas: (1080, 2340),
        })
    }
}

impl DrawTarget for RecordingTarget {
    fn begin(&mut self) -> Result<(u32, u32), RenderError> {
        self.recorded.begins.fetch_add(1, Ordering::SeqCst);
        Ok(self.canvas)
    }

    fn draw(&mut self, _image: &StagedImage, _src: Rect, dst: Rect) -> Result<(), RenderError> {
        *self.recorded.last_dst.lock().unwrap() = Some(dst);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), RenderError> {
        self.recorded.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Poll `cond` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
