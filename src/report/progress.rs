//! Progress indication while checks are running

use crossterm::{
    cursor::MoveToColumn,
    execute,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::future::Future;
use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Default minimum time a spinner stays on screen
pub const DEFAULT_MIN_DISPLAY: Duration = Duration::from_millis(600);

/// Something that can show that work is in progress
pub trait Progress {
    fn start(&mut self, label: &str);
    fn stop(&mut self);

    /// Shortest time the indicator should stay visible once started
    fn min_display(&self) -> Duration {
        Duration::ZERO
    }
}

/// No output at all
#[derive(Debug, Default)]
pub struct Silent;

impl Progress for Silent {
    fn start(&mut self, _label: &str) {}
    fn stop(&mut self) {}
}

/// Terminal spinner drawn on stderr by a dedicated thread.
///
/// Nothing is drawn when stderr is not a terminal.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    min_display: Duration,
    draw: bool,
}

impl Spinner {
    pub fn new() -> Self {
        Self::with_min_display(DEFAULT_MIN_DISPLAY)
    }

    pub fn with_min_display(min_display: Duration) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            min_display,
            draw: io::stderr().is_terminal(),
        }
    }

    /// Force drawing on or off regardless of what stderr is attached to
    pub fn with_drawing(mut self, draw: bool) -> Self {
        self.draw = draw;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for Spinner {
    fn start(&mut self, label: &str) {
        self.stop();
        if !self.draw {
            return;
        }
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let label = label.to_string();
        self.handle = Some(thread::spawn(move || {
            let mut stderr = io::stderr();
            for frame in FRAMES.iter().cycle() {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let _ = execute!(
                    stderr,
                    MoveToColumn(0),
                    Clear(ClearType::CurrentLine),
                    Print(format!("{frame} {label}"))
                );
                thread::sleep(FRAME_INTERVAL);
            }
            let _ = execute!(stderr, MoveToColumn(0), Clear(ClearType::CurrentLine));
        }));
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn min_display(&self) -> Duration {
        if self.draw {
            self.min_display
        } else {
            Duration::ZERO
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run `work` with `progress` shown, keeping it up for at least its minimum display time
pub async fn track<P, F>(progress: &mut P, label: &str, work: F) -> F::Output
where
    P: Progress + ?Sized,
    F: Future,
{
    progress.start(label);
    let started = Instant::now();

    let output = work.await;

    let remaining = progress.min_display().saturating_sub(started.elapsed());
    if !remaining.is_zero() {
        tokio::time::sleep(remaining).await;
    }
    progress.stop();

    output
}
