//! Terminal output: stage log lines, the asset progress line and the watch
//! status block.
//!
//! ```text
//! [styles] 2 files                         log!(stage; ...)
//! [assets] styles(2/2) images(40/96)       ProgressLine, one per asset wave
//! [14:02:11] ✗ rebuilt (1 file changed)    status_build, redrawn in place
//!   styles: failed to write dist/css
//!   html-copy: skipped
//! ```
//!
//! Log lines printed while a progress line is live are written above it.

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    fmt::Write as _,
    io::{Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use crate::pipeline::{BuildSummary, StageOutcome};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Whether a progress line currently owns the bottom terminal row.
static PROGRESS_LIVE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// `log!("styles"; "{} files", n)` prints `[styles] 3 files`.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like [`log!`], only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let prefix = prefix(module);
    let mut stdout = stdout().lock();

    // The next progress refresh redraws the counters on the row below
    if PROGRESS_LIVE.load(Ordering::Relaxed) {
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// `[module]`, colored by what kind of line it is.
fn prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "error" => prefix.bright_red().bold().to_string(),
        "warning" => prefix.bright_magenta().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        "report" | "assets" => prefix.bright_blue().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch status
// ============================================================================

/// How a rebuild went, worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Failed,
    Degraded,
    Ok,
}

impl Status {
    fn symbol(self) -> String {
        match self {
            Self::Failed => "✗".red().to_string(),
            Self::Degraded => "⚠".yellow().to_string(),
            Self::Ok => "✓".green().to_string(),
        }
    }
}

/// Lines printed by the previous status block, so the next one replaces it.
static STATUS_LINES: Mutex<usize> = Mutex::new(0);

/// Replace the watch status block with the result of one rebuild.
pub fn status_build(label: &str, summary: &BuildSummary) {
    let (status, body) = build_status(label, summary);
    show_status(status, &body);
}

/// Replace the watch status block with an error that has no summary
/// (config reload, interrupted run).
pub fn status_error(headline: &str, detail: &str) {
    let mut body = headline.to_string();
    for line in detail.lines() {
        let _ = write!(body, "\n  {line}");
    }
    show_status(Status::Failed, &body);
}

/// Headline plus one indented line per stage that did not finish cleanly.
fn build_status(label: &str, summary: &BuildSummary) -> (Status, String) {
    let mut body = format!("{label}: {}", summary.headline());
    let mut status = Status::Ok;

    for (id, outcome) in &summary.outcomes {
        match outcome {
            StageOutcome::Failed(message) => {
                status = Status::Failed;
                let mut lines = message.lines();
                let _ = write!(body, "\n  {id}: {}", lines.next().unwrap_or_default());
                for line in lines {
                    let _ = write!(body, "\n    {line}");
                }
            }
            StageOutcome::Skipped => {
                status = Status::Failed;
                let _ = write!(body, "\n  {id}: skipped");
            }
            StageOutcome::Done(report) if report.failed > 0 => {
                if status == Status::Ok {
                    status = Status::Degraded;
                }
            }
            StageOutcome::Done(_) => {}
        }
    }
    (status, body)
}

fn show_status(status: Status, body: &str) {
    let mut last = STATUS_LINES.lock();
    let mut stdout = stdout().lock();

    if *last > 0 {
        #[allow(clippy::cast_possible_truncation)]
        execute!(stdout, cursor::MoveUp(*last as u16), Clear(ClearType::FromCursorDown)).ok();
    }
    let timestamp = format!("[{}]", clock()).dimmed().to_string();
    writeln!(stdout, "{timestamp} {} {body}", status.symbol()).ok();
    stdout.flush().ok();

    *last = body.lines().count().max(1);
}

/// UTC wall clock as `HH:MM:SS`.
fn clock() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!("{:02}:{:02}:{:02}", (secs / 3600) % 24, (secs / 60) % 60, secs % 60)
}

// ============================================================================
// Progress line
// ============================================================================

/// Per-stage file counters for one wave of asset stages, redrawn in place:
/// `[assets] styles(2/2) scripts(1/3) images(40/96)`.
///
/// Workers call [`ProgressLine::inc`] from rayon threads. A refresh is
/// skipped when another thread is already drawing.
pub struct ProgressLine {
    counters: Vec<(&'static str, usize, AtomicUsize)>,
    drawing: Mutex<()>,
}

impl ProgressLine {
    /// Stages with nothing to process get no counter.
    pub fn new(stages: &[(&'static str, usize)]) -> Self {
        let counters = stages
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|&(name, total)| (name, total, AtomicUsize::new(0)))
            .collect();

        PROGRESS_LIVE.store(true, Ordering::Relaxed);
        let progress = Self {
            counters,
            drawing: Mutex::new(()),
        };
        progress.draw(false);
        progress
    }

    pub fn inc(&self, stage: &str) {
        let Some((_, _, done)) = self.counters.iter().find(|(name, ..)| *name == stage) else {
            return;
        };
        done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.drawing.try_lock() {
            self.draw(false);
        }
    }

    /// Leave the final counts on screen.
    pub fn finish(self) {
        PROGRESS_LIVE.store(false, Ordering::Relaxed);
        let _guard = self.drawing.lock();
        self.draw(true);
    }

    fn line(&self) -> String {
        self.counters
            .iter()
            .map(|(name, total, done)| format!("{name}({}/{total})", done.load(Ordering::Relaxed)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn draw(&self, newline: bool) {
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} {}", prefix("assets"), self.line()).ok();
        if newline {
            writeln!(stdout).ok();
        }
        stdout.flush().ok();
    }
}

impl Drop for ProgressLine {
    /// A line that was never finished (stage panicked) is wiped.
    fn drop(&mut self) {
        if PROGRESS_LIVE.swap(false, Ordering::Relaxed) {
            let mut stdout = stdout().lock();
            execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
            stdout.flush().ok();
        }
    }
}
