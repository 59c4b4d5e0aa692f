//! Presentation sink: the render target for rows, columns, and status text.
//!
//! The sink is a single mutable surface shared by the refresh loop, the
//! run-once handler, the paginated viewer, and the export trigger. All of
//! them write through [`SinkHandle`], which serializes updates so partial
//! renders never interleave.

use std::sync::{Arc, Mutex};

use chrono::Local;

use crate::gateway::ResultSet;

/// Render target for derived values. Implementations never see or mutate
/// controller state; they only receive rows, columns, and status text.
pub trait PresentationSink: Send {
    /// Render a table of rows and columns.
    fn render(&mut self, result: &ResultSet);

    /// Render the distinguishable "no data" placeholder.
    fn render_no_data(&mut self);

    /// Clear the previous render.
    fn clear(&mut self);

    /// Replace the status text.
    fn set_status(&mut self, text: &str);

    /// Enable or disable the previous/next navigation controls.
    fn set_navigation(&mut self, prev_enabled: bool, next_enabled: bool);
}

/// Cloneable handle giving every writer mutual exclusion over the sink.
#[derive(Clone)]
pub struct SinkHandle {
    inner: Arc<Mutex<Box<dyn PresentationSink>>>,
}

impl SinkHandle {
    pub fn new(sink: Box<dyn PresentationSink>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut dyn PresentationSink) -> R) -> R {
        let mut sink = self.inner.lock().expect("presentation sink lock poisoned");
        f(sink.as_mut())
    }

    pub fn render(&self, result: &ResultSet) {
        self.with(|s| s.render(result));
    }

    pub fn render_no_data(&self) {
        self.with(|s| s.render_no_data());
    }

    pub fn clear(&self) {
        self.with(|s| s.clear());
    }

    pub fn set_status(&self, text: &str) {
        self.with(|s| s.set_status(text));
    }

    pub fn set_navigation(&self, prev_enabled: bool, next_enabled: bool) {
        self.with(|s| s.set_navigation(prev_enabled, next_enabled));
    }
}

/// Console sink used by the binary: timestamped status lines and a plain
/// fixed-width table render.
#[derive(Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn column_widths(result: &ResultSet) -> Vec<usize> {
        let mut widths: Vec<usize> = result.columns.iter().map(|c| c.len()).collect();
        for row in &result.rows {
            for (i, column) in result.columns.iter().enumerate() {
                let len = ResultSet::cell_text(row, column).len();
                if len > widths[i] {
                    widths[i] = len;
                }
            }
        }
        widths
    }
}

impl PresentationSink for ConsoleSink {
    fn render(&mut self, result: &ResultSet) {
        let widths = Self::column_widths(result);

        let header: Vec<String> = result
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = w))
            .collect();
        println!("{}", header.join("  "));
        println!("{}", "-".repeat(widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 2));

        for row in &result.rows {
            let cells: Vec<String> = result
                .columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", ResultSet::cell_text(row, c), width = w))
                .collect();
            println!("{}", cells.join("  "));
        }
    }

    fn render_no_data(&mut self) {
        println!("(no data)");
    }

    fn clear(&mut self) {
        // Scrollback stays useful on a terminal; a new render simply follows.
    }

    fn set_status(&mut self, text: &str) {
        println!("[{}] {}", Local::now().format("%H:%M:%S"), text);
    }

    fn set_navigation(&mut self, prev_enabled: bool, next_enabled: bool) {
        let flag = |enabled: bool| if enabled { "on" } else { "off" };
        println!("  prev: {}  next: {}", flag(prev_enabled), flag(next_enabled));
    }
}
