//! Writes every trajectory update to a text file for offline inspection.
//! One block per iteration: a header line with the iteration number, then
//! the update matrix row by row. The logger never changes the update.
//!
//! A sink that cannot be opened, or that breaks mid-run, is reported once
//! and the logger stays quiet afterwards. A bad path or a full disk must
//! not abort the optimization.

extern crate nalgebra as na;

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use na::DMatrix;
use crate::errors::IkError;
use crate::update_filter::{check_window, UpdateFilter};

pub struct UpdateLogger {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl UpdateLogger {
    /// Opens the log file `filename` under `directory`. The file is opened
    /// right away so a bad path surfaces before the optimization starts,
    /// but only as a warning: a logger without a sink still runs, writing
    /// nothing.
    pub fn new(directory: &str, filename: &str) -> Self {
        let path = Path::new(directory).join(filename);
        let writer = match File::create(&path) {
            Ok(file) => Some(BufWriter::new(file)),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(), %error,
                    "cannot create update log, logging disabled"
                );
                None
            }
        };
        UpdateLogger { path, writer }
    }

    /// Where the log is written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(iteration: usize, update: &DMatrix<f64>) -> String {
        let mut block = String::new();
        let _ = writeln!(block, "iteration {}", iteration);
        for r in 0..update.nrows() {
            let row: Vec<String> = (0..update.ncols())
                .map(|c| format!("{:.6}", update[(r, c)]))
                .collect();
            let _ = writeln!(block, "{}", row.join(" "));
        }
        block
    }

    fn write_or_disable(&mut self, text: &str) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(error) = writer.write_all(text.as_bytes()) {
                tracing::warn!(
                    path = %self.path.display(), %error,
                    "update log write failed, logging disabled"
                );
                self.writer = None;
            }
        }
    }
}

impl UpdateFilter for UpdateLogger {
    fn name(&self) -> &str {
        "update_logger"
    }

    fn filter(
        &mut self,
        start: usize,
        len: usize,
        iteration: usize,
        parameters: &DMatrix<f64>,
        update: &mut DMatrix<f64>,
    ) -> Result<bool, IkError> {
        check_window(start, len, parameters, update)?;
        let block = Self::render(iteration, update);
        self.write_or_disable(&block);
        Ok(false)
    }

    fn done(&mut self, success: bool, iterations: usize, cost: f64) {
        let summary = format!(
            "done success={} iterations={} cost={:.6}\n",
            success, iterations, cost
        );
        self.write_or_disable(&summary);
        if let Some(mut writer) = self.writer.take() {
            if let Err(error) = writer.flush() {
                tracing::warn!(
                    path = %self.path.display(), %error,
                    "update log flush failed"
                );
            }
        }
    }
}
