//! Simulated data sources.
//!
//! When no instrument is attached the poller can serve synthetic data
//! that is protocol-compatible with the live log: either a replay of
//! pre-recorded log files or formula-driven channels over a sweeping
//! index. The variant is selected once at construction from the
//! configuration; both sit behind [`SimulationSource`].
//!
//! Simulation is a continuous stream, not a resumable file: every read
//! reports the `-1` cursor sentinel and the client just keeps polling.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tracing::{debug, warn};

use backpack_types::{Channel, VOLTAGE_COLUMN, parse_header, parse_record};

use crate::error::{Error, Result};
use crate::expr::CompiledExpression;
use crate::reader::SourceRead;

/// Cursor sentinel for simulation streams.
pub const STREAM_CURSOR: i64 = -1;

/// A data source that substitutes for the live instrument log.
pub trait SimulationSource: Send {
    /// Produce the next read of the stream.
    ///
    /// `cursor` is the client-supplied cursor; replay mode ignores it
    /// entirely, expression mode uses it as the sweep index.
    fn next(&mut self, cursor: i64) -> Result<SourceRead>;
}

/// Replays pre-recorded log files as if they were live output.
///
/// Each read yields one record; on end of file the source advances to
/// the next file in the list (wrapping after the last) and re-reads
/// that file's header before continuing.
pub struct ReplaySource {
    files: Vec<PathBuf>,
    index: usize,
    reader: BufReader<File>,
    header: Vec<String>,
}

impl std::fmt::Debug for ReplaySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaySource")
            .field("files", &self.files)
            .field("index", &self.index)
            .finish()
    }
}

impl ReplaySource {
    /// Open a replay source over an ordered list of recorded files.
    ///
    /// Every listed file must exist; a missing file is fatal here, at
    /// startup, rather than mid-serve.
    pub fn new(files: Vec<PathBuf>) -> Result<Self> {
        if files.is_empty() {
            return Err(Error::invalid_config("replay file list is empty"));
        }
        for file in &files {
            if !file.exists() {
                return Err(Error::ReplayFileNotFound(file.clone()));
            }
        }
        let (reader, header) = open_recording(&files[0])?;
        Ok(Self {
            files,
            index: 0,
            reader,
            header,
        })
    }

    fn advance(&mut self) -> Result<()> {
        self.index = (self.index + 1) % self.files.len();
        debug!(file = %self.files[self.index].display(), "replay advancing to next file");
        let (reader, header) = open_recording(&self.files[self.index])?;
        self.reader = reader;
        self.header = header;
        Ok(())
    }
}

fn open_recording(path: &Path) -> Result<(BufReader<File>, Vec<String>)> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok((reader, parse_header(&line)))
}

impl SimulationSource for ReplaySource {
    fn next(&mut self, _cursor: i64) -> Result<SourceRead> {
        let mut out = SourceRead::empty(STREAM_CURSOR);

        // At most one full pass over the file list; if every file is
        // empty there is nothing to replay and the read comes back
        // empty instead of spinning.
        let mut wraps = 0;
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                wraps += 1;
                if wraps > self.files.len() {
                    warn!("all replay files are empty");
                    return Ok(out);
                }
                self.advance()?;
                continue;
            }
            match parse_record(&self.header, &line) {
                Ok(values) => {
                    for (column, value) in self.header.iter().zip(values) {
                        if column == VOLTAGE_COLUMN {
                            out.voltage.push(value);
                        } else if let Some(channel) = Channel::from_column(column) {
                            out.rows.entry(channel).or_default().push(value);
                        }
                    }
                    out.file_name = self.files[self.index].display().to_string();
                    return Ok(out);
                }
                Err(e) => {
                    // Recorded files can end with a truncated line;
                    // skip it and keep consuming.
                    warn!(error = %e, "skipping malformed replay record");
                }
            }
        }
    }
}

/// Synthesizes channel values from configured formulas over a
/// triangularly sweeping index.
///
/// The index increments while below `max_index`, reverses at
/// `max_index`, and reverses again at 1, producing an unbounded
/// back-and-forth cycle. The `Battery` formula feeds the hysteresis
/// monitor instead of being emitted as a series; every read carries a
/// wall-clock timestamp.
#[derive(Debug)]
pub struct ExpressionSource {
    channels: Vec<(Channel, CompiledExpression)>,
    battery: CompiledExpression,
    max_index: i64,
    increment: i64,
}

impl ExpressionSource {
    /// Compile the per-channel formulas.
    ///
    /// Empty formulas yield constant-zero series. A `max_index` below
    /// 2 leaves no room to sweep and is rejected.
    pub fn new(ch4: &str, co2: &str, h2o: &str, battery: &str, max_index: i64) -> Result<Self> {
        if max_index < 2 {
            return Err(Error::invalid_config(format!(
                "simulation max_index must be at least 2, got {max_index}"
            )));
        }
        let channels = vec![
            (Channel::Ch4, CompiledExpression::compile("CH4", ch4)?),
            (Channel::Co2, CompiledExpression::compile("CO2", co2)?),
            (Channel::H2o, CompiledExpression::compile("H2O", h2o)?),
        ];
        Ok(Self {
            channels,
            battery: CompiledExpression::compile("Battery", battery)?,
            max_index,
            increment: 1,
        })
    }
}

impl SimulationSource for ExpressionSource {
    fn next(&mut self, cursor: i64) -> Result<SourceRead> {
        let x = cursor as f64;
        let mut out = SourceRead::empty(STREAM_CURSOR);
        out.file_name = "simulation".to_string();

        for (channel, expr) in &mut self.channels {
            out.rows.entry(*channel).or_default().push(expr.evaluate(x)?);
        }
        out.voltage.push(self.battery.evaluate(x)?);

        let now = OffsetDateTime::now_utc();
        out.rows
            .entry(Channel::EpochTime)
            .or_default()
            .push(now.unix_timestamp_nanos() as f64 / 1e9);

        if cursor == self.max_index {
            self.increment = -1;
        } else if cursor == 1 {
            self.increment = 1;
        }
        out.next_cursor = cursor + self.increment;
        Ok(out)
    }
}
