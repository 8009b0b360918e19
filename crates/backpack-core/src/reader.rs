//! Cursor-based reading of a growing user log file.
//!
//! The dashboard holds nothing but an integer row cursor. The reader
//! reconstructs a byte position from it using the header line's byte
//! length as the assumed fixed width of every record — an
//! approximation the log writer upholds, not a guarantee the reader
//! checks up front. Anything that breaks the assumption mid-file (a
//! partial line still being written, a corrupted record, an I/O
//! hiccup) simply ends the poll early; the next poll resumes from the
//! same cursor.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use backpack_types::{Channel, VOLTAGE_COLUMN, parse_header, parse_record};

/// What one read of a data source yields, before alarm routing.
///
/// Voltage samples ride alongside the series rather than inside them:
/// the poller feeds them through the hysteresis monitor and they never
/// appear in the client-facing batch.
#[derive(Debug, Clone)]
pub struct SourceRead {
    /// The cursor the client should present next; `-1` for
    /// internally-tracked simulation streams.
    pub next_cursor: i64,
    /// The file the rows came from; empty when no file could be read.
    pub file_name: String,
    /// Per-channel series, one value per accepted row.
    pub rows: BTreeMap<Channel, Vec<f64>>,
    /// Battery voltage samples, in row order.
    pub voltage: Vec<f64>,
}

impl SourceRead {
    /// An empty read with no file: the "no instrument data yet" state.
    pub fn empty(cursor: i64) -> Self {
        Self {
            next_cursor: cursor,
            file_name: String::new(),
            rows: Channel::ALL.iter().map(|c| (*c, Vec::new())).collect(),
            voltage: Vec::new(),
        }
    }
}

/// Read every complete record at or after `cursor` rows into the file.
///
/// The header line is row 0; data rows are numbered from 1. A cursor
/// below 1 is clamped to 1, and a cursor whose byte offset lies beyond
/// the end of the file is treated as stale (the file was rotated or
/// truncated) and reset to 1.
///
/// An unopenable path yields [`SourceRead::empty`] — absence of the
/// file is the normal "no data logged yet" condition, never an error.
pub fn read_since(path: &Path, cursor: i64) -> SourceRead {
    let Ok(file) = File::open(path) else {
        return SourceRead::empty(cursor);
    };
    let mut reader = BufReader::new(file);

    let mut header_line = String::new();
    let Ok(header_len) = reader.read_line(&mut header_line) else {
        return SourceRead::empty(cursor);
    };
    let record_len = header_len as u64;
    let Ok(file_len) = reader.get_ref().metadata().map(|m| m.len()) else {
        return SourceRead::empty(cursor);
    };

    let mut out = SourceRead::empty(cursor);
    out.file_name = path.display().to_string();
    if record_len == 0 {
        // Empty file: nothing to deliver, cursor unchanged.
        return out;
    }

    let header = parse_header(&header_line);
    for column in &header {
        if Channel::from_column(column).is_none() && column != VOLTAGE_COLUMN {
            debug!(column, file = %path.display(), "ignoring untracked log column");
        }
    }

    // Row 0 is the header; a stale cursor pointing past the end of the
    // file means the log rotated underneath the client.
    let mut cursor = cursor.max(1) as u64;
    if cursor.saturating_mul(record_len) > file_len {
        debug!(cursor, file_len, "cursor beyond end of file, resetting to row 1");
        cursor = 1;
    }
    if reader
        .seek(SeekFrom::Start(cursor * record_len))
        .is_err()
    {
        return out;
    }

    let mut line = String::new();
    loop {
        line.clear();
        let Ok(n) = reader.read_line(&mut line) else {
            break;
        };
        // A short read is a partial line still being written; a long
        // one means the fixed-width assumption broke. Both end the
        // poll here.
        if n as u64 != record_len {
            break;
        }
        let Ok(values) = parse_record(&header, &line) else {
            break;
        };
        for (column, value) in header.iter().zip(values) {
            if column == VOLTAGE_COLUMN {
                out.voltage.push(value);
            } else if let Some(channel) = Channel::from_column(column) {
                out.rows.entry(channel).or_default().push(value);
            }
        }
        cursor += 1;
    }

    out.next_cursor = cursor as i64;
    out
}
