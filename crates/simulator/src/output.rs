//! Per-machine log and CSV files.
//!
//! Each machine gets `machine_{id}.log` (one human-readable line per event)
//! and `machine_{id}.csv` (one row per event). Both are append-only. A run
//! starts by purging the files a previous run left behind.

use crate::SimulatorError;
use lamport_core::{EventSink, SinkError};
use lamport_types::{EventRecord, MachineId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Header row of every CSV file.
pub const CSV_HEADER: &str = "global_time,queue_length,logical_clock,logical_clock_delta,description";

const FILE_PREFIX: &str = "machine_";

/// Path of a machine's log file.
pub fn log_path(dir: &Path, machine: MachineId) -> PathBuf {
    dir.join(format!("{FILE_PREFIX}{machine}.log"))
}

/// Path of a machine's CSV file.
pub fn csv_path(dir: &Path, machine: MachineId) -> PathBuf {
    dir.join(format!("{FILE_PREFIX}{machine}.csv"))
}

/// Remove `machine_*.log` and `machine_*.csv` files from `dir`.
///
/// A missing directory counts as already clean. Returns how many files were
/// removed.
pub fn purge_outputs(dir: &Path) -> Result<usize, SimulatorError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(SimulatorError::io(dir, e)),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry.map_err(|e| SimulatorError::io(dir, e))?.path();
        if is_machine_output(&path) && path.is_file() {
            fs::remove_file(&path).map_err(|e| SimulatorError::io(&path, e))?;
            debug!(path = %path.display(), "Removed stale output");
            removed += 1;
        }
    }

    if removed > 0 {
        info!(removed, dir = %dir.display(), "Purged previous run output");
    }
    Ok(removed)
}

fn is_machine_output(path: &Path) -> bool {
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(FILE_PREFIX));
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "log" || ext == "csv");
    has_prefix && has_extension
}

/// Human-readable log line for a record, without the trailing newline.
pub fn format_log_line(record: &EventRecord) -> String {
    format!(
        "Global Time: {} | Queue Length: {} | Logical Clock: {} | {}",
        record.wall_clock_time,
        record.pending,
        record.logical_clock,
        record.kind
    )
}

/// CSV row for a record, without the trailing newline.
pub fn format_csv_row(record: &EventRecord) -> String {
    format!(
        "{},{},{},{},{}",
        record.wall_clock_time,
        record.pending,
        record.logical_clock,
        record.logical_clock_delta,
        csv_field(&record.description())
    )
}

/// Quote a CSV field if it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

struct MachineFiles {
    log: File,
    csv: File,
}

/// Sink writing each machine's records to its own pair of files.
///
/// Every machine has its own lock, so machines never wait on each other's
/// writes.
pub struct FileSink {
    files: HashMap<MachineId, Mutex<MachineFiles>>,
}

impl FileSink {
    /// Open (appending) the files of every machine in `dir`, creating the
    /// directory if needed. New CSV files get a header row.
    pub fn create(dir: &Path, machines: &[MachineId]) -> Result<Self, SimulatorError> {
        fs::create_dir_all(dir).map_err(|e| SimulatorError::io(dir, e))?;

        let mut files = HashMap::with_capacity(machines.len());
        for &machine in machines {
            let log = open_append(&log_path(dir, machine))?;
            let csv_file = csv_path(dir, machine);
            let mut csv = open_append(&csv_file)?;
            let is_new = csv
                .metadata()
                .map_err(|e| SimulatorError::io(&csv_file, e))?
                .len()
                == 0;
            if is_new {
                writeln!(csv, "{CSV_HEADER}").map_err(|e| SimulatorError::io(&csv_file, e))?;
            }
            files.insert(machine, Mutex::new(MachineFiles { log, csv }));
        }

        Ok(Self { files })
    }

}

impl EventSink for FileSink {
    fn record(&self, machine: MachineId, event: &EventRecord) -> Result<(), SinkError> {
        let files = self
            .files
            .get(&machine)
            .ok_or(SinkError::UnknownMachine(machine))?;
        let mut files = files.lock();
        writeln!(files.log, "{}", format_log_line(event))?;
        writeln!(files.csv, "{}", format_csv_row(event))?;
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<File, SimulatorError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SimulatorError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamport_types::EventKind;

    fn record(kind: EventKind) -> EventRecord {
        EventRecord {
            wall_clock_time: 1700000000.5,
            pending: 2,
            logical_clock: 14,
            logical_clock_delta: 3,
            kind,
        }
    }

    #[test]
    fn test_log_line_format() {
        let line = format_log_line(&record(EventKind::Received { from: MachineId(2) }));
        assert_eq!(
            line,
            "Global Time: 1700000000.5 | Queue Length: 2 | Logical Clock: 14 | Received message from 2"
        );
    }

    #[test]
    fn test_csv_row_format() {
        let row = format_csv_row(&record(EventKind::SentToAll));
        assert_eq!(row, "1700000000.5,2,14,3,Sent message to all recipients");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_machine_output_names() {
        assert!(is_machine_output(Path::new("out/machine_0.log")));
        assert!(is_machine_output(Path::new("machine_12.csv")));
        assert!(!is_machine_output(Path::new("machine_0.txt")));
        assert!(!is_machine_output(Path::new("results.csv")));
    }

    #[test]
    fn test_unknown_machine_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::create(dir.path(), &[MachineId(0)]).unwrap();

        let result = sink.record(MachineId(5), &record(EventKind::Internal));

        assert!(matches!(result, Err(SinkError::UnknownMachine(MachineId(5)))));
    }

    #[test]
    fn test_csv_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let machines = [MachineId(0)];

        let sink = FileSink::create(dir.path(), &machines).unwrap();
        sink.record(MachineId(0), &record(EventKind::Internal)).unwrap();
        drop(sink);

        // Reopening appends without a second header.
        let sink = FileSink::create(dir.path(), &machines).unwrap();
        sink.record(MachineId(0), &record(EventKind::Internal)).unwrap();

        let csv = fs::read_to_string(csv_path(dir.path(), MachineId(0))).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);

        let log = fs::read_to_string(log_path(dir.path(), MachineId(0))).unwrap();
        assert_eq!(log.lines().count(), 2);
    }

    #[test]
    fn test_purge_only_touches_machine_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("machine_0.log"), "old").unwrap();
        fs::write(dir.path().join("machine_0.csv"), "old").unwrap();
        fs::write(dir.path().join("notes.csv"), "keep").unwrap();

        assert_eq!(purge_outputs(dir.path()).unwrap(), 2);
        assert!(!dir.path().join("machine_0.log").exists());
        assert!(dir.path().join("notes.csv").exists());
    }

    #[test]
    fn test_purge_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(purge_outputs(&dir.path().join("absent")).unwrap(), 0);
    }
}
