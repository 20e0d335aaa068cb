use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;

use bincode::{deserialize_from, serialize_into};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::schedule::{Schedule, ScheduleConfig};

/// Everything that persists across sessions: the configuration and, once
/// generated, the grid. `schedule` stays `None` until the operator generates
/// a timetable for the first time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub config: ScheduleConfig,
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            config: ScheduleConfig::default(),
            schedule: None,
            saved_at: None,
        }
    }
}

impl Snapshot {
    /// Repairs a snapshot that arrived from outside (disk file or uploaded
    /// backup). A grid whose cell count disagrees with its own dimensions is
    /// replaced outright; a grid whose dimensions lag behind the
    /// configuration is reshaped so that every cell access stays in range.
    pub fn normalize(&mut self) {
        if let Some(schedule) = &mut self.schedule {
            if schedule.cells.len() != schedule.classes * schedule.days * schedule.slots {
                *schedule = Schedule::create(&self.config);
            } else if schedule.classes != self.config.class_names.len()
                || schedule.days != self.config.days.len()
                || schedule.slots != self.config.time_slots.len()
            {
                schedule.reshape(&self.config);
            }
        }
    }
}

/// Writes the snapshot as pretty JSON, stamped with the current time.
pub fn save_snapshot(snapshot: &Snapshot, path: impl AsRef<Path>) -> std::io::Result<()> {
    let stamped = Snapshot {
        saved_at: Some(Utc::now()),
        ..snapshot.clone()
    };

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &stamped)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    Ok(())
}

/// Reads the snapshot back. A missing file means a first run and yields the
/// built-in defaults; malformed content is logged and also falls back to the
/// defaults rather than failing.
pub fn load_snapshot(path: impl AsRef<Path>) -> Snapshot {
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(_) => return Snapshot::default(),
    };

    let reader = BufReader::new(file);
    match serde_json::from_reader::<_, Snapshot>(reader) {
        Ok(mut snapshot) => {
            snapshot.normalize();
            snapshot
        }
        Err(e) => {
            log::warn!(
                "discarding malformed snapshot {}: {}",
                path.as_ref().display(),
                e
            );
            Snapshot::default()
        }
    }
}

/// Serializes the snapshot into a gzip-compressed binary buffer, the format
/// of the downloadable backup file.
pub fn backup_to_memory(snapshot: &Snapshot, buffer: &mut Vec<u8>) -> std::io::Result<()> {
    let encoder = GzEncoder::new(buffer, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, snapshot)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    Ok(())
}

/// Deserializes a snapshot from an uploaded backup buffer.
pub fn restore_from_memory(buffer: &[u8]) -> std::io::Result<Snapshot> {
    let cursor = Cursor::new(buffer);
    let decoder = GzDecoder::new(cursor);
    let mut reader = BufReader::new(decoder);

    let mut snapshot: Snapshot = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    snapshot.normalize();

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::CellField;

    #[test]
    fn snapshot_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.json");

        let mut snapshot = Snapshot::default();
        let mut schedule = Schedule::create(&snapshot.config);
        schedule
            .set_cell(&snapshot.config, 0, 0, 0, CellField::Subject, "Qaida")
            .unwrap();
        snapshot.schedule = Some(schedule);

        save_snapshot(&snapshot, &path).unwrap();
        let loaded = load_snapshot(&path);

        assert_eq!(loaded.config, snapshot.config);
        assert_eq!(loaded.schedule, snapshot.schedule);
        assert!(loaded.saved_at.is_some());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_snapshot(dir.path().join("absent.json"));
        assert_eq!(loaded, Snapshot::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"config\": 42").unwrap();

        let loaded = load_snapshot(&path);
        assert_eq!(loaded, Snapshot::default());
    }

    #[test]
    fn snapshot_round_trips_through_backup_buffer() {
        let mut snapshot = Snapshot::default();
        snapshot.schedule = Some(Schedule::create(&snapshot.config));

        let mut buffer = Vec::new();
        backup_to_memory(&snapshot, &mut buffer).unwrap();
        assert!(!buffer.is_empty());

        let restored = restore_from_memory(&buffer).unwrap();
        assert_eq!(restored.config, snapshot.config);
        assert_eq!(restored.schedule, snapshot.schedule);
    }

    #[test]
    fn garbage_backup_is_an_error_not_a_panic() {
        assert!(restore_from_memory(b"not a backup").is_err());
    }

    #[test]
    fn normalize_reshapes_a_lagging_grid() {
        let mut snapshot = Snapshot::default();
        snapshot.schedule = Some(Schedule::create(&snapshot.config));
        snapshot.config.class_names.push("Class 3".to_string());

        snapshot.normalize();

        let schedule = snapshot.schedule.unwrap();
        assert_eq!(schedule.classes, 3);
        assert_eq!(schedule.cells.len(), 3 * 5 * 2);
    }

    #[test]
    fn normalize_replaces_an_inconsistent_grid() {
        let mut snapshot = Snapshot::default();
        let mut schedule = Schedule::create(&snapshot.config);
        schedule.cells.pop();
        snapshot.schedule = Some(schedule);

        snapshot.normalize();

        let schedule = snapshot.schedule.unwrap();
        assert_eq!(schedule.cells.len(), 2 * 5 * 2);
    }
}
