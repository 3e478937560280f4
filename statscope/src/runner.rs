//! Running the target and ingesting what it collects.
//!
//! [`ProfileRunner::launch`] spawns the target program with the sink file's
//! path in its environment, then hands child and sink to a background ingest
//! task. The task tails the sink, parses each NDJSON line into a
//! [`RecordBatch`] and merges it into the shared data source — it is the
//! source's only writer. The serving path never awaits the task.
//!
//! Failure containment: once the child is spawned, nothing that happens on
//! this path can take the viewer down. A crashed or finished target stops
//! the ingest loop; malformed or torn sink lines are skipped with a
//! warning; everything merged so far stays servable.

use crate::domain::{ConfigError, IngestError};
use crate::preflight::ResolvedTarget;
use crate::source::ProfilingDataSource;
use log::{info, warn};
use statscope_common::{RecordBatch, SINK_ENV};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};

const POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Handle for a launched target. Dropping it does not stop anything; the
/// child dies with the viewer process (`kill_on_drop` inside the task).
pub struct ProfileRunner {
    pub sink_path: PathBuf,
}

impl ProfileRunner {
    /// Spawn the target under profiling and start the ingest task.
    ///
    /// Spawn failures happen before the server starts and are fatal;
    /// everything after the spawn is contained.
    pub fn launch(
        target: &ResolvedTarget,
        args: &[String],
        source: Arc<ProfilingDataSource>,
    ) -> Result<Self, ConfigError> {
        let sink_path =
            std::env::temp_dir().join(format!("statscope-{}.ndjson", std::process::id()));
        std::fs::File::create(&sink_path)
            .map_err(|e| ConfigError::SinkUnavailable { path: sink_path.clone(), source: e })?;

        let child = Command::new(&target.program)
            .args(args)
            .current_dir(&target.workdir)
            .env(SINK_ENV, &sink_path)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConfigError::SpawnFailed { target: target.program.clone(), source: e })?;

        info!("profiling {} (pid {:?})", target.display_name, child.id());
        tokio::spawn(ingest(child, SinkTail::new(sink_path.clone()), source));
        Ok(Self { sink_path })
    }
}

async fn ingest(mut child: Child, mut tail: SinkTail, source: Arc<ProfilingDataSource>) {
    loop {
        drain(&mut tail, &source);
        match child.try_wait() {
            Ok(Some(status)) => {
                // pick up whatever the target flushed on its way out
                drain(&mut tail, &source);
                if status.success() {
                    info!("target finished; serving collected data");
                } else {
                    warn!("target exited with {status}; serving data collected so far");
                }
                break;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("cannot poll target: {e}");
                break;
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn drain(tail: &mut SinkTail, source: &ProfilingDataSource) {
    match tail.read_new_lines() {
        Ok(lines) => {
            for line in lines {
                match parse_batch(&line) {
                    Ok(batch) => source.merge(batch),
                    Err(e) => warn!("skipping sink line: {e}"),
                }
            }
        }
        // the target may not have produced the sink yet
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("cannot read profile sink: {e}"),
    }
}

fn parse_batch(line: &str) -> Result<RecordBatch, IngestError> {
    Ok(serde_json::from_str(line)?)
}

/// Incremental reader over an append-only NDJSON file.
///
/// Keeps a byte offset and a partial-line carry so a read that races the
/// writer mid-line hands the fragment back on the next poll instead of
/// producing a torn record.
struct SinkTail {
    path: PathBuf,
    offset: u64,
    pending: String,
}

impl SinkTail {
    fn new(path: PathBuf) -> Self {
        Self { path, offset: 0, pending: String::new() }
    }

    fn read_new_lines(&mut self) -> std::io::Result<Vec<String>> {
        let mut file = std::fs::File::open(&self.path)?;
        let len = file.metadata()?.len();
        if len < self.offset {
            // sink was truncated or replaced; start over
            self.offset = 0;
            self.pending.clear();
        }
        if len > self.offset {
            file.seek(SeekFrom::Start(self.offset))?;
            let mut buf = String::new();
            file.take(len - self.offset).read_to_string(&mut buf)?;
            self.offset += buf.len() as u64;
            self.pending.push_str(&buf);
        }

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let line = line.trim_end();
            if !line.is_empty() {
                lines.push(line.to_owned());
            }
        }
        Ok(lines)
    }
}

/// Load a finished run's sink file in one pass (`--file` mode).
pub fn load_dump(path: &Path, source: &ProfilingDataSource) -> Result<(), ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::DumpUnreadable { path: path.to_path_buf(), source: e })?;
    let mut merged = 0usize;
    let mut skipped = 0usize;
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match parse_batch(line) {
            Ok(batch) => {
                source.merge(batch);
                merged += 1;
            }
            Err(e) => {
                skipped += 1;
                warn!("skipping dump line: {e}");
            }
        }
    }
    info!("loaded {merged} batches from {} ({skipped} skipped)", path.display());
    Ok(())
}
