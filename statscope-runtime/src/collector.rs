//! Thread-local call collector with RAII guards.
//!
//! Each instrumented function calls [`enter`] which pushes a frame onto a
//! thread-local call stack and returns a [`Guard`]. When the guard drops (on
//! any exit path), the frame is popped, elapsed and own time are computed,
//! children time is propagated to the parent frame, and the measurement is
//! folded into the thread's pending delta map together with the caller edge
//! (the frame below on the stack).
//!
//! Recursion: an activation whose function is already on the stack counts as
//! non-primitive — it bumps the total call count but neither the primitive
//! count nor cumulative time, so recursive chains are not double-counted.
//!
//! Flush strategy: each thread's pending deltas live in an
//! `Arc<Mutex<DeltaMap>>` registered in a global registry. The flusher thread
//! started by [`init`] drains every thread's map on an interval, merges the
//! deltas into one [`RecordBatch`] and appends it as an NDJSON line to the
//! sink file named by `STATSCOPE_SINK`. Draining thread-pool workers through
//! the registry means their data survives even if their TLS destructors
//! never fire.

use statscope_common::{CallCounts, FunctionKey, FunctionRecord, RecordBatch, FLUSH_INTERVAL_MS, SINK_ENV};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Identity of an instrumented call site. Normally constructed by the
/// [`profile_span!`](crate::profile_span) macro as a `static`.
#[derive(Debug)]
pub struct CallSite {
    pub name: &'static str,
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    fn key(&'static self) -> FunctionKey {
        FunctionKey::new(self.file, self.line, self.name)
    }
}

/// Entry on the thread-local call stack.
struct Frame {
    site: &'static CallSite,
    start: Instant,
    children: Duration,
    recursive: bool,
}

/// Pending per-function delta since the last flush.
struct SiteDelta {
    site: &'static CallSite,
    counts: CallCounts,
    callers: HashMap<usize, (&'static CallSite, CallCounts)>,
}

/// Keyed by call-site address: sites are statics, so the address is a stable
/// process-wide identity and cheaper to hash than the (file, line, name) triple.
type DeltaMap = HashMap<usize, SiteDelta>;
type ThreadDeltas = Arc<Mutex<DeltaMap>>;

static THREAD_REGISTRY: OnceLock<Mutex<Vec<ThreadDeltas>>> = OnceLock::new();

fn registry() -> &'static Mutex<Vec<ThreadDeltas>> {
    THREAD_REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

thread_local! {
    static STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
    static PENDING: ThreadDeltas = {
        let deltas = Arc::new(Mutex::new(DeltaMap::new()));
        registry().lock().unwrap_or_else(|e| e.into_inner()).push(Arc::clone(&deltas));
        deltas
    };
}

fn site_id(site: &'static CallSite) -> usize {
    std::ptr::from_ref(site) as usize
}

/// RAII guard for one activation. Records the measurement on drop.
#[must_use = "dropping the guard immediately records a ~0s call; bind it with `let _guard = ...`"]
pub struct Guard {
    site: &'static CallSite,
}

impl Drop for Guard {
    fn drop(&mut self) {
        STACK.with(|stack| {
            let frame = match stack.borrow_mut().pop() {
                Some(f) => f,
                None => {
                    log::warn!("guard for {} dropped without a matching stack frame", self.site.name);
                    return;
                }
            };

            let elapsed = frame.start.elapsed();
            let own = elapsed.saturating_sub(frame.children);
            let caller = {
                let mut s = stack.borrow_mut();
                match s.last_mut() {
                    Some(parent) => {
                        parent.children += elapsed;
                        Some(parent.site)
                    }
                    None => None,
                }
            };

            record(frame.site, caller, own, elapsed, frame.recursive);
        });
    }
}

/// Start timing an activation of `site`. Prefer the
/// [`profile_span!`](crate::profile_span) macro, which builds the static
/// `CallSite` for you.
pub fn enter(site: &'static CallSite) -> Guard {
    STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let recursive = stack.iter().any(|f| std::ptr::eq(f.site, site));
        stack.push(Frame { site, start: Instant::now(), children: Duration::ZERO, recursive });
    });
    Guard { site }
}

fn record(
    site: &'static CallSite,
    caller: Option<&'static CallSite>,
    own: Duration,
    elapsed: Duration,
    recursive: bool,
) {
    let bump = |counts: &mut CallCounts| {
        counts.calls += 1;
        counts.own_time += own.as_secs_f64();
        if !recursive {
            counts.prim_calls += 1;
            counts.cum_time += elapsed.as_secs_f64();
        }
    };

    PENDING.with(|pending| {
        let mut map = pending.lock().unwrap_or_else(|e| e.into_inner());
        let delta = map.entry(site_id(site)).or_insert_with(|| SiteDelta {
            site,
            counts: CallCounts::default(),
            callers: HashMap::new(),
        });
        bump(&mut delta.counts);
        if let Some(caller) = caller {
            let (_, edge) = delta
                .callers
                .entry(site_id(caller))
                .or_insert((caller, CallCounts::default()));
            bump(edge);
        }
    });
}

/// Drain every thread's pending deltas into one batch.
fn drain_batch() -> RecordBatch {
    let buffers: Vec<ThreadDeltas> = {
        let reg = registry().lock().unwrap_or_else(|e| e.into_inner());
        reg.clone()
    };

    // Merge by site across threads; site addresses are process-wide.
    let mut merged: DeltaMap = DeltaMap::new();
    for buffer in &buffers {
        let drained = {
            let mut map = buffer.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *map)
        };
        for (id, delta) in drained {
            match merged.entry(id) {
                std::collections::hash_map::Entry::Vacant(v) => {
                    v.insert(delta);
                }
                std::collections::hash_map::Entry::Occupied(mut o) => {
                    let slot = o.get_mut();
                    slot.counts.absorb(&delta.counts);
                    for (cid, (csite, ccounts)) in delta.callers {
                        slot.callers
                            .entry(cid)
                            .or_insert((csite, CallCounts::default()))
                            .1
                            .absorb(&ccounts);
                    }
                }
            }
        }
    }

    let mut records: Vec<FunctionRecord> = merged
        .into_values()
        .map(|delta| FunctionRecord {
            key: delta.site.key(),
            counts: delta.counts,
            callers: delta
                .callers
                .into_values()
                .map(|(csite, ccounts)| (csite.key(), ccounts))
                .collect(),
        })
        .collect();
    // Stable output order keeps sink lines diffable between runs.
    records.sort_by(|a, b| a.key.cmp(&b.key));
    for rec in &mut records {
        rec.callers.sort_by(|a, b| a.0.cmp(&b.0));
    }
    RecordBatch { records }
}

/// Append one batch line to the sink file. No-op for an empty batch.
fn flush_to(path: &Path) -> std::io::Result<()> {
    let batch = drain_batch();
    if batch.is_empty() {
        return Ok(());
    }
    let line = serde_json::to_string(&batch)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut sink = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(sink, "{line}")?;
    Ok(())
}

static FLUSHER: OnceLock<()> = OnceLock::new();

/// Start the background flusher if `STATSCOPE_SINK` is set.
///
/// Idempotent; the thread is a daemon in spirit — it holds no resources the
/// process cares about and dies with the process.
pub fn init() {
    let Some(path) = std::env::var_os(SINK_ENV) else {
        return;
    };
    FLUSHER.get_or_init(|| {
        std::thread::Builder::new()
            .name("statscope-flush".into())
            .spawn(move || loop {
                std::thread::sleep(Duration::from_millis(FLUSH_INTERVAL_MS));
                if let Err(e) = flush_to(Path::new(&path)) {
                    log::warn!("statscope flush failed: {e}");
                }
            })
            .map(|_| ())
            .unwrap_or_else(|e| log::warn!("statscope flusher not started: {e}"));
    });
}

/// Flush whatever is pending. Call at the end of `main` so the tail of a
/// short run is not lost between flusher ticks.
pub fn shutdown() {
    if let Some(path) = std::env::var_os(SINK_ENV) {
        if let Err(e) = flush_to(Path::new(&path)) {
            log::warn!("statscope final flush failed: {e}");
        }
    }
}
