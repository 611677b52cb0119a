use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    mpsc, Arc, Mutex,
    atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering},
};
use std::thread;

use tracing::{debug, warn};

use crate::errors::PiError;

thread_local! {
    static CURRENT_WORKER_TID: Cell<i32> = Cell::new(0);
}

#[cfg(target_os = "linux")]
fn gettid() -> i32 {
    // SAFETY: direct syscall; returns thread id (TID) on Linux
    unsafe { libc::syscall(libc::SYS_gettid) as i32 }
}
#[cfg(not(target_os = "linux"))]
fn gettid() -> i32 {
    // Fallback: use process id if no gettid (not unique per thread, but deterministic)
    std::process::id() as i32
}

/// OS thread id of the pool worker running the caller, if any.
pub fn current_worker_tid() -> Option<i32> {
    let tid = CURRENT_WORKER_TID.with(|cell| cell.get());
    if tid > 0 { Some(tid) } else { None }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Shutdown,
}

struct WorkerInfo {
    tid: AtomicI32,
    busy: AtomicBool,
    name: String,
}

#[derive(Clone, Debug)]
pub struct WorkerSnapshot {
    pub name: String,
    pub tid: i32,
    pub state: String,
}

/// Fixed set of named threads pulling jobs from one shared channel.
/// Dropping the pool shuts every worker down and joins it.
pub struct ThreadPool {
    name: String,
    sender: mpsc::Sender<Message>,
    workers: Vec<Option<thread::JoinHandle<()>>>,
    infos: Vec<Arc<WorkerInfo>>,
    active_workers: Arc<AtomicUsize>,
}

impl ThreadPool {
    pub fn new(name: &str, size: usize) -> Result<Self, PiError> {
        if size == 0 {
            return Err(PiError::DegenerateInput(format!(
                "thread pool '{}' must have at least one worker",
                name
            )));
        }

        let (tx, rx) = mpsc::channel::<Message>();
        let receiver = Arc::new(Mutex::new(rx));
        let active_workers = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(size);
        let mut infos = Vec::with_capacity(size);

        for idx in 0..size {
            let rx = Arc::clone(&receiver);
            let active = Arc::clone(&active_workers);
            let thread_name = format!("{}-worker-{}", name, idx);

            let info = Arc::new(WorkerInfo {
                tid: AtomicI32::new(0),
                busy: AtomicBool::new(false),
                name: thread_name.clone(),
            });
            infos.push(Arc::clone(&info));

            let handle = thread::Builder::new()
                .name(thread_name)
                .spawn(move || worker_loop(rx, info, active))?;

            workers.push(Some(handle));
        }

        debug!(pool = name, size, "thread pool started");

        Ok(ThreadPool {
            name: name.to_string(),
            sender: tx,
            workers,
            infos,
            active_workers,
        })
    }

    pub fn execute<F>(&self, job: F) -> Result<(), PiError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender.send(Message::Run(Box::new(job))).map_err(|err| {
            PiError::Internal(format!(
                "thread pool {}: worker channel closed, job dropped ({})",
                self.name, err
            ))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_workers(&self) -> usize {
        self.workers.len()
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::SeqCst)
    }

    pub fn per_worker_snapshots(&self) -> Vec<WorkerSnapshot> {
        self.infos
            .iter()
            .map(|info| WorkerSnapshot {
                name: info.name.clone(),
                tid: info.tid.load(Ordering::SeqCst),
                state: if info.busy.load(Ordering::SeqCst) { "busy" } else { "idle" }.to_string(),
            })
            .collect()
    }
}

fn worker_loop(rx: Arc<Mutex<mpsc::Receiver<Message>>>, info: Arc<WorkerInfo>, active: Arc<AtomicUsize>) {
    let tid = gettid();
    CURRENT_WORKER_TID.with(|cell| cell.set(tid));
    info.tid.store(tid, Ordering::SeqCst);

    loop {
        let message = match rx.lock() {
            Ok(guard) => guard.recv(),
            Err(_) => break,
        };

        match message {
            Ok(Message::Run(job)) => {
                info.busy.store(true, Ordering::SeqCst);
                active.fetch_add(1, Ordering::SeqCst);

                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    warn!(worker = %info.name, "job panicked; worker keeps running");
                }

                active.fetch_sub(1, Ordering::SeqCst);
                info.busy.store(false, Ordering::SeqCst);
            }
            Ok(Message::Shutdown) | Err(_) => break,
        }
    }

    info.busy.store(false, Ordering::SeqCst);
    CURRENT_WORKER_TID.with(|cell| cell.set(0));
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        for _ in 0..self.workers.len() {
            let _ = self.sender.send(Message::Shutdown);
        }
        for handle in self.workers.iter_mut().filter_map(Option::take) {
            let _ = handle.join();
        }
        debug!(pool = %self.name, "thread pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(ThreadPool::new("empty", 0), Err(PiError::DegenerateInput(_))));
    }

    #[test]
    fn test_jobs_run_on_named_workers() {
        let pool = ThreadPool::new("unit", 3).unwrap();
        assert_eq!(pool.total_workers(), 3);

        let (tx, rx) = mpsc::channel();
        for i in 0..6u32 {
            let tx = tx.clone();
            pool.execute(move || {
                let name = thread::current().name().map(str::to_string);
                let _ = tx.send((i, name, current_worker_tid()));
            })
            .unwrap();
        }
        drop(tx);

        let mut seen: Vec<u32> = Vec::new();
        for (i, name, tid) in rx.iter() {
            assert!(name.unwrap().starts_with("unit-worker-"));
            assert!(tid.is_some());
            seen.push(i);
        }
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_worker_survives_panicking_job() {
        let pool = ThreadPool::new("panicky", 1).unwrap();
        pool.execute(|| panic!("boom")).unwrap();

        let (tx, rx) = mpsc::channel();
        pool.execute(move || {
            let _ = tx.send(42);
        })
        .unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }

    #[test]
    fn test_active_workers_counts_running_jobs() {
        let pool = ThreadPool::new("active", 2).unwrap();
        assert_eq!(pool.active_workers(), 0);

        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        pool.execute(move || {
            let _ = started_tx.send(());
            let _ = release_rx.recv();
        })
        .unwrap();

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(pool.active_workers(), 1);
        assert_eq!(pool.total_workers(), 2);

        release_tx.send(()).unwrap();
        let mut waited = 0;
        while pool.active_workers() != 0 && waited < 500 {
            thread::sleep(Duration::from_millis(10));
            waited += 1;
        }
        assert_eq!(pool.active_workers(), 0);
    }

    #[test]
    fn test_snapshots_cover_every_worker() {
        let pool = ThreadPool::new("snap", 2).unwrap();
        let snaps = pool.per_worker_snapshots();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].name, "snap-worker-0");
        assert_eq!(current_worker_tid(), None);
    }
}
