//! Scripted job manager shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use job_worker::{Job, JobManager, Result, ShutdownSignal, WorkerError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{sleep, Instant};

/// What the manager hands out on one poll
pub enum Step {
    Job(FakeJob),
    Empty,
    Unavailable,
}

/// Something the worker did, stamped with time since the manager was built
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Poll(Duration),
    Started(String, Duration),
    Finished(String, Duration),
}

#[derive(Clone)]
pub struct EventLog {
    start: Instant,
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn poll_times(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Poll(at) => Some(at.as_secs()),
                _ => None,
            })
            .collect()
    }

    pub fn finished_jobs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Finished(id, _) => Some(id),
                _ => None,
            })
            .collect()
    }
}

pub struct FakeJob {
    id: String,
    fail: bool,
    duration: Duration,
    requests_shutdown: u32,
    log: Option<EventLog>,
    shutdown: Option<ShutdownSignal>,
}

impl FakeJob {
    pub fn ok(id: &str) -> Self {
        Self {
            id: id.to_string(),
            fail: false,
            duration: Duration::ZERO,
            requests_shutdown: 0,
            log: None,
            shutdown: None,
        }
    }

    pub fn failing(id: &str) -> Self {
        Self {
            fail: true,
            ..Self::ok(id)
        }
    }

    pub fn taking(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Request shutdown `times` times from inside `run`
    pub fn requesting_shutdown(mut self, times: u32) -> Self {
        self.requests_shutdown = times;
        self
    }
}

#[async_trait]
impl Job for FakeJob {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn run(&mut self) -> Result<()> {
        let log = self.log.clone().expect("job handed out by ScriptedManager");
        log.push(Event::Started(self.id.clone(), log.elapsed()));

        if !self.duration.is_zero() {
            sleep(self.duration).await;
        }
        if let Some(shutdown) = &self.shutdown {
            for _ in 0..self.requests_shutdown {
                shutdown.request();
            }
        }

        log.push(Event::Finished(self.id.clone(), log.elapsed()));
        if self.fail {
            Err(WorkerError::ConfigError(format!("{} blew up", self.id)))
        } else {
            Ok(())
        }
    }
}

/// Replays a script of poll results.
///
/// Once the script runs out it keeps answering "no job"; with
/// `stop_when_exhausted` it also requests shutdown at that point.
pub struct ScriptedManager {
    script: Mutex<VecDeque<Step>>,
    stop_when_exhausted: bool,
    shutdown: OnceLock<ShutdownSignal>,
    log: EventLog,
    first_poll: Arc<Notify>,
}

impl ScriptedManager {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            stop_when_exhausted: true,
            shutdown: OnceLock::new(),
            log: EventLog::new(),
            first_poll: Arc::new(Notify::new()),
        }
    }

    /// Never requests shutdown on its own
    pub fn endless(script: Vec<Step>) -> Self {
        Self {
            stop_when_exhausted: false,
            ..Self::new(script)
        }
    }

    pub fn attach(&self, shutdown: ShutdownSignal) {
        let _ = self.shutdown.set(shutdown);
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    pub fn first_poll(&self) -> Arc<Notify> {
        Arc::clone(&self.first_poll)
    }
}

#[async_trait]
impl JobManager for ScriptedManager {
    async fn fetch_next(&self, _worker_name: &str) -> Result<Option<Box<dyn Job>>> {
        self.log.push(Event::Poll(self.log.elapsed()));
        self.first_poll.notify_one();

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Job(mut job)) => {
                job.log = Some(self.log.clone());
                job.shutdown = self.shutdown.get().cloned();
                Ok(Some(Box::new(job)))
            }
            Some(Step::Empty) => Ok(None),
            Some(Step::Unavailable) => Err(WorkerError::ManagerUnavailable(
                "connection refused".to_string(),
            )),
            None => {
                if self.stop_when_exhausted {
                    if let Some(shutdown) = self.shutdown.get() {
                        shutdown.request();
                    }
                }
                Ok(None)
            }
        }
    }
}
