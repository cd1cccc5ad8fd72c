//! Run orchestration: admission, bounded dispatch and the result stream.

use crate::config::Options;
use crate::frontier::{Frontier, Rejection};
use crate::parser::{dedupe_packages, ExtractionEngine};
use crate::registry::ClaimChecker;
use crate::transport::{Resolver, Transport};
use crate::types::{NpmjackError, Result, ScanResult};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info_span, trace, warn, Instrument};

/// Results travel through a single-slot channel so producers wait on the consumer.
pub const RESULT_STREAM_CAPACITY: usize = 1;

/// Receiving end of a run.
pub type ResultStream = mpsc::Receiver<ScanResult>;

/// Lifecycle of one dispatched target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Pending,
    Fetching,
    Extracting,
    Checking,
    Failed,
    Done,
}

/// Everything a task needs, shared read-only across tasks.
struct TaskContext {
    transport: Transport,
    engine: ExtractionEngine,
    checker: ClaimChecker,
    timeout: Duration,
}

impl TaskContext {
    /// Fetch, extract and claim-check one target. Always yields a result.
    async fn process(&self, url: String) -> ScanResult {
        let mut state = TargetState::Pending;
        transition(&mut state, TargetState::Fetching);

        let page = match tokio::time::timeout(self.timeout, self.transport.fetch(&url)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => return self.fail(&mut state, url, e),
            Err(_) => {
                let e = NpmjackError::Timeout(self.timeout.as_secs());
                return self.fail(&mut state, url, e);
            }
        };

        transition(&mut state, TargetState::Extracting);
        let packages = dedupe_packages(self.engine.extract(&url, &page.body));
        debug!("Extracted {} unique packages", packages.len());

        transition(&mut state, TargetState::Checking);
        let packages = self.checker.annotate(packages).await;

        transition(&mut state, TargetState::Done);
        ScanResult {
            resolver: self.transport.resolver_for(&url),
            request_url: url,
            status_code: page.status,
            error: None,
            packages,
        }
    }

    fn fail(&self, state: &mut TargetState, url: String, error: NpmjackError) -> ScanResult {
        transition(state, TargetState::Failed);
        debug!("Fetch failed: {}", error);
        let resolver = self.transport.resolver_for(&url);
        let result = ScanResult::failed(url, resolver, &error);
        transition(state, TargetState::Done);
        result
    }
}

fn transition(state: &mut TargetState, next: TargetState) {
    trace!("{:?} -> {:?}", state, next);
    *state = next;
}

/// Pause before the next dispatch: `delay` plus uniform jitter in `[0, jitter)`.
pub fn dispatch_pause(delay_ms: u64, jitter_ms: u64) -> Duration {
    let extra = if jitter_ms > 0 {
        rand::thread_rng().gen_range(0..jitter_ms)
    } else {
        0
    };
    Duration::from_millis(delay_ms + extra)
}

/// Drives one scan run.
pub struct Runner {
    options: Options,
    frontier: Frontier,
    context: Arc<TaskContext>,
}

impl Runner {
    /// Build the resolver chain, transport and claim checker from `options`.
    pub fn new(options: Options) -> Result<Self> {
        let resolver = if options.resolvers.is_empty() {
            None
        } else {
            let dns_timeout = Duration::from_secs(options.timeout.max(1));
            Some(Arc::new(Resolver::new(&options.resolvers, dns_timeout)))
        };
        Self::with_resolver(options, resolver)
    }

    /// Like [`Runner::new`] with a caller-supplied resolver chain.
    pub fn with_resolver(options: Options, resolver: Option<Arc<Resolver>>) -> Result<Self> {
        let transport = Transport::new(&options, resolver)?;
        let checker = ClaimChecker::new(transport.client().clone(), &options);

        let context = TaskContext {
            transport,
            engine: ExtractionEngine::new(),
            checker,
            timeout: Duration::from_secs(options.timeout.max(1)),
        };

        Ok(Self {
            options,
            frontier: Frontier::new(),
            context: Arc::new(context),
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Frontier gate: normalize, deduplicate and apply the extension policy.
    pub fn admit(&mut self, raw: &str) -> std::result::Result<String, Rejection> {
        self.frontier.admit(raw)
    }

    /// Scan `targets`, sending one result per dispatched target on `tx`.
    ///
    /// Returns the number of dispatched targets once every task has finished.
    /// `tx` is dropped before returning, which ends the stream. The caller
    /// must drain the receiver concurrently.
    pub async fn run(&mut self, targets: Vec<String>, tx: mpsc::Sender<ScanResult>) -> Result<usize> {
        if targets.is_empty() {
            return Err(NpmjackError::NoTargets);
        }

        let slots = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut dispatched = 0usize;

        for raw in &targets {
            let url = match self.frontier.admit(raw) {
                Ok(url) => url,
                Err(rejection) => {
                    debug!("Skipping {}: {}", raw, rejection);
                    continue;
                }
            };

            if dispatched > 0 {
                let pause = dispatch_pause(self.options.delay, self.options.delay_jitter);
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }

            let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
                warn!("Concurrency slots closed; stopping dispatch");
                break;
            };

            let context = Arc::clone(&self.context);
            let tx = tx.clone();
            let span = info_span!("target", url = %url);
            tasks.spawn(
                async move {
                    let result = context.process(url).await;
                    if tx.send(result).await.is_err() {
                        debug!("Result stream closed; dropping result");
                    }
                    drop(permit);
                }
                .instrument(span),
            );
            dispatched += 1;

            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    warn!("Scan task failed: {}", e);
                }
            }
        }

        drop(tx);
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Scan task failed: {}", e);
            }
        }

        debug!("Run finished: {} targets dispatched", dispatched);
        Ok(dispatched)
    }

    /// Spawn the run and hand back the stream and the run's handle.
    pub fn start(mut self, targets: Vec<String>) -> (ResultStream, JoinHandle<Result<usize>>) {
        let (tx, rx) = mpsc::channel(RESULT_STREAM_CAPACITY);
        let handle = tokio::spawn(async move { self.run(targets, tx).await });
        (rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_pause_bounds() {
        assert_eq!(dispatch_pause(0, 0), Duration::ZERO);
        assert_eq!(dispatch_pause(250, 0), Duration::from_millis(250));
        for _ in 0..100 {
            let pause = dispatch_pause(100, 50);
            assert!(pause >= Duration::from_millis(100));
            assert!(pause < Duration::from_millis(150));
        }
    }

    #[test]
    fn test_transition() {
        let mut state = TargetState::Pending;
        transition(&mut state, TargetState::Fetching);
        assert_eq!(state, TargetState::Fetching);
    }

    #[tokio::test]
    async fn test_empty_targets_is_fatal() {
        let mut runner = Runner::new(Options::default()).unwrap();
        let (tx, _rx) = mpsc::channel(RESULT_STREAM_CAPACITY);
        assert!(matches!(runner.run(vec![], tx).await, Err(NpmjackError::NoTargets)));
    }

    #[tokio::test]
    async fn test_rejected_targets_are_not_dispatched() {
        let runner = Runner::new(Options::default()).unwrap();
        let (mut stream, handle) = runner.start(vec![
            "https://example.com/logo.png".to_string(),
            "ftp://example.com/file".to_string(),
        ]);

        assert!(stream.recv().await.is_none());
        assert_eq!(handle.await.unwrap().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_admit_exposes_frontier() {
        let mut runner = Runner::new(Options::default()).unwrap();
        assert!(runner.admit("https://example.com/app.js").is_ok());
        assert!(matches!(
            runner.admit("HTTPS://EXAMPLE.com/app.js"),
            Err(Rejection::Duplicate(_))
        ));
    }
}
