use super::{execute, CovidSource, Request, Response};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

/// Runs fetches off the UI thread.
///
/// Each request gets its own worker so a slow country lookup never blocks a
/// newer one; responses come back over a channel in completion order and the
/// UI loop drains them once per tick. Ordering by request is the selection
/// controller's job (sequence stamps), not this type's.
pub struct Fetcher {
    source: Arc<dyn CovidSource>,
    tx: Sender<Response>,
    rx: Receiver<Response>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn CovidSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { source, tx, rx }
    }

    /// Start a request in the background
    pub fn dispatch(&self, request: Request) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        debug!(?request, "dispatching fetch");

        let spawned = thread::Builder::new()
            .name("covid-fetch".into())
            .spawn(move || {
                let response = execute(source.as_ref(), request);
                // Receiver only goes away on shutdown
                let _ = tx.send(response);
            });

        if let Err(e) = spawned {
            error!(error = %e, "failed to spawn fetch worker");
        }
    }

    pub fn dispatch_all(&self, requests: impl IntoIterator<Item = Request>) {
        for request in requests {
            self.dispatch(request);
        }
    }

    /// Responses that have completed since the last drain
    pub fn drain(&self) -> impl Iterator<Item = Response> + '_ {
        self.rx.try_iter()
    }

    /// Block for the next response
    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<Response> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, FetchResult};
    use crate::history::Timeline;
    use crate::model::{CountryRecord, Scope};
    use std::time::Duration;

    struct Fixed;

    impl CovidSource for Fixed {
        fn worldwide(&self) -> FetchResult<CountryRecord> {
            Ok(CountryRecord { cases: 42, ..Default::default() })
        }
        fn countries(&self) -> FetchResult<Vec<CountryRecord>> {
            Ok(Vec::new())
        }
        fn country(&self, code: &str) -> FetchResult<CountryRecord> {
            Err(FetchError::Network(format!("no route to {code}")))
        }
        fn historical(&self, _days: u32) -> FetchResult<Timeline> {
            Ok(Timeline::default())
        }
    }

    #[test]
    fn responses_come_back_over_channel() {
        let fetcher = Fetcher::new(Arc::new(Fixed));
        fetcher.dispatch(Request::Totals { seq: 7, scope: Scope::Worldwide });

        match fetcher.recv_timeout(Duration::from_secs(5)) {
            Some(Response::Totals { seq, scope, result }) => {
                assert_eq!(seq, 7);
                assert_eq!(scope, Scope::Worldwide);
                assert_eq!(result.unwrap().cases, 42);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn failures_are_delivered_not_dropped() {
        let fetcher = Fetcher::new(Arc::new(Fixed));
        fetcher.dispatch(Request::Totals { seq: 1, scope: Scope::Country("US".into()) });

        match fetcher.recv_timeout(Duration::from_secs(5)) {
            Some(Response::Totals { result: Err(FetchError::Network(msg)), .. }) => {
                assert!(msg.contains("US"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn drain_is_empty_when_idle() {
        let fetcher = Fetcher::new(Arc::new(Fixed));
        assert_eq!(fetcher.drain().count(), 0);
    }
}
