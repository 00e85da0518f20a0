use tracing::trace;

/// Something worth telling the user about while a simulation runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    RunStart { total_steps: u64 },
    StepFinished { step: u64 },
    RunFinish,

    CommandSucceeded { step: u64, command: &'static str },
    CommandFailed {
        step: u64,
        command: &'static str,
        reason: String,
    },

    ActivityAttached { label: String, target: String },
    ActivityRemoved { label: String },

    Message(String),
}

pub type EventCallback<'a> = Box<dyn Fn(SimEvent) + Send + Sync + 'a>;

/// Forwards [`SimEvent`]s to an optional callback.
///
/// Only the designated logging rank forwards anything; on every other rank
/// events are traced locally and then dropped.
#[derive(Default)]
pub struct EventReporter<'a> {
    callback: Option<EventCallback<'a>>,
    rank: usize,
    log_rank: usize,
}

impl<'a> EventReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: EventCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
            ..Self::default()
        }
    }

    pub fn on_rank(mut self, rank: usize, log_rank: usize) -> Self {
        self.rank = rank;
        self.log_rank = log_rank;
        self
    }

    pub fn is_logging_rank(&self) -> bool {
        self.rank == self.log_rank
    }

    #[inline]
    pub fn report(&self, event: SimEvent) {
        trace!(rank = self.rank, ?event, "Simulation event");
        if !self.is_logging_rank() {
            return;
        }
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collecting<'a>(sink: Arc<Mutex<Vec<SimEvent>>>) -> EventCallback<'a> {
        Box::new(move |e| sink.lock().unwrap().push(e))
    }

    #[test]
    fn logging_rank_forwards_events() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let reporter = EventReporter::with_callback(collecting(sink.clone())).on_rank(2, 2);
        reporter.report(SimEvent::RunFinish);
        assert_eq!(*sink.lock().unwrap(), vec![SimEvent::RunFinish]);
    }

    #[test]
    fn other_ranks_drop_events() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let reporter = EventReporter::with_callback(collecting(sink.clone())).on_rank(1, 0);
        reporter.report(SimEvent::Message("ignored".into()));
        assert!(sink.lock().unwrap().is_empty());
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        EventReporter::new().report(SimEvent::RunStart { total_steps: 1 });
    }
}
