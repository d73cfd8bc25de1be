// src/ready.rs

use std::{
    any::type_name,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, error};

use crate::error::DuplicateSingleton;

type ReadyAction<T> = Box<dyn FnOnce(&Arc<T>) + Send + 'static>;

struct ReadyState<T> {
    instance: Option<Arc<T>>,
    pending: Vec<ReadyAction<T>>,
}

/// One-shot "this singleton exists now" gate with a queue of deferred actions.
pub struct ReadySignal<T> {
    state: Mutex<ReadyState<T>>,
}

impl<T> Default for ReadySignal<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(ReadyState {
                instance: None,
                pending: Vec::new(),
            }),
        }
    }
}

impl<T> ReadySignal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` now if ready, otherwise once [`mark_ready`](Self::mark_ready) is called.
    pub fn when_ready<F>(&self, action: F)
    where
        F: FnOnce(&Arc<T>) + Send + 'static,
    {
        let mut state = self.lock();
        match state.instance.clone() {
            Some(instance) => {
                drop(state);
                action(&instance);
            }
            None => state.pending.push(Box::new(action)),
        }
    }

    /// Publish `instance` and drain queued actions in the order they were queued.
    ///
    /// A second call keeps the first instance and reports the duplicate.
    pub fn mark_ready(&self, instance: Arc<T>) -> Result<(), DuplicateSingleton> {
        let pending = {
            let mut state = self.lock();
            if state.instance.is_some() {
                let err = DuplicateSingleton {
                    type_name: type_name::<T>(),
                };
                error!("{}", err);
                return Err(err);
            }
            state.instance = Some(Arc::clone(&instance));
            std::mem::take(&mut state.pending)
        };

        debug!(ty = type_name::<T>(), queued = pending.len(), "ready");
        for action in pending {
            action(&instance);
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.lock().instance.is_some()
    }

    pub fn instance(&self) -> Option<Arc<T>> {
        self.lock().instance.clone()
    }

    /// Back to not-ready with no instance. Actions still queued stay queued.
    pub fn reset(&self) {
        self.lock().instance = None;
    }

    fn lock(&self) -> MutexGuard<'_, ReadyState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for ReadySignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ReadySignal")
            .field("type", &type_name::<T>())
            .field("ready", &state.instance.is_some())
            .field("pending", &state.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Service(&'static str);

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> ReadyAction<Service>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |tag: &str| -> ReadyAction<Service> {
            let sink = Arc::clone(&sink);
            let tag = tag.to_string();
            Box::new(move |s: &Arc<Service>| {
                sink.lock().unwrap().push(format!("{}:{}", tag, s.0));
            })
        };
        (log, make)
    }

    #[test]
    fn queued_actions_run_in_order_on_ready() {
        let signal = ReadySignal::<Service>::new();
        let (log, action) = recorder();

        signal.when_ready(action("a"));
        signal.when_ready(action("b"));
        assert!(log.lock().unwrap().is_empty());
        assert!(!signal.is_ready());

        signal.mark_ready(Arc::new(Service("first"))).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a:first", "b:first"]);

        // already ready: runs inline
        signal.when_ready(action("c"));
        assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("c:first"));
    }

    #[test]
    fn duplicate_mark_ready_keeps_original() {
        let signal = ReadySignal::<Service>::new();
        signal.mark_ready(Arc::new(Service("first"))).unwrap();

        let err = signal.mark_ready(Arc::new(Service("second"))).unwrap_err();
        assert!(err.type_name.ends_with("Service"));
        assert_eq!(signal.instance().as_deref(), Some(&Service("first")));
    }

    #[test]
    fn reset_clears_instance_and_allows_reinit() {
        let signal = ReadySignal::<Service>::new();
        signal.mark_ready(Arc::new(Service("first"))).unwrap();
        signal.reset();
        assert!(!signal.is_ready());
        assert!(signal.instance().is_none());

        let (log, action) = recorder();
        signal.when_ready(action("late"));
        signal.mark_ready(Arc::new(Service("second"))).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["late:second"]);
    }

    #[test]
    fn action_may_queue_more_work() {
        let signal = Arc::new(ReadySignal::<Service>::new());
        let (log, action) = recorder();
        let follow_up = action("nested");

        let inner = Arc::clone(&signal);
        signal.when_ready(move |_| inner.when_ready(follow_up));
        signal.mark_ready(Arc::new(Service("s"))).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["nested:s"]);
    }
}
