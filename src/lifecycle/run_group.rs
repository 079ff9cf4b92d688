//! Actor run group.
//!
//! Every registered actor is an `execute` future plus an `interrupt`
//! callback. `run` drives all executes concurrently; the first one to
//! finish ends the group: every other actor is interrupted once, in
//! registration order, and `run` returns the first result after all
//! executes have returned.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};

type Execute<E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send>>;
type Interrupt<E> = Box<dyn FnOnce(Option<&E>) + Send>;

struct Actor<E> {
    name: String,
    execute: Execute<E>,
    interrupt: Interrupt<E>,
}

/// An ordered collection of actors sharing one lifetime.
pub struct RunGroup<E> {
    actors: Vec<Actor<E>>,
    drain_timeout: Option<Duration>,
}

impl<E> Default for RunGroup<E> {
    fn default() -> Self {
        Self {
            actors: Vec::new(),
            drain_timeout: None,
        }
    }
}

impl<E> RunGroup<E>
where
    E: fmt::Display + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the wait for the remaining executes once they are interrupted.
    /// Actors still running after `timeout` are aborted. `None` waits forever.
    pub fn with_drain_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Register an actor.
    ///
    /// `interrupt` receives the error that ended the group, if any, and must
    /// make `execute` return. It may run while `execute` is still in flight.
    pub fn add<F, I>(&mut self, name: impl Into<String>, execute: F, interrupt: I)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        I: FnOnce(Option<&E>) + Send + 'static,
    {
        self.actors.push(Actor {
            name: name.into(),
            execute: Box::pin(execute),
            interrupt: Box::new(interrupt),
        });
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Run every actor until the first one returns, then shut the rest down.
    ///
    /// Returns the result of the actor that finished first. A panic inside an
    /// execute is resumed on the caller.
    pub async fn run(self) -> Result<(), E> {
        let Self {
            actors,
            drain_timeout,
        } = self;

        if actors.is_empty() {
            return Ok(());
        }

        let mut tasks = JoinSet::new();
        let mut interrupts = Vec::with_capacity(actors.len());
        for (index, actor) in actors.into_iter().enumerate() {
            let execute = actor.execute;
            tasks.spawn(async move { (index, execute.await) });
            interrupts.push((actor.name, actor.interrupt));
        }

        tracing::debug!(actors = interrupts.len(), "Run group started");

        let (trigger, err0) = loop {
            match tasks.join_next().await {
                Some(Ok(done)) => break done,
                Some(Err(e)) => resume_panic(e),
                None => return Ok(()),
            }
        };

        match &err0 {
            Ok(()) => tracing::info!(actor = %interrupts[trigger].0, "Actor finished, stopping group"),
            Err(e) => tracing::warn!(actor = %interrupts[trigger].0, error = %e, "Actor failed, stopping group"),
        }

        for (index, (name, interrupt)) in interrupts.into_iter().enumerate() {
            if index == trigger {
                continue;
            }
            tracing::debug!(actor = %name, "Interrupting actor");
            interrupt(err0.as_ref().err());
        }

        let drained = match drain_timeout {
            Some(limit) => tokio::time::timeout(limit, drain(&mut tasks)).await.is_ok(),
            None => {
                drain(&mut tasks).await;
                true
            }
        };

        if !drained {
            tracing::warn!(
                remaining = tasks.len(),
                "Actors did not stop within the drain timeout, aborting"
            );
            tasks.shutdown().await;
        }

        tracing::debug!("Run group stopped");
        err0
    }
}

async fn drain<E: Send + 'static>(tasks: &mut JoinSet<(usize, Result<(), E>)>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            resume_panic(e);
        }
    }
}

fn resume_panic(err: JoinError) {
    if err.is_panic() {
        std::panic::resume_unwind(err.into_panic());
    }
    tracing::warn!(error = %err, "Actor task cancelled");
}
