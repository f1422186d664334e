//! Generation tickets used to supersede in-flight work.
//!
//! A [`Supersession`] owns a monotonically increasing generation. Starting new work with
//! [`Supersession::begin`] bumps it, which cancels every [`Ticket`] handed out before: their
//! [`Ticket::run`] futures stop polling the wrapped work (dropping it, so an HTTP request is
//! aborted) and resolve to [`CoreError::Superseded`].

use std::future::Future;

use tokio::sync::watch;

use crate::error::CoreError;

#[derive(Debug)]
pub struct Supersession {
    generation: watch::Sender<u64>,
}

impl Default for Supersession {
    fn default() -> Self {
        Self::new()
    }
}

impl Supersession {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self { generation }
    }

    /// Supersedes all outstanding tickets and returns a fresh one.
    pub fn begin(&self) -> Ticket {
        self.generation.send_modify(|generation| *generation += 1);
        Ticket {
            generation: *self.generation.borrow(),
            current: self.generation.subscribe(),
        }
    }

    /// Supersedes all outstanding tickets without starting new work.
    pub fn cancel_all(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }

    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}

#[derive(Debug)]
pub struct Ticket {
    generation: u64,
    current: watch::Receiver<u64>,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        *self.current.borrow() == self.generation
    }

    /// Resolves once newer work has started.
    pub async fn superseded(&mut self) {
        let generation = self.generation;
        if self
            .current
            .wait_for(|current| *current != generation)
            .await
            .is_err()
        {
            // The owner is gone; nothing can supersede us any more.
            std::future::pending::<()>().await;
        }
    }

    /// Drives `work` unless this ticket gets superseded first.
    pub async fn run<F>(&mut self, work: F) -> Result<F::Output, CoreError>
    where
        F: Future,
    {
        if !self.is_current() {
            return Err(CoreError::Superseded);
        }
        tokio::select! {
            biased;
            _ = self.superseded() => Err(CoreError::Superseded),
            output = work => Ok(output),
        }
    }
}
