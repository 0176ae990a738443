// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staged handler pipeline with explicit continuations.
//!
//! Each [`Stage`] is an ordered list of handlers. A handler receives the
//! mutable [`EventContext`] and a [`Next`] continuation holding the rest of
//! the stage; it either awaits `next.run(ctx)` to continue or returns
//! without doing so to end the current stage. Stage boundaries reset the
//! short-circuit: a claim in the State stage does not skip the Message
//! stage.
//!
//! The runner does not catch panics. Handler errors propagate to the HTTP
//! shell, which logs them and still acknowledges the event.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::FerrybotError;
use crate::event::EventContext;

/// A single pipeline handler.
///
/// The processed-flag convention is enforced by handlers, not the runner: a
/// claiming handler calls [`EventContext::claim`] and returns without
/// invoking the continuation; other message handlers skip their own work and
/// go straight to `next` when the context is already claimed.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Stable handler name recorded in `processed_by`.
    fn name(&self) -> &'static str;

    /// Process the event, deciding whether the rest of the stage runs.
    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError>;
}

/// Continuation over the remaining handlers of the current stage.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Handler>],
}

impl Next<'_> {
    /// Run the remaining handlers; a no-op at the end of the stage.
    pub async fn run(self, ctx: &mut EventContext) -> Result<(), FerrybotError> {
        match self.rest.split_first() {
            Some((head, rest)) => head.handle(ctx, Next { rest }).await,
            None => Ok(()),
        }
    }
}

/// An ordered, named list of handlers.
pub struct Stage {
    name: &'static str,
    handlers: Vec<Arc<dyn Handler>>,
}

impl Stage {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Append a handler to the end of the stage.
    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Run the stage's handler chain over the context.
    pub async fn run(&self, ctx: &mut EventContext) -> Result<(), FerrybotError> {
        Next {
            rest: &self.handlers,
        }
        .run(ctx)
        .await
    }
}

/// Executes the configured stages in order over one context.
pub struct PipelineRunner {
    stages: Vec<Stage>,
}

impl PipelineRunner {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Run every stage against the context.
    ///
    /// A handler ending one stage never skips the following stages.
    pub async fn run(&self, ctx: &mut EventContext) -> Result<(), FerrybotError> {
        for stage in &self.stages {
            debug!(stage = stage.name(), kind = %ctx.message_kind, "running stage");
            stage.run(ctx).await?;
        }
        Ok(())
    }
}
