//! Ordered behaviors wrapping every handler invocation.
//!
//! A [`Pipeline`] is built once per command type as a fixed chain:
//!
//! ```text
//! Pipeline ─► ValidationBehavior ─► UnitOfWorkBehavior ─► CommandHandler
//! ```
//!
//! Validation runs to completion before the unit of work begins, so an
//! invalid command never opens a transaction. Collaborator checks also run
//! before `begin`, and queued emails go out only after `commit`.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use common::CorrelationId;
use storage::{CancellationToken, Storage, UnitOfWork};

use crate::command::Command;
use crate::error::{ApplicationError, Result};
use crate::outbox::Outbox;
use crate::services::EmailService;
use crate::validation::{ValidationErrors, Validator};

/// Anything that can execute command `C` end to end.
#[async_trait]
pub trait RequestHandler<C: Command>: Send + Sync {
    async fn execute(&self, command: C, cancel: &CancellationToken) -> Result<C::Output>;
}

/// Business logic for command `C`, run inside an active unit of work.
///
/// Handlers read and write through the repositories the unit of work hands
/// out and never begin, commit or roll back themselves. Anything they need
/// from an external collaborator is asked in [`check`](Self::check), before
/// the transaction opens, and notifications are queued on the [`Outbox`].
#[async_trait]
pub trait CommandHandler<C: Command, S: Storage>: Send + Sync {
    /// What [`check`](Self::check) learned, passed on to [`handle`](Self::handle).
    type Checked: Default + Send + 'static;

    /// Read-only collaborator lookups made before `begin`.
    async fn check(&self, _command: &C, _cancel: &CancellationToken) -> Result<Self::Checked> {
        Ok(Self::Checked::default())
    }

    async fn handle(
        &self,
        uow: &mut UnitOfWork<S>,
        command: C,
        checked: Self::Checked,
        outbox: &mut Outbox,
        cancel: &CancellationToken,
    ) -> Result<C::Output>;
}

/// Wraps a handler in `begin` / `commit` / `rollback`.
///
/// Commits when the handler succeeds, then delivers the handler's outbox.
/// When the handler fails, rolls back, drops the outbox and returns the
/// handler's error unchanged.
pub struct UnitOfWorkBehavior<S, H> {
    storage: S,
    notifier: Arc<dyn EmailService>,
    handler: H,
}

impl<S, H> UnitOfWorkBehavior<S, H> {
    pub fn new(storage: S, notifier: Arc<dyn EmailService>, handler: H) -> Self {
        Self {
            storage,
            notifier,
            handler,
        }
    }

    /// Sends every queued email. The transaction is already committed, so a
    /// failed send is logged and counted but does not fail the command.
    async fn deliver(&self, command: &'static str, outbox: Outbox) {
        for email in outbox {
            if let Err(e) = self
                .notifier
                .send(&email.to, &email.subject, &email.body)
                .await
            {
                metrics::counter!("pipeline_notification_failures_total", "command" => command)
                    .increment(1);
                tracing::error!(error = %e, to = %email.to, "notification after commit failed");
            }
        }
    }
}

#[async_trait]
impl<C, S, H> RequestHandler<C> for UnitOfWorkBehavior<S, H>
where
    C: Command,
    S: Storage,
    H: CommandHandler<C, S>,
{
    async fn execute(&self, command: C, cancel: &CancellationToken) -> Result<C::Output> {
        let checked = self.handler.check(&command, cancel).await?;

        let mut uow = UnitOfWork::new(self.storage.clone());
        uow.begin(cancel).await?;

        let mut outbox = Outbox::new();
        match self
            .handler
            .handle(&mut uow, command, checked, &mut outbox, cancel)
            .await
        {
            Ok(output) => {
                uow.commit(cancel).await?;
                self.deliver(C::NAME, outbox).await;
                Ok(output)
            }
            Err(e) => {
                if let Err(rollback_error) = uow.rollback().await {
                    tracing::error!(error = %rollback_error, "rollback after handler failure failed");
                }
                Err(e)
            }
        }
    }
}

/// Runs every registered validator before handing the command on.
///
/// All validators run, so the caller sees every violation at once.
pub struct ValidationBehavior<C, N> {
    validators: Vec<Box<dyn Validator<C>>>,
    next: N,
}

impl<C, N> ValidationBehavior<C, N> {
    pub fn new(validators: Vec<Box<dyn Validator<C>>>, next: N) -> Self {
        Self { validators, next }
    }
}

#[async_trait]
impl<C, N> RequestHandler<C> for ValidationBehavior<C, N>
where
    C: Command,
    N: RequestHandler<C>,
{
    async fn execute(&self, command: C, cancel: &CancellationToken) -> Result<C::Output> {
        let mut errors = ValidationErrors::default();
        for validator in &self.validators {
            errors.extend(validator.validate(&command));
        }

        if !errors.is_empty() {
            metrics::counter!("pipeline_validation_failures_total", "command" => C::NAME)
                .increment(1);
            tracing::warn!(failures = %errors, "command failed validation");
            return Err(ApplicationError::Validation(errors));
        }

        self.next.execute(command, cancel).await
    }
}

/// Entry point for one command type.
pub struct Pipeline<C: Command> {
    chain: Box<dyn RequestHandler<C>>,
}

impl<C: Command> Pipeline<C> {
    /// Starts building the pipeline around `handler`. Emails the handler
    /// queues are delivered through `notifier`.
    pub fn builder<S, H>(
        storage: S,
        notifier: Arc<dyn EmailService>,
        handler: H,
    ) -> PipelineBuilder<C, S, H>
    where
        S: Storage,
        H: CommandHandler<C, S> + 'static,
    {
        PipelineBuilder {
            storage,
            notifier,
            handler,
            validators: Vec::new(),
        }
    }

    /// Executes `command` through validation and a unit of work.
    #[tracing::instrument(
        name = "pipeline",
        skip_all,
        fields(command = C::NAME, correlation_id = %CorrelationId::new())
    )]
    pub async fn execute(&self, command: C, cancel: &CancellationToken) -> Result<C::Output> {
        metrics::counter!("pipeline_commands_total", "command" => C::NAME).increment(1);
        let started = Instant::now();

        let result = self.chain.execute(command, cancel).await;

        metrics::histogram!("pipeline_command_duration_seconds", "command" => C::NAME)
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(_) => tracing::info!("command completed"),
            Err(e) => tracing::warn!(error = %e, kind = ?e.kind(), "command failed"),
        }
        result
    }
}

#[async_trait]
impl<C: Command> RequestHandler<C> for Pipeline<C> {
    async fn execute(&self, command: C, cancel: &CancellationToken) -> Result<C::Output> {
        Pipeline::execute(self, command, cancel).await
    }
}

/// Builder returned by [`Pipeline::builder`].
pub struct PipelineBuilder<C, S, H> {
    storage: S,
    notifier: Arc<dyn EmailService>,
    handler: H,
    validators: Vec<Box<dyn Validator<C>>>,
}

impl<C, S, H> PipelineBuilder<C, S, H>
where
    C: Command,
    S: Storage,
    H: CommandHandler<C, S> + 'static,
{
    /// Registers a validator; validators run in registration order.
    pub fn validator(mut self, validator: impl Validator<C> + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn build(self) -> Pipeline<C> {
        let unit_of_work = UnitOfWorkBehavior::new(self.storage, self.notifier, self.handler);
        let validation = ValidationBehavior::new(self.validators, unit_of_work);
        Pipeline {
            chain: Box::new(validation),
        }
    }
}
