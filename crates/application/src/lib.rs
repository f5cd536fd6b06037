//! Command processing for the merch request service.
//!
//! Every command runs through the same [`Pipeline`]: its validators first,
//! then a [`UnitOfWorkBehavior`] that consults external collaborators,
//! opens a transaction, invokes the [`CommandHandler`] and commits on success
//! or rolls back on error. Emails queued on the [`Outbox`] are sent only after
//! a successful commit.
//!
//! Commands:
//! - [`IssueMerch`]: raise a request, issuing immediately when in stock
//! - [`ProcessSupplyArrived`]: complete requests waiting for a supply
//! - [`CancelMerchRequest`]: cancel a pending request
//! - [`GetIssuedMerchPacks`]: list the packs an employee has received

pub mod command;
pub mod error;
pub mod handlers;
pub mod outbox;
pub mod pipeline;
pub mod service;
pub mod services;
pub mod validation;

pub use command::Command;
pub use error::{ApplicationError, Result};
pub use handlers::{
    CancelMerchRequest, CancelMerchRequestHandler, CancelMerchRequestValidator,
    GetIssuedMerchPacks, GetIssuedMerchPacksHandler, GetIssuedMerchPacksValidator, IssueMerch,
    IssueMerchHandler, IssueMerchValidator, IssuedMerchPack, ProcessSupplyArrived,
    ProcessSupplyArrivedHandler, ProcessSupplyArrivedValidator,
};
pub use outbox::{OutgoingEmail, Outbox};
pub use pipeline::{
    CommandHandler, Pipeline, PipelineBuilder, RequestHandler, UnitOfWorkBehavior,
    ValidationBehavior,
};
pub use service::MerchService;
pub use services::{
    EmailService, InMemoryEmailService, InMemoryStockService, SentEmail, StockService,
};
pub use validation::{Rules, ValidationErrors, ValidationFailure, Validator};
