//! External collaborator traits and in-memory implementations.

pub mod email;
pub mod stock;

pub use email::{EmailService, InMemoryEmailService, SentEmail};
pub use stock::{InMemoryStockService, StockService};
