// TodoStore - In-memory TodoMVC store with change-notification fan-out

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod notify;
pub mod resolver;
pub mod server;
pub mod store;
pub mod subscriptions;

// Re-export main types for convenience
pub use config::Config;
pub use error::AppError;
pub use filter::Filter;
pub use models::{Channel, SeedTodo, Todo};
pub use notify::{Broadcaster, Subscription};
pub use resolver::{Operation, OperationResult, resolve};
pub use server::{AppState, router};
pub use store::{SharedStore, TodoStore};
