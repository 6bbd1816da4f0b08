pub mod bootstrap;
pub mod config;
pub mod lookup;
pub mod review;
pub mod seed;
pub mod store;

mod context;
mod error;
mod handlers;

pub use context::{AppContext, ReviewTable};
pub use error::{lambda_error, AppError, BootstrapError, StoreError};
pub use handlers::handle_request;
