pub mod actions;
pub mod error;
pub mod folders;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use error::ApiError;
pub use routes::create_router;
