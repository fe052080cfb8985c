pub mod api;
pub mod car;
pub mod cli;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod queue;
pub mod server;

pub use car::{Car, Direction, Floor, Status};
pub use controller::{Controller, FnHooks, Move, StopHooks};
pub use error::{Error, Result};
pub use queue::{Request, RequestQueue};
