pub mod commands;
pub mod controller;
pub mod state;
pub mod view;

pub use controller::Session;
pub use view::{ErrorKind, StatusView};
