pub mod controller;
pub mod state;

pub use controller::CountdownController;
pub use state::{CountdownState, DEFAULT_COUNTDOWN_SECONDS};
