pub mod engine;

pub use engine::{
    computer_choice, FinalOutcome, GameState, Move, RoundOutcome, RoundRecord, Score,
};
