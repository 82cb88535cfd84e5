use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ROUNDS: u32 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Parse a classifier label; anything other than the three moves is ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "rock" => Some(Move::Rock),
            "paper" => Some(Move::Paper),
            "scissors" => Some(Move::Scissors),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }

    /// The move this one defeats.
    pub fn beats(&self) -> Move {
        match self {
            Move::Rock => Move::Scissors,
            Move::Scissors => Move::Paper,
            Move::Paper => Move::Rock,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RoundOutcome {
    Player,
    Computer,
    Tie,
}

/// Winner of a finished game, decided on cumulative score.
pub type FinalOutcome = RoundOutcome;

pub fn computer_choice<R: Rng + ?Sized>(rng: &mut R) -> Move {
    Move::ALL[rng.gen_range(0..Move::ALL.len())]
}

pub fn resolve_round(player: Move, computer: Move) -> RoundOutcome {
    if player == computer {
        RoundOutcome::Tie
    } else if player.beats() == computer {
        RoundOutcome::Player
    } else {
        RoundOutcome::Computer
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub player: u32,
    pub computer: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    pub round: u32,
    pub player_move: Move,
    pub confidence: f32,
    pub computer_move: Move,
    pub outcome: RoundOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub round: u32,
    pub max_rounds: u32,
    pub score: Score,
    /// Blocks another resolution until the cooldown clears it
    pub player_made_move: bool,
    pub game_over: bool,
    pub last_round: Option<RoundRecord>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROUNDS)
    }
}

impl GameState {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            round: 0,
            max_rounds: max_rounds.max(1),
            score: Score::default(),
            player_made_move: false,
            game_over: false,
            last_round: None,
        }
    }

    /// Whether a detected move would be resolved right now.
    pub fn accepts_move(&self) -> bool {
        !self.player_made_move && !self.game_over
    }

    /// Resolve one round. Returns `None` while a move is pending or the game
    /// has ended.
    pub fn play_round(
        &mut self,
        player: Move,
        confidence: f32,
        computer: Move,
    ) -> Option<RoundRecord> {
        if !self.accepts_move() {
            return None;
        }

        self.player_made_move = true;
        let outcome = resolve_round(player, computer);
        match outcome {
            RoundOutcome::Player => self.score.player += 1,
            RoundOutcome::Computer => self.score.computer += 1,
            RoundOutcome::Tie => {}
        }

        self.round += 1;
        if self.round >= self.max_rounds {
            self.game_over = true;
        }

        let record = RoundRecord {
            round: self.round,
            player_move: player,
            confidence,
            computer_move: computer,
            outcome,
        };
        self.last_round = Some(record.clone());
        Some(record)
    }

    /// Re-open the game for the next gesture once the cooldown elapsed.
    pub fn ready_for_next_move(&mut self) {
        if !self.game_over {
            self.player_made_move = false;
        }
    }

    pub fn final_outcome(&self) -> Option<FinalOutcome> {
        if !self.game_over {
            return None;
        }
        Some(match self.score.player.cmp(&self.score.computer) {
            std::cmp::Ordering::Greater => RoundOutcome::Player,
            std::cmp::Ordering::Less => RoundOutcome::Computer,
            std::cmp::Ordering::Equal => RoundOutcome::Tie,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.max_rounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn resolve_round_follows_the_cycle() {
        for player in Move::ALL {
            for computer in Move::ALL {
                let outcome = resolve_round(player, computer);
                let mirrored = resolve_round(computer, player);
                if player == computer {
                    assert_eq!(outcome, RoundOutcome::Tie);
                } else {
                    assert_ne!(outcome, RoundOutcome::Tie);
                    // swapping the sides swaps the winner
                    assert_ne!(outcome, mirrored);
                }
            }
        }

        assert_eq!(resolve_round(Move::Rock, Move::Scissors), RoundOutcome::Player);
        assert_eq!(resolve_round(Move::Scissors, Move::Paper), RoundOutcome::Player);
        assert_eq!(resolve_round(Move::Paper, Move::Rock), RoundOutcome::Player);
        assert_eq!(resolve_round(Move::Scissors, Move::Rock), RoundOutcome::Computer);
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(Move::from_label("Rock"), Some(Move::Rock));
        assert_eq!(Move::from_label(" scissors "), Some(Move::Scissors));
        assert_eq!(Move::from_label("A"), None);
    }

    #[test]
    fn computer_choice_covers_every_move() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            seen.insert(computer_choice(&mut rng));
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn pending_move_blocks_resolution() {
        let mut game = GameState::default();
        assert!(game.play_round(Move::Rock, 0.9, Move::Scissors).is_some());
        assert!(game.play_round(Move::Paper, 0.9, Move::Rock).is_none());
        assert_eq!(game.round, 1);

        game.ready_for_next_move();
        assert!(game.play_round(Move::Paper, 0.9, Move::Rock).is_some());
        assert_eq!(game.round, 2);
        assert_eq!(game.score.player, 2);
    }

    #[test]
    fn game_ends_after_max_rounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut game = GameState::default();
        while !game.game_over {
            let computer = computer_choice(&mut rng);
            game.play_round(Move::Rock, 1.0, computer);
            game.ready_for_next_move();
        }

        assert_eq!(game.round, game.max_rounds);
        assert!(game.score.player + game.score.computer <= game.max_rounds);
        assert!(game.play_round(Move::Rock, 1.0, Move::Scissors).is_none());
        assert!(game.player_made_move);
        assert!(game.final_outcome().is_some());
    }

    #[test]
    fn final_outcome_compares_scores() {
        let mut game = GameState::new(2);
        assert_eq!(game.final_outcome(), None);
        game.play_round(Move::Rock, 1.0, Move::Scissors);
        game.ready_for_next_move();
        game.play_round(Move::Rock, 1.0, Move::Paper);
        assert_eq!(game.final_outcome(), Some(RoundOutcome::Tie));
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut game = GameState::default();
        game.play_round(Move::Rock, 0.5, Move::Paper);
        game.ready_for_next_move();
        game.play_round(Move::Rock, 0.5, Move::Scissors);

        game.reset();
        assert_eq!(game, GameState::default());
    }
}
