//! Round scoring.
//!
//! | Role     | Survived | Eliminated |
//! |----------|----------|------------|
//! | Impostor | +2       | −1.5       |
//! | Civilian | +1       | 0          |

/// Points a player earns for a decided round.
pub fn round_points(is_impostor: bool, alive: bool) -> f64 {
    match (is_impostor, alive) {
        (true, true) => 2.0,
        (true, false) => -1.5,
        (false, true) => 1.0,
        (false, false) => 0.0,
    }
}

/// A player's score state. Only mutated through [`ScoreCard::settle`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreCard {
    /// Points pending for the current round.
    round: f64,
    /// What the last settled round added, kept for display.
    last: f64,
    global: f64,
}

impl ScoreCard {
    /// A fresh card that keeps a previous cumulative score.
    pub fn carrying(global: f64) -> Self {
        Self {
            global,
            ..Self::default()
        }
    }

    /// Adds this round's points to the global score and clears the round.
    pub fn settle(&mut self, is_impostor: bool, alive: bool) {
        self.round += round_points(is_impostor, alive);
        self.global += self.round;
        self.last = self.round;
        self.round = 0.0;
    }

    /// Points earned in the last settled round.
    pub fn last_round(&self) -> f64 {
        self.last
    }

    pub fn global(&self) -> f64 {
        self.global
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_points_table() {
        assert_eq!(round_points(true, true), 2.0);
        assert_eq!(round_points(true, false), -1.5);
        assert_eq!(round_points(false, true), 1.0);
        assert_eq!(round_points(false, false), 0.0);
    }

    #[test]
    fn test_settle_accumulates_global_across_rounds() {
        let mut card = ScoreCard::default();

        card.settle(true, true);
        card.settle(true, false);

        assert_eq!(card.global(), 0.5);
        assert_eq!(card.last_round(), -1.5);
    }

    #[test]
    fn test_carrying_keeps_global_and_clears_last_round() {
        let mut card = ScoreCard::default();
        card.settle(false, true);

        let next = ScoreCard::carrying(card.global());

        assert_eq!(next.global(), 1.0);
        assert_eq!(next.last_round(), 0.0);
    }
}
