//! Vote tallying: one ballot per living player, plurality with ties.

use std::collections::{BTreeMap, HashMap};

use impostor_protocol::{Ballot, NoEliminationReason, PlayerId, Verdict};

/// What happened to a cast ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    /// Stored; the tally is still waiting for other voters.
    Recorded,
    /// Stored, and it was the last missing ballot.
    Completed(Verdict),
    /// Dropped without effect (tally closed, or the voter cannot vote).
    Ignored,
}

/// Ballots for the current voting phase.
///
/// Ballots are keyed by voter, so re-voting overwrites. Once every living
/// player has a ballot the tally closes and resolves; later ballots are
/// ignored until [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct VoteTally {
    ballots: BTreeMap<PlayerId, Ballot>,
    verdict: Option<Verdict>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `voter`'s ballot and closes the tally if `alive` are now
    /// all accounted for.
    pub fn cast(&mut self, voter: PlayerId, ballot: Ballot, alive: &[PlayerId]) -> CastOutcome {
        if self.is_finished() || !alive.contains(&voter) {
            return CastOutcome::Ignored;
        }
        self.ballots.insert(voter, ballot);

        match self.check_completion(alive) {
            Some(verdict) => CastOutcome::Completed(verdict),
            None => CastOutcome::Recorded,
        }
    }

    /// Closes the tally if every player in `alive` has voted.
    ///
    /// Used after casting and after a voter leaves. Returns the verdict only
    /// on the call that closes the tally.
    pub fn check_completion(&mut self, alive: &[PlayerId]) -> Option<Verdict> {
        if self.is_finished() {
            return None;
        }
        if !alive.iter().all(|id| self.ballots.contains_key(id)) {
            return None;
        }
        let verdict = self.resolve();
        self.verdict = Some(verdict);
        Some(verdict)
    }

    /// Plurality over non-abstaining ballots.
    ///
    /// A unique strict maximum is eliminated; a shared maximum or no
    /// accusations at all eliminates nobody.
    pub fn resolve(&self) -> Verdict {
        let mut counts: HashMap<PlayerId, u32> = HashMap::new();
        for target in self.ballots.values().filter_map(|b| b.target()) {
            *counts.entry(target).or_insert(0) += 1;
        }

        let Some(max) = counts.values().copied().max() else {
            return Verdict::NoElimination {
                reason: NoEliminationReason::NoVotes,
            };
        };

        let mut leaders = counts.iter().filter(|(_, n)| **n == max).map(|(id, _)| *id);
        match (leaders.next(), leaders.next()) {
            (Some(player), None) => Verdict::Eliminate { player },
            _ => Verdict::NoElimination {
                reason: NoEliminationReason::Tie,
            },
        }
    }

    /// Handles a voter leaving mid-vote: their own ballot is dropped and
    /// ballots naming them become abstentions.
    pub fn forget(&mut self, player: PlayerId) {
        self.ballots.remove(&player);
        for ballot in self.ballots.values_mut() {
            if ballot.target() == Some(player) {
                *ballot = Ballot::Abstain;
            }
        }
    }

    /// Clears ballots and reopens the tally.
    pub fn reset(&mut self) {
        self.ballots.clear();
        self.verdict = None;
    }

    pub fn is_finished(&self) -> bool {
        self.verdict.is_some()
    }

    /// The closed tally's verdict.
    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    pub fn has_voted(&self, player: PlayerId) -> bool {
        self.ballots.contains_key(&player)
    }

    /// Ballots in voter order.
    pub fn ballots(&self) -> impl Iterator<Item = (PlayerId, Ballot)> + '_ {
        self.ballots.iter().map(|(voter, ballot)| (*voter, *ballot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn suspect(id: u64) -> Ballot {
        Ballot::Suspect(p(id))
    }

    #[test]
    fn test_cast_completes_when_every_living_player_voted() {
        let alive = [p(1), p(2), p(3)];
        let mut tally = VoteTally::new();

        assert_eq!(tally.cast(p(1), suspect(3), &alive), CastOutcome::Recorded);
        assert_eq!(tally.cast(p(2), suspect(3), &alive), CastOutcome::Recorded);
        assert_eq!(
            tally.cast(p(3), suspect(1), &alive),
            CastOutcome::Completed(Verdict::Eliminate { player: p(3) })
        );
        assert!(tally.is_finished());
    }

    #[test]
    fn test_cast_revote_overwrites_previous_choice() {
        let alive = [p(1), p(2), p(3)];
        let mut tally = VoteTally::new();

        tally.cast(p(1), suspect(2), &alive);
        tally.cast(p(1), suspect(3), &alive);
        assert_eq!(tally.ballots().count(), 1);

        tally.cast(p(2), suspect(3), &alive);
        let outcome = tally.cast(p(3), suspect(2), &alive);

        assert_eq!(outcome, CastOutcome::Completed(Verdict::Eliminate { player: p(3) }));
    }

    #[test]
    fn test_cast_after_tally_closed_is_ignored() {
        let alive = [p(1), p(2)];
        let mut tally = VoteTally::new();
        tally.cast(p(1), suspect(2), &alive);
        tally.cast(p(2), suspect(1), &alive);

        assert_eq!(tally.cast(p(1), suspect(1), &alive), CastOutcome::Ignored);
        assert_eq!(tally.ballots().find(|(v, _)| *v == p(1)).map(|(_, b)| b), Some(suspect(2)));
    }

    #[test]
    fn test_cast_from_dead_player_is_ignored() {
        let alive = [p(1), p(2)];
        let mut tally = VoteTally::new();

        assert_eq!(tally.cast(p(9), suspect(1), &alive), CastOutcome::Ignored);
        assert!(!tally.has_voted(p(9)));
    }

    #[test]
    fn test_resolve_tie_eliminates_nobody() {
        let alive = [p(1), p(2), p(3), p(4)];
        let mut tally = VoteTally::new();
        tally.cast(p(1), suspect(2), &alive);
        tally.cast(p(2), suspect(1), &alive);
        tally.cast(p(3), suspect(1), &alive);
        let outcome = tally.cast(p(4), suspect(2), &alive);

        assert_eq!(
            outcome,
            CastOutcome::Completed(Verdict::NoElimination {
                reason: NoEliminationReason::Tie
            })
        );
    }

    #[test]
    fn test_resolve_all_abstain_eliminates_nobody() {
        let alive = [p(1), p(2)];
        let mut tally = VoteTally::new();
        tally.cast(p(1), Ballot::Abstain, &alive);
        let outcome = tally.cast(p(2), Ballot::Abstain, &alive);

        assert_eq!(
            outcome,
            CastOutcome::Completed(Verdict::NoElimination {
                reason: NoEliminationReason::NoVotes
            })
        );
    }

    #[test]
    fn test_resolve_abstentions_do_not_count_toward_plurality() {
        let alive = [p(1), p(2), p(3)];
        let mut tally = VoteTally::new();
        tally.cast(p(1), Ballot::Abstain, &alive);
        tally.cast(p(2), Ballot::Abstain, &alive);
        let outcome = tally.cast(p(3), suspect(1), &alive);

        assert_eq!(outcome, CastOutcome::Completed(Verdict::Eliminate { player: p(1) }));
    }

    #[test]
    fn test_forget_turns_ballots_against_leaver_into_abstentions() {
        let alive = [p(1), p(2), p(3)];
        let mut tally = VoteTally::new();
        tally.cast(p(1), suspect(3), &alive);
        tally.cast(p(3), suspect(1), &alive);

        tally.forget(p(3));

        assert!(!tally.has_voted(p(3)));
        assert_eq!(tally.ballots().collect::<Vec<_>>(), vec![(p(1), Ballot::Abstain)]);
        // 2 is the only one still missing.
        assert_eq!(tally.check_completion(&[p(1), p(2)]), None);
    }

    #[test]
    fn test_check_completion_after_leaver_closes_tally() {
        let alive = [p(1), p(2), p(3)];
        let mut tally = VoteTally::new();
        tally.cast(p(1), suspect(2), &alive);
        tally.cast(p(2), suspect(1), &alive);

        tally.forget(p(3));
        let verdict = tally.check_completion(&[p(1), p(2)]);

        assert_eq!(
            verdict,
            Some(Verdict::NoElimination {
                reason: NoEliminationReason::Tie
            })
        );
    }

    #[test]
    fn test_reset_reopens_tally() {
        let alive = [p(1)];
        let mut tally = VoteTally::new();
        tally.cast(p(1), Ballot::Abstain, &alive);
        assert!(tally.is_finished());

        tally.reset();

        assert!(!tally.is_finished());
        assert_eq!(tally.ballots().count(), 0);
        assert_eq!(tally.verdict(), None);
    }
}
