//! Per-player projection of a [`GameSession`].

use impostor_protocol::{
    BallotEntry, PendingEntry, Phase, PlayerId, PlayerView, RoomCode, Roster, RosterEntry,
    SelfView,
};

use crate::player::RoundPlayer;
use crate::session::GameSession;

impl GameSession {
    /// What `player` may see of the round.
    ///
    /// Other players' words and hints never appear. Roles stay hidden
    /// until a player is out or the round is decided, and ballots only
    /// show once the tally has closed. Returns `None` if `player` is not
    /// part of the round.
    pub fn view_for(&self, player: PlayerId, room_code: &RoomCode, host: PlayerId) -> Option<PlayerView> {
        let me = self.player(player)?;
        let tally = self.tally();

        let ballots = if tally.is_finished() {
            tally
                .ballots()
                .map(|(voter, ballot)| BallotEntry { voter, ballot })
                .collect()
        } else {
            Vec::new()
        };

        Some(PlayerView {
            room_code: room_code.clone(),
            phase: self.phase(),
            round: self.round(),
            me: self.self_view(me),
            host,
            is_host: player == host,
            starter: self.starter(),
            two_words: self.settings().two_words,
            voting_finished: tally.is_finished(),
            ballots,
            verdict: tally.verdict(),
            winner: self.winner(),
            roster: self.roster(),
        })
    }

    fn self_view(&self, me: &RoundPlayer) -> SelfView {
        SelfView {
            id: me.id(),
            name: me.name().to_string(),
            icon: me.identity().icon.clone(),
            color: me.identity().color.clone(),
            is_impostor: me.is_impostor(),
            word: me.word().map(str::to_string),
            hint: me.hint().map(str::to_string),
            alive: me.is_alive(),
            revealed: me.has_revealed(),
            ready: me.is_ready(),
            voted: self.tally().has_voted(me.id()),
        }
    }

    fn roster(&self) -> Roster {
        if !self.phase().shows_full_roster() {
            return Roster::Pending(
                self.players()
                    .iter()
                    .map(|p| PendingEntry {
                        id: p.id(),
                        name: p.name().to_string(),
                        icon: p.identity().icon.clone(),
                        color: p.identity().color.clone(),
                        ready: p.is_ready(),
                    })
                    .collect(),
            );
        }

        let decided = self.phase() == Phase::Result;
        Roster::Full(
            self.players()
                .iter()
                .map(|p| RosterEntry {
                    id: p.id(),
                    name: p.name().to_string(),
                    icon: p.identity().icon.clone(),
                    color: p.identity().color.clone(),
                    alive: p.is_alive(),
                    voted: self.tally().has_voted(p.id()),
                    score: p.scores().last_round(),
                    global_score: p.scores().global(),
                    is_impostor: (decided || !p.is_alive()).then_some(p.is_impostor()),
                })
                .collect(),
        )
    }
}
