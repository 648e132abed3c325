//! Picks who opens the discussion.

use impostor_protocol::PlayerId;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::GameError;

/// Uniformly draws a starter from `players` (`(id, is_impostor)` pairs).
///
/// With `allow_impostor == false` impostors are not eligible. An empty
/// eligible set is an error; there is no silent fallback.
pub fn pick_starter<R: Rng + ?Sized>(
    players: &[(PlayerId, bool)],
    allow_impostor: bool,
    rng: &mut R,
) -> Result<PlayerId, GameError> {
    let eligible: Vec<PlayerId> = players
        .iter()
        .filter(|(_, is_impostor)| allow_impostor || !is_impostor)
        .map(|(id, _)| *id)
        .collect();

    eligible
        .choose(rng)
        .copied()
        .ok_or(GameError::NoEligibleStarter)
}
