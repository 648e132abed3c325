//! Impostor selection with anti-repetition fairness.

use std::collections::{HashMap, HashSet};

use impostor_protocol::PlayerId;
use rand::Rng;
use rand::seq::SliceRandom;

/// Consecutive impostor rounds after which a player sits one out.
pub const STREAK_LIMIT: usize = 2;

/// How many impostors a round gets for a given table size.
///
/// 1 below five players, 2 for five or six, 3 from seven on.
pub fn impostor_count(players: usize) -> usize {
    match players {
        0..=4 => 1,
        5..=6 => 2,
        _ => 3,
    }
}

/// Players currently on an impostor streak of at least [`STREAK_LIMIT`].
///
/// Walks `history` from the latest round backwards, counting for each
/// player how many rounds in a row (ending at the latest) they were an
/// impostor. The walk stops at the first round where someone's streak
/// reaches the limit, or where nobody's streak continues.
pub fn blocked_players(history: &[Vec<PlayerId>]) -> HashSet<PlayerId> {
    let mut streaks: HashMap<PlayerId, usize> = HashMap::new();

    for (depth, round) in history.iter().rev().enumerate() {
        let mut extended = false;
        let mut reached = false;

        for id in round {
            let streak = streaks.entry(*id).or_insert(0);
            // Only a streak unbroken since the latest round counts.
            if *streak == depth {
                *streak += 1;
                extended = true;
                reached |= *streak >= STREAK_LIMIT;
            }
        }

        if reached || !extended {
            break;
        }
    }

    streaks
        .into_iter()
        .filter(|(_, streak)| *streak >= STREAK_LIMIT)
        .map(|(id, _)| id)
        .collect()
}

/// Draws `count` distinct impostors from `players`.
///
/// Players on a streak (see [`blocked_players`]) are skipped unless that
/// would leave fewer than `count` candidates, in which case the whole
/// table is eligible again. `count` larger than the pool is clamped.
///
/// Does not touch `history`; the caller records the result.
pub fn select_impostors<R: Rng + ?Sized>(
    players: &[PlayerId],
    count: usize,
    history: &[Vec<PlayerId>],
    rng: &mut R,
) -> Vec<PlayerId> {
    let blocked = blocked_players(history);

    let mut pool: Vec<PlayerId> = players
        .iter()
        .copied()
        .filter(|id| !blocked.contains(id))
        .collect();
    if pool.len() < count {
        pool = players.to_vec();
    }

    pool.shuffle(rng);
    pool.truncate(count);
    pool
}
