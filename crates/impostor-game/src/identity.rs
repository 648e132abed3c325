//! Per-round visual identities (icon + color).

use rand::Rng;
use rand::seq::SliceRandom;

pub const ICONS: &[&str] = &[
    "🤫", "😁", "👾", "🧑🏻‍🚀", "👩🏽‍🚀", "👽", "🤖", "😎", "🫥", "🤔", "🤐", "😶‍🌫️", "😶", "🫠",
    "🥸", "🤥", "🫣", "🧐", "👹", "🫢", "🤓", "😈", "👿", "💀", "👻", "👺", "🧞‍♀️", "🧞‍♂️",
    "🧟", "🧌", "👨🏻", "👨🏽", "👩🏽", "👩🏻", "🤴🏻", "👸🏻", "🧑🏻‍🎄", "🕵🏻‍♀️", "🦹🏻", "🦸🏻", "🧙🏻",
    "🧛🏻",
];

pub const COLORS: &[&str] = &[
    "#ff003c", "#3b82f6", "#facc15", "#51890c", "#6d28d9", "#19a5ac", "#ff7b00", "#ff00fb",
    "#00ff40", "#69166b", "#7f1d1d", "#075985", "#a16207", "#065f46", "#4c1d95", "#13697f",
    "#b91c1c", "#1d4ed8", "#ba8d07", "#777777",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub icon: String,
    pub color: String,
}

/// Deals `count` identities, avoiding those already `taken`.
///
/// Icons and colors are drawn from independently shuffled palettes, so
/// every player in a round gets a distinct icon and a distinct color while
/// the palettes last. Past that, entries repeat.
pub fn assign<R: Rng + ?Sized>(count: usize, taken: &[Identity], rng: &mut R) -> Vec<Identity> {
    let icons = shuffled_free(ICONS, |icon| taken.iter().any(|t| t.icon == icon), rng);
    let colors = shuffled_free(COLORS, |color| taken.iter().any(|t| t.color == color), rng);

    (0..count)
        .map(|i| Identity {
            icon: icons[i % icons.len()].to_string(),
            color: colors[i % colors.len()].to_string(),
        })
        .collect()
}

/// The palette minus taken entries, shuffled. Falls back to the full
/// palette when everything is taken.
fn shuffled_free<R: Rng + ?Sized>(
    palette: &[&'static str],
    is_taken: impl Fn(&str) -> bool,
    rng: &mut R,
) -> Vec<&'static str> {
    let mut free: Vec<&'static str> = palette.iter().copied().filter(|e| !is_taken(e)).collect();
    if free.is_empty() {
        free = palette.to_vec();
    }
    free.shuffle(rng);
    free
}
