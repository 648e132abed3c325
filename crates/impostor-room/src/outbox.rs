//! Events produced while handling one intent, addressed per player.

use impostor_protocol::{PlayerId, ServerEvent};

/// One event for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: PlayerId,
    pub event: ServerEvent,
}

/// Collects deliveries in the order they were produced.
///
/// The registry never touches connections; the caller drains the outbox
/// and routes each delivery to the player's connection.
#[derive(Debug, Default)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, to: PlayerId, event: ServerEvent) {
        self.deliveries.push(Delivery { to, event });
    }

    /// Queues a copy of `event` for each recipient.
    pub fn broadcast(&mut self, to: impl IntoIterator<Item = PlayerId>, event: &ServerEvent) {
        for id in to {
            self.send(id, event.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter()
    }

    /// Events queued for `player`, in order.
    pub fn events_for(&self, player: PlayerId) -> impl Iterator<Item = &ServerEvent> {
        self.deliveries
            .iter()
            .filter(move |d| d.to == player)
            .map(|d| &d.event)
    }

    /// Empties the outbox, yielding deliveries in order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Delivery> {
        self.deliveries.drain(..)
    }
}

impl IntoIterator for Outbox {
    type Item = Delivery;
    type IntoIter = std::vec::IntoIter<Delivery>;

    fn into_iter(self) -> Self::IntoIter {
        self.deliveries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby(reason: &str) -> ServerEvent {
        ServerEvent::ForceLobby {
            reason: reason.into(),
        }
    }

    #[test]
    fn test_broadcast_queues_one_copy_per_recipient() {
        let mut outbox = Outbox::new();
        outbox.broadcast([PlayerId(1), PlayerId(2)], &lobby("bye"));

        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.events_for(PlayerId(2)).count(), 1);
        assert_eq!(outbox.events_for(PlayerId(3)).count(), 0);
    }

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let mut outbox = Outbox::new();
        outbox.send(PlayerId(1), lobby("a"));
        outbox.send(PlayerId(1), lobby("b"));

        let drained: Vec<Delivery> = outbox.drain().collect();

        assert_eq!(drained[0].event, lobby("a"));
        assert_eq!(drained[1].event, lobby("b"));
        assert!(outbox.is_empty());
    }
}
