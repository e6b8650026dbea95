//! Players - Energy ledgers, owned upgrades and relationships

use crate::energy::Energy;
use crate::types::{Frame, PlayerIndex, Relationship, FOREVER};
use crate::upgrade::UpgradeMask;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub index: PlayerIndex,
    pub name: String,
    pub energy: Energy,
    /// Player-wide upgrades bought so far
    pub upgrades: UpgradeMask,
}

/// A change in a player's brownout state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrownoutEdge {
    pub player: PlayerIndex,
    pub brownout: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Players {
    players: Vec<Player>,
    /// Directional overrides; unlisted pairs of different players are enemies
    relationships: BTreeMap<(PlayerIndex, PlayerIndex), Relationship>,
}

impl Players {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str) -> PlayerIndex {
        let index = PlayerIndex(self.players.len());
        self.players.push(Player {
            index,
            name: name.to_string(),
            energy: Energy::new(),
            upgrades: UpgradeMask::EMPTY,
        });
        index
    }

    pub fn get(&self, index: PlayerIndex) -> Option<&Player> {
        self.players.get(index.0)
    }

    pub fn get_mut(&mut self, index: PlayerIndex) -> Option<&mut Player> {
        self.players.get_mut(index.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn set_relationship(
        &mut self,
        from: PlayerIndex,
        to: PlayerIndex,
        relationship: Relationship,
    ) {
        self.relationships.insert((from, to), relationship);
    }

    /// How `from` regards `to`; unowned objects are neutral to everyone
    pub fn relationship(&self, from: Option<PlayerIndex>, to: Option<PlayerIndex>) -> Relationship {
        match (from, to) {
            (Some(a), Some(b)) if a == b => Relationship::Allies,
            (Some(a), Some(b)) => self
                .relationships
                .get(&(a, b))
                .copied()
                .unwrap_or(Relationship::Enemies),
            _ => Relationship::Neutral,
        }
    }

    /// Recompute transfers if any ledger asks for it, then report brownout edges
    pub fn refresh_energy(&mut self, frame: Frame) -> Vec<BrownoutEdge> {
        if self.players.iter().any(|p| p.energy.needs_recheck(frame)) {
            self.recompute_transfers(frame);
        }

        let mut edges = Vec::new();
        for player in &mut self.players {
            let brownout = !player.energy.has_sufficient_power(frame);
            if brownout != player.energy.is_brownout() {
                player.energy.set_brownout(brownout);
                tracing::debug!(player = player.index.0, brownout, "brownout changed");
                edges.push(BrownoutEdge {
                    player: player.index,
                    brownout,
                });
            }
        }
        edges
    }

    fn recompute_transfers(&mut self, frame: Frame) {
        let count = self.players.len();
        let mut received = vec![0; count];
        let mut given = vec![0; count];
        let mut received_from = vec![BTreeSet::new(); count];
        let mut earliest = FOREVER;

        for donor in 0..count {
            earliest = earliest.min(self.players[donor].energy.next_sabotage_expiry(frame));
            for recipient in 0..count {
                if recipient == donor {
                    continue;
                }
                let amount = self.players[donor].energy.calculate_energy_given_to_player(
                    PlayerIndex(recipient),
                    frame,
                    &mut earliest,
                );
                if amount > 0 {
                    received[recipient] += amount;
                    received_from[recipient].insert(PlayerIndex(donor));
                    given[donor] += amount;
                }
            }
        }

        for (index, player) in self.players.iter_mut().enumerate() {
            let from = std::mem::take(&mut received_from[index]);
            player
                .energy
                .finish_recheck(frame, received[index] - given[index], from, earliest);
        }
        tracing::trace!(frame, next_recheck = earliest, "energy transfers recomputed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::{GrantSource, DEFAULT_STOLEN_CONSTANT};

    fn two_players() -> (Players, PlayerIndex, PlayerIndex) {
        let mut players = Players::new();
        let a = players.add("USA");
        let b = players.add("GLA");
        (players, a, b)
    }

    #[test]
    fn test_relationships() {
        let (mut players, a, b) = two_players();
        assert_eq!(players.relationship(Some(a), Some(a)), Relationship::Allies);
        assert_eq!(players.relationship(Some(a), Some(b)), Relationship::Enemies);
        assert_eq!(players.relationship(None, Some(b)), Relationship::Neutral);
        players.set_relationship(a, b, Relationship::Allies);
        assert_eq!(players.relationship(Some(a), Some(b)), Relationship::Allies);
        assert_eq!(players.relationship(Some(b), Some(a)), Relationship::Enemies);
    }

    #[test]
    fn test_theft_moves_power_between_players() {
        let (mut players, a, b) = two_players();
        players.get_mut(a).unwrap().energy.add_production(100);
        players.get_mut(b).unwrap().energy.add_production(20);
        players.refresh_energy(0);

        players
            .get_mut(a)
            .unwrap()
            .energy
            .give_energy_to(b, GrantSource::All, DEFAULT_STOLEN_CONSTANT, 100, 0);
        players.refresh_energy(1);

        assert_eq!(players.get(a).unwrap().energy.get_production(1), 0);
        assert_eq!(players.get(b).unwrap().energy.get_production(1), 120);
        assert!(players.get(b).unwrap().energy.receiving_from().contains(&a));

        // grant lapses at frame 100 without any explicit call
        players.refresh_energy(100);
        assert_eq!(players.get(a).unwrap().energy.get_production(100), 100);
        assert_eq!(players.get(b).unwrap().energy.get_production(100), 20);
    }

    #[test]
    fn test_brownout_edges_reported_once() {
        let (mut players, a, _) = two_players();
        let energy = &mut players.get_mut(a).unwrap().energy;
        energy.add_production(50);
        energy.add_consumption(80);

        let edges = players.refresh_energy(0);
        assert_eq!(edges, vec![BrownoutEdge { player: a, brownout: true }]);
        assert!(players.refresh_energy(1).is_empty());

        players.get_mut(a).unwrap().energy.add_production(40);
        let edges = players.refresh_energy(2);
        assert_eq!(edges, vec![BrownoutEdge { player: a, brownout: false }]);
    }
}
