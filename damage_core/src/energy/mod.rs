//! Energy - Per-player power production, consumption and transfers
//!
//! Production is what the player's objects generate plus upgrade bonuses,
//! minus live sabotage, plus the net of energy granted to and from other
//! players. The transfer part is computed by [`crate::player::Players`] and
//! cached here until `next_recheck_frame`.

mod ledger;

pub use ledger::{EnergyGrant, GrantSource, SabotageEntry, DEFAULT_STOLEN_CONSTANT};

use crate::types::{Frame, PlayerIndex, FOREVER};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    production: i32,
    consumption: i32,
    /// Power plant upgrade bonuses
    bonus: i32,
    /// Received minus given, as of the last recheck
    transfer_balance: i32,

    // === Sabotage ===
    /// Full blackout until this frame
    power_sabotaged_till_frame: Frame,
    power_sabotage_data: Vec<SabotageEntry>,

    // === Transfers ===
    energy_given_to: Vec<EnergyGrant>,
    energy_transfer_active_received_players: BTreeSet<PlayerIndex>,
    next_recheck_frame: Frame,
    dirty: bool,

    brownout: bool,
}

impl Energy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_production(&self) -> i32 {
        self.production
    }

    pub fn bonus(&self) -> i32 {
        self.bonus
    }

    pub fn transfer_balance(&self) -> i32 {
        self.transfer_balance
    }

    pub fn is_brownout(&self) -> bool {
        self.brownout
    }

    pub(crate) fn set_brownout(&mut self, brownout: bool) {
        self.brownout = brownout;
    }

    pub fn grants(&self) -> &[EnergyGrant] {
        &self.energy_given_to
    }

    pub fn sabotage_entries(&self) -> &[SabotageEntry] {
        &self.power_sabotage_data
    }

    pub fn receiving_from(&self) -> &BTreeSet<PlayerIndex> {
        &self.energy_transfer_active_received_players
    }

    pub fn is_power_sabotaged(&self, frame: Frame) -> bool {
        frame < self.power_sabotaged_till_frame
    }

    fn sabotage_reduction(&self, frame: Frame) -> i32 {
        self.power_sabotage_data
            .iter()
            .filter(|e| e.is_live(frame))
            .map(|e| e.reduction(self.production))
            .sum()
    }

    /// Own power available to give away, ignoring transfers
    pub fn transferable_power(&self, frame: Frame) -> i32 {
        if self.is_power_sabotaged(frame) {
            return 0;
        }
        (self.production + self.bonus - self.sabotage_reduction(frame)).max(0)
    }

    pub fn get_production(&self, frame: Frame) -> i32 {
        if self.is_power_sabotaged(frame) {
            return 0;
        }
        let reduction = self.sabotage_reduction(frame);
        (self.production + self.bonus + self.transfer_balance - reduction).max(0)
    }

    pub fn get_consumption(&self) -> i32 {
        self.consumption
    }

    /// Production over consumption; raw production when nothing consumes
    pub fn get_energy_supply_ratio(&self, frame: Frame) -> f64 {
        let production = self.get_production(frame) as f64;
        if self.consumption == 0 {
            return production;
        }
        production / self.consumption as f64
    }

    pub fn has_sufficient_power(&self, frame: Frame) -> bool {
        if self.is_power_sabotaged(frame) {
            return false;
        }
        self.get_production(frame) >= self.consumption
    }

    pub fn add_production(&mut self, amount: i32) {
        self.production = (self.production + amount).max(0);
        self.dirty = true;
    }

    pub fn add_consumption(&mut self, amount: i32) {
        self.consumption = (self.consumption + amount).max(0);
        self.dirty = true;
    }

    /// Positive deltas are production, negative deltas consumption
    pub fn adjust_power(&mut self, delta: i32, adding: bool) {
        if delta == 0 {
            return;
        }
        let sign = if adding { 1 } else { -1 };
        if delta > 0 {
            self.add_production(sign * delta);
        } else {
            self.add_consumption(sign * -delta);
        }
    }

    pub fn object_entering_influence(&mut self, energy: i32) {
        self.adjust_power(energy, true);
    }

    pub fn object_leaving_influence(&mut self, energy: i32) {
        self.adjust_power(energy, false);
    }

    pub fn add_power_bonus(&mut self, bonus: i32) {
        self.bonus += bonus;
        self.dirty = true;
    }

    pub fn remove_power_bonus(&mut self, bonus: i32) {
        self.bonus = (self.bonus - bonus).max(0);
        self.dirty = true;
    }

    /// Sabotage power until `till`
    ///
    /// With no amount and no percent the grid is blacked out; otherwise the
    /// reduction stacks with any other live sabotage.
    pub fn set_power_sabotaged_till_frame(
        &mut self,
        frame: Frame,
        till: Frame,
        amount: i32,
        percent: f64,
    ) {
        self.power_sabotage_data.retain(|e| e.is_live(frame));
        if amount == 0 && percent <= 0.0 {
            self.power_sabotaged_till_frame = self.power_sabotaged_till_frame.max(till);
        } else {
            self.power_sabotage_data.push(SabotageEntry {
                till_frame: till,
                amount,
                percent: percent.clamp(0.0, 1.0),
            });
        }
        self.dirty = true;
    }

    /// Record a timed grant to `recipient`; returns the most it can deliver
    pub fn give_energy_to(
        &mut self,
        recipient: PlayerIndex,
        source: GrantSource,
        amount: i32,
        till: Frame,
        frame: Frame,
    ) -> i32 {
        let grant = EnergyGrant {
            recipient,
            source,
            amount,
            till_frame: till,
            max_energy_at_grant_time: self.transferable_power(frame),
        };
        let cap = grant.cap();
        self.energy_given_to.push(grant);
        self.dirty = true;
        cap
    }

    /// Energy currently flowing to `recipient`
    ///
    /// Runs the whole allocation so grants to other players earlier in the
    /// list consume the shared pool first.
    pub fn calculate_energy_given_to_player(
        &mut self,
        recipient: PlayerIndex,
        frame: Frame,
        earliest_recheck: &mut Frame,
    ) -> i32 {
        self.allocate(frame, earliest_recheck, Some(recipient))
    }

    pub fn total_energy_given(&mut self, frame: Frame, earliest_recheck: &mut Frame) -> i32 {
        self.allocate(frame, earliest_recheck, None)
    }

    fn allocate(
        &mut self,
        frame: Frame,
        earliest_recheck: &mut Frame,
        recipient: Option<PlayerIndex>,
    ) -> i32 {
        self.energy_given_to.retain(|g| g.is_live(frame));

        let mut pool = self.transferable_power(frame);
        let mut done = pool <= 0;
        let mut used: BTreeMap<(PlayerIndex, GrantSource), i32> = BTreeMap::new();
        let mut total = 0;

        for grant in &self.energy_given_to {
            *earliest_recheck = (*earliest_recheck).min(grant.till_frame);
            if done {
                continue;
            }
            let used_by_source = used.entry((grant.recipient, grant.source)).or_insert(0);
            let give = (grant.cap() - *used_by_source).min(pool).max(0);
            *used_by_source += give;
            pool -= give;
            if recipient.map_or(true, |r| r == grant.recipient) {
                total += give;
            }
            if pool <= 0 {
                done = true;
            }
        }
        total
    }

    /// Earliest future frame at which sabotage on this ledger lapses
    pub fn next_sabotage_expiry(&self, frame: Frame) -> Frame {
        let blackout = if self.is_power_sabotaged(frame) {
            self.power_sabotaged_till_frame
        } else {
            FOREVER
        };
        self.power_sabotage_data
            .iter()
            .filter(|e| e.is_live(frame))
            .map(|e| e.till_frame)
            .fold(blackout, Frame::min)
    }

    pub fn needs_recheck(&self, frame: Frame) -> bool {
        self.dirty || frame >= self.next_recheck_frame
    }

    /// Store the result of a cross-player recomputation
    pub(crate) fn finish_recheck(
        &mut self,
        frame: Frame,
        transfer_balance: i32,
        received_from: BTreeSet<PlayerIndex>,
        next_recheck: Frame,
    ) {
        self.power_sabotage_data.retain(|e| e.is_live(frame));
        self.transfer_balance = transfer_balance;
        self.energy_transfer_active_received_players = received_from;
        self.next_recheck_frame = next_recheck;
        self.dirty = false;
    }
}
