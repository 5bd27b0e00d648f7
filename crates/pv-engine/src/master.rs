//! Master envelope: one parameter set fanned out to several envelopes.
//!
//! The master never owns its slaves. Envelopes live in an
//! [`EnvelopeBank`] owned by the instrument layer, and the master
//! stores plain keys into it; every operation borrows the bank for the
//! duration of the call, so no reference can outlive the owner.

use arrayvec::ArrayVec;
use slotmap::SlotMap;

use crate::envelope::EnvelopeCtl;

slotmap::new_key_type! {
    /// Non-owning handle to an envelope in an [`EnvelopeBank`].
    pub struct EnvelopeKey;
}

/// Externally owned storage for envelopes a [`MasterAdsr`] coordinates.
pub type EnvelopeBank<E> = SlotMap<EnvelopeKey, E>;

/// Most slaves a master can drive.
pub const MAX_SLAVES: usize = 4;

/// Broadcasts gates and parameter edits to up to [`MAX_SLAVES`] bound
/// envelopes. Parameter setters write through slave 0 and then copy
/// slave 0's resulting parameters to the rest, so all slaves stay
/// parameter-identical while each runs its own phase independently —
/// several voices can share one envelope shape yet be triggered and
/// released at different times.
#[derive(Clone, Debug, Default)]
pub struct MasterAdsr {
    slaves: ArrayVec<Option<EnvelopeKey>, MAX_SLAVES>,
}

impl MasterAdsr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the slave count. Must be called before [`Self::bind_slave`];
    /// clears any existing bindings.
    pub fn set_slave_count(&mut self, count: usize) {
        assert!(count <= MAX_SLAVES, "a master drives at most {MAX_SLAVES} envelopes");
        self.slaves.clear();
        for _ in 0..count {
            self.slaves.push(None);
        }
    }

    pub fn slave_count(&self) -> usize {
        self.slaves.len()
    }

    /// Bind a slot to an envelope in the bank. Slot 0 is authoritative
    /// for parameter values.
    pub fn bind_slave(&mut self, index: usize, key: EnvelopeKey) {
        assert!(
            index < self.slaves.len(),
            "slave index {index} out of range; call set_slave_count first"
        );
        self.slaves[index] = Some(key);
    }

    fn bound(&self) -> impl Iterator<Item = EnvelopeKey> + '_ {
        self.slaves.iter().copied().flatten()
    }

    // --- Gate broadcasts ---

    pub fn trigger<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>) {
        self.for_each(bank, |env| env.trigger());
    }

    pub fn release<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>) {
        self.for_each(bank, |env| env.release());
    }

    pub fn set_mute<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>, mute: bool) {
        self.for_each(bank, |env| env.set_mute(mute));
    }

    pub fn reset<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>) {
        self.for_each(bank, |env| env.reset());
    }

    fn for_each<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>, mut op: impl FnMut(&mut E)) {
        for key in self.bound() {
            if let Some(env) = bank.get_mut(key) {
                op(env);
            }
        }
    }

    // --- Parameter fan-out ---

    pub fn set_attack<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>, code: u8) {
        self.write_through(bank, |env| env.set_attack(code));
    }

    pub fn set_decay<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>, code: u8) {
        self.write_through(bank, |env| env.set_decay(code));
    }

    pub fn set_sustain<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>, code: u8) {
        self.write_through(bank, |env| env.set_sustain(code));
    }

    pub fn set_release<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>, code: u8) {
        self.write_through(bank, |env| env.set_release(code));
    }

    pub fn set_sustain_time<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>, code: u8) {
        self.write_through(bank, |env| env.set_sustain_time(code));
    }

    /// Apply an edit to slave 0, then copy its full parameter set to
    /// every other bound slave.
    fn write_through<E: EnvelopeCtl>(&self, bank: &mut EnvelopeBank<E>, edit: impl FnOnce(&mut E)) {
        let mut keys = self.bound();
        let Some(first) = keys.next() else { return };

        let params = match bank.get_mut(first) {
            Some(env) => {
                edit(&mut *env);
                (
                    env.attack(),
                    env.decay(),
                    env.sustain(),
                    env.release_time(),
                    env.sustain_time(),
                )
            }
            None => return,
        };

        for key in keys {
            if let Some(env) = bank.get_mut(key) {
                env.set_attack(params.0);
                env.set_decay(params.1);
                env.set_sustain(params.2);
                env.set_release(params.3);
                env.set_sustain_time(params.4);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Adsr, AutoAdsr, Phase};

    fn bank_of(n: usize) -> (EnvelopeBank<Adsr>, MasterAdsr) {
        let mut bank = EnvelopeBank::with_key();
        let mut master = MasterAdsr::new();
        master.set_slave_count(n);
        for i in 0..n {
            let key = bank.insert(Adsr::new());
            master.bind_slave(i, key);
        }
        (bank, master)
    }

    #[test]
    fn parameter_edit_reaches_all_slaves() {
        let (mut bank, master) = bank_of(3);
        master.set_attack(&mut bank, 42);
        for (_, env) in bank.iter() {
            assert_eq!(env.attack(), 42);
        }
    }

    #[test]
    fn slave_zero_is_authoritative() {
        let (mut bank, master) = bank_of(3);
        master.set_sustain(&mut bank, 200);

        // Knock one slave out of sync behind the master's back
        let stray = bank.iter().nth(2).map(|(k, _)| k).unwrap();
        bank[stray].set_decay(99);

        // Any master edit restores the full parameter set everywhere
        master.set_attack(&mut bank, 7);
        for (_, env) in bank.iter() {
            assert_eq!(env.attack(), 7);
            assert_eq!(env.decay(), 0);
            assert_eq!(env.sustain(), 200);
        }
    }

    #[test]
    fn gates_broadcast_while_phases_stay_independent() {
        let (mut bank, master) = bank_of(2);
        master.set_sustain(&mut bank, 255);
        master.set_release(&mut bank, 10);
        master.trigger(&mut bank);
        for (_, env) in bank.iter() {
            assert_eq!(env.phase(), Phase::Sustain);
        }

        // Release one slave directly; the other keeps sustaining
        let first = bank.iter().next().map(|(k, _)| k).unwrap();
        bank[first].release();
        let phases: alloc::vec::Vec<Phase> = bank.iter().map(|(_, e)| e.phase()).collect();
        assert!(phases.contains(&Phase::Release));
        assert!(phases.contains(&Phase::Sustain));

        master.release(&mut bank);
        for (_, env) in bank.iter() {
            assert_ne!(env.phase(), Phase::Sustain);
        }
    }

    #[test]
    fn mute_and_reset_broadcast() {
        let (mut bank, master) = bank_of(2);
        master.set_attack(&mut bank, 10);
        master.set_mute(&mut bank, true);
        for (_, env) in bank.iter() {
            assert!(env.is_muted());
        }
        master.reset(&mut bank);
        for (_, env) in bank.iter() {
            assert!(!env.is_muted());
            assert_eq!(env.attack(), 0);
        }
    }

    #[test]
    fn sustain_time_fans_out_to_auto_envelopes() {
        let mut bank: EnvelopeBank<AutoAdsr> = EnvelopeBank::with_key();
        let mut master = MasterAdsr::new();
        master.set_slave_count(3);
        for i in 0..3 {
            let key = bank.insert(AutoAdsr::new());
            master.bind_slave(i, key);
        }
        master.set_sustain_time(&mut bank, 33);
        for (_, env) in bank.iter() {
            assert_eq!(env.sustain_time(), 33);
        }
    }

    #[test]
    fn unbound_slots_are_skipped() {
        let mut bank: EnvelopeBank<Adsr> = EnvelopeBank::with_key();
        let mut master = MasterAdsr::new();
        master.set_slave_count(4);
        let key = bank.insert(Adsr::new());
        master.bind_slave(2, key);
        master.set_attack(&mut bank, 5);
        assert_eq!(bank[key].attack(), 5);
    }

    #[test]
    #[should_panic]
    fn binding_past_declared_count_panics() {
        let mut bank: EnvelopeBank<Adsr> = EnvelopeBank::with_key();
        let mut master = MasterAdsr::new();
        master.set_slave_count(2);
        let key = bank.insert(Adsr::new());
        master.bind_slave(2, key);
    }

    #[test]
    #[should_panic]
    fn declaring_too_many_slaves_panics() {
        let mut master = MasterAdsr::new();
        master.set_slave_count(MAX_SLAVES + 1);
    }
}
