//! Per-agent shared state between the brain and the behaviours.
//!
//! The brain system writes [`Senses`] once per tick; behaviour actions read
//! them and update [`Vitals`] and [`Drive`] from whatever thread their rung
//! runs on.  Each section has its own lock and no lock is held across an
//! action boundary.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::OutputComponent;

/// Decoded brain output for the current tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Senses {
    pub food:    f32,
    pub threat:  f32,
    /// Unit vector towards the strongest stimulus, or zero.
    pub heading: [f32; 2],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vitals {
    pub energy: f32,
    /// Energy gained from food over the agent's lifetime.
    pub eaten:  f32,
    pub meals:  u32,
    pub alive:  bool,
}

/// Movement the agent's current behaviour asks for.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Drive {
    pub speed:   f32,
    pub heading: [f32; 2],
}

impl Drive {
    pub const STOP: Drive = Drive { speed: 0.0, heading: [0.0, 0.0] };

    pub fn velocity(self) -> [f32; 2] {
        [self.heading[0] * self.speed, self.heading[1] * self.speed]
    }
}

#[derive(Debug)]
pub struct Blackboard {
    senses: RwLock<Senses>,
    vitals: Mutex<Vitals>,
    drive:  RwLock<Drive>,
}

impl Blackboard {
    pub fn new(energy: f32) -> Self {
        Self {
            senses: RwLock::new(Senses::default()),
            vitals: Mutex::new(Vitals { energy, eaten: 0.0, meals: 0, alive: true }),
            drive:  RwLock::new(Drive::STOP),
        }
    }

    // ── Senses ────────────────────────────────────────────────────────────

    pub fn senses(&self) -> Senses {
        *self.senses.read()
    }

    pub fn set_senses(&self, senses: Senses) {
        *self.senses.write() = senses;
    }

    /// Decode the sense row of `outputs`.  Missing columns read as zero:
    /// an evaluator that produced nothing leaves the agent senseless, not
    /// stale.
    pub fn sense(&self, outputs: &OutputComponent) {
        let row = OutputComponent::SENSES;
        let col = |c| outputs.value(row, c).unwrap_or(0.0);
        self.set_senses(Senses {
            food:    col(0).max(0.0),
            threat:  col(1).max(0.0),
            heading: normalize([col(2), col(3)]),
        });
    }

    // ── Vitals ────────────────────────────────────────────────────────────

    pub fn vitals(&self) -> Vitals {
        *self.vitals.lock()
    }

    /// Spend `amount` energy, never going below zero.  Returns what is left.
    pub fn burn(&self, amount: f32) -> f32 {
        let mut v = self.vitals.lock();
        v.energy = (v.energy - amount).max(0.0);
        v.energy
    }

    /// Gain up to `bite` energy without exceeding `capacity`.  Returns the
    /// amount actually gained.
    pub fn feed(&self, bite: f32, capacity: f32) -> f32 {
        let mut v = self.vitals.lock();
        let gained = bite.min(capacity - v.energy).max(0.0);
        v.energy += gained;
        v.eaten += gained;
        gained
    }

    pub fn finish_meal(&self) {
        self.vitals.lock().meals += 1;
    }

    pub fn kill(&self) {
        self.vitals.lock().alive = false;
        *self.drive.write() = Drive::STOP;
    }

    // ── Drive ─────────────────────────────────────────────────────────────

    pub fn drive(&self) -> Drive {
        *self.drive.read()
    }

    pub fn set_drive(&self, drive: Drive) {
        *self.drive.write() = drive;
    }
}

fn normalize(v: [f32; 2]) -> [f32; 2] {
    let len = (v[0] * v[0] + v[1] * v[1]).sqrt();
    if len > f32::EPSILON { [v[0] / len, v[1] / len] } else { [0.0, 0.0] }
}

/// An agent's blackboard, attached as its own component so systems that
/// only need senses or drive never lock the agent's state machine.
#[derive(Clone, Debug)]
pub struct BlackboardComponent(pub Arc<Blackboard>);
