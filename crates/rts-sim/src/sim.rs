//! The `Sim` session: kernel, world, and the periodic movement task.

use std::cell::RefCell;
use std::rc::Rc;

use rts_core::{EntityId, Tick, Vec2};
use rts_entity::{EntityRec, EntityStore};
use rts_kernel::{Kernel, event};
use rts_move::{ClickMode, MoveEngine};
use rts_nav::{LocalAvoidance, Nav};

use crate::SimObserver;

/// Milliseconds between movement steps: 50 ms = 20 Hz, exactly three 60 Hz
/// kernel ticks.
pub(crate) const MOVE_PERIOD_MS: u32 = 50;

// ── World ─────────────────────────────────────────────────────────────────────

/// Everything the movement task mutates each step.  Shared between the task
/// and the host behind `Rc<RefCell<…>>` — single-threaded, so a borrow is
/// only ever taken between suspension points.
pub struct World<N: Nav, A: LocalAvoidance> {
    pub entities: EntityStore,
    pub movement: MoveEngine<N, A>,
    /// Completed movement steps (diagnostics).
    pub move_ticks: u64,
}

// ── Mouse input ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MouseButton {
    Left,
    Right,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// One engine session: the kernel (with its services and the movement
/// task), the world, and the current selection.
///
/// Create via [`SimBuilder`][crate::SimBuilder].  Drive it by calling
/// [`Sim::step`] (or [`Sim::run_ticks`]) once per 60 Hz slice.
pub struct Sim<N: Nav + 'static, A: LocalAvoidance + 'static> {
    pub(crate) kernel: Kernel,
    pub(crate) world: Rc<RefCell<World<N, A>>>,
    pub(crate) selection: Vec<EntityId>,
    pub(crate) clock: Tick,
}

impl<N: Nav + 'static, A: LocalAvoidance + 'static> Sim<N, A> {
    // ── Entity management ─────────────────────────────────────────────────

    /// Add `rec` to the world and register it with the movement core.
    pub fn add_entity(&self, rec: EntityRec) -> EntityId {
        let mut w = self.world.borrow_mut();
        let World { entities, movement, .. } = &mut *w;
        let id = entities.add(rec);
        movement.add_entity(entities, id);
        id
    }

    /// Remove an entity from both the movement core and the store.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let mut w = self.world.borrow_mut();
        w.movement.remove_entity(id);
        self.selection.retain(|&s| s != id);
        w.entities.remove(id)
    }

    // ── Selection and input ───────────────────────────────────────────────

    pub fn set_selection(&mut self, selection: Vec<EntityId>) {
        self.selection = selection;
    }

    pub fn selection(&self) -> &[EntityId] {
        &self.selection
    }

    /// Route a terrain click.  Left clicks order the current selection to
    /// move (or attack-move, per the click mode); right clicks are left to
    /// other subsystems.
    pub fn on_mouse_down(&self, button: MouseButton, pos: Vec2) -> bool {
        if button != MouseButton::Left || self.selection.is_empty() {
            return false;
        }
        let mut w = self.world.borrow_mut();
        let World { entities, movement, .. } = &mut *w;
        let attack = movement.click_mode() == ClickMode::Attack;
        movement.make_flock(entities, &self.selection, pos, attack)
    }

    // ── Tick driving ──────────────────────────────────────────────────────

    /// Raise one 60 Hz kernel tick and drain the scheduler.
    pub fn step(&mut self) {
        self.kernel.raise_event(event::TICK_60HZ, self.clock.0);
        self.kernel.run();
        self.clock.advance();
    }

    /// Run `n` kernel ticks, feeding the observer.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) {
        for _ in 0..n {
            let now = self.clock;
            observer.on_tick_start(now);
            self.step();
            for ev in self.world.borrow_mut().movement.drain_events() {
                observer.on_motion(now, ev);
            }
            observer.on_tick_end(now);
        }
    }

    /// Kernel ticks raised so far.
    pub fn clock(&self) -> Tick {
        self.clock
    }

    // ── Access ────────────────────────────────────────────────────────────

    /// The shared world.  Borrow only between [`Sim::step`] calls.
    pub fn world(&self) -> Rc<RefCell<World<N, A>>> {
        Rc::clone(&self.world)
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// End the session: release every nav blocker and drop the kernel with
    /// all of its tasks.
    pub fn shutdown(self) {
        self.world.borrow_mut().movement.shutdown();
        drop(self.kernel);
    }
}
