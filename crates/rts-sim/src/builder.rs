//! Fluent builder for constructing a [`Sim`].

use std::cell::RefCell;
use std::rc::Rc;

use rts_core::Tick;
use rts_entity::EntityStore;
use rts_kernel::{Kernel, time_server};
use rts_move::MoveEngine;
use rts_nav::{LocalAvoidance, Nav};

use crate::sim::{MOVE_PERIOD_MS, World};
use crate::{Sim, SimResult};

/// Priority of the periodic movement task: below the system services, above
/// default application tasks.
const MOVEMENT_PRIORITY: u8 = 2;

/// Fluent builder for [`Sim<N, A>`].
///
/// # Example
///
/// ```rust,ignore
/// let sim = SimBuilder::new(GridMap::new(64, 64, 8.0, 8.0), SampledAvoidance)
///     .build()?;
/// ```
pub struct SimBuilder<N: Nav + 'static, A: LocalAvoidance + 'static> {
    nav: N,
    avoid: A,
    movement_priority: u8,
}

impl<N: Nav + 'static, A: LocalAvoidance + 'static> SimBuilder<N, A> {
    pub fn new(nav: N, avoid: A) -> Self {
        Self {
            nav,
            avoid,
            movement_priority: MOVEMENT_PRIORITY,
        }
    }

    /// Override the movement task's priority.
    pub fn movement_priority(mut self, priority: u8) -> Self {
        self.movement_priority = priority;
        self
    }

    /// Start the kernel services and the movement task, returning a
    /// ready-to-step [`Sim`].
    pub fn build(self) -> SimResult<Sim<N, A>> {
        let kernel = Kernel::new();
        kernel.create_services()?;

        let world = Rc::new(RefCell::new(World {
            entities: EntityStore::new(),
            movement: MoveEngine::new(self.nav, self.avoid),
            move_ticks: 0,
        }));

        // The movement task: sleep one period, run one steering step,
        // forever.  The world borrow spans only the synchronous part of
        // each iteration, never a suspension point.
        let task_world = Rc::clone(&world);
        kernel.spawn(self.movement_priority, move |ctx| async move {
            loop {
                if time_server::sleep(&ctx, MOVE_PERIOD_MS).await.is_err() {
                    return; // kernel shut down
                }
                let mut w = task_world.borrow_mut();
                let World { entities, movement, move_ticks } = &mut *w;
                movement.tick(entities);
                *move_ticks += 1;
            }
        })?;

        // Let every task reach its first suspension point (services
        // receive-blocked, notifier on the tick event, movement sleeping)
        // so the very first raised tick is not missed.
        kernel.run();

        Ok(Sim {
            kernel,
            world,
            selection: Vec::new(),
            clock: Tick::ZERO,
        })
    }
}
