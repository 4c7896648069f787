//! The step function: advances the rain by one frame.
//!
//! Processing order:
//!   1. Frame clock tick
//!   2. Spawn pass (one draw per slot with spare capacity)
//!   3. Advance heads by speed * dt
//!   4. Reap columns whose tail left the screen
//!   5. Shimmer (mutation frames only)
//!   6. Composite all columns into the grid
//!   7. Diff against the previous frame
//!
//! Nothing here blocks or touches the terminal. The returned updates
//! borrow the world until the caller has handed them to a sink.

use std::time::Duration;

use tracing::trace;

use crate::domain::column;
use crate::sim::diff::CellUpdate;
use crate::sim::event::RainEvent;
use crate::sim::grid;
use crate::sim::mutation;
use crate::sim::world::RainWorld;

pub fn step(world: &mut RainWorld, dt: Duration) -> &[CellUpdate] {
    world.events.clear();
    world.clock.tick(dt);

    spawn(world);
    column::advance(&mut world.columns, dt.as_secs_f32());
    reap(world);

    let shimmered = mutation::tick(
        &world.clock,
        world.params.mutation_interval_frames,
        &mut world.columns,
        &world.pool,
        &mut world.rng,
    );
    if shimmered {
        world.events.push(RainEvent::Shimmer);
    }

    grid::composite_into(&mut world.grid, &world.columns, world.levels);
    world.diff.emit(&mut world.grid)
}

fn spawn(world: &mut RainWorld) {
    let spawned = column::spawn_pass(
        &world.columns,
        world.cols,
        world.params.spawn_probability,
        world.params.max_overlap_per_slot,
        &world.params.column,
        &world.pool,
        &mut world.rng,
        world.clock.frame,
    );
    for c in &spawned {
        trace!(slot = c.slot, tick = c.spawn_tick, speed = c.speed, length = c.length(), "column spawned");
        world.events.push(RainEvent::Spawned { slot: c.slot, speed: c.speed, length: c.length() });
    }
    world.columns.extend(spawned);
}

fn reap(world: &mut RainWorld) {
    let bottom = world.bottom_row();
    let count = column::reap(&mut world.columns, bottom, world.params.reap_margin);
    if count > 0 {
        trace!(count, active = world.columns.len(), "columns reaped");
        world.events.push(RainEvent::Reaped { count });
    }
}
