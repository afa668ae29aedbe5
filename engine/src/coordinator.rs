//! Turning registered vision sources into one observer's fog of war.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
    sync::mpsc::{self, Sender},
};

use anyhow::{bail, Result};
use derive_more::Deref;
use glam::{IVec2, Vec2};
use util::HashSet;

use crate::{
    shadowcast, FogConfig, ObstacleMap, OwnerId, SourceHandle, VisionGrid,
    VisionProvider, VisionState,
};

/// Notifications sent to subscribers when the grid has been rewritten.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VisionEvent {
    /// A pass over the vision sources finished.
    Updated { tick: u64 },
    /// Every cell was set to the given state, bypassing the sources.
    Overridden(VisionState),
}

/// Receiving end of a coordinator subscription.
#[derive(Deref)]
pub struct Events(mpsc::Receiver<VisionEvent>);

/// Owner of the vision grid, rebuilds it from vision sources at a fixed
/// interval.
///
/// Only sources whose owner matches the coordinator's local owner
/// contribute. Sources are held by weak handles and are dropped from the
/// registry on the first tick after their last strong handle goes away.
pub struct VisibilityCoordinator {
    grid: VisionGrid,
    obstacles: Option<ObstacleMap>,
    sources: Vec<Weak<RefCell<dyn VisionProvider>>>,
    local_owner: OwnerId,

    update_interval: f32,
    fade_speed: f32,
    /// Time accumulated towards the next tick.
    elapsed: f32,
    ticks: u64,

    subscribers: Vec<Sender<VisionEvent>>,
}

impl VisibilityCoordinator {
    pub fn new(config: &FogConfig) -> Result<Self> {
        let grid = VisionGrid::from_config(config)?;
        Ok(VisibilityCoordinator {
            grid,
            obstacles: None,
            sources: Vec::new(),
            local_owner: config.local_owner,
            update_interval: config.update_interval,
            fade_speed: config.fade_speed,
            elapsed: 0.0,
            ticks: 0,
            subscribers: Vec::new(),
        })
    }

    /// Install the static obstacle map, switching reveals from plain
    /// circles to shadowcasting.
    ///
    /// The map must have the same dimensions as the grid.
    pub fn with_obstacles(mut self, obstacles: ObstacleMap) -> Result<Self> {
        if obstacles.dim() != self.grid.dim() {
            bail!(
                "VisibilityCoordinator: obstacle map is {}, grid is {}",
                obstacles.dim(),
                self.grid.dim()
            );
        }
        log::info!(
            "VisibilityCoordinator: {} obstacles installed",
            obstacles.obstacle_count()
        );
        self.obstacles = Some(obstacles);
        Ok(self)
    }

    /// Start polling a vision source. Returns false if it was already
    /// registered.
    pub fn register_source<S: VisionProvider + 'static>(
        &mut self,
        source: &Rc<RefCell<S>>,
    ) -> bool {
        let handle: SourceHandle = source.clone();
        self.register_handle(&handle)
    }

    /// Start polling a type-erased vision source. Returns false if it was
    /// already registered.
    pub fn register_handle(&mut self, handle: &SourceHandle) -> bool {
        let key = Rc::as_ptr(handle) as *const ();
        if self.position_of(key).is_some() {
            return false;
        }
        self.sources.push(Rc::downgrade(handle));
        true
    }

    /// Stop polling a vision source. Returns false if it wasn't registered.
    pub fn unregister_source<S: ?Sized>(
        &mut self,
        source: &Rc<RefCell<S>>,
    ) -> bool {
        let key = Rc::as_ptr(source) as *const ();
        match self.position_of(key) {
            Some(i) => {
                self.sources.swap_remove(i);
                true
            }
            None => false,
        }
    }

    fn position_of(&self, key: *const ()) -> Option<usize> {
        self.sources
            .iter()
            .position(|w| w.as_ptr() as *const () == key)
    }

    /// Number of registry entries, including dropped sources that haven't
    /// been pruned by a tick yet.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Advance time, running a tick once the update interval has been
    /// reached. Fading advances on every call.
    ///
    /// Time past the interval is discarded, a long frame runs at most one
    /// tick. Returns whether a tick ran.
    pub fn update(&mut self, dt: f32) -> bool {
        if !(dt > 0.0 && dt.is_finite()) {
            return false;
        }

        self.grid.advance_fade(dt, self.fade_speed);

        self.elapsed += dt;
        if self.elapsed < self.update_interval {
            return false;
        }
        self.elapsed = 0.0;
        self.tick();
        true
    }

    /// Run a tick now, regardless of the interval timer.
    pub fn force_update(&mut self) {
        self.elapsed = 0.0;
        self.tick();
    }

    fn tick(&mut self) {
        self.grid.clear_visible_cells();

        let (mut revealed, mut pruned) = (0, 0);
        let grid = &mut self.grid;
        let obstacles = self.obstacles.as_ref();
        let local_owner = self.local_owner;

        self.sources.retain(|weak| {
            let Some(rc) = weak.upgrade() else {
                pruned += 1;
                return false;
            };
            let Ok(source) = rc.try_borrow() else {
                log::warn!("VisibilityCoordinator: source busy, skipped");
                return true;
            };

            if source.is_active() && source.owner() == local_owner {
                reveal(grid, obstacles, source.position(), source.radius());
                revealed += 1;
            }
            true
        });

        self.ticks += 1;
        log::debug!(
            "VisibilityCoordinator: tick {}, {revealed} sources revealed, \
             {pruned} pruned, {} dirty cells",
            self.ticks,
            self.grid.dirty_count()
        );
        self.publish(VisionEvent::Updated { tick: self.ticks });
    }

    /// Make every cell visible until the next tick.
    pub fn reveal_all(&mut self) {
        self.grid.set_all(VisionState::Visible);
        self.publish(VisionEvent::Overridden(VisionState::Visible));
    }

    /// Forget everything that has been seen.
    pub fn hide_all(&mut self) {
        self.grid.set_all(VisionState::Unexplored);
        self.publish(VisionEvent::Overridden(VisionState::Unexplored));
    }

    /// Get notified whenever the grid is rewritten. Dropping the returned
    /// receiver ends the subscription.
    pub fn subscribe(&mut self) -> Events {
        let (send, recv) = mpsc::channel();
        self.subscribers.push(send);
        Events(recv)
    }

    fn publish(&mut self, event: VisionEvent) {
        self.subscribers.retain(|s| s.send(event).is_ok());
    }

    pub fn query(&self, pos: Vec2) -> VisionState {
        self.grid.query(pos)
    }

    pub fn is_visible(&self, pos: Vec2) -> bool {
        self.query(pos).is_visible()
    }

    pub fn is_explored(&self, pos: Vec2) -> bool {
        self.query(pos).is_explored()
    }

    pub fn state(&self, cell: IVec2) -> VisionState {
        self.grid.state(cell)
    }

    pub fn fade_alpha(&self, cell: IVec2) -> f32 {
        self.grid.fade_alpha(cell)
    }

    /// Advance fading at the configured speed.
    pub fn advance_fade(&mut self, dt: f32) -> bool {
        self.grid.advance_fade(dt, self.fade_speed)
    }

    pub fn drain_dirty_cells(&mut self) -> HashSet<IVec2> {
        self.grid.drain_dirty_cells()
    }

    /// Read access to the grid for layout metadata and bulk reads.
    pub fn grid(&self) -> &VisionGrid {
        &self.grid
    }

    pub fn obstacles(&self) -> Option<&ObstacleMap> {
        self.obstacles.as_ref()
    }

    pub fn local_owner(&self) -> OwnerId {
        self.local_owner
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}

fn reveal(
    grid: &mut VisionGrid,
    obstacles: Option<&ObstacleMap>,
    pos: Vec2,
    radius: f32,
) {
    if !pos.is_finite() || !radius.is_finite() {
        log::warn!("VisibilityCoordinator: bad source {pos} r={radius}");
        return;
    }

    match obstacles {
        Some(obstacles) => {
            let origin = grid.world_to_grid(pos);
            let radius = (radius / grid.cell_size()).round() as i32;
            shadowcast(grid, Some(obstacles), origin, radius);
        }
        None => grid.reveal_circle(pos, radius),
    }
}
