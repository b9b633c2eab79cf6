use std::collections::{BTreeMap, BTreeSet};

use crossbeam_channel::{Receiver, Sender, unbounded};

use foundation::tile::{TileId, tile_at};
use gpu::tracker::GpuResourceTracker;
use runtime::budget::FrameBudget;
use runtime::event_bus::EventBus;
use runtime::frame::Frame;
use runtime::work_queue::WorkId;
use scene::scene::Scene;
use view::View;

use crate::cache::{TileCache, TileCacheConfig};
use crate::queue::{FetchKey, FetchQueue};
use crate::source::{DataSource, FetchResult, TileData};
use crate::tile::MapTile;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TileManagerConfig {
    /// Backpressure bound on queued (not yet launched) fetches.
    pub max_pending_fetches: usize,
    /// Fetches launched per update call.
    pub launches_per_frame: usize,
    /// Geometry builds per update call, in budget units (1 per tile).
    pub builds_per_frame: u32,
    pub cache: TileCacheConfig,
}

impl Default for TileManagerConfig {
    fn default() -> Self {
        Self {
            max_pending_fetches: 64,
            launches_per_frame: 8,
            builds_per_frame: 4,
            cache: TileCacheConfig::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Pending {
    Queued(WorkId),
    InFlight,
}

#[derive(Debug, Default)]
struct Staged {
    received: BTreeMap<usize, TileData>,
    failed: BTreeSet<usize>,
}

impl Staged {
    fn settled(&self) -> usize {
        self.received.len() + self.failed.len()
    }

    fn has_settled(&self, source: usize) -> bool {
        self.received.contains_key(&source) || self.failed.contains(&source)
    }
}

/// Drives the tile streaming pipeline: visible-set tracking, asynchronous
/// fetch, budgeted geometry build, and cache eviction.
///
/// All cache mutation happens inside `update_tile_set` on the frame thread;
/// the completion channel is the only thing sources touch. At most one
/// fetch per `(tile, source)` pair is ever in flight.
pub struct TileManager {
    config: TileManagerConfig,
    sources: Vec<Box<dyn DataSource>>,
    queue: FetchQueue,
    pending: BTreeMap<FetchKey, Pending>,
    staged: BTreeMap<TileId, Staged>,
    cache: TileCache,
    results_tx: Sender<FetchResult>,
    results_rx: Receiver<FetchResult>,
}

impl TileManager {
    pub fn new(config: TileManagerConfig) -> Self {
        let (results_tx, results_rx) = unbounded();
        Self {
            config,
            sources: Vec::new(),
            queue: FetchQueue::new(config.max_pending_fetches),
            pending: BTreeMap::new(),
            staged: BTreeMap::new(),
            cache: TileCache::new(config.cache),
            results_tx,
            results_rx,
        }
    }

    /// Register a provider. Multiple sources compose; their results for one
    /// tile merge layer-wise in registration order.
    pub fn add_source(&mut self, source: Box<dyn DataSource>) {
        self.sources.push(source);
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Fetches submitted or launched but not yet settled.
    pub fn pending_fetches(&self) -> usize {
        self.pending.len()
    }

    /// Advance the streaming state machine one step.
    pub fn update_tile_set(
        &mut self,
        view: &View,
        scene: &Scene,
        tracker: &mut GpuResourceTracker,
        frame: Frame,
        bus: &mut EventBus,
    ) {
        let visible: Vec<TileId> = view.visible_tiles();
        let visible_set: BTreeSet<TileId> = visible.iter().copied().collect();

        self.drain_completions(&visible_set, frame, bus);
        self.build_ready_tiles(&visible_set, scene, tracker);
        self.submit_missing_fetches(&visible, &visible_set, view, frame, bus);
        self.launch_queued_fetches();
        self.cancel_stale_queued(&visible_set);

        self.staged.retain(|id, _| visible_set.contains(id));
        self.cache.touch_visible(&visible_set);
        for tile in self.cache.evict_offscreen(&visible_set) {
            bus.trace(frame, "tiles", format!("evicted {}", tile.id()));
            tile.release(tracker);
        }
    }

    /// Cached tiles intersecting the current visible set, ascending id
    /// order for deterministic draw ordering.
    pub fn visible_tiles<'a>(&'a self, view: &View) -> Vec<(TileId, &'a MapTile)> {
        let visible: BTreeSet<TileId> = view.visible_tiles().into_iter().collect();
        self.cache
            .visible(&visible)
            .map(|(id, tile)| (*id, tile))
            .collect()
    }

    /// Release everything this manager owns (teardown). Queued fetches are
    /// dropped; in-flight completions die with the channel.
    pub fn teardown(&mut self, tracker: &mut GpuResourceTracker) {
        for tile in self.cache.drain() {
            tile.release(tracker);
        }
        self.pending.clear();
        self.staged.clear();
        while self.queue.pop_next().is_some() {}
    }

    fn drain_completions(&mut self, visible: &BTreeSet<TileId>, frame: Frame, bus: &mut EventBus) {
        while let Ok(result) = self.results_rx.try_recv() {
            self.pending.remove(&(result.id, result.source));

            // A completion for a tile that scrolled out of view is dropped,
            // not inserted; the tile refetches if it becomes visible again.
            if !visible.contains(&result.id) {
                self.staged.remove(&result.id);
                bus.trace(
                    frame,
                    "tiles",
                    format!("dropped out-of-view completion for {}", result.id),
                );
                continue;
            }

            match result.result {
                Ok(data) => {
                    self.staged
                        .entry(result.id)
                        .or_default()
                        .received
                        .insert(result.source, data);
                }
                Err(e) => {
                    bus.warn(
                        frame,
                        "tiles",
                        format!("fetch of {} from source {} failed: {e}", result.id, result.source),
                    );
                    self.staged
                        .entry(result.id)
                        .or_default()
                        .failed
                        .insert(result.source);
                }
            }
        }
    }

    fn build_ready_tiles(
        &mut self,
        visible: &BTreeSet<TileId>,
        scene: &Scene,
        tracker: &mut GpuResourceTracker,
    ) {
        let source_count = self.sources.len();
        let ready: Vec<TileId> = self
            .staged
            .iter()
            .filter(|(id, s)| visible.contains(id) && s.settled() == source_count)
            .map(|(id, _)| *id)
            .collect();

        let mut budget = FrameBudget::new(self.config.builds_per_frame);
        for id in ready {
            // A tile every source failed stays absent; the pending marks are
            // already cleared, so the next update retries it.
            if self.staged[&id].received.is_empty() {
                self.staged.remove(&id);
                continue;
            }
            if !budget.try_consume(1) {
                break;
            }

            let staged = match self.staged.remove(&id) {
                Some(s) => s,
                None => continue,
            };
            let mut data = TileData::new();
            for (_, part) in staged.received {
                data.merge(part);
            }
            let tile = MapTile::build(id, &data, scene, tracker);
            if let Some(replaced) = self.cache.insert(tile) {
                replaced.release(tracker);
            }
        }
    }

    fn submit_missing_fetches(
        &mut self,
        visible: &[TileId],
        visible_set: &BTreeSet<TileId>,
        view: &View,
        frame: Frame,
        bus: &mut EventBus,
    ) {
        debug_assert!(visible.iter().all(|id| visible_set.contains(id)));
        let center = tile_at(view.position(), view.tile_zoom());

        'tiles: for id in visible {
            if self.cache.contains(id) {
                continue;
            }
            // Per-source check rather than per-tile: a source registered
            // after a tile was staged still owes that tile a fetch.
            let staged = self.staged.get(id);
            for source in 0..self.sources.len() {
                let key = (*id, source);
                if self.pending.contains_key(&key) {
                    continue;
                }
                if staged.is_some_and(|s| s.has_settled(source)) {
                    continue;
                }
                let priority = fetch_priority(*id, center);
                match self.queue.try_submit(priority, key) {
                    Ok(work) => {
                        self.pending.insert(key, Pending::Queued(work));
                    }
                    Err(full) => {
                        bus.trace(frame, "tiles", full.to_string());
                        break 'tiles;
                    }
                }
            }
        }
    }

    fn launch_queued_fetches(&mut self) {
        for _ in 0..self.config.launches_per_frame {
            let Some((_work, (id, source))) = self.queue.pop_next() else {
                break;
            };
            self.pending.insert((id, source), Pending::InFlight);
            self.sources[source].start_fetch(id, source, self.results_tx.clone());
        }
    }

    fn cancel_stale_queued(&mut self, visible: &BTreeSet<TileId>) {
        let stale: Vec<(FetchKey, WorkId)> = self
            .pending
            .iter()
            .filter_map(|(key, p)| match p {
                Pending::Queued(work) if !visible.contains(&key.0) => Some((*key, *work)),
                _ => None,
            })
            .collect();
        for (key, work) in stale {
            self.queue.cancel(work);
            self.pending.remove(&key);
        }
    }
}

/// Closer tiles fetch first; ties resolve in submission (ascending id)
/// order via the queue.
fn fetch_priority(id: TileId, center: TileId) -> i32 {
    let dx = (id.x as i64 - center.x as i64).abs();
    let dy = (id.y as i64 - center.y as i64).abs();
    (dx + dy) as i32
}
