//! Orchestrates the ordered phases a simulation run goes through: parse,
//! construct + build, bind, pre-start, start, reset, run, stop, flush.

use crate::component::CompositeModel;
use crate::config::ConfigNode;
use crate::error::VpResult;
use crate::ids::{ComponentId, EventId};
use crate::loader::ModuleLoader;
use crate::world::World;
use fxhash::FxHashMap;

pub type EventCallback = Box<dyn FnMut(&mut World)>;

pub struct LifecycleDriver {
    pub world: World,
    callbacks: FxHashMap<EventId, EventCallback>,
    next_event_id: u64,
}

impl LifecycleDriver {
    pub fn new(mut loader: ModuleLoader) -> Self {
        loader.register_static("utils.composite_impl", |_name, _config| {
            Box::new(CompositeModel) as Box<dyn crate::component::Component>
        });
        LifecycleDriver {
            world: World::new(loader),
            callbacks: FxHashMap::default(),
            next_event_id: 0,
        }
    }

    pub fn alloc_event_id(&mut self) -> EventId {
        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        id
    }

    /// Registers a one-shot callback for an id already (or about to be)
    /// enqueued on a [`crate::sched::ClockEngine`]. Firing a callback
    /// removes it; a callback that wants to keep running must re-register
    /// and re-enqueue itself.
    pub fn register_event(&mut self, id: EventId, callback: EventCallback) {
        self.callbacks.insert(id, callback);
    }

    /// Phases 1-3: parses nothing itself (the caller already produced
    /// `root_config`), constructs the root component, and recursively
    /// builds the whole tree — a composite's own `build` is what creates
    /// its children, so this one call drives the entire hierarchy.
    pub fn construct(&mut self, root_config: ConfigNode, root_module: &str) -> VpResult<ComponentId> {
        tracing::info!(module = root_module, "constructing component tree");
        self.world.new_component(None, "root", root_config, root_module)
    }

    /// Phase 5: `pre_start_all` → `start_all` → `final_bind`, in that order
    /// — `start` may allocate port-bound resources before interface
    /// pointers are cached by `final_bind`.
    pub fn bind_and_start(&mut self, root: ComponentId) -> VpResult<()> {
        tracing::info!("pre-starting component tree");
        self.pre_start_all(root)?;
        tracing::info!("starting component tree");
        self.start_all(root)?;
        tracing::info!("resolving port bindings");
        self.world.final_bind()?;
        Ok(())
    }

    fn pre_start_all(&mut self, id: ComponentId) -> VpResult<()> {
        self.world.pre_start_component(id)?;
        let children = self.world.component(id).children.clone();
        for child in children {
            self.pre_start_all(child)?;
        }
        Ok(())
    }

    fn start_all(&mut self, id: ComponentId) -> VpResult<()> {
        self.world.start_component(id)?;
        let children = self.world.component(id).children.clone();
        for child in children {
            self.start_all(child)?;
        }
        Ok(())
    }

    /// Phase 6: assert then deassert reset across the whole tree.
    pub fn reset(&mut self, root: ComponentId) {
        tracing::info!("reset asserted");
        self.world.reset_all(root, true, false);
        tracing::info!("reset deasserted");
        self.world.reset_all(root, false, false);
    }

    /// Phase 7: drains the time engine until it runs dry or `should_stop`
    /// reports true between events.
    pub fn run(&mut self, mut should_stop: impl FnMut(&World) -> bool) {
        tracing::info!("run loop starting");
        loop {
            if should_stop(&self.world) {
                tracing::info!("run loop stopped by request");
                break;
            }
            let Some((_clock, fired)) = self.world.time_engine.step() else {
                tracing::info!("run loop stopped, no events remain");
                break;
            };
            for event_id in fired {
                if let Some(mut callback) = self.callbacks.remove(&event_id) {
                    callback(&mut self.world);
                }
            }
        }
    }

    /// Phase 8: `stop_all` then `flush_all`.
    pub fn stop_and_flush(&mut self, root: ComponentId) {
        tracing::info!("stopping component tree");
        self.stop_all(root);
        tracing::info!("flushing component tree");
        self.flush_all(root);
    }

    fn stop_all(&mut self, id: ComponentId) {
        self.world.stop_component(id);
        let children = self.world.component(id).children.clone();
        for child in children {
            self.stop_all(child);
        }
    }

    fn flush_all(&mut self, id: ComponentId) {
        self.world.flush_component(id);
        let children = self.world.component(id).children.clone();
        for child in children {
            self.flush_all(child);
        }
    }
}
