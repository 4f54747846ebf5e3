//! Exercises `#[vplat_macros::model(...)]`'s generated expansion end-to-end,
//! through the same `ModuleLoader` / `World` path a dynamically loaded model
//! would go through, rather than just checking the macro expands.

use vplat::component::{Component, Phase};
use vplat::config::ConfigNode;
use vplat::error::VpResult;
use vplat::ids::ComponentId;
use vplat::loader::{BuildMode, ModuleLoader};
use vplat::world::World;
use vplat_macros::model;

#[model("demo.timer")]
#[derive(Default)]
struct TimerModel;

impl Component for TimerModel {
    fn build(&mut self, _world: &mut World, _id: ComponentId) -> VpResult<()> {
        Ok(())
    }
}

/// Adapts the macro-generated `vp_constructor` C-ABI symbol to
/// `ModuleLoader`'s native factory signature, the same role the dynamic
/// loader plays for a cdylib built with this attribute.
fn timer_factory(_name: &str, config: &ConfigNode) -> Box<dyn Component> {
    unsafe { Box::from_raw(vp_constructor(config as *const ConfigNode)) }
}

#[test]
fn module_name_constant_matches_attribute_argument() {
    assert_eq!(TimerModel::VP_MODULE_NAME, "demo.timer");
}

#[test]
fn generated_constructor_builds_a_working_component_through_the_loader() {
    let mut loader = ModuleLoader::new(vec![], BuildMode::Release);
    loader.register_static("demo.timer", timer_factory);
    let mut world = World::new(loader);
    let root = world
        .new_component(None, "root", ConfigNode::Null, "demo.timer")
        .unwrap();
    assert_eq!(world.component(root).phase, Phase::Built);
}
