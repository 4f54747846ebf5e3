//! Wires a two-component platform (a wire source and a wire sink) through
//! the default composite root, mirroring end-to-end scenario 1 from the
//! kernel's test suite but run as a standalone binary.

use vplat::component::Component;
use vplat::config::ConfigNode;
use vplat::error::VpResult;
use vplat::ids::ComponentId;
use vplat::interface::WireInterface;
use vplat::loader::{BuildMode, ModuleLoader};
use vplat::lifecycle::LifecycleDriver;
use vplat::port::SlaveEndpoint;
use vplat::world::World;

struct DemoSource;

impl Component for DemoSource {
    fn build(&mut self, world: &mut World, id: ComponentId) -> VpResult<()> {
        world.new_master_port(id, "out")?;
        Ok(())
    }
}

struct DemoSink;

struct PrintingWire;
impl WireInterface for PrintingWire {
    fn update(&mut self, value: u64) {
        println!("sink received {value}");
    }
}

impl Component for DemoSink {
    fn build(&mut self, world: &mut World, id: ComponentId) -> VpResult<()> {
        world.new_slave_port(id, "in", SlaveEndpoint::Wire(Box::new(PrintingWire)))?;
        Ok(())
    }
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt::init();

    let mut loader = ModuleLoader::new(vec![], BuildMode::Release);
    loader.register_static("demo.source", |_name, _config| Box::new(DemoSource));
    loader.register_static("demo.sink", |_name, _config| Box::new(DemoSink));

    let mut driver = LifecycleDriver::new(loader);

    let config = ConfigNode::parse(
        r#"{
            "vp_comps": ["src", "sink"],
            "src": { "vp_component": "demo.source" },
            "sink": { "vp_component": "demo.sink" },
            "vp_bindings": [["src->out", "sink->in"]]
        }"#,
    )
    .map_err(|e| miette::miette!("{e}"))?;

    let root = driver
        .construct(config, "utils.composite_impl")
        .map_err(|e| miette::miette!("{e}"))?;
    driver.bind_and_start(root).map_err(|e| miette::miette!("{e}"))?;
    driver.reset(root);

    let src = driver.world.get_component(Some(root), "src").unwrap();
    let out_port = driver.world.component(src).master_ports["out"];
    driver.world.wire_update(out_port, 42).map_err(|e| miette::miette!("{e}"))?;

    driver.stop_and_flush(root);
    Ok(())
}
