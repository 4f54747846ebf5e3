use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;
use vplat::config::ConfigNode;
use vplat::loader::{BuildMode as KernelBuildMode, ModuleLoader};
use vplat::lifecycle::LifecycleDriver;

#[derive(Parser)]
#[command(name = "vplat-launch", about = "Launch a virtual-platform simulation from a config file")]
struct Cli {
    /// Path to the root JSON configuration.
    config: PathBuf,

    /// Directories searched for dynamically loaded model libraries.
    #[arg(long = "include-dir")]
    include_dirs: Vec<PathBuf>,

    /// Selects the mode-tagged variant of each model library to load.
    #[arg(long, value_enum, default_value = "release")]
    mode: CliBuildMode,

    /// Root module to instantiate; defaults to the passthrough composite.
    #[arg(long, default_value = "utils.composite_impl")]
    root_module: String,

    /// Print the resolved component/port tree after binding, then exit
    /// without running.
    #[arg(long)]
    dump_tree: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliBuildMode {
    Release,
    Debug,
    M32,
    DebugM32,
}

impl From<CliBuildMode> for KernelBuildMode {
    fn from(mode: CliBuildMode) -> Self {
        match mode {
            CliBuildMode::Release => KernelBuildMode::Release,
            CliBuildMode::Debug => KernelBuildMode::Debug,
            CliBuildMode::M32 => KernelBuildMode::M32,
            CliBuildMode::DebugM32 => KernelBuildMode::DebugM32,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let text = fs::read_to_string(&cli.config).into_diagnostic()?;
    let config = ConfigNode::parse(&text).map_err(|e| miette::miette!("{e}"))?;

    let loader = ModuleLoader::new(cli.include_dirs, cli.mode.into());
    let mut driver = LifecycleDriver::new(loader);

    let root = driver
        .construct(config, &cli.root_module)
        .map_err(|e| miette::miette!("{e}"))?;
    driver.bind_and_start(root).map_err(|e| miette::miette!("{e}"))?;

    if cli.dump_tree {
        print!("{}", driver.world.dump_component_tree(root));
        return Ok(());
    }

    driver.reset(root);
    driver.run(|_world| false);
    driver.stop_and_flush(root);

    Ok(())
}
