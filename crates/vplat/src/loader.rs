//! Locates and loads a model implementation by logical module name.
//!
//! Two resolution paths are supported side by side, per the redesign
//! guidance in the design notes: a compile-time [`StaticRegistry`] for
//! statically linked builds (tried first), and a [`libloading`]-backed
//! dynamic path for genuinely pluggable builds.

use crate::component::Component;
use crate::config::ConfigNode;
use crate::error::{VpError, VpResult};
use crate::ids::ComponentId;
use fxhash::FxHashMap;
use std::ffi::{CString, c_char};
use std::path::{Path, PathBuf};

/// Selects the directory prefix and filename tag a module is searched under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Release,
    Debug,
    M32,
    DebugM32,
}

impl BuildMode {
    fn tag_prefix(self) -> &'static str {
        match self {
            BuildMode::Release => "",
            BuildMode::Debug => "debug.",
            BuildMode::M32 => "m32.",
            BuildMode::DebugM32 => "debug_m32.",
        }
    }
}

/// Plain data handed to a model's constructor. Layout matches the C ABI the
/// `gv_new` entry point expects: `{name, path, parent, config}`.
#[repr(C)]
pub struct ComponentConf {
    pub name: *const c_char,
    pub path: *const c_char,
    pub parent: u32,
    pub config: *const ConfigNode,
}

/// A compile-time factory for statically linked models. Used by both
/// registration paths: the static registry stores these directly, and a
/// dynamically loaded module is expected to export a symbol compatible with
/// one of these two signatures.
pub type NativeFactory = fn(name: &str, config: &ConfigNode) -> Box<dyn Component>;

/// Legacy ABI: takes only the config node, matching `vp_constructor` in the
/// system this loader is modeled on.
pub type LegacyFactoryFn = unsafe extern "C" fn(*const ConfigNode) -> *mut (dyn Component + 'static);
/// Preferred ABI: takes the full `ComponentConf`, matching `gv_new`.
pub type PreferredFactoryFn = unsafe extern "C" fn(*const ComponentConf) -> *mut (dyn Component + 'static);

/// Dynamically loaded libraries are never unloaded once resolved: models may
/// still hold function pointers into them for the lifetime of the process.
pub struct ModuleLoader {
    include_dirs: Vec<PathBuf>,
    mode: BuildMode,
    static_registry: FxHashMap<&'static str, NativeFactory>,
    loaded_libraries: Vec<libloading::Library>,
}

impl ModuleLoader {
    pub fn new(include_dirs: Vec<PathBuf>, mode: BuildMode) -> Self {
        ModuleLoader {
            include_dirs,
            mode,
            static_registry: FxHashMap::default(),
            loaded_libraries: Vec::new(),
        }
    }

    /// Registers a compile-time factory under a logical module name, e.g.
    /// `"utils.composite_impl"`.
    pub fn register_static(&mut self, module_name: &'static str, factory: NativeFactory) {
        self.static_registry.insert(module_name, factory);
    }

    fn file_name_for(&self, module_name: &str) -> String {
        format!(
            "{}{}{}",
            self.mode.tag_prefix(),
            module_name.replace('.', "/"),
            std::env::consts::DLL_SUFFIX
        )
    }

    fn resolve_path(&self, module_name: &str) -> VpResult<PathBuf> {
        let file_name = self.file_name_for(module_name);
        let mut searched = Vec::with_capacity(self.include_dirs.len());
        for dir in &self.include_dirs {
            let candidate = dir.join(&file_name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate.display().to_string());
        }
        Err(VpError::ModuleNotFound {
            name: module_name.to_string(),
            searched,
        })
    }

    /// Loads `module_name` and constructs a component for `component_id` at
    /// `path`. Tries the static registry first, then falls back to dynamic
    /// loading from `include_dirs`.
    pub fn instantiate(
        &mut self,
        module_name: &str,
        component_id: ComponentId,
        path: &str,
        config: &ConfigNode,
    ) -> VpResult<Box<dyn Component>> {
        if let Some(factory) = self.static_registry.get(module_name) {
            return Ok(factory(path, config));
        }
        self.instantiate_dynamic(module_name, component_id, path, config)
    }

    fn instantiate_dynamic(
        &mut self,
        module_name: &str,
        component_id: ComponentId,
        path: &str,
        config: &ConfigNode,
    ) -> VpResult<Box<dyn Component>> {
        let lib_path = self.resolve_path(module_name)?;
        let library = open_library(&lib_path).map_err(|source| VpError::ModuleLoad {
            path: lib_path.display().to_string(),
            source,
        })?;

        let name_c = CString::new(path.rsplit('/').next().unwrap_or(path)).expect("path has no NUL bytes");
        let path_c = CString::new(path).expect("path has no NUL bytes");
        let conf = ComponentConf {
            name: name_c.as_ptr(),
            path: path_c.as_ptr(),
            parent: component_id.index() as u32,
            config: config as *const ConfigNode,
        };

        let component = unsafe {
            if let Ok(preferred) = library.get::<PreferredFactoryFn>(b"gv_new\0") {
                Box::from_raw(preferred(&conf as *const ComponentConf))
            } else if let Ok(legacy) = library.get::<LegacyFactoryFn>(b"vp_constructor\0") {
                Box::from_raw(legacy(config as *const ConfigNode))
            } else {
                return Err(VpError::FactoryMissing {
                    module: module_name.to_string(),
                });
            }
        };

        self.loaded_libraries.push(library);
        Ok(component)
    }
}

/// Opens a module library with the same visibility the system this loader is
/// modeled on uses: on unix, `RTLD_NOW | RTLD_GLOBAL | RTLD_DEEPBIND`, so a
/// model's symbols are visible to libraries loaded after it and preferably
/// resolved against its own definitions rather than an earlier-loaded
/// library's. `libloading::Library::new` alone would resolve to
/// `RTLD_NOW | RTLD_LOCAL`, hiding a model's symbols from its siblings.
#[cfg(unix)]
fn open_library(path: &Path) -> Result<libloading::Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
    // glibc-specific; not one of libloading's portable flag constants.
    const RTLD_DEEPBIND: std::os::raw::c_int = 0x0008;
    unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL | RTLD_DEEPBIND) }.map(libloading::Library::from)
}

#[cfg(not(unix))]
fn open_library(path: &Path) -> Result<libloading::Library, libloading::Error> {
    unsafe { libloading::Library::new(path) }
}

/// Probes `dir` for the mode-tagged file name a module would resolve to,
/// without loading anything. Exposed for tests and `vplat-cli --probe`.
pub fn probe_path(dir: &Path, module_name: &str, mode: BuildMode) -> PathBuf {
    let file_name = format!(
        "{}{}{}",
        mode.tag_prefix(),
        module_name.replace('.', "/"),
        std::env::consts::DLL_SUFFIX
    );
    dir.join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_resolution_probes_include_dirs_in_order() {
        let tmp_a = tempfile::tempdir().unwrap();
        let tmp_b = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp_a.path().join("debug/cpu")).unwrap();
        std::fs::create_dir_all(tmp_b.path().join("debug/cpu")).unwrap();
        let file_name = format!("core{}", std::env::consts::DLL_SUFFIX);
        std::fs::write(tmp_b.path().join("debug/cpu").join(&file_name), b"").unwrap();

        let loader = ModuleLoader::new(vec![tmp_a.path().into(), tmp_b.path().into()], BuildMode::Debug);
        let resolved = loader.resolve_path("cpu.core").unwrap();
        assert_eq!(resolved, tmp_b.path().join("debug/cpu").join(&file_name));
    }

    #[test]
    fn module_not_found_lists_every_searched_path() {
        let tmp_a = tempfile::tempdir().unwrap();
        let loader = ModuleLoader::new(vec![tmp_a.path().into()], BuildMode::Release);
        let err = loader.resolve_path("missing.module").unwrap_err();
        match err {
            VpError::ModuleNotFound { searched, .. } => assert_eq!(searched.len(), 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test_case::test_case(BuildMode::Release, "core.so"; "release has no tag prefix")]
    #[test_case::test_case(BuildMode::Debug, "debug.core.so"; "debug is tagged")]
    #[test_case::test_case(BuildMode::M32, "m32.core.so"; "m32 is tagged")]
    #[test_case::test_case(BuildMode::DebugM32, "debug_m32.core.so"; "debug_m32 is tagged")]
    fn build_mode_tags_the_probed_file_name(mode: BuildMode, expected_suffix_on_linux: &str) {
        let dir = Path::new("/libs");
        let probed = probe_path(dir, "core", mode);
        if std::env::consts::DLL_SUFFIX == ".so" {
            assert_eq!(probed, dir.join(expected_suffix_on_linux));
        } else {
            assert!(probed.to_string_lossy().ends_with(std::env::consts::DLL_SUFFIX));
        }
    }

    #[test]
    fn static_registry_is_tried_before_dynamic_loading() {
        fn trivial_factory(_name: &str, _config: &ConfigNode) -> Box<dyn Component> {
            Box::new(crate::component::CompositeModel::default())
        }
        let mut loader = ModuleLoader::new(vec![], BuildMode::Release);
        loader.register_static("utils.composite_impl", trivial_factory);
        let result = loader.instantiate(
            "utils.composite_impl",
            ComponentId::from_index(0),
            "root",
            &ConfigNode::Null,
        );
        assert!(result.is_ok());
    }
}
