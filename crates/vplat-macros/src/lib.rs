//! Proc-macro glue for model crates: generates the C-ABI factory functions a
//! loadable module must export (see `vplat::loader`).

use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, LitStr, parse_macro_input};

/// Attach to a unit-like model struct (must implement `Default` and
/// `vplat::component::Component`) to export both the legacy `vp_constructor`
/// and the preferred `gv_new` factory symbols from this crate's cdylib.
///
/// A model crate built this way is expected to export exactly one model;
/// both generated symbols are crate-root `#[no_mangle]` functions, the same
/// shape `utils.composite_impl`'s own `vp_constructor` export takes.
///
/// Model-specific configuration is read during `Component::build` (which
/// has access to the component's own config subtree), not at construction,
/// so `Default` is sufficient here.
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let module_name = parse_macro_input!(attr as LitStr);
    let input = parse_macro_input!(item as ItemStruct);
    let ident = &input.ident;

    if module_name.value().is_empty() {
        return syn::Error::new_spanned(&module_name, "module name must not be empty")
            .to_compile_error()
            .into();
    }

    let expanded = quote! {
        #input

        impl #ident {
            /// The dotted module name this model registers under, embedded at
            /// compile time from the `#[model("...")]` attribute argument.
            pub const VP_MODULE_NAME: &'static str = #module_name;
        }

        #[doc(hidden)]
        #[unsafe(no_mangle)]
        pub extern "C" fn vp_constructor(
            _config: *const ::vplat::config::ConfigNode,
        ) -> *mut (dyn ::vplat::component::Component + 'static) {
            let model: ::std::boxed::Box<dyn ::vplat::component::Component> =
                ::std::boxed::Box::new(#ident::default());
            ::std::boxed::Box::into_raw(model)
        }

        #[doc(hidden)]
        #[unsafe(no_mangle)]
        pub extern "C" fn gv_new(
            _conf: *const ::vplat::loader::ComponentConf,
        ) -> *mut (dyn ::vplat::component::Component + 'static) {
            let model: ::std::boxed::Box<dyn ::vplat::component::Component> =
                ::std::boxed::Box::new(#ident::default());
            ::std::boxed::Box::into_raw(model)
        }

        const _: fn() = || {
            fn assert_impls<T: ::std::default::Default + ::vplat::component::Component>() {}
            assert_impls::<#ident>();
        };
    };

    expanded.into()
}
