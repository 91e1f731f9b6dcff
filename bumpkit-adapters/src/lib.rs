pub mod cargo;
pub mod constraint;
pub mod js;

pub use cargo::CargoAdapter;
pub use constraint::rewrite_constraint;
pub use js::JsAdapter;

use bumpkit_core::adapter::ManifestAdapter;
use bumpkit_core::package::ManifestKind;

pub fn get_adapter(kind: ManifestKind) -> Box<dyn ManifestAdapter> {
    match kind {
        ManifestKind::Js => Box::new(JsAdapter),
        ManifestKind::Cargo => Box::new(CargoAdapter),
    }
}

/// One adapter per supported manifest format, for workspace scanning.
pub fn all_adapters() -> Vec<Box<dyn ManifestAdapter>> {
    vec![Box::new(JsAdapter), Box::new(CargoAdapter)]
}
