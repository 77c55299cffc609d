pub mod address_resolver;
pub mod asset_scheme_resolver;

pub use address_resolver::{AddressResolver, StandardAddressResolver};
pub use asset_scheme_resolver::AssetSchemeResolver;
