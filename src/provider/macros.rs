use super::{Provider, ProviderInfo};
use crate::Result;

/// Internal registration structure used by the macro.
#[doc(hidden)]
pub struct ProviderRegistration {
    pub info: ProviderInfo,
    pub schemes: &'static [&'static str],
    pub factory: fn(&url::Url) -> Result<Box<dyn Provider>>,
}

/// Distributed slice that collects all provider registrations.
#[doc(hidden)]
#[linkme::distributed_slice]
pub static PROVIDER_REGISTRY: [ProviderRegistration];

/// Declarative macro for registering providers.
///
/// The provider's config type must implement `TryFrom<&Url>`, and the provider
/// must expose `fn new(config) -> Result<Self>`; a failing `new` surfaces as a
/// provider initialization error.
///
/// # Usage
///
/// ```ignore
/// register_provider! {
///     struct: GcpProvider,
///     config: GcpConfig,
///     name: "gcp",
///     description: "Google Cloud Secret Manager",
///     schemes: ["gcp"],
///     examples: ["gcp://", "gcp://my-project"],
/// }
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! register_provider {
    (
        struct: $struct_name:ident,
        config: $config_type:ty,
        name: $name:expr,
        description: $description:expr,
        schemes: [$($scheme:expr),* $(,)?],
        examples: [$($example:expr),* $(,)?] $(,)?
    ) => {
        impl $struct_name {
            const PROVIDER_NAME: &'static str = $name;
        }

        const _: () = {
            #[linkme::distributed_slice($crate::provider::PROVIDER_REGISTRY)]
            #[doc(hidden)]
            static PROVIDER_REGISTRATION: $crate::provider::ProviderRegistration = $crate::provider::ProviderRegistration {
                info: $crate::provider::ProviderInfo {
                    name: $name,
                    description: $description,
                    examples: &[$($example,)*],
                },
                schemes: &[$($scheme,)*],
                factory: |url| {
                    let config = <$config_type>::try_from(url)?;
                    Ok(Box::new(<$struct_name>::new(config)?))
                },
            };
        };
    };
}
