//! What the adapter tells the host framework about itself

use serde::Serialize;

use crate::config::Options;
use crate::exports::EXPORT_NAMES;

pub const ADAPTER_NAME: &str = "ssr-adapter";
/// Module the host loads at runtime to obtain the exports
pub const SERVER_ENTRYPOINT: &str = "ssr-adapter/server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Support {
    Stable,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedFeatures {
    pub hybrid_output: Support,
    pub i18n_domains: Support,
    pub static_output: Support,
    pub server_output: Support,
    pub sharp_image_service: Support,
    pub env_get_secret: Support,
}

impl Default for SupportedFeatures {
    fn default() -> Self {
        Self {
            hybrid_output: Support::Stable,
            i18n_domains: Support::Stable,
            static_output: Support::Stable,
            server_output: Support::Stable,
            sharp_image_service: Support::Stable,
            env_get_secret: Support::Unsupported,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterDescriptor {
    pub name: &'static str,
    pub server_entrypoint: &'static str,
    pub args: Options,
    pub exports: [&'static str; 4],
    pub supported_features: SupportedFeatures,
}

impl AdapterDescriptor {
    pub fn new(args: Options) -> Self {
        Self {
            name: ADAPTER_NAME,
            server_entrypoint: SERVER_ENTRYPOINT,
            args,
            exports: EXPORT_NAMES,
            supported_features: SupportedFeatures::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_json() {
        let json = serde_json::to_value(AdapterDescriptor::new(Options::default())).unwrap();
        assert_eq!(json["name"], "ssr-adapter");
        assert_eq!(json["serverEntrypoint"], "ssr-adapter/server");
        assert_eq!(
            json["exports"],
            serde_json::json!(["stop", "handle", "start", "running"])
        );
        assert_eq!(json["supportedFeatures"]["hybridOutput"], "stable");
        assert_eq!(json["supportedFeatures"]["envGetSecret"], "unsupported");
        assert_eq!(json["args"]["port"], 3000);
    }
}
