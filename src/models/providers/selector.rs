use super::super::config::{ProviderSettings, DEFAULT_HOSTED_MODEL, DEFAULT_SELF_HOSTED_MODEL};
use super::super::ProviderKind;

pub struct ProviderSelector;

impl ProviderSelector {
    // Per-kind model, then the shared default, then the built-in id for the kind
    pub fn model_name(settings: &ProviderSettings, kind: ProviderKind) -> String {
        let specific = match kind {
            ProviderKind::Hosted => settings.hosted.model.as_deref(),
            ProviderKind::SelfHosted => settings.self_hosted.model.as_deref(),
        };

        specific
            .or(settings.default_model.as_deref())
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| match kind {
                ProviderKind::Hosted => DEFAULT_HOSTED_MODEL.to_string(),
                ProviderKind::SelfHosted => DEFAULT_SELF_HOSTED_MODEL.to_string(),
            })
    }
}
