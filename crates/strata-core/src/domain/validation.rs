use crate::domain::{
    entities::{LayerKind, LayerPlan, TemplateConfig},
    error::DomainError,
};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across services.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_template(config: &TemplateConfig) -> Result<(), DomainError> {
        config.validate()
    }

    /// The main layer comes first, then extensions, then components.
    pub fn validate_layer_order(layers: &[LayerPlan]) -> Result<(), DomainError> {
        let rank = |kind: &LayerKind| match kind {
            LayerKind::Existing => 0,
            LayerKind::Main => 1,
            LayerKind::Extension(_) => 2,
            LayerKind::Component(_) => 3,
        };

        if layers.first().map(|l| &l.kind) != Some(&LayerKind::Main) {
            return Err(DomainError::InvalidTemplate(
                "Layer stack must start with the main template".into(),
            ));
        }
        if layers.windows(2).any(|w| rank(&w[0].kind) > rank(&w[1].kind)) {
            return Err(DomainError::InvalidTemplate(
                "Extensions must precede components in the layer stack".into(),
            ));
        }
        Ok(())
    }
}
