use super::{FoodPayload, ServiceError, ServiceResult, UpdateEmptinessPolicy};

/// Trait for checking request bodies before they reach the store
pub trait Validate {
    fn validate_update(&self, policy: UpdateEmptinessPolicy) -> ServiceResult<()>;
}

impl UpdateEmptinessPolicy {
    /// Whether `payload` counts as carrying no update data
    pub fn is_empty(&self, payload: &FoodPayload) -> bool {
        match self {
            UpdateEmptinessPolicy::Falsy => !payload.has_truthy_field(),
            UpdateEmptinessPolicy::Presence => !payload.has_any_field(),
        }
    }
}

impl Validate for FoodPayload {
    fn validate_update(&self, policy: UpdateEmptinessPolicy) -> ServiceResult<()> {
        if policy.is_empty(self) {
            return Err(ServiceError::EmptyUpdate);
        }
        Ok(())
    }
}
