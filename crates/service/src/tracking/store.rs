use async_trait::async_trait;

use super::domain::{
    ContactExport, ContactRegistration, LocationRecord, LocationSnapshot, LocationUpdate,
};
use crate::errors::ServiceError;

/// Storage abstraction for contact and location state.
/// Both write operations return the effective user id they stored under.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Overwrites any contact registered under `user_id`.
    async fn register_contact(
        &self,
        user_id: String,
        registration: ContactRegistration,
    ) -> Result<String, ServiceError>;

    /// Replaces the location stored under `user_id`; fields are never merged.
    async fn update_location(
        &self,
        user_id: String,
        update: LocationUpdate,
    ) -> Result<String, ServiceError>;

    /// Every known location joined with its contact, if any.
    async fn get_all_locations(&self) -> Result<LocationSnapshot, ServiceError>;

    async fn get_location(&self, user_id: &str) -> Result<Option<LocationRecord>, ServiceError>;

    /// One entry per registered contact, in first-registration order.
    async fn export_contacts(&self) -> Result<ContactExport, ServiceError>;
}
