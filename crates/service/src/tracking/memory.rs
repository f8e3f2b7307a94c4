use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::domain::{
    ContactExport, ContactRecord, ContactRegistration, ContactSummary, LastLocationUpdate,
    LocationRecord, LocationSnapshot, LocationUpdate, TrackedLocation,
};
use super::store::TrackingStore;
use crate::errors::ServiceError;

#[derive(Debug, Default)]
struct TrackingState {
    locations: HashMap<String, LocationRecord>,
    contacts: HashMap<String, ContactRecord>,
    // ids in first-registration order; re-registration keeps the original slot
    registration_order: Vec<String>,
}

/// Process-memory store. Both maps sit behind one lock; nothing is ever evicted.
#[derive(Debug, Default)]
pub struct MemoryTrackingStore {
    inner: RwLock<TrackingState>,
}

impl MemoryTrackingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn location_count(&self) -> usize {
        self.inner.read().await.locations.len()
    }

    pub async fn contact_count(&self) -> usize {
        self.inner.read().await.contacts.len()
    }
}

#[async_trait]
impl TrackingStore for MemoryTrackingStore {
    async fn register_contact(
        &self,
        user_id: String,
        registration: ContactRegistration,
    ) -> Result<String, ServiceError> {
        let record = registration.into_record(Utc::now());
        let mut state = self.inner.write().await;
        if state.contacts.insert(user_id.clone(), record).is_none() {
            state.registration_order.push(user_id.clone());
        } else {
            debug!(%user_id, "contact re-registered");
        }
        Ok(user_id)
    }

    async fn update_location(
        &self,
        user_id: String,
        update: LocationUpdate,
    ) -> Result<String, ServiceError> {
        let record = update.into_record(Utc::now());
        let mut state = self.inner.write().await;
        let replaced = state.locations.insert(user_id.clone(), record).is_some();
        debug!(%user_id, replaced, "location stored");
        Ok(user_id)
    }

    async fn get_all_locations(&self) -> Result<LocationSnapshot, ServiceError> {
        let state = self.inner.read().await;
        let locations = state
            .locations
            .iter()
            .map(|(id, location)| {
                let tracked = TrackedLocation {
                    location: location.clone(),
                    contact: state.contacts.get(id).cloned(),
                };
                (id.clone(), tracked)
            })
            .collect::<std::collections::BTreeMap<_, _>>();
        let count = locations.len();
        Ok(LocationSnapshot { locations, count })
    }

    async fn get_location(&self, user_id: &str) -> Result<Option<LocationRecord>, ServiceError> {
        let state = self.inner.read().await;
        Ok(state.locations.get(user_id).cloned())
    }

    async fn export_contacts(&self) -> Result<ContactExport, ServiceError> {
        let state = self.inner.read().await;
        let mut contacts = Vec::with_capacity(state.registration_order.len());
        for id in &state.registration_order {
            let contact = state
                .contacts
                .get(id)
                .ok_or_else(|| ServiceError::internal(format!("contact {id} missing from registry")))?;
            let location = state.locations.get(id);
            contacts.push(ContactSummary {
                name: contact.name.clone(),
                phone: contact.phone.clone(),
                registered_at: contact.registered_at,
                has_location: location.is_some(),
                last_location_update: location
                    .map(|l| LastLocationUpdate::At(l.timestamp))
                    .unwrap_or(LastLocationUpdate::Never),
            });
        }
        let total_registered = contacts.len();
        Ok(ContactExport { contacts, total_registered })
    }
}
