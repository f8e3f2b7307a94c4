use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::errors::ServiceError;

pub const UNKNOWN: &str = "unknown";
pub const MISSING_CONTACT_FIELDS: &str = "Missing name or phone number";
pub const MISSING_COORDINATES: &str = "Missing latitude or longitude";
pub const INVALID_BODY: &str = "Invalid JSON body";

/// Reported accuracy of a fix: meters when the device knows it, free text otherwise.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Accuracy {
    Meters(f64),
    Label(String),
}

impl Default for Accuracy {
    fn default() -> Self { Self::Label(UNKNOWN.to_string()) }
}

impl Accuracy {
    /// Numbers become meters, strings are kept verbatim, anything else is unknown.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).map(Self::Meters).unwrap_or_default(),
            Some(Value::String(s)) => Self::Label(s.clone()),
            _ => Self::default(),
        }
    }
}

/// Latest known position of one user. Replaced wholesale on every update.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LocationRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Accuracy,
    pub altitude: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ContactRecord {
    pub name: String,
    pub phone: String,
    pub registered_at: DateTime<Utc>,
}

/// Body of `POST /api/register_user`. Every field is optional here so that
/// missing ones surface as validation errors instead of decode failures.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegisterContactPayload {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub user_id: Option<String>,
}

/// Body of `POST /api/update_location`. Sensor fields are taken as raw JSON:
/// a badly typed optional reading is dropped, it never fails the update.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateLocationPayload {
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    pub accuracy: Option<Value>,
    pub altitude: Option<Value>,
    pub heading: Option<Value>,
    pub speed: Option<Value>,
    pub user_id: Option<String>,
}

/// A validated contact registration; only constructible through [`ContactRegistration::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactRegistration {
    name: String,
    phone: String,
}

impl ContactRegistration {
    pub fn new(name: Option<&str>, phone: Option<&str>) -> Result<Self, ServiceError> {
        let name = name.map(str::trim).unwrap_or_default();
        let phone = phone.map(str::trim).unwrap_or_default();
        if name.is_empty() || phone.is_empty() {
            return Err(ServiceError::validation(MISSING_CONTACT_FIELDS));
        }
        Ok(Self { name: name.to_string(), phone: phone.to_string() })
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn phone(&self) -> &str { &self.phone }

    pub(crate) fn into_record(self, registered_at: DateTime<Utc>) -> ContactRecord {
        ContactRecord { name: self.name, phone: self.phone, registered_at }
    }
}

impl RegisterContactPayload {
    pub fn validate(&self) -> Result<ContactRegistration, ServiceError> {
        ContactRegistration::new(self.name.as_deref(), self.phone.as_deref())
    }
}

/// A validated location update, stamped by the store when applied.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Accuracy,
    pub altitude: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub user_agent: String,
}

impl LocationUpdate {
    pub(crate) fn into_record(self, timestamp: DateTime<Utc>) -> LocationRecord {
        LocationRecord {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.accuracy,
            altitude: self.altitude,
            heading: self.heading,
            speed: self.speed,
            timestamp,
            user_agent: self.user_agent,
        }
    }
}

impl UpdateLocationPayload {
    /// `user_agent` comes from the request headers, not the body.
    pub fn validate(&self, user_agent: Option<&str>) -> Result<LocationUpdate, ServiceError> {
        let latitude = parse_coordinate("latitude", self.latitude.as_ref())?;
        let longitude = parse_coordinate("longitude", self.longitude.as_ref())?;
        let user_agent = user_agent
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();
        Ok(LocationUpdate {
            latitude,
            longitude,
            accuracy: Accuracy::from_json(self.accuracy.as_ref()),
            altitude: optional_reading(self.altitude.as_ref()),
            heading: optional_reading(self.heading.as_ref()),
            speed: optional_reading(self.speed.as_ref()),
            user_agent,
        })
    }
}

/// Accepts JSON numbers and numeric strings; rejects everything else, including NaN and infinities.
pub fn parse_coordinate(field: &str, value: Option<&Value>) -> Result<f64, ServiceError> {
    let parsed = match value {
        None | Some(Value::Null) => return Err(ServiceError::validation(MISSING_COORDINATES)),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ServiceError::validation(format!("{field} must be a number"))),
    }
}

/// Same number rules as coordinates, but anything unusable is just absent.
pub fn optional_reading(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// The client-supplied id if it is non-blank, otherwise the caller's address.
///
/// Callers sharing an address share an id; nothing here tells them apart.
pub fn resolve_user_id(supplied: Option<&str>, caller: &str) -> String {
    match supplied {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => caller.to_string(),
    }
}

/// One row of the tracker map: the location plus the contact registered under the same id.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TrackedLocation {
    #[serde(flatten)]
    pub location: LocationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactRecord>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct LocationSnapshot {
    pub locations: BTreeMap<String, TrackedLocation>,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LastLocationUpdate {
    At(DateTime<Utc>),
    Never,
}

impl Serialize for LastLocationUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::At(ts) => ts.serialize(serializer),
            Self::Never => serializer.serialize_str("Never"),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ContactSummary {
    pub name: String,
    pub phone: String,
    pub registered_at: DateTime<Utc>,
    pub has_location: bool,
    pub last_location_update: LastLocationUpdate,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ContactExport {
    pub contacts: Vec<ContactSummary>,
    pub total_registered: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> UpdateLocationPayload {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn contact_registration_trims_and_rejects_blank() {
        let reg = ContactRegistration::new(Some("  Ada "), Some(" 555-1234\n")).unwrap();
        assert_eq!(reg.name(), "Ada");
        assert_eq!(reg.phone(), "555-1234");

        let err = ContactRegistration::new(None, Some("555-1234")).unwrap_err();
        assert!(err.is_validation());
        assert!(ContactRegistration::new(Some("   "), Some("555")).is_err());
        assert!(ContactRegistration::new(Some("Ada"), Some("")).is_err());
    }

    #[test]
    fn coordinates_accept_numbers_and_numeric_strings() {
        let upd = payload(json!({"latitude": 37.7, "longitude": " -122.4 "})).validate(None).unwrap();
        assert_eq!(upd.latitude, 37.7);
        assert_eq!(upd.longitude, -122.4);
        assert_eq!(upd.accuracy, Accuracy::Label("unknown".into()));
        assert_eq!(upd.user_agent, "unknown");
        assert_eq!(upd.altitude, None);
    }

    #[test]
    fn coordinates_reject_missing_and_malformed() {
        let missing = payload(json!({"latitude": 1.0})).validate(None).unwrap_err();
        assert_eq!(missing.to_string(), format!("validation error: {MISSING_COORDINATES}"));

        for bad in [json!("abc"), json!(true), json!([1]), json!("NaN"), json!("inf")] {
            let err = payload(json!({"latitude": bad, "longitude": 2.0})).validate(None).unwrap_err();
            assert!(err.is_validation(), "expected rejection");
        }
        assert!(payload(json!({"latitude": null, "longitude": 2.0})).validate(None).is_err());
    }

    #[test]
    fn optional_fields_and_user_agent_carry_through() {
        let upd = payload(json!({
            "latitude": 1, "longitude": 2, "accuracy": 12.5,
            "altitude": 30.0, "heading": 90.0, "speed": 1.5
        }))
        .validate(Some("Mozilla/5.0"))
        .unwrap();
        assert_eq!(upd.accuracy, Accuracy::Meters(12.5));
        assert_eq!(upd.altitude, Some(30.0));
        assert_eq!(upd.heading, Some(90.0));
        assert_eq!(upd.speed, Some(1.5));
        assert_eq!(upd.user_agent, "Mozilla/5.0");
    }

    #[test]
    fn badly_typed_optional_fields_are_dropped_not_rejected() {
        let upd = payload(json!({
            "latitude": 1, "longitude": 2, "altitude": "12.5",
            "heading": "north", "speed": [1], "accuracy": "high"
        }))
        .validate(None)
        .unwrap();
        assert_eq!(upd.altitude, Some(12.5));
        assert_eq!(upd.heading, None);
        assert_eq!(upd.speed, None);
        assert_eq!(upd.accuracy, Accuracy::Label("high".into()));

        let upd = payload(json!({"latitude": 1, "longitude": 2, "accuracy": {"m": 3}, "speed": "inf"}))
            .validate(None)
            .unwrap();
        assert_eq!(upd.accuracy, Accuracy::default());
        assert_eq!(upd.speed, None);
    }

    #[test]
    fn user_id_falls_back_to_caller() {
        assert_eq!(resolve_user_id(Some("u1"), "10.0.0.1"), "u1");
        assert_eq!(resolve_user_id(None, "10.0.0.1"), "10.0.0.1");
        assert_eq!(resolve_user_id(Some("  "), "10.0.0.1"), "10.0.0.1");
    }

    #[test]
    fn last_location_update_serializes_never() {
        assert_eq!(serde_json::to_value(LastLocationUpdate::Never).unwrap(), json!("Never"));
        let ts = Utc::now();
        assert_eq!(
            serde_json::to_value(LastLocationUpdate::At(ts)).unwrap(),
            serde_json::to_value(ts).unwrap()
        );
    }

    #[test]
    fn tracked_location_omits_missing_contact() {
        let loc = LocationUpdate {
            latitude: 1.0,
            longitude: 2.0,
            accuracy: Accuracy::default(),
            altitude: None,
            heading: None,
            speed: None,
            user_agent: UNKNOWN.into(),
        }
        .into_record(Utc::now());
        let v = serde_json::to_value(TrackedLocation { location: loc, contact: None }).unwrap();
        assert_eq!(v["latitude"], json!(1.0));
        assert_eq!(v["altitude"], Value::Null);
        assert!(v.get("contact").is_none());
    }
}
