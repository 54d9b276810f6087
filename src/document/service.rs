//! Service entries for a DID document and their validation policy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::did::{equivalent_id, SERVICE_SEPARATOR};
use crate::error::Err;
use crate::{tracerr, Result};

/// A service endpoint entry in a DID document. Services advertise ways of communicating with the
/// DID subject. Beyond the required fields, entries may carry arbitrary properties; these are
/// preserved verbatim in the flattened map.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    /// Identifier for the service: `<did>;<fragment>`. A bare fragment (or none at all) may be
    /// supplied when adding the service to a document; the document composes the full ID.
    pub id: String,

    /// The service type.
    #[serde(rename = "type")]
    pub type_: String,

    /// The endpoint for the service, commonly a URI but any JSON value is admitted.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub service_endpoint: Value,

    /// Free-form additional properties, preserved verbatim.
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl Service {
    /// Start building a service entry of the given type.
    #[must_use]
    pub fn builder(type_: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder {
            service: Service {
                type_: type_.into(),
                ..Service::default()
            },
        }
    }
}

/// Builder for [`Service`] entries. Assembles the entry without validating it: validation happens
/// when the entry is added to a document.
#[derive(Clone, Debug, Default)]
pub struct ServiceBuilder {
    service: Service,
}

impl ServiceBuilder {
    /// Set the service's ID fragment (or full composite ID).
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.service.id = id.into();
        self
    }

    /// Set the service endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<Value>) -> Self {
        self.service.service_endpoint = endpoint.into();
        self
    }

    /// Attach a free-form property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.service.additional.insert(name.into(), value.into());
        self
    }

    /// Assemble the entry.
    #[must_use]
    pub fn build(self) -> Service {
        self.service
    }
}

/// Validate a candidate service against the services already on the document. The duplicate
/// check runs before the structural checks.
pub(crate) fn assert(candidate: &Service, existing: &[Service]) -> Result<()> {
    assert_id(candidate, existing)?;
    assert_required(candidate)
}

fn assert_id(candidate: &Service, existing: &[Service]) -> Result<()> {
    let collision =
        existing.iter().any(|service| equivalent_id(&service.id, &candidate.id, SERVICE_SEPARATOR));
    if collision {
        tracerr!(Err::DuplicateService, "Service with same {} already exists.", candidate.id);
    }
    Ok(())
}

fn assert_required(candidate: &Service) -> Result<()> {
    if candidate.type_.is_empty() {
        tracerr!(Err::InvalidService, "Service requires `type` to be defined.");
    }
    let missing_endpoint = match &candidate.service_endpoint {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if missing_endpoint {
        tracerr!(Err::InvalidService, "Service requires `serviceEndpoint` to be defined.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const DID: &str = "did:ipid:QmUTE4cxTxihntPEFqTprgbqyyS9YRaRcC8FXp6PACEjFG";

    fn sample(fragment: &str) -> Service {
        Service::builder("myServiceType")
            .id(format!("{DID};{fragment}"))
            .endpoint("http://myserviceendpoint.com")
            .build()
    }

    #[test]
    fn accepts_valid_service() {
        assert(&sample("myServiceId"), &[]).expect("should validate");
    }

    #[test]
    fn duplicate_precedes_structural_checks() {
        let candidate = Service {
            id: format!("{DID};myServiceId"),
            ..Service::default()
        };
        let err = assert(&candidate, &[sample("myServiceId")]).expect_err("should fail");
        assert!(err.is(Err::DuplicateService));
        assert_eq!(
            err.to_string(),
            format!("Service with same {DID};myServiceId already exists.")
        );
    }

    #[test]
    fn required_fields_in_order() {
        let mut candidate = sample("myServiceId");
        candidate.type_ = String::new();
        candidate.service_endpoint = Value::Null;
        let err = assert(&candidate, &[]).expect_err("should fail");
        assert!(err.is(Err::InvalidService));
        assert_eq!(err.to_string(), "Service requires `type` to be defined.");

        candidate.type_ = "myServiceType".to_string();
        let err = assert(&candidate, &[]).expect_err("should fail");
        assert_eq!(err.to_string(), "Service requires `serviceEndpoint` to be defined.");
    }

    #[test]
    fn extra_properties_round_trip() {
        let service = Service::builder("myServiceType")
            .id(format!("{DID};myServiceId"))
            .endpoint("http://myserviceendpoint.com")
            .property("description", "My custom service")
            .build();

        let value = serde_json::to_value(&service).expect("should serialize");
        assert_eq!(value["description"], "My custom service");

        let back: Service = serde_json::from_value(value).expect("should deserialize");
        assert_eq!(back, service);
    }

    #[test]
    fn object_endpoint_is_admitted() {
        let service = Service::builder("myServiceType")
            .id(format!("{DID};myServiceId"))
            .endpoint(json!({"origins": ["https://example.com"]}))
            .build();
        assert(&service, &[]).expect("should validate");
    }
}
