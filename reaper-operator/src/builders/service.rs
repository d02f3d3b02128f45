//! Service exposing the Reaper web port.

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::child_meta;
use super::deployment::{APP_PORT, APP_PORT_NAME};
use crate::desired::DesiredState;
use crate::labels;

pub fn service_name(reaper_name: &str) -> String {
    format!("{}-reaper-service", reaper_name)
}

pub fn build_service(desired: &DesiredState) -> Service {
    Service {
        metadata: child_meta(desired, service_name(desired.name())),
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                name: Some(APP_PORT_NAME.to_string()),
                port: APP_PORT,
                protocol: Some("TCP".to_string()),
                target_port: Some(IntOrString::String(APP_PORT_NAME.to_string())),
                ..Default::default()
            }]),
            selector: Some(labels::for_reaper(desired.name())),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::fixtures;

    #[test]
    fn test_new_service() {
        let desired = fixtures::memory();
        let service = build_service(&desired);

        assert_eq!(
            service.metadata.name.as_deref(),
            Some("test-reaper-reaper-service")
        );
        assert_eq!(service.metadata.namespace.as_deref(), Some("reaper-test"));

        let spec = service.spec.unwrap();
        assert_eq!(spec.selector, Some(labels::for_reaper("test-reaper")));

        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].port, 8080);
        assert_eq!(ports[0].name.as_deref(), Some("app"));
        assert_eq!(
            ports[0].target_port,
            Some(IntOrString::String("app".to_string()))
        );
    }
}
