//! Owner references from children to their Reaper.

use kube::Resource;

use crate::desired::DesiredState;
use crate::error::Error;

/// Make the Reaper in `desired` the controller of `child`, so the child is
/// garbage-collected with it.
pub fn attach_owner<K: Resource>(mut child: K, desired: &DesiredState) -> Result<K, Error> {
    let owner = desired
        .owner
        .clone()
        .ok_or_else(|| Error::OwnerReference(desired.key.to_string()))?;

    let refs = child.meta_mut().owner_references.get_or_insert_with(Vec::new);
    refs.retain(|r| r.uid != owner.uid);
    refs.push(owner);
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{build_service, fixtures};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    fn owner() -> OwnerReference {
        OwnerReference {
            api_version: "reaper.cassandra-reaper.io/v1alpha1".to_string(),
            kind: "Reaper".to_string(),
            name: "test-reaper".to_string(),
            uid: "uid-1".to_string(),
            controller: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn attaches_controller_reference_once() {
        let mut desired = fixtures::memory();
        desired.owner = Some(owner());

        let service = attach_owner(build_service(&desired), &desired).unwrap();
        let service = attach_owner(service, &desired).unwrap();

        assert_eq!(service.metadata.owner_references, Some(vec![owner()]));
    }

    #[test]
    fn parent_without_uid_fails() {
        let desired = fixtures::memory();
        let err = attach_owner(build_service(&desired), &desired).unwrap_err();
        assert!(matches!(err, Error::OwnerReference(_)));
    }
}
