//! Compose template rendering for one instance.
//!
//! The template is treated as an opaque document apart from each service's
//! port-binding list and its image/build markers. Rendering strips every
//! pre-existing host binding, then binds one explicit
//! `interface:port:container_port` per (box, service) pair, walking the
//! layout in box order and assigning consecutive ports from the instance's
//! start port.

use serde_yaml::{Mapping, Value};

use crate::error::{DeployError, Result};
use crate::models::{BoxDescriptor, BoxSpec, ServiceInstance};
use crate::services::identity;

/// Rendered compose document plus the endpoint records for the backend map.
pub fn render(
    template: &str,
    layout: &[BoxDescriptor],
    boxes: &[BoxSpec],
    interface: &str,
    start_port: u32,
) -> Result<(String, Vec<ServiceInstance>)> {
    let mut document: Value = serde_yaml::from_str(template)?;
    strip_port_bindings(&mut document)?;

    let mut endpoints = Vec::new();
    let mut next_port = start_port;
    let mut matched_boxes = 0usize;

    for bx in layout {
        let Some(spec) = boxes
            .iter()
            .find(|candidate| identity::match_box(layout, candidate) == Some(bx.id.as_str()))
        else {
            return Err(DeployError::ConfigMismatch(format!(
                "layout box '{}' has no topology counterpart",
                bx.id
            )));
        };
        matched_boxes += 1;

        for service in &spec.services {
            let service_id =
                identity::match_service(&bx.services, service).ok_or_else(|| {
                    DeployError::ConfigMismatch(format!(
                        "service '{}' in box '{}' does not match the layout",
                        service.name, spec.name
                    ))
                })?;

            let binding = format!("{interface}:{next_port}:{}", service.port);
            push_binding(&mut document, &spec.name, binding)?;

            endpoints.push(ServiceInstance {
                box_id: bx.id.clone(),
                service_id: service_id.to_string(),
                host: format!("{interface}:{next_port}"),
            });
            next_port += 1;
        }
    }

    if matched_boxes != boxes.len() {
        return Err(DeployError::ConfigMismatch(
            "topology declares boxes absent from the persisted layout".into(),
        ));
    }

    Ok((serde_yaml::to_string(&document)?, endpoints))
}

/// Remove every `ports` list from the template's services.
fn strip_port_bindings(document: &mut Value) -> Result<()> {
    let services = services_map(document)?;
    for (_, service) in services.iter_mut() {
        if let Some(entry) = service.as_mapping_mut() {
            entry.remove("ports");
        }
    }
    Ok(())
}

fn push_binding(document: &mut Value, service_name: &str, binding: String) -> Result<()> {
    let services = services_map(document)?;
    let entry = services
        .get_mut(service_name)
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| {
            DeployError::ConfigMismatch(format!(
                "compose template has no service '{service_name}'"
            ))
        })?;
    let ports = entry
        .entry(Value::String("ports".into()))
        .or_insert_with(|| Value::Sequence(Vec::new()));
    let Some(sequence) = ports.as_sequence_mut() else {
        return Err(DeployError::InvalidConfig(format!(
            "ports of compose service '{service_name}' is not a list"
        )));
    };
    sequence.push(Value::String(binding));
    Ok(())
}

fn services_map(document: &mut Value) -> Result<&mut Mapping> {
    document
        .get_mut("services")
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| {
            DeployError::InvalidConfig("compose template has no services mapping".into())
        })
}

/// Image references declared in the template, in document order.
pub fn image_references(template: &str) -> Result<Vec<String>> {
    let document: Value = serde_yaml::from_str(template)?;
    let mut images = Vec::new();
    if let Some(services) = document.get("services").and_then(Value::as_mapping) {
        for (_, service) in services {
            if let Some(image) = service.get("image").and_then(Value::as_str) {
                images.push(image.to_string());
            }
        }
    }
    Ok(images)
}

/// Whether any service carries a `build` section.
pub fn has_buildable_services(template: &str) -> Result<bool> {
    let document: Value = serde_yaml::from_str(template)?;
    let buildable = document
        .get("services")
        .and_then(Value::as_mapping)
        .is_some_and(|services| {
            services
                .iter()
                .any(|(_, service)| service.get("build").is_some())
        });
    Ok(buildable)
}
