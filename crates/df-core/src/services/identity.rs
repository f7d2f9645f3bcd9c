//! Stable identity assignment for boxes and services.
//!
//! IDs are minted once, when the layout is first built from the topology,
//! and matched (never re-minted) on every later run so instances keep
//! referencing the same layout entries across redeploys.

use std::collections::HashSet;

use crate::models::{BoxDescriptor, BoxSpec, ServiceDescriptor, ServiceSpec};

/// Derive a free ID from a human-facing name: lowercase, spaces to
/// underscores, everything else non-alphanumeric dropped. If the normalized
/// name is taken, `_1`, `_2`, ... are appended until a free one is found.
pub fn mint_id(existing: &HashSet<String>, raw_name: &str) -> String {
    let base: String = raw_name
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c == ' ' {
                Some('_')
            } else if c.is_alphanumeric() || c == '_' {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    if !existing.contains(&base) {
        return base;
    }
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Find the ID of a recorded service equal in name, protocol, and
/// description to the declared one.
///
/// All candidates are scanned and the last match wins; with duplicate
/// entries in the layout this is ambiguous, and the behavior is pinned by
/// test rather than changed.
pub fn match_service<'a>(
    services: &'a [ServiceDescriptor],
    target: &ServiceSpec,
) -> Option<&'a str> {
    let mut found = None;
    for service in services {
        if service.name != target.name {
            continue;
        }
        if service.proxy != target.protocol {
            continue;
        }
        if service.description != target.description {
            continue;
        }
        found = Some(service.id.as_str());
    }
    found
}

/// Find the ID of a recorded box with the same name whose service set
/// covers every declared service of `target`.
pub fn match_box<'a>(layout: &'a [BoxDescriptor], target: &BoxSpec) -> Option<&'a str> {
    let mut found = None;
    for bx in layout {
        if bx.name != target.name {
            continue;
        }
        let all_covered = target
            .services
            .iter()
            .all(|service| match_service(&bx.services, service).is_some());
        if !all_covered {
            continue;
        }
        found = Some(bx.id.as_str());
    }
    found
}

/// First-run layout construction: mint an ID for every declared box and
/// service, in declaration order.
pub fn build_layout(boxes: &[BoxSpec]) -> Vec<BoxDescriptor> {
    let mut box_ids = HashSet::new();
    let mut layout = Vec::with_capacity(boxes.len());
    for spec in boxes {
        let box_id = mint_id(&box_ids, &spec.name);
        box_ids.insert(box_id.clone());

        let mut service_ids = HashSet::new();
        let mut services = Vec::with_capacity(spec.services.len());
        for service in &spec.services {
            let service_id = mint_id(&service_ids, &service.name);
            service_ids.insert(service_id.clone());
            services.push(ServiceDescriptor {
                id: service_id,
                name: service.name.clone(),
                description: service.description.clone(),
                proxy: service.protocol.clone(),
            });
        }

        layout.push(BoxDescriptor {
            id: box_id,
            name: spec.name.clone(),
            services,
        });
    }
    layout
}
