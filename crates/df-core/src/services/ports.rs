//! Port band math for new instances.
//!
//! Each instance reserves a contiguous band one port wide per declared
//! service, assigned in layout box order then service order. Bands only
//! ever grow upward from the highest port already in use, so ports are
//! never reused while any record of them persists.

use crate::error::{DeployError, Result};
use crate::models::{BackendMap, BoxSpec};

/// Width of one instance's port band.
pub fn required_ports_per_instance(boxes: &[BoxSpec]) -> u32 {
    boxes.iter().map(|bx| bx.services.len() as u32).sum()
}

/// First port for the next instance: one past the highest port any live
/// service instance uses, clamped to at least `min_port`.
pub fn next_start_port(map: &BackendMap, min_port: u16) -> u32 {
    let mut next = u32::from(min_port);
    for instance in &map.backends {
        for service in &instance.services {
            if let Some(port) = service.port_part() {
                next = next.max(u32::from(port) + 1);
            }
        }
    }
    next
}

/// Reject a batch whose last band would run past `max_port`. Called once
/// per command, before any play is built. The math is widened to `u64` so
/// an absurd instance count reports exhaustion instead of wrapping.
pub fn check_port_budget(
    start_port: u32,
    instance_count: u32,
    band_width: u32,
    max_port: u16,
) -> Result<()> {
    if instance_count == 0 || band_width == 0 {
        return Ok(());
    }
    let end =
        u64::from(start_port) + u64::from(instance_count) * u64::from(band_width) - 1;
    if end > u64::from(max_port) {
        return Err(DeployError::PortExhaustion {
            end,
            max: max_port,
        });
    }
    Ok(())
}
