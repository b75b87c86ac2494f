// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content protection toggle.
//!
//! Switching a channel into protected mode is a privileged call into the
//! secure monitor. It is expensive, so the caller only issues it when the
//! requested state differs from the one last accepted.

use dpp_core::id::ChannelId;

/// Errors reported by a [`SecureMonitor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtectionError {
    /// The monitor rejected the request with a firmware status code.
    #[error("secure monitor refused with status {0:#x}")]
    Refused(u32),
    /// No monitor is reachable.
    #[error("secure monitor unavailable")]
    Unavailable,
}

/// Privileged protection switch.
pub trait SecureMonitor: Send {
    /// Switches `channel` into or out of protected mode.
    fn set_protection(&mut self, channel: ChannelId, enable: bool) -> Result<(), ProtectionError>;
}

/// Monitor for platforms without content protection.
///
/// Accepts disabling and refuses enabling.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSecureMonitor;

impl SecureMonitor for NoSecureMonitor {
    fn set_protection(&mut self, channel: ChannelId, enable: bool) -> Result<(), ProtectionError> {
        _ = channel;
        if enable {
            Err(ProtectionError::Unavailable)
        } else {
            Ok(())
        }
    }
}

/// Brings `current` to `wanted`, calling the monitor only on change.
///
/// Returns `None` when no call was made, otherwise whether the monitor
/// accepted. On refusal `current` keeps its previous value.
pub(crate) fn sync(
    monitor: &mut dyn SecureMonitor,
    channel: ChannelId,
    current: &mut bool,
    wanted: bool,
) -> Option<bool> {
    if *current == wanted {
        return None;
    }
    let accepted = monitor.set_protection(channel, wanted).is_ok();
    if accepted {
        *current = wanted;
    }
    Some(accepted)
}
