//! Network interface handles and iproute2-backed operations
//!
//! A handle is a cheap clone of the canonical registry state; equality
//! between handles is identity of that state. Existence and bridge
//! membership are always queried live, never cached.

use std::fmt;
use std::sync::Arc;

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::listing;
use crate::registry::{LinkState, Registry};
use crate::runner::{CommandRunner, ToolOutput};
use crate::sysctl::SystemControl;

/// TUN/TAP device mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunTapMode {
    /// Ethernet-layer device
    Tap,
    /// IP-layer device
    Tun,
}

impl TunTapMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TunTapMode::Tap => "tap",
            TunTapMode::Tun => "tun",
        }
    }
}

impl fmt::Display for TunTapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoke the link-config tool
pub(crate) fn run_ip(runner: &dyn CommandRunner, args: &[&str]) -> Result<ToolOutput> {
    runner.run("ip", args)
}

/// Live existence probe; any failure of the query reads as "not present"
pub(crate) fn probe(runner: &dyn CommandRunner, name: &str) -> Result<bool> {
    Ok(run_ip(runner, &["link", "show", "dev", name])?.success())
}

/// Remove the OS-level device
pub(crate) fn delete_link(runner: &dyn CommandRunner, name: &str) -> Result<()> {
    let out = run_ip(runner, &["link", "delete", name])?;
    if out.success() {
        Ok(())
    } else {
        Err(Error::UnknownBackend {
            code: out.exit_code(),
            stderr: out.stderr.trim().to_string(),
        })
    }
}

/// Handle to one link-layer device
#[derive(Clone)]
pub struct Iface {
    registry: Registry,
    state: Arc<LinkState>,
}

impl Iface {
    pub(crate) fn from_state(registry: Registry, state: Arc<LinkState>) -> Self {
        Self { registry, state }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    fn runner(&self) -> Arc<dyn CommandRunner> {
        self.registry.runner()
    }

    /// Whether the backend currently reports this link
    pub fn exists(&self) -> Result<bool> {
        probe(self.runner().as_ref(), self.name())
    }

    /// Delete the OS-level device
    ///
    /// The in-process handle stays valid; `exists` reports false afterwards.
    pub fn delete(&self) -> Result<()> {
        delete_link(self.runner().as_ref(), self.name())
    }

    /// Bridge this device is currently enslaved to
    ///
    /// A failed query reads as "not bridged". Membership is advisory
    /// either way: another process may re-bridge the device between calls.
    pub fn bridge(&self) -> Option<Bridge> {
        let out = run_ip(
            self.runner().as_ref(),
            &["link", "show", "dev", self.name()],
        )
        .ok()?;
        if !out.success() {
            return None;
        }
        let master = listing::find_master(&out.stdout)?;
        Some(Bridge::lookup(&self.registry, &master))
    }

    /// System-control handle for this interface, created on first use
    ///
    /// Construction reads the global forwarding flag once; the handle is
    /// cached so later calls observe the same captured state.
    pub fn sysctl(&self) -> Result<Arc<SystemControl>> {
        let mut slot = self.state.sysctl.lock().unwrap();
        if let Some(sysctl) = slot.as_ref() {
            return Ok(sysctl.clone());
        }
        let sysctl = Arc::new(SystemControl::new(self.name(), self.runner())?);
        *slot = Some(sysctl.clone());
        Ok(sysctl)
    }

    // Capability surface kept for forward compatibility. The iproute2
    // backend leaves these untouched: tuntap devices come up as needed
    // and addressing is scripted out-of-band.

    /// No-op on the iproute2 backend
    #[allow(dead_code)]
    pub fn link_set_up(&self) -> Result<()> {
        Ok(())
    }

    /// No-op on the iproute2 backend
    #[allow(dead_code)]
    pub fn link_set_down(&self) -> Result<()> {
        Ok(())
    }

    /// No-op on the iproute2 backend
    #[allow(dead_code)]
    pub fn add_address(&self, _addr: &str, _prefix_len: u8) -> Result<()> {
        Ok(())
    }

    /// No-op on the iproute2 backend
    #[allow(dead_code)]
    pub fn remove_address(&self, _addr: &str, _prefix_len: u8) -> Result<()> {
        Ok(())
    }

    /// No-op on the iproute2 backend
    #[allow(dead_code)]
    pub fn add_route(&self, _route: &str, _next_hop: Option<&str>) -> Result<()> {
        Ok(())
    }

    /// No-op on the iproute2 backend
    #[allow(dead_code)]
    pub fn remove_route(&self, _route: &str, _next_hop: Option<&str>) -> Result<()> {
        Ok(())
    }
}

impl PartialEq for Iface {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for Iface {}

impl fmt::Display for Iface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Iface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Iface: {}>", self.name())
    }
}
