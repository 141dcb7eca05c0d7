//! Host facade and platform factory
//!
//! `Net` owns the handle registry and the command runner. Only the
//! Linux iproute2 backend exists; other platforms fail fast at
//! construction instead of misbehaving at the first operation.

use std::sync::Arc;

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::iface::{self, Iface, TunTapMode};
use crate::listing::{self, LinkEntry};
use crate::registry::{LinkKind, Registry};
use crate::runner::{CommandRunner, HostRunner};

pub struct Net {
    registry: Registry,
}

impl Net {
    /// Backend for the running host
    pub fn host(runner: HostRunner) -> Result<Self> {
        if !cfg!(target_os = "linux") {
            return Err(Error::UnsupportedPlatform(std::env::consts::OS.to_string()));
        }
        Ok(Self::with_runner(Arc::new(runner)))
    }

    /// Build against an injected runner (tests, alternative transports)
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            registry: Registry::new(runner),
        }
    }

    /// Canonical handle for a named interface; no OS-level side effect
    pub fn iface(&self, name: &str) -> Iface {
        Iface::from_state(
            self.registry.clone(),
            self.registry.get_or_create(LinkKind::Iface, name),
        )
    }

    /// Canonical handle for a named bridge; no OS-level side effect
    pub fn bridge(&self, name: &str) -> Bridge {
        Bridge::lookup(&self.registry, name)
    }

    /// Create a TUN or TAP device owned by `user`
    pub fn create_tuntap(&self, name: &str, user: &str, mode: TunTapMode) -> Result<Iface> {
        let out = iface::run_ip(
            self.registry.runner().as_ref(),
            &["tuntap", "add", "dev", name, "mode", mode.as_str(), "user", user],
        )?;
        if !out.success() {
            let stderr = out.stderr.trim().to_string();
            return Err(match out.exit_code() {
                1 | 2 => Error::AlreadyExists(stderr),
                255 => Error::IllegalName(stderr),
                code => Error::UnknownBackend { code, stderr },
            });
        }
        Ok(self.iface(name))
    }

    /// Create a bridge device
    pub fn create_bridge(&self, name: &str) -> Result<Bridge> {
        let out = iface::run_ip(
            self.registry.runner().as_ref(),
            &["link", "add", "name", name, "type", "bridge"],
        )?;
        if !out.success() {
            let stderr = out.stderr.trim().to_string();
            return Err(match out.exit_code() {
                2 => Error::AlreadyExists(stderr),
                255 => Error::IllegalName(stderr),
                code => Error::UnknownBackend { code, stderr },
            });
        }
        Ok(self.bridge(name))
    }

    /// Existing bridge handle if present, otherwise create it
    ///
    /// The probe is advisory: a racing create still surfaces as
    /// `AlreadyExists` from the create path.
    pub fn get_or_create_bridge(&self, name: &str) -> Result<Bridge> {
        let bridge = self.bridge(name);
        if bridge.exists()? {
            return Ok(bridge);
        }
        self.create_bridge(name)
    }

    /// All link devices the backend reports, with their bridge relations
    pub fn list_links(&self) -> Result<Vec<LinkEntry>> {
        let out = iface::run_ip(self.registry.runner().as_ref(), &["link", "show"])?;
        if !out.success() {
            return Err(Error::UnknownBackend {
                code: out.exit_code(),
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(listing::parse_listing(&out.stdout))
    }
}
