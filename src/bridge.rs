//! Bridge handles and member management
//!
//! A bridge is a link device with a member set. The member set is never
//! cached: every query re-runs the listing, since membership can change
//! under this process at any time.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::iface::{self, Iface};
use crate::listing;
use crate::registry::{LinkKind, LinkState, Registry};
use crate::runner::CommandRunner;

/// Handle to one bridge device
#[derive(Clone)]
pub struct Bridge {
    registry: Registry,
    state: Arc<LinkState>,
}

impl Bridge {
    /// Canonical handle for a named bridge; no OS-level side effect
    pub(crate) fn lookup(registry: &Registry, name: &str) -> Self {
        Self {
            registry: registry.clone(),
            state: registry.get_or_create(LinkKind::Bridge, name),
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    fn runner(&self) -> Arc<dyn CommandRunner> {
        self.registry.runner()
    }

    /// Whether the backend currently reports this bridge
    pub fn exists(&self) -> Result<bool> {
        iface::probe(self.runner().as_ref(), self.name())
    }

    /// Delete the OS-level bridge
    pub fn delete(&self) -> Result<()> {
        iface::delete_link(self.runner().as_ref(), self.name())
    }

    /// Attach a device to this bridge
    ///
    /// Enslaving a bridge to a bridge is rejected by the backend and
    /// surfaces as `IllegalOperation`, distinct from a bad or missing
    /// device name.
    pub fn add_member(&self, member: &Iface) -> Result<()> {
        let out = iface::run_ip(
            self.runner().as_ref(),
            &["link", "set", "dev", member.name(), "master", self.name()],
        )?;
        if out.success() {
            return Ok(());
        }
        let stderr = out.stderr.trim().to_string();
        Err(match out.exit_code() {
            1 | 255 => Error::IllegalName(stderr),
            2 => Error::IllegalOperation(stderr),
            code => Error::UnknownBackend { code, stderr },
        })
    }

    /// Detach a device from this bridge
    ///
    /// Issues no external call when the device is not currently a member
    /// of this bridge.
    pub fn remove_member(&self, member: &Iface) -> Result<()> {
        if member.bridge().as_ref() != Some(self) {
            return Ok(());
        }
        let out = iface::run_ip(
            self.runner().as_ref(),
            &["link", "set", "dev", member.name(), "nomaster"],
        )?;
        if out.success() {
            Ok(())
        } else {
            Err(Error::UnknownBackend {
                code: out.exit_code(),
                stderr: out.stderr.trim().to_string(),
            })
        }
    }

    /// Devices currently enslaved to this bridge
    ///
    /// Recomputed from a fresh listing on every call.
    pub fn list_members(&self) -> Result<Vec<Iface>> {
        let out = iface::run_ip(self.runner().as_ref(), &["link", "show"])?;
        if !out.success() {
            return Err(Error::UnknownBackend {
                code: out.exit_code(),
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(listing::parse_listing(&out.stdout)
            .into_iter()
            .filter(|entry| entry.master.as_deref() == Some(self.name()))
            .map(|entry| {
                Iface::from_state(
                    self.registry.clone(),
                    self.registry.get_or_create(LinkKind::Iface, &entry.name),
                )
            })
            .collect())
    }

    /// Member count, derived from the same listing as `list_members`
    pub fn num_members(&self) -> Result<usize> {
        Ok(self.list_members()?.len())
    }
}

impl PartialEq for Bridge {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for Bridge {}

impl fmt::Display for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Bridge: {}>", self.name())
    }
}
