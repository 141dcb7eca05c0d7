//! Command-line interface for netrig
//!
//! Uses clap with derive for type-safe CLI parsing

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::iface::TunTapMode;

/// netrig - script TUN/TAP and bridge topologies on a Linux host
#[derive(Parser)]
#[command(name = "netrig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Prefix backend tool invocations with sudo (also: NETRIG_SUDO=1)
    #[arg(long)]
    pub sudo: bool,

    /// Echo each backend invocation
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a TUN/TAP device
    Create {
        /// Device name
        name: String,

        /// Device mode
        #[arg(long, value_enum, default_value = "tap")]
        mode: Mode,

        /// Owning user (defaults to $USER)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Delete a link device
    Delete {
        /// Device name
        name: String,
    },

    /// Check whether a link device exists (exit 0 if present, 1 otherwise)
    Exists {
        /// Device name
        name: String,
    },

    /// Print the bridge a device is enslaved to
    Master {
        /// Device name
        name: String,
    },

    /// List all link devices and their bridge relations
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Bridge management
    Bridge {
        #[command(subcommand)]
        action: BridgeAction,
    },

    /// Per-interface IPv6 sysctl toggles
    Ipv6 {
        /// Interface the setting applies to
        iface: String,

        #[command(subcommand)]
        action: Ipv6Action,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// TUN/TAP mode on the command line
#[derive(Clone, Copy, ValueEnum)]
pub enum Mode {
    Tap,
    Tun,
}

impl From<Mode> for TunTapMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Tap => TunTapMode::Tap,
            Mode::Tun => TunTapMode::Tun,
        }
    }
}

/// Actions for the bridge command
#[derive(Subcommand)]
pub enum BridgeAction {
    /// Create a new bridge
    Create {
        /// Bridge name
        name: String,
    },

    /// Create a bridge unless it already exists
    GetOrCreate {
        /// Bridge name
        name: String,
    },

    /// Delete a bridge
    Delete {
        /// Bridge name
        name: String,
    },

    /// Attach a device to a bridge
    Add {
        /// Bridge name
        bridge: String,

        /// Device to attach
        iface: String,
    },

    /// Detach a device from a bridge (no-op if not a member)
    Remove {
        /// Bridge name
        bridge: String,

        /// Device to detach
        iface: String,
    },

    /// List the devices enslaved to a bridge
    Members {
        /// Bridge name
        bridge: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Actions for the ipv6 command
#[derive(Subcommand)]
pub enum Ipv6Action {
    /// Enable IPv6 forwarding for the interface (and globally if needed)
    EnableForwarding,

    /// Disable IPv6 forwarding, restoring the global flag it raised
    DisableForwarding,

    /// Print the global forwarding state (on/off)
    GlobalForwarding,

    /// Activate IPv6 on the interface
    Activate,

    /// Deactivate IPv6 on the interface
    Deactivate,

    /// Accept router advertisements
    AcceptRa,

    /// Ignore router advertisements
    IgnoreRa,

    /// Set the router solicitation retry count
    RtrSolRetries {
        /// Number of retries
        retries: u32,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Generate shell completion scripts
    pub fn generate_completion(shell: Shell) {
        let mut cmd = Self::command();
        clap_complete::generate(shell, &mut cmd, "netrig", &mut std::io::stdout());
    }
}
