//! netrig - reproducible TUN/TAP and bridge topologies
//!
//! Scripts virtual network setups for testing embedded network stacks
//! against the Linux host kernel: TUN/TAP creation, bridge composition,
//! and per-interface IPv6 forwarding/RA sysctl toggles.

mod bridge;
mod cli;
mod error;
mod iface;
mod listing;
mod net;
mod registry;
mod runner;
mod sysctl;

use cli::{BridgeAction, Cli, Commands, Ipv6Action};
use error::Result;
use net::Net;
use runner::HostRunner;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();

    if let Commands::Completion { shell } = &cli.command {
        Cli::generate_completion(*shell);
        return Ok(());
    }

    let sudo = cli.sudo || HostRunner::sudo_from_env();
    let net = Net::host(HostRunner::new(sudo).verbose(cli.verbose))?;

    match cli.command {
        Commands::Create { name, mode, user } => {
            let user = user
                .or_else(|| std::env::var("USER").ok())
                .unwrap_or_else(|| "root".to_string());
            let iface = net.create_tuntap(&name, &user, mode.into())?;
            println!("Created {} device '{}' (user {})", mode_label(mode), iface, user);
        }

        Commands::Delete { name } => {
            net.iface(&name).delete()?;
            println!("Deleted '{}'", name);
        }

        Commands::Exists { name } => {
            let present = net.iface(&name).exists()?;
            println!("{}", present);
            if !present {
                std::process::exit(1);
            }
        }

        Commands::Master { name } => match net.iface(&name).bridge() {
            Some(bridge) => println!("{}", bridge),
            None => {
                println!("'{}' is not enslaved to any bridge", name);
                std::process::exit(1);
            }
        },

        Commands::List { json } => {
            let links = net.list_links()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&links).unwrap());
            } else {
                println!("{:<20} {:<20}", "NAME", "MASTER");
                println!("{}", "-".repeat(40));
                for link in links {
                    println!("{:<20} {:<20}", link.name, link.master.unwrap_or_default());
                }
            }
        }

        Commands::Bridge { action } => run_bridge(&net, action)?,

        Commands::Ipv6 { iface, action } => run_ipv6(&net, &iface, action)?,

        Commands::Completion { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn run_bridge(net: &Net, action: BridgeAction) -> Result<()> {
    match action {
        BridgeAction::Create { name } => {
            let bridge = net.create_bridge(&name)?;
            println!("Created bridge '{}'", bridge);
        }

        BridgeAction::GetOrCreate { name } => {
            let bridge = net.get_or_create_bridge(&name)?;
            println!("Bridge '{}' ready", bridge);
        }

        BridgeAction::Delete { name } => {
            net.bridge(&name).delete()?;
            println!("Deleted bridge '{}'", name);
        }

        BridgeAction::Add { bridge, iface } => {
            net.bridge(&bridge).add_member(&net.iface(&iface))?;
            println!("Attached '{}' to bridge '{}'", iface, bridge);
        }

        BridgeAction::Remove { bridge, iface } => {
            net.bridge(&bridge).remove_member(&net.iface(&iface))?;
            println!("Detached '{}' from bridge '{}'", iface, bridge);
        }

        BridgeAction::Members { bridge, json } => {
            let members = net.bridge(&bridge).list_members()?;
            if json {
                let names: Vec<&str> = members.iter().map(|m| m.name()).collect();
                println!("{}", serde_json::to_string_pretty(&names).unwrap());
            } else {
                for member in &members {
                    println!("{}", member);
                }
                println!("{} member(s)", members.len());
            }
        }
    }

    Ok(())
}

fn run_ipv6(net: &Net, iface: &str, action: Ipv6Action) -> Result<()> {
    let sysctl = net.iface(iface).sysctl()?;

    match action {
        Ipv6Action::EnableForwarding => {
            sysctl.enable_ipv6_forwarding()?;
            println!("Enabled IPv6 forwarding on '{}'", iface);
        }
        Ipv6Action::DisableForwarding => {
            sysctl.disable_ipv6_forwarding()?;
            println!("Disabled IPv6 forwarding on '{}'", iface);
        }
        Ipv6Action::GlobalForwarding => {
            let enabled = sysctl.all_ipv6_forwarding_enabled()?;
            println!("{}", if enabled { "on" } else { "off" });
        }
        Ipv6Action::Activate => {
            sysctl.activate_ipv6()?;
            println!("Activated IPv6 on '{}'", iface);
        }
        Ipv6Action::Deactivate => {
            sysctl.deactivate_ipv6()?;
            println!("Deactivated IPv6 on '{}'", iface);
        }
        Ipv6Action::AcceptRa => {
            sysctl.accept_ipv6_rtr_adv()?;
            println!("Accepting router advertisements on '{}'", iface);
        }
        Ipv6Action::IgnoreRa => {
            sysctl.do_not_accept_ipv6_rtr_adv()?;
            println!("Ignoring router advertisements on '{}'", iface);
        }
        Ipv6Action::RtrSolRetries { retries } => {
            sysctl.ipv6_rtr_sol_retries(retries)?;
            println!("Set router solicitation retries to {} on '{}'", retries, iface);
        }
    }

    Ok(())
}

fn mode_label(mode: cli::Mode) -> &'static str {
    match mode {
        cli::Mode::Tap => "tap",
        cli::Mode::Tun => "tun",
    }
}
