//! Per-interface IPv6 sysctl state machine
//!
//! Reads and writes `net.ipv6.conf.<scope>.<variable>` through the
//! sysctl tool, where scope is an interface name or the literal "all".
//! The handle captures whether global forwarding was already on at
//! construction; on disable it only restores what it turned on itself.
//!
//! See: https://www.kernel.org/doc/html/latest/networking/ip-sysctl.html

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::runner::CommandRunner;

const GLOBAL_SCOPE: &str = "all";

/// IPv6 sysctl handle for one interface
pub struct SystemControl {
    interface: String,
    /// Global forwarding flag as observed at construction; never refreshed
    prev_global_forwarding: bool,
    runner: Arc<dyn CommandRunner>,
}

impl SystemControl {
    /// Capture the current global forwarding flag and bind to `interface`
    pub fn new(interface: &str, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let prev = read_global_forwarding(runner.as_ref())?;
        Ok(Self::with_prev_global_forwarding(interface, runner, prev))
    }

    /// Bind to `interface` with an explicitly supplied previous global flag
    pub fn with_prev_global_forwarding(
        interface: &str,
        runner: Arc<dyn CommandRunner>,
        prev_global_forwarding: bool,
    ) -> Self {
        Self {
            interface: interface.to_string(),
            prev_global_forwarding,
            runner,
        }
    }

    #[allow(dead_code)]
    pub fn prev_global_forwarding(&self) -> bool {
        self.prev_global_forwarding
    }

    /// Read the global forwarding kernel variable (live, not the captured flag)
    pub fn all_ipv6_forwarding_enabled(&self) -> Result<bool> {
        read_global_forwarding(self.runner.as_ref())
    }

    /// Turn on forwarding for this interface
    ///
    /// An accept_ra of 1 would stop working once the interface forwards,
    /// so it is tightened to 2 to preserve the configured intent. The
    /// global flag is only raised when it was off at capture time.
    pub fn enable_ipv6_forwarding(&self) -> Result<()> {
        self.write("forwarding", "1")?;
        if self.read("accept_ra")? == "1" {
            self.write("accept_ra", "2")?;
        }
        if !self.prev_global_forwarding {
            write_variable(self.runner.as_ref(), GLOBAL_SCOPE, "forwarding", "1")?;
        }
        Ok(())
    }

    /// Turn off forwarding for this interface
    ///
    /// The global flag is only cleared when this handle raised it, never
    /// a global setting someone else is responsible for.
    pub fn disable_ipv6_forwarding(&self) -> Result<()> {
        self.write("forwarding", "0")?;
        if !self.prev_global_forwarding {
            write_variable(self.runner.as_ref(), GLOBAL_SCOPE, "forwarding", "0")?;
        }
        Ok(())
    }

    pub fn activate_ipv6(&self) -> Result<()> {
        self.write("disable_ipv6", "0")
    }

    pub fn deactivate_ipv6(&self) -> Result<()> {
        self.write("disable_ipv6", "1")
    }

    /// Accept router advertisements: 2 when the interface currently
    /// forwards, 1 otherwise
    pub fn accept_ipv6_rtr_adv(&self) -> Result<()> {
        if self.read("forwarding")? == "1" {
            self.write("accept_ra", "2")
        } else {
            self.write("accept_ra", "1")
        }
    }

    pub fn do_not_accept_ipv6_rtr_adv(&self) -> Result<()> {
        self.write("accept_ra", "0")
    }

    pub fn ipv6_rtr_sol_retries(&self, retries: u32) -> Result<()> {
        self.write("router_solicitations", &retries.to_string())
    }

    fn read(&self, variable: &str) -> Result<String> {
        read_variable(self.runner.as_ref(), &self.interface, variable)
    }

    fn write(&self, variable: &str, value: &str) -> Result<()> {
        write_variable(self.runner.as_ref(), &self.interface, variable, value)
    }
}

fn key(scope: &str, variable: &str) -> String {
    format!("net.ipv6.conf.{}.{}", scope, variable)
}

/// Read one variable; output reads `key = value`, the value is whatever
/// follows the last `=`
fn read_variable(runner: &dyn CommandRunner, scope: &str, variable: &str) -> Result<String> {
    let out = runner.run("sysctl", &[&key(scope, variable)])?;
    if !out.success() {
        return Err(Error::SystemControl(out.stderr.trim().to_string()));
    }
    Ok(out
        .stdout
        .rsplit('=')
        .next()
        .unwrap_or("")
        .trim()
        .to_string())
}

fn write_variable(
    runner: &dyn CommandRunner,
    scope: &str,
    variable: &str,
    value: &str,
) -> Result<()> {
    let assignment = format!("{}={}", key(scope, variable), value);
    let out = runner.run("sysctl", &["-w", &assignment])?;
    if out.success() {
        Ok(())
    } else {
        Err(Error::SystemControl(out.stderr.trim().to_string()))
    }
}

fn read_global_forwarding(runner: &dyn CommandRunner) -> Result<bool> {
    Ok(read_variable(runner, GLOBAL_SCOPE, "forwarding")? == "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::ScriptedRunner;

    fn control(runner: &Arc<ScriptedRunner>, prev: bool) -> SystemControl {
        SystemControl::with_prev_global_forwarding("foobar", runner.clone(), prev)
    }

    fn args_of(calls: &[(String, Vec<String>)]) -> Vec<Vec<String>> {
        calls.iter().map(|(_, args)| args.clone()).collect()
    }

    #[test]
    fn test_construction_captures_global_flag() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_ok("net.ipv6.conf.all.forwarding = 1\n");
        let sysctl = SystemControl::new("foobar", runner.clone()).unwrap();
        assert!(sysctl.prev_global_forwarding());
        assert_eq!(
            runner.calls(),
            vec![(
                "sysctl".to_string(),
                vec!["net.ipv6.conf.all.forwarding".to_string()]
            )]
        );
    }

    #[test]
    fn test_all_ipv6_forwarding_disabled() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_ok("net.ipv6.conf.all.forwarding = 0\n");
        let sysctl = control(&runner, true);
        assert!(!sysctl.all_ipv6_forwarding_enabled().unwrap());
    }

    #[test]
    fn test_read_failure_is_system_control_error() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_exit(1, "sysctl: cannot stat /proc/sys/net/ipv6: No such file");
        let sysctl = control(&runner, true);
        assert!(matches!(
            sysctl.all_ipv6_forwarding_enabled(),
            Err(Error::SystemControl(_))
        ));
    }

    #[test]
    fn test_enable_forwarding_global_already_on() {
        let runner = Arc::new(ScriptedRunner::new());
        // accept_ra read returns 0, nothing to tighten
        runner.push_ok(""); // forwarding=1 write
        runner.push_ok("net.ipv6.conf.foobar.accept_ra = 0\n");
        let sysctl = control(&runner, true);
        sysctl.enable_ipv6_forwarding().unwrap();

        let args = args_of(&runner.calls());
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], vec!["-w", "net.ipv6.conf.foobar.forwarding=1"]);
        assert_eq!(args[1], vec!["net.ipv6.conf.foobar.accept_ra"]);
    }

    #[test]
    fn test_enable_forwarding_raises_global_and_tightens_accept_ra() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_ok(""); // forwarding=1 write
        runner.push_ok("net.ipv6.conf.foobar.accept_ra = 1\n");
        let sysctl = control(&runner, false);
        sysctl.enable_ipv6_forwarding().unwrap();

        let args = args_of(&runner.calls());
        assert_eq!(args.len(), 4);
        assert_eq!(args[0], vec!["-w", "net.ipv6.conf.foobar.forwarding=1"]);
        assert_eq!(args[2], vec!["-w", "net.ipv6.conf.foobar.accept_ra=2"]);
        assert_eq!(args[3], vec!["-w", "net.ipv6.conf.all.forwarding=1"]);
    }

    #[test]
    fn test_disable_forwarding_global_was_on() {
        let runner = Arc::new(ScriptedRunner::new());
        let sysctl = control(&runner, true);
        sysctl.disable_ipv6_forwarding().unwrap();

        // never writes the global variable it did not raise
        let args = args_of(&runner.calls());
        assert_eq!(args, vec![vec!["-w", "net.ipv6.conf.foobar.forwarding=0"]]);
    }

    #[test]
    fn test_disable_forwarding_restores_global() {
        let runner = Arc::new(ScriptedRunner::new());
        let sysctl = control(&runner, false);
        sysctl.disable_ipv6_forwarding().unwrap();

        let args = args_of(&runner.calls());
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], vec!["-w", "net.ipv6.conf.foobar.forwarding=0"]);
        assert_eq!(args[1], vec!["-w", "net.ipv6.conf.all.forwarding=0"]);
    }

    #[test]
    fn test_enable_then_disable_restores_global_flag() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_ok(""); // forwarding=1
        runner.push_ok("net.ipv6.conf.foobar.accept_ra = 0\n");
        let sysctl = control(&runner, false);
        sysctl.enable_ipv6_forwarding().unwrap();
        sysctl.disable_ipv6_forwarding().unwrap();

        let args = args_of(&runner.calls());
        assert_eq!(
            args.last().unwrap(),
            &vec!["-w".to_string(), "net.ipv6.conf.all.forwarding=0".to_string()]
        );
    }

    #[test]
    fn test_activate_deactivate_ipv6() {
        let runner = Arc::new(ScriptedRunner::new());
        let sysctl = control(&runner, false);
        sysctl.activate_ipv6().unwrap();
        sysctl.deactivate_ipv6().unwrap();

        let args = args_of(&runner.calls());
        assert_eq!(args[0], vec!["-w", "net.ipv6.conf.foobar.disable_ipv6=0"]);
        assert_eq!(args[1], vec!["-w", "net.ipv6.conf.foobar.disable_ipv6=1"]);
    }

    #[test]
    fn test_accept_rtr_adv_while_forwarding() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_ok("net.ipv6.conf.foobar.forwarding = 1\n");
        let sysctl = control(&runner, false);
        sysctl.accept_ipv6_rtr_adv().unwrap();

        let args = args_of(&runner.calls());
        assert_eq!(args[1], vec!["-w", "net.ipv6.conf.foobar.accept_ra=2"]);
    }

    #[test]
    fn test_accept_rtr_adv_while_not_forwarding() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_ok("net.ipv6.conf.foobar.forwarding = 0\n");
        let sysctl = control(&runner, false);
        sysctl.accept_ipv6_rtr_adv().unwrap();

        let args = args_of(&runner.calls());
        assert_eq!(args[1], vec!["-w", "net.ipv6.conf.foobar.accept_ra=1"]);
    }

    #[test]
    fn test_do_not_accept_rtr_adv() {
        let runner = Arc::new(ScriptedRunner::new());
        let sysctl = control(&runner, false);
        sysctl.do_not_accept_ipv6_rtr_adv().unwrap();

        let args = args_of(&runner.calls());
        assert_eq!(args, vec![vec!["-w", "net.ipv6.conf.foobar.accept_ra=0"]]);
    }

    #[test]
    fn test_rtr_sol_retries() {
        let runner = Arc::new(ScriptedRunner::new());
        let sysctl = control(&runner, false);
        sysctl.ipv6_rtr_sol_retries(42).unwrap();

        let args = args_of(&runner.calls());
        assert_eq!(
            args,
            vec![vec!["-w", "net.ipv6.conf.foobar.router_solicitations=42"]]
        );
    }

    #[test]
    fn test_write_failure_is_system_control_error() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_exit(255, "permission denied");
        let sysctl = control(&runner, true);
        let err = sysctl.deactivate_ipv6().unwrap_err();
        match err {
            Error::SystemControl(text) => assert_eq!(text, "permission denied"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
