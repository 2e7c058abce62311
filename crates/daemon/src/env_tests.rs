// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use yare::parameterized;

struct EnvGuard(&'static str);

impl EnvGuard {
    fn set(key: &'static str, value: &str) -> Self {
        std::env::set_var(key, value);
        Self(key)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        std::env::remove_var(self.0);
    }
}

#[test]
#[serial]
fn state_dir_prefers_cg_state_dir() {
    let _state = EnvGuard::set("CG_STATE_DIR", "/tmp/cg-explicit");
    let _xdg = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/cg-explicit"));
}

#[test]
#[serial]
fn state_dir_falls_back_to_xdg() {
    std::env::remove_var("CG_STATE_DIR");
    let _xdg = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/xdg/cg"));
}

#[test]
#[serial]
fn repos_dir_defaults_under_state_dir() {
    std::env::remove_var("CG_REPOS_DIR");
    assert_eq!(repos_dir(Path::new("/state")), PathBuf::from("/state/repos"));

    let _repos = EnvGuard::set("CG_REPOS_DIR", "/srv/mirrors");
    assert_eq!(repos_dir(Path::new("/state")), PathBuf::from("/srv/mirrors"));
}

#[parameterized(
    one = { "1", true },
    true_word = { "true", true },
    upper = { "YES", true },
    on = { "on", true },
    zero = { "0", false },
    empty = { "", false },
    junk = { "maybe", false },
)]
#[serial]
fn disable_auto_clone_values(value: &str, disabled: bool) {
    let _guard = EnvGuard::set("CG_DISABLE_AUTO_CLONE", value);
    assert_eq!(auto_clone_disabled(), disabled);
}

#[test]
#[serial]
fn env_policy_is_read_on_every_call() {
    let policy = EnvAutoClone;
    std::env::remove_var("CG_DISABLE_AUTO_CLONE");
    assert!(!policy.auto_clone_disabled());

    let _guard = EnvGuard::set("CG_DISABLE_AUTO_CLONE", "1");
    assert!(policy.auto_clone_disabled());
}

#[parameterized(
    surface = { "surface", ProbeFailurePolicy::Surface },
    assume = { "assume-not-cloned", ProbeFailurePolicy::AssumeNotCloned },
    unknown_falls_back = { "explode", ProbeFailurePolicy::Surface },
)]
#[serial]
fn probe_failure_policy_from_env(value: &str, expected: ProbeFailurePolicy) {
    let _guard = EnvGuard::set("CG_PROBE_FAILURE", value);
    assert_eq!(probe_failure_policy(), expected);
}

#[test]
#[serial]
fn durations_parse_milliseconds_with_defaults() {
    std::env::remove_var("CG_IPC_TIMEOUT_MS");
    assert_eq!(ipc_timeout(), Duration::from_secs(5));

    let _ipc = EnvGuard::set("CG_IPC_TIMEOUT_MS", "250");
    assert_eq!(ipc_timeout(), Duration::from_millis(250));

    let _poll = EnvGuard::set("CG_WORKER_POLL_MS", "not-a-number");
    assert_eq!(worker_poll_interval(), DEFAULT_POLL_INTERVAL);
}

#[test]
#[serial]
fn clone_concurrency_is_at_least_one() {
    let _guard = EnvGuard::set("CG_CLONE_CONCURRENCY", "0");
    assert_eq!(clone_concurrency(), 1);
}

#[test]
#[serial]
fn remote_base_defaults_to_github() {
    std::env::remove_var("CG_REMOTE_BASE");
    assert_eq!(remote_base(), "https://github.com");
}
