// tests/config_load.rs
use intel_orchestrator::config::{load_default, load_from};
use intel_orchestrator::Orchestrator;
use std::time::Duration;
use std::{env, fs};

fn clear_env() {
    env::remove_var("INTEL_CONFIG_PATH");
    env::remove_var("INTEL_INTERVAL_MS");
    env::remove_var("INTEL_MAX_ALERTS");
}

#[serial_test::serial]
#[test]
fn parse_toml_and_json_files() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("intel.toml");
    fs::write(
        &p_toml,
        r#"
interval_ms = 120000
alert_ttl_secs = 900
disabled_sources = ["partner_health"]

[source_ttl_ms]
market_rates = 30000
"#,
    )
    .unwrap();
    let cfg = load_from(&p_toml).unwrap();
    assert_eq!(cfg.interval(), Duration::from_secs(120));
    assert_eq!(cfg.alert_ttl(), Duration::from_secs(900));
    assert!(cfg.is_disabled("partner_health"));
    assert_eq!(cfg.ttl_for("market_rates"), Duration::from_secs(30));
    assert_eq!(cfg.max_alerts, 100);

    let p_json = dir.path().join("intel.json");
    fs::write(&p_json, r#"{ "max_alerts": 25, "collect_timeout_ms": 2500 }"#).unwrap();
    let cfg = load_from(&p_json).unwrap();
    assert_eq!(cfg.max_alerts, 25);
    assert_eq!(cfg.collect_timeout(), Duration::from_millis(2500));
    assert_eq!(cfg.interval_ms, 300_000);
}

#[test]
fn default_ttl_reaches_sources_without_an_entry() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("intel.toml");
    fs::write(
        &p,
        r#"
default_ttl_ms = 1000

[source_ttl_ms]
weather = 120000
"#,
    )
    .unwrap();
    let cfg = load_from(&p).unwrap();

    let orch = Orchestrator::from_config(&cfg).unwrap();
    let reg = orch.registry();
    assert_eq!(reg.lookup("weather").unwrap().ttl, Duration::from_secs(120));
    assert_eq!(reg.lookup("fuel_prices").unwrap().ttl, Duration::from_millis(1000));
    assert_eq!(
        reg.iter().filter(|s| s.ttl == Duration::from_millis(1000)).count(),
        reg.len() - 1
    );
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("intel.toml");
    fs::write(&p, "interval_ms = \"soon\"").unwrap();
    assert!(load_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) nothing on disk -> defaults
    let cfg = load_default().unwrap();
    assert_eq!(cfg.interval_ms, 300_000);
    assert_eq!(cfg.default_ttl_ms, 600_000);
    assert!(cfg.snapshot_log_path.is_none());

    // 2) ./config/intel.json fallback
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("intel.json"), r#"{ "interval_ms": 5000 }"#).unwrap();
    assert_eq!(load_default().unwrap().interval_ms, 5_000);

    // 3) ./config/intel.toml wins over json
    fs::write(cfg_dir.join("intel.toml"), "interval_ms = 7000").unwrap();
    assert_eq!(load_default().unwrap().interval_ms, 7_000);

    // 4) explicit path wins over both
    let p_env = tmp.path().join("custom.toml");
    fs::write(&p_env, "interval_ms = 9000").unwrap();
    env::set_var("INTEL_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_default().unwrap().interval_ms, 9_000);

    // 5) a dangling explicit path is an error, not a silent fallback
    env::set_var("INTEL_CONFIG_PATH", tmp.path().join("missing.toml").display().to_string());
    assert!(load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_apply_on_top_of_file() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    let p = tmp.path().join("intel.toml");
    fs::write(&p, "interval_ms = 60000\nmax_alerts = 50").unwrap();
    env::set_var("INTEL_CONFIG_PATH", p.display().to_string());
    env::set_var("INTEL_INTERVAL_MS", "15000");
    env::set_var("INTEL_MAX_ALERTS", "not-a-number");

    let cfg = load_default().unwrap();
    assert_eq!(cfg.interval_ms, 15_000);
    // unparsable override is ignored
    assert_eq!(cfg.max_alerts, 50);

    env::set_var("INTEL_MAX_ALERTS", "0");
    assert_eq!(load_default().unwrap().max_alerts, 100);

    clear_env();
    env::set_current_dir(&old).unwrap();
}
