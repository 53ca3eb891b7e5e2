use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn defaults_point_at_wireproxy() {
    let settings = load_settings_from(None, no_env);
    assert_eq!(settings, Settings::default());

    let controller = settings.controller_config();
    assert_eq!(
        controller.active_config_path(),
        PathBuf::from("/etc/wireproxy/proton.conf")
    );
    assert_eq!(
        controller.regions_dir(),
        PathBuf::from("/etc/wireproxy/regions")
    );
    assert_eq!(controller.service_name, "wireproxy-proton");
    assert_eq!(controller.status_timeout, Duration::from_secs(5));
    assert_eq!(controller.action_timeout, Duration::from_secs(30));
}

#[test]
fn env_overrides_config_dir() {
    let settings = load_settings_from(None, |key| {
        (key == "PROTON_CONFIG_DIR").then(|| "/srv/proton".to_string())
    });
    assert_eq!(settings.config_dir, "/srv/proton");
}

#[test]
fn env_wins_over_settings_file() {
    let file = r#"
        config_dir = "/from/file"
        service_name = "wireproxy-test"
        action_timeout_secs = 10
    "#;
    let settings = load_settings_from(Some(file), |key| {
        (key == "APP__CONFIG_DIR").then(|| "/from/env".to_string())
    });
    assert_eq!(settings.config_dir, "/from/env");
    assert_eq!(settings.service_name, "wireproxy-test");
    assert_eq!(settings.action_timeout_secs, 10);
    assert_eq!(settings.status_timeout_secs, 5);
}

#[test]
fn unparsable_settings_file_keeps_defaults() {
    let settings = load_settings_from(Some("this is = = not toml"), no_env);
    assert_eq!(settings, Settings::default());
}

#[test]
fn zero_timeouts_are_ignored() {
    let settings = load_settings_from(Some("status_timeout_secs = 0"), no_env);
    assert_eq!(settings.status_timeout_secs, 5);
}

#[test]
fn bind_address_must_be_loopback() {
    assert_eq!(
        resolve_bind_addr("127.0.0.1:8081").expect("loopback"),
        "127.0.0.1:8081".parse::<SocketAddr>().expect("addr")
    );
    assert!(resolve_bind_addr("[::1]:8081").is_ok());
    assert!(resolve_bind_addr("0.0.0.0:8081").is_err());
    assert!(resolve_bind_addr("not-an-address").is_err());
}

#[test]
fn settings_file_fields_are_typed_and_unknown_keys_ignored() {
    let file = r#"
        bind_addr = "127.0.0.1:9090"
        systemctl_path = "/usr/bin/systemctl"
        socks_bind_address = "127.0.0.1:1080"
        status_timeout_secs = 2
        legacy_option = "ignored"
    "#;
    let settings = load_settings_from(Some(file), no_env);
    assert_eq!(settings.server_bind, "127.0.0.1:9090");
    assert_eq!(settings.systemctl_path, "/usr/bin/systemctl");
    assert_eq!(settings.status_timeout_secs, 2);

    let controller = settings.controller_config();
    assert_eq!(controller.socks_bind_address, "127.0.0.1:1080");
    assert_eq!(controller.status_timeout, Duration::from_secs(2));
}
