use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_target_line_push_api_without_credentials() {
    let settings = Settings::default();
    let push = settings.push_config().expect("push config");
    assert_eq!(push.endpoint, LINE_PUSH_ENDPOINT);
    assert!(push.credentials.is_none());
    assert_eq!(push.timeout, Duration::from_secs(10));
    assert_eq!(push.utc_offset.local_minus_utc(), 8 * 3600);
}

#[test]
fn prefixed_env_vars_override_plain_ones() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("SERVER_BIND", "0.0.0.0:8080"),
            ("APP__BIND_ADDR", "0.0.0.0:9090"),
            ("LINE_CHANNEL_ACCESS_TOKEN", "token"),
            ("LINE_USER_ID", "U1"),
            ("APP__LINE_USER_ID", "U2"),
        ]),
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9090");
    assert_eq!(settings.line_channel_access_token.as_deref(), Some("token"));
    assert_eq!(settings.line_user_id.as_deref(), Some("U2"));
    assert!(settings.push_config().expect("push").credentials.is_some());
}

#[test]
fn unparsable_numeric_env_values_are_ignored() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("APP__DISPATCH_TIMEOUT_SECS", "soon"),
            ("APP__UTC_OFFSET_HOURS", "-5"),
        ]),
    );
    assert_eq!(settings.dispatch_timeout_secs, 10);
    assert_eq!(settings.utc_offset_hours, -5);
}

#[test]
fn file_values_are_applied_before_env() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("crochet_server_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("server.toml");
    fs::write(
        &path,
        "bind_addr = \"127.0.0.1:4000\"\ncatalog_path = \"catalog.json\"\ndispatch_timeout_secs = \"3\"\n",
    )
    .expect("write config");

    let mut settings = Settings::default();
    apply_file(&mut settings, &path);
    apply_env(&mut settings, env_from(&[("APP__BIND_ADDR", "127.0.0.1:5000")]));

    assert_eq!(settings.server_bind, "127.0.0.1:5000");
    assert_eq!(settings.catalog_path.as_deref(), Some("catalog.json"));
    assert_eq!(settings.dispatch_timeout_secs, 3);

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn rejects_non_http_push_endpoint() {
    let settings = Settings {
        push_endpoint: "ftp://example.com/push".into(),
        ..Settings::default()
    };
    assert!(settings.push_config().is_err());

    let settings = Settings {
        push_endpoint: "not a url".into(),
        ..Settings::default()
    };
    assert!(settings.push_config().is_err());
}
