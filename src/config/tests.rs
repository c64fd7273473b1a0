use std::io::Write;

use super::*;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    file.write_all(contents.as_bytes())
        .expect("config file written");
    file
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.client.site_id = Some("RefArch".to_string());
    raw.logging.level = Some("info".to_string());

    let overrides = Overrides {
        site_id: Some("RefArchGlobal".to_string()),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.client.site_id.as_deref(), Some("RefArchGlobal"));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cache_defaults_apply_when_unset() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert_eq!(settings.cache, CacheConfig::default());
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn zero_max_entries_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.max_entries = Some(0);

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.max_entries",
            ..
        }
    ));
}

#[test]
fn blank_client_value_is_rejected() {
    let mut raw = RawSettings::default();
    raw.client.organization_id = Some("   ".to_string());

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "client.organization_id",
            ..
        }
    ));
}

#[test]
fn default_params_skip_unset_values() {
    let client = ClientSettings {
        organization_id: Some("f_ecom".to_string()),
        site_id: Some("RefArch".to_string()),
        locale: None,
        currency: Some("USD".to_string()),
    };
    let params = client.default_params();

    assert_eq!(params.len(), 3);
    assert_eq!(params.get_str("organizationId"), Some("f_ecom"));
    assert!(!params.contains("locale"));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = Overrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn config_file_is_layered_under_cli() {
    let file = write_config(
        r#"
[client]
organization_id = "f_ecom_zzrf_001"
site_id = "RefArch"
locale = "en-US"

[cache]
max_entries = 50
"#,
    );
    let path = file.path().to_str().expect("utf-8 temp path");
    let args = CliArgs::parse_from([
        "storefront-query",
        "--config-file",
        path,
        "--locale",
        "de-DE",
        "operations",
    ]);

    let settings = load(&args).expect("settings load");

    assert_eq!(
        settings.client.organization_id.as_deref(),
        Some("f_ecom_zzrf_001")
    );
    assert_eq!(settings.client.locale.as_deref(), Some("de-DE"));
    assert_eq!(settings.cache.max_entries, 50);
    assert!(settings.cache.enabled);
}

#[test]
fn missing_explicit_config_file_fails() {
    let args = CliArgs::parse_from([
        "storefront-query",
        "--config-file",
        "/nonexistent/storefront.toml",
        "operations",
    ]);
    assert!(matches!(load(&args), Err(LoadError::Build(_))));
}

#[test]
fn parse_plan_arguments() {
    let args = CliArgs::parse_from([
        "storefront-query",
        "plan",
        "updateItemInBasket",
        "--param",
        "basketId=B1",
        "--param",
        "itemId=i1",
        "--customer-id",
        "C1",
        "--response",
        r#"{"basketId":"B1"}"#,
    ]);

    match args.command {
        Command::Plan(plan) => {
            assert_eq!(plan.mutation, "updateItemInBasket");
            assert_eq!(
                plan.params,
                vec![
                    ("basketId".to_string(), "B1".to_string()),
                    ("itemId".to_string(), "i1".to_string()),
                ]
            );
            assert_eq!(plan.customer_id.as_deref(), Some("C1"));
            assert!(plan.response_file.is_none());
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn malformed_param_is_rejected() {
    let result = CliArgs::try_parse_from([
        "storefront-query",
        "plan",
        "deleteBasket",
        "--param",
        "basketId",
    ]);
    assert!(result.is_err());
}

#[test]
fn global_overrides_follow_subcommand() {
    let args = CliArgs::parse_from([
        "storefront-query",
        "operations",
        "--mutations",
        "--site-id",
        "RefArch",
    ]);

    assert_eq!(args.overrides.site_id.as_deref(), Some("RefArch"));
    assert!(matches!(args.command, Command::Operations(ops) if ops.mutations));
}
