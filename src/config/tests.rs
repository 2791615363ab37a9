use serial_test::serial;

use super::*;

const ENV_HOME_SLUG: &str = "PRESSROOM__SITE__HOME_SLUG";
const ENV_API_BASE: &str = "PRESSROOM__CONTENT__API_BASE_URL";

fn clear_env() {
    // SAFETY: env-touching tests are serialized with `#[serial]`.
    unsafe {
        std::env::remove_var(ENV_HOME_SLUG);
        std::env::remove_var(ENV_API_BASE);
        std::env::remove_var("CONTENT_API_BASE");
        std::env::remove_var("REVALIDATION_SECRET");
    }
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.content.api_base.as_str(), "http://localhost:3001/");
    assert_eq!(settings.content.request_timeout, Duration::from_secs(10));
    assert_eq!(settings.cache.revalidate_after, Duration::from_secs(60));
    assert!(settings.cache.warm_on_startup);
    assert!(settings.revalidation.secret.is_none());
    assert_eq!(settings.render.unknown_nodes, UnknownNodePolicy::PlainText);
    assert_eq!(settings.site.home_slug, "home");
    assert_eq!(settings.site.blog_page_size.get(), 12);
}

#[test]
fn media_base_defaults_to_content_api() {
    let mut raw = RawSettings::default();
    raw.content.api_base_url = Some("https://cms.example.com".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.media.base_url, settings.content.api_base);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        render_unknown_nodes: Some("skip".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.render.unknown_nodes, UnknownNodePolicy::Skip);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_secret_counts_as_unset() {
    let mut raw = RawSettings::default();
    raw.revalidation.secret = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.revalidation.secret.is_none());
}

#[test]
fn secret_is_redacted_in_debug_output() {
    let settings = RevalidationSettings {
        secret: Some("hunter2".to_string()),
    };
    let rendered = format!("{settings:?}");
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("redacted"));
}

#[test]
fn rejects_non_http_api_base() {
    let mut raw = RawSettings::default();
    raw.content.api_base_url = Some("ftp://cms.example.com".to_string());

    let err = Settings::from_raw(raw).expect_err("ftp base should be rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "content.api_base_url",
            ..
        }
    ));
}

#[test]
fn rejects_unknown_render_policy() {
    let mut raw = RawSettings::default();
    raw.render.unknown_nodes = Some("explode".to_string());

    let err = Settings::from_raw(raw).expect_err("unknown policy should be rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "render.unknown_nodes",
            ..
        }
    ));
}

#[test]
fn zero_freshness_window_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.revalidate_after_seconds = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["pressroom"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_warm_arguments() {
    let args = CliArgs::parse_from([
        "pressroom",
        "warm",
        "--by-slug",
        "--content-api-base",
        "https://cms.example.com",
    ]);

    assert_eq!(
        args.source.content_api_base.as_deref(),
        Some("https://cms.example.com")
    );
    match args.command.expect("warm command") {
        Command::Warm(warm) => assert!(warm.by_slug),
        _ => panic!("wrong command parsed"),
    }
}

#[test]
#[serial]
fn environment_layer_is_applied() {
    clear_env();
    // SAFETY: serialized with every other env-touching test.
    unsafe {
        std::env::set_var(ENV_HOME_SLUG, "welcome");
        std::env::set_var(ENV_API_BASE, "https://cms.example.com");
    }

    let args = CliArgs::parse_from(["pressroom"]);
    let settings = load(&args).expect("settings load");
    clear_env();

    assert_eq!(settings.site.home_slug, "welcome");
    assert_eq!(settings.content.api_base.host_str(), Some("cms.example.com"));
}

#[test]
#[serial]
fn cli_source_overrides_beat_environment() {
    clear_env();
    // SAFETY: serialized with every other env-touching test.
    unsafe {
        std::env::set_var(ENV_API_BASE, "https://env.example.com");
        std::env::set_var("REVALIDATION_SECRET", "from-env");
    }

    let args = CliArgs::parse_from([
        "pressroom",
        "serve",
        "--content-api-base",
        "https://cli.example.com",
    ]);
    let settings = load(&args).expect("settings load");
    clear_env();

    assert_eq!(settings.content.api_base.host_str(), Some("cli.example.com"));
    assert_eq!(settings.revalidation.secret.as_deref(), Some("from-env"));
}
