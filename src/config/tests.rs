use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_published_behaviour() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.snapshots.stale_after, Duration::from_secs(10));
    assert!(settings.snapshots.prerender_on_startup);
    assert!(settings.database.url.is_none());
    assert_eq!(settings.comments.page_size_default.get(), 50);
    assert_eq!(settings.comments.page_size_max.get(), 200);
    assert!(settings.identity.google_client_id.is_none());
    assert_eq!(
        settings.identity.tokeninfo_url.as_str(),
        "https://oauth2.googleapis.com/tokeninfo"
    );
}

#[test]
fn blank_database_url_means_in_memory() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_stale_window_is_rejected() {
    let mut raw = RawSettings::default();
    raw.snapshots.stale_after_seconds = Some(0);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "snapshots.stale_after_seconds",
            ..
        }
    ));
}

#[test]
fn page_size_default_cannot_exceed_max() {
    let mut raw = RawSettings::default();
    raw.comments.page_size_default = Some(500);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "comments.page_size_default",
            ..
        }
    ));
}

#[test]
fn session_ttl_is_bounded() {
    let mut raw = RawSettings::default();
    raw.identity.session_ttl_seconds = Some(u64::MAX);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "identity.session_ttl_seconds",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.identity.session_ttl_seconds = Some(MAX_SESSION_TTL_SECS);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.identity.session_ttl,
        Duration::from_secs(MAX_SESSION_TTL_SECS)
    );
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
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["gazette"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from([
        "gazette",
        "migrate",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "gazette",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--snapshots-stale-after-seconds",
        "30",
        "--snapshots-prerender-on-startup",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            let mut raw = RawSettings::default();
            raw.apply_serve_overrides(&serve.overrides);
            let settings = Settings::from_raw(raw).expect("valid settings");

            assert_eq!(settings.server.addr.ip().to_string(), "0.0.0.0");
            assert_eq!(settings.database.url.as_deref(), Some("postgres://override"));
            assert_eq!(settings.snapshots.stale_after, Duration::from_secs(30));
            assert!(!settings.snapshots.prerender_on_startup);
        }
        _ => panic!("wrong command parsed"),
    }
}
