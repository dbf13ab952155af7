//! Unit tests for `AppError` display format and conversions.

use board_loader::AppError;

#[test]
fn every_variant_carries_its_kind_prefix() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Spawn("bad".into()), "spawn: bad"),
        (AppError::Build("bad".into()), "build: bad"),
        (AppError::PatternTimeout("bad".into()), "pattern timeout: bad"),
        (AppError::Handshake("bad".into()), "handshake: bad"),
        (AppError::Disconnected("bad".into()), "disconnected: bad"),
        (AppError::Debugger("bad".into()), "debugger: bad"),
        (AppError::Timeout("bad".into()), "timeout: bad"),
        (AppError::Io("bad".into()), "io: bad"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn error_message_no_trailing_period() {
    let s = AppError::PatternTimeout("st-flash never printed banner".into()).to_string();
    assert!(!s.ends_with('.'), "error message must not end with a period: {s}");
}

#[test]
fn toml_error_becomes_config_error() {
    let err: AppError = toml::from_str::<toml::Value>("board = ")
        .map_err(AppError::from)
        .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    assert!(err.to_string().starts_with("config: invalid config:"));
}

#[test]
fn io_error_becomes_io_error() {
    let err = AppError::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"));
    assert_eq!(err.to_string(), "io: pipe closed");
}
