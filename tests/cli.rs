use assert_cmd::Command;
use clap::Parser;
use hearth::ChatConfig;
use hearth::args::{Cli, Command as Sub, ServeArgs};
use std::time::Duration;

#[test]
fn show_help() {
    Command::cargo_bin("hearth")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn flags_build_config() {
    let cli = Cli::parse_from([
        "hearth",
        "--model",
        "llava",
        "--max-turns",
        "3",
        "--temperature",
        "0.5",
        "--num-predict",
        "128",
        "--stream-timeout-secs",
        "30",
    ]);
    let config = ChatConfig::from(&cli.chat);
    assert_eq!(config.model, "llava");
    assert_eq!(config.history.max_turns, 3);
    assert_eq!(config.generation.temperature, 0.5);
    assert_eq!(config.generation.num_predict, 128);
    assert_eq!(config.stream_timeout, Some(Duration::from_secs(30)));
    assert!(cli.command.is_none());
}

#[test]
fn serve_subcommand_parses_address() {
    let cli = Cli::parse_from(["hearth", "serve", "--port", "9000"]);
    assert_eq!(
        cli.command,
        Some(Sub::Serve(ServeArgs {
            host: "127.0.0.1".into(),
            port: 9000,
        }))
    );
}

#[test]
fn invalid_number_is_rejected() {
    assert!(Cli::try_parse_from(["hearth", "--max-turns", "many"]).is_err());
}
