//! Tests for status and library subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_status() {
    match parse(&["shelf", "status"]) {
        CliCommand::Status { identity } => assert!(identity.is_none()),
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_status_identity() {
    match parse(&["shelf", "status", "alice"]) {
        CliCommand::Status { identity } => assert_eq!(identity.as_deref(), Some("alice")),
        _ => panic!("expected Status with identity"),
    }
}

#[test]
fn cli_parse_library() {
    match parse(&["shelf", "library", "alice"]) {
        CliCommand::Library { identity } => assert_eq!(identity, "alice"),
        _ => panic!("expected Library"),
    }
}

#[test]
fn cli_parse_library_requires_identity() {
    assert!(Cli::try_parse_from(["shelf", "library"]).is_err());
}

#[test]
fn cli_parse_unknown_subcommand() {
    assert!(Cli::try_parse_from(["shelf", "pause", "1"]).is_err());
}
