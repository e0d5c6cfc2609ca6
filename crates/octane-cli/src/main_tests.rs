// crates/octane-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing helpers in the CLI entry point.
// Purpose: Ensure filters and sort keys map onto SDK queries exactly.
// Dependencies: octane-cli main helpers
// ============================================================================

//! ## Overview
//! Validates filter and order parsing and the global scope flags.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::Parser;
use octane_sdk::QueryValue;

use super::Cli;
use super::Commands;
use super::EntitiesCommand;
use super::build_query;
use super::filter_value;
use super::parse_order;

// ============================================================================
// SECTION: Filters
// ============================================================================

#[test]
fn filters_combine_with_and() {
    let filters = vec!["name=Login fails".to_string(), "id=1001".to_string()];
    let query = build_query(&filters).unwrap().unwrap();
    assert_eq!(query.as_str(), "name EQ ^Login fails^;id EQ 1001");
}

#[test]
fn no_filters_means_no_query() {
    assert!(build_query(&[]).unwrap().is_none());
}

#[test]
fn filter_without_separator_is_rejected() {
    let err = build_query(&["severity".to_string()]).unwrap_err();
    assert!(err.to_string().contains("FIELD=VALUE"));
}

#[test]
fn filter_with_empty_field_is_rejected() {
    assert!(build_query(&["=5".to_string()]).is_err());
}

#[test]
fn filter_values_keep_their_literal_kind() {
    assert_eq!(filter_value("42"), QueryValue::Integer(42));
    assert_eq!(filter_value("true"), QueryValue::Bool(true));
    assert_eq!(filter_value("null"), QueryValue::Null);
    assert_eq!(filter_value("a=b"), QueryValue::String("a=b".to_string()));
}

#[test]
fn filter_value_may_contain_equals_sign() {
    let query = build_query(&["description=a=b".to_string()]).unwrap().unwrap();
    assert_eq!(query.as_str(), "description EQ ^a=b^");
}

// ============================================================================
// SECTION: Ordering
// ============================================================================

#[test]
fn order_defaults_to_ascending() {
    assert_eq!(parse_order("name").unwrap(), ("name", true));
    assert_eq!(parse_order("name:asc").unwrap(), ("name", true));
    assert_eq!(parse_order("id:desc").unwrap(), ("id", false));
}

#[test]
fn order_rejects_unknown_direction_and_empty_field() {
    assert!(parse_order("id:down").is_err());
    assert!(parse_order(":desc").is_err());
}

// ============================================================================
// SECTION: Argument Surface
// ============================================================================

#[test]
fn global_scope_flags_follow_subcommands() {
    let cli = Cli::try_parse_from([
        "octane",
        "entities",
        "list",
        "defects",
        "--fields",
        "name,severity",
        "--shared-space",
        "1001",
        "--workspace",
        "1002",
    ])
    .unwrap();
    assert_eq!(cli.shared_space.as_deref(), Some("1001"));
    assert_eq!(cli.workspace, Some(1002));
    match cli.command {
        Commands::Entities {
            command: EntitiesCommand::List(list),
        } => {
            assert_eq!(list.entity, "defects");
            assert_eq!(list.fields, vec!["name".to_string(), "severity".to_string()]);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn workspace_conflicts_with_all_workspaces() {
    let result =
        Cli::try_parse_from(["octane", "context", "--workspace", "1002", "--all-workspaces"]);
    assert!(result.is_err());
}

#[test]
fn paging_all_conflicts_with_limit() {
    let result =
        Cli::try_parse_from(["octane", "entities", "list", "defects", "--all", "--limit", "5"]);
    assert!(result.is_err());
}
