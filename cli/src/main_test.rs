use super::*;

use clap::CommandFactory;

// =============================================================================
// argument parsing
// =============================================================================

#[test]
fn cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn parses_login_with_redirect() {
    let cli = Cli::try_parse_from([
        "finsight", "auth", "login", "--email", "a@b.com", "--password", "pw", "--redirect", "?redirect=%2Finsights",
    ])
    .unwrap();
    match cli.command {
        Command::Auth(AuthCommand { command: AuthSubcommand::Login { email, redirect, .. } }) => {
            assert_eq!(email, "a@b.com");
            assert_eq!(guard::login_redirect_target(&redirect), "/insights");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn analytics_trends_defaults_to_three_months() {
    let cli = Cli::try_parse_from(["finsight", "analytics", "trends"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Analytics(AnalyticsCommand { command: AnalyticsSubcommand::Trends { months: 3 } })
    ));
}

#[test]
fn insights_defaults() {
    let cli = Cli::try_parse_from(["finsight", "insights", "list"]).unwrap();
    assert!(matches!(cli.command, Command::Insights(InsightsCommand { command: InsightsSubcommand::List { limit: 10 } })));

    let cli = Cli::try_parse_from(["finsight", "insights", "generate"]).unwrap();
    match cli.command {
        Command::Insights(InsightsCommand { command: InsightsSubcommand::Generate { period } }) => {
            assert_eq!(period, "month");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

// =============================================================================
// view mapping
// =============================================================================

#[test]
fn auth_commands_map_to_auth_views() {
    let cli = Cli::try_parse_from(["finsight", "auth", "google", "--credential", "c"]).unwrap();
    assert!(guard::is_auth_view(view_path(&cli.command)));
}

#[test]
fn data_commands_map_to_protected_views() {
    for args in [
        vec!["finsight", "transactions", "list"],
        vec!["finsight", "analytics", "anomalies"],
        vec!["finsight", "upload", "x.csv"],
        vec!["finsight", "auth", "status"],
    ] {
        let cli = Cli::try_parse_from(&args).unwrap();
        assert_eq!(guard::classify(view_path(&cli.command)), guard::PathClass::Protected, "{args:?}");
    }
}

#[test]
fn navigator_tracks_location() {
    let navigator = TerminalNavigator::at("/transactions");
    navigator.navigate(guard::LOGIN_PATH);
    assert_eq!(navigator.current_path(), "/auth/login");
}

// =============================================================================
// helpers
// =============================================================================

#[test]
fn parse_param_splits_on_first_equals() {
    assert_eq!(parse_param("category=food").unwrap(), ("category", "food"));
    assert_eq!(parse_param("q=a=b").unwrap(), ("q", "a=b"));
}

#[test]
fn parse_param_rejects_missing_key() {
    assert!(matches!(parse_param("=x"), Err(CliError::InvalidParam(_))));
    assert!(matches!(parse_param("novalue"), Err(CliError::InvalidParam(_))));
}

#[test]
fn parse_object_requires_object() {
    assert!(parse_object(r#"{"amount": 12.5}"#).is_ok());
    assert!(matches!(parse_object("[1]"), Err(CliError::NotAnObject)));
    assert!(matches!(parse_object("{"), Err(CliError::InvalidJson(_))));
}

#[test]
fn api_errors_display_user_message() {
    let err = CliError::from(ApiError::Server { status: 400, message: "Email already registered".into() });
    assert_eq!(err.to_string(), "Email already registered");
}

#[test]
fn validation_runs_before_network() {
    let err = validation::validate_registration("a@b.com", "alice", "123", "123").unwrap_err();
    assert_eq!(CliError::from(err).to_string(), "Password must be at least 6 characters");
}
