use clap::Parser;

use super::*;

#[test]
fn parses_search_with_defaults() {
    let cli = Cli::try_parse_from(["pricescout", "search", "Samsung UE55AU7100"])
        .expect("expected valid cli args");

    assert!(!cli.no_cache);
    assert!(matches!(
        cli.command,
        Commands::Search { ref query, ref country, max_results: 10 }
            if query == "Samsung UE55AU7100" && country == "IL"
    ));
}

#[test]
fn no_cache_flag_is_global() {
    let cli = Cli::try_parse_from(["pricescout", "contact", "https://shop.example", "--no-cache"])
        .expect("expected valid cli args");
    assert!(cli.no_cache);
    assert!(matches!(cli.command, Commands::Contact { .. }));
}

#[test]
fn aggregate_requires_at_least_one_query() {
    assert!(Cli::try_parse_from(["pricescout", "aggregate"]).is_err());

    let cli = Cli::try_parse_from(["pricescout", "aggregate", "tv", "soundbar", "--top", "3"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Aggregate { ref queries, top: 3, .. } if queries.len() == 2
    ));
}

#[test]
fn parses_cache_clear_with_type() {
    let cli = Cli::try_parse_from(["pricescout", "cache", "clear", "--cache-type", "contact"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Cache {
            command: CacheCommands::Clear { cache_type: Some(ref t) }
        } if t == "contact"
    ));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["pricescout"]).is_err());
}

#[test]
fn long_names_are_truncated_on_char_boundaries() {
    assert_eq!(truncate("חנות אלקטרוניקה גדולה", 4), "חנות...");
    assert_eq!(truncate("KSP", 10), "KSP");
}
