use super::*;

#[test]
fn domain_set_matches_subdomains_but_not_lookalikes() {
    let set = DomainSet::new(["zap.co.il"]);
    assert!(set.contains_host("zap.co.il"));
    assert!(set.contains_host("www.zap.co.il"));
    assert!(set.contains_host("WWW.ZAP.CO.IL"));
    assert!(!set.contains_host("notzap.co.il"));
    assert!(!set.contains_host("zap.co.il.evil.com"));
}

#[test]
fn domain_set_deduplicates_and_normalizes() {
    let set = DomainSet::new(["Zap.co.il", ".zap.co.il", "zap.co.il", " "]);
    assert_eq!(set.iter().collect::<Vec<_>>(), vec!["zap.co.il"]);
}

#[test]
fn defaults_include_known_aggregators() {
    let config = SourcesConfig::default();
    assert!(config.aggregator_domains.contains_host("www.zap.co.il"));
    assert!(config.aggregator_domains.contains_host("wisebuy.co.il"));
    assert!(!config.aggregator_domains.contains_host("ksp.co.il"));
}

#[test]
fn rate_limit_for_uses_override_then_default() {
    let config = SourcesConfig::default();
    let zap = config.rate_limit_for("www.zap.co.il");
    assert!((zap.rate - 0.5).abs() < f64::EPSILON);
    let other = config.rate_limit_for("example.com");
    assert_eq!(other, config.default_rate_limit);
}

#[test]
fn from_yaml_merges_over_defaults() {
    let yaml = r"
default_rate_limit: { rate: 4.0, capacity: 8 }
rate_limits:
  example.com: { rate: 2.0, capacity: 5 }
ssl_bypass_domains: [broken-certs.co.il]
seller_aliases:
  soferavi: [sofer-avi store]
";
    let config = SourcesConfig::from_yaml(yaml).unwrap();
    assert!((config.default_rate_limit.rate - 4.0).abs() < f64::EPSILON);
    assert!(config.rate_limits.contains_key("zap.co.il"));
    assert!(config.rate_limits.contains_key("example.com"));
    assert!(config.ssl_bypass_domains.contains_host("broken-certs.co.il"));
    assert!(config.ssl_bypass_domains.contains_host("wisebuy.co.il"));
    let soferavi = &config.seller_aliases["soferavi"];
    assert!(soferavi.iter().any(|a| a == "sofer-avi store"));
    assert!(soferavi.iter().any(|a| a == "אבי סופר"));
}

#[test]
fn from_yaml_empty_document_yields_defaults() {
    let config = SourcesConfig::from_yaml("{}").unwrap();
    assert_eq!(config, SourcesConfig::default());
}

#[test]
fn from_yaml_rejects_zero_rate() {
    let yaml = "rate_limits:\n  example.com: { rate: 0.0, capacity: 5 }\n";
    let err = SourcesConfig::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("example.com")));
}

#[test]
fn from_yaml_rejects_fractional_capacity_below_one() {
    let yaml = "default_rate_limit: { rate: 1.0, capacity: 0.5 }\n";
    assert!(matches!(
        SourcesConfig::from_yaml(yaml),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn from_yaml_rejects_non_canonical_alias_key() {
    let yaml = "seller_aliases:\n  \"Sofer Avi\": [x]\n";
    assert!(matches!(
        SourcesConfig::from_yaml(yaml),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn from_yaml_rejects_unknown_sections() {
    let yaml = "proxies: [a]\n";
    assert!(matches!(
        SourcesConfig::from_yaml(yaml),
        Err(ConfigError::SourcesFileParse(_))
    ));
}

#[test]
fn load_sources_missing_file_returns_defaults() {
    let config = load_sources(Path::new("/definitely/not/here/sources.yaml")).unwrap();
    assert_eq!(config, SourcesConfig::default());
}
