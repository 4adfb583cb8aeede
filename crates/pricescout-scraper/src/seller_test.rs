use super::*;

fn normalize(name: &str) -> String {
    SellerNormalizer::default().normalize(name, None)
}

#[test]
fn hebrew_and_english_spellings_converge() {
    for name in ["אבי סופר", "סופראבי", "Soferavi", "SOFERAVI", "Sofer Avi"] {
        assert_eq!(normalize(name), "soferavi", "{name}");
    }
}

#[test]
fn business_suffixes_do_not_block_alias_match() {
    assert_eq!(normalize("KSP בע\"מ"), "ksp");
    assert_eq!(normalize("Ivory Store"), "ivory");
    assert_eq!(normalize("מחסני חשמל"), "machsaneihashmal");
}

#[test]
fn alias_match_is_whole_name_not_substring() {
    assert_ne!(normalize("BUG Electric"), "bug");
    assert_ne!(normalize("Debugger Shop"), "bug");
    assert_eq!(normalize("BUG"), "bug");
}

#[test]
fn domain_label_used_when_not_an_aggregator() {
    let n = SellerNormalizer::default();
    assert_eq!(
        n.normalize("Some Shop Name", Some("https://www.shop-il.co.il/item/1")),
        "shopil"
    );
    assert_eq!(
        n.normalize("Electric World", Some("https://www.zap.co.il/fs.aspx?x=1")),
        "electricworld"
    );
    assert_eq!(
        n.normalize("unknown", Some("https://www.ivory.co.il/catalog.php?id=9")),
        "ivory"
    );
}

#[test]
fn generic_normalization_strips_punctuation_and_keeps_hebrew() {
    assert_eq!(normalize("Electric-World!"), "electricworld");
    assert_eq!(normalize("חשמל  נטו (בע״מ)"), "חשמלנטובעמ");
}

#[test]
fn normalization_is_idempotent() {
    let n = SellerNormalizer::default();
    let samples = [
        "אבי סופר",
        "BUG Electric",
        "bugco il",
        "Store",
        "K.S.P",
        "Pay N Go",
        "חשמל  נטו (בע״מ)",
        "  ",
        "Last Price Ltd",
    ];
    for name in samples {
        let once = n.normalize(name, None);
        assert_eq!(n.normalize(&once, None), once, "{name}");
    }
}

#[test]
fn canonical_keys_normalize_to_themselves() {
    let sources = SourcesConfig::default();
    let n = SellerNormalizer::from_sources(&sources);
    for key in sources.seller_aliases.keys() {
        assert_eq!(n.normalize(key, None), *key);
    }
}

#[test]
fn lowercasing_that_adds_combining_marks_stays_idempotent() {
    assert_eq!(generic_key("İstanbul"), "istanbul");
    assert_eq!(generic_key(&generic_key("İstanbul")), generic_key("İstanbul"));

    let n = SellerNormalizer::default();
    for name in ["İstanbul Elektrik", "ΣΟΦΕΡ", "Ärger Shop"] {
        let once = n.normalize(name, None);
        assert_eq!(n.normalize(&once, None), once, "{name}");
    }
}
