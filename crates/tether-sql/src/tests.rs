use super::*;

#[test]
fn test_lit_plain() {
    assert_eq!(format!("{}", Lit("hello")), "'hello'");
    assert_eq!(format!("{}", Lit("")), "''");
}

#[test]
fn test_lit_embedded_quote() {
    assert_eq!(format!("{}", Lit("it's")), "'it''s'");
    assert_eq!(format!("{}", Lit("''")), "''''''");
}

#[test]
fn test_ident_plain() {
    assert_eq!(quote_ident("user"), "\"user\"");
    assert_eq!(quote_ident("order"), "\"order\"");
}

#[test]
fn test_ident_embedded_quote() {
    assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
}

#[test]
fn test_ident_percent_passes_through() {
    // No client-side substitution pass happens on our statement text, so a
    // literal % needs no doubling.
    assert_eq!(quote_ident("pct%col"), "\"pct%col\"");
}

#[test]
fn test_quote_qualified() {
    assert_eq!(quote_qualified("public", "t"), "\"public\".\"t\"");
    assert_eq!(
        quote_qualified("odd schema", "odd\"name"),
        "\"odd schema\".\"odd\"\"name\""
    );
}

#[test]
fn test_conninfo_value_plain() {
    assert_eq!(conninfo_value("localhost"), "localhost");
    assert_eq!(conninfo_value("5432"), "5432");
}

#[test]
fn test_conninfo_value_quoted() {
    assert_eq!(conninfo_value(""), "''");
    assert_eq!(conninfo_value("two words"), "'two words'");
    assert_eq!(conninfo_value("pa'ss"), "'pa\\'ss'");
    assert_eq!(conninfo_value("back\\slash"), "'back\\\\slash'");
}

#[test]
fn test_server_name_deterministic() {
    assert_eq!(
        server_name("db.example.com", "appdata"),
        "tether_db_example_com_appdata"
    );
    // Same inputs, same name.
    assert_eq!(
        server_name("db.example.com", "appdata"),
        server_name("db.example.com", "appdata")
    );
}

#[test]
fn test_server_name_folds_case_and_symbols() {
    assert_eq!(server_name("10.0.0.7", "My-DB"), "tether_10_0_0_7_my_db");
}

#[test]
fn test_server_name_truncated_to_pg_limit() {
    let long = "a".repeat(100);
    let name = server_name(&long, "db");
    assert_eq!(name.len(), 63);
    assert!(name.starts_with("tether_aaaa"));
}
