use ccdict::SearchCommand;
use ccdict_core::{Config, DictError, DictField, MatchMode, SearchExpr, SearchTerm};

#[test]
fn plain_text_command() {
    let cmd = SearchCommand::parse("吼").unwrap();
    assert_eq!(cmd.expr, Some(SearchExpr::Text("吼".into())));
    assert_eq!(cmd.use_regex, None);
    assert_eq!(cmd.search_field, None);
}

#[test]
fn quoted_text_matches_whole_field() {
    let cmd = SearchCommand::parse(r#""to roar""#).unwrap();
    assert_eq!(cmd.expr, Some(SearchExpr::Text("^to roar$".into())));
    assert_eq!(cmd.use_regex, Some(true));
}

#[test]
fn explicit_regex_flag_keeps_quoted_text_verbatim() {
    let cmd = SearchCommand::parse(r#"0 "to roar""#).unwrap();
    assert_eq!(cmd.expr, Some(SearchExpr::Text("to roar".into())));
    assert_eq!(cmd.use_regex, Some(false));
}

#[test]
fn term_list_with_display_fields_and_indent() {
    let cmd = SearchCommand::parse(r#"(jyutping "jyun." 1) (english surname) [trad jyut eng] >>"#).unwrap();
    assert_eq!(
        cmd.expr,
        Some(SearchExpr::Terms(vec![
            SearchTerm {
                field: DictField::Jyutping,
                value: "jyun.".into(),
                mode: Some(MatchMode::Regex),
            },
            SearchTerm::new(DictField::English, "surname"),
        ]))
    );
    assert_eq!(
        cmd.fields,
        Some(vec![DictField::Traditional, DictField::Jyutping, DictField::English])
    );
    assert_eq!(cmd.indent.as_deref(), Some(">>"));
}

#[test]
fn legacy_field_names() {
    let cmd = SearchCommand::parse("(DE_FLD_TRAD 艦) [DE_FLD_TRAD DE_FLD_CJCODE]").unwrap();
    assert_eq!(
        cmd.expr,
        Some(SearchExpr::Terms(vec![SearchTerm::new(DictField::Traditional, "艦")]))
    );
    assert_eq!(cmd.fields, Some(vec![DictField::Traditional, DictField::CjCode]));
}

#[test]
fn search_field_word() {
    let cmd = SearchCommand::parse("laam6 jyutping").unwrap();
    let (search, _) = cmd.options(&Config::default());
    assert_eq!(search.search_field, Some(DictField::Jyutping));
}

#[test]
fn empty_command_has_no_expression() {
    let cmd = SearchCommand::parse("   ").unwrap();
    assert_eq!(cmd.expr, None);
}

#[test]
fn syntax_errors() {
    for bad in ["(english roar", "[trad eng", "\"open quote", "(english)"] {
        let err = SearchCommand::parse(bad).unwrap_err();
        assert!(matches!(err, DictError::CommandSyntax(_)), "{}: {:?}", bad, err);
    }
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(matches!(
        SearchCommand::parse("(colour red)"),
        Err(DictError::UnknownField(_))
    ));
    assert!(matches!(
        SearchCommand::parse("吼 [trad colour]"),
        Err(DictError::UnknownField(_))
    ));
}

#[test]
fn terms_cannot_follow_text() {
    assert!(matches!(
        SearchCommand::parse("吼 (english roar)"),
        Err(DictError::CommandSyntax(_))
    ));
}
