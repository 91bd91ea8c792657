use ergraph_path::{parse_path, Path, PathParseError};

fn t(name: &str) -> Path {
    Path::term(name)
}

#[test]
fn parses_default_relationship_route() {
    let p = parse_path("~b/*/c").expect("parse");
    assert_eq!(
        p,
        Path::join(Path::inverse(t("b")), Path::join(Path::absolute(), t("c")))
    );
}

#[test]
fn parses_backfilled_path_with_two_conjuncts() {
    let p = parse_path("f_name/~name&f_parent_name/~parent_name").expect("parse");
    assert_eq!(
        p,
        Path::intersection(
            Path::join(t("f_name"), Path::inverse(t("name"))),
            Path::join(t("f_parent_name"), Path::inverse(t("parent_name"))),
        )
    );
}

#[test]
fn inverse_of_group_is_structural() {
    // `~` is kept as a node; it is not pushed through the join.
    let p = parse_path("~(a/s/~b&b_name/~name)").expect("parse");
    assert_eq!(
        p,
        Path::inverse(Path::intersection(
            Path::join(t("a"), Path::join(t("s"), Path::inverse(t("b")))),
            Path::join(t("b_name"), Path::inverse(t("name"))),
        ))
    );
}

#[test]
fn double_inverse_is_kept() {
    let p = parse_path("~~parent").expect("parse");
    assert_eq!(p, Path::inverse(Path::inverse(t("parent"))));
}

#[test]
fn whitespace_between_tokens_is_ignored() {
    let spaced = parse_path(" parent / s & ~ name ").expect("parse");
    let tight = parse_path("parent/s&~name").expect("parse");
    assert_eq!(spaced, tight);
}

#[test]
fn canonical_display_reparses() {
    let text = "~a/*/c&a/s/~b&b_name/~name";
    let p = parse_path(text).expect("parse");
    let reparsed = parse_path(&p.to_string()).expect("reparse");
    assert_eq!(reparsed, p);
}

#[test]
fn rejects_invalid_characters() {
    assert_eq!(
        parse_path("a.b"),
        Err(PathParseError::InvalidCharacter { offset: 1 })
    );
}

#[test]
fn rejects_unterminated_literal() {
    assert!(matches!(
        parse_path("kind/'open"),
        Err(PathParseError::InvalidCharacter { offset: 5 })
    ));
}

#[test]
fn error_messages_name_the_offending_token() {
    let err = parse_path("a//&").unwrap_err();
    assert_eq!(
        err.to_string(),
        "unexpected `&` at offset 3, expected identifier after `/`"
    );
    let err = parse_path("a b").unwrap_err();
    assert_eq!(
        err.to_string(),
        "unexpected identifier `b` at offset 2, expected end of path"
    );
}
