//! # Column Definition Parsing Tests

use nl2sql::{parse_definition, ColumnType, QueryError};

/// A well-formed list parses in declaration order, whitespace tolerated.
#[test]
fn test_parses_column_list_in_order() -> anyhow::Result<()> {
    let columns = parse_definition("name(text),  age ( int ) , gpa(float)")?;
    let rendered: Vec<(&str, ColumnType)> = columns
        .iter()
        .map(|c| (c.name.as_str(), c.column_type))
        .collect();
    assert_eq!(
        rendered,
        vec![
            ("name", ColumnType::Text),
            ("age", ColumnType::Integer),
            ("gpa", ColumnType::Real),
        ]
    );
    Ok(())
}

/// Type tags map case-insensitively, with aliases for integer and real.
#[test]
fn test_type_tag_aliases() -> anyhow::Result<()> {
    let columns = parse_definition(
        "a(INT), b(Integer), c(real), d(FLOAT), e(date), f(DateTime), g(text)",
    )?;
    let types: Vec<ColumnType> = columns.iter().map(|c| c.column_type).collect();
    assert_eq!(
        types,
        vec![
            ColumnType::Integer,
            ColumnType::Integer,
            ColumnType::Real,
            ColumnType::Real,
            ColumnType::Date,
            ColumnType::DateTime,
            ColumnType::Text,
        ]
    );
    Ok(())
}

/// Unknown type tags fall back to text rather than failing.
#[test]
fn test_unknown_type_falls_back_to_text() -> anyhow::Result<()> {
    let columns = parse_definition("notes(varchar)")?;
    assert_eq!(columns[0].column_type, ColumnType::Text);
    Ok(())
}

/// Underscored names are fine; a trailing comma leaves an empty part that
/// is skipped.
#[test]
fn test_underscores_and_trailing_comma() -> anyhow::Result<()> {
    let columns = parse_definition("_private(int), created_at(datetime),")?;
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].name, "_private");
    Ok(())
}

/// A malformed part is rejected and named in the error.
#[test]
fn test_malformed_part_is_named() {
    let err = parse_definition("name(text), age int").unwrap_err();
    match err {
        QueryError::InvalidDefinition(part) => assert_eq!(part, "age int"),
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Names may not start with a digit.
#[test]
fn test_leading_digit_is_rejected() {
    assert!(matches!(
        parse_definition("1st(int)").unwrap_err(),
        QueryError::InvalidDefinition(_)
    ));
}

/// An input with no definitions at all is an error, not an empty schema.
#[test]
fn test_empty_input_is_rejected() {
    for input in ["", "   ", ",,"] {
        assert!(matches!(
            parse_definition(input).unwrap_err(),
            QueryError::InvalidDefinition(_)
        ));
    }
}
