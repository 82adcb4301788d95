use super::*;
use crate::error::SweeperError;
use std::io::Write as _;

#[test]
fn test_csv_kinds_are_inferred() -> Result<()> {
    let csv = b"name,age,joined,member\nAda,36,2024-01-05,true\nBob,,2023-11-30,false\n";
    let t = load_bytes(csv, FileFormat::Csv, 100)?;

    assert_eq!(
        t.kinds(),
        &[
            ColumnKind::Text,
            ColumnKind::Numeric,
            ColumnKind::Datetime,
            ColumnKind::Categorical
        ]
    );
    assert_eq!(t.series("age")?.null_count(), 1);
    assert_eq!(
        strings(&t, "member")?,
        vec![Some("true".into()), Some("false".into())]
    );
    Ok(())
}

#[test]
fn test_csv_empty_field_loads_as_null() -> Result<()> {
    let t = load_bytes(b"id,email\n1,a@b.com\n2,\n", FileFormat::Csv, 100)?;
    assert_eq!(t.series("email")?.null_count(), 1);
    Ok(())
}

#[test]
fn test_json_array_and_lines() -> Result<()> {
    let array = br#"[{"name": "Ada", "age": 36}, {"name": "Bob", "age": null}]"#;
    let t = load_bytes(array, FileFormat::Json, 100)?;
    assert_eq!(t.column_names(), vec!["name".to_owned(), "age".to_owned()]);
    assert_eq!(t.kind_of("age")?, ColumnKind::Numeric);
    assert_eq!(t.height(), 2);

    let lines = b"{\"name\": \"Ada\"}\n{\"name\": \"Bob\"}\n";
    let t = load_bytes(lines, FileFormat::Json, 100)?;
    assert_eq!(t.height(), 2);
    assert_eq!(t.kind_of("name")?, ColumnKind::Text);
    Ok(())
}

#[test]
fn test_malformed_json_is_load_error() {
    assert!(matches!(
        load_bytes(b"   ", FileFormat::Json, 100),
        Err(SweeperError::Load(_))
    ));
    assert!(matches!(
        load_bytes(b"[{\"a\": ", FileFormat::Json, 100),
        Err(SweeperError::Load(_))
    ));
}

#[test]
fn test_malformed_excel_is_load_error() {
    assert!(matches!(
        load_bytes(b"name,age\nAda,36\n", FileFormat::Excel, 100),
        Err(SweeperError::Load(_))
    ));
}

#[test]
fn test_load_file_picks_format_from_extension() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("people.csv");
    let mut file = std::fs::File::create(&path)?;
    file.write_all(b"name,age\nAda,36\n")?;
    drop(file);

    let t = load_file(&path, 100)?;
    assert_eq!(t.height(), 1);

    let unsupported = dir.path().join("people.txt");
    std::fs::write(&unsupported, "name\nAda\n")?;
    assert!(matches!(
        load_file(&unsupported, 100),
        Err(SweeperError::Load(_))
    ));
    assert!(matches!(
        load_file(&dir.path().join("missing.csv"), 100),
        Err(SweeperError::Load(_))
    ));
    Ok(())
}

#[test]
fn test_file_format_from_name() {
    assert_eq!(FileFormat::from_file_name("a.CSV").ok(), Some(FileFormat::Csv));
    assert_eq!(FileFormat::from_file_name("a.xls").ok(), Some(FileFormat::Excel));
    assert_eq!(FileFormat::from_file_name("a.json").ok(), Some(FileFormat::Json));
    assert!(FileFormat::from_file_name("a").is_err());
}
