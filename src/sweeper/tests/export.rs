use super::*;

#[test]
fn test_csv_export_reloads_equal() -> Result<()> {
    let csv = b"name,score,rank\nAda,1.5,1\nBob,,2\nCy,3.25,3\n";
    let t = load_bytes(csv, FileFormat::Csv, 100)?;

    let payload = export_table(&t, FileFormat::Csv)?;
    assert_eq!(payload.file_name, "output.csv");
    assert_eq!(payload.media_type, "text/csv");
    assert!(payload.bytes.starts_with(b"name,score,rank\n"));

    let reloaded = load_bytes(&payload.bytes, FileFormat::Csv, 100)?;
    assert!(reloaded.equals(&t));
    Ok(())
}

#[test]
fn test_excel_export_reloads_equal() -> Result<()> {
    let t = table(df!(
        "name" => [Some("Ada"), Some("R&D <Bob>"), None],
        "rank" => [1i64, 2, 3],
        "score" => [Some(1.5), None, Some(-0.25)]
    )?)?;

    let payload = export_table(&t, FileFormat::Excel)?;
    assert_eq!(payload.file_name, "output.xlsx");
    assert!(payload.bytes.starts_with(b"PK"), "xlsx is a zip archive");

    let reloaded = load_bytes(&payload.bytes, FileFormat::Excel, 100)?;
    assert_eq!(reloaded.column_names(), t.column_names());
    assert_eq!(reloaded.kinds(), t.kinds());
    assert_eq!(strings(&reloaded, "name")?, strings(&t, "name")?);
    assert_eq!(floats(&reloaded, "rank")?, floats(&t, "rank")?);
    assert_eq!(floats(&reloaded, "score")?, floats(&t, "score")?);
    Ok(())
}

#[test]
fn test_json_export_is_indented_rows_in_column_order() -> Result<()> {
    let t = table(df!(
        "zeta" => ["a", "b"],
        "alpha" => [1i64, 2]
    )?)?;

    let payload = export_table(&t, FileFormat::Json)?;
    assert_eq!(payload.media_type, "application/json");
    let text = String::from_utf8(payload.bytes)?;
    assert!(text.starts_with("[\n  {\n    \"zeta\": \"a\",\n    \"alpha\": 1\n  },"));

    let rows: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(rows.as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn test_export_does_not_mutate() -> Result<()> {
    let t = table(df!("x" => [Some(1.0), None])?)?;
    let before = t.clone();
    export_table(&t, FileFormat::Json)?;
    export_table(&t, FileFormat::Csv)?;
    assert!(t.equals(&before));
    Ok(())
}
