use anyhow::Result;
use csv::ReaderBuilder;
use promprint_cleaning::pipeline::register::register_export_path;
use promprint_cleaning::{run_register, CleaningError};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const HEADER: &str = "Register Year,Register Block,Page in PDF,Line number,Book Title,Publisher";

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let header = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}

#[test]
fn test_register_export() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("test_register.csv");
    fs::write(
        &input,
        format!(
            "{}\n1863b,A,12,3,\"The Pilgrim's Progress, Vol. 2\",Nisbet\n1863b,A,12,4,JUST MY LUCK,Routledge\n",
            HEADER
        ),
    )?;
    let output = dir.path().join("out");

    let summary = run_register(&input, &output)?;

    let path = register_export_path(&input, &output);
    assert_eq!(path, output.join("test_register_export.csv"));
    assert!(path.exists());

    let (header, rows) = read_csv(&path)?;
    assert_eq!(header.first().map(String::as_str), Some("id"));
    assert_eq!(header.last().map(String::as_str), Some("clean_title"));
    assert_eq!(&header[1..header.len() - 1], HEADER.split(',').collect::<Vec<_>>());

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "1863b:0");
    assert_eq!(rows[1][0], "1863b:1");
    assert_eq!(rows[0][5], "The Pilgrim's Progress, Vol. 2");
    assert_eq!(rows[0].last().map(String::as_str), Some("the pilgrim s progress"));
    assert_eq!(rows[1].last().map(String::as_str), Some("just my luck"));

    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.rows_written["test_register_export.csv"], 2);
    Ok(())
}

#[test]
fn test_extra_columns_are_kept() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("extra.csv");
    fs::write(
        &input,
        format!("Notes,{}\nsmudged,1864a,B,40,1,Hymns,Nelson\n", HEADER),
    )?;

    run_register(&input, dir.path())?;

    let (header, rows) = read_csv(&register_export_path(&input, dir.path()))?;
    assert_eq!(header[1], "Notes");
    assert_eq!(rows[0][0], "1864a:0");
    assert_eq!(rows[0][1], "smudged");
    assert_eq!(rows[0].last().map(String::as_str), Some("hymns"));
    Ok(())
}

#[test]
fn test_missing_column_fails_and_names_it() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("bad.csv");
    fs::write(
        &input,
        "Register Year,Register Block,Page in PDF,Line number,Title,Publisher\n1863b,A,1,1,Hymns,Nelson\n",
    )?;

    let err = run_register(&input, dir.path()).unwrap_err();
    match &err {
        CleaningError::MissingHeaders { missing, .. } => {
            assert_eq!(missing, &vec!["Book Title".to_string()]);
        }
        other => panic!("expected MissingHeaders, got {:?}", other),
    }
    assert!(err.to_string().contains("Book Title"));
    assert!(!register_export_path(&input, dir.path()).exists());
    Ok(())
}

#[test]
fn test_ragged_row_is_skipped() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("ragged.csv");
    fs::write(
        &input,
        format!("{}\n1863b,A,1,1,Hymns,Nelson\n1863b,A,1\n1863b,A,1,3,Psalms,Nelson\n", HEADER),
    )?;

    let summary = run_register(&input, dir.path())?;
    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.rows_skipped, 1);

    let (_, rows) = read_csv(&register_export_path(&input, dir.path()))?;
    let ids: Vec<_> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["1863b:0", "1863b:2"]);
    Ok(())
}

#[test]
fn test_missing_input_file() {
    let dir = tempdir().unwrap();
    let result = run_register(&dir.path().join("nope.csv"), dir.path());
    assert!(matches!(result, Err(CleaningError::InputNotFound(_))));
}
