use super::*;
use common::Config;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn engine(block_size: usize) -> (Config, BufferPool, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(dir.path().to_path_buf())
        .block_size(block_size)
        .pool_capacity(4)
        .build();
    let store = PageStore::new(config.temp_dir()).unwrap();
    (config, BufferPool::new(store, 4), dir)
}

fn write_csv(config: &Config, name: &str, content: &str) {
    fs::write(config.csv_path(name), content).unwrap();
}

fn collect_rows(table: &Table, pool: &mut BufferPool) -> Vec<Row> {
    let mut cursor = table.cursor(pool).unwrap();
    let mut rows = Vec::new();
    while let Some(row) = cursor.next_row(pool).unwrap() {
        rows.push(row);
    }
    rows
}

#[test]
fn load_blockifies_and_tracks_statistics() {
    // block_size 32 with two i64 columns -> 2 rows per page.
    let (config, mut pool, _dir) = engine(32);
    write_csv(&config, "t", "id,val\n1,10\n2,20\n3,30\n");

    let mut table = Table::from_csv("t", &config);
    table.load(&config, &mut pool).unwrap();

    assert_eq!(table.columns, vec!["id", "val"]);
    assert_eq!(table.max_rows_per_block, 2);
    assert_eq!(table.row_count, 3);
    assert_eq!(table.block_count, 2);
    assert_eq!(table.rows_per_block, vec![2, 1]);
    assert_eq!(table.distinct_counts, vec![3, 3]);
    assert_eq!(
        collect_rows(&table, &mut pool),
        vec![vec![1, 10], vec![2, 20], vec![3, 30]]
    );
}

#[test]
fn load_strips_whitespace_from_header() {
    let (config, mut pool, _dir) = engine(1000);
    write_csv(&config, "t", " a , b \n1,2\n");

    let mut table = Table::from_csv("t", &config);
    table.load(&config, &mut pool).unwrap();
    assert_eq!(table.columns, vec!["a", "b"]);
}

#[test]
fn load_rejects_duplicate_columns() {
    let (config, mut pool, _dir) = engine(1000);
    write_csv(&config, "t", "a,a\n1,2\n");

    let mut table = Table::from_csv("t", &config);
    let err = table.load(&config, &mut pool).unwrap_err();
    assert!(err.to_string().contains("duplicate column"));
}

#[test]
fn load_rejects_empty_table() {
    let (config, mut pool, _dir) = engine(1000);
    write_csv(&config, "t", "a,b\n");

    let mut table = Table::from_csv("t", &config);
    let err = table.load(&config, &mut pool).unwrap_err();
    assert!(err.to_string().contains("no rows"));
}

#[test]
fn load_rejects_ragged_rows() {
    let (config, mut pool, _dir) = engine(1000);
    write_csv(&config, "t", "a,b\n1,2\n3\n");

    let mut table = Table::from_csv("t", &config);
    assert!(table.load(&config, &mut pool).is_err());
}

#[test]
fn load_counts_distinct_values_not_rows() {
    let (config, mut pool, _dir) = engine(1000);
    write_csv(&config, "t", "a,b\n1,5\n1,6\n2,5\n1,5\n");

    let mut table = Table::from_csv("t", &config);
    table.load(&config, &mut pool).unwrap();
    assert_eq!(table.row_count, 4);
    assert_eq!(table.distinct_counts, vec![2, 2]);
}

#[test]
fn cursor_walks_page_boundaries() {
    let (config, mut pool, _dir) = engine(32);
    write_csv(&config, "t", "a,b\n1,1\n2,2\n3,3\n4,4\n5,5\n");

    let mut table = Table::from_csv("t", &config);
    table.load(&config, &mut pool).unwrap();
    assert_eq!(table.block_count, 3);

    let rows = collect_rows(&table, &mut pool);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[4], vec![5, 5]);
}

#[test]
fn cursor_over_empty_result_table_yields_nothing() {
    let (config, mut pool, _dir) = engine(1000);
    fs::create_dir_all(config.temp_dir()).unwrap();
    let table = Table::with_columns("r", vec!["a".into()], &config).unwrap();

    let mut cursor = table.cursor(&mut pool).unwrap();
    assert_eq!(cursor.next_row(&mut pool).unwrap(), None);
}

#[test]
fn cloned_cursor_forks_position() {
    let (config, mut pool, _dir) = engine(32);
    write_csv(&config, "t", "a,b\n1,1\n2,2\n3,3\n");

    let mut table = Table::from_csv("t", &config);
    table.load(&config, &mut pool).unwrap();

    let mut primary = table.cursor(&mut pool).unwrap();
    assert_eq!(primary.next_row(&mut pool).unwrap(), Some(vec![1, 1]));

    let mut fork = primary.clone();
    assert_eq!(fork.next_row(&mut pool).unwrap(), Some(vec![2, 2]));
    assert_eq!(fork.next_row(&mut pool).unwrap(), Some(vec![3, 3]));

    // The primary is unaffected by the fork's progress.
    assert_eq!(primary.next_row(&mut pool).unwrap(), Some(vec![2, 2]));
}

#[test]
fn cursor_exposes_resident_page_and_repositions() {
    let (config, mut pool, _dir) = engine(32);
    write_csv(&config, "t", "a,b\n1,1\n2,2\n3,3\n");

    let mut table = Table::from_csv("t", &config);
    table.load(&config, &mut pool).unwrap();

    let mut cursor = table.cursor(&mut pool).unwrap();
    assert_eq!(cursor.page_rows(), &[vec![1, 1], vec![2, 2]]);
    assert_eq!(cursor.page_index(), 0);

    cursor.reposition(1, &mut pool).unwrap();
    assert_eq!(cursor.page_rows(), &[vec![3, 3]]);
    assert_eq!(cursor.next_row(&mut pool).unwrap(), Some(vec![3, 3]));
    assert_eq!(cursor.next_row(&mut pool).unwrap(), None);
}

#[test]
fn writer_packs_pages_and_seals_statistics() {
    let (config, mut pool, _dir) = engine(32);
    fs::create_dir_all(config.temp_dir()).unwrap();

    let table = Table::with_columns("r", vec!["a".into(), "b".into()], &config).unwrap();
    let mut writer = TableWriter::new(table);
    for i in 0..5 {
        writer.push(vec![i, i % 2], &mut pool).unwrap();
    }
    let table = writer.finish(&mut pool).unwrap();

    assert_eq!(table.row_count, 5);
    assert_eq!(table.block_count, 3);
    assert_eq!(table.rows_per_block, vec![2, 2, 1]);
    assert_eq!(table.distinct_counts, vec![5, 2]);
}

#[test]
fn result_table_is_temporary_until_export() {
    let (config, mut pool, _dir) = engine(1000);
    fs::create_dir_all(config.temp_dir()).unwrap();

    let table = Table::with_columns("r", vec!["a".into()], &config).unwrap();
    let mut writer = TableWriter::new(table);
    writer.push(vec![1], &mut pool).unwrap();
    let mut table = writer.finish(&mut pool).unwrap();
    assert!(!table.is_permanent(&config));

    table.make_permanent(&config, &mut pool).unwrap();
    assert!(table.is_permanent(&config));
    assert!(config.csv_path("r").exists());
    assert!(!config.temp_csv_path("r").exists());
}

#[test]
fn export_then_load_round_trips() {
    let (config, mut pool, _dir) = engine(32);
    write_csv(&config, "t", "id,val\n3,30\n1,10\n2,20\n");

    let mut table = Table::from_csv("t", &config);
    table.load(&config, &mut pool).unwrap();
    let original = collect_rows(&table, &mut pool);

    // Re-export over the same source, then reload from scratch.
    table.make_permanent(&config, &mut pool).unwrap();
    table.unload(&config, &mut pool).unwrap();

    let mut reloaded = Table::from_csv("t", &config);
    reloaded.load(&config, &mut pool).unwrap();
    assert_eq!(collect_rows(&reloaded, &mut pool), original);
    assert_eq!(reloaded.columns, vec!["id", "val"]);
}

#[test]
fn unload_deletes_pages_and_temp_source() {
    let (config, mut pool, _dir) = engine(1000);
    fs::create_dir_all(config.temp_dir()).unwrap();

    let table = Table::with_columns("r", vec!["a".into()], &config).unwrap();
    let mut writer = TableWriter::new(table);
    writer.push(vec![1], &mut pool).unwrap();
    let table = writer.finish(&mut pool).unwrap();

    let page = pool.store().page_path("r", 0);
    assert!(page.exists());

    table.unload(&config, &mut pool).unwrap();
    assert!(!page.exists());
    assert!(!config.temp_csv_path("r").exists());
}

#[test]
fn unload_keeps_permanent_source() {
    let (config, mut pool, _dir) = engine(1000);
    write_csv(&config, "t", "a\n1\n");

    let mut table = Table::from_csv("t", &config);
    table.load(&config, &mut pool).unwrap();
    table.unload(&config, &mut pool).unwrap();

    assert!(config.csv_path("t").exists());
}

#[test]
fn rename_column_checks_both_names() {
    let (config, mut pool, _dir) = engine(1000);
    write_csv(&config, "t", "a,b\n1,2\n");

    let mut table = Table::from_csv("t", &config);
    table.load(&config, &mut pool).unwrap();

    table.rename_column("a", "c").unwrap();
    assert_eq!(table.columns, vec!["c", "b"]);
    assert!(table.rename_column("missing", "x").is_err());
    assert!(table.rename_column("c", "b").is_err());
}
