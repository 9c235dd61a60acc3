use super::*;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn write_then_read_round_trip() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();

    let rows: Vec<Row> = vec![vec![1, 10], vec![2, -20], vec![3, 30]];
    store.write_page("t", 0, &rows).unwrap();

    let page = store.read_page("t", 0).unwrap();
    assert_eq!(page.rows(), rows.as_slice());
    assert_eq!(page.row_count(), 3);
    assert_eq!(page.column_count(), 2);
}

#[test]
fn row_past_valid_count_is_none() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();
    store.write_page("t", 0, &[vec![7]]).unwrap();

    let page = store.read_page("t", 0).unwrap();
    assert_eq!(page.row(0), Some(&vec![7]));
    assert_eq!(page.row(1), None);
}

#[test]
fn pages_of_one_relation_are_distinct_files() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();
    store.write_page("t", 0, &[vec![1]]).unwrap();
    store.write_page("t", 1, &[vec![2]]).unwrap();

    assert_eq!(store.read_page("t", 0).unwrap().rows(), &[vec![1]]);
    assert_eq!(store.read_page("t", 1).unwrap().rows(), &[vec![2]]);
    assert!(store.page_path("t", 0).exists());
    assert!(store.page_path("t", 1).exists());
}

#[test]
fn overwrite_replaces_content() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();
    store.write_page("t", 0, &[vec![1, 2]]).unwrap();
    store.write_page("t", 0, &[vec![3, 4], vec![5, 6]]).unwrap();

    let page = store.read_page("t", 0).unwrap();
    assert_eq!(page.rows(), &[vec![3, 4], vec![5, 6]]);
}

#[test]
fn write_leaves_no_scratch_file() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();
    store.write_page("t", 0, &[vec![1]]).unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|n| n.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "scratch files left: {leftovers:?}");
}

#[test]
fn delete_page_removes_file() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();
    store.write_page("t", 0, &[vec![1]]).unwrap();
    store.delete_page("t", 0).unwrap();

    assert!(!store.page_path("t", 0).exists());
    assert!(store.read_page("t", 0).is_err());
}

#[test]
fn rename_page_moves_ownership() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();
    store.write_page("scratch", 2, &[vec![9]]).unwrap();
    store.rename_page("scratch", "t", 2).unwrap();

    assert!(!store.page_path("scratch", 2).exists());
    assert_eq!(store.read_page("t", 2).unwrap().rows(), &[vec![9]]);
}

#[test]
fn read_missing_page_is_storage_error() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();
    let err = store.read_page("ghost", 0).unwrap_err();
    assert!(matches!(err, common::DbError::Storage(_)));
}

#[test]
fn empty_page_round_trips() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();
    store.write_page("t", 0, &[]).unwrap();

    let page = store.read_page("t", 0).unwrap();
    assert_eq!(page.row_count(), 0);
    assert_eq!(page.row(0), None);
}
