use super::*;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn pool_with_pages(capacity: usize, relations: &[(&str, usize)]) -> (BufferPool, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();
    for (relation, blocks) in relations {
        for block in 0..*blocks {
            store
                .write_page(relation, block, &[vec![block as i64]])
                .unwrap();
        }
    }
    (BufferPool::new(store, capacity), dir)
}

#[test]
fn fifo_evicts_oldest_arrival() {
    let (mut pool, _dir) = pool_with_pages(3, &[("t", 4)]);

    // Access A, B, C, D in order with capacity 3.
    for block in 0..4 {
        pool.get_page("t", block).unwrap();
    }

    assert!(!pool.contains("t", 0));
    assert!(pool.contains("t", 1));
    assert!(pool.contains("t", 2));
    assert!(pool.contains("t", 3));
    assert_eq!(pool.resident_count(), 3);

    // Re-accessing A is a miss that evicts B.
    pool.get_page("t", 0).unwrap();
    assert!(pool.contains("t", 0));
    assert!(!pool.contains("t", 1));
}

#[test]
fn hit_does_not_promote() {
    let (mut pool, _dir) = pool_with_pages(2, &[("t", 3)]);

    pool.get_page("t", 0).unwrap();
    pool.get_page("t", 1).unwrap();
    // Hit on the oldest page; FIFO order must not change.
    pool.get_page("t", 0).unwrap();
    // The next miss still evicts page 0, the oldest arrival.
    pool.get_page("t", 2).unwrap();

    assert!(!pool.contains("t", 0));
    assert!(pool.contains("t", 1));
    assert!(pool.contains("t", 2));
}

#[test]
fn resident_count_never_exceeds_capacity() {
    let (mut pool, _dir) = pool_with_pages(3, &[("t", 10)]);
    for block in 0..10 {
        pool.get_page("t", block).unwrap();
        assert!(pool.resident_count() <= 3);
    }
}

#[test]
fn write_page_does_not_insert() {
    let (mut pool, _dir) = pool_with_pages(3, &[]);
    pool.write_page("t", 0, &[vec![42]]).unwrap();

    assert_eq!(pool.resident_count(), 0);
    assert_eq!(pool.get_page("t", 0).unwrap().rows(), &[vec![42]]);
}

#[test]
fn stale_copy_stays_until_dropped() {
    let (mut pool, _dir) = pool_with_pages(3, &[("t", 1)]);

    pool.get_page("t", 0).unwrap();
    pool.write_page("t", 0, &[vec![99]]).unwrap();
    // The resident copy is the old version until dropped.
    assert_eq!(pool.get_page("t", 0).unwrap().rows(), &[vec![0]]);

    pool.drop_page("t", 0);
    assert_eq!(pool.get_page("t", 0).unwrap().rows(), &[vec![99]]);
}

#[test]
fn drop_page_frees_a_slot() {
    let (mut pool, _dir) = pool_with_pages(2, &[("t", 3)]);
    pool.get_page("t", 0).unwrap();
    pool.get_page("t", 1).unwrap();

    pool.drop_page("t", 0);
    assert_eq!(pool.resident_count(), 1);

    // A new page fits without evicting page 1.
    pool.get_page("t", 2).unwrap();
    assert!(pool.contains("t", 1));
    assert!(pool.contains("t", 2));
}

#[test]
fn rename_drops_stale_copies_under_both_names() {
    let (mut pool, _dir) = pool_with_pages(4, &[("old", 1), ("new", 1)]);
    pool.get_page("old", 0).unwrap();
    pool.get_page("new", 0).unwrap();

    pool.rename_page("old", "new", 0).unwrap();

    assert!(!pool.contains("old", 0));
    assert!(!pool.contains("new", 0));
    // The renamed content is what a fresh fetch sees.
    assert_eq!(pool.get_page("new", 0).unwrap().rows(), &[vec![0]]);
    assert!(pool.get_page("old", 0).is_err());
}

#[test]
fn delete_page_removes_pool_entry_and_file() {
    let (mut pool, _dir) = pool_with_pages(2, &[("t", 1)]);
    pool.get_page("t", 0).unwrap();

    pool.delete_page("t", 0).unwrap();
    assert!(!pool.contains("t", 0));
    assert!(pool.get_page("t", 0).is_err());
}

#[test]
#[should_panic(expected = "pool capacity must be > 0")]
fn zero_capacity_panics() {
    let dir = tempdir().unwrap();
    let store = PageStore::new(dir.path()).unwrap();
    let _pool = BufferPool::new(store, 0);
}
