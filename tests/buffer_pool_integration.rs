//! Integration tests for the buffer pool manager.
//!
//! These tests verify cross-component behavior that unit tests don't cover.

use bplusdb::buffer::BufferPoolManager;
use bplusdb::common::PageId;
use bplusdb::storage::DiskManager;
use bplusdb::{PageType, PAGE_SIZE};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn create_bpm(pool_size: usize) -> (BufferPoolManager, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let dm = DiskManager::create(&path).unwrap();
    (BufferPoolManager::new(pool_size, dm), dir)
}

fn first_record(bpm: &BufferPoolManager, pid: PageId) -> Vec<u8> {
    let guard = bpm.fetch_page_read(pid).unwrap();
    let record = guard.records().next().unwrap().unwrap().to_vec();
    record
}

/// Test data persistence across multiple eviction cycles.
#[test]
fn test_data_persistence_across_evictions() {
    let (bpm, _dir) = create_bpm(4);

    // Create 10 pages with unique data (forces evictions)
    let mut page_ids = vec![];
    for i in 0u8..10 {
        let mut guard = bpm.new_page().unwrap();
        guard.init(PageType::BTreeLeaf);
        assert!(guard.append_record(&[i, i.wrapping_mul(3)], PAGE_SIZE));
        page_ids.push(guard.page_id());
    }

    // Read all back - verifies evicted pages were flushed with valid checksums
    for (i, &pid) in page_ids.iter().enumerate() {
        let i = i as u8;
        assert_eq!(first_record(&bpm, pid), vec![i, i.wrapping_mul(3)]);
    }
    assert!(bpm.stats().snapshot().evictions >= 6);
}

/// Test flush and reload across BPM instances.
#[test]
fn test_flush_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let data = b"persistent!";

    let pid;

    // First session: create and write
    {
        let dm = DiskManager::create(&path).unwrap();
        let bpm = BufferPoolManager::new(10, dm);

        let mut guard = bpm.new_page().unwrap();
        pid = guard.page_id();
        guard.init(PageType::Meta);
        assert!(guard.append_record(data, PAGE_SIZE));
        drop(guard);

        bpm.flush_all_pages().unwrap();
    }

    // Second session: verify data
    {
        let dm = DiskManager::open(&path).unwrap();
        let bpm = BufferPoolManager::new(10, dm);

        let guard = bpm.fetch_page_read(pid).unwrap();
        assert_eq!(guard.page_type(), PageType::Meta);
        assert!(guard.verify_checksum());
        drop(guard);
        assert_eq!(first_record(&bpm, pid), data.to_vec());
    }
}

/// Test concurrent writers to different pages.
#[test]
fn test_concurrent_writers() {
    let (bpm, _dir) = create_bpm(10);
    let bpm = Arc::new(bpm);

    let page_ids: Vec<PageId> = (0..5)
        .map(|_| {
            let mut guard = bpm.new_page().unwrap();
            guard.init(PageType::BTreeLeaf);
            guard.page_id()
        })
        .collect();

    let mut handles = vec![];

    for (i, pid) in page_ids.iter().enumerate() {
        let bpm_clone = Arc::clone(&bpm);
        let pid = *pid;

        handles.push(thread::spawn(move || {
            for j in 0..50 {
                let mut guard = bpm_clone.fetch_page_write(pid).unwrap();
                assert!(guard.append_record(&[i as u8, j as u8], PAGE_SIZE));
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    // Each page holds its own writer's records, in order
    for (i, &pid) in page_ids.iter().enumerate() {
        let guard = bpm.fetch_page_read(pid).unwrap();
        assert_eq!(guard.record_count(), 50);
        for (j, record) in guard.records().enumerate() {
            assert_eq!(record.unwrap(), &[i as u8, j as u8]);
        }
    }
}

/// Test stats accuracy under load.
#[test]
fn test_stats_accuracy() {
    let (bpm, _dir) = create_bpm(4);

    let pid = bpm.new_page().unwrap().page_id();

    // Multiple fetches = cache hits
    for _ in 0..5 {
        let _ = bpm.fetch_page_read(pid).unwrap();
    }

    let stats = bpm.stats().snapshot();
    assert!(stats.cache_hits >= 5);
    assert_eq!(stats.pages_allocated, 1);

    // Force eviction
    for _ in 0..4 {
        let _ = bpm.new_page().unwrap();
    }

    let stats = bpm.stats().snapshot();
    assert!(stats.evictions >= 1);
    assert!(stats.hit_rate() > 0.0);
}
