//! Integration tests for the export engine
//!
//! The coordinator runs against an in-memory store so every failure mode of
//! the database can be staged without a live PostgreSQL server.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use txn_export::adapters::store::{FetchedRange, RangeQuery, SequenceBounds, TransactionStore};
use txn_export::config::{
    secret_string, AmountScale, ApplicationConfig, ExportConfig, LoggingConfig, OutputLayout,
    PostgreSQLConfig, ShardConfig, TxnExportConfig,
};
use txn_export::core::export::{ExportCoordinator, ExportErrorType, ExportPhase, ExportRun};
use txn_export::domain::{ActionKind, Result, ShardTable, TransactionRecord, TxnExportError};

const PREFIX: &str = "transaction_";

#[derive(Default)]
struct MemoryStore {
    tables: BTreeMap<String, Vec<TransactionRecord>>,
    unreachable: bool,
    catalog_down: bool,
    broken_bounds: HashSet<String>,
    failing_ranges: HashSet<(String, i64)>,
    unreadable_rows: HashSet<(String, i64)>,
    max_delay_ms: u64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    queries: Mutex<Vec<RangeQuery>>,
}

impl MemoryStore {
    fn with_table(mut self, date: NaiveDate, records: Vec<TransactionRecord>) -> Self {
        self.tables.insert(table(date), records);
        self
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        if self.unreachable {
            return Err(TxnExportError::Connection("connection refused".to_string()));
        }
        Ok(())
    }

    async fn list_shard_tables(&self, prefix: &str) -> Result<Vec<String>> {
        if self.catalog_down {
            return Err(TxnExportError::CatalogUnavailable(
                "information_schema unavailable".to_string(),
            ));
        }
        Ok(self
            .tables
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn sequence_bounds(&self, shard: &ShardTable) -> Result<Option<SequenceBounds>> {
        if self.broken_bounds.contains(shard.table_name()) {
            return Err(TxnExportError::Database("statement timeout".to_string()));
        }
        let Some(records) = self.tables.get(shard.table_name()) else {
            return Ok(None);
        };
        let low = records.iter().map(|r| r.block_num).min();
        let high = records.iter().map(|r| r.block_num).max();
        Ok(low.zip(high).map(|(low, high)| SequenceBounds { low, high }))
    }

    async fn fetch_range(&self, query: &RangeQuery) -> Result<FetchedRange> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        if self.max_delay_ms > 0 {
            let delay = rand::thread_rng().gen_range(0..=self.max_delay_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let key = (query.shard.table_name().to_string(), query.range.from);
        if self.failing_ranges.contains(&key) {
            return Err(TxnExportError::Database("canceling statement".to_string()));
        }

        let mut records: Vec<TransactionRecord> = self
            .tables
            .get(query.shard.table_name())
            .map(|records| {
                records
                    .iter()
                    .filter(|r| query.range.contains(r.block_num))
                    .filter(|r| query.window.contains(r.system_date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|r| (r.block_num, r.system_date));

        let table = query.shard.table_name();
        let before = records.len();
        records.retain(|r| {
            !self
                .unreadable_rows
                .contains(&(table.to_string(), r.block_num))
        });
        Ok(FetchedRange {
            skipped: (before - records.len()) as u64,
            records,
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(date: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
    date.and_hms_opt(h, min, 0).unwrap()
}

fn table(date: NaiveDate) -> String {
    format!("{PREFIX}{}", date.format("%Y%m%d"))
}

fn record(block_num: i64, amount: i64, action: &str, system_date: NaiveDateTime) -> TransactionRecord {
    TransactionRecord {
        block_num,
        tx_hash: format!("0x{block_num:04x}"),
        trace_no: format!("TR{block_num}"),
        action: ActionKind::from_source(action),
        amount,
        sender_id: "Sender".to_string(),
        receiver_id: "Receiver".to_string(),
        system_date,
    }
}

/// `count` records on consecutive blocks from `first_block`, 10 minutes apart
fn day_of_records(date: NaiveDate, first_block: i64, count: i64, amount: i64) -> Vec<TransactionRecord> {
    (0..count)
        .map(|i| {
            let minutes = (i * 10) as u32;
            record(
                first_block + i,
                amount,
                "credit",
                at(date, minutes / 60 % 24, minutes % 60),
            )
        })
        .collect()
}

fn config(output_dir: &Path, layout: OutputLayout, partition_size: i64) -> TxnExportConfig {
    TxnExportConfig {
        application: ApplicationConfig::default(),
        postgresql: PostgreSQLConfig {
            connection_string: secret_string("postgresql://u:p@localhost/e_wallet".to_string()),
            max_connections: 4,
            connection_timeout_seconds: 5,
            statement_timeout_seconds: 30,
            ssl_mode: "disable".to_string(),
        },
        shards: ShardConfig {
            schema: "public".to_string(),
            table_prefix: PREFIX.to_string(),
            history_start: day(2022, 1, 1),
        },
        export: ExportConfig {
            output_dir: output_dir.to_string_lossy().to_string(),
            layout,
            partition_size,
            max_concurrency: 4,
            amount_scale: AmountScale::Major,
            ..ExportConfig::default()
        },
        logging: LoggingConfig::default(),
    }
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

const HEADER: &str = "HD,TRACE,TXN_HASH,FROM,TO,TRANSTYPE,AMOUNT,STATUS,TXN_TIME";

#[tokio::test]
async fn test_single_day_export_file_contents() {
    let dir = TempDir::new().unwrap();
    let date = day(2024, 1, 2);
    let store = MemoryStore::default().with_table(
        date,
        vec![
            record(3, 199, "Transfer", at(date, 9, 0)),
            record(1, 12345, "credit", at(date, 8, 0)),
            record(2, 250, "debit", at(date, 8, 30)),
        ],
    );

    let config = config(dir.path(), OutputLayout::PerShard, 10);
    let run = ExportRun::single_date(date, &config.export);
    let summary = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.outcome(), (3, 126, &[][..]));
    assert_eq!(summary.phase, ExportPhase::Done);

    let rows = lines(&dir.path().join("transactions_20240102.csv"));
    assert_eq!(
        rows,
        vec![
            HEADER.to_string(),
            "CT,TR1,0x0001,sender,receiver,mint,123,00,2024-01-02 08:00:00".to_string(),
            "CT,TR2,0x0002,sender,receiver,burn,2,00,2024-01-02 08:30:00".to_string(),
            "CT,TR3,0x0003,sender,receiver,Transfer,1,00,2024-01-02 09:00:00".to_string(),
            "FT,3,3,0,126".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_missing_shard_still_gets_header_and_trailer() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), OutputLayout::PerShard, 10);
    let run = ExportRun::single_date(day(2024, 1, 2), &config.export);

    let summary = ExportCoordinator::new(config, Arc::new(MemoryStore::default()))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.outcome(), (0, 0, &[][..]));
    assert_eq!(summary.shards_skipped, 1);
    assert!(summary.is_successful());
    assert_eq!(
        lines(&dir.path().join("transactions_20240102.csv")),
        vec![HEADER.to_string(), "FT,0,0,0,0".to_string()]
    );
}

#[tokio::test]
async fn test_remainder_partition_is_exported_once() {
    let dir = TempDir::new().unwrap();
    let date = day(2024, 1, 2);
    // Blocks 100..=124 with partition size 10: [100,110) [110,120) [120,124]
    let store = Arc::new(MemoryStore::default().with_table(date, day_of_records(date, 100, 25, 100)));

    let config = config(dir.path(), OutputLayout::Single, 10);
    let run = ExportRun::single_date(date, &config.export);
    let summary = ExportCoordinator::new(config, store.clone())
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.total_records, 25);
    assert_eq!(summary.total_amount, 25);
    assert_eq!(summary.partitions_dispatched, 3);

    let queries = store.queries.lock().unwrap();
    let last = queries.iter().find(|q| q.range.from == 120).unwrap();
    assert!(last.range.inclusive_end);
    assert_eq!(last.range.to, 124);
}

#[tokio::test]
async fn test_concurrent_partitions_give_stable_totals() {
    let dates = [day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3)];

    for _ in 0..5 {
        let dir = TempDir::new().unwrap();
        let mut store = MemoryStore {
            max_delay_ms: 15,
            ..MemoryStore::default()
        };
        for (i, date) in dates.iter().enumerate() {
            let records = day_of_records(*date, (i as i64) * 1000, 40, 12345);
            store = store.with_table(*date, records);
        }

        let config = config(dir.path(), OutputLayout::Single, 3);
        let run = ExportRun::range(at(dates[0], 0, 0), at(day(2024, 1, 4), 0, 0), &config.export);
        let summary = ExportCoordinator::new(config, Arc::new(store))
            .run_export(&run)
            .await
            .unwrap();

        assert_eq!(summary.total_records, 120);
        assert_eq!(summary.total_amount, 120 * 123);
        assert!(summary.errors.is_empty());

        let rows = lines(&dir.path().join(format!("transactions_{}.csv", run.label())));
        assert_eq!(rows.len(), 122);
        assert_eq!(rows[0], HEADER);
        assert_eq!(rows[121], format!("FT,120,120,0,{}", 120 * 123));
        assert!(rows[1..121].iter().all(|row| row.starts_with("CT,")));
    }
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let dir = TempDir::new().unwrap();
    let date = day(2024, 1, 2);
    let store = Arc::new(MemoryStore {
        max_delay_ms: 10,
        ..MemoryStore::default().with_table(date, day_of_records(date, 0, 60, 100))
    });

    let mut config = config(dir.path(), OutputLayout::PerPartition, 2);
    config.export.max_concurrency = 2;
    let run = ExportRun::single_date(date, &config.export);
    let summary = ExportCoordinator::new(config, store.clone())
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.partitions_dispatched, 30);
    assert!(store.peak_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_failed_partition_reports_one_error() {
    let dir = TempDir::new().unwrap();
    let date = day(2024, 1, 2);
    let mut store = MemoryStore::default().with_table(date, day_of_records(date, 0, 30, 500));
    store.failing_ranges.insert((table(date), 10));

    let config = config(dir.path(), OutputLayout::PerShard, 10);
    let run = ExportRun::single_date(date, &config.export);
    let summary = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].error_type, ExportErrorType::Query);
    assert_eq!(summary.partitions_failed, 1);
    assert_eq!(summary.total_records, 20);
    assert_eq!(summary.total_amount, 100);
    assert_eq!(summary.phase, ExportPhase::Done);

    let rows = lines(&dir.path().join("transactions_20240102.csv"));
    assert_eq!(rows.last().unwrap(), "FT,20,20,0,100");
}

#[tokio::test]
async fn test_unreadable_rows_are_counted_as_failed() {
    let dir = TempDir::new().unwrap();
    let date = day(2024, 1, 2);
    let mut store = MemoryStore::default().with_table(date, day_of_records(date, 0, 30, 500));
    for block in [3, 7, 15] {
        store.unreadable_rows.insert((table(date), block));
    }

    let config = config(dir.path(), OutputLayout::PerShard, 10);
    let run = ExportRun::single_date(date, &config.export);
    let summary = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.rows_failed, 3);
    assert_eq!(summary.errors.len(), 2);
    assert!(summary
        .errors
        .iter()
        .all(|e| e.error_type == ExportErrorType::Write));
    assert_eq!(summary.partitions_failed, 0);
    assert_eq!(summary.total_records, 27);
    assert_eq!(summary.total_amount, 135);
    assert!(!summary.is_successful());

    let rows = lines(&dir.path().join("transactions_20240102.csv"));
    assert_eq!(rows.len(), 1 + 27 + 1);
    assert_eq!(rows.last().unwrap(), "FT,27,27,0,135");
}

#[tokio::test]
async fn test_shard_with_unreadable_bounds_is_skipped() {
    let dir = TempDir::new().unwrap();
    let (good, bad) = (day(2024, 1, 1), day(2024, 1, 2));
    let mut store = MemoryStore::default()
        .with_table(good, day_of_records(good, 0, 5, 100))
        .with_table(bad, day_of_records(bad, 100, 5, 100));
    store.broken_bounds.insert(table(bad));

    let config = config(dir.path(), OutputLayout::PerShard, 10);
    let run = ExportRun::from_beginning(None, &config.export);
    let summary = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.total_records, 5);
    assert_eq!(summary.shards_skipped, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].error_type, ExportErrorType::Bounds);
}

#[tokio::test]
async fn test_full_history_over_empty_catalog() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), OutputLayout::PerShard, 10);
    let run = ExportRun::from_beginning(None, &config.export);

    let summary = ExportCoordinator::new(config, Arc::new(MemoryStore::default()))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.outcome(), (0, 0, &[][..]));
    assert_eq!(summary.shards_in_scope, 0);
    assert!(summary.files.is_empty());
}

#[tokio::test]
async fn test_full_history_ignores_shards_before_history_start() {
    let dir = TempDir::new().unwrap();
    let (old, new) = (day(2021, 12, 31), day(2022, 1, 1));
    let store = MemoryStore::default()
        .with_table(old, day_of_records(old, 0, 3, 100))
        .with_table(new, day_of_records(new, 10, 4, 100));

    let config = config(dir.path(), OutputLayout::PerShard, 10);
    let run = ExportRun::from_beginning(None, &config.export);
    let summary = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.shards_in_scope, 1);
    assert_eq!(summary.total_records, 4);
    assert!(!dir.path().join("transactions_20211231.csv").exists());
}

#[tokio::test]
async fn test_full_history_until_limits_scope() {
    let dir = TempDir::new().unwrap();
    let dates = [day(2024, 1, 30), day(2024, 1, 31), day(2024, 2, 1)];
    let mut store = MemoryStore::default();
    for (i, date) in dates.iter().enumerate() {
        store = store.with_table(*date, day_of_records(*date, i as i64 * 10, 2, 100));
    }

    let config = config(dir.path(), OutputLayout::Single, 10);
    let run = ExportRun::from_beginning(Some(day(2024, 1, 31)), &config.export);
    let summary = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.total_records, 4);
    assert!(dir.path().join("transactions_all_to_20240131.csv").exists());
}

#[tokio::test]
async fn test_catalog_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore {
        catalog_down: true,
        ..MemoryStore::default()
    };
    let config = config(dir.path(), OutputLayout::Single, 10);
    let run = ExportRun::from_beginning(None, &config.export);

    let result = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await;

    assert!(matches!(result, Err(TxnExportError::CatalogUnavailable(_))));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unreachable_store_is_fatal() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore {
        unreachable: true,
        ..MemoryStore::default()
    };
    let config = config(dir.path(), OutputLayout::PerShard, 10);
    let run = ExportRun::single_date(day(2024, 1, 2), &config.export);

    let result = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await;

    assert!(matches!(result, Err(TxnExportError::Connection(_))));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_reversed_range_is_invalid_run() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), OutputLayout::Single, 10);
    let run = ExportRun::range(
        at(day(2024, 1, 5), 0, 0),
        at(day(2024, 1, 1), 0, 0),
        &config.export,
    );

    let result = ExportCoordinator::new(config, Arc::new(MemoryStore::default()))
        .run_export(&run)
        .await;

    assert!(matches!(result, Err(TxnExportError::InvalidRun(_))));
}

#[tokio::test]
async fn test_range_filters_first_and_last_day_by_time() {
    let dir = TempDir::new().unwrap();
    let (first, middle, last) = (day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3));
    let store = MemoryStore::default()
        .with_table(
            first,
            vec![
                record(1, 100, "credit", at(first, 8, 0)),
                record(2, 100, "credit", at(first, 12, 0)),
            ],
        )
        .with_table(
            middle,
            vec![
                record(3, 100, "credit", at(middle, 0, 0)),
                record(4, 100, "credit", at(middle, 23, 59)),
            ],
        )
        .with_table(
            last,
            vec![
                record(5, 100, "credit", at(last, 11, 59)),
                record(6, 100, "credit", at(last, 12, 0)),
            ],
        );

    let config = config(dir.path(), OutputLayout::PerShard, 10);
    let run = ExportRun::range(at(first, 12, 0), at(last, 12, 0), &config.export);
    let summary = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await
        .unwrap();

    // 12:00 on the first day is inside, 12:00 on the last day is not
    assert_eq!(summary.total_records, 4);
    assert_eq!(summary.files.len(), 3);
    assert_eq!(
        lines(&dir.path().join("transactions_20240101.csv")).last().unwrap(),
        "FT,1,1,0,1"
    );
    assert_eq!(
        lines(&dir.path().join("transactions_20240103.csv")).last().unwrap(),
        "FT,1,1,0,1"
    );
}

#[tokio::test]
async fn test_per_partition_file_names() {
    let dir = TempDir::new().unwrap();
    let date = day(2024, 1, 2);
    let store = MemoryStore::default().with_table(date, day_of_records(date, 0, 15, 100));

    let config = config(dir.path(), OutputLayout::PerPartition, 10);
    let run = ExportRun::single_date(date, &config.export);
    let summary = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.files.len(), 2);
    assert_eq!(
        lines(&dir.path().join("transactions_20240102_p0001.csv")).last().unwrap(),
        "FT,10,10,0,10"
    );
    assert_eq!(
        lines(&dir.path().join("transactions_20240102_p0002.csv")).last().unwrap(),
        "FT,5,5,0,5"
    );
}

#[tokio::test]
async fn test_dry_run_counts_without_writing() {
    let dir = TempDir::new().unwrap();
    let date = day(2024, 1, 2);
    let store = MemoryStore::default().with_table(date, day_of_records(date, 0, 7, 1000));

    let mut config = config(dir.path(), OutputLayout::PerShard, 3);
    config.export.dry_run = true;
    let run = ExportRun::single_date(date, &config.export);
    let summary = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.outcome(), (7, 70, &[][..]));
    assert_eq!(summary.files[0].location, "dry-run:20240102");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_minor_amount_scale_keeps_source_amounts() {
    let dir = TempDir::new().unwrap();
    let date = day(2024, 1, 2);
    let store = MemoryStore::default().with_table(date, day_of_records(date, 0, 2, 12345));

    let mut config = config(dir.path(), OutputLayout::PerShard, 10);
    config.export.amount_scale = AmountScale::Minor;
    let run = ExportRun::single_date(date, &config.export);
    let summary = ExportCoordinator::new(config, Arc::new(store))
        .run_export(&run)
        .await
        .unwrap();

    assert_eq!(summary.total_amount, 24690);
}
