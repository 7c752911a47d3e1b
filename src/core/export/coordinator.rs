//! Export coordinator - main orchestrator for the export process
//!
//! A run moves through `Idle → ResolvingScope → Partitioning → Exporting →
//! Finalizing → Done`. Only scope resolution and the initial connectivity
//! check can fail the run; everything after that is collected as non-fatal
//! [`ExportError`]s on the returned [`ExportSummary`].

use crate::adapters::sink::{CsvSink, NullSink, RowSink};
use crate::adapters::store::{TimeWindow, TransactionStore};
use crate::config::{OutputLayout, TxnExportConfig};
use crate::core::export::counters::AggregateCounters;
use crate::core::export::run::{ExportRun, RunScope, COMPACT_DATE_FORMAT};
use crate::core::export::summary::{
    ExportError, ExportErrorType, ExportPhase, ExportSummary, ExportedFile,
};
use crate::core::export::writer::ExportWriter;
use crate::core::fetch::RecordFetcher;
use crate::core::partition::{partition, BlockRange};
use crate::core::shard::ShardResolver;
use crate::domain::{Result, ShardTable, TxnExportError};
use crate::{log_error_with_context, log_partition_complete, log_partition_start};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

/// One shard in scope with the time filter that applies to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardWork {
    /// Shard table
    pub shard: ShardTable,
    /// Time filter; bounded only on the first and last day of a range run
    pub window: TimeWindow,
}

/// An output destination and the totals of the rows written to it
struct Destination {
    writer: ExportWriter,
    counters: AggregateCounters,
}

/// A partition ready to dispatch
struct PartitionPlan {
    shard: ShardTable,
    range: BlockRange,
    window: TimeWindow,
    destination: Arc<Destination>,
}

/// What a partition task contributed
#[derive(Debug, Default)]
struct PartitionOutcome {
    rows_failed: u64,
    error: Option<ExportError>,
}

/// Export coordinator
pub struct ExportCoordinator {
    config: TxnExportConfig,
    store: Arc<dyn TransactionStore>,
    resolver: ShardResolver,
    fetcher: RecordFetcher,
}

impl ExportCoordinator {
    /// Create a new export coordinator over a store
    pub fn new(config: TxnExportConfig, store: Arc<dyn TransactionStore>) -> Self {
        let resolver = ShardResolver::from_config(&config.shards);
        let fetcher = RecordFetcher::new(Arc::clone(&store));
        Self {
            config,
            store,
            resolver,
            fetcher,
        }
    }

    /// Shard resolver in use
    pub fn resolver(&self) -> &ShardResolver {
        &self.resolver
    }

    /// Execute an export run
    ///
    /// # Errors
    ///
    /// Returns `InvalidRun` for unusable run parameters, `Connection` when the
    /// store is unreachable, and `CatalogUnavailable` when a full-history run
    /// cannot list its shards. No file is written in those cases.
    pub async fn run_export(&self, run: &ExportRun) -> Result<ExportSummary> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("export_run", run_id = %run_id, label = %run.label());
        self.execute(run, run_id).instrument(span).await
    }

    async fn execute(&self, run: &ExportRun, run_id: Uuid) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new(run_id, run.label());

        tracing::info!(
            layout = %run.layout,
            partition_size = run.partition_size,
            dry_run = run.dry_run,
            store = %self.store.describe(),
            "Starting export process"
        );

        transition(&mut summary, ExportPhase::ResolvingScope);
        let work = match self.prepare(run).await {
            Ok(work) => work,
            Err(e) => {
                transition(&mut summary, ExportPhase::Failed);
                log_error_with_context!(&e, "Export run failed");
                return Err(e);
            }
        };
        summary.shards_in_scope = work.len();

        transition(&mut summary, ExportPhase::Partitioning);
        let (plans, destinations) = self.plan(run, &work, &mut summary).await;

        transition(&mut summary, ExportPhase::Exporting);
        let run_counters = Arc::new(AggregateCounters::new());
        self.dispatch(plans, &run_counters, &mut summary).await;

        transition(&mut summary, ExportPhase::Finalizing);
        finalize(destinations, &mut summary).await;

        let (total_records, total_amount) = run_counters.snapshot().await;
        summary.total_records = total_records;
        summary.total_amount = total_amount;

        transition(&mut summary, ExportPhase::Done);
        Ok(summary.with_duration(start_time.elapsed()))
    }

    /// Validate the run, check connectivity and resolve the shards in scope
    async fn prepare(&self, run: &ExportRun) -> Result<Vec<ShardWork>> {
        run.validate()?;

        self.store.ping().await.map_err(|e| match e {
            TxnExportError::Connection(_) => e,
            other => TxnExportError::Connection(other.to_string()),
        })?;

        self.resolve_scope(run).await
    }

    /// Turn the run scope into the ordered list of shards to export
    ///
    /// # Errors
    ///
    /// Returns `InvalidRun` for a reversed range and `CatalogUnavailable` when
    /// a full-history run cannot list shards.
    pub async fn resolve_scope(&self, run: &ExportRun) -> Result<Vec<ShardWork>> {
        match run.scope {
            RunScope::SingleDate { date } => Ok(vec![ShardWork {
                shard: self.resolver.resolve_shard(date)?,
                window: TimeWindow::unbounded(),
            }]),
            RunScope::Range { from, to } => {
                let shards = self.resolver.shards_between(from.date(), to.date())?;
                let last = shards.len().saturating_sub(1);
                Ok(shards
                    .into_iter()
                    .enumerate()
                    .map(|(i, shard)| ShardWork {
                        shard,
                        window: TimeWindow {
                            start: (i == 0).then_some(from),
                            end: (i == last).then_some(to),
                        },
                    })
                    .collect())
            }
            RunScope::FromBeginning { until } => {
                let shards = self.resolver.list_all_shards(self.store.as_ref()).await?;
                Ok(shards
                    .into_iter()
                    .filter(|shard| until.map_or(true, |until| shard.date() <= until))
                    .map(|shard| ShardWork {
                        shard,
                        window: TimeWindow::unbounded(),
                    })
                    .collect())
            }
        }
    }

    /// Read shard bounds, cut partitions and open their destinations
    ///
    /// Destinations are returned in the order their trailers are written.
    async fn plan(
        &self,
        run: &ExportRun,
        work: &[ShardWork],
        summary: &mut ExportSummary,
    ) -> (Vec<PartitionPlan>, Vec<Arc<Destination>>) {
        let mut plans = Vec::new();
        let mut destinations = Vec::new();

        let shared = match run.layout {
            OutputLayout::Single => match self.open_destination(run, &run.label()).await {
                Ok(destination) => {
                    destinations.push(Arc::clone(&destination));
                    Some(destination)
                }
                Err(error) => {
                    summary.add_error(error);
                    None
                }
            },
            _ => None,
        };

        for item in work {
            let shard = &item.shard;
            let shard_label = shard.date().format(COMPACT_DATE_FORMAT).to_string();

            let per_shard = if run.layout == OutputLayout::PerShard {
                match self.open_destination(run, &shard_label).await {
                    Ok(destination) => {
                        destinations.push(Arc::clone(&destination));
                        Some(destination)
                    }
                    Err(error) => {
                        summary.add_error(error.with_context(format!("shard={shard}")));
                        summary.shards_skipped += 1;
                        continue;
                    }
                }
            } else {
                None
            };

            let ranges = match self.shard_partitions(shard, run.partition_size).await {
                Ok(Some(ranges)) => ranges,
                Ok(None) => {
                    tracing::info!(shard = %shard, "Shard is empty, skipping");
                    summary.shards_skipped += 1;
                    continue;
                }
                Err(error) => {
                    tracing::warn!(shard = %shard, error = %error, "Skipping shard");
                    summary.add_error(error);
                    summary.shards_skipped += 1;
                    continue;
                }
            };

            tracing::info!(
                shard = %shard,
                partitions = ranges.len(),
                "Partitioned shard"
            );
            summary.shards_exported += 1;

            for (index, range) in ranges.into_iter().enumerate() {
                let destination = match (&shared, &per_shard) {
                    (Some(shared), _) => Arc::clone(shared),
                    (None, Some(per_shard)) => Arc::clone(per_shard),
                    (None, None) if run.layout == OutputLayout::PerPartition => {
                        let label = format!("{shard_label}_p{:04}", index + 1);
                        match self.open_destination(run, &label).await {
                            Ok(destination) => {
                                destinations.push(Arc::clone(&destination));
                                destination
                            }
                            Err(error) => {
                                summary.add_error(
                                    error.with_context(format!("shard={shard} range={range}")),
                                );
                                summary.partitions_failed += 1;
                                continue;
                            }
                        }
                    }
                    // Single layout whose file could not be opened
                    (None, None) => {
                        summary.partitions_failed += 1;
                        continue;
                    }
                };

                plans.push(PartitionPlan {
                    shard: shard.clone(),
                    range,
                    window: item.window,
                    destination,
                });
            }
        }

        (plans, destinations)
    }

    /// Partitions of one shard, `None` when the shard is empty or missing
    async fn shard_partitions(
        &self,
        shard: &ShardTable,
        partition_size: i64,
    ) -> std::result::Result<Option<Vec<BlockRange>>, ExportError> {
        let bounds = self.store.sequence_bounds(shard).await.map_err(|e| {
            ExportError::new(
                ExportErrorType::Bounds,
                format!("Failed to determine shard bounds: {e}"),
            )
            .with_context(format!("shard={shard}"))
        })?;

        let Some(bounds) = bounds else {
            return Ok(None);
        };

        partition(bounds.low, bounds.high, partition_size)
            .map(Some)
            .map_err(|e| {
                ExportError::new(ExportErrorType::Bounds, e.to_string())
                    .with_context(format!("shard={shard}"))
            })
    }

    /// Open a sink for `label` and write its header
    async fn open_destination(
        &self,
        run: &ExportRun,
        label: &str,
    ) -> std::result::Result<Arc<Destination>, ExportError> {
        let sink: Box<dyn RowSink> = if run.dry_run {
            Box::new(NullSink::new(label))
        } else {
            let path = run.file_path(label);
            let sink = CsvSink::create(&path, self.config.export.delimiter_byte()).map_err(|e| {
                ExportError::new(
                    ExportErrorType::Storage,
                    format!("Failed to open output: {e}"),
                )
            })?;
            Box::new(sink)
        };

        let writer = ExportWriter::new(sink, self.config.export.amount_scale);
        writer.write_header().await.map_err(|e| {
            ExportError::new(
                ExportErrorType::Storage,
                format!("Failed to write header to {}: {e}", writer.location()),
            )
        })?;

        tracing::debug!(location = %writer.location(), "Opened destination");

        Ok(Arc::new(Destination {
            writer,
            counters: AggregateCounters::new(),
        }))
    }

    /// Run every partition task and wait for all of them
    async fn dispatch(
        &self,
        plans: Vec<PartitionPlan>,
        run_counters: &Arc<AggregateCounters>,
        summary: &mut ExportSummary,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.export.max_concurrency));
        let mut tasks = JoinSet::new();

        summary.partitions_dispatched = plans.len();
        tracing::info!(
            partitions = plans.len(),
            max_concurrency = self.config.export.max_concurrency,
            "Dispatching partitions"
        );

        for plan in plans {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = self.fetcher.clone();
            let run_counters = Arc::clone(run_counters);

            tasks.spawn(
                async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return PartitionOutcome {
                                error: Some(ExportError::new(
                                    ExportErrorType::Task,
                                    format!("Concurrency limiter closed: {e}"),
                                )),
                                ..PartitionOutcome::default()
                            }
                        }
                    };
                    export_partition(&fetcher, plan, &run_counters).await
                }
                .in_current_span(),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    summary.rows_failed += outcome.rows_failed;
                    if let Some(error) = outcome.error {
                        if matches!(
                            error.error_type,
                            ExportErrorType::Query | ExportErrorType::Task
                        ) {
                            summary.partitions_failed += 1;
                        }
                        summary.add_error(error);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Partition task did not complete");
                    summary.partitions_failed += 1;
                    summary.add_error(ExportError::new(
                        ExportErrorType::Task,
                        format!("Partition task did not complete: {e}"),
                    ));
                }
            }
        }
    }
}

/// Fetch and write one partition, then fold its totals in exactly once
async fn export_partition(
    fetcher: &RecordFetcher,
    plan: PartitionPlan,
    run_counters: &AggregateCounters,
) -> PartitionOutcome {
    let started = Instant::now();
    log_partition_start!(plan.shard, plan.range);

    let fetched = match fetcher.fetch(&plan.shard, plan.range, plan.window).await {
        Ok(fetched) => fetched,
        Err(error) => {
            return PartitionOutcome {
                error: Some(error),
                ..PartitionOutcome::default()
            }
        }
    };

    let mut written = 0u64;
    let mut amount = 0i64;
    let mut rows_failed = fetched.skipped;
    let attempted = fetched.skipped + fetched.records.len() as u64;

    for record in &fetched.records {
        match plan.destination.writer.write_record(record).await {
            Ok(rescaled) => {
                written += 1;
                amount += rescaled;
            }
            Err(e) => {
                rows_failed += 1;
                tracing::warn!(
                    shard = %plan.shard,
                    block_num = record.block_num,
                    error = %e,
                    "Skipping row that failed to write"
                );
            }
        }
    }

    plan.destination.counters.add(written, amount).await;
    run_counters.add(written, amount).await;

    log_partition_complete!(plan.shard, plan.range, written, started.elapsed());

    let error = (rows_failed > 0).then(|| {
        ExportError::new(
            ExportErrorType::Write,
            format!(
                "{rows_failed} of {attempted} rows were not written ({} unreadable)",
                fetched.skipped
            ),
        )
        .with_context(format!("shard={} range={}", plan.shard, plan.range))
    });

    PartitionOutcome {
        rows_failed,
        error,
    }
}

/// Write each destination's trailer from its own totals and flush it
async fn finalize(destinations: Vec<Arc<Destination>>, summary: &mut ExportSummary) {
    for destination in destinations {
        let (records, amount) = destination.counters.snapshot().await;
        let writer = &destination.writer;

        let finished = match writer.write_trailer(records, amount).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = finished {
            tracing::error!(location = %writer.location(), error = %e, "Failed to finalise output");
            summary.add_error(
                ExportError::new(
                    ExportErrorType::Storage,
                    format!("Failed to finalise output: {e}"),
                )
                .with_context(writer.location().to_string()),
            );
        }

        tracing::info!(
            location = %writer.location(),
            records = records,
            amount = amount,
            "Wrote output"
        );

        summary.files.push(ExportedFile {
            location: writer.location().to_string(),
            records,
            amount,
        });
    }
}

fn transition(summary: &mut ExportSummary, next: ExportPhase) {
    tracing::debug!(from = %summary.phase, to = %next, "Export phase transition");
    summary.phase = next;
}
