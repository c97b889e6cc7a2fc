//! The pipeline driver: enumerate → dispatch in batches → collect.
//!
//! A run is a single synchronous pass. Each batch is submitted to the
//! executor and awaited in full before the next one starts; a slow item
//! stalls its batch. Present records are written to the record store as each
//! batch completes.
//!
//! The run row is recorded before the first batch is dispatched and its
//! counts are updated after every batch, so records stored by a run that
//! later aborts still belong to a listed (unfinished) run.

use jiff::Timestamp;
use tracing::{info, warn};
use uuid::Uuid;

use crate::batch::{self, BatchError};
use crate::executor::{Executor, ExecutorError};
use crate::model::{ResultRecord, RunSummary, WorkItem};
use crate::storage::{Storage, StorageError};

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("executor failed: {0}")]
    Executor(#[from] ExecutorError),

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// How a run dispatches and stores its work.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Number of batches to split the work items into.
    pub partitions: usize,

    /// Record field used as the store key. Records without it are keyed by
    /// their work item.
    pub key_field: Option<String>,
}

/// A finished run: its summary and one result slot per work item.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub results: Vec<Option<ResultRecord>>,
}

/// Runs `items` through `executor`, storing present records.
pub fn run<E: Executor>(
    items: &[WorkItem],
    executor: &E,
    storage: &Storage,
    options: &RunOptions,
) -> Result<RunOutcome, PipelineError> {
    let batches = batch::partition(items, options.partitions)?;
    let mut summary = RunSummary {
        id: Uuid::new_v4(),
        started_at: Timestamp::now(),
        finished_at: None,
        items: items.len(),
        batches: batches.len(),
        present: 0,
        absent: 0,
    };
    let id = summary.id;
    storage.record_run(&summary)?;

    info!(run = %id, items = items.len(), batches = batches.len(), "starting run");

    let mut results = Vec::with_capacity(items.len());
    for (index, batch) in batches.iter().enumerate() {
        if batch.is_empty() {
            continue;
        }

        let batch_results = executor.map(batch)?;
        let stored = store_batch(storage, id, batch, &batch_results, options)?;
        let failed = batch_results.iter().filter(|r| r.is_none()).count();
        if failed > 0 {
            warn!(run = %id, batch = index, failed, "some items produced no record");
        }
        info!(run = %id, batch = index, size = batch.len(), stored, "batch complete");

        summary.absent += failed;
        summary.present += batch_results.len() - failed;
        storage.update_run(&summary)?;

        results.extend(batch_results);
    }

    summary.finished_at = Some(Timestamp::now());
    storage.update_run(&summary)?;

    info!(run = %id, present = summary.present, absent = summary.absent, "run complete");
    Ok(RunOutcome { summary, results })
}

/// Writes a batch's present records, keyed per [`RunOptions::key_field`].
fn store_batch(
    storage: &Storage,
    run_id: Uuid,
    batch: &[WorkItem],
    results: &[Option<ResultRecord>],
    options: &RunOptions,
) -> Result<usize, StorageError> {
    let keyed: Vec<(String, &ResultRecord)> = batch
        .iter()
        .zip(results)
        .filter_map(|(item, result)| {
            let record = result.as_ref()?;
            let key = options
                .key_field
                .as_deref()
                .and_then(|field| record.text(field))
                .unwrap_or_else(|| item.to_string());
            Some((key, record))
        })
        .collect();

    storage.put_records(run_id, keyed.iter().map(|(k, r)| (k.as_str(), *r)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use tempfile::TempDir;

    use crate::aggregate;
    use crate::executor::{self, ThreadExecutor};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("store")).unwrap();
        (dir, storage)
    }

    fn items(ids: &[&str]) -> Vec<WorkItem> {
        ids.iter().copied().map(WorkItem::from).collect()
    }

    fn options(partitions: usize) -> RunOptions {
        RunOptions {
            partitions,
            key_field: Some("link".into()),
        }
    }

    /// Records every batch it is handed, then scores items by name.
    struct RecordingExecutor {
        batches: Arc<Mutex<Vec<Vec<WorkItem>>>>,
    }

    impl Executor for RecordingExecutor {
        type Handle = WorkItem;

        fn submit(&self, inputs: &[WorkItem]) -> executor::Result<Vec<WorkItem>> {
            self.batches.lock().unwrap().push(inputs.to_vec());
            Ok(inputs.to_vec())
        }

        fn await_all(
            &self,
            handles: Vec<WorkItem>,
        ) -> executor::Result<Vec<Option<ResultRecord>>> {
            Ok(handles
                .iter()
                .map(|item| {
                    if item.as_str().starts_with("bad") {
                        None
                    } else {
                        ResultRecord::from_value(json!({
                            "link": item.as_str(),
                            "sentiment": 0.1,
                            "words": ["rain:1"]
                        }))
                    }
                })
                .collect())
        }
    }

    struct FailingExecutor;

    impl Executor for FailingExecutor {
        type Handle = ();

        fn submit(&self, _: &[WorkItem]) -> executor::Result<Vec<()>> {
            Err(ExecutorError::Launch {
                program: "remote".into(),
                source: std::io::Error::other("service unavailable"),
            })
        }

        fn await_all(&self, _: Vec<()>) -> executor::Result<Vec<Option<ResultRecord>>> {
            unreachable!()
        }
    }

    #[test]
    fn dispatches_contiguous_batches() {
        let (_dir, storage) = test_storage();
        let batches = Arc::new(Mutex::new(Vec::new()));
        let executor = RecordingExecutor {
            batches: Arc::clone(&batches),
        };

        let outcome = run(
            &items(&["u1", "u2", "u3", "u4", "u5"]),
            &executor,
            &storage,
            &options(2),
        )
        .unwrap();

        assert_eq!(
            *batches.lock().unwrap(),
            vec![items(&["u1", "u2", "u3"]), items(&["u4", "u5"])]
        );
        assert_eq!(outcome.summary.batches, 2);
        assert_eq!(outcome.summary.present, 5);
    }

    #[test]
    fn absent_results_keep_their_slot_and_are_not_stored() {
        let (_dir, storage) = test_storage();
        let executor = RecordingExecutor {
            batches: Arc::default(),
        };

        let outcome = run(
            &items(&["u1", "bad1", "u3"]),
            &executor,
            &storage,
            &options(2),
        )
        .unwrap();

        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.results[1].is_none());
        assert_eq!(outcome.summary.present, 2);
        assert_eq!(outcome.summary.absent, 1);

        let stored = storage.scan_records(Some(outcome.summary.id)).unwrap();
        let links: Vec<_> = stored.iter().map(|r| r.text("link").unwrap()).collect();
        assert_eq!(links, vec!["u1", "u3"]);
        assert!(storage.get_record("u3").unwrap().is_some());
    }

    #[test]
    fn records_without_key_field_use_work_item() {
        let (_dir, storage) = test_storage();
        let executor = ThreadExecutor::new(|item: &WorkItem| {
            ResultRecord::from_value(json!({ "ndvi": item.as_str().len() }))
        });
        let options = RunOptions {
            partitions: 1,
            key_field: Some("scene".into()),
        };

        run(&items(&["LC08_A", "LC08_BB"]), &executor, &storage, &options).unwrap();

        let record = storage.get_record("LC08_BB").unwrap().unwrap();
        assert_eq!(record.number("ndvi"), Some(7.0));
    }

    #[test]
    fn run_is_recorded() {
        let (_dir, storage) = test_storage();
        let executor = RecordingExecutor {
            batches: Arc::default(),
        };

        let outcome = run(&items(&["u1"]), &executor, &storage, &options(3)).unwrap();

        let runs = storage.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, outcome.summary.id);
        assert_eq!(runs[0].batches, 3);
        assert_eq!(runs[0].items, 1);
        assert_eq!(runs[0].present, 1);
        assert!(runs[0].finished_at.is_some());
    }

    #[test]
    fn empty_batches_are_not_dispatched() {
        let (_dir, storage) = test_storage();
        let batches = Arc::new(Mutex::new(Vec::new()));
        let executor = RecordingExecutor {
            batches: Arc::clone(&batches),
        };

        run(&items(&["u1", "u2"]), &executor, &storage, &options(4)).unwrap();

        assert_eq!(batches.lock().unwrap().len(), 2);
    }

    #[test]
    fn executor_failure_is_fatal() {
        let (_dir, storage) = test_storage();
        let err = run(&items(&["u1"]), &FailingExecutor, &storage, &options(1)).unwrap_err();

        assert!(matches!(err, PipelineError::Executor(_)));
        let runs = storage.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].finished_at, None);
        assert_eq!(runs[0].present, 0);
    }

    /// Serves its first batch, then fails to launch.
    struct FlakyExecutor {
        served: Mutex<bool>,
    }

    impl Executor for FlakyExecutor {
        type Handle = WorkItem;

        fn submit(&self, inputs: &[WorkItem]) -> executor::Result<Vec<WorkItem>> {
            let mut served = self.served.lock().unwrap();
            if *served {
                return Err(ExecutorError::Launch {
                    program: "remote".into(),
                    source: std::io::Error::other("service unavailable"),
                });
            }
            *served = true;
            Ok(inputs.to_vec())
        }

        fn await_all(
            &self,
            handles: Vec<WorkItem>,
        ) -> executor::Result<Vec<Option<ResultRecord>>> {
            Ok(handles
                .iter()
                .map(|item| ResultRecord::from_value(json!({ "link": item.as_str() })))
                .collect())
        }
    }

    #[test]
    fn aborted_run_keeps_completed_batches_attributable() {
        let (_dir, storage) = test_storage();
        let executor = FlakyExecutor {
            served: Mutex::new(false),
        };

        let err = run(
            &items(&["u1", "u2", "u3", "u4"]),
            &executor,
            &storage,
            &options(2),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Executor(_)));

        let runs = storage.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].finished_at, None);
        assert_eq!(runs[0].present, 2);

        let stored = storage.scan_records(Some(runs[0].id)).unwrap();
        let links: Vec<_> = stored.iter().map(|r| r.text("link").unwrap()).collect();
        assert_eq!(links, vec!["u1", "u2"]);
    }

    #[cfg(unix)]
    #[test]
    fn tsv_through_process_executor_to_word_counts() {
        use crate::executor::ProcessExecutor;
        use crate::source::read_tsv;

        let (_dir, storage) = test_storage();
        let index = "date\turl\n1\thttps://a.example\n2\thttps://fail.example\n3\thttps://b.example\n";
        let items = read_tsv(index.as_bytes(), "url", None).unwrap();

        // Scores every URL the same, except the one that "fails to scrape".
        let script = r#"case "$0" in *fail*) exit 1;; esac
printf '{"link":"%s","sentiment":0.2,"words":["flood:2","rain:1"]}' "$0""#;
        let executor = ProcessExecutor::new("sh", vec!["-c".into(), script.into()]);

        let outcome = run(&items, &executor, &storage, &options(2)).unwrap();
        assert_eq!(outcome.summary.present, 2);
        assert_eq!(outcome.summary.absent, 1);

        let records = storage.scan_records(None).unwrap();
        let counts = aggregate::word_counts(&records, "words");
        assert_eq!(aggregate::top_k(&counts, 1), vec![("flood", 4)]);
        assert_eq!(aggregate::series(&records, "sentiment"), vec![0.2, 0.2]);
    }

    #[test]
    fn zero_partitions_is_rejected() {
        let (_dir, storage) = test_storage();
        let err = run(&items(&["u1"]), &FailingExecutor, &storage, &options(0)).unwrap_err();

        assert!(matches!(err, PipelineError::Batch(BatchError::ZeroPartitions)));
    }
}
