//! Analysis Service
//!
//! Client context for the pipeline: owns the store handle and the signed-in
//! identity, and is passed to whatever needs store access.

use crate::assembler::{AnalysisRequest, RecordAssembler};
use crate::context::{Identity, RecordKind};
use crate::error::{AssemblyError, ServiceError};
use crate::record::{AnalysisRecord, EyeTestRecord, PersistedRecord};
use chrono::NaiveDate;
use report_parser::{parse, ParsedReport};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use storage::{subscribe, CollectionPath, DocumentStore, StoredDocument, Subscription};
use tracing::{error, info, warn};
use trend::{analyze_trend, TrendAnalysis};

/// Records written for one successful analysis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAnalysis {
    pub analysis: AnalysisRecord,
    pub eye_test: EyeTestRecord,
}

/// Parses, scores and persists analysis reports
pub struct AnalysisService<S: DocumentStore> {
    store: Arc<S>,
    identity: Identity,
    assembler: RecordAssembler,
}

impl<S: DocumentStore> AnalysisService<S> {
    pub fn new(store: Arc<S>, identity: Identity, assembler: RecordAssembler) -> Self {
        Self {
            store,
            identity,
            assembler,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Collection for a record kind under the current identity
    pub fn collection_path(&self, kind: RecordKind) -> CollectionPath {
        kind.collection_path(&self.identity)
    }

    /// Parse a raw report and persist its records
    pub async fn submit_report(
        &self,
        report_text: &str,
        request: AnalysisRequest,
    ) -> Result<SavedAnalysis, ServiceError> {
        let parsed = parse(report_text)?;
        self.save(&parsed, request).await
    }

    /// Persist the analysis and eye-test records for a parsed report.
    ///
    /// Nothing is written when the report has no samples. A failed write is
    /// not retried. If only the eye-test write fails, the analysis record stays
    /// and its id is named in the error detail.
    pub async fn save(
        &self,
        report: &ParsedReport,
        request: AnalysisRequest,
    ) -> Result<SavedAnalysis, ServiceError> {
        let (analysis, eye_test) = self.build_records(report, &request)?;

        self.write(&analysis).await?;
        self.write(&eye_test).await.map_err(|e| match e {
            ServiceError::StoreWrite { message, detail } => {
                warn!("Analysis {} saved without its eye-test record", analysis.id);
                ServiceError::StoreWrite {
                    message,
                    detail: format!(
                        "{} (analysis {} was saved without its eye-test record)",
                        detail, analysis.id
                    ),
                }
            }
            other => other,
        })?;

        info!(
            "Saved analysis {} for {} (fatigue {})",
            analysis.id, self.identity.uid, analysis.fatigue_level
        );
        metrics::counter!("pupil_records_saved_total").increment(1);

        Ok(SavedAnalysis { analysis, eye_test })
    }

    fn build_records(
        &self,
        report: &ParsedReport,
        request: &AnalysisRequest,
    ) -> Result<(AnalysisRecord, EyeTestRecord), AssemblyError> {
        let mut rng = rand::thread_rng();
        let analysis = self.assembler.assemble(&mut rng, report, request)?;
        let eye_test = self.assembler.assemble_eye_test(&mut rng, analysis.clone());
        Ok((analysis, eye_test))
    }

    async fn write<T: PersistedRecord>(&self, record: &T) -> Result<(), ServiceError> {
        let path = self.collection_path(T::KIND);
        let data =
            serde_json::to_value(record).map_err(|e| ServiceError::Serialization(e.to_string()))?;

        self.store
            .create(&path, &record.analysis().id, data)
            .await
            .map_err(|e| {
                error!("Failed to write {} to {}: {}", record.analysis().id, path, e);
                metrics::counter!("pupil_store_write_failures_total").increment(1);
                ServiceError::StoreWrite {
                    message: "Failed to save analysis results".to_string(),
                    detail: e.to_string(),
                }
            })?;
        Ok(())
    }

    /// All records of one kind, oldest first. Read failures yield an empty list.
    pub async fn history<T: PersistedRecord>(&self) -> Vec<T> {
        let path = self.collection_path(T::KIND);
        match self.store.read_all(&path).await {
            Ok(documents) => decode_documents(documents),
            Err(e) => {
                warn!("Failed to read {}: {}; showing empty history", path, e);
                Vec::new()
            }
        }
    }

    /// Deliver every snapshot of a collection to `callback`.
    ///
    /// If the store cannot be watched, `callback` receives one empty snapshot
    /// and `None` is returned.
    pub fn subscribe<T, F>(&self, callback: F) -> Option<Subscription>
    where
        T: PersistedRecord,
        F: FnMut(Vec<T>) + Send + 'static,
    {
        let path = self.collection_path(T::KIND);
        let callback = Arc::new(Mutex::new(callback));
        let delivery = Arc::clone(&callback);

        let result = subscribe(self.store.as_ref(), &path, move |documents| {
            if let Ok(mut deliver) = delivery.lock() {
                deliver(decode_documents(documents));
            }
        });

        match result {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!("Failed to subscribe to {}: {}; delivering empty snapshot", path, e);
                if let Ok(mut deliver) = callback.lock() {
                    deliver(Vec::new());
                }
                None
            }
        }
    }

    /// Trend over the records of one kind measured on `date`
    pub async fn daily_trend<T: PersistedRecord>(&self, date: NaiveDate) -> TrendAnalysis {
        let points: Vec<_> = self
            .history::<T>()
            .await
            .iter()
            .map(|record| record.analysis())
            .filter(|record| record.date == date)
            .filter_map(AnalysisRecord::trend_point)
            .collect();
        analyze_trend(&points)
    }
}

fn decode_documents<T: PersistedRecord>(documents: Vec<StoredDocument>) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|document| match serde_json::from_value::<T>(document.data) {
            Ok(mut record) => {
                record.stamp(document.timestamp);
                Some(record)
            }
            Err(e) => {
                warn!("Skipping undecodable document {}: {}", document.id, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use fatigue::FatigueLevel;
    use report_parser::ParseError;
    use std::time::Duration;
    use storage::{MemoryStore, StorageError};
    use tokio::sync::mpsc;
    use trend::Trend;

    fn service() -> AnalysisService<MemoryStore> {
        AnalysisService::new(
            Arc::new(MemoryStore::new()),
            Identity::anonymous("tester"),
            RecordAssembler::default(),
        )
    }

    fn uniform_report(diameter: f64) -> String {
        let mut text =
            String::from("Processed 4 frames\n--- CSV Data ---\nFrame,Eye_Type,Diameter_mm\n");
        for frame in 0..4 {
            text.push_str(&format!(
                "{},left_eye,{}\n{},right_eye,{}\n",
                frame, diameter, frame, diameter
            ));
        }
        text
    }

    #[tokio::test]
    async fn test_submit_writes_both_collections() {
        let service = service();
        let saved = service
            .submit_report(&uniform_report(2.8), AnalysisRequest::default())
            .await
            .unwrap();

        assert_eq!(saved.analysis.fatigue_level, FatigueLevel::Low);
        assert_eq!(saved.analysis.id, saved.eye_test.analysis.id);
        assert_eq!(saved.analysis.frame_count, 4);

        let store = service.store();
        assert_eq!(store.document_count(&service.collection_path(RecordKind::Analysis)), 1);
        assert_eq!(store.document_count(&service.collection_path(RecordKind::EyeTest)), 1);
    }

    #[tokio::test]
    async fn test_no_valid_data_writes_nothing() {
        let service = service();
        let err = service
            .submit_report("Processed 0 frames\n1,top_eye,2.3\n", AnalysisRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Assembly(AssemblyError::NoValidData)));
        let store = service.store();
        assert_eq!(store.document_count(&service.collection_path(RecordKind::Analysis)), 0);
        assert_eq!(store.document_count(&service.collection_path(RecordKind::EyeTest)), 0);
    }

    #[tokio::test]
    async fn test_empty_report_is_parse_error() {
        let err = service().submit_report("", AnalysisRequest::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Parse(ParseError::EmptyReport)));
    }

    #[tokio::test]
    async fn test_store_write_failure_surfaced() {
        let service = service();
        service.store().set_fail_writes(true);

        let err = service
            .submit_report(&uniform_report(2.4), AnalysisRequest::default())
            .await
            .unwrap_err();

        match err {
            ServiceError::StoreWrite { message, detail } => {
                assert_eq!(message, "Failed to save analysis results");
                assert!(detail.contains("write rejected"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Accepts analyses, rejects eye tests
    struct EyeTestWritesFail(MemoryStore);

    impl DocumentStore for EyeTestWritesFail {
        async fn create(
            &self,
            path: &CollectionPath,
            id: &str,
            data: serde_json::Value,
        ) -> Result<StoredDocument, StorageError> {
            if path.as_str().ends_with("/eyeTests") {
                return Err(StorageError::WriteFailed(format!("write rejected for {}", path)));
            }
            self.0.create(path, id, data).await
        }

        async fn read_all(
            &self,
            path: &CollectionPath,
        ) -> Result<Vec<StoredDocument>, StorageError> {
            self.0.read_all(path).await
        }

        fn watch(
            &self,
            path: &CollectionPath,
        ) -> Result<tokio::sync::watch::Receiver<Vec<StoredDocument>>, StorageError> {
            self.0.watch(path)
        }
    }

    #[tokio::test]
    async fn test_eye_test_write_failure_names_saved_analysis() {
        let service = AnalysisService::new(
            Arc::new(EyeTestWritesFail(MemoryStore::new())),
            Identity::anonymous("tester"),
            RecordAssembler::default(),
        );

        let err = service
            .submit_report(&uniform_report(2.4), AnalysisRequest::default())
            .await
            .unwrap_err();

        let analyses: Vec<AnalysisRecord> = service.history().await;
        assert_eq!(analyses.len(), 1);
        let eye_tests: Vec<EyeTestRecord> = service.history().await;
        assert!(eye_tests.is_empty());

        match err {
            ServiceError::StoreWrite { message, detail } => {
                assert_eq!(message, "Failed to save analysis results");
                assert!(detail.contains("write rejected"));
                assert!(detail.contains(&analyses[0].id));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_history_is_stamped_and_typed() {
        let service = service();
        let saved = service
            .submit_report(&uniform_report(2.1), AnalysisRequest::default())
            .await
            .unwrap();

        let analyses: Vec<AnalysisRecord> = service.history().await;
        assert_eq!(analyses.len(), 1);
        assert!(analyses[0].timestamp.is_some());
        assert_eq!(analyses[0].fatigue_level, FatigueLevel::High);

        let eye_tests: Vec<EyeTestRecord> = service.history().await;
        assert_eq!(eye_tests.len(), 1);
        assert_eq!(eye_tests[0].metrics.visual_acuity, saved.eye_test.metrics.visual_acuity);
    }

    #[tokio::test]
    async fn test_read_failure_falls_back_to_empty() {
        let service = service();
        service
            .submit_report(&uniform_report(2.4), AnalysisRequest::default())
            .await
            .unwrap();
        service.store().set_fail_reads(true);

        let analyses: Vec<AnalysisRecord> = service.history().await;
        assert!(analyses.is_empty());
    }

    #[tokio::test]
    async fn test_subscription_snapshots() {
        let service = service();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = service
            .subscribe(move |records: Vec<EyeTestRecord>| {
                let _ = tx.send(records.len());
            })
            .unwrap();

        assert_eq!(rx.recv().await, Some(0));
        service
            .submit_report(&uniform_report(2.4), AnalysisRequest::default())
            .await
            .unwrap();
        assert_eq!(rx.recv().await, Some(1));
    }

    #[tokio::test]
    async fn test_subscription_failure_delivers_empty() {
        let service = service();
        service.store().set_fail_reads(true);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let subscription = service.subscribe(move |records: Vec<AnalysisRecord>| {
            let _ = tx.send(records.len());
        });

        assert!(subscription.is_none());
        assert_eq!(rx.recv().await, Some(0));
    }

    #[tokio::test]
    async fn test_daily_trend() {
        let service = service();
        for diameter in [2.0, 2.0, 2.5, 2.5] {
            service
                .submit_report(&uniform_report(diameter), AnalysisRequest::default())
                .await
                .unwrap();
            // ids are epoch milliseconds
            tokio::time::sleep(Duration::from_millis(3)).await;
        }

        let today = Local::now().date_naive();
        let analysis = service.daily_trend::<EyeTestRecord>(today).await;
        assert_eq!(analysis.trend, Trend::Improving);
        assert_eq!(analysis.points, 4);

        let yesterday = today.pred_opt().unwrap();
        let analysis = service.daily_trend::<AnalysisRecord>(yesterday).await;
        assert_eq!(analysis.trend, Trend::Insufficient);
    }
}
