// crates/relcat-rpc/src/middleware.rs
//
// Call admission middleware for the RPC server.
//
// Every inbound call runs through an `AdmissionChain`: an ordered list of
// `AdmissionStage`s, each of which may reject the call, followed by the
// handler itself and a `CallObserver` that records the outcome. A call
// rejected by any stage never reaches its handler.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use relcat_core::credential::strip_basic_prefix;
use relcat_core::{CredentialStore, TokenStatus};
use tonic::metadata::MetadataMap;
use tonic::{Code, Status};
use uuid::Uuid;

use crate::operation::{Admission, Operation};

/// Metadata key carrying the caller's credential.
pub const AUTHORIZATION_KEY: &str = "authorization";

// ---------------------------------------------------------------------------
// CallContext
// ---------------------------------------------------------------------------

/// What admission stages get to see about a call.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Unique id for correlating log lines of one call.
    pub call_id: Uuid,
    /// The operation being invoked.
    pub operation: Operation,
    /// Call metadata. `None` when the caller supplied no metadata at all.
    pub metadata: Option<MetadataMap>,
}

impl CallContext {
    pub fn new(operation: Operation, metadata: Option<MetadataMap>) -> Self {
        Self {
            call_id: Uuid::now_v7(),
            operation,
            metadata,
        }
    }

    /// Build a context from an inbound tonic request.
    pub fn from_request<M>(operation: Operation, request: &tonic::Request<M>) -> Self {
        Self::new(operation, Some(request.metadata().clone()))
    }
}

// ---------------------------------------------------------------------------
// AdmissionStage
// ---------------------------------------------------------------------------

/// One step of the admission decision.
///
/// `admit` returns `Ok(())` to let the call continue to the next stage, or
/// the `Status` to send back to the caller.
pub trait AdmissionStage: Send + Sync {
    /// Short name used in logs when this stage rejects a call.
    fn name(&self) -> &'static str;

    /// Inspect the call and allow or reject it.
    fn admit(&self, ctx: &CallContext) -> Result<(), Status>;
}

/// Checks the `authorization` metadata against a [`CredentialStore`].
///
/// Operations in the exempt set are admitted without looking at metadata.
/// By default the exempt set is every operation tagged
/// [`Admission::Exempt`].
pub struct CredentialStage {
    store: Arc<CredentialStore>,
    exempt: HashSet<Operation>,
}

impl CredentialStage {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        let exempt = Operation::ALL
            .into_iter()
            .filter(|op| op.admission() == Admission::Exempt)
            .collect();
        Self { store, exempt }
    }

    /// Replace the exempt set.
    pub fn with_exempt<I>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = Operation>,
    {
        self.exempt = operations.into_iter().collect();
        self
    }

    /// Whether calls to `operation` skip credential checks.
    pub fn is_exempt(&self, operation: Operation) -> bool {
        self.exempt.contains(&operation)
    }
}

impl std::fmt::Debug for CredentialStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStage")
            .field("known_tokens", &self.store.len())
            .field("exempt", &self.exempt)
            .finish()
    }
}

impl AdmissionStage for CredentialStage {
    fn name(&self) -> &'static str {
        "credentials"
    }

    fn admit(&self, ctx: &CallContext) -> Result<(), Status> {
        if self.is_exempt(ctx.operation) {
            return Ok(());
        }

        let metadata = ctx
            .metadata
            .as_ref()
            .ok_or_else(|| Status::invalid_argument("retrieving metadata failed"))?;

        let value = metadata
            .get(AUTHORIZATION_KEY)
            .ok_or_else(|| Status::invalid_argument("no auth details supplied"))?;

        let token = value
            .to_str()
            .ok()
            .and_then(strip_basic_prefix)
            .ok_or_else(|| Status::invalid_argument("malformed auth details"))?;

        match self.store.check(token) {
            TokenStatus::Valid => Ok(()),
            TokenStatus::Revoked => Err(Status::unauthenticated("auth failed")),
            TokenStatus::Unknown => Err(Status::not_found("auth not found")),
        }
    }
}

// ---------------------------------------------------------------------------
// CallObserver
// ---------------------------------------------------------------------------

/// How a call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Ok,
    Err { code: Code, message: String },
}

impl CallOutcome {
    fn from_result<T>(result: &Result<T, Status>) -> Self {
        match result {
            Ok(_) => CallOutcome::Ok,
            Err(status) => CallOutcome::Err {
                code: status.code(),
                message: status.message().to_string(),
            },
        }
    }
}

/// One completed call, as handed to a [`CallObserver`].
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub call_id: Uuid,
    pub operation: Operation,
    pub elapsed: Duration,
    pub outcome: CallOutcome,
    /// Name of the stage that rejected the call; `None` if it was dispatched.
    pub rejected_by: Option<&'static str>,
}

impl CallRecord {
    /// Whether the handler ran for this call.
    pub fn dispatched(&self) -> bool {
        self.rejected_by.is_none()
    }
}

/// Sink for per-call records.
pub trait CallObserver: Send + Sync {
    fn record(&self, record: &CallRecord);
}

/// Writes one structured log line per call via `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CallObserver for TracingObserver {
    fn record(&self, record: &CallRecord) {
        let duration_ms = record.elapsed.as_secs_f64() * 1000.0;
        match &record.outcome {
            CallOutcome::Ok => tracing::info!(
                call_id = %record.call_id,
                method = record.operation.path(),
                duration_ms,
                "request completed"
            ),
            CallOutcome::Err { code, message } => tracing::warn!(
                call_id = %record.call_id,
                method = record.operation.path(),
                duration_ms,
                code = ?code,
                error = %message,
                rejected_by = record.rejected_by.unwrap_or("-"),
                "request failed"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// AdmissionChain
// ---------------------------------------------------------------------------

/// Ordered admission stages plus the observer that records every call.
#[derive(Clone)]
pub struct AdmissionChain {
    stages: Vec<Arc<dyn AdmissionStage>>,
    observer: Arc<dyn CallObserver>,
}

impl std::fmt::Debug for AdmissionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("AdmissionChain").field("stages", &names).finish()
    }
}

impl Default for AdmissionChain {
    /// No stages; every call is admitted and logged through `tracing`.
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            observer: Arc::new(TracingObserver),
        }
    }
}

impl AdmissionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage. Stages run in the order they were added.
    pub fn with_stage(mut self, stage: Arc<dyn AdmissionStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Replace the call observer.
    pub fn with_observer(mut self, observer: Arc<dyn CallObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Number of configured stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the stages for `ctx`, then `handler` if every stage admits.
    ///
    /// The handler's result is returned exactly as produced. The observer
    /// sees every call, including rejected ones.
    pub async fn run<T, F, Fut>(&self, ctx: CallContext, handler: F) -> Result<T, Status>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        let start = Instant::now();

        for stage in &self.stages {
            if let Err(status) = stage.admit(&ctx) {
                self.observer.record(&CallRecord {
                    call_id: ctx.call_id,
                    operation: ctx.operation,
                    elapsed: start.elapsed(),
                    outcome: CallOutcome::Err {
                        code: status.code(),
                        message: status.message().to_string(),
                    },
                    rejected_by: Some(stage.name()),
                });
                return Err(status);
            }
        }

        let result = handler().await;

        self.observer.record(&CallRecord {
            call_id: ctx.call_id,
            operation: ctx.operation,
            elapsed: start.elapsed(),
            outcome: CallOutcome::from_result(&result),
            rejected_by: None,
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relcat_core::BasicCredential;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tonic::metadata::MetadataValue;

    #[derive(Default)]
    struct RecordingObserver {
        records: Mutex<Vec<CallRecord>>,
    }

    impl CallObserver for RecordingObserver {
        fn record(&self, record: &CallRecord) {
            self.records.lock().unwrap().push(record.clone());
        }
    }

    fn credential_stage() -> CredentialStage {
        CredentialStage::new(Arc::new(CredentialStore::default()))
    }

    fn metadata_with(value: &str) -> MetadataMap {
        let mut md = MetadataMap::new();
        md.insert(AUTHORIZATION_KEY, MetadataValue::try_from(value).unwrap());
        md
    }

    fn ctx(operation: Operation, metadata: Option<MetadataMap>) -> CallContext {
        CallContext::new(operation, metadata)
    }

    #[test]
    fn test_no_metadata_is_invalid_argument() {
        let status = credential_stage()
            .admit(&ctx(Operation::GetReleaseInfo, None))
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "retrieving metadata failed");
    }

    #[test]
    fn test_missing_authorization_is_invalid_argument() {
        let mut md = MetadataMap::new();
        md.insert("x-trace", MetadataValue::from_static("abc"));
        let status = credential_stage()
            .admit(&ctx(Operation::GetReleaseInfo, Some(md)))
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "no auth details supplied");
    }

    #[test]
    fn test_missing_basic_prefix_is_invalid_argument() {
        let token = BasicCredential::demo().token();
        let status = credential_stage()
            .admit(&ctx(
                Operation::GetReleaseInfo,
                Some(metadata_with(&format!("Bearer {}", token))),
            ))
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[test]
    fn test_unknown_token_is_not_found() {
        let stranger = BasicCredential::new("scaramoucheX2", "thunderbolt-and-lightning");
        let status = credential_stage()
            .admit(&ctx(
                Operation::GetReleaseInfo,
                Some(metadata_with(&stranger.authorization_value())),
            ))
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "auth not found");
    }

    #[test]
    fn test_revoked_token_is_unauthenticated() {
        let revoked = BasicCredential::new("galileo", "figaro");
        let store = CredentialStore::default().with_credential(&revoked, false);
        let stage = CredentialStage::new(Arc::new(store));
        let status = stage
            .admit(&ctx(
                Operation::GetReleaseInfo,
                Some(metadata_with(&revoked.authorization_value())),
            ))
            .unwrap_err();
        assert_eq!(status.code(), Code::Unauthenticated);
        assert_eq!(status.message(), "auth failed");
    }

    #[test]
    fn test_demo_token_is_admitted() {
        let value = format!(
            "Basic {}",
            "c2NhcmFtb3VjaGVYMjpDYW4teW91LWRvLXRoZS1mYW5kYW5nbz8="
        );
        assert_eq!(value, BasicCredential::demo().authorization_value());
        credential_stage()
            .admit(&ctx(Operation::GetReleaseInfo, Some(metadata_with(&value))))
            .unwrap();
    }

    #[test]
    fn test_listing_is_exempt_regardless_of_metadata() {
        let stage = credential_stage();
        stage.admit(&ctx(Operation::ListReleases, None)).unwrap();
        stage
            .admit(&ctx(Operation::ListReleases, Some(MetadataMap::new())))
            .unwrap();
        stage
            .admit(&ctx(Operation::ListReleases, Some(metadata_with("Basic bogus"))))
            .unwrap();
    }

    #[test]
    fn test_exempt_set_can_be_replaced() {
        let stage = credential_stage().with_exempt(Vec::new());
        let status = stage.admit(&ctx(Operation::ListReleases, None)).unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let stage = credential_stage().with_exempt(Operation::ALL);
        stage.admit(&ctx(Operation::GetReleaseInfo, None)).unwrap();
    }

    #[tokio::test]
    async fn test_rejected_call_never_dispatches() {
        let observer = Arc::new(RecordingObserver::default());
        let chain = AdmissionChain::new()
            .with_stage(Arc::new(credential_stage()))
            .with_observer(observer.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<u32, Status> = chain
            .run(ctx(Operation::GetReleaseInfo, None), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;

        assert_eq!(result.unwrap_err().code(), Code::InvalidArgument);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let records = observer.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].dispatched());
        assert_eq!(records[0].rejected_by, Some("credentials"));
    }

    #[tokio::test]
    async fn test_admitted_call_result_passes_through_unchanged() {
        let observer = Arc::new(RecordingObserver::default());
        let chain = AdmissionChain::new()
            .with_stage(Arc::new(credential_stage()))
            .with_observer(observer.clone());

        let ok: Result<&str, Status> = chain
            .run(ctx(Operation::ListReleases, None), || async { Ok("releases") })
            .await;
        assert_eq!(ok.unwrap(), "releases");

        let md = metadata_with(&BasicCredential::demo().authorization_value());
        let err: Result<(), Status> = chain
            .run(ctx(Operation::GetReleaseInfo, Some(md)), || async {
                Err(Status::not_found("release version 9.9 not found"))
            })
            .await;
        let err = err.unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
        assert_eq!(err.message(), "release version 9.9 not found");

        let records = observer.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].outcome, CallOutcome::Ok);
        assert_eq!(records[0].operation, Operation::ListReleases);
        assert!(records[1].dispatched());
        assert!(matches!(
            records[1].outcome,
            CallOutcome::Err { code: Code::NotFound, .. }
        ));
    }

    #[tokio::test]
    async fn test_stages_run_in_order_and_stop_at_first_rejection() {
        struct Fixed(&'static str, Option<Code>, Arc<Mutex<Vec<&'static str>>>);
        impl AdmissionStage for Fixed {
            fn name(&self) -> &'static str {
                self.0
            }
            fn admit(&self, _ctx: &CallContext) -> Result<(), Status> {
                self.2.lock().unwrap().push(self.0);
                match self.1 {
                    Some(code) => Err(Status::new(code, self.0)),
                    None => Ok(()),
                }
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain = AdmissionChain::new()
            .with_stage(Arc::new(Fixed("first", None, seen.clone())))
            .with_stage(Arc::new(Fixed("second", Some(Code::PermissionDenied), seen.clone())))
            .with_stage(Arc::new(Fixed("third", None, seen.clone())));
        assert_eq!(chain.len(), 3);

        let result: Result<(), Status> = chain
            .run(ctx(Operation::ListReleases, None), || async { Ok(()) })
            .await;

        assert_eq!(result.unwrap_err().code(), Code::PermissionDenied);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_empty_chain_admits_everything() {
        let chain = AdmissionChain::default();
        assert!(chain.is_empty());
        let result: Result<i32, Status> = chain
            .run(ctx(Operation::GetReleaseInfo, None), || async { Ok(1) })
            .await;
        assert_eq!(result.unwrap(), 1);
    }
}
