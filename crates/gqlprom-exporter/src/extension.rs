//! async-graphql extension translating request lifecycle hooks into metrics.
//!
//! `PrometheusExtension` is the factory installed on the schema; the engine
//! calls `create` once per request, so `RequestMetrics` holds that request's
//! state (application context, custom labels, operation name/type, resolution
//! flag).
//!
//! Hook order inside async-graphql: `request` wraps `prepare_request`,
//! `parse_query`, `validation` and `execute`; `resolve` runs per field inside
//! `execute`.

use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use async_graphql::extensions::{
    Extension, ExtensionContext, ExtensionFactory, NextExecute, NextParseQuery,
    NextPrepareRequest, NextRequest, NextResolve, NextValidation, ResolveInfo,
};
use async_graphql::parser::types::{DocumentOperations, ExecutableDocument, OperationType};
use async_graphql::{Request, Response, ServerError, ServerResult, ValidationResult, Value, Variables};

use gqlprom_core::labels::{count_field_ancestors, custom_labels, field_labels, request_labels};
use gqlprom_core::metric::LABEL_SUCCESS;
use gqlprom_core::{AppLabels, FieldInfo, LabelSet, LabelSource, MetricName};

use crate::dispatch::{MetricDispatcher, Observation};

/// Extension factory. `C` is the application context type custom labels are
/// read from; it is looked up in the request data, then session/schema data.
/// A clone of it is kept for the request so skip predicates can inspect it.
pub struct PrometheusExtension<C = AppLabels> {
    dispatcher: Arc<MetricDispatcher>,
    custom_labels: Arc<Vec<String>>,
    _context: PhantomData<fn() -> C>,
}

impl<C> PrometheusExtension<C> {
    pub(crate) fn new(dispatcher: Arc<MetricDispatcher>, custom_labels: Arc<Vec<String>>) -> Self {
        Self {
            dispatcher,
            custom_labels,
            _context: PhantomData,
        }
    }
}

impl<C> Clone for PrometheusExtension<C> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.dispatcher), Arc::clone(&self.custom_labels))
    }
}

impl<C: LabelSource + Clone + 'static> ExtensionFactory for PrometheusExtension<C> {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(RequestMetrics::<C> {
            dispatcher: Arc::clone(&self.dispatcher),
            custom_labels: Arc::clone(&self.custom_labels),
            state: Mutex::new(RequestState::default()),
            _context: PhantomData,
        })
    }
}

#[derive(Default)]
struct RequestState {
    context: Option<Arc<dyn LabelSource>>,
    custom: LabelSet,
    operation_name: Option<String>,
    operation: Option<&'static str>,
    /// Set once the engine picked the operation to run.
    resolved: bool,
}

impl RequestState {
    fn labels(&self) -> LabelSet {
        let operation = if self.resolved { self.operation } else { None };
        self.custom
            .clone()
            .merge(&request_labels(self.operation_name.as_deref(), operation))
    }
}

struct RequestMetrics<C> {
    dispatcher: Arc<MetricDispatcher>,
    custom_labels: Arc<Vec<String>>,
    state: Mutex<RequestState>,
    _context: PhantomData<fn() -> C>,
}

impl<C> RequestMetrics<C> {
    fn state(&self) -> MutexGuard<'_, RequestState> {
        // Poisoned lock only means a panic elsewhere in this request; keep counting.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Current labels and context, taken without holding the lock across dispatch.
    fn snapshot(&self) -> (LabelSet, Option<Arc<dyn LabelSource>>) {
        let st = self.state();
        (st.labels(), st.context.clone())
    }

    fn emit(&self, metric: MetricName) {
        let (labels, context) = self.snapshot();
        self.dispatcher
            .action(Observation::new(metric, labels).context(context.as_deref()));
    }

    fn emit_duration(&self, success: bool, ms: f64) {
        let (labels, context) = self.snapshot();
        let labels = labels.with(LABEL_SUCCESS, Some(if success { "true" } else { "false" }));
        self.dispatcher.action(
            Observation::new(MetricName::QueryDuration, labels)
                .value_ms(ms)
                .context(context.as_deref()),
        );
    }
}

fn operation_kind(ty: OperationType) -> &'static str {
    match ty {
        OperationType::Query => "query",
        OperationType::Mutation => "mutation",
        OperationType::Subscription => "subscription",
    }
}

/// Operation type of the operation the engine will run: the only one, or the
/// one matching `operation_name`.
fn selected_operation(doc: &ExecutableDocument, operation_name: Option<&str>) -> Option<&'static str> {
    match &doc.operations {
        DocumentOperations::Single(op) => Some(operation_kind(op.node.ty)),
        DocumentOperations::Multiple(ops) => {
            let name = operation_name?;
            ops.iter()
                .find(|(n, _)| n.as_str() == name)
                .map(|(_, op)| operation_kind(op.node.ty))
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[async_trait::async_trait]
impl<C: LabelSource + Clone + 'static> Extension for RequestMetrics<C> {
    async fn request(&self, ctx: &ExtensionContext<'_>, next: NextRequest<'_>) -> Response {
        let start = Instant::now();
        let response = next.run(ctx).await;
        let ms = elapsed_ms(start);

        if response.is_err() {
            self.emit(MetricName::QueryFailed);
            self.emit_duration(false, ms);
        } else {
            self.emit_duration(true, ms);
        }

        response
    }

    async fn prepare_request(
        &self,
        ctx: &ExtensionContext<'_>,
        request: Request,
        next: NextPrepareRequest<'_>,
    ) -> ServerResult<Request> {
        {
            let from_request = request
                .data
                .get(&TypeId::of::<C>())
                .and_then(|d| (**d).downcast_ref::<C>());
            let source = from_request.or_else(|| ctx.data_opt::<C>());
            let custom = custom_labels(source.map(|c| c as &dyn LabelSource), &self.custom_labels);

            let mut st = self.state();
            st.context = source.map(|c| Arc::new(c.clone()) as Arc<dyn LabelSource>);
            st.custom = custom;
            st.operation_name = request.operation_name.clone();
        }
        self.emit(MetricName::QueryStarted);

        next.run(ctx, request).await
    }

    async fn parse_query(
        &self,
        ctx: &ExtensionContext<'_>,
        query: &str,
        variables: &Variables,
        next: NextParseQuery<'_>,
    ) -> ServerResult<ExecutableDocument> {
        self.emit(MetricName::QueryParseStarted);

        let result = next.run(ctx, query, variables).await;
        match &result {
            Ok(doc) => {
                let mut st = self.state();
                let operation = selected_operation(doc, st.operation_name.as_deref());
                st.operation = operation;
            }
            Err(_) => self.emit(MetricName::QueryParseFailed),
        }
        result
    }

    async fn validation(
        &self,
        ctx: &ExtensionContext<'_>,
        next: NextValidation<'_>,
    ) -> Result<ValidationResult, Vec<ServerError>> {
        self.emit(MetricName::QueryValidationStarted);

        let result = next.run(ctx).await;
        if result.is_err() {
            self.emit(MetricName::QueryValidationFailed);
        }
        result
    }

    async fn execute(
        &self,
        ctx: &ExtensionContext<'_>,
        operation_name: Option<&str>,
        next: NextExecute<'_>,
    ) -> Response {
        {
            let mut st = self.state();
            st.resolved = true;
            if st.operation_name.is_none() {
                st.operation_name = operation_name.map(str::to_string);
            }
        }
        self.emit(MetricName::QueryResolved);
        self.emit(MetricName::QueryExecutionStarted);

        let response = next.run(ctx, operation_name).await;
        if response.is_err() {
            self.emit(MetricName::QueryExecutionFailed);
        }
        response
    }

    async fn resolve(
        &self,
        ctx: &ExtensionContext<'_>,
        info: ResolveInfo<'_>,
        next: NextResolve<'_>,
    ) -> ServerResult<Option<Value>> {
        let field = FieldInfo {
            field_name: info.name.to_string(),
            parent_type: info.parent_type.to_string(),
            path_length: count_field_ancestors(Some(info.path_node), |n| n.parent),
            return_type: info.return_type.to_string(),
        };

        let start = Instant::now();
        let result = next.run(ctx, info).await;
        let ms = elapsed_ms(start);

        let (labels, context) = self.snapshot();
        let labels = labels.merge(&field_labels(&field));
        self.dispatcher.action(
            Observation::new(MetricName::QueryFieldResolutionDuration, labels)
                .value_ms(ms)
                .field(&field)
                .context(context.as_deref()),
        );

        result
    }
}
