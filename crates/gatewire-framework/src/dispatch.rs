//! Dispatch service: one-time wiring pass plus the permanent callback path.
//!
//! [`DispatchService`] consumes the explorer's output and opens one
//! subscription per discovered mapping against the live client. Each
//! subscription is drained by its own forwarding task, so per-topic delivery
//! order is preserved end-to-end while topics stay independent of each
//! other.
//!
//! # State machine
//!
//! ```text
//! Unsubscribed ──subscribe()──▶ Subscribed
//! ```
//!
//! `subscribe()` is the only transition. A second call returns
//! [`DispatchError::AlreadySubscribed`] instead of double-subscribing every
//! handler.

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{DispatchError, DispatchResult};
use crate::explorer::MetadataExplorer;
use gatewire_core::{
    BoxedClient, EventArgs, InstanceRegistry, MappingKind, MessageMapping, PayloadEnvelope,
    SourceReceiver,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchState {
    Unsubscribed,
    Subscribed,
}

/// Wires discovered handler mappings to a live client and fans incoming
/// messages out to them.
///
/// The client and registry are taken at construction; the service never
/// constructs or destroys the registered instances, it only invokes their
/// handlers by reference.
pub struct DispatchService {
    client: BoxedClient,
    registry: Arc<InstanceRegistry>,
    state: Mutex<DispatchState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl DispatchService {
    /// Creates an unsubscribed service over `client` and `registry`.
    pub fn new(client: BoxedClient, registry: Arc<InstanceRegistry>) -> Self {
        Self {
            client,
            registry,
            state: Mutex::new(DispatchState::Unsubscribed),
            tasks: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Runs the startup wiring pass. Must be called from within a tokio
    /// runtime; the discovery itself is synchronous.
    ///
    /// For every gateway (registry order) the discovered mappings are
    /// attached in the order payload, stream, client-event; afterwards the
    /// live client is injected into every consumer slot exactly once.
    ///
    /// # Errors
    ///
    /// [`DispatchError::AlreadySubscribed`] on re-invocation. A
    /// [`DispatchError::Subscription`] aborts the whole pass: forwarding
    /// tasks spawned so far are torn down again and the service stays
    /// unsubscribed, since a partially-wired gateway set is an inconsistent
    /// state.
    pub fn subscribe(&self) -> DispatchResult<()> {
        let mut state = self.state.lock();
        if *state == DispatchState::Subscribed {
            return Err(DispatchError::AlreadySubscribed);
        }

        let mut handles = Vec::new();
        let result = self.wire_all(&mut handles);

        match result {
            Ok(()) => {
                self.tasks.lock().extend(handles);
                *state = DispatchState::Subscribed;
                Ok(())
            }
            Err(err) => {
                for handle in handles {
                    handle.abort();
                }
                Err(err)
            }
        }
    }

    /// Number of live forwarding tasks.
    pub fn subscription_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Stops all forwarding tasks. Invoked by the surrounding runtime's
    /// shutdown hook; the client's own shutdown is not called here.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handles: Vec<_> = std::mem::take(&mut *self.tasks.lock());
        for handle in handles {
            let _ = handle.await;
        }
    }

    fn wire_all(&self, handles: &mut Vec<JoinHandle<()>>) -> DispatchResult<()> {
        for gateway in MetadataExplorer::extract_gateways(&self.registry) {
            let gateway_name = gateway.gateway_name();
            let mappings = MetadataExplorer::explore_gateway(&gateway);

            // Per-gateway attach order: payload, stream, client-event.
            for kind in [
                MappingKind::Payload,
                MappingKind::Stream,
                MappingKind::ClientEvent,
            ] {
                for mapping in mappings.iter().filter(|m| m.kind == kind) {
                    let handle = self.attach(mapping)?;
                    info!(
                        gateway = gateway_name,
                        path = %mapping.path,
                        kind = %mapping.kind,
                        "Gateway subscribed"
                    );
                    handles.push(handle);
                }
            }
        }

        for consumer in MetadataExplorer::extract_client_consumers(&self.registry) {
            for (name, slot) in consumer.client_slots() {
                if slot.set(Arc::clone(&self.client)).is_err() {
                    warn!(slot = name, "Client slot already populated, skipping");
                }
            }
        }

        Ok(())
    }

    fn attach(&self, mapping: &MessageMapping) -> DispatchResult<JoinHandle<()>> {
        let subscription = |source: gatewire_core::ClientError| DispatchError::Subscription {
            path: mapping.path.clone(),
            source,
        };

        let handle = match mapping.kind {
            MappingKind::Payload => {
                let rx = self
                    .client
                    .subscribe_payloads(&mapping.path)
                    .map_err(subscription)?;
                spawn_payload_forwarder(mapping.clone(), rx, self.cancel.clone())
            }
            MappingKind::Stream => {
                let rx = self
                    .client
                    .subscribe_stream(&mapping.path)
                    .map_err(subscription)?;
                spawn_stream_forwarder(mapping.clone(), rx, self.cancel.clone())
            }
            MappingKind::ClientEvent => {
                let rx = self
                    .client
                    .subscribe_events(&mapping.path)
                    .map_err(subscription)?;
                spawn_event_forwarder(mapping.clone(), rx, self.cancel.clone())
            }
            // The explorer guarantees this never reaches dispatch.
            MappingKind::Unknown => {
                debug_assert!(false, "unknown mapping reached dispatch");
                return Err(DispatchError::Subscription {
                    path: mapping.path.clone(),
                    source: gatewire_core::ClientError::UnknownSource {
                        path: mapping.path.clone(),
                    },
                });
            }
        };

        Ok(handle)
    }
}

impl std::fmt::Debug for DispatchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchService")
            .field("state", &*self.state.lock())
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

// =============================================================================
// Forwarding tasks
// =============================================================================

fn spawn_payload_forwarder(
    mapping: MessageMapping,
    mut rx: SourceReceiver<PayloadEnvelope>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                envelope = rx.recv() => {
                    let Some(envelope) = envelope else { break };
                    let args =
                        mapping
                            .param_order
                            .arrange(envelope.error, envelope.context, envelope.data);
                    invoke(&mapping, args).await;
                }
            }
        }
    })
}

fn spawn_stream_forwarder(
    mapping: MessageMapping,
    mut rx: SourceReceiver<Value>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                message = rx.recv() => {
                    let Some(message) = message else { break };
                    // A stream message is the handler's only argument.
                    invoke(&mapping, vec![message]).await;
                }
            }
        }
    })
}

fn spawn_event_forwarder(
    mapping: MessageMapping,
    mut rx: SourceReceiver<EventArgs>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                args = rx.recv() => {
                    let Some(args) = args else { break };
                    // Emitted arguments are forwarded verbatim.
                    invoke(&mapping, args).await;
                }
            }
        }
    })
}

/// Invokes the bound callback, isolating failures per call: a returned error
/// or a panic is logged and neither unsubscribes the topic nor affects other
/// handlers.
async fn invoke(mapping: &MessageMapping, args: Vec<Value>) {
    let fut = (mapping.callback)(args);
    match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!(
            method = mapping.method_name,
            path = %mapping.path,
            error = %err,
            "Handler returned an error"
        ),
        Err(_) => error!(
            method = mapping.method_name,
            path = %mapping.path,
            "Handler panicked"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gatewire_core::{
        ClientError, ClientResult, Gateway, HandlerSpec, NetworkClient, ParamRole, Registrant,
    };
    use parking_lot::Mutex as PlMutex;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// In-memory client: hands out one channel per subscribed path and keeps
    /// the sender side for the test to feed.
    #[derive(Default)]
    struct ChannelClient {
        payload_tx: PlMutex<HashMap<String, mpsc::UnboundedSender<PayloadEnvelope>>>,
        stream_tx: PlMutex<HashMap<String, mpsc::UnboundedSender<Value>>>,
        event_tx: PlMutex<HashMap<String, mpsc::UnboundedSender<EventArgs>>>,
        fail_paths: Vec<String>,
    }

    impl ChannelClient {
        fn failing(paths: &[&str]) -> Self {
            Self {
                fail_paths: paths.iter().map(|p| p.to_string()).collect(),
                ..Default::default()
            }
        }

        fn check(&self, path: &str) -> ClientResult<()> {
            if self.fail_paths.iter().any(|p| p == path) {
                return Err(ClientError::AttachFailed {
                    path: path.to_string(),
                    reason: "simulated".to_string(),
                });
            }
            Ok(())
        }

        fn emit_payload(&self, path: &str, envelope: PayloadEnvelope) {
            let _ = self.payload_tx.lock()[path].send(envelope);
        }

        fn emit_stream(&self, path: &str, message: Value) {
            let _ = self.stream_tx.lock()[path].send(message);
        }

        fn emit_event(&self, path: &str, args: EventArgs) {
            let _ = self.event_tx.lock()[path].send(args);
        }
    }

    #[async_trait]
    impl NetworkClient for ChannelClient {
        fn subscribe_events(&self, path: &str) -> ClientResult<SourceReceiver<EventArgs>> {
            self.check(path)?;
            let (tx, rx) = mpsc::unbounded_channel();
            self.event_tx.lock().insert(path.to_string(), tx);
            Ok(rx)
        }

        fn subscribe_payloads(
            &self,
            signature: &str,
        ) -> ClientResult<SourceReceiver<PayloadEnvelope>> {
            self.check(signature)?;
            let (tx, rx) = mpsc::unbounded_channel();
            self.payload_tx.lock().insert(signature.to_string(), tx);
            Ok(rx)
        }

        fn subscribe_stream(&self, name: &str) -> ClientResult<SourceReceiver<Value>> {
            self.check(name)?;
            let (tx, rx) = mpsc::unbounded_channel();
            self.stream_tx.lock().insert(name.to_string(), tx);
            Ok(rx)
        }

        async fn shutdown(&self) -> ClientResult<()> {
            Ok(())
        }
    }

    struct RecordingGateway {
        calls: Arc<PlMutex<Vec<Vec<Value>>>>,
    }

    impl Gateway for RecordingGateway {
        fn gateway_name(&self) -> &'static str {
            "RecordingGateway"
        }

        fn handler_specs(self: Arc<Self>) -> Vec<HandlerSpec> {
            let calls = Arc::clone(&self.calls);
            let event_calls = Arc::clone(&self.calls);
            vec![
                HandlerSpec::new("on_ack")
                    .payload("cmd.ack")
                    .param(0, ParamRole::Payload)
                    .param(1, ParamRole::Context)
                    .handler(move |args| {
                        let calls = Arc::clone(&calls);
                        async move {
                            calls.lock().push(args);
                            Ok(())
                        }
                    }),
                HandlerSpec::new("on_any")
                    .client_event("status")
                    .handler(move |args| {
                        let calls = Arc::clone(&event_calls);
                        async move {
                            calls.lock().push(args);
                            Ok(())
                        }
                    }),
            ]
        }
    }

    impl Registrant for RecordingGateway {
        fn as_gateway(self: Arc<Self>) -> Option<Arc<dyn Gateway>> {
            Some(self)
        }
    }

    fn service_with(
        client: Arc<ChannelClient>,
        gateway: Arc<RecordingGateway>,
    ) -> DispatchService {
        let registry = Arc::new(InstanceRegistry::new());
        registry.register(gateway);
        DispatchService::new(client, registry)
    }

    async fn settle() {
        // Give forwarding tasks a chance to drain their channels.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn payload_arguments_land_at_declared_positions() {
        let client = Arc::new(ChannelClient::default());
        let calls = Arc::new(PlMutex::new(Vec::new()));
        let service = service_with(
            Arc::clone(&client),
            Arc::new(RecordingGateway {
                calls: Arc::clone(&calls),
            }),
        );

        service.subscribe().unwrap();
        client.emit_payload(
            "cmd.ack",
            PayloadEnvelope {
                error: Value::Null,
                context: json!({"device": "d1"}),
                data: json!(42),
            },
        );
        settle().await;

        let recorded = calls.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0], vec![json!(42), json!({"device": "d1"})]);
    }

    #[tokio::test]
    async fn client_events_forward_arguments_verbatim() {
        let client = Arc::new(ChannelClient::default());
        let calls = Arc::new(PlMutex::new(Vec::new()));
        let service = service_with(
            Arc::clone(&client),
            Arc::new(RecordingGateway {
                calls: Arc::clone(&calls),
            }),
        );

        service.subscribe().unwrap();
        client.emit_event("status", vec![json!("up"), json!(3), json!(null)]);
        settle().await;

        let recorded = calls.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0], vec![json!("up"), json!(3), json!(null)]);
    }

    #[tokio::test]
    async fn second_subscribe_is_rejected() {
        let client = Arc::new(ChannelClient::default());
        let service = service_with(
            client,
            Arc::new(RecordingGateway {
                calls: Arc::new(PlMutex::new(Vec::new())),
            }),
        );

        service.subscribe().unwrap();
        assert!(matches!(
            service.subscribe(),
            Err(DispatchError::AlreadySubscribed)
        ));
        assert_eq!(service.subscription_count(), 2);
    }

    #[tokio::test]
    async fn setup_failure_aborts_the_whole_pass() {
        let client = Arc::new(ChannelClient::failing(&["status"]));
        let service = service_with(
            client,
            Arc::new(RecordingGateway {
                calls: Arc::new(PlMutex::new(Vec::new())),
            }),
        );

        let err = service.subscribe().unwrap_err();
        assert!(matches!(err, DispatchError::Subscription { ref path, .. } if path == "status"));
        // No task survives a failed pass, and a retry is still possible.
        assert_eq!(service.subscription_count(), 0);
    }

    #[tokio::test]
    async fn handler_errors_do_not_unsubscribe_the_topic() {
        struct FlakyGateway {
            hits: Arc<AtomicUsize>,
        }

        impl Gateway for FlakyGateway {
            fn gateway_name(&self) -> &'static str {
                "FlakyGateway"
            }

            fn handler_specs(self: Arc<Self>) -> Vec<HandlerSpec> {
                let hits = Arc::clone(&self.hits);
                vec![HandlerSpec::new("on_msg").stream("telemetry").handler(
                    move |_args| {
                        let hits = Arc::clone(&hits);
                        async move {
                            if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                                Err("first delivery fails".into())
                            } else {
                                Ok(())
                            }
                        }
                    },
                )]
            }
        }

        impl Registrant for FlakyGateway {
            fn as_gateway(self: Arc<Self>) -> Option<Arc<dyn Gateway>> {
                Some(self)
            }
        }

        let client = Arc::new(ChannelClient::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(InstanceRegistry::new());
        registry.register(Arc::new(FlakyGateway {
            hits: Arc::clone(&hits),
        }));
        let service = DispatchService::new(Arc::clone(&client) as BoxedClient, registry);

        service.subscribe().unwrap();
        client.emit_stream("telemetry", json!(1));
        client.emit_stream("telemetry", json!(2));
        settle().await;

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn handler_panics_do_not_unsubscribe_the_topic() {
        struct PanickyGateway {
            hits: Arc<AtomicUsize>,
        }

        impl Gateway for PanickyGateway {
            fn gateway_name(&self) -> &'static str {
                "PanickyGateway"
            }

            fn handler_specs(self: Arc<Self>) -> Vec<HandlerSpec> {
                let hits = Arc::clone(&self.hits);
                vec![HandlerSpec::new("on_msg").stream("telemetry").handler(
                    move |_args| {
                        let hits = Arc::clone(&hits);
                        async move {
                            if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                                panic!("first delivery panics");
                            }
                            Ok(())
                        }
                    },
                )]
            }
        }

        impl Registrant for PanickyGateway {
            fn as_gateway(self: Arc<Self>) -> Option<Arc<dyn Gateway>> {
                Some(self)
            }
        }

        let client = Arc::new(ChannelClient::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(InstanceRegistry::new());
        registry.register(Arc::new(PanickyGateway {
            hits: Arc::clone(&hits),
        }));
        let service = DispatchService::new(Arc::clone(&client) as BoxedClient, registry);

        service.subscribe().unwrap();
        client.emit_stream("telemetry", json!(1));
        client.emit_stream("telemetry", json!(2));
        settle().await;

        // The panic is contained per message; the second one still lands.
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(service.subscription_count(), 1);
    }

    #[tokio::test]
    async fn shutdown_stops_forwarding() {
        let client = Arc::new(ChannelClient::default());
        let calls = Arc::new(PlMutex::new(Vec::new()));
        let service = service_with(
            Arc::clone(&client),
            Arc::new(RecordingGateway {
                calls: Arc::clone(&calls),
            }),
        );

        service.subscribe().unwrap();
        service.shutdown().await;
        client.emit_event("status", vec![json!("late")]);
        settle().await;

        assert!(calls.lock().is_empty());
        assert_eq!(service.subscription_count(), 0);
    }
}
