//! Descriptor explorer.
//!
//! Turns the registered instance population into validated
//! [`MessageMapping`]s and client-injection targets. The explorer is
//! stateless and has no side effects on the instances themselves except
//! reads.
//!
//! # Failure semantics
//!
//! Explorer operations never fail the whole pass for one malformed method: a
//! spec that cannot be classified is dropped from the result set with a
//! warning, and no partial record is emitted. A method with no event-family
//! declaration is ordinary behaviour and is skipped silently.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::DiscoveryError;
use gatewire_core::{
    ClientConsumer, Gateway, HandlerSpec, InstanceRegistry, MappingKind, MessageMapping,
    ParamOrder,
};

/// Stateless discovery over an [`InstanceRegistry`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataExplorer;

impl MetadataExplorer {
    /// Filters the population down to gateway-capable instances, in
    /// insertion order.
    pub fn extract_gateways(registry: &InstanceRegistry) -> Vec<Arc<dyn Gateway>> {
        registry
            .snapshot()
            .into_iter()
            .filter_map(|instance| instance.as_gateway())
            .collect()
    }

    /// Filters the population down to instances with at least one client
    /// slot, in insertion order.
    ///
    /// An instance exposing zero slots is excluded even when it implements
    /// the consumer capability.
    pub fn extract_client_consumers(registry: &InstanceRegistry) -> Vec<Arc<dyn ClientConsumer>> {
        registry
            .snapshot()
            .into_iter()
            .filter_map(|instance| instance.as_client_consumer())
            .filter(|consumer| Self::scan_injection_slots(consumer.as_ref()).next().is_some())
            .collect()
    }

    /// Classifies every handler spec the gateway declares into mapping
    /// records, dropping specs that fail validation.
    pub fn explore_gateway(gateway: &Arc<dyn Gateway>) -> Vec<MessageMapping> {
        let name = gateway.gateway_name();
        Arc::clone(gateway)
            .handler_specs()
            .into_iter()
            .filter_map(|spec| match Self::classify(&spec) {
                Ok(mapping) => Some(mapping),
                Err(DiscoveryError::NotAHandler { method }) => {
                    trace!(gateway = name, method, "Method is not a handler, skipped");
                    None
                }
                Err(err) => {
                    warn!(gateway = name, error = %err, "Handler spec dropped");
                    None
                }
            })
            .collect()
    }

    /// Produces, lazily, the names of the consumer's injection slots.
    ///
    /// Finite, re-enumerable, side-effect free.
    pub fn scan_injection_slots(
        consumer: &dyn ClientConsumer,
    ) -> impl Iterator<Item = &'static str> {
        consumer.client_slots().into_iter().map(|(name, _)| name)
    }

    /// Resolves one spec into a mapping record.
    ///
    /// Exactly one event-family declaration yields the record's kind and
    /// path; zero means the method is not a handler; more than one is a
    /// registration mistake and is rejected rather than resolved by
    /// precedence.
    fn classify(spec: &HandlerSpec) -> Result<MessageMapping, DiscoveryError> {
        let method = spec.method_name();

        let families = [
            spec.payload_signature().map(|p| (MappingKind::Payload, p)),
            spec.stream_name().map(|p| (MappingKind::Stream, p)),
            spec.event_name().map(|p| (MappingKind::ClientEvent, p)),
        ];
        let mut declared = families.into_iter().flatten();

        let (kind, path) = declared.next().ok_or(DiscoveryError::NotAHandler { method })?;
        if declared.next().is_some() {
            return Err(DiscoveryError::AmbiguousKind { method });
        }

        let callback = spec
            .callback()
            .cloned()
            .ok_or(DiscoveryError::MissingCallback { method })?;

        let mut param_order = ParamOrder::empty();
        for &(index, role) in spec.params() {
            param_order
                .assign(role, index)
                .map_err(|source| DiscoveryError::ParamOrder { method, source })?;
        }

        Ok(MessageMapping {
            kind,
            path: path.to_string(),
            callback,
            method_name: method,
            param_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewire_core::{ClientSlot, ParamRole, Registrant};

    struct Probe;

    impl Gateway for Probe {
        fn gateway_name(&self) -> &'static str {
            "Probe"
        }

        fn handler_specs(self: Arc<Self>) -> Vec<HandlerSpec> {
            vec![
                // Ordinary behaviour, no event family.
                HandlerSpec::new("helper").handler(|_| async { Ok(()) }),
                HandlerSpec::new("on_ack")
                    .payload("cmd.ack")
                    .param(0, ParamRole::Payload)
                    .handler(|_| async { Ok(()) }),
                HandlerSpec::new("on_telemetry")
                    .stream("telemetry")
                    .handler(|_| async { Ok(()) }),
                HandlerSpec::new("on_connect")
                    .client_event("connected")
                    .handler(|_| async { Ok(()) }),
                // Two families at once: dropped.
                HandlerSpec::new("confused")
                    .payload("sig")
                    .stream("telemetry")
                    .handler(|_| async { Ok(()) }),
                // Declared but no body: dropped.
                HandlerSpec::new("hollow").payload("sig"),
                // Conflicting slots: dropped.
                HandlerSpec::new("clash")
                    .payload("sig")
                    .param(0, ParamRole::Context)
                    .param(0, ParamRole::Payload)
                    .handler(|_| async { Ok(()) }),
            ]
        }
    }

    impl Registrant for Probe {
        fn as_gateway(self: Arc<Self>) -> Option<Arc<dyn Gateway>> {
            Some(self)
        }
    }

    #[test]
    fn untagged_methods_yield_no_record() {
        let gateway: Arc<dyn Gateway> = Arc::new(Probe);
        let mappings = MetadataExplorer::explore_gateway(&gateway);
        assert!(mappings.iter().all(|m| m.method_name != "helper"));
    }

    #[test]
    fn kinds_and_paths_match_declared_families() {
        let gateway: Arc<dyn Gateway> = Arc::new(Probe);
        let mappings = MetadataExplorer::explore_gateway(&gateway);
        assert_eq!(mappings.len(), 3);

        let by_method = |name: &str| mappings.iter().find(|m| m.method_name == name).unwrap();
        assert_eq!(by_method("on_ack").kind, MappingKind::Payload);
        assert_eq!(by_method("on_ack").path, "cmd.ack");
        assert_eq!(by_method("on_telemetry").kind, MappingKind::Stream);
        assert_eq!(by_method("on_telemetry").path, "telemetry");
        assert_eq!(by_method("on_connect").kind, MappingKind::ClientEvent);
        assert_eq!(by_method("on_connect").path, "connected");
    }

    #[test]
    fn malformed_specs_are_dropped_not_fatal() {
        let gateway: Arc<dyn Gateway> = Arc::new(Probe);
        let mappings = MetadataExplorer::explore_gateway(&gateway);
        for dropped in ["confused", "hollow", "clash"] {
            assert!(mappings.iter().all(|m| m.method_name != dropped));
        }
        // No Unknown record ever escapes discovery.
        assert!(mappings.iter().all(|m| m.kind != MappingKind::Unknown));
    }

    struct Consumer {
        primary: ClientSlot,
        secondary: ClientSlot,
        // Ordinary state, never injected.
        #[allow(dead_code)]
        label: &'static str,
    }

    impl ClientConsumer for Consumer {
        fn client_slots(&self) -> Vec<(&'static str, &ClientSlot)> {
            vec![("primary", &self.primary), ("secondary", &self.secondary)]
        }
    }

    impl Registrant for Consumer {
        fn as_client_consumer(self: Arc<Self>) -> Option<Arc<dyn ClientConsumer>> {
            Some(self)
        }
    }

    struct SlotlessConsumer;

    impl ClientConsumer for SlotlessConsumer {
        fn client_slots(&self) -> Vec<(&'static str, &ClientSlot)> {
            Vec::new()
        }
    }

    impl Registrant for SlotlessConsumer {
        fn as_client_consumer(self: Arc<Self>) -> Option<Arc<dyn ClientConsumer>> {
            Some(self)
        }
    }

    #[test]
    fn scan_yields_exactly_the_declared_slot_names() {
        let consumer = Consumer {
            primary: ClientSlot::new(),
            secondary: ClientSlot::new(),
            label: "untagged",
        };
        let names: Vec<_> = MetadataExplorer::scan_injection_slots(&consumer).collect();
        assert_eq!(names, vec!["primary", "secondary"]);

        // Re-enumerable.
        let again: Vec<_> = MetadataExplorer::scan_injection_slots(&consumer).collect();
        assert_eq!(names, again);
    }

    #[test]
    fn slotless_consumers_are_excluded() {
        let registry = InstanceRegistry::new();
        registry.register(Arc::new(SlotlessConsumer));
        registry.register(Arc::new(Consumer {
            primary: ClientSlot::new(),
            secondary: ClientSlot::new(),
            label: "kept",
        }));

        let consumers = MetadataExplorer::extract_client_consumers(&registry);
        assert_eq!(consumers.len(), 1);
    }

    #[test]
    fn extract_gateways_preserves_registry_order() {
        struct Second;
        impl Gateway for Second {
            fn gateway_name(&self) -> &'static str {
                "Second"
            }
            fn handler_specs(self: Arc<Self>) -> Vec<HandlerSpec> {
                Vec::new()
            }
        }
        impl Registrant for Second {
            fn as_gateway(self: Arc<Self>) -> Option<Arc<dyn Gateway>> {
                Some(self)
            }
        }

        let registry = InstanceRegistry::new();
        registry.register(Arc::new(Probe));
        registry.register(Arc::new(Second));

        let gateways = MetadataExplorer::extract_gateways(&registry);
        let names: Vec<_> = gateways.iter().map(|g| g.gateway_name()).collect();
        assert_eq!(names, vec!["Probe", "Second"]);
    }
}
