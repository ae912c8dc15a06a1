//! Default serde discovery
//!
//! Runs the whole pass: walk → classify → resolve → emit → register.

use crate::channel::{ChannelWalker, ConnectorRouter};
use crate::config::{ConfigSource, DiscoveryConfig};
use crate::emitter::{DefaultEmitter, EffectiveConfig};
use crate::index::TypeIndex;
use crate::reflection;
use crate::resolver::SerdeResolver;
use crate::shape::{self, ClassifiedPoint};
use crate::types::{ConfigDefault, InjectionPoint, PayloadRegistration, SerdeAssignment};
use serde::Serialize;
use tracing::{debug, info, trace};

/// Everything one discovery run produces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Generated `mp.messaging.*` defaults, in emission order
    pub defaults: Vec<ConfigDefault>,
    /// Payload classes needing reflective access
    pub payload_registrations: Vec<PayloadRegistration>,
    /// Application serde classes needing reflective instantiation
    pub serde_registrations: Vec<String>,
}

impl DiscoveryReport {
    pub fn default_value(&self, key: &str) -> Option<&str> {
        self.defaults
            .iter()
            .find(|d| d.key == key)
            .map(|d| d.value.as_str())
    }

    /// Defaults rendered as `.properties` lines
    pub fn to_properties(&self) -> String {
        self.defaults
            .iter()
            .map(|d| format!("{}\n", d))
            .collect()
    }
}

/// The discovery pass over one index and configuration snapshot
pub struct DefaultSerdeDiscovery<'a, I: TypeIndex + ?Sized> {
    index: &'a I,
    source: &'a dyn ConfigSource,
    config: DiscoveryConfig,
}

impl<'a, I: TypeIndex + ?Sized> DefaultSerdeDiscovery<'a, I> {
    /// The build-time switches are overlaid from `source`
    pub fn new(index: &'a I, source: &'a dyn ConfigSource) -> Self {
        Self::with_config(index, source, DiscoveryConfig::default())
    }

    pub fn with_config(index: &'a I, source: &'a dyn ConfigSource, config: DiscoveryConfig) -> Self {
        Self {
            index,
            source,
            config: config.overlay(source),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Injection points routed through the Kafka connector, with their shapes
    pub fn classified_points(&self) -> Vec<ClassifiedPoint> {
        let points = ChannelWalker::new(self.index).injection_points();
        let router = ConnectorRouter::new(&self.config, self.source, &points);

        points
            .iter()
            .filter(|point| {
                let kafka = router.routes_to_kafka(point.direction, &point.channel);
                if !kafka {
                    trace!("Channel '{}' ({}) is not a Kafka channel", point.channel, point.direction);
                }
                kafka
            })
            .filter_map(|point| self.classify(point))
            .collect()
    }

    fn classify(&self, point: &InjectionPoint) -> Option<ClassifiedPoint> {
        let signature = point.signature.as_ref()?;
        match shape::classify(signature, point.direction, self.config.max_wrapper_depth) {
            Some(shape) => Some(ClassifiedPoint {
                point: point.clone(),
                shape,
            }),
            None => {
                debug!(
                    "No payload type found for channel '{}' on {} ('{}')",
                    point.channel, point.site, signature
                );
                None
            }
        }
    }

    pub fn run(&self) -> DiscoveryReport {
        let classified = self.classified_points();
        let mut emitter = DefaultEmitter::new(self.source);

        if self.config.enabled {
            let resolver = SerdeResolver::new(self.index);
            for ClassifiedPoint { point, shape } in &classified {
                let role = point.direction.role();
                for (slot, payload) in shape.slots() {
                    let resolved = resolver.resolve(payload, role);
                    let Some(serde_class) = resolved.serde_class(role) else {
                        debug!("No serde found for '{}' on channel '{}'", payload, point.channel);
                        continue;
                    };
                    let assignment = SerdeAssignment {
                        channel: point.channel.clone(),
                        direction: point.direction,
                        slot,
                        serde_class: serde_class.to_string(),
                    };
                    emitter.offer(&assignment, resolved.uses_specific_avro_reader(role));
                }
            }
        } else {
            debug!("Serde autodetection is disabled");
        }

        let defaults = emitter.into_defaults();
        let effective = EffectiveConfig::new(self.source, &defaults);
        let payload_registrations =
            reflection::payload_registrations(self.index, &effective, &classified);
        let serde_registrations = reflection::serde_registrations(self.index);

        info!(
            "Serde discovery: {} Kafka injection point(s), {} default(s), {} payload registration(s), {} serde class(es)",
            classified.len(),
            defaults.len(),
            payload_registrations.len(),
            serde_registrations.len()
        );

        DiscoveryReport {
            defaults,
            payload_registrations,
            serde_registrations,
        }
    }
}
