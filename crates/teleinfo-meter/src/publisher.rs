use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use teleinfo_registry::{FieldValue, Label, SharedRegistry};

use crate::config::DEFAULT_PUBLISH_INTERVAL;
use crate::error::PublishError;
use crate::switch::EnableSwitch;

/// One published value, scaled for display.
///
/// Energy index counters (BASE, HCHC, HCHP, EJPHN, EJPHPM) are published in
/// kWh; the registry keeps them in Wh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub label: Label,
    pub value: FieldValue,
}

impl Reading {
    pub fn from_field(label: Label, raw: FieldValue) -> Self {
        let value = match (raw, label.publish_divisor()) {
            (FieldValue::Numeric(v), Some(divisor)) => FieldValue::Numeric(v / f64::from(divisor)),
            (other, _) => other,
        };
        Self { label, value }
    }
}

/// Destination for published readings.
pub trait Sink {
    fn publish(&mut self, reading: &Reading) -> Result<(), PublishError>;
}

impl<F> Sink for F
where
    F: FnMut(&Reading) -> Result<(), PublishError>,
{
    fn publish(&mut self, reading: &Reading) -> Result<(), PublishError> {
        self(reading)
    }
}

/// Drains changed fields from a shared registry into a [`Sink`].
#[derive(Debug, Clone)]
pub struct Publisher {
    registry: SharedRegistry,
    switch: EnableSwitch,
    interval: Duration,
    last: Option<Instant>,
}

impl Publisher {
    pub fn new(registry: SharedRegistry, switch: EnableSwitch) -> Self {
        Self {
            registry,
            switch,
            interval: DEFAULT_PUBLISH_INTERVAL,
            last: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Forward every changed field to `sink`, returning how many were sent.
    ///
    /// Nothing is drained while the switch is off. If the sink fails, the
    /// readings it did not accept stay flagged for the next call.
    pub fn publish<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<usize, PublishError> {
        if !self.switch.is_enabled() {
            return Ok(0);
        }

        let changed = self.registry.drain_changed();
        for (sent, (label, raw)) in changed.iter().enumerate() {
            let reading = Reading::from_field(*label, raw.clone());
            info!(label = %reading.label, value = %reading.value, "{} update", reading.label);

            if let Err(err) = sink.publish(&reading) {
                warn!(label = %reading.label, error = %err, "publish failed");
                self.registry.with(|registry| {
                    for (label, _) in &changed[sent..] {
                        registry.mark_dirty(*label);
                    }
                });
                return Err(err);
            }
        }
        Ok(changed.len())
    }

    /// Publish if at least one interval elapsed since the last publication.
    ///
    /// The first call always publishes. Returns `None` when not due.
    pub fn publish_due<S: Sink + ?Sized>(
        &mut self,
        now: Instant,
        sink: &mut S,
    ) -> Result<Option<usize>, PublishError> {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.interval {
                return Ok(None);
            }
        }
        self.last = Some(now);
        self.publish(sink).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(out: &mut Vec<Reading>) -> impl FnMut(&Reading) -> Result<(), PublishError> + '_ {
        move |reading| {
            out.push(reading.clone());
            Ok(())
        }
    }

    #[test]
    fn index_counters_are_published_in_kwh() {
        let registry = SharedRegistry::new();
        registry.apply("BASE", "012345678");
        registry.apply("IINST", "23");

        let mut publisher = Publisher::new(registry, EnableSwitch::new(true));
        let mut out = Vec::new();
        assert_eq!(publisher.publish(&mut collect(&mut out)).unwrap(), 2);

        assert_eq!(
            out,
            vec![
                Reading {
                    label: Label::Iinst,
                    value: FieldValue::Numeric(23.0)
                },
                Reading {
                    label: Label::Base,
                    value: FieldValue::Numeric(12_345.678)
                },
            ]
        );
    }

    #[test]
    fn text_fields_pass_through() {
        let reading = Reading::from_field(Label::Ptec, FieldValue::Text("HP..".into()));
        assert_eq!(reading.value, FieldValue::Text("HP..".into()));
    }

    #[test]
    fn disabled_publisher_keeps_fields_dirty() {
        let registry = SharedRegistry::new();
        registry.apply("PAPP", "01250");
        let switch = EnableSwitch::new(false);
        let mut publisher = Publisher::new(registry.clone(), switch.clone());

        let mut out = Vec::new();
        assert_eq!(publisher.publish(&mut collect(&mut out)).unwrap(), 0);
        assert!(out.is_empty());

        switch.set(true);
        assert_eq!(publisher.publish(&mut collect(&mut out)).unwrap(), 1);
        assert!(registry.drain_changed().is_empty());
    }

    #[test]
    fn failed_readings_are_retried() {
        let registry = SharedRegistry::new();
        registry.apply("ISOUSC", "30");
        registry.apply("IINST", "12");
        registry.apply("IMAX", "090");
        let mut publisher = Publisher::new(registry.clone(), EnableSwitch::new(true));

        let mut accepted = Vec::new();
        let mut flaky = |reading: &Reading| {
            if reading.label == Label::Iinst {
                return Err(PublishError::Rejected("busy".into()));
            }
            accepted.push(reading.label);
            Ok(())
        };
        assert!(matches!(
            publisher.publish(&mut flaky),
            Err(PublishError::Rejected(_))
        ));
        assert_eq!(accepted, vec![Label::Isousc]);

        let labels: Vec<Label> = registry.drain_changed().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec![Label::Iinst, Label::Imax]);
    }

    #[test]
    fn publish_due_respects_interval() {
        let registry = SharedRegistry::new();
        let mut publisher = Publisher::new(registry.clone(), EnableSwitch::new(true))
            .with_interval(Duration::from_secs(10));
        let start = Instant::now();
        let mut out = Vec::new();

        registry.apply("IINST", "1");
        assert_eq!(
            publisher.publish_due(start, &mut collect(&mut out)).unwrap(),
            Some(1)
        );

        registry.apply("IINST", "2");
        assert_eq!(
            publisher
                .publish_due(start + Duration::from_secs(5), &mut collect(&mut out))
                .unwrap(),
            None
        );
        assert_eq!(
            publisher
                .publish_due(start + Duration::from_secs(10), &mut collect(&mut out))
                .unwrap(),
            Some(1)
        );
        assert_eq!(out.len(), 2);
    }
}
