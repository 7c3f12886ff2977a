use serde::Serialize;
use tracing::{debug, trace, warn};

use teleinfo_frame::{checksum, decode, CompletedFrame, FrameAccumulator, FrameError};
use teleinfo_registry::{FieldValue, Label, SharedRegistry, UpdateOutcome};
use teleinfo_transport::ByteSource;

use crate::config::MeterConfig;
use crate::error::Result;
use crate::publisher::Publisher;
use crate::switch::EnableSwitch;

/// What became of one completed frame.
#[derive(Debug)]
pub enum FrameEvent {
    /// The group passed its checksum and was offered to the registry.
    Applied {
        label: String,
        value: String,
        outcome: UpdateOutcome,
    },
    /// The frame was malformed or failed its checksum.
    Dropped(FrameError),
}

impl FrameEvent {
    pub fn is_applied(&self) -> bool {
        matches!(self, FrameEvent::Applied { .. })
    }
}

/// Running counters for one meter session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// Completed frames handed to the decoder.
    pub frames: u64,
    /// Groups that changed a stored value.
    pub changed: u64,
    /// Groups that repeated a stored value.
    pub unchanged: u64,
    /// Groups whose label is not in the table.
    pub ignored: u64,
    /// Frames without a label/value structure.
    pub parse_errors: u64,
    /// Frames whose checksum did not match.
    pub checksum_errors: u64,
    /// Buffers discarded for exceeding the frame cap.
    pub overflows: u64,
}

/// Turns a byte stream into field updates.
///
/// The meter owns the frame accumulator and shares the field registry and
/// enable switch with any [`Publisher`] it hands out.
#[derive(Debug)]
pub struct Meter {
    accumulator: FrameAccumulator,
    registry: SharedRegistry,
    switch: EnableSwitch,
    publish_interval: std::time::Duration,
    was_enabled: bool,
    stats: DecodeStats,
}

impl Meter {
    pub fn new() -> Self {
        Self::with_config(MeterConfig::default())
    }

    pub fn with_config(config: MeterConfig) -> Self {
        Self {
            accumulator: FrameAccumulator::with_config(config.frame),
            registry: SharedRegistry::new(),
            switch: EnableSwitch::new(config.start_enabled),
            publish_interval: config.publish_interval,
            was_enabled: config.start_enabled,
            stats: DecodeStats::default(),
        }
    }

    /// Use an existing registry instead of a fresh one.
    pub fn with_registry(mut self, registry: SharedRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Use an existing switch instead of a fresh one.
    pub fn with_switch(mut self, switch: EnableSwitch) -> Self {
        self.was_enabled = switch.is_enabled();
        self.switch = switch;
        self
    }

    /// Feed one byte.
    ///
    /// Returns an event when the byte completed a frame. Does nothing while
    /// the switch is off.
    pub fn feed(&mut self, byte: u8) -> Option<FrameEvent> {
        if !self.gate() {
            return None;
        }
        let frame = self.accumulator.feed(byte)?;
        Some(self.process(&frame))
    }

    /// Feed a run of bytes, returning the event of every completed frame.
    pub fn feed_slice(&mut self, bytes: &[u8]) -> Vec<FrameEvent> {
        bytes.iter().filter_map(|&b| self.feed(b)).collect()
    }

    /// Run one feed cycle over the bytes `source` reports available on entry.
    ///
    /// Bytes arriving during the cycle are left for the next call, so a meter
    /// that never stops transmitting still hands control back. Returns the
    /// number of frames completed. Reads nothing while the switch is off.
    pub fn poll<S: ByteSource>(&mut self, source: &mut S) -> Result<usize> {
        if !self.gate() {
            return Ok(0);
        }

        let mut frames = 0;
        for _ in 0..source.available()? {
            let byte = source.read()?;
            if self.feed(byte).is_some() {
                frames += 1;
            }
        }
        Ok(frames)
    }

    /// Decode, verify and apply one completed frame.
    pub fn process(&mut self, frame: &CompletedFrame) -> FrameEvent {
        self.stats.frames += 1;
        trace!(%frame, "frame received");

        let group = match decode(frame) {
            Ok(group) => group,
            Err(err) => {
                debug!(%frame, error = %err, "frame dropped");
                self.stats.parse_errors += 1;
                return FrameEvent::Dropped(err.into());
            }
        };

        if let Err(err) = checksum::verify(&group) {
            if let FrameError::ChecksumMismatch { received, computed } = err {
                warn!(%frame, received, computed, "checksum error");
            }
            self.stats.checksum_errors += 1;
            return FrameEvent::Dropped(err);
        }

        let outcome = self.registry.apply(&group.label, &group.value);
        match outcome {
            UpdateOutcome::Changed => self.stats.changed += 1,
            UpdateOutcome::Unchanged => self.stats.unchanged += 1,
            UpdateOutcome::Ignored => self.stats.ignored += 1,
        }

        FrameEvent::Applied {
            label: group.label,
            value: group.value,
            outcome,
        }
    }

    /// Every changed field since the last drain, in table order.
    pub fn drain_changed(&self) -> Vec<(Label, FieldValue)> {
        self.registry.drain_changed()
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn switch(&self) -> &EnableSwitch {
        &self.switch
    }

    pub fn is_enabled(&self) -> bool {
        self.switch.is_enabled()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.switch.set(enabled);
    }

    /// A publisher sharing this meter's registry and switch.
    pub fn publisher(&self) -> Publisher {
        Publisher::new(self.registry.clone(), self.switch.clone())
            .with_interval(self.publish_interval)
    }

    pub fn stats(&self) -> DecodeStats {
        DecodeStats {
            overflows: self.accumulator.overflow_count(),
            ..self.stats
        }
    }

    /// Bytes waiting for a frame terminator.
    pub fn pending(&self) -> usize {
        self.accumulator.len()
    }

    // A meter switched back on starts from an empty buffer.
    fn gate(&mut self) -> bool {
        let enabled = self.switch.is_enabled();
        if enabled && !self.was_enabled {
            self.accumulator.reset();
        }
        self.was_enabled = enabled;
        enabled
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read, Write};
    use std::sync::{Arc, Mutex};

    use bytes::BytesMut;
    use teleinfo_frame::{encode_group, ParseError};
    use teleinfo_transport::{MemorySource, StreamSource};

    use super::*;

    fn wire(groups: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (label, value) in groups {
            encode_group(label, value, &mut buf);
        }
        buf.to_vec()
    }

    #[test]
    fn single_group_is_reported_once() {
        let mut meter = Meter::new();
        let events = meter.feed_slice(b"\nIINST 23 ,\r");

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            FrameEvent::Applied { label, value, outcome: UpdateOutcome::Changed }
                if label == "IINST" && value == "23"
        ));
        assert_eq!(
            meter.drain_changed(),
            vec![(Label::Iinst, FieldValue::Numeric(23.0))]
        );
        assert!(meter.drain_changed().is_empty());
    }

    #[test]
    fn bad_checksum_leaves_registry_untouched() {
        let mut meter = Meter::new();
        let events = meter.feed_slice(b"\nADCO 031234567890 O\r");

        assert!(matches!(
            events[..],
            [FrameEvent::Dropped(FrameError::ChecksumMismatch {
                received: b'O',
                computed: b'G'
            })]
        ));
        assert!(meter.drain_changed().is_empty());
        assert_eq!(meter.stats().checksum_errors, 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn checksum_mismatch_is_logged_as_a_warning() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            Meter::new().feed_slice(b"\nADCO 031234567890 O\r");
        });

        let text = log.text();
        assert!(text.contains("WARN"), "log: {text}");
        assert!(text.contains("checksum error"), "log: {text}");
        assert!(text.contains("received=79"), "log: {text}");
        assert!(text.contains("computed=71"), "log: {text}");
    }

    #[test]
    fn frame_without_separator_is_dropped() {
        let mut meter = Meter::new();
        let events = meter.feed_slice(b"\nGARBAGE\r");

        assert!(matches!(
            events[..],
            [FrameEvent::Dropped(FrameError::Parse(ParseError::NoSeparator))]
        ));
        assert_eq!(meter.stats().parse_errors, 1);
    }

    #[test]
    fn a_full_cycle_of_groups() {
        let mut meter = Meter::new();
        let bytes = wire(&[
            ("ADCO", "031234567890"),
            ("OPTARIF", "BASE"),
            ("ISOUSC", "30"),
            ("BASE", "012345678"),
            ("PTEC", "TH.."),
            ("IINST", "024"),
            ("IMAX", "090"),
            ("PAPP", "01250"),
            ("ZZZZ", "12"),
        ]);
        let events = meter.feed_slice(&bytes);

        assert_eq!(events.len(), 9);
        assert!(events.iter().all(FrameEvent::is_applied));

        let labels: Vec<Label> = meter.drain_changed().into_iter().map(|(l, _)| l).collect();
        assert_eq!(
            labels,
            vec![
                Label::Adco,
                Label::Optarif,
                Label::Isousc,
                Label::Iinst,
                Label::Papp,
                Label::Base,
                Label::Ptec,
                Label::Imax,
            ]
        );

        let stats = meter.stats();
        assert_eq!(stats.frames, 9);
        assert_eq!(stats.changed, 8);
        assert_eq!(stats.ignored, 1);
    }

    #[test]
    fn repeated_cycle_reports_only_differences() {
        let mut meter = Meter::new();
        meter.feed_slice(&wire(&[("IINST", "023"), ("PAPP", "01250")]));
        meter.drain_changed();

        meter.feed_slice(&wire(&[("IINST", "024"), ("PAPP", "01250")]));
        assert_eq!(
            meter.drain_changed(),
            vec![(Label::Iinst, FieldValue::Numeric(24.0))]
        );
        assert_eq!(meter.stats().unchanged, 1);
    }

    #[test]
    fn disabled_meter_ignores_bytes() {
        let mut meter = Meter::with_config(MeterConfig {
            start_enabled: false,
            ..MeterConfig::default()
        });

        assert!(meter.feed_slice(b"\nIINST 23 ,\r").is_empty());
        assert_eq!(meter.pending(), 0);
        assert!(meter.drain_changed().is_empty());
        assert_eq!(meter.stats(), DecodeStats::default());
    }

    #[test]
    fn re_enabling_discards_a_half_frame() {
        let mut meter = Meter::new();
        meter.feed_slice(b"\nIINST 2");
        assert_eq!(meter.pending(), 7);

        meter.set_enabled(false);
        meter.feed_slice(b"3 ,\r");
        meter.set_enabled(true);

        // The tail alone is not a valid group.
        let events = meter.feed_slice(b"3 ,\r");
        assert!(matches!(events[..], [FrameEvent::Dropped(_)]));
        assert!(meter.drain_changed().is_empty());

        meter.feed_slice(b"\nIINST 23 ,\r");
        assert_eq!(
            meter.drain_changed(),
            vec![(Label::Iinst, FieldValue::Numeric(23.0))]
        );
    }

    #[test]
    fn overlong_frame_is_discarded_and_counted() {
        let mut meter = Meter::new();
        let mut noise = vec![b'A'; 51];
        noise.push(b'\r');

        assert!(meter.feed_slice(&noise).is_empty());
        assert_eq!(meter.stats().overflows, 1);

        meter.feed_slice(b"\nIINST 23 ,\r");
        assert_eq!(meter.drain_changed().len(), 1);
    }

    #[test]
    fn poll_reads_what_is_available() {
        let mut meter = Meter::new();
        let mut source = MemorySource::from(&b"\nIINST 23 ,\r\nPAPP 01"[..]);

        assert_eq!(meter.poll(&mut source).unwrap(), 1);
        assert!(source.is_empty());

        source.push(b"250 )\r");
        assert_eq!(meter.poll(&mut source).unwrap(), 1);
        assert_eq!(
            meter.drain_changed(),
            vec![
                (Label::Iinst, FieldValue::Numeric(23.0)),
                (Label::Papp, FieldValue::Numeric(1250.0)),
            ]
        );
    }

    // Emits eight bytes of an endless TIC cycle on every read.
    struct ContinuousLine {
        pos: usize,
        reads: usize,
    }

    impl Read for ContinuousLine {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            const CYCLE: &[u8] = b"\nIINST 23 ,\r\nPAPP 01250 )\r";
            self.reads += 1;
            assert!(self.reads < 10_000, "poll never returned");
            let n = buf.len().min(8);
            for slot in &mut buf[..n] {
                *slot = CYCLE[self.pos % CYCLE.len()];
                self.pos += 1;
            }
            Ok(n)
        }
    }

    #[test]
    fn poll_returns_on_a_continuous_stream() {
        let mut meter = Meter::new();
        let mut source = StreamSource::new(ContinuousLine { pos: 0, reads: 0 });

        let mut frames = 0;
        for _ in 0..10 {
            frames += meter.poll(&mut source).unwrap();
        }

        // One refill per cycle: 80 bytes, three full 26-byte cycles and "\nI".
        assert_eq!(source.get_ref().reads, 10);
        assert_eq!(frames, 6);
        assert_eq!(meter.pending(), 1);
        assert_eq!(
            meter.drain_changed(),
            vec![
                (Label::Iinst, FieldValue::Numeric(23.0)),
                (Label::Papp, FieldValue::Numeric(1250.0)),
            ]
        );
    }

    #[test]
    fn poll_while_disabled_leaves_source_alone() {
        let mut meter = Meter::new();
        meter.set_enabled(false);
        let mut source = MemorySource::from(&b"\nIINST 23 ,\r"[..]);

        assert_eq!(meter.poll(&mut source).unwrap(), 0);
        assert_eq!(source.len(), 12);
    }

    #[test]
    fn switch_toggled_from_another_handle() {
        let switch = EnableSwitch::new(true);
        let mut meter = Meter::new().with_switch(switch.clone());

        switch.set(false);
        assert!(meter.feed_slice(b"\nIINST 23 ,\r").is_empty());

        switch.set(true);
        assert_eq!(meter.feed_slice(b"\nIINST 23 ,\r").len(), 1);
    }

    #[test]
    fn stats_serialize_for_reporting() {
        let mut meter = Meter::new();
        meter.feed_slice(b"\nIINST 23 ,\r");

        let json = serde_json::to_value(meter.stats()).unwrap();
        assert_eq!(json["frames"], 1);
        assert_eq!(json["changed"], 1);
    }
}
