//! # Sync Cycle
//!
//! One cycle:
//!
//! ```text
//! FrameSource::read_frame ─▶ empty? ── yes ─▶ NoUpdate
//!          │ no
//!          ▼
//! GeometryBufferRebuilder::rebuild(target)
//!          │
//!          ├── None ───────────────▶ NoVertexAttribute
//!          ├── Some(empty) ────────▶ EmptySnapshot
//!          └── Some(snapshot) ─────▶ Notifier::notify ─▶ Sent / Dropped
//! ```
//!
//! Nothing in a cycle is fatal; the outcome says what happened.

use meshrelay_core::{GeometryBufferRebuilder, GeometryTarget, RebuildReport};
use meshrelay_ipc::{FrameSource, RegionFrame};
use meshrelay_networking::Notifier;
use meshrelay_shared::SNAPSHOT_VALUES_PER_TRIANGLE;

use crate::poll::PollLoop;

/// What one cycle did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The region was missing or empty; nothing rebuilt, nothing sent.
    NoUpdate,
    /// The target had no vertex-position attribute; nothing sent.
    NoVertexAttribute,
    /// Buffers rebuilt, but no triangle produced positions; nothing sent.
    EmptySnapshot,
    /// Snapshot handed to the notifier.
    Sent {
        /// Triangles in the snapshot.
        triangles: usize,
    },
    /// The notifier refused the snapshot (logged).
    Dropped {
        /// Triangles in the snapshot.
        triangles: usize,
    },
}

/// Cycle counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Cycles run.
    pub cycles: u64,
    /// Cycles that found no update.
    pub skipped: u64,
    /// Cycles that rebuilt the target.
    pub rebuilds: u64,
    /// Snapshots accepted by the notifier.
    pub snapshots_sent: u64,
    /// Snapshots refused by the notifier.
    pub snapshots_dropped: u64,
}

/// The host-side pipeline: region reader, rebuilder, target, notifier and
/// streaming timer, all driven from the host thread.
pub struct MeshRelay<S, N, T> {
    source: S,
    notifier: N,
    target: T,
    rebuilder: GeometryBufferRebuilder,
    poll: PollLoop,
    stats: RelayStats,
}

impl<S, N, T> MeshRelay<S, N, T>
where
    S: FrameSource,
    N: Notifier,
    T: GeometryTarget,
{
    /// Assembles a relay with a stopped 15 Hz poll loop.
    pub fn new(source: S, notifier: N, target: T) -> Self {
        Self::with_poll(source, notifier, target, PollLoop::default())
    }

    /// Assembles a relay with a custom poll loop.
    pub fn with_poll(source: S, notifier: N, target: T, poll: PollLoop) -> Self {
        Self {
            source,
            notifier,
            target,
            rebuilder: GeometryBufferRebuilder::new(),
            poll,
            stats: RelayStats::default(),
        }
    }

    /// Runs one cycle now (the manual trigger).
    pub fn sync_once(&mut self) -> CycleOutcome {
        let frame = self.source.read_frame();
        self.sync_frame(&frame)
    }

    /// Runs one cycle on a frame the caller already read.
    pub fn sync_frame(&mut self, frame: &RegionFrame) -> CycleOutcome {
        self.stats.cycles += 1;

        if frame.is_empty() {
            self.stats.skipped += 1;
            tracing::trace!("no update from producer");
            return CycleOutcome::NoUpdate;
        }

        let snapshot = self
            .rebuilder
            .rebuild(&mut self.target, &frame.cells, &frame.points);
        self.stats.rebuilds += 1;

        let Some(snapshot) = snapshot else {
            tracing::debug!("target has no vertex-position attribute");
            return CycleOutcome::NoVertexAttribute;
        };
        if snapshot.is_empty() {
            return CycleOutcome::EmptySnapshot;
        }

        let triangles = snapshot.len() / SNAPSHOT_VALUES_PER_TRIANGLE;
        match self.notifier.notify(snapshot) {
            Ok(()) => {
                self.stats.snapshots_sent += 1;
                CycleOutcome::Sent { triangles }
            }
            Err(e) => {
                self.stats.snapshots_dropped += 1;
                tracing::warn!("snapshot not sent: {e}");
                CycleOutcome::Dropped { triangles }
            }
        }
    }

    /// Flips periodic streaming. Returns the new running state.
    pub fn toggle_streaming(&mut self) -> bool {
        self.poll.toggle()
    }

    /// Runs a cycle if the poll loop is due; call from the host loop.
    pub fn pump(&mut self) -> Option<CycleOutcome> {
        self.poll.should_fire().then(|| self.sync_once())
    }

    /// Whether periodic streaming is on.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.poll.is_running()
    }

    /// Cycle counters.
    #[must_use]
    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Report of the last rebuild.
    #[must_use]
    pub fn last_rebuild(&self) -> RebuildReport {
        self.rebuilder.last_report()
    }

    /// The streaming timer.
    #[must_use]
    pub fn poll(&self) -> &PollLoop {
        &self.poll
    }

    /// The geometry target.
    #[must_use]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// The geometry target, mutably (for host-side resizing).
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// The frame source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The notifier.
    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Consumes the relay, returning its parts. Dropping them detaches the
    /// region and closes the notifier.
    pub fn into_parts(self) -> (S, N, T) {
        (self.source, self.notifier, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshrelay_core::{AttributeRole, BufferAttribute, MeshBuffers};
    use meshrelay_networking::{NotifierError, NotifierResult};
    use meshrelay_shared::PositionSnapshot;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct QueuedFrames(VecDeque<RegionFrame>);

    impl FrameSource for QueuedFrames {
        fn read_frame(&mut self) -> RegionFrame {
            self.0.pop_front().unwrap_or_default()
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: Vec<PositionSnapshot>,
        refuse: bool,
    }

    impl Notifier for Recorder {
        fn notify(&mut self, snapshot: PositionSnapshot) -> NotifierResult<()> {
            if self.refuse {
                return Err(NotifierError::Disconnected);
            }
            self.sent.push(snapshot);
            Ok(())
        }
    }

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn triangle_frame() -> RegionFrame {
        RegionFrame {
            cells: floats(&[0.0, 1.0, 2.0]),
            points: floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
        }
    }

    fn relay_with(frames: Vec<RegionFrame>) -> MeshRelay<QueuedFrames, Recorder, MeshBuffers> {
        MeshRelay::new(
            QueuedFrames(frames.into()),
            Recorder::default(),
            MeshBuffers::with_capacity(3, 1).unwrap(),
        )
    }

    #[test]
    fn test_cycle_sends_snapshot() {
        let mut relay = relay_with(vec![triangle_frame()]);
        assert_eq!(relay.sync_once(), CycleOutcome::Sent { triangles: 1 });
        assert_eq!(relay.notifier().sent, vec![vec![0, 0, 0, 1000, 0, 0, 0, 1000, 0]]);
        assert_eq!(relay.target().triangles(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_outcome_counts_snapshot_triangles() {
        let frame = RegionFrame {
            cells: floats(&[0.0, 1.0, 2.0, 2.0, 1.0, 3.0]),
            points: floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0]),
        };
        let mut relay = MeshRelay::new(
            QueuedFrames(vec![frame].into()),
            Recorder::default(),
            MeshBuffers::growable(),
        );
        assert_eq!(relay.sync_once(), CycleOutcome::Sent { triangles: 2 });
        assert_eq!(relay.notifier().sent[0].len(), 2 * SNAPSHOT_VALUES_PER_TRIANGLE);
    }

    #[test]
    fn test_missing_region_is_noop() {
        let mut relay = relay_with(Vec::new());
        let before = relay.target().clone();

        assert_eq!(relay.sync_once(), CycleOutcome::NoUpdate);
        assert!(relay.notifier().sent.is_empty());
        assert_eq!(relay.stats().skipped, 1);
        assert_eq!(relay.stats().rebuilds, 0);
        assert_eq!(
            relay.target().attribute(AttributeRole::VertexPosition).unwrap().generation(),
            before.attribute(AttributeRole::VertexPosition).unwrap().generation()
        );
    }

    #[test]
    fn test_points_only_frame_rebuilds_without_sending() {
        let frame = RegionFrame {
            cells: Vec::new(),
            points: floats(&[1.0, 2.0, 3.0]),
        };
        let mut relay = relay_with(vec![frame]);
        assert_eq!(relay.sync_once(), CycleOutcome::EmptySnapshot);
        assert!(relay.notifier().sent.is_empty());
        assert_eq!(relay.target().vertex_records()[0].position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_no_vertex_attribute() {
        let mut mesh = MeshBuffers::new();
        mesh.push(BufferAttribute::indices(1).unwrap());
        let mut relay = MeshRelay::new(
            QueuedFrames(vec![triangle_frame()].into()),
            Recorder::default(),
            mesh,
        );
        assert_eq!(relay.sync_once(), CycleOutcome::NoVertexAttribute);
        assert!(relay.notifier().sent.is_empty());
    }

    #[test]
    fn test_refused_snapshot_is_counted_not_fatal() {
        let mut relay = MeshRelay::new(
            QueuedFrames(vec![triangle_frame(), triangle_frame()].into()),
            Recorder {
                refuse: true,
                ..Recorder::default()
            },
            MeshBuffers::with_capacity(3, 1).unwrap(),
        );
        assert_eq!(relay.sync_once(), CycleOutcome::Dropped { triangles: 1 });
        assert_eq!(relay.sync_once(), CycleOutcome::Dropped { triangles: 1 });
        assert_eq!(relay.stats().snapshots_dropped, 2);
    }

    #[test]
    fn test_pump_only_fires_while_streaming() {
        let poll = PollLoop::new(std::time::Duration::from_millis(1));
        let mut relay = MeshRelay::with_poll(
            QueuedFrames(vec![triangle_frame()].into()),
            Recorder::default(),
            MeshBuffers::with_capacity(3, 1).unwrap(),
            poll,
        );

        std::thread::sleep(std::time::Duration::from_millis(3));
        assert_eq!(relay.pump(), None);

        assert!(relay.toggle_streaming());
        std::thread::sleep(std::time::Duration::from_millis(3));
        assert_eq!(relay.pump(), Some(CycleOutcome::Sent { triangles: 1 }));

        assert!(!relay.toggle_streaming());
        std::thread::sleep(std::time::Duration::from_millis(3));
        assert_eq!(relay.pump(), None);
        assert_eq!(relay.stats().cycles, 1);
    }
}
