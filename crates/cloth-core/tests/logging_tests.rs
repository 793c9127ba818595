use std::sync::{Arc, Mutex};

use cloth_core::{ClothSimulator, CollisionPrimitive, SimulationConfig};
use glam::Vec3;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

const DT: f32 = 1.0 / 60.0;

/// Collects the rendered fields of every WARN event.
#[derive(Clone, Default)]
struct Warnings(Arc<Mutex<Vec<String>>>);

impl Warnings {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

struct Fields(String);

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.push_str(&format!("{}={:?} ", field.name(), value));
    }
}

impl<S: Subscriber> Layer<S> for Warnings {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            let mut fields = Fields(String::new());
            event.record(&mut fields);
            self.0.lock().unwrap().push(fields.0);
        }
    }
}

fn with_warnings(f: impl FnOnce(&Warnings)) {
    let warnings = Warnings::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());
    tracing::subscriber::with_default(subscriber, || f(&warnings));
}

/// Two free particles with no gravity, so nothing moves on its own.
fn still_pair(spacing: f32) -> ClothSimulator {
    let config = SimulationConfig {
        gravity: Vec3::ZERO,
        substeps: 2,
        ..SimulationConfig::with_grid(2, 1, spacing)
    };
    let mut sim = ClothSimulator::new();
    sim.initialize(config).unwrap();
    sim.start().unwrap();
    sim
}

#[test]
fn test_degenerate_constraint_is_logged() {
    with_warnings(|warnings| {
        // Particles this close make the structural link zero-length.
        let mut sim = still_pair(1e-7);
        let stats = sim.update(DT).unwrap();
        assert_eq!(stats.degenerate_skipped, 1);

        let logged = warnings.take();
        // Once per solve, and a solve runs per substep.
        assert_eq!(logged.len(), 2, "{logged:?}");
        for w in &logged {
            assert!(w.contains("degenerate constraint"), "{w}");
            assert!(w.contains("index=0"), "{w}");
            assert!(w.contains("Distance"), "{w}");
        }
    });
}

#[test]
fn test_healthy_cloth_logs_no_warnings() {
    with_warnings(|warnings| {
        let mut sim = still_pair(1.0);
        for _ in 0..5 {
            sim.update(DT).unwrap();
        }
        assert!(warnings.take().is_empty());
    });
}

#[test]
fn test_degenerate_primitive_warns_once_when_added() {
    with_warnings(|warnings| {
        let mut sim = still_pair(1.0);
        sim.add_collision_primitive(CollisionPrimitive::sphere(Vec3::ZERO, 0.0));
        assert_eq!(warnings.take().len(), 1);

        for _ in 0..10 {
            let stats = sim.update(DT).unwrap();
            assert_eq!(stats.degenerate_skipped, 1);
        }
        assert!(warnings.take().is_empty(), "stepping must not repeat the warning");
    });
}
