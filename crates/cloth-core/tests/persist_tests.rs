use cloth_core::persist;
use cloth_core::{ClothError, ClothSimulator, Constraint, SimulationConfig, SimulationState};
use glam::Vec3;
use tempdir::TempDir;

const DT: f32 = 1.0 / 60.0;

/// A hanging cloth that has been stepped a few frames and edited.
fn stepped_simulator() -> ClothSimulator {
    let mut sim = ClothSimulator::with_grid(5, 4, 0.2).unwrap();
    for x in 0..5 {
        sim.set_pinned(x, 0, true).unwrap();
    }
    sim.add_constraint(Constraint::volume(6, 12, 0.04, 0.8)).unwrap();
    sim.start().unwrap();
    sim.apply_impulse(2, 3, Vec3::new(0.0, 0.0, 30.0)).unwrap();
    for _ in 0..15 {
        sim.update(DT).unwrap();
    }
    sim
}

#[test]
fn test_save_load_round_trip() {
    let dir = TempDir::new("cloth").unwrap();
    let path = dir.path().join("cloth.bin");
    let original = stepped_simulator();
    original.save(&path).unwrap();

    let mut restored = ClothSimulator::new();
    restored.load(&path).unwrap();
    assert_eq!(restored.state(), SimulationState::Initialized);
    assert_eq!(restored.particle_count(), original.particle_count());
    assert_eq!((restored.config().width, restored.config().height), (5, 4));
    assert_eq!(restored.config().spacing, 0.2);

    for y in 0..4 {
        for x in 0..5 {
            let a = original.particle(x, y).unwrap();
            let b = restored.particle(x, y).unwrap();
            assert!((a.position - b.position).length() <= f32::EPSILON, "({x}, {y}) position");
            assert!((a.previous_position - b.previous_position).length() <= f32::EPSILON);
            assert_eq!(a.pinned, b.pinned, "({x}, {y}) pinned flag");
            assert_eq!(a.inv_mass, b.inv_mass);
        }
    }

    assert_eq!(original.constraints().len(), restored.constraints().len());
    for (a, b) in original.constraints().iter().zip(restored.constraints()) {
        assert_eq!((a.a, a.b), (b.a, b.b));
        assert_eq!(a.kind, b.kind, "rest values must match exactly");
        assert_eq!(a.stiffness, b.stiffness);
        assert_eq!(a.damping, b.damping);
    }
}

#[test]
fn test_loaded_simulation_continues_identically() {
    let dir = TempDir::new("cloth").unwrap();
    let path = dir.path().join("cloth.bin");
    let mut original = stepped_simulator();
    original.save(&path).unwrap();

    let mut restored = ClothSimulator::with_grid(5, 4, 0.2).unwrap();
    restored.load(&path).unwrap();
    restored.start().unwrap();

    for _ in 0..10 {
        original.update(DT).unwrap();
        restored.update(DT).unwrap();
    }
    for (a, b) in original.positions().iter().zip(restored.positions()) {
        assert!((*a - *b).length() < 1e-4);
    }
}

#[test]
fn test_reset_after_load_restores_loaded_constraints() {
    let dir = TempDir::new("cloth").unwrap();
    let path = dir.path().join("cloth.bin");
    let original = stepped_simulator();
    original.save(&path).unwrap();

    let mut restored = ClothSimulator::new();
    restored.load(&path).unwrap();
    restored.remove_constraint(0).unwrap();
    restored.reset().unwrap();
    assert_eq!(restored.constraints(), original.constraints());
}

#[test]
fn test_corrupted_load_preserves_state() {
    let dir = TempDir::new("cloth").unwrap();
    let good = dir.path().join("good.bin");
    let truncated = dir.path().join("truncated.bin");
    let garbage = dir.path().join("garbage.bin");

    let mut sim = stepped_simulator();
    sim.save(&good).unwrap();
    let bytes = std::fs::read(&good).unwrap();
    std::fs::write(&truncated, &bytes[..bytes.len() - 7]).unwrap();
    std::fs::write(&garbage, b"definitely not a cloth").unwrap();

    sim.update(DT).unwrap();
    let positions = sim.positions().to_vec();
    let constraints = sim.constraints().to_vec();
    let config = sim.config().clone();

    for path in [&truncated, &garbage] {
        let err = sim.load(path).unwrap_err();
        assert!(matches!(err, ClothError::Format(_)), "expected a format error, got {err}");
        assert_eq!(sim.positions(), &positions[..]);
        assert_eq!(sim.constraints(), &constraints[..]);
        assert_eq!(sim.config(), &config);
        assert_eq!(sim.state(), SimulationState::Running);
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new("cloth").unwrap();
    let mut sim = ClothSimulator::new();
    let err = sim.load(dir.path().join("nope.bin")).unwrap_err();
    assert!(matches!(err, ClothError::Io(_)));
    assert_eq!(sim.state(), SimulationState::Uninitialized);
}

#[test]
fn test_pinned_record_with_mass_is_normalized() {
    // A pinned flag always wins over a stored inverse mass.
    let config = SimulationConfig::with_grid(2, 2, 1.0);
    let mut particles = cloth_core::particle::ParticleSet::grid(2, 2, 1.0, 1.0);
    let constraints = cloth_core::constraints::grid_constraints(&particles, &config);
    particles.pinned[0] = true;
    let snapshot = persist::decode(&persist::encode(&particles, &constraints)).unwrap();
    assert_eq!(snapshot.particles.inv_mass[0], 0.0);
    assert_eq!(snapshot.constraints, constraints);
}

#[test]
fn test_save_before_initialize_fails() {
    let dir = TempDir::new("cloth").unwrap();
    let sim = ClothSimulator::new();
    assert!(matches!(
        sim.save(dir.path().join("empty.bin")),
        Err(ClothError::InvalidState { .. })
    ));
}

#[test]
fn test_load_after_shutdown_fails() {
    let dir = TempDir::new("cloth").unwrap();
    let path = dir.path().join("cloth.bin");
    stepped_simulator().save(&path).unwrap();

    let mut sim = ClothSimulator::new();
    sim.shutdown();
    assert!(matches!(sim.load(&path), Err(ClothError::InvalidState { .. })));
}
