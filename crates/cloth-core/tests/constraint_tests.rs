use cloth_core::constraints::{color_constraints, grid_constraints, volume, ConstraintSet};
use cloth_core::particle::ParticleSet;
use cloth_core::{ClothSimulator, Constraint, SimulationConfig};
use glam::Vec3;
use test_case::test_case;

/// Two free particles one unit apart, joined only by `constraint`.
fn pair_simulator(constraint: Constraint) -> ClothSimulator {
    let config = SimulationConfig {
        gravity: Vec3::ZERO,
        bending: false,
        substeps: 1,
        solver_iterations: 20,
        ..SimulationConfig::with_grid(2, 1, 1.0)
    };
    let mut sim = ClothSimulator::new();
    sim.initialize(config).unwrap();
    sim.remove_constraint(0).unwrap();
    sim.add_constraint(constraint).unwrap();
    sim.start().unwrap();
    sim
}

#[test_case(0.25 ; "compressed to a quarter")]
#[test_case(0.5 ; "compressed to half")]
#[test_case(2.5 ; "stretched")]
#[test_case(4.0 ; "stretched four times")]
fn test_single_distance_converges_in_one_step(rest: f32) {
    let mut sim = pair_simulator(Constraint::distance(0, 1, rest, 0.9));
    sim.update(1.0 / 60.0).unwrap();

    let a = sim.particle(0, 0).unwrap().position;
    let b = sim.particle(1, 0).unwrap().position;
    let len = (b - a).length();
    assert!(
        (len - rest).abs() <= 0.01 * rest,
        "distance {len} not within 1% of rest length {rest}"
    );
}

#[test]
fn test_pinned_endpoint_does_not_move() {
    let mut sim = pair_simulator(Constraint::distance(0, 1, 3.0, 1.0));
    sim.set_pinned(0, 0, true).unwrap();
    sim.update(1.0 / 60.0).unwrap();

    assert_eq!(sim.particle(0, 0).unwrap().position, Vec3::ZERO);
    let b = sim.particle(1, 0).unwrap().position;
    assert!((b.x - 3.0).abs() < 1e-3, "free end should take the full correction, got {b}");
}

#[test]
fn test_heavier_particle_moves_less() {
    let mut particles = ParticleSet::grid(2, 1, 1.0, 1.0);
    particles.mass[0] = 4.0;
    particles.inv_mass[0] = 0.25;
    let mut set = ConstraintSet::new(vec![Constraint::distance(0, 1, 2.0, 1.0)]);
    set.solve(&mut particles, 1, false);

    let moved_a = particles.position[0].length();
    let moved_b = (particles.position[1] - Vec3::X).length();
    assert!((moved_a + moved_b - 1.0).abs() < 1e-5);
    assert!((moved_b / moved_a - 4.0).abs() < 1e-3, "split should follow inverse mass");
}

#[test]
fn test_damping_does_not_move_positions() {
    let mut particles = ParticleSet::grid(2, 1, 1.0, 1.0);
    particles.previous[1] = Vec3::new(0.8, 0.0, 0.0);
    let before = particles.position.clone();
    let set = ConstraintSet::new(vec![Constraint::distance(0, 1, 1.0, 1.0).with_damping(0.5)]);
    set.apply_damping(&mut particles);

    assert_eq!(particles.position, before);
    let relative = (particles.position[1] - particles.previous[1]) - (particles.position[0] - particles.previous[0]);
    assert!((relative.x - 0.1).abs() < 1e-5, "half the axial velocity should remain, got {relative}");
}

#[test]
fn test_bends_run_after_distances() {
    // A distance and a bend that disagree about the same pair: the bend,
    // projected last, wins with full stiffness.
    let mut particles = ParticleSet::grid(2, 1, 1.0, 1.0);
    let mut set = ConstraintSet::new(vec![
        Constraint::bend(0, 1, 2.0, 1.0),
        Constraint::distance(0, 1, 1.5, 1.0),
    ]);
    set.solve(&mut particles, 1, false);
    let len = (particles.position[1] - particles.position[0]).length();
    assert!((len - 2.0).abs() < 1e-5, "bend pass should run last, got {len}");
}

#[test]
fn test_volume_constraint_restores_area() {
    let mut particles = ParticleSet::grid(2, 2, 1.0, 1.0);
    for p in particles.position.iter_mut() {
        *p *= 0.5;
    }
    let mut set = ConstraintSet::new(vec![Constraint::volume(0, 3, 1.0, 1.0)]);
    set.solve(&mut particles, 1, false);
    assert!((volume::current_area(&particles, 0, 3) - 1.0).abs() < 1e-4);
}

#[test]
fn test_coloring_separates_shared_particles() {
    let particles = ParticleSet::grid(6, 5, 1.0, 1.0);
    let constraints = grid_constraints(&particles, &SimulationConfig::with_grid(6, 5, 1.0));
    let batches = color_constraints(&constraints, &particles);

    let mut seen_total = 0;
    for batch in &batches {
        let mut touched = vec![false; particles.count];
        for &i in batch {
            for p in [constraints[i].a as usize, constraints[i].b as usize] {
                assert!(!touched[p], "batch touches particle {p} twice");
                touched[p] = true;
            }
        }
        seen_total += batch.len();
    }
    assert_eq!(seen_total, constraints.len(), "every constraint colored exactly once");
}

#[test]
fn test_colored_and_sequential_agree_at_rest() {
    let config = SimulationConfig::with_grid(5, 5, 1.0);
    let mut a = ParticleSet::grid(5, 5, 1.0, 1.0);
    let mut b = a.clone();
    let mut seq = ConstraintSet::new(grid_constraints(&a, &config));
    let mut colored = seq.clone();
    seq.solve(&mut a, 10, false);
    colored.solve(&mut b, 10, true);
    for i in 0..a.count {
        assert!((a.position[i] - b.position[i]).length() < 1e-6);
    }
}

#[test]
fn test_tearing_removes_overstretched_links() {
    let config = SimulationConfig {
        tear_factor: Some(1.5),
        bending: false,
        stiffness: 0.2,
        solver_iterations: 2,
        ..SimulationConfig::with_grid(3, 3, 1.0)
    };
    let mut sim = ClothSimulator::new();
    sim.initialize(config).unwrap();
    for x in 0..3 {
        sim.set_pinned(x, 0, true).unwrap();
    }
    let before = sim.constraints().len();
    sim.start().unwrap();

    let mut torn = 0;
    for _ in 0..10 {
        sim.apply_impulse(1, 2, Vec3::new(0.0, -1.0e5, 0.0)).unwrap();
        torn += sim.update(1.0 / 60.0).unwrap().torn;
    }
    assert!(torn > 0, "a huge pull should tear the cloth");
    assert_eq!(sim.constraints().len(), before - torn as usize);

    sim.reset().unwrap();
    assert_eq!(sim.constraints().len(), before, "reset restores torn constraints");
}
