use cloth_core::math::*;
use cloth_core::WindField;
use glam::Vec3;

#[test]
fn test_hash11_range() {
    for i in -1000..1000 {
        let h = hash11(i as f32 * 0.1);
        assert!((0.0..1.0).contains(&h), "hash11({}) = {} out of range", i as f32 * 0.1, h);
    }
}

#[test]
fn test_smoothstep_edges() {
    assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
    assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
    assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
}

#[test]
fn test_signed_noise_range() {
    for i in 0..5000 {
        let n = signed_noise(i as f32 * 0.013 - 30.0);
        assert!((-1.0..=1.0).contains(&n), "signed_noise out of range: {n}");
    }
}

#[test]
fn test_wind_force_bounded() {
    let wind = WindField::new(Vec3::new(3.0, 0.0, 4.0), 2.0, 0.5, 3.0);
    // |steady| = strength, |gust| <= strength * turbulence * sqrt(3)
    let bound = 2.0 + 2.0 * 0.5 * 3.0_f32.sqrt() + 1e-4;
    for i in 0..500 {
        let t = i as f32 * 0.02;
        let p = Vec3::new(t.sin(), -t, t.cos());
        let f = wind.force_at(p, t);
        assert!(f.is_finite());
        assert!(f.length() <= bound, "wind force {f} exceeds {bound}");
    }
}

#[test]
fn test_wind_force_continuous_in_time() {
    let wind = WindField::new(Vec3::X, 5.0, 1.0, 4.0);
    let p = Vec3::new(0.3, -0.7, 0.0);
    let dt = 1e-4;
    let mut prev = wind.force_at(p, 0.0);
    for i in 1..20_000 {
        let f = wind.force_at(p, i as f32 * dt);
        assert!((f - prev).length() < 0.05, "wind jumped at t = {}", i as f32 * dt);
        prev = f;
    }
}
