/// Hash float to [0,1] - port of GLSL hash11
pub fn hash11(p: f32) -> f32 {
    let mut p = (p * 0.1031).fract();
    p *= p + 33.33;
    p *= p + p;
    p.fract()
}

/// Smooth interpolation - port of GLSL smoothstep
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// 1D value noise in [0,1].
///
/// Hashed lattice values blended with a smoothstep fade, so the result is
/// continuous with a continuous first derivative.
pub fn value_noise(x: f32) -> f32 {
    let cell = x.floor();
    let t = x - cell;
    let a = hash11(cell);
    let b = hash11(cell + 1.0);
    a + (b - a) * smoothstep(0.0, 1.0, t)
}

/// [`value_noise`] remapped to [-1,1].
#[inline]
pub fn signed_noise(x: f32) -> f32 {
    value_noise(x) * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_noise_bounded() {
        for i in 0..2000 {
            let x = i as f32 * 0.037 - 20.0;
            let n = signed_noise(x);
            assert!((-1.0..=1.0).contains(&n), "noise({x}) = {n} out of range");
        }
    }

    #[test]
    fn test_value_noise_blends_with_smoothstep() {
        let (a, b) = (hash11(3.0), hash11(4.0));
        for t in [0.0, 0.25, 0.5, 0.9] {
            let expected = a + (b - a) * smoothstep(0.0, 1.0, t);
            assert!((value_noise(3.0 + t) - expected).abs() < 1e-6, "t = {t}");
        }
    }

    #[test]
    fn test_value_noise_continuous() {
        // Across lattice points the value must not jump.
        for cell in -5..5 {
            let x = cell as f32;
            let below = value_noise(x - 1e-4);
            let above = value_noise(x + 1e-4);
            assert!((below - above).abs() < 1e-3, "jump at {x}: {below} vs {above}");
        }
    }
}
