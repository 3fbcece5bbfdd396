//! Named easing formulas.
//!
//! Formulas follow the classic `(elapsed, start, delta, duration)` shape.
//! They are pure and stateless, so a single registry serves every actor and
//! property without synchronization. Unknown names fall back to `linear`.

use std::f64::consts::PI;

use hashbrown::HashMap;

pub type EasingFn = fn(f64, f64, f64, f64) -> f64;

pub struct EasingRegistry {
    table: HashMap<String, EasingFn>,
}

impl EasingRegistry {
    /// Registry pre-populated with the standard formula set.
    pub fn new() -> Self {
        let mut reg = Self {
            table: HashMap::new(),
        };
        for (name, f) in DEFAULTS {
            reg.register(name, *f);
        }
        reg
    }

    pub fn register(&mut self, name: &str, f: EasingFn) {
        self.table.insert(name.to_string(), f);
    }

    /// Look up a formula by name; unknown names resolve to `linear`.
    pub fn get(&self, name: &str) -> EasingFn {
        self.table.get(name).copied().unwrap_or(linear)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}

impl Default for EasingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

const DEFAULTS: &[(&str, EasingFn)] = &[
    ("linear", linear),
    ("easeInQuad", ease_in_quad),
    ("easeOutQuad", ease_out_quad),
    ("easeInOutQuad", ease_in_out_quad),
    ("easeInCubic", ease_in_cubic),
    ("easeOutCubic", ease_out_cubic),
    ("easeInOutCubic", ease_in_out_cubic),
    ("easeInQuart", ease_in_quart),
    ("easeOutQuart", ease_out_quart),
    ("easeInOutQuart", ease_in_out_quart),
    ("easeInQuint", ease_in_quint),
    ("easeOutQuint", ease_out_quint),
    ("easeInOutQuint", ease_in_out_quint),
    ("easeInSine", ease_in_sine),
    ("easeOutSine", ease_out_sine),
    ("easeInOutSine", ease_in_out_sine),
    ("easeInExpo", ease_in_expo),
    ("easeOutExpo", ease_out_expo),
    ("easeInOutExpo", ease_in_out_expo),
    ("easeInCirc", ease_in_circ),
    ("easeOutCirc", ease_out_circ),
    ("easeInOutCirc", ease_in_out_circ),
    ("easeInBack", ease_in_back),
    ("easeOutBack", ease_out_back),
    ("easeInElastic", ease_in_elastic),
    ("easeOutElastic", ease_out_elastic),
    ("easeInBounce", ease_in_bounce),
    ("easeOutBounce", ease_out_bounce),
];

pub fn linear(t: f64, b: f64, c: f64, d: f64) -> f64 {
    c * t / d + b
}

pub fn ease_in_quad(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / d;
    c * p * p + b
}

pub fn ease_out_quad(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / d;
    -c * p * (p - 2.0) + b
}

pub fn ease_in_out_quad(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / (d / 2.0);
    if p < 1.0 {
        c / 2.0 * p * p + b
    } else {
        let p = p - 1.0;
        -c / 2.0 * (p * (p - 2.0) - 1.0) + b
    }
}

pub fn ease_in_cubic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / d;
    c * p * p * p + b
}

pub fn ease_out_cubic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / d - 1.0;
    c * (p * p * p + 1.0) + b
}

pub fn ease_in_out_cubic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / (d / 2.0);
    if p < 1.0 {
        c / 2.0 * p * p * p + b
    } else {
        let p = p - 2.0;
        c / 2.0 * (p * p * p + 2.0) + b
    }
}

pub fn ease_in_quart(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / d;
    c * p * p * p * p + b
}

pub fn ease_out_quart(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / d - 1.0;
    -c * (p * p * p * p - 1.0) + b
}

pub fn ease_in_out_quart(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / (d / 2.0);
    if p < 1.0 {
        c / 2.0 * p * p * p * p + b
    } else {
        let p = p - 2.0;
        -c / 2.0 * (p * p * p * p - 2.0) + b
    }
}

pub fn ease_in_quint(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / d;
    c * p * p * p * p * p + b
}

pub fn ease_out_quint(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / d - 1.0;
    c * (p * p * p * p * p + 1.0) + b
}

pub fn ease_in_out_quint(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / (d / 2.0);
    if p < 1.0 {
        c / 2.0 * p * p * p * p * p + b
    } else {
        let p = p - 2.0;
        c / 2.0 * (p * p * p * p * p + 2.0) + b
    }
}

pub fn ease_in_sine(t: f64, b: f64, c: f64, d: f64) -> f64 {
    -c * (t / d * (PI / 2.0)).cos() + c + b
}

pub fn ease_out_sine(t: f64, b: f64, c: f64, d: f64) -> f64 {
    c * (t / d * (PI / 2.0)).sin() + b
}

pub fn ease_in_out_sine(t: f64, b: f64, c: f64, d: f64) -> f64 {
    -c / 2.0 * ((PI * t / d).cos() - 1.0) + b
}

pub fn ease_in_expo(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        b
    } else {
        c * 2f64.powf(10.0 * (t / d - 1.0)) + b
    }
}

pub fn ease_out_expo(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == d {
        b + c
    } else {
        c * (-(2f64.powf(-10.0 * t / d)) + 1.0) + b
    }
}

pub fn ease_in_out_expo(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        return b;
    }
    if t == d {
        return b + c;
    }
    let p = t / (d / 2.0);
    if p < 1.0 {
        c / 2.0 * 2f64.powf(10.0 * (p - 1.0)) + b
    } else {
        c / 2.0 * (-(2f64.powf(-10.0 * (p - 1.0))) + 2.0) + b
    }
}

pub fn ease_in_circ(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / d;
    -c * ((1.0 - p * p).sqrt() - 1.0) + b
}

pub fn ease_out_circ(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / d - 1.0;
    c * (1.0 - p * p).sqrt() + b
}

pub fn ease_in_out_circ(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let p = t / (d / 2.0);
    if p < 1.0 {
        -c / 2.0 * ((1.0 - p * p).sqrt() - 1.0) + b
    } else {
        let p = p - 2.0;
        c / 2.0 * ((1.0 - p * p).sqrt() + 1.0) + b
    }
}

pub fn ease_in_back(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let s = 1.70158;
    let p = t / d;
    c * p * p * ((s + 1.0) * p - s) + b
}

pub fn ease_out_back(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let s = 1.70158;
    let p = t / d - 1.0;
    c * (p * p * ((s + 1.0) * p + s) + 1.0) + b
}

pub fn ease_in_elastic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        return b;
    }
    let p = t / d;
    if p == 1.0 {
        return b + c;
    }
    let period = d * 0.3;
    let s = period / 4.0;
    let p = p - 1.0;
    -(c * 2f64.powf(10.0 * p) * ((p * d - s) * (2.0 * PI) / period).sin()) + b
}

pub fn ease_out_elastic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        return b;
    }
    let p = t / d;
    if p == 1.0 {
        return b + c;
    }
    let period = d * 0.3;
    let s = period / 4.0;
    c * 2f64.powf(-10.0 * p) * ((p * d - s) * (2.0 * PI) / period).sin() + c + b
}

pub fn ease_out_bounce(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let mut p = t / d;
    if p < 1.0 / 2.75 {
        c * (7.5625 * p * p) + b
    } else if p < 2.0 / 2.75 {
        p -= 1.5 / 2.75;
        c * (7.5625 * p * p + 0.75) + b
    } else if p < 2.5 / 2.75 {
        p -= 2.25 / 2.75;
        c * (7.5625 * p * p + 0.9375) + b
    } else {
        p -= 2.625 / 2.75;
        c * (7.5625 * p * p + 0.984375) + b
    }
}

pub fn ease_in_bounce(t: f64, b: f64, c: f64, d: f64) -> f64 {
    c - ease_out_bounce(d - t, 0.0, c, d) + b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "left={a} right={b}");
    }

    #[test]
    fn linear_midpoint() {
        approx(linear(5.0, 0.0, 100.0, 10.0), 50.0);
    }

    #[test]
    fn all_formulas_hit_endpoints() {
        for (name, f) in DEFAULTS {
            let start = f(0.0, 3.0, 10.0, 20.0);
            let end = f(20.0, 3.0, 10.0, 20.0);
            assert!(
                (start - 3.0).abs() < 1e-6,
                "{name} start expected 3 got {start}"
            );
            assert!((end - 13.0).abs() < 1e-6, "{name} end expected 13 got {end}");
        }
    }

    #[test]
    fn unknown_name_falls_back_to_linear() {
        let reg = EasingRegistry::new();
        let f = reg.get("definitelyNotRegistered");
        approx(f(1.0, 0.0, 10.0, 2.0), 5.0);
    }

    #[test]
    fn custom_registration() {
        let mut reg = EasingRegistry::new();
        fn snap(_t: f64, b: f64, c: f64, _d: f64) -> f64 {
            b + c
        }
        reg.register("snap", snap);
        assert!(reg.contains("snap"));
        approx(reg.get("snap")(0.1, 1.0, 4.0, 10.0), 5.0);
    }
}
