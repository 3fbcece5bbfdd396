//! Property values: what actors' keyframes hold, and what the engine hands
//! to draw routines once everything is resolved.
//!
//! `Number` and `Color` are static. `Modifier` and `Computed` are dynamic:
//! they resolve against prior state before they can be interpolated. `Eased`
//! wraps any value with a per-property easing override.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::EngineError;

/// Authored keyframe properties, keyed by property name.
pub type PropertyBag = HashMap<String, PropertyValue>;

/// Concrete per-frame properties handed to draw routines.
pub type StateBag = HashMap<String, ResolvedValue>;

/// The relative-modifier operators: `+=` `-=` `*=` `/=`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ModifierOp {
    #[inline]
    pub fn apply(self, prev: f64, operand: f64) -> f64 {
        match self {
            ModifierOp::Add => prev + operand,
            ModifierOp::Sub => prev - operand,
            ModifierOp::Mul => prev * operand,
            ModifierOp::Div => prev / operand,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ModifierOp::Add => "+=",
            ModifierOp::Sub => "-=",
            ModifierOp::Mul => "*=",
            ModifierOp::Div => "/=",
        }
    }
}

/// A callback property, invoked with the actor's resolved state at the time
/// of evaluation. The returned value may itself be a modifier.
#[derive(Clone)]
pub struct ComputedFn(Rc<dyn Fn(&StateBag) -> PropertyValue>);

impl ComputedFn {
    pub fn new(f: impl Fn(&StateBag) -> PropertyValue + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub fn call(&self, state: &StateBag) -> PropertyValue {
        (self.0)(state)
    }
}

impl fmt::Debug for ComputedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComputedFn(..)")
    }
}

#[derive(Clone, Debug)]
pub enum PropertyValue {
    Number(f64),
    Color(Color),
    /// Relative to the previous concrete value for the property.
    Modifier(ModifierOp, f64),
    Computed(ComputedFn),
    /// Per-property easing override wrapping the target value.
    Eased(String, Box<PropertyValue>),
}

impl PropertyValue {
    /// Whether resolution against prior state is required before this value
    /// can be interpolated.
    pub fn is_dynamic(&self) -> bool {
        match self {
            PropertyValue::Number(_) | PropertyValue::Color(_) => false,
            PropertyValue::Modifier(..) | PropertyValue::Computed(_) => true,
            PropertyValue::Eased(_, inner) => inner.is_dynamic(),
        }
    }

    pub fn computed(f: impl Fn(&StateBag) -> PropertyValue + 'static) -> Self {
        Self::Computed(ComputedFn::new(f))
    }

    pub fn eased(easing: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::Eased(easing.into(), Box::new(value.into()))
    }

    /// The easing override attached to this value, if any.
    pub fn easing(&self) -> Option<&str> {
        match self {
            PropertyValue::Eased(name, _) => Some(name),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<f32> for PropertyValue {
    fn from(n: f32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for PropertyValue {
    fn from(n: u32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<Color> for PropertyValue {
    fn from(c: Color) -> Self {
        Self::Color(c)
    }
}

impl From<ResolvedValue> for PropertyValue {
    fn from(v: ResolvedValue) -> Self {
        match v {
            ResolvedValue::Number(n) => Self::Number(n),
            ResolvedValue::Color(c) => Self::Color(c),
        }
    }
}

impl FromStr for PropertyValue {
    type Err = EngineError;

    /// Parses modifier literals (`"+=5"`) and color literals (`"#fff"`,
    /// `"rgb(1,2,3)"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        const OPS: [(&str, ModifierOp); 4] = [
            ("+=", ModifierOp::Add),
            ("-=", ModifierOp::Sub),
            ("*=", ModifierOp::Mul),
            ("/=", ModifierOp::Div),
        ];
        for (sym, op) in OPS {
            if let Some(num) = t.strip_prefix(sym) {
                let operand: f64 = num.trim().parse().map_err(|_| {
                    EngineError::InvalidKeyframe(format!("unparseable modifier literal '{s}'"))
                })?;
                return Ok(Self::Modifier(op, operand));
            }
        }
        t.parse::<Color>().map(Self::Color)
    }
}

/// A property value with all dynamism resolved away.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ResolvedValue {
    Number(f64),
    Color(Color),
}

impl ResolvedValue {
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ResolvedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_color(&self) -> Option<Color> {
        match self {
            ResolvedValue::Color(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedValue::Number(n) => write!(f, "{n}"),
            ResolvedValue::Color(c) => write!(f, "{c}"),
        }
    }
}
