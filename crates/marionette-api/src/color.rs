//! RGB color values.
//!
//! Colors enter the system as `#rgb`, `#rrggbb` or `rgb(r,g,b)` literals and
//! are canonical 3-channel values from then on. `Display` prints the
//! canonical `rgb(r,g,b)` form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    #[inline]
    pub fn channels(&self) -> [u8; 3] {
        self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0[0], self.0[1], self.0[2])
    }
}

fn bad(literal: &str) -> EngineError {
    EngineError::InvalidKeyframe(format!("unrecognized color literal '{literal}'"))
}

impl FromStr for Color {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if let Some(hex) = t.strip_prefix('#') {
            return match hex.len() {
                // #rgb expands each nibble, CSS-style
                3 => {
                    let mut out = [0u8; 3];
                    for (i, ch) in hex.chars().enumerate() {
                        let n = ch.to_digit(16).ok_or_else(|| bad(s))? as u8;
                        out[i] = n << 4 | n;
                    }
                    Ok(Self(out))
                }
                6 => {
                    let mut out = [0u8; 3];
                    for (i, slot) in out.iter_mut().enumerate() {
                        *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                            .map_err(|_| bad(s))?;
                    }
                    Ok(Self(out))
                }
                _ => Err(bad(s)),
            };
        }
        if let Some(body) = t.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            let mut out = [0u8; 3];
            let mut parts = body.split(',');
            for slot in out.iter_mut() {
                let part = parts.next().ok_or_else(|| bad(s))?;
                *slot = part.trim().parse().map_err(|_| bad(s))?;
            }
            if parts.next().is_some() {
                return Err(bad(s));
            }
            return Ok(Self(out));
        }
        Err(bad(s))
    }
}
