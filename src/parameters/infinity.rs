//! Wire sentinels for infinite float values
//!
//! JSON cannot carry IEEE infinities, so values crossing a serialization
//! boundary are substituted with a pair of large finite numbers. The store
//! itself always holds true infinities.

/// Stand-in for `+inf` on the wire
pub const PLUS: f64 = 1e100;

/// Stand-in for `-inf` on the wire
pub const MINUS: f64 = -1e100;

/// Replace infinities with the wire sentinels
pub fn to_wire(value: f64) -> f64 {
    if value == f64::INFINITY {
        PLUS
    } else if value == f64::NEG_INFINITY {
        MINUS
    } else {
        value
    }
}

/// Map sentinel-or-beyond magnitudes back to true infinities
pub fn from_wire(value: f64) -> f64 {
    if value >= PLUS {
        f64::INFINITY
    } else if value <= MINUS {
        f64::NEG_INFINITY
    } else {
        value
    }
}
