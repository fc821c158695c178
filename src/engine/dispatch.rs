//! Value mapping from 7-bit control values to typed parameters

use tracing::trace;

use crate::params::{ParamValue, Parameter};

/// Control value mapped to the top of a numeric parameter's range
///
/// Faders on common controllers top out at 126 in practice, so 126 (not 127)
/// is treated as full scale; 127 clamps to the same result.
pub const SOURCE_MAX: f64 = 126.0;

/// Slider values at or above this read as "on" for bool parameters
pub const SLIDER_THRESHOLD: u8 = 64;

/// Value a button sends when pressed
const BUTTON_PRESSED: u8 = 127;

/// What processing a message did to its bound parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// No parameter is linked to the control
    Unlinked,
    /// The parameter was written
    Written,
    /// The value already matched, nothing was written
    Unchanged,
    /// A trigger parameter fired
    Fired,
    /// The value means nothing for this parameter type
    Ignored,
    /// The linked parameter no longer exists
    Stale,
}

/// Linear map of `value` from `[0, SOURCE_MAX]` onto `[min, max]`, clamped
///
/// Never panics, even for a NaN range (`f64::clamp` would).
pub fn map_float(value: u8, min: f32, max: f32) -> f32 {
    let (min, max) = (min as f64, max as f64);
    let mapped = min + (value as f64 / SOURCE_MAX) * (max - min);
    mapped.max(min.min(max)).min(min.max(max)) as f32
}

/// Integer variant of [`map_float`], truncating toward zero
pub fn map_int(value: u8, min: i32, max: i32) -> i32 {
    let (min, max) = (min as f64, max as f64);
    let mapped = min + (value as f64 / SOURCE_MAX) * (max - min);
    mapped.clamp(min.min(max), min.max(max)).trunc() as i32
}

fn is_slider_value(value: u8) -> bool {
    value > 0 && value < BUTTON_PRESSED
}

/// Apply a control value to `param`
///
/// `previous` is the last value seen from the same control. A 127 or 0 that
/// follows an in-between value is the end of a slider sweep, not a button.
pub fn dispatch(param: &Parameter, value: u8, previous: Option<u8>) -> Effect {
    let effect = match param.value() {
        ParamValue::Float { min, max, .. } => {
            param.set_float(map_float(value, min, max));
            Effect::Written
        }
        ParamValue::Int { min, max, .. } => {
            param.set_int(map_int(value, min, max));
            Effect::Written
        }
        ParamValue::Bool(current) => {
            let swept = previous.is_some_and(is_slider_value);
            let at_end = value == 0 || value == BUTTON_PRESSED;

            if is_slider_value(value) || (swept && at_end) {
                let target = value >= SLIDER_THRESHOLD;
                if target != current {
                    param.set_bool(target);
                    Effect::Written
                } else {
                    Effect::Unchanged
                }
            } else if value == BUTTON_PRESSED {
                param.set_bool(!current);
                Effect::Written
            } else {
                Effect::Ignored
            }
        }
        ParamValue::Trigger => {
            if value > 0 {
                param.trigger();
                Effect::Fired
            } else {
                Effect::Ignored
            }
        }
        ParamValue::Text(_) => Effect::Ignored,
    };

    trace!(param = param.path(), value, ?effect, "Dispatched");
    effect
}
