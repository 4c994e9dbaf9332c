//! Fixed-size temperature window and request validation
//!
//! A `TemperatureWindow` can only be built through the validating
//! factories here, so every predictor receives exactly ten finite values.

use serde_json::Value;

/// Number of observations in a prediction window
pub const WINDOW_LEN: usize = 10;

/// Rejection reasons for caller-supplied sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Input is not a list or does not have exactly `WINDOW_LEN` elements
    #[error("Provide exactly 10 numeric values in 'temp_sequence'.")]
    WrongShape,
    /// An element could not be read as a finite real number
    #[error("Non-numeric value in sequence.")]
    NonNumeric,
}

impl ValidationError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::WrongShape => "wrong_shape",
            ValidationError::NonNumeric => "non_numeric",
        }
    }
}

/// Ten historical temperatures, oldest first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureWindow([f64; WINDOW_LEN]);

impl TemperatureWindow {
    pub fn new(values: [f64; WINDOW_LEN]) -> Result<Self, ValidationError> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ValidationError::NonNumeric);
        }
        Ok(Self(values))
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, ValidationError> {
        let array: [f64; WINDOW_LEN] = values
            .try_into()
            .map_err(|_| ValidationError::WrongShape)?;
        Self::new(array)
    }

    /// Validate untyped request data.
    ///
    /// Shape is checked before any element is coerced, so an 11-element
    /// list of strings reports `WrongShape`.
    pub fn from_json(raw: &Value) -> Result<Self, ValidationError> {
        let items = match raw.as_array() {
            Some(items) if items.len() == WINDOW_LEN => items,
            _ => return Err(ValidationError::WrongShape),
        };

        let mut values = [0.0; WINDOW_LEN];
        for (slot, item) in values.iter_mut().zip(items) {
            *slot = coerce_number(item).ok_or(ValidationError::NonNumeric)?;
        }
        Self::new(values)
    }

    pub fn values(&self) -> &[f64; WINDOW_LEN] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

/// Numbers pass through, numeric strings are parsed; everything else fails
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_integers() {
        let window = TemperatureWindow::from_json(&json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 10])).unwrap();
        assert_eq!(window.values()[0], 1.0);
        assert_eq!(window.values()[9], 10.0);
    }

    #[test]
    fn test_accepts_floats() {
        let raw = json!([21.5, 22.0, 22.4, 23.1, 23.9, 24.2, 24.0, 23.7, 23.3, 22.8]);
        let window = TemperatureWindow::from_json(&raw).unwrap();
        assert_eq!(window.values()[3], 23.1);
    }

    #[test]
    fn test_accepts_numeric_strings() {
        let raw = json!(["10", " 11.5 ", 12, 13, 14, 15, 16, 17, 18, 19]);
        let window = TemperatureWindow::from_json(&raw).unwrap();
        assert_eq!(window.values()[1], 11.5);
    }

    #[test]
    fn test_rejects_short_and_long_lists() {
        let nine = json!([1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let eleven = json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(TemperatureWindow::from_json(&nine), Err(ValidationError::WrongShape));
        assert_eq!(TemperatureWindow::from_json(&eleven), Err(ValidationError::WrongShape));
    }

    #[test]
    fn test_rejects_non_list() {
        assert_eq!(TemperatureWindow::from_json(&json!(42)), Err(ValidationError::WrongShape));
        assert_eq!(TemperatureWindow::from_json(&json!("1,2,3")), Err(ValidationError::WrongShape));
        assert_eq!(TemperatureWindow::from_json(&Value::Null), Err(ValidationError::WrongShape));
    }

    #[test]
    fn test_rejects_non_numeric_element() {
        let raw = json!([1, 2, 3, "abc", 5, 6, 7, 8, 9, 10]);
        assert_eq!(TemperatureWindow::from_json(&raw), Err(ValidationError::NonNumeric));
    }

    #[test]
    fn test_rejects_bool_null_and_nested() {
        for bad in [json!(true), Value::Null, json!([1]), json!({"v": 1})] {
            let mut items = vec![json!(1.0); WINDOW_LEN];
            items[4] = bad;
            assert_eq!(
                TemperatureWindow::from_json(&Value::Array(items)),
                Err(ValidationError::NonNumeric)
            );
        }
    }

    #[test]
    fn test_rejects_non_finite_strings() {
        let raw = json!(["nan", 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(TemperatureWindow::from_json(&raw), Err(ValidationError::NonNumeric));
        let raw = json!([1, 2, 3, 4, 5, 6, 7, 8, 9, "inf"]);
        assert_eq!(TemperatureWindow::from_json(&raw), Err(ValidationError::NonNumeric));
    }

    #[test]
    fn test_shape_checked_before_elements() {
        let raw = json!(["a", "b", "c"]);
        assert_eq!(TemperatureWindow::from_json(&raw), Err(ValidationError::WrongShape));
    }

    #[test]
    fn test_from_slice_and_new() {
        assert!(TemperatureWindow::from_slice(&[1.0; 10]).is_ok());
        assert_eq!(TemperatureWindow::from_slice(&[1.0; 4]), Err(ValidationError::WrongShape));

        let mut values = [1.0; WINDOW_LEN];
        values[2] = f64::NAN;
        assert_eq!(TemperatureWindow::new(values), Err(ValidationError::NonNumeric));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::WrongShape.to_string(),
            "Provide exactly 10 numeric values in 'temp_sequence'."
        );
        assert_eq!(ValidationError::NonNumeric.to_string(), "Non-numeric value in sequence.");
    }
}
