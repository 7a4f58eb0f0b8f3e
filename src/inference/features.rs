//! Lenient single-applicant feature input

use crate::preprocessing::coerce_numeric;
use ndarray::Array2;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One applicant, in model column order.
///
/// Deserialization never fails on a field value: numbers pass through,
/// numeric strings are parsed, booleans become 1/0 and anything else,
/// including a missing field, becomes `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "Age", default, deserialize_with = "lenient_f64")]
    pub age: f64,
    #[serde(rename = "Income", default, deserialize_with = "lenient_f64")]
    pub income: f64,
    #[serde(rename = "LoanAmount", default, deserialize_with = "lenient_f64")]
    pub loan_amount: f64,
    #[serde(rename = "CreditScore", default, deserialize_with = "lenient_f64")]
    pub credit_score: f64,
}

impl FeatureVector {
    pub fn new(age: f64, income: f64, loan_amount: f64, credit_score: f64) -> Self {
        Self {
            age: finite_or_zero(age),
            income: finite_or_zero(income),
            loan_amount: finite_or_zero(loan_amount),
            credit_score: finite_or_zero(credit_score),
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.age, self.income, self.loan_amount, self.credit_score]
    }

    /// Single-row matrix for `Classifier::predict_proba`
    pub fn to_row(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, 4), |(_, j)| self.to_array()[j])
    }
}

/// Coerce an arbitrary JSON value to a finite `f64`
pub fn coerce_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().map_or(0.0, finite_or_zero),
        Value::String(s) => coerce_numeric(s),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_value(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_pass_through() {
        let fv: FeatureVector = serde_json::from_value(json!({
            "Age": 35, "Income": 50000.0, "LoanAmount": 15000, "CreditScore": 680
        }))
        .unwrap();
        assert_eq!(fv.to_array(), [35.0, 50000.0, 15000.0, 680.0]);
    }

    #[test]
    fn test_lenient_values() {
        let fv: FeatureVector = serde_json::from_value(json!({
            "Age": "41", "Income": "n/a", "LoanAmount": null, "CreditScore": [1, 2]
        }))
        .unwrap();
        assert_eq!(fv.to_array(), [41.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let fv: FeatureVector = serde_json::from_value(json!({ "Age": 30 })).unwrap();
        assert_eq!(fv.to_array(), [30.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_serializes_with_column_names() {
        let json = serde_json::to_value(FeatureVector::new(1.0, 2.0, 3.0, f64::NAN)).unwrap();
        assert_eq!(json, json!({"Age": 1.0, "Income": 2.0, "LoanAmount": 3.0, "CreditScore": 0.0}));
    }

    #[test]
    fn test_to_row_shape() {
        let row = FeatureVector::new(1.0, 2.0, 3.0, 4.0).to_row();
        assert_eq!(row.shape(), &[1, 4]);
        assert_eq!(row[[0, 3]], 4.0);
    }
}
