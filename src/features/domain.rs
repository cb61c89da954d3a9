//! Feature schema for the premium model.
//!
//! The order of [`FEATURE_ORDER`] is the order the scaler and model were
//! fitted on. Changing it silently corrupts every prediction; artifacts carry
//! their own copy of the names so a mismatch is caught at load time.

use crate::common::error::{PremiumError, PremiumResult};

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 10;

/// Ordered numeric encoding of a [`FeatureRecord`].
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Numeric type a field is coerced to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Float,
    Integer,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Float => "float",
            FieldKind::Integer => "integer",
        }
    }
}

/// Name and numeric type of one input field.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

/// Required request fields in model input order.
pub const FEATURE_ORDER: [FieldSpec; FEATURE_COUNT] = [
    field("Age", FieldKind::Float),
    field("Diabetes", FieldKind::Integer),
    field("BloodPressureProblems", FieldKind::Integer),
    field("AnyTransplants", FieldKind::Integer),
    field("AnyChronicDiseases", FieldKind::Integer),
    field("Height", FieldKind::Float),
    field("Weight", FieldKind::Float),
    field("KnownAllergies", FieldKind::Integer),
    field("HistoryOfCancerInFamily", FieldKind::Integer),
    field("NumberOfMajorSurgeries", FieldKind::Integer),
];

/// A coerced field value, tagged with the kind it was coerced to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Integer(_) => FieldKind::Integer,
        }
    }
}

/// Field names in model input order.
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    FEATURE_ORDER.iter().map(|f| f.name)
}

/// Validated request payload.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRecord {
    pub age: f64,
    pub diabetes: i64,
    pub blood_pressure_problems: i64,
    pub any_transplants: i64,
    pub any_chronic_diseases: i64,
    pub height: f64,
    pub weight: f64,
    pub known_allergies: i64,
    pub history_of_cancer_in_family: i64,
    pub number_of_major_surgeries: i64,
}

impl FeatureRecord {
    /// Build a record from values coerced in [`FEATURE_ORDER`].
    ///
    /// Each slot must carry the kind its [`FieldSpec`] declares; a mismatch
    /// means the schema and the record layout have drifted apart.
    pub fn from_values(values: &[FieldValue; FEATURE_COUNT]) -> PremiumResult<Self> {
        let float = |idx: usize| match values[idx] {
            FieldValue::Float(v) => Ok(v),
            other => Err(kind_mismatch(idx, other)),
        };
        let int = |idx: usize| match values[idx] {
            FieldValue::Integer(v) => Ok(v),
            other => Err(kind_mismatch(idx, other)),
        };

        Ok(Self {
            age: float(0)?,
            diabetes: int(1)?,
            blood_pressure_problems: int(2)?,
            any_transplants: int(3)?,
            any_chronic_diseases: int(4)?,
            height: float(5)?,
            weight: float(6)?,
            known_allergies: int(7)?,
            history_of_cancer_in_family: int(8)?,
            number_of_major_surgeries: int(9)?,
        })
    }

    /// Encode the record in [`FEATURE_ORDER`].
    pub fn to_vector(&self) -> FeatureVector {
        [
            self.age,
            self.diabetes as f64,
            self.blood_pressure_problems as f64,
            self.any_transplants as f64,
            self.any_chronic_diseases as f64,
            self.height,
            self.weight,
            self.known_allergies as f64,
            self.history_of_cancer_in_family as f64,
            self.number_of_major_surgeries as f64,
        ]
    }
}

fn kind_mismatch(idx: usize, got: FieldValue) -> PremiumError {
    let spec = FEATURE_ORDER[idx];
    PremiumError::invalid_field(
        spec.name,
        format!(
            "expected {} value, got {}",
            spec.kind.as_str(),
            got.kind().as_str()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_matches_training_layout() {
        let names: Vec<_> = feature_names().collect();
        assert_eq!(
            names,
            vec![
                "Age",
                "Diabetes",
                "BloodPressureProblems",
                "AnyTransplants",
                "AnyChronicDiseases",
                "Height",
                "Weight",
                "KnownAllergies",
                "HistoryOfCancerInFamily",
                "NumberOfMajorSurgeries",
            ]
        );
    }

    #[test]
    fn float_fields_are_age_height_weight() {
        let floats: Vec<_> = FEATURE_ORDER
            .iter()
            .filter(|f| f.kind == FieldKind::Float)
            .map(|f| f.name)
            .collect();
        assert_eq!(floats, vec!["Age", "Height", "Weight"]);
    }

    #[test]
    fn vector_follows_field_order() {
        let record = FeatureRecord {
            age: 1.0,
            diabetes: 2,
            blood_pressure_problems: 3,
            any_transplants: 4,
            any_chronic_diseases: 5,
            height: 6.0,
            weight: 7.0,
            known_allergies: 8,
            history_of_cancer_in_family: 9,
            number_of_major_surgeries: 10,
        };
        assert_eq!(
            record.to_vector(),
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]
        );
    }

    #[test]
    fn record_layout_follows_declared_kinds() {
        let mut values = [FieldValue::Integer(0); FEATURE_COUNT];
        for (idx, (slot, spec)) in values.iter_mut().zip(FEATURE_ORDER.iter()).enumerate() {
            *slot = match spec.kind {
                FieldKind::Float => FieldValue::Float(idx as f64),
                FieldKind::Integer => FieldValue::Integer(idx as i64),
            };
        }
        let record = FeatureRecord::from_values(&values).unwrap();
        assert_eq!(
            record.to_vector(),
            [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]
        );
    }

    #[test]
    fn value_of_the_wrong_kind_is_rejected() {
        let mut values = [FieldValue::Integer(0); FEATURE_COUNT];
        for (slot, spec) in values.iter_mut().zip(FEATURE_ORDER.iter()) {
            if spec.kind == FieldKind::Float {
                *slot = FieldValue::Float(1.0);
            }
        }
        values[5] = FieldValue::Integer(170);
        let err = FeatureRecord::from_values(&values).unwrap_err();
        assert!(matches!(err, PremiumError::InvalidField { field: "Height", .. }));
        assert!(err.to_string().contains("expected float value, got integer"));
    }
}
