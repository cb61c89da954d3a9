//! Feature domain: the request-to-vector contract.

pub mod domain;
pub mod service;

pub use domain::{
    FeatureRecord, FeatureVector, FieldKind, FieldSpec, FieldValue, FEATURE_COUNT, FEATURE_ORDER,
};
