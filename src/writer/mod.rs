//! Output stage: serialize a finished blueprint.
pub mod json;
