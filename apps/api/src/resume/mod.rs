// Résumé text pipeline: free-form markdown → canonical markdown → document model.
// Everything except `handlers` is pure and synchronous.

pub mod builder;
pub mod handlers;
pub mod model;
pub mod normalizer;
