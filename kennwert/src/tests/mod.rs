
// Validation tests
mod validation;
