//! Calendar conversion boundary.
//!
//! # Responsibility
//! - Define the lunar/solar conversion contract consumed by resolution.
//! - Adapt the ICU lunisolar calendar behind that contract.
//!
//! # Invariants
//! - Conversion is stateless; equal inputs convert to equal outputs.
//! - No conversion arithmetic is implemented here; the underlying calendar
//!   library owns month lengths and leap-month placement.
//!
//! # See also
//! - docs/architecture/occurrence-resolution.md

pub mod lunisolar;
