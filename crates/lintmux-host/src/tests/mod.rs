//! Crate-internal test support and behaviour tests.

pub(crate) mod support;
