//! Scenario tests that drive several bake modules together

mod support;
