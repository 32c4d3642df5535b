//! Generated validator modules for the `schemagen-codegen` test fixtures.
//!
//! Built from the fixture schemas at compile time, so a change in the Rust
//! backend that produces code which does not compile, or that no longer
//! decodes what its validator accepts, fails here.

/// `account`, `holder` and `token`
pub mod schemas {
    include!(concat!(env!("OUT_DIR"), "/schemas.rs"));
}

/// `parent` and `child`, which refer to each other
pub mod cycle {
    include!(concat!(env!("OUT_DIR"), "/cycle.rs"));
}
