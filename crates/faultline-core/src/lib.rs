//! Domain types shared by the faultline crates

#![allow(clippy::must_use_candidate)]

pub mod client_ip;
mod context;
mod error;
mod failure;
mod kind;

pub use context::{CallerIdentity, RequestContext, ViewContext};
pub use error::IntoFailure;
pub use failure::{Auxiliary, FailureTag, RaisedFailure};
pub use kind::{FailureKind, IntegrityKind};
