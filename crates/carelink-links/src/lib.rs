//! # carelink-links
//!
//! Opaque, time-limited patient links. A link lets an external caller address
//! a patient record without ever seeing the patient's durable identifier.
//!
//! - [`PatientLinkService::issue`] mints a link for a patient
//! - [`PatientLinkService::resolve`] turns an opaque id back into the
//!   patient id while the link is live
//! - persistence sits behind [`PatientLinkStore`]; [`InMemoryLinkStore`]
//!   ships for tests and single-process hosts

pub mod clock;
pub mod error;
pub mod link;
pub mod memory;
pub mod service;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use error::{LinkError, LinkErrorCategory, LinkResult};
pub use link::PatientLink;
pub use memory::InMemoryLinkStore;
pub use service::{DEFAULT_LINK_TTL, PatientLinkService, generate_opaque_id};
pub use store::{LinkQuery, PatientLinkStore};
