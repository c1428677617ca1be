//! Deterministic adapters for local development and automated tests.
//!
//! Each mock fails on literal sentinel inputs so every terminal result state can be reached
//! without network access. The sentinel values are relied upon by downstream tests; do not
//! change them.

mod address;
mod financial;
mod phone;
mod resolution;
mod state_id;

pub use address::AddressMock;
pub use financial::FinancialMock;
pub use phone::PhoneMock;
pub use resolution::ResolutionMock;
pub use state_id::StateIdMock;
