pub mod catalog;
pub mod filter;
pub mod pagination;
pub mod query;
pub mod session;
pub mod sort;

pub use catalog::{DoctorCatalog, MockDoctorCatalog, RemoteDoctorCatalog};
pub use pagination::{Completion, FetchKind, FetchTicket, PaginationController};
pub use query::{CareType, SearchQueryBuilder};
pub use session::{SearchSession, SearchSessionHandle, SessionConfig, SessionError, SessionSnapshot};
