/// Car payloads and search parameters.
pub mod car;
pub mod health;
/// Paging parameters and paged responses.
pub mod page;
pub mod validation;
