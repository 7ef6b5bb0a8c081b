pub mod form;
pub mod payment;
pub mod query;

pub use form::*;
pub use payment::*;
pub use query::*;
