pub mod gateway;

pub use gateway::{HttpPaymentsGateway, PaymentsGateway};
