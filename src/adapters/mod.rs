pub mod http;
pub mod notify;
pub mod postgres;
pub mod stripe;
