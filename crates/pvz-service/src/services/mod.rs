//! Business service implementations.
//!
//! Every check-then-act sequence runs inside one [`Transactor`](pvz_db::Transactor)
//! transaction whose first statement locks the point row.

pub mod point_service;
pub mod product_service;
pub mod reception_service;
pub mod user_service;

pub use point_service::PointService;
pub use product_service::ProductService;
pub use reception_service::ReceptionService;
pub use user_service::UserService;
