pub mod extraction;
pub mod notification;
pub mod request;
pub mod response;

pub use extraction::*;
pub use notification::*;
pub use request::*;
pub use response::*;
