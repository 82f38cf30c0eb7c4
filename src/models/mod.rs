pub mod data_url;
pub mod request;
pub mod response;

pub use data_url::DataUrl;
pub use request::*;
pub use response::*;
