pub mod http;
pub mod ids;
pub mod logging;
pub mod timing;
