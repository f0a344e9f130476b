pub mod response;
pub mod session;
pub mod table;
pub mod view;
