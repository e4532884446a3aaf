pub mod driver;
pub mod options;
pub mod page;
pub mod service;
