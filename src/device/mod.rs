pub mod client;
pub mod session;

pub use client::{DeviceClient, SessionFactory};
pub use session::{TapoDeviceClient, TapoSessionFactory};
