//! Repositories for database operations

pub mod booking;
pub mod car;
pub mod user;

pub use booking::BookingRepository;
pub use car::CarRepository;
pub use user::UserRepository;
