pub mod booking_controller;
pub mod car_controller;
