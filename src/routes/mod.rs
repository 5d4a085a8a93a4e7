pub mod booking_routes;
pub mod car_routes;
pub mod scheduler_routes;
