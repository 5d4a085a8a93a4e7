pub mod booking_dto;
pub mod car_dto;
