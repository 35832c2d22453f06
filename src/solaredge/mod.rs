pub mod inverter;
pub mod registers;
pub mod transport;
