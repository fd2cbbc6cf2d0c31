pub mod allocation;
pub mod pairing;
