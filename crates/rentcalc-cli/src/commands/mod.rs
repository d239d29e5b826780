pub mod irr;
pub mod projection;
pub mod sensitivity;
