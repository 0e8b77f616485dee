pub mod cuisine;
pub mod location;
pub mod restaurant;
pub mod slots;
pub mod suggestion;
