//! Background tasks.

pub mod arrival_poller;
