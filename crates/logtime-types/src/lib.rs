//! Wire types shared by the logtime server and client.

pub mod api;
