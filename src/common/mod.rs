pub mod client {
    pub mod client;
    pub mod error;
}

pub mod logger;
