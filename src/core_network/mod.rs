pub mod bootstrap;
pub mod control;
pub mod data_channel;
pub mod error;
pub mod network;
pub mod pasv;
pub mod port;
pub mod port_pool;
pub mod stream;

#[cfg(test)]
mod test_network;
