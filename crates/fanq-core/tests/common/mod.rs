pub mod hold_server;
