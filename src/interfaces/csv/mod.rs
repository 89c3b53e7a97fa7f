pub mod command_reader;
pub mod snapshot_writer;
