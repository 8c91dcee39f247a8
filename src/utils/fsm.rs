pub mod stream_reader;
pub mod url_fsm;
