pub mod cancel;
pub mod fsm;
pub mod web;
