pub mod chat;
pub mod recommend;
pub mod sync;
pub mod ui;
