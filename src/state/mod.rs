pub mod display_board;

pub use display_board::{BoardSnapshot, DisplayBoard, InterfaceRowView, RenderedValue};
