pub mod debug_gui;
