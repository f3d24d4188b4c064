use colored::Color;

pub const TEXT_DEFAULT: Color = Color::White;
pub const PRIMARY: Color = Color::BrightGreen;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const ACCENT: Color = Color::BrightYellow;
pub const IPV4_ADDR: Color = Color::BrightCyan;
pub const COUNTRY: Color = Color::BrightGreen;
pub const LOCAL: Color = Color::Yellow;
