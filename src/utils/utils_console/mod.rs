use colored::Colorize;

/// Prints the given string with the given color.
///
/// ## Example
/// ```
/// use cio_planner::utils::utils_console::{cio_print, PrintMode, PrintColor};
/// cio_print("test", PrintMode::Print, PrintColor::Blue, false);
/// ```
pub fn cio_print(s: &str, mode: PrintMode, color: PrintColor, bolded: bool) {
    let mut string = match &color {
        PrintColor::None => { s.normal() }
        _ => {
            let c = color.get_color_triple();
            s.truecolor(c.0, c.1, c.2)
        }
    };
    if bolded { string = string.bold(); }
    match mode {
        PrintMode::Println => { println!("{}", string); }
        PrintMode::Print => { print!("{}", string); }
    }
}

pub fn cio_print_new_line() {
    cio_print("\n", PrintMode::Print, PrintColor::None, false);
}

/// Println will cause a new line after each line, while Print will not.
#[derive(Clone, Debug)]
pub enum PrintMode {
    Println,
    Print
}

/// Defines color for a cio print command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrintColor {
    None,
    Blue,
    Green,
    Red,
    Yellow,
    Cyan,
    Magenta
}
impl PrintColor {
    pub fn get_color_triple(&self) -> (u8, u8, u8) {
        match self {
            PrintColor::None => { (0,0,0) }
            PrintColor::Blue => { return (0, 0, 255) }
            PrintColor::Green => { return (0, 255, 0) }
            PrintColor::Red => { return (255, 0, 0) }
            PrintColor::Yellow => { return (255, 255, 0) }
            PrintColor::Cyan => { return (0, 255, 255) }
            PrintColor::Magenta => { return (255, 0, 255) }
        }
    }
}

/// Gates verbose diagnostics printed by the evaluation manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CioDebug {
    True,
    False
}
impl CioDebug {
    pub fn new(enabled: bool) -> Self {
        if enabled { Self::True } else { Self::False }
    }
    pub fn is_enabled(&self) -> bool {
        *self == CioDebug::True
    }
}
impl Default for CioDebug {
    fn default() -> Self { Self::False }
}
