/// Terminal front end: input, drawing, colors.

pub mod input;
pub mod palette;
pub mod renderer;
