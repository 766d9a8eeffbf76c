// Output formatting — terminal display.

pub mod terminal;
