pub mod axes;
pub mod contours;
pub mod figure;
pub mod style;
pub mod taylor;
