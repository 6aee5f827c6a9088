pub mod figure_painter;
