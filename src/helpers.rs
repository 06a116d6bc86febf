pub mod bb;
pub mod img_drawing;
pub mod viewer;
