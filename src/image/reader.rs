pub mod bmp;
