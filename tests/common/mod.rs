pub mod synthetic_photo;
