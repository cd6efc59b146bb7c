pub mod magnify;
