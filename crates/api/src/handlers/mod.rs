pub mod wallpapers;
