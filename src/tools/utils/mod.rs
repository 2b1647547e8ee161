pub mod animation_utils;
