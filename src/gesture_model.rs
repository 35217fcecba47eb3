pub mod main;
pub mod play_loop;
pub mod predict;
pub mod teach;

#[cfg(test)]
mod tests;
