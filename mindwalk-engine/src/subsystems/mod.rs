pub mod dealer;
pub mod projector;
pub mod prompter;
pub mod tracker;
