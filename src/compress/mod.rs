// State matrix compression: column pruning and row averaging

pub mod columns;
pub mod rows;

pub use columns::*;
pub use rows::*;
