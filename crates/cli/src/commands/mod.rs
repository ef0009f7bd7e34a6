pub mod check;
pub mod columns;
pub mod fill;
