pub mod batch;
pub mod check;
pub mod replay;
pub mod strategies;
