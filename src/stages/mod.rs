//! Decision stages that run after training: evaluation, selection and the
//! registration gate.

pub mod evaluate;
pub mod output;
pub mod register;
pub mod select;
